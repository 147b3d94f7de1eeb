/// Logger configuration and the environment tag that selects the sink.
pub mod config;
/// The `Logger` handle passed to every connector.
pub mod logger;
/// Daily rotating JSON file writer with a stable symlink to the active file.
pub mod rotating;
