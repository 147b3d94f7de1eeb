use lib_infra::{AppEnv, Logger, LoggerConfig};
use serde_json::json;
use std::fs;
use tempfile::tempdir;

/// # Logger Smoke Test
///
/// Writes entries at every level into a temporary folder, then prints the
/// rotated file through its stable symlink and copies it to `./logs` for inspection.
fn main() {
    // Create a temporary directory for log files to avoid cluttering the project.
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let log_dir_path = temp_dir.path().to_path_buf();

    let app_name = "test_app".to_string();
    let logger = Logger::init(&LoggerConfig {
        env: AppEnv::parse("STAGING"),
        app_name: app_name.clone(),
        log_folder: log_dir_path.clone(),
        log_level: "debug".to_string(),
    })
    .expect("Failed to initialize logger");

    // Log some messages
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.log_object_warn("This is a warning with data", &json!({"code": 101}));
    logger.error("This is an error message");
    logger.debug("This is a debug message");

    // Dropping the logger flushes the non-blocking writer.
    drop(logger);

    let link = log_dir_path.join(format!("{}.json", app_name));
    let contents = fs::read_to_string(&link).expect("Failed to read log file through its symlink");

    assert!(contents.contains("This is an info message"), "Info message not found in log file");
    assert!(contents.contains("This is a warning message"), "Warning message not found in log file");
    assert!(contents.contains(r#"{\"code\":101}"#), "Warning extra data not found in log file");
    assert!(contents.contains("This is an error message"), "Error message not found in log file");
    assert!(contents.contains("This is a debug message"), "Debug message not found in log file");
    print!("{}", contents);

    // Copy the rotated file to the project root's logs directory for review.
    let project_root_logs_dir = std::env::current_dir().unwrap().join("logs");
    fs::create_dir_all(&project_root_logs_dir).expect("Failed to create project logs directory");
    let target = fs::read_link(&link).expect("Log link is not a symlink");
    let destination_path = project_root_logs_dir.join(&target);
    fs::copy(log_dir_path.join(&target), &destination_path)
        .unwrap_or_else(|e| panic!("Failed to copy log file to {}: {}", destination_path.display(), e));
    println!("Copied log file to: {}", destination_path.display());

    temp_dir.close().expect("Failed to clean up temporary directory");
}
