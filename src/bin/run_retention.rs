// Small ops utility: run the retention routine once and print the run summary as JSON.
//
// Usage:
//   cargo run --bin run_retention -- [db_path]
//
// Does not arm the recurring schedule.

use arcflow_core::app::{get_default_db_path, AppState};
use arcflow_core::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    let state = AppState::new(db_path)?;
    let run = state.retention_api.run_now().await;

    println!("{}", serde_json::to_string_pretty(&run)?);
    if !run.failures.is_empty() {
        eprintln!("{}", run.summary_text());
        std::process::exit(1);
    }
    Ok(())
}
