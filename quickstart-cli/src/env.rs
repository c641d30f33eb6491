//! `.env` loading
//!
//! Variables already present in the process environment take priority;
//! dotenvy never overwrites them. Loading happens before argument parsing
//! and tracing setup, so the outcome is reported afterwards.

use std::path::PathBuf;

use tracing::{debug, info};

/// Load `.env` from the current directory or its parents.
pub fn load_dotenv() -> dotenvy::Result<PathBuf> {
    dotenvy::dotenv()
}

/// Log where configuration came from.
pub fn report(result: &dotenvy::Result<PathBuf>) {
    match result {
        Ok(path) => info!("Loaded configuration from {}", path.display()),
        Err(e) if e.not_found() => {
            debug!("No .env file found, using environment variables only")
        }
        Err(e) => debug!("Failed to load .env: {}", e),
    }
}
