//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the parent directory of a data file exists.
///
/// A missing directory is created; failure to create it is returned so the
/// caller can decide whether startup should continue.
pub async fn ensure_data_dir(file: &Path) -> anyhow::Result<()> {
    let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::metadata(dir).await.is_ok() {
        return Ok(());
    }
    warn!(dir = %dir.display(), "data directory not found; creating it");
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    info!(dir = %dir.display(), "data directory created");
    Ok(())
}
