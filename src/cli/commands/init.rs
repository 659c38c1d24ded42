//! Init command - write a configuration template

use crate::cli::args::InitArgs;
use crate::config::ConfigManager;
use crate::error::{PrecacheError, PrecacheResult};
use console::style;
use tokio::fs;

/// Configuration template written by `precache init`
const INIT_TEMPLATE: &str = r#"# Precache configuration

[general]
# Write lifecycle events to the audit log under the state directory.
# audit_log = true

[origin]
# The origin whose resources are cached.
url = "https://app.example.com"
# Deploy manifest artifact for the current deployment.
# manifest = "/path/to/precache-manifest.json"

[cache]
# Relocate stores and the audit log (PRECACHE_STATE_DIR also works).
# state_dir = "/var/lib/precache"
# Concurrent fetches during `precache download`.
# download_concurrency = 8
"#;

/// Execute the init command
pub async fn execute(args: InitArgs, manager: &ConfigManager) -> PrecacheResult<()> {
    let config_path = manager.config_path();

    if config_path.exists() && !args.force {
        return Err(PrecacheError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PrecacheError::io("creating config directory", e))?;
    }

    fs::write(config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| PrecacheError::io(format!("writing {}", config_path.display()), e))?;

    println!(
        "{} Created config {}",
        style("✓").green(),
        config_path.display()
    );
    println!("  Edit the origin url and manifest path, then run: precache sync");

    Ok(())
}
