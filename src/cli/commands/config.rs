//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = Settings::default_config_path();
            if path.exists() {
                Output::warning(&format!("Config file already exists: {}", path.display()));
                return Ok(());
            }
            settings.save()?;
            Output::success(&format!("Wrote default configuration to {}", path.display()));
        }
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)?;
            println!("{}", content);
        }
        ConfigAction::Path => {
            let path = Settings::default_config_path();
            Output::kv("Config path", &format!("{}", path.display()));
            if !path.exists() {
                Output::info("File does not exist yet; defaults are in effect.");
            }
        }
    }

    Ok(())
}
