//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
///
/// `config_path` is the `--config` override, if any.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<&str>) -> Result<()> {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init => {
            if path.exists() {
                Output::warning(&format!("Config already exists at {}", path.display()));
                return Ok(());
            }
            settings.save_to(&path)?;
            Output::success(&format!("Wrote config to {}", path.display()));
            print_key_hint(&settings);
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn print_key_hint(settings: &Settings) {
    let var = settings.model.provider.api_key_env();
    if std::env::var(var).is_err() {
        Output::info(&format!("Set {} in your environment or a .env file.", var));
    }
}
