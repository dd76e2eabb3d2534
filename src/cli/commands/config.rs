//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_key(&settings, key, value)?;
            updated.validate()?;
            updated.save()?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Apply a dotted-key assignment (e.g. "rag.model") to the settings.
///
/// Numbers and booleans keep their type; everything else is a string.
fn set_key(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root: toml::Value = toml::Value::try_from(settings)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let parsed = if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = value.parse::<f64>() {
        toml::Value::Float(f)
    } else if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else {
        toml::Value::String(value.to_string())
    };

    let mut current = &mut root;
    let parts: Vec<&str> = key.split('.').collect();
    let (last, path) = parts
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("Empty configuration key"))?;

    for part in path {
        current = current
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration section: {}", part))?;
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a configuration section", key))?;
    if !table.contains_key(*last) {
        return Err(anyhow::anyhow!("Unknown configuration key: {}", key));
    }
    table.insert(last.to_string(), parsed);

    let updated: Settings = root
        .try_into()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_key_string_and_number() {
        let settings = Settings::default();

        let updated = set_key(&settings, "rag.model", "gpt-4o").unwrap();
        assert_eq!(updated.rag.model, "gpt-4o");

        let updated = set_key(&settings, "chunking.window_lines", "8").unwrap();
        assert_eq!(updated.chunking.window_lines, 8);
    }

    #[test]
    fn test_set_key_rejects_unknown_key() {
        let settings = Settings::default();
        assert!(set_key(&settings, "rag.nonexistent", "x").is_err());
        assert!(set_key(&settings, "nosection.model", "x").is_err());
    }

    #[test]
    fn test_set_key_rejects_wrong_type() {
        let settings = Settings::default();
        assert!(set_key(&settings, "chunking.window_lines", "not-a-number").is_err());
    }
}
