use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::ConfigAction;
use mlmd_mock::config::AppConfig;

pub fn run(action: &ConfigAction, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Init => cmd_init(config_path),
        ConfigAction::Show => cmd_show(config_path),
        ConfigAction::Set { key, value } => cmd_set(config_path, key, value),
        ConfigAction::Path => {
            println!("{}", config_path.display());
            Ok(())
        }
    }
}

fn cmd_init(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        bail!(
            "Config already exists at {}\nUse 'mlmd-mock config set' to modify",
            config_path.display()
        );
    }
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let default = AppConfig::default_document();
    std::fs::write(config_path, serde_json::to_string_pretty(&default)?)?;
    println!("Created {}", config_path.display());
    println!("Edit the file or use 'mlmd-mock config set' to change routes.");
    Ok(())
}

fn cmd_show(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        bail!(
            "No config at {}\nRun 'mlmd-mock config init' to create one",
            config_path.display()
        );
    }
    // Parse through AppConfig so the output shows defaults and rejects bad files.
    let config = AppConfig::load(config_path)?;
    config.resolved_routes()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_set(config_path: &Path, key: &str, value: &str) -> Result<()> {
    let mut json: Value = if config_path.exists() {
        let content = std::fs::read_to_string(config_path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?
    } else {
        if let Some(p) = config_path.parent() {
            std::fs::create_dir_all(p)?;
        }
        serde_json::json!({ "version": 1 })
    };
    set_nested(&mut json, key, value)?;

    // Refuse to write something the server could not load.
    let config: AppConfig = serde_json::from_value(json.clone())
        .with_context(|| format!("Setting {key} = {value} produces an invalid config"))?;
    config.resolved_routes()?;

    std::fs::write(config_path, serde_json::to_string_pretty(&json)?)?;
    println!("Set {key} = {value}");
    Ok(())
}

fn set_nested(json: &mut Value, key: &str, val: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((last, parents)) = parts.split_last() else {
        bail!("Empty key");
    };

    let mut cur = json;
    for p in parents {
        if !cur.is_object() {
            *cur = serde_json::json!({});
        }
        let Value::Object(map) = cur else {
            bail!("Cannot descend into {p}");
        };
        cur = map
            .entry(p.to_string())
            .or_insert_with(|| serde_json::json!({}));
    }
    if !cur.is_object() {
        *cur = serde_json::json!({});
    }
    let Value::Object(map) = cur else {
        bail!("Cannot set {last}");
    };

    let typed = if val == "true" {
        Value::Bool(true)
    } else if val == "false" {
        Value::Bool(false)
    } else if let Ok(n) = val.parse::<u64>() {
        Value::Number(n.into())
    } else {
        Value::String(val.to_string())
    };
    map.insert(last.to_string(), typed);
    Ok(())
}
