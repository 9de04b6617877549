use colored::Colorize;

use super::confirm;
use crate::cli::{Cli, ConfigCommands};
use crate::config::{Config, SETTABLE_KEYS};
use crate::error::Result;
use crate::output;

pub async fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }
    match command {
        ConfigCommands::Show => show(cli),
        ConfigCommands::Set { key, value } => set(cli, key, value),
        ConfigCommands::Path => path(cli),
        ConfigCommands::Reset { yes } => reset(cli, *yes),
    }
}

/// Effective settings, token masked.
fn show(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    let token = config.masked_token();

    if config.output.json {
        let mut shown = config.clone();
        shown.api.token = token;
        return output::print_json(&shown);
    }

    output::heading("Configuration");
    println!("  {}  {}", "api.url:".dimmed(), config.api.url);
    println!(
        "  {}  {}",
        "api.token:".dimmed(),
        token.unwrap_or_else(|| "(not set)".dimmed().to_string())
    );
    println!("  {}  {}", "api.timeout_secs:".dimmed(), config.api.timeout_secs);
    println!("  {}  {}", "output.json:".dimmed(), config.output.json);
    println!("  {}  {}", "output.color:".dimmed(), config.output.color);
    println!();
    output::hint(&format!("File: {}", cli.config_path()?.display()));
    Ok(())
}

fn set(cli: &Cli, key: &str, value: &str) -> Result<()> {
    let path = cli.config_path()?;
    let mut config = Config::load_file(&path)?;
    config.set(key, value)?;
    config.save_to(&path)?;

    let shown = if key == "api.token" {
        config.masked_token().unwrap_or_default()
    } else {
        value.to_string()
    };
    if cli.json {
        return output::print_json(&serde_json::json!({ "key": key, "value": shown }));
    }
    output::success(&format!("{} = {}", key, shown));
    Ok(())
}

fn path(cli: &Cli) -> Result<()> {
    let path = cli.config_path()?;
    if cli.json {
        return output::print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        }));
    }
    println!("{}", path.display());
    Ok(())
}

fn reset(cli: &Cli, yes: bool) -> Result<()> {
    let path = cli.config_path()?;
    if !confirm(cli.json, yes, "Reset the configuration to defaults (the token is removed)?")? {
        output::hint("Cancelled");
        return Ok(());
    }
    Config::default().save_to(&path)?;
    if cli.json {
        return output::print_json(&serde_json::json!({ "reset": true }));
    }
    output::success("Configuration reset to defaults");
    output::hint(&format!("Valid keys: {}", SETTABLE_KEYS.join(", ")));
    Ok(())
}
