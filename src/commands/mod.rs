pub mod assertion;
pub mod auth;
pub mod config;
pub mod data_driver;
pub mod execution;
pub mod project;
pub mod report;
pub mod review;
pub mod test_case;
pub mod test_data;
pub mod test_plan;

use std::path::Path;

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::api::ApiClient;
use crate::cli::Cli;
use crate::error::{QgError, Result};

/// What every API-backed command needs: a client and the output mode.
pub struct Context {
    pub client: ApiClient,
    pub json: bool,
}

impl Context {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = cli.load_config()?;
        if !config.output.color {
            colored::control::set_override(false);
        }
        Ok(Self {
            client: ApiClient::from_config(&config)?,
            json: config.output.json,
        })
    }
}

pub fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// Ask before destructive operations unless `--yes` was given.
///
/// JSON mode never prompts, so it requires `--yes`.
pub fn confirm(json: bool, yes: bool, prompt: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if json {
        return Err(QgError::InvalidInput(
            "refusing to continue without --yes in JSON mode".to_string(),
        ));
    }
    Confirm::with_theme(&prompt_theme())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| QgError::PromptError(e.to_string()))
}

/// Read a file argument, with `-` meaning stdin.
pub fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(Path::new(path))?)
    }
}

/// Write to a file when given, otherwise to stdout.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            Ok(())
        }
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
