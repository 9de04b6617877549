use colored::Colorize;
use dialoguer::{Input, Password};

use super::{prompt_theme, Context};
use crate::api::{LoginRequest, RegisterRequest, UserResponse};
use crate::cli::{AuthCommands, Cli};
use crate::config::Config;
use crate::error::{QgError, Result};
use crate::output;

pub async fn run(cli: &Cli, command: &AuthCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        AuthCommands::Login { username, password } => {
            login(cli, &ctx, username.as_deref(), password.as_deref()).await
        }
        AuthCommands::Register {
            username,
            email,
            password,
        } => register(&ctx, username, email, password.as_deref()).await,
        AuthCommands::Logout => logout(cli, &ctx).await,
        AuthCommands::Whoami => whoami(&ctx).await,
    }
}

fn prompt_username(json: bool) -> Result<String> {
    if json {
        return Err(QgError::InvalidInput(
            "--username is required in JSON mode".into(),
        ));
    }
    Input::with_theme(&prompt_theme())
        .with_prompt("Username")
        .interact_text()
        .map_err(|e| QgError::PromptError(e.to_string()))
}

fn prompt_password(json: bool, confirm: bool) -> Result<String> {
    if json {
        return Err(QgError::InvalidInput(
            "--password (or QG_PASSWORD) is required in JSON mode".into(),
        ));
    }
    let theme = prompt_theme();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    prompt
        .interact()
        .map_err(|e| QgError::PromptError(e.to_string()))
}

async fn login(
    cli: &Cli,
    ctx: &Context,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    let username = match username {
        Some(u) => u.to_string(),
        None => prompt_username(ctx.json)?,
    };
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt_password(ctx.json, false)?,
    };

    let token = ctx
        .client
        .login(&LoginRequest {
            username: username.clone(),
            password,
        })
        .await?;

    // only persisted values go back to disk, never env overrides
    let path = cli.config_path()?;
    let mut config = Config::load_file(&path)?;
    if let Some(url) = &cli.api_url {
        config.set("api.url", url)?;
    }
    config.api.token = Some(token.access_token.clone());
    config.save_to(&path)?;
    tracing::info!(user = %username, "logged in");

    if ctx.json {
        return output::print_json(&serde_json::json!({
            "username": username,
            "token_type": token.token_type,
            "config": path.display().to_string(),
        }));
    }
    output::success(&format!("Logged in as {}", username.bold()));
    output::hint(&format!("Token saved to {}", path.display()));
    Ok(())
}

async fn register(
    ctx: &Context,
    username: &str,
    email: &str,
    password: Option<&str>,
) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt_password(ctx.json, true)?,
    };
    let user = ctx
        .client
        .register(&RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password,
        })
        .await?;

    if ctx.json {
        return output::print_json(&user);
    }
    output::success(&format!("Registered {}", user.username.bold()));
    output::hint(&format!("Log in with: qg auth login -u {}", user.username));
    Ok(())
}

async fn logout(cli: &Cli, ctx: &Context) -> Result<()> {
    if ctx.client.has_token() {
        // tokens are stateless JWTs, so a failed server call is not fatal
        if let Err(e) = ctx.client.logout().await {
            tracing::warn!(error = %e, "server-side logout failed");
        }
    }

    let path = cli.config_path()?;
    let mut config = Config::load_file(&path)?;
    let had_token = config.api.token.take().is_some();
    if had_token {
        config.save_to(&path)?;
    }

    if ctx.json {
        return output::print_json(&serde_json::json!({ "logged_out": had_token }));
    }
    if had_token {
        output::success("Logged out, token removed from config");
    } else {
        output::hint("No stored token, nothing to do");
    }
    Ok(())
}

async fn whoami(ctx: &Context) -> Result<()> {
    if !ctx.client.has_token() {
        return Err(QgError::Unauthorized);
    }
    let user = ctx.client.current_user().await?;
    if ctx.json {
        return output::print_json(&user);
    }
    print_user(&user, ctx.client.base_url());
    Ok(())
}

fn print_user(user: &UserResponse, server: &str) {
    output::heading(&user.username);
    println!("  {}  {}", "ID:".dimmed(), output::opt(&user.id));
    println!("  {}  {}", "Email:".dimmed(), output::opt(&user.email));
    if user.is_superuser == Some(true) {
        println!("  {}  {}", "Role:".dimmed(), "superuser".yellow());
    }
    println!("  {}  {}", "Server:".dimmed(), server);
}
