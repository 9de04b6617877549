use colored::Colorize;
use dialoguer::Input;

use super::{confirm, prompt_theme, Context};
use crate::api::{Project, ProjectCreate, ProjectUpdate};
use crate::cli::{Cli, ProjectCommands};
use crate::error::{QgError, Result};
use crate::output::{self, Table};

pub async fn run(cli: &Cli, command: &ProjectCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        ProjectCommands::List => list(&ctx).await,
        ProjectCommands::Create { name, description } => {
            create(&ctx, name.as_deref(), description.as_deref()).await
        }
        ProjectCommands::Get { id } => get(&ctx, *id).await,
        ProjectCommands::Update {
            id,
            name,
            description,
        } => update(&ctx, *id, name.clone(), description.clone()).await,
        ProjectCommands::Delete { id, yes } => delete(&ctx, *id, *yes).await,
    }
}

async fn list(ctx: &Context) -> Result<()> {
    let projects = ctx.client.list_projects().await?;
    if ctx.json {
        return output::print_json(&projects);
    }

    output::heading(&format!("Projects ({})", projects.len()));
    let mut table = Table::new(["ID", "Name", "Description", "Created"]);
    for p in &projects {
        table.row([
            p.id.to_string(),
            p.name.clone(),
            output::opt(&p.description),
            output::opt(&p.created_at),
        ]);
    }
    table.print();
    Ok(())
}

async fn create(ctx: &Context, name: Option<&str>, description: Option<&str>) -> Result<()> {
    let name = match name {
        Some(n) => n.to_string(),
        None if ctx.json => {
            return Err(QgError::InvalidInput("--name is required in JSON mode".into()))
        }
        None => Input::<String>::with_theme(&prompt_theme())
            .with_prompt("Project name")
            .interact_text()
            .map_err(|e| QgError::PromptError(e.to_string()))?,
    };
    if name.trim().is_empty() {
        return Err(QgError::InvalidInput("project name cannot be empty".into()));
    }

    let description = match description {
        Some(d) => Some(d.to_string()),
        None if ctx.json => None,
        None => {
            let d: String = Input::with_theme(&prompt_theme())
                .with_prompt("Description (optional)")
                .allow_empty(true)
                .interact_text()
                .map_err(|e| QgError::PromptError(e.to_string()))?;
            Some(d).filter(|d| !d.trim().is_empty())
        }
    };

    let project = ctx
        .client
        .create_project(&ProjectCreate {
            name: name.trim().to_string(),
            description,
        })
        .await?;

    if ctx.json {
        return output::print_json(&project);
    }
    output::success(&format!(
        "Created project {} (ID {})",
        project.name.bold(),
        project.id
    ));
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let project = ctx.client.get_project(id).await?;
    if ctx.json {
        return output::print_json(&project);
    }
    print_project(&project);
    Ok(())
}

fn print_project(p: &Project) {
    output::heading(&p.name);
    println!("  {}  {}", "ID:".dimmed(), p.id);
    println!("  {}  {}", "Description:".dimmed(), output::opt(&p.description));
    println!("  {}  {}", "Owner:".dimmed(), output::opt(&p.owner_id));
    println!("  {}  {}", "Created:".dimmed(), output::opt(&p.created_at));
    println!("  {}  {}", "Updated:".dimmed(), output::opt(&p.updated_at));
}

async fn update(
    ctx: &Context,
    id: u64,
    name: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let data = ProjectUpdate { name, description };
    if data.is_empty() {
        return Err(QgError::InvalidInput(
            "nothing to update, pass --name and/or --description".into(),
        ));
    }

    let project = ctx.client.update_project(id, &data).await?;
    if ctx.json {
        return output::print_json(&project);
    }
    output::success(&format!("Updated project {}", project.id));
    Ok(())
}

async fn delete(ctx: &Context, id: u64, yes: bool) -> Result<()> {
    if !confirm(ctx.json, yes, &format!("Delete project {}?", id))? {
        output::hint("Cancelled");
        return Ok(());
    }
    ctx.client.delete_project(id).await?;
    if ctx.json {
        return output::print_json(&serde_json::json!({ "deleted": [id] }));
    }
    output::success(&format!("Deleted project {}", id));
    Ok(())
}
