use colored::Colorize;
use serde_json::Value;

use super::{confirm, read_input, Context};
use crate::api::assertions::ASSERTION_TYPES;
use crate::api::{AssertionLibraryCreate, AssertionLibraryQuery};
use crate::assertions::{infer_assertions, parse_json_object};
use crate::cli::{AssertionCommands, Cli};
use crate::error::{QgError, Result};
use crate::output::{self, Table};

pub async fn run(cli: &Cli, command: &AssertionCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        AssertionCommands::List {
            project,
            kind,
            public,
            search,
        } => {
            let query = AssertionLibraryQuery {
                project_id: *project,
                kind: kind.clone(),
                is_public: public.then_some(true),
                search: search.clone(),
                ..Default::default()
            };
            list(&ctx, &query).await
        }
        AssertionCommands::Get { id } => get(&ctx, *id).await,
        AssertionCommands::Create {
            name,
            kind,
            config,
            description,
            project,
            example,
            public,
        } => {
            if !ASSERTION_TYPES.contains(&kind.as_str()) {
                return Err(QgError::InvalidInput(format!(
                    "unknown assertion type '{}', expected one of: {}",
                    kind,
                    ASSERTION_TYPES.join(", ")
                )));
            }
            let data = AssertionLibraryCreate {
                name: name.clone(),
                description: description.clone(),
                kind: kind.clone(),
                project_id: *project,
                config: config
                    .as_deref()
                    .map(|raw| parse_json_object("config", raw))
                    .transpose()?,
                example: example.clone(),
                is_public: Some(*public),
            };
            create(&ctx, &data).await
        }
        AssertionCommands::Delete { id, yes } => delete(&ctx, *id, *yes).await,
        AssertionCommands::Use { id } => use_library(&ctx, *id).await,
        // local only, never calls the server
        AssertionCommands::Infer {
            response,
            fragment,
            status,
        } => infer(ctx.json, response, fragment.as_deref(), *status),
    }
}

async fn list(ctx: &Context, query: &AssertionLibraryQuery) -> Result<()> {
    let libraries = ctx.client.list_assertion_libraries(query).await?;
    if ctx.json {
        return output::print_json(&libraries);
    }

    output::heading(&format!("Assertion libraries ({})", libraries.len()));
    let mut table = Table::new(["ID", "Name", "Type", "Public", "Uses", "Description"]);
    for a in &libraries {
        table.row([
            a.id.to_string(),
            a.name.clone(),
            a.kind.clone(),
            match a.is_public {
                Some(true) => "yes".to_string(),
                _ => "no".to_string(),
            },
            output::opt(&a.usage_count),
            output::opt(&a.description),
        ]);
    }
    table.print();
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let library = ctx.client.get_assertion_library(id).await?;
    if ctx.json {
        return output::print_json(&library);
    }

    output::heading(&library.name);
    println!("  {}  {}", "ID:".dimmed(), library.id);
    println!("  {}  {}", "Type:".dimmed(), library.kind);
    println!("  {}  {}", "Project:".dimmed(), output::opt(&library.project_id));
    println!("  {}  {}", "Uses:".dimmed(), output::opt(&library.usage_count));
    println!("  {}  {}", "Description:".dimmed(), output::opt(&library.description));
    if let Some(config) = &library.config {
        println!();
        println!("  {}", "Config".bold());
        for line in serde_json::to_string_pretty(config)?.lines() {
            println!("    {}", line);
        }
    }
    if let Some(example) = &library.example {
        println!();
        println!("  {}", "Example".bold());
        println!("    {}", example);
    }
    Ok(())
}

async fn create(ctx: &Context, data: &AssertionLibraryCreate) -> Result<()> {
    let library = ctx.client.create_assertion_library(data).await?;
    if ctx.json {
        return output::print_json(&library);
    }
    output::success(&format!(
        "Created assertion library {} (ID {})",
        library.name.bold(),
        library.id
    ));
    Ok(())
}

async fn delete(ctx: &Context, id: u64, yes: bool) -> Result<()> {
    if !confirm(ctx.json, yes, &format!("Delete assertion library {}?", id))? {
        output::hint("Cancelled");
        return Ok(());
    }
    ctx.client.delete_assertion_library(id).await?;
    if ctx.json {
        return output::print_json(&serde_json::json!({ "deleted": [id] }));
    }
    output::success(&format!("Deleted assertion library {}", id));
    Ok(())
}

async fn use_library(ctx: &Context, id: u64) -> Result<()> {
    let library = ctx.client.use_assertion_library(id).await?;
    let config = library.config.clone().unwrap_or_default();
    if ctx.json {
        return output::print_json(&config);
    }
    output::success(&format!(
        "{} used {} time(s)",
        library.name,
        output::opt(&library.usage_count)
    ));
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn infer(json: bool, response: &str, fragment: Option<&str>, status: Option<u16>) -> Result<()> {
    let text = read_input(response)?;
    let body: Value = serde_json::from_str(&text)
        .map_err(|e| QgError::InvalidInput(format!("--response is not valid JSON: {}", e)))?;

    let fragment = match fragment {
        Some(f) => match f.strip_prefix('@') {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => Some(f.to_string()),
        },
        None => None,
    };

    let assertions = infer_assertions(&body, fragment.as_deref(), status);
    if json {
        return output::print_json(&assertions);
    }

    if assertions.is_empty() {
        output::hint("No assertions could be inferred");
        return Ok(());
    }
    output::heading(&format!("Suggested assertions ({})", assertions.len()));
    for a in &assertions {
        println!("  {} {}", "◆".cyan(), a);
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&assertions)?);
    Ok(())
}
