use colored::Colorize;

use super::{confirm, Context};
use crate::api::{TestDataConfig, TestDataConfigCreate, TestDataItem, TestDataQuery};
use crate::assertions::parse_json_array;
use crate::cli::{Cli, TestDataCommands};
use crate::error::{QgError, Result};
use crate::output::{self, Table};

pub async fn run(cli: &Cli, command: &TestDataCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        TestDataCommands::List {
            project,
            search,
            active,
        } => {
            let query = TestDataQuery {
                project_id: *project,
                is_active: active.then_some(true),
                search: search.clone(),
            };
            list(&ctx, &query).await
        }
        TestDataCommands::Get { id } => get(&ctx, *id).await,
        TestDataCommands::Create {
            name,
            data,
            project,
            description,
        } => {
            let body = TestDataConfigCreate {
                name: name.clone(),
                description: description.clone(),
                project_id: *project,
                data: parse_rows(data)?,
                is_active: Some(true),
            };
            create(&ctx, &body).await
        }
        TestDataCommands::Delete { id, yes } => delete(&ctx, *id, *yes).await,
        TestDataCommands::Usage { id } => usage(&ctx, *id).await,
        TestDataCommands::Associate { config, test_case } => {
            ctx.client.associate_test_data(*test_case, *config).await?;
            if ctx.json {
                return output::print_json(&serde_json::json!({
                    "test_case_id": test_case,
                    "test_data_config_id": config,
                    "associated": true,
                }));
            }
            output::success(&format!(
                "Attached test data config {} to test case {}",
                config, test_case
            ));
            Ok(())
        }
        TestDataCommands::Disassociate { config, test_case } => {
            ctx.client.disassociate_test_data(*test_case, *config).await?;
            if ctx.json {
                return output::print_json(&serde_json::json!({
                    "test_case_id": test_case,
                    "test_data_config_id": config,
                    "associated": false,
                }));
            }
            output::success(&format!(
                "Detached test data config {} from test case {}",
                config, test_case
            ));
            Ok(())
        }
        TestDataCommands::ForCase { test_case } => for_case(&ctx, *test_case).await,
    }
}

/// Data rows are `{request, assertions}` objects.
fn parse_rows(raw: &str) -> Result<Vec<TestDataItem>> {
    parse_json_array("data", raw)?
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            if !row.is_object() {
                return Err(QgError::InvalidInput(format!(
                    "--data: row {} is not a JSON object",
                    i + 1
                )));
            }
            serde_json::from_value(row).map_err(|e| {
                QgError::InvalidInput(format!("--data: row {} is malformed: {}", i + 1, e))
            })
        })
        .collect()
}

async fn list(ctx: &Context, query: &TestDataQuery) -> Result<()> {
    let configs = ctx.client.list_test_data_configs(query).await?;
    if ctx.json {
        return output::print_json(&configs);
    }

    output::heading(&format!("Test data configs ({})", configs.len()));
    let mut table = Table::new(["ID", "Name", "Rows", "Cases", "Active", "Description"]);
    for c in &configs {
        table.row([
            c.id.to_string(),
            c.name.clone(),
            c.data_count.to_string(),
            c.associated_case_count.to_string(),
            if c.is_active { "yes" } else { "no" }.to_string(),
            output::opt(&c.description),
        ]);
    }
    table.print();
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let config = ctx.client.get_test_data_config(id).await?;
    if ctx.json {
        return output::print_json(&config);
    }
    print_config(&config)
}

fn print_config(c: &TestDataConfig) -> Result<()> {
    output::heading(&c.name);
    println!("  {}  {}", "ID:".dimmed(), c.id);
    println!("  {}  {}", "Project:".dimmed(), output::opt(&c.project_id));
    println!("  {}  {}", "Description:".dimmed(), output::opt(&c.description));
    println!("  {}  {}", "Rows:".dimmed(), c.data.len());
    for (i, row) in c.data.iter().enumerate() {
        println!();
        println!(
            "  {} {}",
            format!("#{}", i + 1).bold(),
            format!("({} assertion(s))", row.assertions.len()).dimmed()
        );
        for line in serde_json::to_string_pretty(&row.request)?.lines() {
            println!("    {}", line);
        }
    }
    Ok(())
}

async fn create(ctx: &Context, body: &TestDataConfigCreate) -> Result<()> {
    let config = ctx.client.create_test_data_config(body).await?;
    if ctx.json {
        return output::print_json(&config);
    }
    output::success(&format!(
        "Created test data config {} (ID {}) with {} row(s)",
        config.name.bold(),
        config.id,
        config.data.len()
    ));
    Ok(())
}

async fn delete(ctx: &Context, id: u64, yes: bool) -> Result<()> {
    if !confirm(ctx.json, yes, &format!("Delete test data config {}?", id))? {
        output::hint("Cancelled");
        return Ok(());
    }
    ctx.client.delete_test_data_config(id).await?;
    if ctx.json {
        return output::print_json(&serde_json::json!({ "deleted": [id] }));
    }
    output::success(&format!("Deleted test data config {}", id));
    Ok(())
}

async fn usage(ctx: &Context, id: u64) -> Result<()> {
    let usage = ctx.client.test_data_usage(id).await?;
    if ctx.json {
        return output::print_json(&usage);
    }

    output::heading(&format!("Test cases using config {} ({})", id, usage.len()));
    let mut table = Table::new(["Case ID", "Case", "Project", "Since"]);
    for u in &usage {
        table.row([
            u.test_case_id.to_string(),
            u.test_case_name.clone(),
            u.project_name
                .clone()
                .or_else(|| u.project_id.map(|p| p.to_string()))
                .unwrap_or_else(|| "-".into()),
            output::opt(&u.associated_at),
        ]);
    }
    table.print();
    Ok(())
}

async fn for_case(ctx: &Context, test_case: u64) -> Result<()> {
    let configs = ctx.client.test_case_data_configs(test_case).await?;
    if ctx.json {
        return output::print_json(&configs);
    }

    output::heading(&format!(
        "Test data configs of test case {} ({})",
        test_case,
        configs.len()
    ));
    let mut table = Table::new(["ID", "Name", "Rows", "Description"]);
    for c in &configs {
        table.row([
            c.id.to_string(),
            c.name.clone(),
            c.data.len().to_string(),
            output::opt(&c.description),
        ]);
    }
    table.print();
    Ok(())
}
