use colored::Colorize;

use super::execution::{finish, wait_for_execution};
use super::{confirm, Context};
use crate::api::TestPlanCreate;
use crate::cli::{Cli, TestPlanCommands};
use crate::error::Result;
use crate::output::{self, Table};

pub async fn run(cli: &Cli, command: &TestPlanCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        TestPlanCommands::List { project } => list(&ctx, *project).await,
        TestPlanCommands::Get { id } => get(&ctx, *id).await,
        TestPlanCommands::Create {
            name,
            project,
            cases,
            description,
        } => {
            let data = TestPlanCreate {
                name: name.clone(),
                description: description.clone(),
                project_id: *project,
                test_case_ids: cases.clone(),
                config: None,
            };
            create(&ctx, &data).await
        }
        TestPlanCommands::Delete { id, yes } => delete(&ctx, *id, *yes).await,
        TestPlanCommands::Execute {
            id,
            wait,
            interval,
            wait_timeout,
        } => execute(&ctx, *id, *wait, *interval, *wait_timeout).await,
    }
}

async fn list(ctx: &Context, project: Option<u64>) -> Result<()> {
    let plans = ctx.client.list_test_plans(project).await?;
    if ctx.json {
        return output::print_json(&plans);
    }

    output::heading(&format!("Test plans ({})", plans.len()));
    let mut table = Table::new(["ID", "Name", "Project", "Cases", "Description"]);
    for p in &plans {
        table.row([
            p.id.to_string(),
            p.name.clone(),
            output::opt(&p.project_id),
            p.test_case_ids
                .as_ref()
                .map(|ids| ids.len().to_string())
                .unwrap_or_else(|| "-".into()),
            output::opt(&p.description),
        ]);
    }
    table.print();
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let plan = ctx.client.get_test_plan(id).await?;
    if ctx.json {
        return output::print_json(&plan);
    }

    output::heading(&plan.name);
    println!("  {}  {}", "ID:".dimmed(), plan.id);
    println!("  {}  {}", "Project:".dimmed(), output::opt(&plan.project_id));
    println!("  {}  {}", "Description:".dimmed(), output::opt(&plan.description));
    if let Some(ids) = &plan.test_case_ids {
        let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
        println!("  {}  {}", "Test cases:".dimmed(), ids.join(", "));
    }
    if let Some(schedule) = plan.schedule.as_ref().filter(|s| !s.is_null()) {
        println!("  {}  {}", "Schedule:".dimmed(), schedule);
    }
    Ok(())
}

async fn create(ctx: &Context, data: &TestPlanCreate) -> Result<()> {
    let plan = ctx.client.create_test_plan(data).await?;
    if ctx.json {
        return output::print_json(&plan);
    }
    output::success(&format!(
        "Created test plan {} (ID {}) with {} test case(s)",
        plan.name.bold(),
        plan.id,
        data.test_case_ids.len()
    ));
    Ok(())
}

async fn delete(ctx: &Context, id: u64, yes: bool) -> Result<()> {
    if !confirm(ctx.json, yes, &format!("Delete test plan {}?", id))? {
        output::hint("Cancelled");
        return Ok(());
    }
    ctx.client.delete_test_plan(id).await?;
    if ctx.json {
        return output::print_json(&serde_json::json!({ "deleted": [id] }));
    }
    output::success(&format!("Deleted test plan {}", id));
    Ok(())
}

async fn execute(ctx: &Context, id: u64, wait: bool, interval: u64, timeout: u64) -> Result<()> {
    let started = ctx.client.execute_test_plan(id).await?;
    tracing::info!(plan = id, execution = started.execution_id, "test plan started");

    if !wait {
        if ctx.json {
            return output::print_json(&started);
        }
        output::success(&format!(
            "Test plan {} started, execution ID {}",
            id,
            started.execution_id.to_string().bold()
        ));
        output::hint(&format!(
            "Follow it with: qg exec watch {}",
            started.execution_id
        ));
        return Ok(());
    }

    if !ctx.json {
        output::hint(&format!(
            "Test plan {} started, execution ID {}",
            id, started.execution_id
        ));
    }
    let execution = wait_for_execution(ctx, started.execution_id, interval, timeout).await?;
    finish(ctx, &execution)
}
