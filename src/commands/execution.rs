use std::time::{Duration, Instant};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::{confirm, Context};
use crate::api::{ExecutionQuery, ExecutionStatus, TestExecution, TestExecutionCreate};
use crate::cli::{Cli, ExecutionCommands};
use crate::error::{QgError, Result};
use crate::output::{self, Table};

pub async fn run(cli: &Cli, command: &ExecutionCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        ExecutionCommands::List {
            project,
            test_case,
            status,
            skip,
            limit,
        } => {
            let query = ExecutionQuery {
                project_id: *project,
                test_case_id: *test_case,
                status: *status,
                skip: *skip,
                limit: *limit,
                ..Default::default()
            };
            list(&ctx, &query).await
        }
        ExecutionCommands::Get { id } => get(&ctx, *id).await,
        ExecutionCommands::Logs { id } => logs(&ctx, *id).await,
        ExecutionCommands::Run {
            test_case,
            project,
            environment,
            wait,
        } => {
            let data = TestExecutionCreate {
                test_case_id: *test_case,
                project_id: *project,
                config: None,
                environment: environment.clone(),
            };
            run_case(&ctx, &data, *wait).await
        }
        ExecutionCommands::Watch {
            id,
            interval,
            wait_timeout,
        } => {
            let execution = wait_for_execution(&ctx, *id, *interval, *wait_timeout).await?;
            finish(&ctx, &execution)
        }
        ExecutionCommands::Delete { ids, yes } => delete(&ctx, ids, *yes).await,
    }
}

async fn list(ctx: &Context, query: &ExecutionQuery) -> Result<()> {
    let page = ctx.client.list_executions(query).await?;
    if ctx.json {
        return output::print_json(&page);
    }

    output::heading(&format!("Test executions ({})", page.total));
    let mut table = Table::new(["ID", "Test case", "Project", "Status", "Environment", "Started"]);
    for e in &page.items {
        table.row([
            e.id.to_string(),
            output::opt(&e.test_case_id),
            output::opt(&e.project_id),
            e.status.to_string(),
            output::opt(&e.environment),
            output::opt(&e.started_at.clone().or_else(|| e.created_at.clone())),
        ]);
    }
    table.print();
    if (page.items.len() as u64) < page.total {
        output::hint(&format!(
            "Showing {}-{} of {}, use --skip/--limit to page",
            page.skip + 1,
            page.skip + page.items.len() as u64,
            page.total
        ));
    }
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let execution = ctx.client.get_execution(id).await?;
    if ctx.json {
        return output::print_json(&execution);
    }
    print_execution(&execution)
}

fn print_execution(e: &TestExecution) -> Result<()> {
    output::heading(&format!("Execution {}", e.id));
    println!("  {}  {}", "Status:".dimmed(), output::status(&e.status.to_string()));
    println!("  {}  {}", "Test case:".dimmed(), output::opt(&e.test_case_id));
    println!("  {}  {}", "Project:".dimmed(), output::opt(&e.project_id));
    println!("  {}  {}", "Environment:".dimmed(), output::opt(&e.environment));
    println!("  {}  {}", "Started:".dimmed(), output::opt(&e.started_at));
    println!("  {}  {}", "Finished:".dimmed(), output::opt(&e.finished_at));
    if let Some(result) = e.result.as_ref().filter(|r| !r.is_empty()) {
        println!();
        println!("  {}", "Result".bold());
        for line in serde_json::to_string_pretty(result)?.lines() {
            println!("    {}", line);
        }
    }
    Ok(())
}

async fn logs(ctx: &Context, id: u64) -> Result<()> {
    let logs = ctx.client.execution_logs(id).await?;
    if ctx.json {
        return output::print_json(&logs);
    }
    let lines = logs.lines();
    if lines.is_empty() {
        output::hint(&format!("Execution {} has no logs yet", id));
        return Ok(());
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

async fn run_case(ctx: &Context, data: &TestExecutionCreate, wait: bool) -> Result<()> {
    let execution = ctx.client.create_execution(data).await?;
    if !wait {
        if ctx.json {
            return output::print_json(&execution);
        }
        output::success(&format!(
            "Started execution {} for test case {}",
            execution.id.to_string().bold(),
            data.test_case_id
        ));
        output::hint(&format!("Follow it with: qg exec watch {}", execution.id));
        return Ok(());
    }

    let execution = wait_for_execution(ctx, execution.id, 2, 600).await?;
    finish(ctx, &execution)
}

/// Poll an execution until it reaches a terminal status.
///
/// Ctrl+C stops waiting without touching the execution itself.
pub async fn wait_for_execution(
    ctx: &Context,
    id: u64,
    interval_secs: u64,
    timeout_secs: u64,
) -> Result<TestExecution> {
    let interval = Duration::from_secs(interval_secs.max(1));
    let deadline = wait_deadline(Instant::now(), timeout_secs);

    let spinner = if ctx.json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg} {elapsed:.dim}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    };

    let result = loop {
        let execution = match ctx.client.get_execution(id).await {
            Ok(e) => e,
            Err(e) => break Err(e),
        };
        spinner.set_message(format!("Execution {} is {}", id, execution.status));
        tracing::debug!(id, status = %execution.status, "polled execution");

        if execution.status.is_terminal() {
            break Ok(execution);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break Err(QgError::WaitTimeout {
                id,
                secs: timeout_secs,
            });
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                break Err(QgError::Other(format!(
                    "Stopped waiting; execution {} keeps running on the server",
                    id
                )));
            }
        }
    };

    spinner.finish_and_clear();
    result
}

/// `None` when the timeout reaches past what `Instant` can represent.
fn wait_deadline(start: Instant, timeout_secs: u64) -> Option<Instant> {
    start.checked_add(Duration::from_secs(timeout_secs))
}

/// Print the final state of an execution; anything but `passed` is an error.
pub fn finish(ctx: &Context, execution: &TestExecution) -> Result<()> {
    if ctx.json {
        output::print_json(execution)?;
    } else {
        let status = execution.status.to_string();
        let mark = if execution.status == ExecutionStatus::Passed {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} Execution {} {}",
            mark,
            execution.id,
            output::status(&status).bold()
        );
        if let Some(summary) = execution
            .result
            .as_ref()
            .and_then(|r| r.get("summary").or_else(|| r.get("message")))
        {
            match summary {
                serde_json::Value::String(text) => output::hint(text),
                other => output::hint(&other.to_string()),
            }
        }
    }

    if execution.status == ExecutionStatus::Passed {
        Ok(())
    } else {
        Err(QgError::ExecutionFailed {
            id: execution.id,
            status: execution.status.to_string(),
        })
    }
}

async fn delete(ctx: &Context, ids: &[u64], yes: bool) -> Result<()> {
    let prompt = match ids {
        [id] => format!("Delete execution {}?", id),
        _ => format!("Delete {} executions?", ids.len()),
    };
    if !confirm(ctx.json, yes, &prompt)? {
        output::hint("Cancelled");
        return Ok(());
    }

    match ids {
        [id] => ctx.client.delete_execution(*id).await?,
        _ => ctx.client.batch_delete_executions(ids).await?,
    }
    if ctx.json {
        return output::print_json(&serde_json::json!({ "deleted": ids }));
    }
    output::success(&format!("Deleted {} execution(s)", ids.len()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_deadline() {
        let start = Instant::now();
        assert_eq!(wait_deadline(start, 600), Some(start + Duration::from_secs(600)));
        assert_eq!(wait_deadline(start, u64::MAX), None);
    }
}
