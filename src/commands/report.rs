use std::path::Path;

use colored::Colorize;

use super::{confirm, write_output, Context};
use crate::api::{ExportFormat, ReportCounts, ReportQuery};
use crate::cli::{Cli, ReportCommands};
use crate::error::Result;
use crate::output::{self, Table};

pub async fn run(cli: &Cli, command: &ReportCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        ReportCommands::List { project, limit } => {
            let query = ReportQuery {
                project_id: *project,
                limit: *limit,
                ..Default::default()
            };
            list(&ctx, &query).await
        }
        ReportCommands::Get { id } => get(&ctx, *id).await,
        ReportCommands::Export { id, format, output } => {
            export(&ctx, *id, *format, output.as_deref()).await
        }
        ReportCommands::Delete { ids, yes } => delete(&ctx, ids, *yes).await,
    }
}

fn rate(counts: Option<&ReportCounts>) -> String {
    counts
        .and_then(ReportCounts::pass_rate)
        .map(|r| format!("{:.1}%", r))
        .unwrap_or_else(|| "-".to_string())
}

async fn list(ctx: &Context, query: &ReportQuery) -> Result<()> {
    let reports = ctx.client.list_reports(query).await?;
    if ctx.json {
        return output::print_json(&reports);
    }

    output::heading(&format!("Reports ({})", reports.len()));
    let mut table = Table::new(["ID", "Execution", "Project", "Status", "Passed", "Created"]);
    for r in &reports {
        table.row([
            r.id.to_string(),
            output::opt(&r.execution_id),
            output::opt(&r.project_id),
            output::opt(&r.status),
            rate(r.summary.as_ref()),
            output::opt(&r.created_at),
        ]);
    }
    table.print();
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let report = ctx.client.get_report(id).await?;
    if ctx.json {
        return output::print_json(&report);
    }

    let s = &report.summary;
    output::heading(&format!("Report {}", s.id));
    println!(
        "  {}  {}",
        "Status:".dimmed(),
        output::status(s.status.as_deref().unwrap_or("-"))
    );
    println!("  {}  {}", "Execution:".dimmed(), output::opt(&s.execution_id));
    println!("  {}  {}", "Test case:".dimmed(), output::opt(&report.test_case_name));
    println!("  {}  {}", "Environment:".dimmed(), output::opt(&report.environment));
    println!("  {}  {}", "Started:".dimmed(), output::opt(&report.started_at));
    println!("  {}  {}", "Finished:".dimmed(), output::opt(&report.finished_at));
    if let Some(counts) = &s.summary {
        println!(
            "  {}  {} total, {} passed, {} failed, {} skipped ({})",
            "Summary:".dimmed(),
            counts.total,
            counts.passed.to_string().green(),
            counts.failed.to_string().red(),
            counts.skipped,
            rate(Some(counts))
        );
    }
    if let Some(result) = report.result.as_ref().filter(|r| !r.is_null()) {
        println!();
        println!("  {}", "Result".bold());
        for line in serde_json::to_string_pretty(result)?.lines() {
            println!("    {}", line);
        }
    }
    Ok(())
}

async fn export(ctx: &Context, id: u64, format: ExportFormat, output_path: Option<&Path>) -> Result<()> {
    let content = ctx.client.export_report(id, format).await?;
    write_output(output_path, &content)?;
    if let Some(path) = output_path {
        if ctx.json {
            return output::print_json(&serde_json::json!({
                "report_id": id,
                "format": format,
                "path": path.display().to_string(),
            }));
        }
        output::success(&format!(
            "Exported report {} as {} to {}",
            id,
            format,
            path.display()
        ));
    }
    Ok(())
}

async fn delete(ctx: &Context, ids: &[u64], yes: bool) -> Result<()> {
    let prompt = match ids {
        [id] => format!("Delete report {}?", id),
        _ => format!("Delete {} reports?", ids.len()),
    };
    if !confirm(ctx.json, yes, &prompt)? {
        output::hint("Cancelled");
        return Ok(());
    }

    match ids {
        [id] => ctx.client.delete_report(*id).await?,
        _ => ctx.client.batch_delete_reports(ids).await?,
    }
    if ctx.json {
        return output::print_json(&serde_json::json!({ "deleted": ids }));
    }
    output::success(&format!("Deleted {} report(s)", ids.len()));
    Ok(())
}
