use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use super::{confirm, read_input, write_output, Context};
use crate::api::{TestCase, TestCaseCreate, TestCaseQuery, TestCaseUpdate};
use crate::assertions::{parse_json_array, parse_json_object};
use crate::cli::{CaseExportFormat, Cli, ImportFormat, TestCaseCommands};
use crate::error::{QgError, Result};
use crate::output::{self, Table};
use crate::transfer::{curl, html, openapi, postman, CaseDraft};

/// Upper bound on cases fetched for an export.
const EXPORT_LIMIT: u64 = 1000;

pub async fn run(cli: &Cli, command: &TestCaseCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        TestCaseCommands::List {
            project,
            test_type,
            status,
            module,
            search,
            skip,
            limit,
        } => {
            let query = TestCaseQuery {
                project_id: *project,
                test_type: *test_type,
                status: status.clone(),
                module: module.clone(),
                search: search.clone(),
                skip: *skip,
                limit: *limit,
            };
            list(&ctx, &query).await
        }
        TestCaseCommands::Get { id } => get(&ctx, *id).await,
        TestCaseCommands::Create {
            project,
            name,
            test_type,
            description,
            tags,
            steps,
            config,
        } => {
            let data = TestCaseCreate {
                name: name.clone(),
                description: description.clone(),
                project_id: *project,
                test_type: *test_type,
                steps: steps.as_deref().map(parse_steps).transpose()?,
                config: config
                    .as_deref()
                    .map(|raw| parse_json_object("config", raw))
                    .transpose()?,
                tags: if tags.is_empty() {
                    None
                } else {
                    Some(tags.clone())
                },
            };
            create(&ctx, &data).await
        }
        TestCaseCommands::Update {
            id,
            name,
            description,
            status,
            module,
            tags,
            config,
        } => {
            let data = TestCaseUpdate {
                name: name.clone(),
                description: description.clone(),
                status: status.clone(),
                module: module.clone(),
                tags: tags.clone(),
                config: config
                    .as_deref()
                    .map(|raw| parse_json_object("config", raw))
                    .transpose()?,
                ..Default::default()
            };
            update(&ctx, *id, &data).await
        }
        TestCaseCommands::Delete { id, yes } => delete(&ctx, *id, *yes).await,
        TestCaseCommands::Import {
            file,
            format,
            project,
            dry_run,
        } => import(&ctx, file, *format, *project, *dry_run).await,
        TestCaseCommands::Export {
            project,
            format,
            output,
        } => export(&ctx, *project, *format, output.as_deref()).await,
    }
}

/// Steps must be an array of JSON objects.
fn parse_steps(raw: &str) -> Result<Vec<serde_json::Map<String, Value>>> {
    parse_json_array("steps", raw)?
        .into_iter()
        .enumerate()
        .map(|(i, step)| match step {
            Value::Object(map) => Ok(map),
            _ => Err(QgError::InvalidInput(format!(
                "--steps: step {} is not a JSON object",
                i + 1
            ))),
        })
        .collect()
}

async fn list(ctx: &Context, query: &TestCaseQuery) -> Result<()> {
    let cases = ctx.client.list_test_cases(query).await?;
    if ctx.json {
        return output::print_json(&cases);
    }

    output::heading(&format!("Test cases ({})", cases.len()));
    let mut table = Table::new(["ID", "Name", "Type", "Status", "Module", "Project"]);
    for c in &cases {
        table.row([
            c.id.to_string(),
            c.name.clone(),
            c.test_type.to_string(),
            output::opt(&c.status),
            output::opt(&c.module),
            c.project_id.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let case = ctx.client.get_test_case(id).await?;
    if ctx.json {
        return output::print_json(&case);
    }
    print_case(&case)
}

fn print_case(c: &TestCase) -> Result<()> {
    output::heading(&c.name);
    println!("  {}  {}", "ID:".dimmed(), c.id);
    println!("  {}  {}", "Project:".dimmed(), c.project_id);
    println!("  {}  {}", "Type:".dimmed(), c.test_type);
    println!(
        "  {}  {}",
        "Status:".dimmed(),
        output::status(c.status.as_deref().unwrap_or("-"))
    );
    println!("  {}  {}", "Module:".dimmed(), output::opt(&c.module));
    if let Some(tags) = c.tags.as_ref().filter(|t| !t.is_empty()) {
        println!("  {}  {}", "Tags:".dimmed(), tags.join(", "));
    }
    if let Some(description) = &c.description {
        println!("  {}  {}", "Description:".dimmed(), description);
    }
    if let Some(steps) = c.steps.as_ref().filter(|s| !s.is_empty()) {
        println!();
        println!("  {}", "Steps".bold());
        println!("{}", indent(&serde_json::to_string_pretty(steps)?));
    }
    if let Some(config) = c.config.as_ref().filter(|c| !c.is_empty()) {
        println!();
        println!("  {}", "Config".bold());
        println!("{}", indent(&serde_json::to_string_pretty(config)?));
    }
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn create(ctx: &Context, data: &TestCaseCreate) -> Result<()> {
    let case = ctx.client.create_test_case(data).await?;
    if ctx.json {
        return output::print_json(&case);
    }
    output::success(&format!("Created test case {} (ID {})", case.name.bold(), case.id));
    Ok(())
}

async fn update(ctx: &Context, id: u64, data: &TestCaseUpdate) -> Result<()> {
    let case = ctx.client.update_test_case(id, data).await?;
    if ctx.json {
        return output::print_json(&case);
    }
    output::success(&format!("Updated test case {}", case.id));
    Ok(())
}

async fn delete(ctx: &Context, id: u64, yes: bool) -> Result<()> {
    if !confirm(ctx.json, yes, &format!("Delete test case {}?", id))? {
        output::hint("Cancelled");
        return Ok(());
    }
    ctx.client.delete_test_case(id).await?;
    if ctx.json {
        return output::print_json(&serde_json::json!({ "deleted": [id] }));
    }
    output::success(&format!("Deleted test case {}", id));
    Ok(())
}

/// Decode an input document that may be JSON or YAML.
fn parse_document(text: &str) -> Result<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| {
            QgError::ImportError(format!(
                "input is neither JSON ({}) nor YAML ({})",
                json_err, yaml_err
            ))
        }),
    }
}

pub fn parse_drafts(text: &str, format: ImportFormat) -> Result<Vec<CaseDraft>> {
    match format {
        ImportFormat::Curl => Ok(vec![curl::parse_curl(text.trim())?.into_draft()]),
        ImportFormat::Postman => postman::parse_collection(&parse_document(text)?),
        ImportFormat::Openapi => openapi::parse_spec(&parse_document(text)?),
    }
}

#[derive(Serialize)]
struct ImportFailure {
    name: String,
    error: String,
}

#[derive(Serialize)]
struct ImportSummary {
    created: Vec<TestCase>,
    failed: Vec<ImportFailure>,
}

async fn import(
    ctx: &Context,
    file: &str,
    format: ImportFormat,
    project: u64,
    dry_run: bool,
) -> Result<()> {
    let text = read_input(file)?;
    let drafts = parse_drafts(&text, format)?;
    if drafts.is_empty() {
        return Err(QgError::ImportError("no requests found in input".into()));
    }

    if dry_run {
        let creates: Vec<TestCaseCreate> = drafts.iter().map(|d| d.to_create(project)).collect();
        if ctx.json {
            return output::print_json(&creates);
        }
        output::heading(&format!("Would import {} test case(s)", drafts.len()));
        print_drafts(&drafts);
        return Ok(());
    }

    let mut summary = ImportSummary {
        created: Vec::new(),
        failed: Vec::new(),
    };
    for draft in &drafts {
        match ctx.client.create_test_case(&draft.to_create(project)).await {
            Ok(case) => summary.created.push(case),
            Err(e) => {
                tracing::warn!(name = %draft.name, error = %e, "failed to import test case");
                summary.failed.push(ImportFailure {
                    name: draft.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if ctx.json {
        output::print_json(&summary)?;
    } else {
        for case in &summary.created {
            output::success(&format!("{} (ID {})", case.name, case.id));
        }
        for failure in &summary.failed {
            println!("  {} {}: {}", "✗".red(), failure.name, failure.error);
        }
        println!();
        output::hint(&format!(
            "Imported {} of {} test case(s) into project {}",
            summary.created.len(),
            drafts.len(),
            project
        ));
    }

    if summary.created.is_empty() {
        return Err(QgError::ImportError("no test cases were created".into()));
    }
    Ok(())
}

fn print_drafts(drafts: &[CaseDraft]) {
    let mut table = Table::new(["Method", "Path", "Name", "Assertions"]);
    for d in drafts {
        table.row([
            d.method.clone(),
            d.path.clone(),
            d.name.clone(),
            d.assertions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        ]);
    }
    table.print();
}

async fn export(
    ctx: &Context,
    project: u64,
    format: CaseExportFormat,
    output_path: Option<&Path>,
) -> Result<()> {
    let project = ctx.client.get_project(project).await?;
    let cases = ctx
        .client
        .list_test_cases(&TestCaseQuery {
            project_id: Some(project.id),
            limit: Some(EXPORT_LIMIT),
            ..Default::default()
        })
        .await?;
    let drafts: Vec<CaseDraft> = cases.iter().filter_map(CaseDraft::from_test_case).collect();
    let skipped = cases.len() - drafts.len();
    if skipped > 0 {
        tracing::info!(skipped, "non-API test cases are not exported");
    }

    let content = match format {
        CaseExportFormat::Postman => {
            serde_json::to_string_pretty(&postman::to_collection(&project.name, &drafts))?
        }
        CaseExportFormat::Html => html::render(&project.name, &drafts),
    };
    write_output(output_path, &content)?;

    if let Some(path) = output_path {
        if ctx.json {
            return output::print_json(&serde_json::json!({
                "exported": drafts.len(),
                "skipped": skipped,
                "path": path.display().to_string(),
            }));
        }
        output::success(&format!(
            "Exported {} test case(s) to {}",
            drafts.len(),
            path.display()
        ));
        if skipped > 0 {
            output::hint(&format!("{} non-API test case(s) skipped", skipped));
        }
    }
    Ok(())
}
