use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{confirm, Context};
use crate::api::{
    DataDriverCreate, DataDriverKind, DataDriverQuery, DataGenerator, DataSource, DataTemplate,
};
use crate::assertions::parse_json_object;
use crate::cli::{Cli, DataDriverAction, DataDriverCommands};
use crate::error::{QgError, Result};
use crate::output::{self, Table};

/// Table layout for one data-driver resource.
trait DriverRow: DeserializeOwned + Serialize {
    const HEADERS: [&'static str; 5];

    fn id(&self) -> u64;
    fn name(&self) -> &str;
    fn cells(&self) -> [String; 5];
}

fn active(flag: Option<bool>) -> String {
    match flag {
        Some(false) => "no".into(),
        _ => "yes".into(),
    }
}

impl DriverRow for DataSource {
    const HEADERS: [&'static str; 5] = ["ID", "Name", "Type", "Active", "Description"];

    fn id(&self) -> u64 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn cells(&self) -> [String; 5] {
        [
            self.id.to_string(),
            self.name.clone(),
            self.kind.clone(),
            active(self.is_active),
            output::opt(&self.description),
        ]
    }
}

impl DriverRow for DataTemplate {
    const HEADERS: [&'static str; 5] = ["ID", "Name", "Source", "Loop", "Description"];

    fn id(&self) -> u64 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn cells(&self) -> [String; 5] {
        [
            self.id.to_string(),
            self.name.clone(),
            self.data_source_id.to_string(),
            output::opt(&self.loop_strategy),
            output::opt(&self.description),
        ]
    }
}

impl DriverRow for DataGenerator {
    const HEADERS: [&'static str; 5] = ["ID", "Name", "Type", "Active", "Description"];

    fn id(&self) -> u64 {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn cells(&self) -> [String; 5] {
        [
            self.id.to_string(),
            self.name.clone(),
            self.kind.clone(),
            active(self.is_active),
            output::opt(&self.description),
        ]
    }
}

pub async fn run(cli: &Cli, command: &DataDriverCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        DataDriverCommands::Source { command } => {
            action::<DataSource>(&ctx, DataDriverKind::Source, command).await
        }
        DataDriverCommands::Template { command } => {
            action::<DataTemplate>(&ctx, DataDriverKind::Template, command).await
        }
        DataDriverCommands::Generator { command } => {
            action::<DataGenerator>(&ctx, DataDriverKind::Generator, command).await
        }
    }
}

async fn action<T: DriverRow>(
    ctx: &Context,
    kind: DataDriverKind,
    command: &DataDriverAction,
) -> Result<()> {
    match command {
        DataDriverAction::List { project, search } => {
            let query = DataDriverQuery {
                project_id: *project,
                search: search.clone(),
                ..Default::default()
            };
            let items: Vec<T> = ctx.client.list_data_drivers(kind, &query).await?;
            if ctx.json {
                return output::print_json(&items);
            }
            output::heading(&format!("{}s ({})", capitalize(kind.label()), items.len()));
            let mut table = Table::new(T::HEADERS);
            for item in &items {
                table.row(item.cells());
            }
            table.print();
            Ok(())
        }
        DataDriverAction::Get { id } => {
            let item: T = ctx.client.get_data_driver(kind, *id).await?;
            if ctx.json {
                return output::print_json(&item);
            }
            output::heading(item.name());
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(())
        }
        DataDriverAction::Create {
            name,
            kind: driver_type,
            project,
            source,
            config,
            description,
        } => {
            let data = build_create(
                kind,
                name,
                driver_type.as_deref(),
                *project,
                *source,
                config.as_deref(),
                description.as_deref(),
            )?;
            let item: T = ctx.client.create_data_driver(kind, &data).await?;
            if ctx.json {
                return output::print_json(&item);
            }
            output::success(&format!(
                "Created {} {} (ID {})",
                kind.label(),
                item.name().bold(),
                item.id()
            ));
            Ok(())
        }
        DataDriverAction::Delete { id, yes } => {
            if !confirm(ctx.json, *yes, &format!("Delete {} {}?", kind.label(), id))? {
                output::hint("Cancelled");
                return Ok(());
            }
            ctx.client.delete_data_driver(kind, *id).await?;
            if ctx.json {
                return output::print_json(&serde_json::json!({ "deleted": [id] }));
            }
            output::success(&format!("Deleted {} {}", kind.label(), id));
            Ok(())
        }
    }
}

/// Validate create arguments for the target kind.
fn build_create(
    kind: DataDriverKind,
    name: &str,
    driver_type: Option<&str>,
    project: Option<u64>,
    source: Option<u64>,
    config: Option<&str>,
    description: Option<&str>,
) -> Result<DataDriverCreate> {
    let config = config
        .map(|raw| parse_json_object("config", raw))
        .transpose()?;
    let mut data = DataDriverCreate {
        name: name.to_string(),
        description: description.map(str::to_string),
        project_id: project,
        ..Default::default()
    };

    match kind {
        DataDriverKind::Template => {
            data.data_source_id = Some(source.ok_or_else(|| {
                QgError::InvalidInput("--source is required for data templates".into())
            })?);
            data.mapping = config;
        }
        DataDriverKind::Source | DataDriverKind::Generator => {
            let driver_type = driver_type.ok_or_else(|| {
                QgError::InvalidInput(format!("--type is required for {}s", kind.label()))
            })?;
            data.kind = Some(driver_type.to_string());
            data.config = config;
        }
    }
    Ok(data)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
