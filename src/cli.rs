use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::api::{ExecutionStatus, ExportFormat, ReviewStatus, TestType};
use crate::commands;
use crate::config::Config;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "qg")]
#[command(author, version, about = "QualityGuard CLI - command-line client for the test management platform", long_about = None)]
pub struct Cli {
    /// API base URL (overrides config and QG_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides config and QG_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Config file to use instead of ~/.qualityguard/config.toml
    #[arg(long = "config-file", env = "QG_CONFIG", global = true)]
    pub config_file: Option<PathBuf>,

    /// Output raw JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, log out, show the current user
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Manage the CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Manage test cases
    #[command(name = "test-case", alias = "tc")]
    TestCase {
        #[command(subcommand)]
        command: TestCaseCommands,
    },

    /// Manage and run test plans
    #[command(name = "test-plan", alias = "tp")]
    TestPlan {
        #[command(subcommand)]
        command: TestPlanCommands,
    },

    /// Inspect test executions
    #[command(alias = "exec")]
    Execution {
        #[command(subcommand)]
        command: ExecutionCommands,
    },

    /// Browse and export test reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Manage the assertion library and infer assertions from responses
    Assertion {
        #[command(subcommand)]
        command: AssertionCommands,
    },

    /// Manage data sources, templates and generators
    #[command(name = "data-driver", alias = "dd")]
    DataDriver {
        #[command(subcommand)]
        command: DataDriverCommands,
    },

    /// Manage data-driven test configurations
    #[command(name = "test-data", alias = "td")]
    TestData {
        #[command(subcommand)]
        command: TestDataCommands,
    },

    /// Run test case reviews
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Log in and store the access token in the config file
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Password (prompted when omitted)
        #[arg(short, long, env = "QG_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "QG_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show the user the current token belongs to
    Whoami,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Set a configuration value (api.url, api.token, api.timeout_secs, output.json, output.color)
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Restore defaults
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List all projects
    List,
    /// Create a project (prompts for missing fields)
    Create {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show a project
    Get { id: u64 },
    /// Rename or re-describe a project
    Update {
        id: u64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a project
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum TestCaseCommands {
    /// List test cases
    List {
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short = 't', long = "type", value_enum)]
        test_type: Option<TestType>,
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long)]
        module: Option<String>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        skip: Option<u64>,
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// Show a test case
    Get { id: u64 },
    /// Create a test case
    Create {
        #[arg(short, long)]
        project: u64,
        #[arg(short, long)]
        name: String,
        #[arg(short = 't', long = "type", value_enum, default_value = "api")]
        test_type: TestType,
        #[arg(short, long)]
        description: Option<String>,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Steps as a JSON array (or @file)
        #[arg(long)]
        steps: Option<String>,
        /// Config as a JSON object (or @file)
        #[arg(long)]
        config: Option<String>,
    },
    /// Update fields of a test case
    Update {
        id: u64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long)]
        module: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Config as a JSON object (or @file)
        #[arg(long)]
        config: Option<String>,
    },
    /// Delete a test case
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Import test cases from a curl command, Postman collection or OpenAPI document
    Import {
        /// Input file, or '-' for stdin
        file: String,
        #[arg(short, long, value_enum)]
        format: ImportFormat,
        #[arg(short, long)]
        project: u64,
        /// Parse and show what would be created without calling the API
        #[arg(long)]
        dry_run: bool,
    },
    /// Export a project's API test cases
    Export {
        #[arg(short, long)]
        project: u64,
        #[arg(short, long, value_enum, default_value = "postman")]
        format: CaseExportFormat,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFormat {
    Curl,
    Postman,
    Openapi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaseExportFormat {
    Postman,
    Html,
}

#[derive(Subcommand)]
pub enum TestPlanCommands {
    /// List test plans
    List {
        #[arg(short, long)]
        project: Option<u64>,
    },
    /// Show a test plan
    Get { id: u64 },
    /// Create a test plan from test case IDs
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        project: u64,
        /// Test case ID (repeatable)
        #[arg(short = 'c', long = "case", required = true)]
        cases: Vec<u64>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a test plan
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Start executing a test plan
    Execute {
        id: u64,
        /// Wait for the execution to finish
        #[arg(short, long)]
        wait: bool,
        /// Poll interval in seconds while waiting
        #[arg(long, default_value_t = 2)]
        interval: u64,
        /// Give up waiting after this many seconds
        #[arg(long, default_value_t = 600)]
        wait_timeout: u64,
    },
}

#[derive(Subcommand)]
pub enum ExecutionCommands {
    /// List test executions
    List {
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short = 'c', long = "case")]
        test_case: Option<u64>,
        #[arg(short, long, value_enum)]
        status: Option<ExecutionStatus>,
        #[arg(long)]
        skip: Option<u64>,
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// Show an execution
    Get { id: u64 },
    /// Print the logs of an execution
    Logs { id: u64 },
    /// Run a single test case
    Run {
        #[arg(short = 'c', long = "case")]
        test_case: u64,
        #[arg(short, long)]
        project: u64,
        #[arg(short, long)]
        environment: Option<String>,
        #[arg(short, long)]
        wait: bool,
    },
    /// Poll an execution until it finishes
    Watch {
        id: u64,
        #[arg(long, default_value_t = 2)]
        interval: u64,
        #[arg(long, default_value_t = 600)]
        wait_timeout: u64,
    },
    /// Delete one or more executions
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// List reports
    List {
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// Show a report
    Get { id: u64 },
    /// Export a report
    Export {
        id: u64,
        #[arg(short, long, value_enum, default_value = "html")]
        format: ExportFormat,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete one or more reports
    Delete {
        #[arg(required = true)]
        ids: Vec<u64>,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum AssertionCommands {
    /// List assertion libraries
    List {
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        #[arg(long)]
        public: bool,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show an assertion library
    Get { id: u64 },
    /// Create an assertion library
    Create {
        #[arg(short, long)]
        name: String,
        /// status_code, response_body, response_headers, response_time, database, script, combined
        #[arg(short = 't', long = "type")]
        kind: String,
        /// Assertion config as a JSON object (or @file)
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(long)]
        example: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// Delete an assertion library
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Record a use of an assertion library and print its config
    Use { id: u64 },
    /// Suggest assertions from a response body
    Infer {
        /// JSON response file, or '-' for stdin
        #[arg(short, long)]
        response: String,
        /// Fields to assert on, as a JSON object or `key: value` lines
        #[arg(short, long)]
        fragment: Option<String>,
        /// Expected HTTP status code
        #[arg(short, long)]
        status: Option<u16>,
    },
}

#[derive(Subcommand)]
pub enum DataDriverCommands {
    /// Data sources (CSV, database, API ...)
    Source {
        #[command(subcommand)]
        command: DataDriverAction,
    },
    /// Data templates mapping a source onto request fields
    Template {
        #[command(subcommand)]
        command: DataDriverAction,
    },
    /// Data generators
    Generator {
        #[command(subcommand)]
        command: DataDriverAction,
    },
}

#[derive(Subcommand)]
pub enum DataDriverAction {
    /// List entries
    List {
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show an entry
    Get { id: u64 },
    /// Create an entry
    Create {
        #[arg(short, long)]
        name: String,
        /// Source or generator type (required for sources and generators)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        #[arg(short, long)]
        project: Option<u64>,
        /// Data source ID (templates only)
        #[arg(long)]
        source: Option<u64>,
        /// Config (or template mapping) as a JSON object (or @file)
        #[arg(short, long)]
        config: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an entry
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum TestDataCommands {
    /// List test data configs
    List {
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        active: bool,
    },
    /// Show a test data config with its data rows
    Get { id: u64 },
    /// Create a test data config from a JSON file of data rows
    Create {
        #[arg(short, long)]
        name: String,
        /// JSON array of {request, assertions} rows (or @file)
        #[arg(long)]
        data: String,
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a test data config
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
    /// Show which test cases use a config
    Usage { id: u64 },
    /// Attach a config to a test case
    Associate {
        config: u64,
        #[arg(short = 'c', long = "case")]
        test_case: u64,
    },
    /// Detach a config from a test case
    Disassociate {
        config: u64,
        #[arg(short = 'c', long = "case")]
        test_case: u64,
    },
    /// List the configs attached to a test case
    ForCase { test_case: u64 },
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// List reviews
    List {
        #[arg(short, long)]
        project: Option<u64>,
        #[arg(short = 'c', long = "case")]
        test_case: Option<u64>,
        #[arg(short, long, value_enum)]
        status: Option<ReviewStatus>,
        #[arg(short, long)]
        reviewer: Option<u64>,
    },
    /// Show a review
    Get { id: u64 },
    /// Request a review of a test case
    Create {
        #[arg(short = 'c', long = "case")]
        test_case: u64,
        #[arg(short, long)]
        project: u64,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Reviewer user ID (repeatable)
        #[arg(short, long = "reviewer")]
        reviewers: Vec<u64>,
    },
    /// Change the status of a review
    Status {
        id: u64,
        #[arg(value_enum)]
        status: ReviewStatus,
    },
    /// Approve a review
    Approve {
        id: u64,
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Reject a review
    Reject {
        id: u64,
        #[arg(short, long)]
        comment: String,
    },
    /// Add a comment
    Comment { id: u64, content: String },
    /// List comments
    Comments { id: u64 },
    /// Delete a review
    Delete {
        id: u64,
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Effective config: file and environment, then command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config_file {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(url) = &self.api_url {
            config.set("api.url", url)?;
        }
        if let Some(token) = &self.token {
            config.api.token = Some(token.clone());
        }
        if let Some(timeout) = self.timeout {
            config.api.timeout_secs = timeout;
        }
        if self.json {
            config.output.json = true;
        }
        if self.no_color {
            config.output.color = false;
        }
        Ok(config)
    }

    /// File that `auth login`, `config set` and friends write to.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_file {
            Some(path) => Ok(path.clone()),
            None => Config::config_path(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Auth { command } => commands::auth::run(self, command).await,
            Commands::Config { command } => commands::config::run(self, command).await,
            Commands::Project { command } => commands::project::run(self, command).await,
            Commands::TestCase { command } => commands::test_case::run(self, command).await,
            Commands::TestPlan { command } => commands::test_plan::run(self, command).await,
            Commands::Execution { command } => commands::execution::run(self, command).await,
            Commands::Report { command } => commands::report::run(self, command).await,
            Commands::Assertion { command } => commands::assertion::run(self, command).await,
            Commands::DataDriver { command } => commands::data_driver::run(self, command).await,
            Commands::TestData { command } => commands::test_data::run(self, command).await,
            Commands::Review { command } => commands::review::run(self, command).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_aliases_resolve() {
        let cli = Cli::try_parse_from(["qg", "tc", "list", "-p", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::TestCase {
                command: TestCaseCommands::List {
                    project: Some(3),
                    ..
                }
            }
        ));

        let cli = Cli::try_parse_from(["qg", "exec", "logs", "12"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Execution {
                command: ExecutionCommands::Logs { id: 12 }
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["qg", "project", "list", "--json", "--api-url", "http://x/api"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
    }

    #[test]
    fn test_plan_create_needs_cases() {
        assert!(Cli::try_parse_from(["qg", "tp", "create", "-n", "nightly", "-p", "1"]).is_err());
        let cli = Cli::try_parse_from([
            "qg", "tp", "create", "-n", "nightly", "-p", "1", "-c", "4", "-c", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::TestPlan {
                command: TestPlanCommands::Create { cases, .. },
            } => assert_eq!(cases, vec![4, 5]),
            _ => panic!("expected test-plan create"),
        }
    }

    #[test]
    fn test_reject_requires_comment() {
        assert!(Cli::try_parse_from(["qg", "review", "reject", "3"]).is_err());
    }

    #[test]
    fn test_flag_overrides_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[api]\nurl = \"http://file/api\"\ntimeout_secs = 5\n").unwrap();

        let cli = Cli::try_parse_from([
            "qg",
            "--config-file",
            path.to_str().unwrap(),
            "--timeout",
            "90",
            "project",
            "list",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.api.timeout_secs, 90);
    }
}
