use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "aidbox")]
#[command(about = "Read, search and write Aidbox resources from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL (overrides config and AIDBOX_URL env var)
    #[arg(short, long, global = true, env = "AIDBOX_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "AIDBOX_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a resource by reference (e.g. Patient/123)
    Get(GetArgs),
    /// Search for resources
    Search(SearchArgs),
    /// Count matching resources
    Count(CountArgs),
    /// Create a new resource
    Create(CreateArgs),
    /// Update a resource
    Update(UpdateArgs),
    /// Delete a resource
    Delete(DeleteArgs),
    /// Show how a reference string is interpreted
    Ref(RefArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct GetArgs {
    /// Resource reference (e.g. Patient/123)
    pub reference: String,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Resource type (e.g. Patient)
    pub resource_type: String,
    /// Search parameters as key=value pairs (e.g. name=Smith birth_date__ge=1990-01-01)
    pub params: Vec<String>,
    /// Number of results per page
    #[arg(long)]
    pub count: Option<u32>,
    /// Sort order (e.g. -_lastUpdated)
    #[arg(long)]
    pub sort: Option<String>,
    /// Follow next links and fetch every page
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args)]
pub struct CountArgs {
    /// Resource type (e.g. Patient)
    pub resource_type: String,
    /// Search parameters as key=value pairs
    pub params: Vec<String>,
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Resource type (e.g. Patient)
    pub resource_type: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    /// Resource reference (e.g. Patient/123)
    pub reference: String,
    /// Path to JSON file (reads from stdin if omitted)
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Resource reference (e.g. Patient/123)
    pub reference: String,
}

#[derive(clap::Args)]
pub struct RefArgs {
    /// Reference string (Type/id or absolute URL)
    pub reference: String,
    /// Optional display label
    #[arg(long)]
    pub display: Option<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format, timeout, basic, token, authorization)
    pub key: String,
    /// Value
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args() {
        let cli = Cli::try_parse_from([
            "aidbox",
            "--server",
            "http://localhost:8080",
            "search",
            "Patient",
            "name=John",
            "birth_date__ge=1990",
            "--count",
            "5",
            "--all",
        ])
        .unwrap();

        assert_eq!(cli.server.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cli.profile, "default");
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.resource_type, "Patient");
        assert_eq!(args.params, vec!["name=John", "birth_date__ge=1990"]);
        assert_eq!(args.count, Some(5));
        assert!(args.all);
    }

    #[test]
    fn test_global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["aidbox", "get", "Patient/p1", "--format", "table"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Table));
        assert!(matches!(cli.command, Commands::Get(GetArgs { ref reference }) if reference == "Patient/p1"));
    }

    #[test]
    fn test_config_set() {
        let cli = Cli::try_parse_from(["aidbox", "-p", "staging", "config", "set", "server", "http://x"])
            .unwrap();
        assert_eq!(cli.profile, "staging");
        let Commands::Config(ConfigArgs {
            command: ConfigCommands::Set(set),
        }) = cli.command
        else {
            panic!("expected config set");
        };
        assert_eq!((set.key.as_str(), set.value.as_str()), ("server", "http://x"));
    }
}
