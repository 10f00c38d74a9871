mod cli;
mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, OutputFormat};
use output::print_error;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Logs go to stderr; `AIDBOX_LOG` (or `RUST_LOG`) sets the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("AIDBOX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let profile = &cli.profile;

    match &cli.command {
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                let cfg = config::load_profile(profile)?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    cfg.format.as_deref().unwrap_or("json")
                );
                if let Some(secs) = cfg.timeout_secs {
                    println!("{}: {secs}s", "Timeout".cyan());
                }
                let auth = match &cfg.auth {
                    Some(aidbox_http::AuthConfig::Basic { username, .. }) => format!("basic ({username})"),
                    Some(aidbox_http::AuthConfig::Bearer { .. }) => "bearer token".to_string(),
                    Some(aidbox_http::AuthConfig::Header { .. }) => "authorization header".to_string(),
                    None => "(none)".to_string(),
                };
                println!("{}: {}", "Auth".cyan(), auth);
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(profile)?;
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} for profile {profile}", set_args.key));
            }
        },
        Commands::Ref(args) => {
            let format = output_format(&cli, profile)?;
            commands::reference::describe(&args.reference, args.display.as_deref(), format)?;
        }
        Commands::Get(args) => {
            let client = make_client(&cli, profile)?;
            let format = output_format(&cli, profile)?;
            commands::crud::get(&client, &args.reference, format).await?;
        }
        Commands::Search(args) => {
            let client = make_client(&cli, profile)?;
            let format = output_format(&cli, profile)?;
            commands::search::search(
                &client,
                &args.resource_type,
                &args.params,
                args.count,
                args.sort.as_deref(),
                args.all,
                format,
            )
            .await?;
        }
        Commands::Count(args) => {
            let client = make_client(&cli, profile)?;
            commands::search::count(&client, &args.resource_type, &args.params).await?;
        }
        Commands::Create(args) => {
            let client = make_client(&cli, profile)?;
            let format = output_format(&cli, profile)?;
            commands::crud::create(&client, &args.resource_type, &args.file, format).await?;
        }
        Commands::Update(args) => {
            let client = make_client(&cli, profile)?;
            let format = output_format(&cli, profile)?;
            commands::crud::update(&client, &args.reference, &args.file, format).await?;
        }
        Commands::Delete(args) => {
            let client = make_client(&cli, profile)?;
            commands::crud::delete(&client, &args.reference).await?;
        }
    }

    Ok(())
}

fn make_client(cli: &Cli, profile: &str) -> Result<aidbox_http::HttpClient> {
    let connection = config::resolve_connection(cli.server.as_deref(), profile)?;
    tracing::debug!(server = %connection.base_url, profile = %profile, "connecting");
    aidbox_http::connect(connection).context("Failed to create client")
}

/// `--format`, else the profile's format, else JSON.
fn output_format(cli: &Cli, profile: &str) -> Result<OutputFormat> {
    if let Some(format) = cli.format {
        return Ok(format);
    }
    let cfg = config::load_profile(profile)?;
    match cfg.format.as_deref() {
        None | Some("json") => Ok(OutputFormat::Json),
        Some("table") => Ok(OutputFormat::Table),
        Some(other) => anyhow::bail!("Unknown output format in config: {other}"),
    }
}
