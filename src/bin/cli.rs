use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tabsentinel::config::Config;
use tabsentinel::output::OutputFormat;
use tabsentinel::replay;
use tabsentinel::risk::{RiskEvaluator, RiskLevel};
use tabsentinel::TabMonitor;

#[derive(Parser)]
#[command(
    name = "tabsentinel",
    about = "Per-tab resource monitoring and risk scoring",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded tab event log and report every live tab
    Replay {
        /// Path to the JSON-lines event log
        events: PathBuf,

        /// Config file path
        #[arg(long, short = 'c', default_value = ".tabsentinel.toml")]
        config: PathBuf,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the risk scoring factors
    ListFactors {
        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .tabsentinel.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay {
            events,
            config,
            format,
            output,
        } => cmd_replay(events, config, format, output),
        Commands::ListFactors { format } => cmd_list_factors(format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn cmd_replay(
    events_path: PathBuf,
    config_path: PathBuf,
    format_str: String,
    output_path: Option<PathBuf>,
) -> Result<i32, tabsentinel::error::SentinelError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let config = Config::load(&config_path)?;
    let events = replay::parse_events(&std::fs::read_to_string(&events_path)?)?;
    tracing::debug!(count = events.len(), path = %events_path.display(), "replaying events");

    let monitor = TabMonitor::new(&config);
    for event in events {
        monitor.apply(event);
    }

    let tabs = monitor.all_tab_data();
    let rendered = tabsentinel::render_tabs(&tabs, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = no tab is Red, 1 = at least one Red tab
    let any_red = tabs.iter().any(|t| t.risk_level == RiskLevel::Red);
    Ok(if any_red { 1 } else { 0 })
}

fn cmd_list_factors(format_str: String) -> Result<i32, tabsentinel::error::SentinelError> {
    let factors = RiskEvaluator::new().list_factors();

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&factors)?;
            println!("{}", json);
        }
        _ => {
            println!("{:<10} {:<20} {:<5} DESCRIPTION", "ID", "NAME", "CAP");
            println!("{}", "-".repeat(80));
            for factor in &factors {
                println!(
                    "{:<10} {:<20} {:<5} {}",
                    factor.id, factor.name, factor.cap, factor.description,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, tabsentinel::error::SentinelError> {
    let path = PathBuf::from(".tabsentinel.toml");

    if path.exists() && !force {
        eprintln!(".tabsentinel.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .tabsentinel.toml");

    Ok(0)
}
