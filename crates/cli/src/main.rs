//! Seatwise CLI - Main Entry Point
//!
//! Book, edit, cancel, and seat restaurant reservations from the host stand.

use clap::{Parser, Subcommand};

use seatwise_cli::client::ApiClient;
use seatwise_cli::commands::{course, dashboard, search, student};
use seatwise_cli::output;
use seatwise_common::config::{ClientConfig, API_BASE_URL_ENV, DEFAULT_API_BASE_URL};

/// Seatwise - reservations and seating for the host stand
#[derive(Parser)]
#[command(name = "seatwise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Reservation API base URL
    #[arg(long, env = API_BASE_URL_ENV, default_value = DEFAULT_API_BASE_URL, global = true)]
    api_base_url: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the day's reservations and all courses
    Dashboard(dashboard::DashboardArgs),

    /// Find reservations by mobile number
    Search(search::SearchArgs),

    /// Manage reservations
    #[command(subcommand)]
    Student(student::StudentCommands),

    /// Manage courses
    #[command(subcommand)]
    Course(course::CourseCommands),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = ApiClient::new(ClientConfig::new(&cli.api_base_url)?)?;

    let result = match cli.command {
        Commands::Dashboard(args) => dashboard::execute(args, &client, cli.format).await,
        Commands::Search(args) => search::execute(args, &client, cli.format).await,
        Commands::Student(cmd) => student::execute(cmd, &client, cli.format).await,
        Commands::Course(cmd) => course::execute(cmd, &client, cli.format).await,
        Commands::Version => {
            println!("Seatwise CLI v{}", seatwise_common::VERSION);
            println!("API: {}", client.base_url());
            Ok(())
        }
    };

    // API failures surface as a single message
    if let Err(e) = result {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
