use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxconv::core::log::init_logging;
use fxconv::core::{SortColumn, SortDirection, SortDirective};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount of the source currency
        amount: f64,
        /// Source currency code, e.g. EUR
        from: String,
        /// Target currency code, e.g. USD
        to: String,
        /// Use rates published on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Display all exchange rates relative to a base currency
    Rates {
        /// Base currency, defaults to the configured source currency
        #[arg(short, long)]
        base: Option<String>,
        /// Use rates published on this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// Column to sort by: code or value
        #[arg(short, long, default_value = "code")]
        sort: SortColumn,
        /// Sort order: asc, desc or none
        #[arg(short, long, default_value = "none")]
        order: SortDirection,
    },
    /// Convert interactively, changing currencies, amount and date as you go
    Interactive,
}

impl From<Commands> for fxconv::AppCommand {
    fn from(cmd: Commands) -> fxconv::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                date,
            } => fxconv::AppCommand::Convert {
                amount,
                from,
                to,
                date,
            },
            Commands::Rates {
                base,
                date,
                sort,
                order,
            } => fxconv::AppCommand::Rates {
                base,
                date,
                sort: SortDirective::new(sort, order),
            },
            Commands::Interactive => fxconv::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxconv::cli::setup::setup(),
        Some(cmd) => fxconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
