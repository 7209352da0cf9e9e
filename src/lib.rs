pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConverterSession, RatesProvider, SortDirective};
use crate::providers::{CachingRatesProvider, FrankfurterProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: f64,
        from: String,
        to: String,
        date: Option<String>,
    },
    Rates {
        base: Option<String>,
        date: Option<String>,
        sort: SortDirective,
    },
    Interactive,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider: Arc<dyn RatesProvider> = Arc::new(CachingRatesProvider::new(
        FrankfurterProvider::from_config(&config.provider),
    ));
    let session = ConverterSession::from_config(&config)?;

    match command {
        AppCommand::Convert {
            amount,
            from,
            to,
            date,
        } => {
            cli::convert::run(
                session,
                provider.as_ref(),
                amount,
                &from,
                &to,
                date.as_deref(),
            )
            .await
        }
        AppCommand::Rates { base, date, sort } => {
            cli::rates::run(
                session,
                provider.as_ref(),
                base.as_deref(),
                date.as_deref(),
                sort,
            )
            .await
        }
        AppCommand::Interactive => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut out = std::io::stdout();
            cli::interactive::run(session, provider, input, &mut out).await?;
            Ok(())
        }
    }
}
