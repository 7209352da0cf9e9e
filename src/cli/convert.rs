use super::ui;
use crate::core::session::FetchOutcome;
use crate::core::{ConverterSession, RatesProvider};
use anyhow::{Context, Result};
use tracing::debug;

/// Loads rates for `date` (or the latest) and returns a session holding the
/// converted amount.
pub async fn convert(
    mut session: ConverterSession,
    provider: &dyn RatesProvider,
    amount: f64,
    from: &str,
    to: &str,
    date: Option<&str>,
) -> Result<(ConverterSession, FetchOutcome)> {
    session.set_source(from)?;
    session.set_target(to)?;
    session.set_amount(amount)?;

    let request = match date {
        Some(date) => session
            .set_date(date)?
            .context("No rates requested for the given date")?,
        None => session.begin_latest(),
    };
    debug!(?request, "Fetching rates for conversion");

    let pb = ui::new_spinner("Fetching exchange rates");
    let outcome = session.refresh(provider, request).await;
    pb.finish_and_clear();
    let outcome = outcome?;

    // The target can only be checked once a table is loaded
    session
        .table()
        .context("No rates loaded")?
        .convert(session.source(), session.target(), session.amount())?;

    Ok((session, outcome))
}

pub async fn run(
    session: ConverterSession,
    provider: &dyn RatesProvider,
    amount: f64,
    from: &str,
    to: &str,
    date: Option<&str>,
) -> Result<()> {
    let (session, outcome) = convert(session, provider, amount, from, to, date).await?;

    if let Some(note) = published_note(outcome) {
        println!("{}", ui::notice(&note));
    }
    println!("{}", ui::conversion_line(&session));
    Ok(())
}

/// Explains when the source answered with an earlier day than asked for.
pub fn published_note(outcome: FetchOutcome) -> Option<String> {
    match outcome {
        FetchOutcome::Applied {
            requested: Some(requested),
            published,
        } if requested != published => Some(format!(
            "No rates published for {requested}, showing rates of {published}"
        )),
        _ => None,
    }
}
