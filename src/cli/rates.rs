use super::convert::published_note;
use super::ui;
use crate::core::session::FetchOutcome;
use crate::core::{ConverterSession, RatesProvider, SortDirective};
use anyhow::{Context, Result};

/// Loads the table for `base` on `date` (or the latest) with `sort` applied.
pub async fn load_table(
    mut session: ConverterSession,
    provider: &dyn RatesProvider,
    base: Option<&str>,
    date: Option<&str>,
    sort: SortDirective,
) -> Result<(ConverterSession, FetchOutcome)> {
    if let Some(base) = base {
        session.set_source(base)?;
    }
    session.set_sort(sort);

    let request = match date {
        Some(date) => session
            .set_date(date)?
            .context("No rates requested for the given date")?,
        None => session.begin_latest(),
    };

    let pb = ui::new_spinner("Fetching exchange rates");
    let outcome = session.refresh(provider, request).await;
    pb.finish_and_clear();

    Ok((session, outcome?))
}

pub async fn run(
    session: ConverterSession,
    provider: &dyn RatesProvider,
    base: Option<&str>,
    date: Option<&str>,
    sort: SortDirective,
) -> Result<()> {
    let (session, outcome) = load_table(session, provider, base, date, sort).await?;

    if let Some(note) = published_note(outcome) {
        println!("{}", ui::notice(&note));
    }
    println!("{}", ui::rates_table(&session));
    Ok(())
}
