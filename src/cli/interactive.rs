//! Line driven converter. User commands and fetch completions are handled on
//! one loop; each fetch runs in its own task and reports back over a channel.

use super::convert::published_note;
use super::ui;
use crate::core::error::Result as FxResult;
use crate::core::session::{FetchOutcome, FetchRequest};
use crate::core::{ConverterSession, RateTable, RatesProvider, SortColumn, SortDirection, SortDirective};
use anyhow::{Result, anyhow, bail};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

const HELP: &str = "Commands:
  from <CODE>              set the source currency
  to <CODE>                set the target currency
  amount <N>               set the amount to convert
  date <YYYY-MM-DD>        load rates published on a date
  swap                     exchange source and target
  sort <code|value> [asc|desc|none]
  show                     print the rate table
  help                     print this help
  quit                     leave";

type FetchMessage = (FetchRequest, FxResult<RateTable>);

#[derive(Debug, Clone, PartialEq)]
enum Command {
    From(String),
    To(String),
    Amount(f64),
    Date(String),
    Swap,
    Sort(SortDirective),
    Show,
    Help,
    Quit,
}

enum Flow {
    Continue,
    Fetch(FetchRequest),
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    let command = match (word.to_lowercase().as_str(), arg) {
        ("from", Some(code)) => Command::From(code.to_string()),
        ("to", Some(code)) => Command::To(code.to_string()),
        ("amount", Some(n)) => Command::Amount(
            n.parse()
                .map_err(|_| anyhow!("Invalid amount: {}", n))?,
        ),
        ("date", Some(date)) => Command::Date(date.to_string()),
        ("swap", None) => Command::Swap,
        ("sort", Some(column)) => {
            let column: SortColumn = column.parse()?;
            let direction = match parts.next() {
                Some(d) => d.parse()?,
                None => SortDirection::Ascending,
            };
            Command::Sort(SortDirective::new(column, direction))
        }
        ("show", None) => Command::Show,
        ("help", None) | ("?", None) => Command::Help,
        ("quit", None) | ("exit", None) => Command::Quit,
        (other, _) => bail!("Unknown or incomplete command: {} (try 'help')", other),
    };
    Ok(Some(command))
}

fn apply_command<W: Write>(
    session: &mut ConverterSession,
    command: Command,
    out: &mut W,
) -> Result<Flow> {
    match command {
        Command::From(code) => session.set_source(&code)?,
        Command::To(code) => session.set_target(&code)?,
        Command::Amount(amount) => session.set_amount(amount)?,
        Command::Swap => session.swap()?,
        Command::Date(date) => {
            return Ok(match session.set_date(&date)? {
                Some(request) => {
                    writeln!(
                        out,
                        "{}",
                        ui::style_text(&format!("Fetching rates for {date}..."), ui::StyleType::Subtle)
                    )?;
                    Flow::Fetch(request)
                }
                None => Flow::Continue,
            });
        }
        Command::Sort(sort) => {
            session.set_sort(sort);
            writeln!(out, "{}", ui::rates_table(session))?;
            return Ok(Flow::Continue);
        }
        Command::Show => {
            writeln!(out, "{}", ui::rates_table(session))?;
            return Ok(Flow::Continue);
        }
        Command::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(Flow::Continue);
        }
        Command::Quit => return Ok(Flow::Quit),
    }
    writeln!(out, "{}", ui::conversion_line(session))?;
    Ok(Flow::Continue)
}

fn spawn_fetch(
    request: FetchRequest,
    provider: &Arc<dyn RatesProvider>,
    tx: &mpsc::Sender<FetchMessage>,
) {
    let provider = Arc::clone(provider);
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = request.execute(provider.as_ref()).await;
        // The loop may already have quit
        let _ = tx.send((request, result)).await;
    });
}

/// Runs the session until `quit` or end of input. Fetches still in flight at
/// end of input are awaited so their results are applied. Returns the final
/// session state.
pub async fn run<R, W>(
    mut session: ConverterSession,
    provider: Arc<dyn RatesProvider>,
    input: R,
    out: &mut W,
) -> Result<ConverterSession>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (tx, mut rx) = mpsc::channel::<FetchMessage>(16);
    let mut lines = input.lines();
    let mut input_open = true;

    writeln!(
        out,
        "{}",
        ui::style_text("fxconv interactive mode, type 'help' for commands", ui::StyleType::Title)
    )?;
    spawn_fetch(session.begin_latest(), &provider, &tx);

    loop {
        if !input_open && !session.is_fetching() {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    input_open = false;
                    continue;
                };

                let flow = parse_command(&line)
                    .and_then(|command| match command {
                        Some(command) => apply_command(&mut session, command, out),
                        None => Ok(Flow::Continue),
                    });
                match flow {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Fetch(request)) => spawn_fetch(request, &provider, &tx),
                    Ok(Flow::Quit) => break,
                    Err(e) => writeln!(out, "{}", ui::notice(&e.to_string()))?,
                }
            }
            Some((request, result)) = rx.recv() => {
                match session.apply_fetch(&request, result) {
                    Ok(outcome @ FetchOutcome::Applied { .. }) => {
                        if let Some(note) = published_note(outcome) {
                            writeln!(out, "{}", ui::notice(&note))?;
                        }
                        writeln!(out, "{}", ui::rates_table(&session))?;
                        writeln!(out, "{}", ui::conversion_line(&session))?;
                    }
                    Ok(FetchOutcome::Stale) => {}
                    Err(e) => writeln!(
                        out,
                        "{}",
                        ui::notice(&format!("{e}; keeping previously loaded rates"))
                    )?,
                }
            }
        }
    }

    Ok(session)
}
