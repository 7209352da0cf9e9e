//! Rows of the currency table and how they are ordered for display.

use anyhow::anyhow;
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyTableRow {
    pub code: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Code,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    Descending,
    /// Keep the order rows were produced in.
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortDirective {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        SortDirective { column, direction }
    }
}

impl Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortColumn::Code => "code",
                SortColumn::Value => "value",
            }
        )
    }
}

impl FromStr for SortColumn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code" => Ok(SortColumn::Code),
            "value" | "rate" => Ok(SortColumn::Value),
            _ => Err(anyhow!("Invalid sort column: {}", s)),
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
                SortDirection::None => "none",
            }
        )
    }
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            "none" | "" => Ok(SortDirection::None),
            _ => Err(anyhow!("Invalid sort direction: {}", s)),
        }
    }
}

/// Returns `rows` ordered by `directive`. The sort is stable, so rows that
/// compare equal keep their input order in either direction.
pub fn sort_rows(rows: &[CurrencyTableRow], directive: &SortDirective) -> Vec<CurrencyTableRow> {
    let mut sorted = rows.to_vec();
    if directive.direction == SortDirection::None {
        return sorted;
    }

    let compare = |a: &CurrencyTableRow, b: &CurrencyTableRow| -> Ordering {
        match directive.column {
            SortColumn::Code => a.code.cmp(&b.code),
            SortColumn::Value => a.value.total_cmp(&b.value),
        }
    };

    match directive.direction {
        SortDirection::Ascending => sorted.sort_by(compare),
        SortDirection::Descending => sorted.sort_by(|a, b| compare(b, a)),
        SortDirection::None => {}
    }
    sorted
}
