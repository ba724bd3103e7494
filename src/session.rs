// Interactive session state.
//
// The raw table is loaded once and never mutated; only the selection changes
// between report runs.
use crate::cli::SelectionArgs;
use crate::error::{ReportError, ReportResult};
use crate::month::{month_rank, Month};
use crate::transform::{distinct_clients, distinct_months};
use crate::types::{ComparativeRecord, Selection};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// How many clients are preselected when none are given.
pub const DEFAULT_CLIENT_COUNT: usize = 22;

pub struct Session {
    pub source: PathBuf,
    pub records: Vec<ComparativeRecord>,
    pub clients: Vec<String>,
    pub months: Vec<Month>,
    pub selection: Selection,
}

impl Session {
    pub fn new(source: PathBuf, records: Vec<ComparativeRecord>) -> Self {
        let clients = distinct_clients(&records);
        let months = distinct_months(&records);
        let all_months: BTreeSet<Month> = months.iter().copied().collect();
        let selection = Selection {
            clients: clients.iter().take(DEFAULT_CLIENT_COUNT).cloned().collect(),
            client_months: all_months.clone(),
            total_months: all_months.clone(),
            variation_months: all_months,
        };
        Session {
            source,
            records,
            clients,
            months,
            selection,
        }
    }

    /// Apply the selections given on the command line over the defaults.
    pub fn apply_args(&mut self, args: &SelectionArgs) -> ReportResult<()> {
        if let Some(s) = &args.clients {
            self.update_clients(s)?;
        }
        if let Some(s) = &args.months {
            self.update_months(MonthContext::Clients, s)?;
        }
        if let Some(s) = &args.total_months {
            self.update_months(MonthContext::Totals, s)?;
        }
        if let Some(s) = &args.variation_months {
            self.update_months(MonthContext::Variation, s)?;
        }
        Ok(())
    }

    pub fn update_clients(&mut self, input: &str) -> ReportResult<()> {
        if let Some(set) = parse_clients(input, &self.clients)? {
            self.selection.clients = set;
        }
        Ok(())
    }

    pub fn update_months(&mut self, context: MonthContext, input: &str) -> ReportResult<()> {
        if let Some(set) = parse_months(input, &self.months)? {
            match context {
                MonthContext::Clients => self.selection.client_months = set,
                MonthContext::Totals => self.selection.total_months = set,
                MonthContext::Variation => self.selection.variation_months = set,
            }
        }
        Ok(())
    }
}

/// The three independent month selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthContext {
    Clients,
    Totals,
    Variation,
}

/// Parse a comma separated client list.
///
/// Blank input keeps the current selection (`None`), `*` selects every
/// client, `-` clears the selection. Unknown names are rejected.
pub fn parse_clients(input: &str, universe: &[String]) -> ReportResult<Option<BTreeSet<String>>> {
    match input.trim() {
        "" => Ok(None),
        "*" => Ok(Some(universe.iter().cloned().collect())),
        "-" => Ok(Some(BTreeSet::new())),
        list => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|name| {
                universe
                    .iter()
                    .find(|c| c.as_str() == name)
                    .cloned()
                    .ok_or_else(|| ReportError::UnknownClient(name.to_string()))
            })
            .collect::<ReportResult<BTreeSet<String>>>()
            .map(Some),
    }
}

/// Parse a comma separated month list with the same conventions as
/// [`parse_clients`]. `*` means every month present in the table.
pub fn parse_months(input: &str, present: &[Month]) -> ReportResult<Option<BTreeSet<Month>>> {
    match input.trim() {
        "" => Ok(None),
        "*" => Ok(Some(present.iter().copied().collect())),
        "-" => Ok(Some(BTreeSet::new())),
        list => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|label| {
                let rank = month_rank(label)?;
                Month::from_rank(rank).ok_or_else(|| ReportError::UnknownMonth {
                    label: label.to_string(),
                    row: None,
                })
            })
            .collect::<ReportResult<BTreeSet<Month>>>()
            .map(Some),
    }
}
