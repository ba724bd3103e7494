// Calendar months with a chronological total order.
//
// Month labels in the source table are free text; they are resolved once at
// load time so every later sort can use `Month`'s derived `Ord` instead of
// comparing strings.
use crate::error::{ReportError, ReportResult};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Month {
    #[serde(rename = "Gennaio")]
    January,
    #[serde(rename = "Febbraio")]
    February,
    #[serde(rename = "Marzo")]
    March,
    #[serde(rename = "Aprile")]
    April,
    #[serde(rename = "Maggio")]
    May,
    #[serde(rename = "Giugno")]
    June,
    #[serde(rename = "Luglio")]
    July,
    #[serde(rename = "Agosto")]
    August,
    #[serde(rename = "Settembre")]
    September,
    #[serde(rename = "Ottobre")]
    October,
    #[serde(rename = "Novembre")]
    November,
    #[serde(rename = "Dicembre")]
    December,
}

// Lowercased Italian and English names -> month.
static LABELS: Lazy<HashMap<String, Month>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for m in Month::ALL {
        map.insert(m.label().to_lowercase(), m);
        map.insert(m.english_name().to_lowercase(), m);
    }
    map
});

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Position in the calendar, 1 for January through 12 for December.
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }

    /// Inverse of [`Month::rank`].
    pub fn from_rank(rank: u8) -> Option<Month> {
        Month::ALL.get(usize::from(rank).checked_sub(1)?).copied()
    }

    /// Canonical label as it appears in the `MESE` column.
    pub fn label(self) -> &'static str {
        match self {
            Month::January => "Gennaio",
            Month::February => "Febbraio",
            Month::March => "Marzo",
            Month::April => "Aprile",
            Month::May => "Maggio",
            Month::June => "Giugno",
            Month::July => "Luglio",
            Month::August => "Agosto",
            Month::September => "Settembre",
            Month::October => "Ottobre",
            Month::November => "Novembre",
            Month::December => "Dicembre",
        }
    }

    fn english_name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Resolve a free-text label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Month> {
        LABELS.get(&label.trim().to_lowercase()).copied()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Month {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::from_label(s).ok_or_else(|| ReportError::UnknownMonth {
            label: s.trim().to_string(),
            row: None,
        })
    }
}

/// Rank 1-12 of a month label; unknown labels are rejected.
pub fn month_rank(label: &str) -> ReportResult<u8> {
    label.parse::<Month>().map(Month::rank)
}
