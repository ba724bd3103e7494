use crate::month::Month;
use crate::util::{display_amount, display_opt_pct, display_pct};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tabled::Tabled;

/// One validated row of the two-year comparative table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparativeRecord {
    pub month: Month,
    pub client: String,
    pub revenue_year1: f64,
    pub revenue_year2: f64,
    pub quantity_year1: f64,
    pub quantity_year2: f64,
    /// Precomputed in the source; carried through untouched.
    pub pct_variation_revenue: Option<f64>,
    pub pct_variation_quantity: Option<f64>,
}

impl ComparativeRecord {
    pub fn metric_pair(&self, metric: Metric) -> (f64, f64) {
        match metric {
            Metric::Revenue => (self.revenue_year1, self.revenue_year2),
            Metric::Quantity => (self.quantity_year1, self.quantity_year2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Revenue,
    Quantity,
}

impl Metric {
    pub fn title(self) -> &'static str {
        match self {
            Metric::Revenue => "Fatturato",
            Metric::Quantity => "Quantità",
        }
    }
}

/// Which of the two compared fiscal years a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum YearTag {
    #[serde(rename = "2024")]
    Year1,
    #[serde(rename = "2025")]
    Year2,
}

impl YearTag {
    pub const BOTH: [YearTag; 2] = [YearTag::Year1, YearTag::Year2];

    pub fn pick(self, pair: (f64, f64)) -> f64 {
        match self {
            YearTag::Year1 => pair.0,
            YearTag::Year2 => pair.1,
        }
    }
}

impl fmt::Display for YearTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearTag::Year1 => f.write_str("2024"),
            YearTag::Year2 => f.write_str("2025"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Largest mean variation first.
    Top,
    /// Smallest (most negative) mean variation first.
    Bottom,
}

/// The filters a user picks. Each chart group has its own month set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub clients: BTreeSet<String>,
    pub client_months: BTreeSet<Month>,
    pub total_months: BTreeSet<Month>,
    pub variation_months: BTreeSet<Month>,
}

// Long-form (melted) per-client series, one row per input row and year.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct YearSeriesRow {
    #[serde(rename = "MESE")]
    #[tabled(rename = "MESE")]
    pub month: Month,
    #[serde(rename = "CLIENTE")]
    #[tabled(rename = "CLIENTE")]
    pub client: String,
    #[serde(rename = "Anno")]
    #[tabled(rename = "Anno")]
    pub year: YearTag,
    #[serde(rename = "Valore")]
    #[tabled(rename = "Valore", display_with = "display_amount")]
    pub value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct DetailRow {
    #[serde(rename = "MESE")]
    #[tabled(rename = "MESE")]
    pub month: Month,
    #[serde(rename = "CLIENTE")]
    #[tabled(rename = "CLIENTE")]
    pub client: String,
    #[serde(rename = "VARIAZIONE_%_FATT")]
    #[tabled(rename = "VARIAZIONE_%_FATT", display_with = "display_opt_pct")]
    pub pct_variation_revenue: Option<f64>,
    #[serde(rename = "VARIAZIONE_%_QTA")]
    #[tabled(rename = "VARIAZIONE_%_QTA", display_with = "display_opt_pct")]
    pub pct_variation_quantity: Option<f64>,
}

/// All clients summed for one month.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MonthlyTotalRow {
    #[serde(rename = "MESE")]
    #[tabled(rename = "MESE")]
    pub month: Month,
    #[serde(rename = "FATTURATO_2024")]
    #[tabled(rename = "FATTURATO_2024", display_with = "display_amount")]
    pub revenue_year1: f64,
    #[serde(rename = "FATTURATO_2025")]
    #[tabled(rename = "FATTURATO_2025", display_with = "display_amount")]
    pub revenue_year2: f64,
    #[serde(rename = "QUANTITA_2024")]
    #[tabled(rename = "QUANTITA_2024", display_with = "display_amount")]
    pub quantity_year1: f64,
    #[serde(rename = "QUANTITA_2025")]
    #[tabled(rename = "QUANTITA_2025", display_with = "display_amount")]
    pub quantity_year2: f64,
}

impl MonthlyTotalRow {
    pub fn empty(month: Month) -> Self {
        MonthlyTotalRow {
            month,
            revenue_year1: 0.0,
            revenue_year2: 0.0,
            quantity_year1: 0.0,
            quantity_year2: 0.0,
        }
    }

    pub fn metric_pair(&self, metric: Metric) -> (f64, f64) {
        match metric {
            Metric::Revenue => (self.revenue_year1, self.revenue_year2),
            Metric::Quantity => (self.quantity_year1, self.quantity_year2),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct MonthlyMetricRow {
    #[serde(rename = "MESE")]
    #[tabled(rename = "MESE")]
    pub month: Month,
    #[serde(rename = "Anno")]
    #[tabled(rename = "Anno")]
    pub year: YearTag,
    #[serde(rename = "Valore")]
    #[tabled(rename = "Valore", display_with = "display_amount")]
    pub value: f64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ClientVariationRow {
    #[serde(rename = "CLIENTE")]
    #[tabled(rename = "CLIENTE")]
    pub client: String,
    #[serde(rename = "Variazione_Fatt")]
    #[tabled(rename = "Variazione_Fatt", display_with = "display_pct")]
    pub mean_variation: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Local>,
    pub source: String,
    pub selected_clients: usize,
    pub selected_client_months: usize,
    pub selected_total_months: usize,
    pub selected_variation_months: usize,
    pub client_rows: usize,
    pub total_revenue_2024: f64,
    pub total_revenue_2025: f64,
    pub total_quantity_2024: f64,
    pub total_quantity_2025: f64,
    pub revenue_variation_pct: Option<f64>,
    pub quantity_variation_pct: Option<f64>,
    pub top_client: Option<String>,
    pub bottom_client: Option<String>,
}
