use crate::transform::{
    aggregate_by_month, detail_rows, filter, melt_monthly_totals, rank_clients_by_variation,
    sort_by_month, to_year_series,
};
use crate::types::{
    ClientVariationRow, ComparativeRecord, DetailRow, Direction, Metric, MonthlyMetricRow,
    MonthlyTotalRow, ReportSummary, Selection, YearSeriesRow,
};
use crate::util::pct_change;
use chrono::Local;
use tracing::debug;

/// Every view the presentation layer needs for one selection.
#[derive(Debug, Clone)]
pub struct ReportBundle {
    pub client_rows: usize,
    pub revenue_by_client: Vec<YearSeriesRow>,
    pub quantity_by_client: Vec<YearSeriesRow>,
    pub detail: Vec<DetailRow>,
    pub monthly_totals: Vec<MonthlyTotalRow>,
    pub monthly_revenue: Vec<MonthlyMetricRow>,
    pub monthly_quantity: Vec<MonthlyMetricRow>,
    pub top_clients: Vec<ClientVariationRow>,
    pub bottom_clients: Vec<ClientVariationRow>,
}

/// Recompute all views from the raw table. Cheap enough to run on every
/// selection change.
pub fn build_report(records: &[ComparativeRecord], selection: &Selection, top_n: usize) -> ReportBundle {
    let mut filtered = filter(records, &selection.clients, &selection.client_months);
    sort_by_month(&mut filtered);
    debug!(rows = filtered.len(), "filtered client rows");

    let monthly_totals = aggregate_by_month(records, &selection.total_months);

    ReportBundle {
        client_rows: filtered.len(),
        revenue_by_client: to_year_series(&filtered, Metric::Revenue),
        quantity_by_client: to_year_series(&filtered, Metric::Quantity),
        detail: detail_rows(&filtered),
        monthly_revenue: melt_monthly_totals(&monthly_totals, Metric::Revenue),
        monthly_quantity: melt_monthly_totals(&monthly_totals, Metric::Quantity),
        monthly_totals,
        top_clients: rank_clients_by_variation(records, &selection.variation_months, top_n, Direction::Top),
        bottom_clients: rank_clients_by_variation(
            records,
            &selection.variation_months,
            top_n,
            Direction::Bottom,
        ),
    }
}

pub fn summarize(bundle: &ReportBundle, selection: &Selection, source: &str) -> ReportSummary {
    let sum = |f: fn(&MonthlyTotalRow) -> f64| -> f64 { bundle.monthly_totals.iter().map(f).sum() };
    let total_revenue_2024 = sum(|t| t.revenue_year1);
    let total_revenue_2025 = sum(|t| t.revenue_year2);
    let total_quantity_2024 = sum(|t| t.quantity_year1);
    let total_quantity_2025 = sum(|t| t.quantity_year2);

    ReportSummary {
        generated_at: Local::now(),
        source: source.to_string(),
        selected_clients: selection.clients.len(),
        selected_client_months: selection.client_months.len(),
        selected_total_months: selection.total_months.len(),
        selected_variation_months: selection.variation_months.len(),
        client_rows: bundle.client_rows,
        total_revenue_2024,
        total_revenue_2025,
        total_quantity_2024,
        total_quantity_2025,
        revenue_variation_pct: pct_change(total_revenue_2024, total_revenue_2025),
        quantity_variation_pct: pct_change(total_quantity_2024, total_quantity_2025),
        top_client: bundle.top_clients.first().map(|r| r.client.clone()),
        bottom_client: bundle.bottom_clients.first().map(|r| r.client.clone()),
    }
}
