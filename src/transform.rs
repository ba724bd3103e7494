// Pure transformations over the comparative table.
//
// Every function takes the raw records by reference plus the filters it
// needs and returns a fresh view; nothing here mutates its input or keeps
// state between calls.
use crate::month::Month;
use crate::types::{
    ClientVariationRow, ComparativeRecord, DetailRow, Direction, Metric, MonthlyMetricRow,
    MonthlyTotalRow, YearSeriesRow, YearTag,
};
use crate::util::{mean, pct_change};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Records whose client and month are both selected, in input order.
pub fn filter(
    records: &[ComparativeRecord],
    clients: &BTreeSet<String>,
    months: &BTreeSet<Month>,
) -> Vec<ComparativeRecord> {
    records
        .iter()
        .filter(|r| clients.contains(&r.client) && months.contains(&r.month))
        .cloned()
        .collect()
}

/// Stable chronological sort; rows of the same month keep their order.
pub fn sort_by_month(records: &mut [ComparativeRecord]) {
    records.sort_by_key(|r| r.month.rank());
}

/// Unpivot the two year columns of `metric` into one value column tagged by
/// year. All first-year rows come before all second-year rows.
pub fn to_year_series(records: &[ComparativeRecord], metric: Metric) -> Vec<YearSeriesRow> {
    YearTag::BOTH
        .iter()
        .flat_map(move |&year| {
            records.iter().map(move |r| YearSeriesRow {
                month: r.month,
                client: r.client.clone(),
                year,
                value: year.pick(r.metric_pair(metric)),
            })
        })
        .collect()
}

pub fn detail_rows(records: &[ComparativeRecord]) -> Vec<DetailRow> {
    records
        .iter()
        .map(|r| DetailRow {
            month: r.month,
            client: r.client.clone(),
            pct_variation_revenue: r.pct_variation_revenue,
            pct_variation_quantity: r.pct_variation_quantity,
        })
        .collect()
}

/// Sum all four numeric columns per month over every client, restricted to
/// `months`. One row per month present, chronological.
pub fn aggregate_by_month(
    records: &[ComparativeRecord],
    months: &BTreeSet<Month>,
) -> Vec<MonthlyTotalRow> {
    let mut totals: BTreeMap<Month, MonthlyTotalRow> = BTreeMap::new();
    for r in records.iter().filter(|r| months.contains(&r.month)) {
        let e = totals
            .entry(r.month)
            .or_insert_with(|| MonthlyTotalRow::empty(r.month));
        e.revenue_year1 += r.revenue_year1;
        e.revenue_year2 += r.revenue_year2;
        e.quantity_year1 += r.quantity_year1;
        e.quantity_year2 += r.quantity_year2;
    }
    totals.into_values().collect()
}

/// Long-form view of one metric of the monthly totals, for line charts.
pub fn melt_monthly_totals(totals: &[MonthlyTotalRow], metric: Metric) -> Vec<MonthlyMetricRow> {
    YearTag::BOTH
        .iter()
        .flat_map(move |&year| {
            totals.iter().map(move |t| MonthlyMetricRow {
                month: t.month,
                year,
                value: year.pick(t.metric_pair(metric)),
            })
        })
        .collect()
}

/// Revenue change of a single row in percent, `None` when the first-year
/// revenue is zero.
pub fn row_variation(record: &ComparativeRecord) -> Option<f64> {
    pct_change(record.revenue_year1, record.revenue_year2)
}

/// Clients ranked by their mean per-row revenue variation over `months`.
///
/// Rows with an undefined variation are left out of the mean, and a client
/// with no defined rows is left out of the ranking. Ties keep alphabetical
/// client order.
pub fn rank_clients_by_variation(
    records: &[ComparativeRecord],
    months: &BTreeSet<Month>,
    top_n: usize,
    direction: Direction,
) -> Vec<ClientVariationRow> {
    let mut by_client: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records.iter().filter(|r| months.contains(&r.month)) {
        if let Some(v) = row_variation(r) {
            by_client.entry(r.client.as_str()).or_default().push(v);
        }
    }

    let mut ranked: Vec<ClientVariationRow> = by_client
        .into_iter()
        .filter_map(|(client, ratios)| {
            mean(&ratios).map(|mean_variation| ClientVariationRow {
                client: client.to_string(),
                mean_variation,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        let ord = a
            .mean_variation
            .partial_cmp(&b.mean_variation)
            .unwrap_or(Ordering::Equal);
        match direction {
            Direction::Top => ord.reverse(),
            Direction::Bottom => ord,
        }
    });
    ranked.truncate(top_n);
    ranked
}

/// Distinct clients in order of first appearance.
pub fn distinct_clients(records: &[ComparativeRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.client.as_str()))
        .map(|r| r.client.clone())
        .collect()
}

/// Distinct months present, chronological.
pub fn distinct_months(records: &[ComparativeRecord]) -> Vec<Month> {
    records
        .iter()
        .map(|r| r.month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
