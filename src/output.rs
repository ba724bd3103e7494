use crate::error::ReportResult;
use crate::reports::ReportBundle;
use crate::types::Metric;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> ReportResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> ReportResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

/// Write every view of `bundle` as its own CSV file under `dir`.
pub fn export_bundle(dir: &Path, bundle: &ReportBundle) -> ReportResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let mut put = |name: &str, f: &dyn Fn(&Path) -> ReportResult<()>| -> ReportResult<()> {
        let path = dir.join(name);
        f(&path)?;
        written.push(path);
        Ok(())
    };
    put("revenue_by_client.csv", &|p| write_csv(p, &bundle.revenue_by_client))?;
    put("quantity_by_client.csv", &|p| write_csv(p, &bundle.quantity_by_client))?;
    put("variation_detail.csv", &|p| write_csv(p, &bundle.detail))?;
    put("monthly_totals.csv", &|p| write_csv(p, &bundle.monthly_totals))?;
    put("monthly_revenue.csv", &|p| write_csv(p, &bundle.monthly_revenue))?;
    put("monthly_quantity.csv", &|p| write_csv(p, &bundle.monthly_quantity))?;
    put("top_clients.csv", &|p| write_csv(p, &bundle.top_clients))?;
    put("bottom_clients.csv", &|p| write_csv(p, &bundle.bottom_clients))?;
    info!(dir = %dir.display(), files = written.len(), "exported report views");
    Ok(written)
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}", render_table(rows, max_rows));
}

fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)\n".to_string();
    }
    let mut out = Table::new(slice).with(Style::markdown()).to_string();
    if rows.len() > max_rows {
        out.push_str(&format!("\n... {} more rows", rows.len() - max_rows));
    }
    out.push('\n');
    out
}

/// Console rendition of every view, each capped at `max_rows`.
pub fn print_bundle(bundle: &ReportBundle, max_rows: usize) {
    preview_table(
        &format!("Confronto {} per Clienti", Metric::Revenue.title()),
        Some("2024 vs 2025, per client and month"),
        &bundle.revenue_by_client,
        max_rows,
    );
    preview_table(
        &format!("Confronto {} per Clienti", Metric::Quantity.title()),
        Some("2024 vs 2025, per client and month"),
        &bundle.quantity_by_client,
        max_rows,
    );
    preview_table("Variazioni", None, &bundle.detail, max_rows);
    preview_table("Andamento Complessivo", None, &bundle.monthly_totals, max_rows);
    preview_table(
        "Top Clienti con Maggiore Variazione Fatturato 2024-2025",
        None,
        &bundle.top_clients,
        max_rows,
    );
    preview_table(
        "Top Clienti con Maggiore Variazione Negativa Fatturato 2024-2025",
        None,
        &bundle.bottom_clients,
        max_rows,
    );
}
