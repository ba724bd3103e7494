use crate::error::{ReportError, ReportResult};
use crate::month::Month;
use crate::types::ComparativeRecord;
use crate::util::parse_f64_safe;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};

pub const COL_MONTH: &str = "MESE";
pub const COL_CLIENT: &str = "CLIENTE";
pub const COL_REVENUE_Y1: &str = "FATTURATO_2024";
pub const COL_REVENUE_Y2: &str = "FATTURATO_2025";
pub const COL_QUANTITY_Y1: &str = "QUANTITA_2024";
pub const COL_QUANTITY_Y2: &str = "QUANTITA_2025";
pub const COL_PCT_REVENUE: &str = "VARIAZIONE_%_FATT";
pub const COL_PCT_QUANTITY: &str = "VARIAZIONE_%_QTA";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_MONTH,
    COL_CLIENT,
    COL_REVENUE_Y1,
    COL_REVENUE_Y2,
    COL_QUANTITY_Y1,
    COL_QUANTITY_Y2,
    COL_PCT_REVENUE,
    COL_PCT_QUANTITY,
];

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub blank_rows: usize,
}

/// Position of every required column in the header row.
struct ColumnIndex {
    month: usize,
    client: usize,
    revenue_y1: usize,
    revenue_y2: usize,
    quantity_y1: usize,
    quantity_y2: usize,
    pct_revenue: usize,
    pct_quantity: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> ReportResult<Self> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !headers.iter().any(|h| h == *name))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::DataSourceMalformed(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }
        let find = |name: &str| headers.iter().position(|h| h == name).unwrap_or_default();
        Ok(ColumnIndex {
            month: find(COL_MONTH),
            client: find(COL_CLIENT),
            revenue_y1: find(COL_REVENUE_Y1),
            revenue_y2: find(COL_REVENUE_Y2),
            quantity_y1: find(COL_QUANTITY_Y1),
            quantity_y2: find(COL_QUANTITY_Y2),
            pct_revenue: find(COL_PCT_REVENUE),
            pct_quantity: find(COL_PCT_QUANTITY),
        })
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

/// Load the comparative table from a spreadsheet (`xlsx`, `xlsm`, `xls`,
/// `xlsb`, `ods`) or a CSV export.
///
/// The first row must be the header. Every row is validated here so the
/// transformations can rely on typed, complete records.
pub fn load(path: &Path) -> ReportResult<(Vec<ComparativeRecord>, LoadReport)> {
    if !path.exists() {
        return Err(ReportError::DataSourceMissing {
            path: path.to_path_buf(),
        });
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let (headers, rows) = match ext.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path)?,
        other => {
            return Err(ReportError::DataSourceMalformed(format!(
                "unsupported file type {:?}",
                other
            )))
        }
    };
    debug!(columns = headers.len(), rows = rows.len(), "read raw sheet");
    let (records, report) = records_from_rows(&headers, rows)?;
    info!(
        path = %path.display(),
        records = records.len(),
        blank_rows = report.blank_rows,
        "loaded comparative table"
    );
    Ok((records, report))
}

fn clean_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_string()
}

fn read_csv(path: &Path) -> ReportResult<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.iter().map(clean_header).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok((headers, rows))
}

fn read_workbook(path: &Path) -> ReportResult<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::DataSourceMalformed("workbook has no worksheets".into()))??;
    let mut rows = range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect::<Vec<String>>());
    let headers = rows
        .next()
        .ok_or_else(|| ReportError::DataSourceMalformed("worksheet is empty".into()))?
        .iter()
        .map(|h| clean_header(h))
        .collect();
    Ok((headers, rows.collect()))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

fn required_number(row: &[String], idx: usize, column: &str, row_no: usize) -> ReportResult<f64> {
    let raw = cell(row, idx);
    match parse_f64_safe(Some(raw)) {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ReportError::InvalidValue {
            row: row_no,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn optional_number(row: &[String], idx: usize) -> Option<f64> {
    parse_f64_safe(Some(cell(row, idx))).filter(|v| v.is_finite())
}

/// Validate raw text rows into records. `row_no` in errors is the 1-based
/// sheet row, with the header on row 1.
fn records_from_rows(
    headers: &[String],
    rows: Vec<Vec<String>>,
) -> ReportResult<(Vec<ComparativeRecord>, LoadReport)> {
    let cols = ColumnIndex::resolve(headers)?;
    let total_rows = rows.len();
    let mut blank_rows = 0usize;
    let mut records = Vec::with_capacity(total_rows);

    for (i, row) in rows.iter().enumerate() {
        let row_no = i + 2;
        if row.iter().all(|c| c.trim().is_empty()) {
            blank_rows += 1;
            continue;
        }

        let month_label = cell(row, cols.month);
        let month = Month::from_label(month_label).ok_or_else(|| ReportError::UnknownMonth {
            label: month_label.trim().to_string(),
            row: Some(row_no),
        })?;

        let client = cell(row, cols.client).trim().to_string();
        if client.is_empty() {
            return Err(ReportError::InvalidValue {
                row: row_no,
                column: COL_CLIENT.to_string(),
                value: client,
            });
        }

        records.push(ComparativeRecord {
            month,
            client,
            revenue_year1: required_number(row, cols.revenue_y1, COL_REVENUE_Y1, row_no)?,
            revenue_year2: required_number(row, cols.revenue_y2, COL_REVENUE_Y2, row_no)?,
            quantity_year1: required_number(row, cols.quantity_y1, COL_QUANTITY_Y1, row_no)?,
            quantity_year2: required_number(row, cols.quantity_y2, COL_QUANTITY_Y2, row_no)?,
            pct_variation_revenue: optional_number(row, cols.pct_revenue),
            pct_variation_quantity: optional_number(row, cols.pct_quantity),
        });
    }

    Ok((
        records,
        LoadReport {
            total_rows,
            blank_rows,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "MESE,CLIENTE,FATTURATO_2024,FATTURATO_2025,QUANTITA_2024,QUANTITA_2025,VARIAZIONE_%_FATT,VARIAZIONE_%_QTA";

    fn write_file(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_typed_records_from_csv() {
        let dir = tempdir().unwrap();
        let body = format!(
            "{HEADER}\nGennaio,ACME,100,150,10,12,50,20\nFebbraio, Beta ,\"1,000\",900,5,5,-10,\n"
        );
        let path = write_file(dir.path(), "data.csv", &body);

        let (records, report) = load(&path).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].month, Month::January);
        assert_eq!(records[0].client, "ACME");
        assert_eq!(records[0].revenue_year2, 150.0);
        assert_eq!(records[0].pct_variation_revenue, Some(50.0));
        assert_eq!(records[1].client, "Beta");
        assert_eq!(records[1].revenue_year1, 1000.0);
        assert_eq!(records[1].pct_variation_quantity, None);
    }

    #[test]
    fn column_order_does_not_matter() {
        let dir = tempdir().unwrap();
        let body = "CLIENTE,EXTRA,VARIAZIONE_%_QTA,VARIAZIONE_%_FATT,QUANTITA_2025,QUANTITA_2024,FATTURATO_2025,FATTURATO_2024,MESE\nACME,x,1,2,3,4,5,6,Marzo\n";
        let path = write_file(dir.path(), "data.csv", body);

        let (records, _) = load(&path).unwrap();
        let r = &records[0];
        assert_eq!(r.month, Month::March);
        assert_eq!(r.revenue_year1, 6.0);
        assert_eq!(r.revenue_year2, 5.0);
        assert_eq!(r.quantity_year1, 4.0);
        assert_eq!(r.quantity_year2, 3.0);
        assert_eq!(r.pct_variation_revenue, Some(2.0));
        assert_eq!(r.pct_variation_quantity, Some(1.0));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("file_comparativo.xlsx")).unwrap_err();
        assert!(matches!(err, ReportError::DataSourceMissing { .. }));
    }

    #[test]
    fn missing_columns_fail_fast_and_are_all_listed() {
        let dir = tempdir().unwrap();
        let body = "MESE,CLIENTE,FATTURATO_2024,FATTURATO_2025,QUANTITA_2024,VARIAZIONE_%_FATT\nGennaio,ACME,1,2,3,4\n";
        let path = write_file(dir.path(), "data.csv", body);

        match load(&path).unwrap_err() {
            ReportError::DataSourceMalformed(msg) => {
                assert!(msg.contains("QUANTITA_2025"));
                assert!(msg.contains("VARIAZIONE_%_QTA"));
                assert!(!msg.contains("FATTURATO_2024"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_month_is_rejected_with_its_row() {
        let dir = tempdir().unwrap();
        let body = format!("{HEADER}\nGennaio,ACME,1,2,3,4,,\nTredicembre,ACME,1,2,3,4,,\n");
        let path = write_file(dir.path(), "data.csv", &body);

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            ReportError::UnknownMonth { ref label, row: Some(3) } if label == "Tredicembre"
        ));
    }

    #[test]
    fn non_numeric_amount_is_invalid() {
        let dir = tempdir().unwrap();
        let body = format!("{HEADER}\nGennaio,ACME,1,abc,3,4,,\n");
        let path = write_file(dir.path(), "data.csv", &body);

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            ReportError::InvalidValue { row: 2, ref column, .. } if column == "FATTURATO_2025"
        ));
    }

    #[test]
    fn italian_number_spellings_are_converted() {
        let dir = tempdir().unwrap();
        let body = format!("{HEADER}\nGennaio,ACME,\"1.234,56\",100,1,1,\"12,5\",\n");
        let path = write_file(dir.path(), "data.csv", &body);

        let (records, _) = load(&path).unwrap();
        assert_eq!(records[0].revenue_year1, 1234.56);
        assert_eq!(records[0].pct_variation_revenue, Some(12.5));
    }

    #[test]
    fn ambiguous_separators_are_invalid_not_misread() {
        let dir = tempdir().unwrap();
        let body = format!("{HEADER}\nGennaio,ACME,\"12,34,5\",100,1,1,,\n");
        let path = write_file(dir.path(), "data.csv", &body);

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            ReportError::InvalidValue { row: 2, ref column, ref value }
                if column == "FATTURATO_2024" && value == "12,34,5"
        ));
    }

    #[test]
    fn loads_records_from_xlsx_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file_comparativo.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "Febbraio").unwrap();
        sheet.write_string(1, 1, " ACME ").unwrap();
        sheet.write_number(1, 2, 1500.5).unwrap();
        sheet.write_number(1, 3, 1800.0).unwrap();
        sheet.write_number(1, 4, 10.0).unwrap();
        sheet.write_number(1, 5, 12.0).unwrap();
        sheet.write_number(1, 6, 19.97).unwrap();
        // VARIAZIONE_%_QTA left empty.
        sheet.write_string(2, 0, "gennaio").unwrap();
        sheet.write_string(2, 1, "Beta").unwrap();
        for col in 2..8u16 {
            sheet.write_number(2, col, 0.0).unwrap();
        }
        workbook.save(&path).unwrap();

        let (records, report) = load(&path).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(records.len(), 2);
        let r = &records[0];
        assert_eq!(r.month, Month::February);
        assert_eq!(r.client, "ACME");
        assert_eq!(r.revenue_year1, 1500.5);
        assert_eq!(r.revenue_year2, 1800.0);
        assert_eq!(r.quantity_year2, 12.0);
        assert_eq!(r.pct_variation_revenue, Some(19.97));
        assert_eq!(r.pct_variation_quantity, None);
        assert_eq!(records[1].month, Month::January);
        assert_eq!(records[1].revenue_year1, 0.0);
    }

    #[test]
    fn xlsx_with_missing_columns_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, COL_MONTH).unwrap();
        sheet.write_string(0, 1, COL_CLIENT).unwrap();
        sheet.write_string(1, 0, "Marzo").unwrap();
        sheet.write_string(1, 1, "ACME").unwrap();
        workbook.save(&path).unwrap();

        match load(&path).unwrap_err() {
            ReportError::DataSourceMalformed(msg) => assert!(msg.contains(COL_REVENUE_Y1)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn xlsx_with_empty_first_sheet_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        workbook.save(&path).unwrap();

        assert!(matches!(
            load(&path).unwrap_err(),
            ReportError::DataSourceMalformed(_)
        ));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let dir = tempdir().unwrap();
        let body = format!("{HEADER}\nGennaio,ACME,1,2,3,4,,\n,,,,,,,\nMaggio,ACME,1,2,3,4,,\n");
        let path = write_file(dir.path(), "data.csv", &body);

        let (records, report) = load(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.blank_rows, 1);
    }

    #[test]
    fn unsupported_extension_is_malformed() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "data.txt", HEADER);
        assert!(matches!(
            load(&path).unwrap_err(),
            ReportError::DataSourceMalformed(_)
        ));
    }

    #[test]
    fn spreadsheet_cells_become_text() {
        assert_eq!(cell_to_string(&Data::Float(1500.5)), "1500.5");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::String("Luglio".into())), "Luglio");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
