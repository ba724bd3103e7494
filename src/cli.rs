use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Comparative revenue and quantity report, 2024 vs 2025",
    long_about = "Loads the comparative table (MESE, CLIENTE, FATTURATO_2024/2025, \
                  QUANTITA_2024/2025, VARIAZIONE_%_FATT/QTA) and produces per-client \
                  series, monthly totals and top/bottom client rankings.\n\n\
                  Selections are comma separated lists; `*` selects everything."
)]
pub struct Args {
    /// Spreadsheet (.xlsx, .xls, .ods) or CSV file with the comparative table
    #[arg(short, long, default_value = "file_comparativo.xlsx")]
    pub input: PathBuf,

    /// Directory for the exported CSV views and summary.json
    #[arg(short, long, default_value = "./reports")]
    pub output: PathBuf,

    /// Clients for the per-client charts (default: first 22 in the file)
    #[arg(long)]
    pub clients: Option<String>,

    /// Months for the per-client charts (default: all)
    #[arg(long)]
    pub months: Option<String>,

    /// Months for the overall totals (default: all)
    #[arg(long)]
    pub total_months: Option<String>,

    /// Months for the variation ranking (default: all)
    #[arg(long)]
    pub variation_months: Option<String>,

    /// Number of clients in the top and bottom rankings
    #[arg(long, default_value = "5")]
    pub top_n: usize,

    /// Rows shown per table in the console preview
    #[arg(long, default_value = "10")]
    pub preview_rows: usize,

    /// Keep the table loaded and edit selections from a menu
    #[arg(long)]
    pub interactive: bool,

    /// Skip writing files
    #[arg(long)]
    pub no_export: bool,

    /// Print only the JSON summary to stdout
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

/// Raw selection strings as given on the command line; resolved against the
/// loaded table by the session.
#[derive(Debug, Clone, Default)]
pub struct SelectionArgs {
    pub clients: Option<String>,
    pub months: Option<String>,
    pub total_months: Option<String>,
    pub variation_months: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub selection: SelectionArgs,
    pub top_n: usize,
    pub preview_rows: usize,
    pub interactive: bool,
    pub export: bool,
    pub json: bool,
}

impl From<Args> for ReportConfig {
    fn from(args: Args) -> Self {
        ReportConfig {
            input: args.input,
            output_dir: args.output,
            selection: SelectionArgs {
                clients: args.clients,
                months: args.months,
                total_months: args.total_months,
                variation_months: args.variation_months,
            },
            top_n: args.top_n,
            preview_rows: args.preview_rows,
            interactive: args.interactive && !args.json,
            export: !args.no_export,
            json: args.json,
        }
    }
}
