// Entry point and high-level CLI flow.
//
// The table is loaded once. In the default mode one report is generated from
// the command line selections; with `--interactive` a menu lets the user
// change the client and month selections and regenerate as often as needed.
mod cli;
mod error;
mod loader;
mod month;
mod output;
mod reports;
mod session;
mod transform;
mod types;
mod util;

use clap::Parser;
use cli::{Args, ReportConfig};
use error::ReportResult;
use session::{MonthContext, Session};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing::{error, info, warn};

fn init_logging(level: &str, json_output: bool) {
    // stdout carries only the JSON summary in `--json` mode.
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Print `prompt` and read one trimmed line. `None` at end of input or on a
/// read error.
fn read_line(input: &mut impl BufRead, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn list_of<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build every view for the current selection, print it and export it.
fn generate(session: &Session, config: &ReportConfig) -> ReportResult<()> {
    let bundle = reports::build_report(&session.records, &session.selection, config.top_n);
    let summary = reports::summarize(
        &bundle,
        &session.selection,
        &session.source.display().to_string(),
    );

    if config.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    output::print_bundle(&bundle, config.preview_rows);
    println!(
        "Totale fatturato: {} (2024) -> {} (2025)",
        util::format_number(summary.total_revenue_2024, 2),
        util::format_number(summary.total_revenue_2025, 2)
    );
    println!(
        "Totale quantità: {} (2024) -> {} (2025)\n",
        util::format_number(summary.total_quantity_2024, 2),
        util::format_number(summary.total_quantity_2025, 2)
    );

    if config.export {
        let written = output::export_bundle(&config.output_dir, &bundle)?;
        let summary_path = config.output_dir.join("summary.json");
        output::write_json(&summary_path, &summary)?;
        println!(
            "Outputs saved to {} ({} files)\n",
            config.output_dir.display(),
            written.len() + 1
        );
    }
    Ok(())
}

fn print_selection(session: &Session) {
    let sel = &session.selection;
    println!("Clienti ({}): {}", sel.clients.len(), list_of(&sel.clients));
    println!("Mesi per cliente: {}", list_of(&sel.client_months));
    println!("Mesi complessivi: {}", list_of(&sel.total_months));
    println!("Mesi variazione: {}\n", list_of(&sel.variation_months));
}

fn run_menu(session: &mut Session, config: &ReportConfig, input: &mut impl BufRead) {
    loop {
        println!("[1] Seleziona clienti");
        println!("[2] Seleziona mesi per i grafici dei clienti");
        println!("[3] Seleziona mesi per i grafici complessivi");
        println!("[4] Seleziona mesi per la variazione");
        println!("[5] Genera report");
        println!("[0] Esci\n");
        let Some(choice) = read_line(input, "Enter choice: ") else {
            println!();
            break;
        };
        let result = match choice.as_str() {
            "1" => {
                println!("Available: {}", list_of(&session.clients));
                let Some(line) = read_line(input, "Clients (comma separated, * all, - none): ") else {
                    break;
                };
                session.update_clients(&line)
            }
            "2" | "3" | "4" => {
                let context = match choice.as_str() {
                    "2" => MonthContext::Clients,
                    "3" => MonthContext::Totals,
                    _ => MonthContext::Variation,
                };
                println!("Available: {}", list_of(&session.months));
                let Some(line) = read_line(input, "Months (comma separated, * all, - none): ") else {
                    break;
                };
                session.update_months(context, &line)
            }
            "5" => generate(session, config),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 0-5.\n");
                continue;
            }
        };
        match result {
            Ok(()) => print_selection(session),
            Err(e) => {
                warn!(error = %e, "selection not applied");
                println!("Error: {}\n", e);
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.json);
    let config = ReportConfig::from(args);

    let (records, load_report) = match loader::load(&config.input) {
        Ok(v) => v,
        Err(e) => {
            // Nothing is rendered without data.
            error!(error = %e, "failed to load data source");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if !config.json {
        println!(
            "Processing dataset... ({} rows loaded, {} blank rows skipped)\n",
            util::format_int(records.len()),
            util::format_int(load_report.blank_rows)
        );
    }

    let mut session = Session::new(config.input.clone(), records);
    if let Err(e) = session.apply_args(&config.selection) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    info!(
        clients = session.clients.len(),
        months = session.months.len(),
        total_rows = load_report.total_rows,
        "session ready"
    );

    if config.interactive {
        print_selection(&session);
        run_menu(&mut session, &config, &mut io::stdin().lock());
        return ExitCode::SUCCESS;
    }

    match generate(&session, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::Month;
    use crate::types::ComparativeRecord;
    use std::path::PathBuf;

    fn session() -> Session {
        let records = ["ACME", "Beta"]
            .iter()
            .map(|c| ComparativeRecord {
                month: Month::January,
                client: c.to_string(),
                revenue_year1: 100.0,
                revenue_year2: 110.0,
                quantity_year1: 1.0,
                quantity_year2: 1.0,
                pct_variation_revenue: None,
                pct_variation_quantity: None,
            })
            .collect();
        Session::new(PathBuf::from("data.csv"), records)
    }

    fn config() -> ReportConfig {
        ReportConfig::from(Args::parse_from(["comparative_report", "--no-export"]))
    }

    #[test]
    fn read_line_is_none_at_end_of_input() {
        let mut input: &[u8] = b"";
        assert_eq!(read_line(&mut input, "> "), None);
        let mut input: &[u8] = b"  3 \n";
        assert_eq!(read_line(&mut input, "> ").as_deref(), Some("3"));
    }

    #[test]
    fn menu_stops_when_input_is_exhausted() {
        let mut session = session();
        let before = session.selection.clone();
        let mut input: &[u8] = b"";
        run_menu(&mut session, &config(), &mut input);
        assert_eq!(session.selection, before);
    }

    #[test]
    fn menu_stops_on_end_of_input_after_invalid_choices() {
        let mut session = session();
        let mut input: &[u8] = b"9\nx\n";
        run_menu(&mut session, &config(), &mut input);
    }

    #[test]
    fn menu_applies_selection_and_stops_at_end_of_input() {
        let mut session = session();
        let mut input: &[u8] = b"1\nBeta\n4\n-\n";
        run_menu(&mut session, &config(), &mut input);
        assert_eq!(session.selection.clients.len(), 1);
        assert!(session.selection.clients.contains("Beta"));
        assert!(session.selection.variation_months.is_empty());
    }
}
