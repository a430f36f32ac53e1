//! Data Sweeper CLI - clean and convert CSV / spreadsheet files
//!
//! # Commands
//!
//! ```bash
//! sweeper preview sales.csv                         # Metadata + first rows
//! sweeper clean sales.csv stock.xlsx --remove-duplicates --fill-missing --format xlsx
//! sweeper serve                                     # Start HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use sweeper::transform::pipeline::{failure_count, format_delimiter, summarize_columns, FileReport};
use sweeper::{
    ingest_path, process_batch, AppConfig, CleaningRequest, ExportTarget, ParseOptions,
    ProcessOptions, Upload,
};

#[derive(Parser)]
#[command(name = "sweeper")]
#[command(about = "Preview, clean and convert CSV and spreadsheet files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show file metadata and the first rows
    Preview {
        /// Input file (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods)
        input: PathBuf,

        /// Number of rows to show
        #[arg(short, long)]
        rows: Option<usize>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Print the preview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean one or more files and write `<name>_cleaned.<ext>`
    Clean {
        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Drop rows equal to an earlier row
        #[arg(long)]
        remove_duplicates: bool,

        /// Fill missing numeric values with the column mean
        #[arg(long)]
        fill_missing: bool,

        /// Output format: csv or xlsx
        #[arg(short, long, default_value = "csv")]
        format: ExportTarget,

        /// Directory for cleaned files (default: next to each input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SWEEPER_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Preview {
            input,
            rows,
            delimiter,
            json,
        } => cmd_preview(&input, rows.unwrap_or(config.preview_rows), delimiter, json),

        Commands::Clean {
            inputs,
            remove_duplicates,
            fill_missing,
            format,
            output_dir,
            delimiter,
        } => {
            let request = CleaningRequest {
                remove_duplicates,
                fill_missing_numeric: fill_missing,
            };
            cmd_clean(&inputs, request, format, output_dir.as_deref(), delimiter)
        }

        Commands::Serve { port } => {
            let config = AppConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_preview(
    input: &Path,
    rows: usize,
    delimiter: Option<char>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = fs::metadata(input).map(|m| m.len()).unwrap_or(0);
    let parsed = ingest_path(input, &ParseOptions { delimiter })?;
    let preview = parsed.dataset.head(rows);

    if json {
        let table = sweeper::PreviewTable::from(&preview);
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    eprintln!("📄 File: {}", input.display());
    eprintln!("   Size: {:.2} KB", size as f64 / 1024.0);
    if let Some(ref encoding) = parsed.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(d) = parsed.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(d));
    }
    eprintln!(
        "   Shape: {} rows × {} columns",
        parsed.dataset.row_count(),
        parsed.dataset.column_count()
    );
    for (i, column) in summarize_columns(&parsed.dataset).iter().enumerate() {
        eprintln!(
            "   [{:2}] {} ({}, {} missing)",
            i + 1,
            column.name,
            column.dtype,
            column.missing
        );
    }

    eprintln!("\n🔍 Preview ({} rows)", preview.row_count());
    println!("{}", preview.headers().join("\t"));
    for row in preview.rows() {
        let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        println!("{}", line.join("\t"));
    }

    Ok(())
}

fn cmd_clean(
    inputs: &[PathBuf],
    request: CleaningRequest,
    format: ExportTarget,
    output_dir: Option<&Path>,
    delimiter: Option<char>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (uploads, read_failures) = read_uploads(inputs);

    let options = ProcessOptions {
        request,
        export: Some(format),
        parse: ParseOptions { delimiter },
        ..Default::default()
    };

    let outcomes = process_batch(&uploads, &options);
    let mut failed = read_failures;
    let mut written = HashSet::new();

    for (outcome, upload_path) in outcomes.iter().zip(upload_paths(inputs, &uploads)) {
        match &outcome.result {
            Ok(report) => {
                if let Err(e) = write_report(report, &upload_path, output_dir, &mut written) {
                    eprintln!("❌ {}: {}", outcome.file_name, e);
                    failed += 1;
                }
            }
            Err(e) => eprintln!("❌ {}", e),
        }
    }
    failed += failure_count(&outcomes);

    let total = inputs.len();
    if failed > 0 {
        return Err(format!("{} of {} file(s) failed", failed, total).into());
    }

    eprintln!("\n✨ Done! {} file(s) cleaned", total);
    Ok(())
}

/// Read every input. Unreadable files are reported and counted, not fatal.
fn read_uploads(inputs: &[PathBuf]) -> (Vec<Upload>, usize) {
    let mut uploads = Vec::with_capacity(inputs.len());
    let mut failed = 0;

    for path in inputs {
        match fs::read(path) {
            Ok(bytes) => uploads.push(Upload::new(sweeper::parser::display_name(path), bytes)),
            Err(e) => {
                eprintln!("❌ Cannot read {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    (uploads, failed)
}

/// Paths of the inputs that were read, aligned with `uploads`.
fn upload_paths(inputs: &[PathBuf], uploads: &[Upload]) -> Vec<PathBuf> {
    let mut remaining = inputs.iter();
    uploads
        .iter()
        .filter_map(|upload| {
            remaining
                .by_ref()
                .find(|p| sweeper::parser::display_name(p) == upload.file_name)
                .cloned()
        })
        .collect()
}

/// Print the per-file report and save the export.
///
/// `written` holds the outputs saved so far; a second input mapping to the same
/// output path is an error instead of an overwrite.
fn write_report(
    report: &FileReport,
    input: &Path,
    output_dir: Option<&Path>,
    written: &mut HashSet<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 {} ({:.2} KB)", report.file_name, report.size_kb());
    eprintln!("   Rows: {} → {}", report.original_row_count, report.row_count);
    if let Some(removed) = report.cleaning.duplicates_removed {
        eprintln!("   ✓ Removed {} duplicate rows.", removed);
    }
    if let Some(filled) = report.cleaning.missing_filled {
        eprintln!("   ✓ Filled {} missing numeric values.", filled);
    }

    if let Some(ref exported) = report.export {
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        fs::create_dir_all(&dir)?;
        let path = dir.join(&exported.file_name);
        if !written.insert(path.clone()) {
            return Err(format!(
                "{} was already written by another input with the same name",
                path.display()
            )
            .into());
        }
        fs::write(&path, &exported.bytes)?;
        eprintln!("   💾 Saved to: {}", path.display());
    }

    Ok(())
}

async fn cmd_serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    sweeper::server::start_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_writes_outputs_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("sales.csv");
        let bad = dir.path().join("notes.txt");
        fs::write(&good, "item,qty\npen,1\npen,1\npad,\n").unwrap();
        fs::write(&bad, "hello").unwrap();

        let out = dir.path().join("out");
        let result = cmd_clean(
            &[bad.clone(), good.clone()],
            CleaningRequest::all(),
            ExportTarget::Csv,
            Some(&out),
            None,
        );

        // One failure makes the command fail, but the good file is still written.
        assert!(result.is_err());
        let written = fs::read_to_string(out.join("sales.csv_cleaned.csv")).unwrap();
        assert_eq!(written, "item,qty\npen,1.0\npad,1.0\n");
    }

    #[test]
    fn test_clean_next_to_input_as_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.csv");
        fs::write(&input, "a,b\n1,x\n").unwrap();

        cmd_clean(
            &[input],
            CleaningRequest::default(),
            ExportTarget::Spreadsheet,
            None,
            None,
        )
        .unwrap();

        let bytes = fs::read(dir.path().join("data.csv_cleaned.xlsx")).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_same_name_inputs_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a").join("x.csv");
        let second = dir.path().join("b").join("x.csv");
        fs::create_dir_all(first.parent().unwrap()).unwrap();
        fs::create_dir_all(second.parent().unwrap()).unwrap();
        fs::write(&first, "v\n1\n").unwrap();
        fs::write(&second, "v\n2\n").unwrap();

        let out = dir.path().join("out");
        let result = cmd_clean(
            &[first, second],
            CleaningRequest::default(),
            ExportTarget::Csv,
            Some(&out),
            None,
        );

        assert!(result.is_err());
        let written = fs::read_to_string(out.join("x.csv_cleaned.csv")).unwrap();
        assert_eq!(written, "v\n1\n");
    }

    #[test]
    fn test_missing_input_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = cmd_clean(
            &[dir.path().join("absent.csv")],
            CleaningRequest::default(),
            ExportTarget::Csv,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_clean_flags() {
        let cli = Cli::try_parse_from([
            "sweeper",
            "clean",
            "a.csv",
            "b.xlsx",
            "--remove-duplicates",
            "--format",
            "xlsx",
        ])
        .unwrap();

        match cli.command {
            Commands::Clean {
                inputs,
                remove_duplicates,
                fill_missing,
                format,
                ..
            } => {
                assert_eq!(inputs.len(), 2);
                assert!(remove_duplicates);
                assert!(!fill_missing);
                assert_eq!(format, ExportTarget::Spreadsheet);
            }
            _ => panic!("expected clean command"),
        }
    }
}
