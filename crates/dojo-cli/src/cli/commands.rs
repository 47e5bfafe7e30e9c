use super::CliError;
use super::helpers::{ChecksumManifest, load_checksum_manifest, load_table};
use dojo_core::notebook::{NotebookOptions, make_open_notebook, write_notebook};
use dojo_core::table::{ScanOptions, ValidationReport, render_human_summary};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct ValidateArgs {
    /// Dojo directory or .djson index file
    target: PathBuf,

    /// Exact basenames to skip during directory scans
    #[arg(long, value_delimiter = ',', value_name = "BASENAME")]
    exclude_basenames: Vec<String>,

    /// `|`-separated glob tokens to skip during directory scans
    #[arg(long, value_name = "TOKENS")]
    exclude_wildcard: Option<String>,

    /// Treat missing ecut hints as findings
    #[arg(long)]
    require_hints: bool,

    /// JSON checksum manifest (basename -> md5) to verify against
    #[arg(long, value_name = "FILE")]
    checksums: Option<PathBuf>,

    /// JSON report output path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct InfoArgs {
    /// Dojo directory or .djson index file
    target: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct NotebookArgs {
    /// Pseudopotential file (.psp8)
    pseudo: PathBuf,

    /// Append the interactive validation-widget cells
    #[arg(long)]
    validation: bool,

    /// Append the GBRV equation-of-state cells
    #[arg(long)]
    eos: bool,

    /// Write to a persisted temporary file instead of the sibling .ipynb
    #[arg(long)]
    tmpfile: bool,

    /// Open the notebook with `jupyter notebook` after writing it
    #[arg(long)]
    open: bool,
}

pub(super) fn run_validate_command(args: ValidateArgs) -> Result<i32, CliError> {
    let scan_options = ScanOptions {
        exclude_basenames: args.exclude_basenames,
        exclude_wildcard: args.exclude_wildcard,
    };
    let table = load_table(&args.target, &scan_options).map_err(CliError::Table)?;

    let checksums = args
        .checksums
        .as_deref()
        .map(load_checksum_manifest)
        .transpose()
        .map_err(CliError::Table)?;

    let findings = table.find_errors(
        checksums.as_ref().map(ChecksumManifest::digests),
        args.require_hints,
    );
    let report = ValidationReport::from_findings(&table, findings);
    println!("{}", render_human_summary(&report));

    if let Some(report_path) = &args.report {
        report.write_to(report_path).map_err(CliError::Table)?;
        println!("JSON report: {}", report_path.display());
    }

    if report.passed { Ok(0) } else { Ok(1) }
}

pub(super) fn run_info_command(args: InfoArgs) -> Result<i32, CliError> {
    let table = load_table(&args.target, &ScanOptions::default()).map_err(CliError::Table)?;

    println!("Table: {}", table.origin());
    println!("Pseudos: {}", table.len());
    match table.info() {
        Some(info) => {
            println!("{}", info.summary_line());
            let rendered = serde_json::to_string_pretty(info)
                .map_err(|source| CliError::Internal(source.into()))?;
            println!("{}", rendered);
        }
        None => println!("No dojo_info (directory table)"),
    }
    Ok(0)
}

pub(super) fn run_notebook_command(args: NotebookArgs) -> Result<i32, CliError> {
    let base = if args.open {
        NotebookOptions::for_open()
    } else {
        NotebookOptions::for_write()
    };
    let options = NotebookOptions {
        with_validation: args.validation || base.with_validation,
        with_eos: args.eos || base.with_eos,
        tmpfile: args.tmpfile || base.tmpfile,
    };

    if args.open {
        return make_open_notebook(&args.pseudo, &options).map_err(CliError::Table);
    }

    let notebook_path = write_notebook(&args.pseudo, &options).map_err(CliError::Table)?;
    println!("Notebook: {}", notebook_path.display());
    Ok(0)
}
