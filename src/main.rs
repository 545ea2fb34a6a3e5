//! forge – render report documents to HTML previews and PDF.
//!
//! Usage:
//!   forge preview <report.json> [out.html] [--css <href>]
//!   forge export  <report.json> [out.pdf]  [--offline] [--css <href>]
//!
//! `--sample <name>` replaces `<report.json>` with a built-in sample. Without
//! an output path, export writes the derived download filename into the
//! current directory and preview writes to stdout.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

use report_forge::assets::fetcher_for;
use report_forge::engine::ForgeEngine;
use report_forge::error::ForgeError;
use report_forge::export::{export_pdf, preview_html};
use report_forge::samples::{sample, SAMPLE_NAMES};
use report_forge::settings::Settings;

enum Command {
    Preview,
    Export,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("forge");

    let mut command: Option<Command> = None;
    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut sample_name: Option<String> = None;
    let mut settings = Settings::default();
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--offline" => settings.remote_assets = false,
            "--css" => match iter.next() {
                Some(v) => settings.utility_css_href = v.clone(),
                None => usage_error(prog, "--css needs a value"),
            },
            "--sample" => match iter.next() {
                Some(v) => sample_name = Some(v.clone()),
                None => usage_error(prog, "--sample needs a name"),
            },
            "--help" | "-h" => {
                print_usage(prog);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                usage_error(prog, &format!("Unknown flag: {other}"));
            }
            value => {
                match positional {
                    0 => {
                        command = match value {
                            "preview" => Some(Command::Preview),
                            "export" => Some(Command::Export),
                            _ => usage_error(prog, &format!("Unknown command: {value}")),
                        }
                    }
                    // With --sample the first path is the output.
                    1 if sample_name.is_none() => input_path = Some(PathBuf::from(value)),
                    1 | 2 if output_path.is_none() => output_path = Some(PathBuf::from(value)),
                    _ => usage_error(prog, &format!("Unexpected argument: {value}")),
                }
                positional += 1;
            }
        }
    }

    let Some(command) = command else {
        usage_error(prog, "no command specified")
    };

    let json = match (&sample_name, &input_path) {
        (Some(name), _) => match sample(name) {
            Some(json) => json.to_string(),
            None => {
                eprintln!(
                    "Error: unknown sample '{name}' (available: {})",
                    SAMPLE_NAMES.join(", ")
                );
                process::exit(1);
            }
        },
        (None, Some(path)) => match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading '{}': {e}", path.display());
                process::exit(1);
            }
        },
        (None, None) => usage_error(prog, "no input file specified"),
    };

    let today = chrono::Local::now().date_naive();

    match command {
        Command::Preview => match preview_html(&json, &settings, today) {
            Ok(html) => match output_path {
                Some(path) => {
                    write_output(&path, html.as_bytes());
                    eprintln!("Wrote '{}' ({} bytes)", path.display(), html.len());
                }
                None => print!("{html}"),
            },
            Err(e) => exit_with(&e),
        },
        Command::Export => {
            let fetcher = fetcher_for(&settings);
            let engine = ForgeEngine::new();
            match export_pdf(&json, &settings, &*fetcher, &engine, today) {
                Ok(output) => {
                    let path = output_path.unwrap_or_else(|| PathBuf::from(&output.filename));
                    write_output(&path, &output.bytes);
                    eprintln!(
                        "Wrote '{}' ({} bytes, {} diagnostic{})",
                        path.display(),
                        output.bytes.len(),
                        output.diagnostics.len(),
                        if output.diagnostics.len() == 1 { "" } else { "s" }
                    );
                }
                Err(e) => exit_with(&e),
            }
        }
    }
}

fn write_output(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

fn exit_with(err: &ForgeError) -> ! {
    match err {
        ForgeError::Validation(v) => {
            eprintln!("Invalid report:");
            for issue in &v.issues {
                eprintln!("  {issue}");
            }
            process::exit(2);
        }
        ForgeError::Export(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn usage_error(prog: &str, msg: &str) -> ! {
    eprintln!("Error: {msg}");
    print_usage(prog);
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("forge – report documents to HTML preview and PDF (report-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} preview <report.json> [out.html] [--css <href>]");
    eprintln!("  {prog} export  <report.json> [out.pdf]  [--offline] [--css <href>]");
    eprintln!("  {prog} export  --sample <name> [out.pdf]");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --offline       Do not fetch remote images; they are omitted");
    eprintln!("  --css <href>    Utility stylesheet linked from the preview");
    eprintln!("  --sample <name> Use a built-in sample ({})", SAMPLE_NAMES.join(", "));
    eprintln!("  --help          Print this message");
    eprintln!();
    eprintln!("Exit codes: 0 ok, 1 failure, 2 invalid report");
}
