//! nana-render - command line inspection tool
//!
//! Tokenizes a markdown note and prints the tokens, the display text or the
//! styled spans as JSON, using the same settings the editor would.

use log::{error, info};
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use nana_render::config::load_config;
use nana_render::editor::{SelectionRange, StyledSpans};
use nana_render::error::{Error, Result};
use nana_render::Synchronizer;

/// What to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Tokens,
    Display,
    Spans,
}

#[derive(Debug)]
struct CliOptions {
    path: PathBuf,
    output: Output,
    /// Display lines treated as selected (shown raw)
    select: Vec<usize>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage();
        process::exit(2);
    });

    if let Err(e) = run(&options) {
        error!("{}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> std::result::Result<CliOptions, String> {
    let mut path = None;
    let mut output = Output::Tokens;
    let mut select = Vec::new();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--tokens" => output = Output::Tokens,
            "--display" => output = Output::Display,
            "--spans" => output = Output::Spans,
            "--select" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --select")?;
                let line = value
                    .parse()
                    .map_err(|_| format!("Invalid line number: {}", value))?;
                select.push(line);
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            file => {
                if path.replace(PathBuf::from(file)).is_some() {
                    return Err("Only one file can be given".to_string());
                }
            }
        }
        i += 1;
    }

    Ok(CliOptions {
        path: path.ok_or("No input file given")?,
        output,
        select,
    })
}

fn print_usage() {
    eprintln!("Usage: nana-render <file> [--tokens|--display|--spans] [--select LINE]...");
}

fn run(options: &CliOptions) -> Result<()> {
    let text = fs::read_to_string(&options.path).map_err(|e| Error::FileRead {
        path: options.path.clone(),
        source: e,
    })?;
    info!("Rendering {}", options.path.display());

    let settings = load_config();
    let mut sync = Synchronizer::from_settings(&settings, false);
    sync.set_source(&text);
    sync.tick();

    if !options.select.is_empty() {
        let ranges: Vec<SelectionRange> = options
            .select
            .iter()
            .map(|&line| SelectionRange::caret(line_start(sync.display(), line)))
            .collect();
        sync.on_selection_changed(&ranges);
        sync.tick();
    }

    let value = match options.output {
        Output::Tokens => serde_json::to_value(sync.tokens()).map_err(output_error)?,
        Output::Display => json!({
            "display": sync.display(),
            "tokens": sync.display_tokens(),
            "selected_lines": sync.selected_lines(),
        }),
        Output::Spans => spans_json(sync.spans()),
    };
    let pretty = serde_json::to_string_pretty(&value).map_err(output_error)?;
    println!("{}", pretty);
    Ok(())
}

fn output_error(e: serde_json::Error) -> Error {
    Error::Application(format!("Failed to serialize output: {}", e))
}

/// Scalar offset of the start of `line`, or the text end past the last line.
fn line_start(text: &str, line: usize) -> usize {
    if line == 0 {
        return 0;
    }
    text.chars()
        .enumerate()
        .filter(|(_, c)| *c == '\n')
        .nth(line - 1)
        .map(|(i, _)| i + 1)
        .unwrap_or_else(|| text.chars().count())
}

fn hex(color: egui::Color32) -> String {
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        color.r(),
        color.g(),
        color.b(),
        color.a()
    )
}

fn spans_json(spans: &StyledSpans) -> Value {
    let runs: Vec<Value> = spans
        .runs()
        .iter()
        .map(|run| {
            let attrs = &run.attributes;
            json!({
                "start": run.range.start,
                "end": run.range.end,
                "size": attrs.font.size,
                "monospace": attrs.font.monospace,
                "bold": attrs.font.bold,
                "italic": attrs.font.italic,
                "foreground": hex(attrs.foreground),
                "background": attrs.background.map(hex),
                "indent": attrs.indent,
                "underline": attrs.underline,
                "link": attrs.link,
            })
        })
        .collect();
    Value::Array(runs)
}
