mod cli;
mod error;
mod input;
mod output;

use std::{
    io::{self, BufRead},
    process,
};

use clap::Parser;
use tracing::{Level, debug, error, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::{
    cli::{Args, InputFormat, OutputFormat},
    error::{AppError, Result},
    input::decode_cue,
    output::format_section,
};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if let Some(path) = &args.file {
        debug!("Reading section from {}", path.display());
        let data = std::fs::read(path)?;
        return print_section(&data, args.output);
    }

    let cues = if args.cues.is_empty() {
        debug!("Reading cues from stdin");
        read_stdin_cues()?
    } else {
        args.cues
    };

    let failed = process_cues(&cues, args.input_format, args.output);
    if failed > 0 {
        return Err(AppError::InvalidInput(format!(
            "{failed} of {} cues failed to decode",
            cues.len()
        )));
    }
    Ok(())
}

/// Decode every cue, logging failures. Returns the number that failed.
fn process_cues(cues: &[String], input_format: InputFormat, output: OutputFormat) -> usize {
    let mut failed = 0;
    for cue in cues {
        if let Err(e) = process_cue(cue, input_format, output) {
            error!("Failed to decode cue {:?}: {}", cue, e);
            failed += 1;
        }
    }
    failed
}

fn read_stdin_cues() -> Result<Vec<String>> {
    let mut cues = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if !line.trim().is_empty() {
            cues.push(line);
        }
    }
    Ok(cues)
}

fn process_cue(cue: &str, input_format: InputFormat, output: OutputFormat) -> Result<()> {
    let data = decode_cue(cue, input_format)?;
    print_section(&data, output)
}

fn print_section(data: &[u8], output: OutputFormat) -> Result<()> {
    let section = scte35::decode(data)?;
    if section.table_id != scte35::SCTE35_TABLE_ID {
        warn!(
            "Unexpected table_id 0x{:02X}, expected 0x{:02X}",
            section.table_id,
            scte35::SCTE35_TABLE_ID
        );
    }
    println!("{}", format_section(&section, output)?);
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
