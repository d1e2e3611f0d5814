use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Decode SCTE-35 splice_info_section cue messages.
#[derive(Parser, Debug)]
#[command(name = "scte35", version, about, long_about = None)]
pub struct Args {
    /// Cue messages to decode. Read line by line from stdin when omitted.
    pub cues: Vec<String>,

    /// Read a raw binary section from a file instead
    #[arg(short, long, conflicts_with = "cues")]
    pub file: Option<PathBuf>,

    /// Text encoding of cue arguments
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = InputFormat::Auto,
        env = "SCTE35_INPUT_FORMAT"
    )]
    pub input_format: InputFormat,

    /// Output format
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = OutputFormat::Pretty,
        env = "SCTE35_OUTPUT"
    )]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Hex when `0x`-prefixed or all hex digits, base64 otherwise
    Auto,
    Base64,
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    JsonCompact,
}
