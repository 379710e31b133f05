use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::convert::{ConvertConfig, Emit};
use crate::parser::InputFormat;
use crate::projector::Placement;

#[derive(Parser)]
#[command(version, about = "Turn a context-free grammar into a node/edge graph document")]
pub struct Cli {
    /// File containing the grammar (protobuf text format or JSON)
    pub file: PathBuf,

    /// Where to write the document, `-` for standard output
    #[arg(short, long, value_name = "PATH", default_value = "graph.json")]
    pub output: PathBuf,

    /// Format of the grammar file
    #[arg(short, long, value_enum, default_value_t)]
    pub format: InputFormat,

    /// How nodes are positioned
    #[arg(long, value_enum, default_value_t)]
    pub placement: Placement,

    /// Indent the output
    #[arg(long)]
    pub pretty: bool,

    /// Write the graph, or the grammar records it is built from
    #[arg(long, value_enum, default_value_t)]
    pub emit: Emit,

    /// More logging (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool
}

impl Cli {
    pub fn config(&self) -> ConvertConfig {
        ConvertConfig {
            format: self.format,
            placement: self.placement,
            pretty: self.pretty,
            emit: self.emit,
            ..ConvertConfig::new(&self.file, &self.output)
        }
    }

    // Used when RUST_LOG is not set
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
