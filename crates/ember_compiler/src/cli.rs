use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile an entry file to C.
    Build {
        /// The entry source file. Imports are resolved relative to its
        /// directory.
        input: PathBuf,

        /// The output file. Defaults to the input with a `.c` extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the merged unit as JSON next to the output.
        #[arg(long)]
        emit_ast: bool,

        /// Leave the log sink out of the panic routine.
        #[arg(long)]
        no_logging: bool,

        /// Leave the display sink out of the panic routine.
        #[arg(long)]
        no_printing: bool,

        /// Build without the heap-release hook.
        #[arg(long)]
        no_heap: bool,
    },
}
