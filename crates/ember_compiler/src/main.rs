mod cli;

use std::path::Path;

use clap::Parser as _;
use cli::{Cli, Command};
use ember_compiler::{compile, CompilerResult};
use ember_frontend::FsResolver;
use ember_session::diagnostics::PrettyDiagnosticEmitter;
use ember_session::options::CompileOptions;
use ember_session::Session;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> CompilerResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output,
            emit_ast,
            no_logging,
            no_printing,
            no_heap,
        } => {
            let options = CompileOptions {
                logging: !no_logging,
                printing: !no_printing,
                heap_allocator: !no_heap,
                ..CompileOptions::default()
            };

            let root = input.parent().map(Path::to_path_buf).unwrap_or_default();
            let entry = input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let mut session = Session::new(options, PrettyDiagnosticEmitter::default());
            let resolver = FsResolver::new(root);

            let artifact = compile(&mut session, &resolver, &entry)?;

            let output = output.unwrap_or_else(|| input.with_extension("c"));
            std::fs::write(&output, &artifact.c_source)?;

            if emit_ast {
                let json = serde_json::to_string_pretty(&artifact.unit)?;
                std::fs::write(output.with_extension("json"), json)?;
            }

            Ok(())
        }
    }
}
