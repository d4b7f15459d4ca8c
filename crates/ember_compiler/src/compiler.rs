use ember_frontend::ast::CompilationUnit;
use ember_frontend::SourceResolver;
use ember_session::diagnostics::DiagnosticEmitter;
use ember_session::{ErrorsEmitted, Session};

#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Backend(#[from] ember_backend::BackendError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("errors while compiling")]
    HadErrors,
}

impl From<ErrorsEmitted> for CompilerError {
    fn from(_: ErrorsEmitted) -> Self {
        CompilerError::HadErrors
    }
}

pub type CompilerResult<T> = Result<T, CompilerError>;

/// A successful compilation: the generated C and the merged unit it came
/// from (kept for dumps).
pub struct Artifact {
    pub c_source: String,
    pub unit: CompilationUnit,
}

/// Drives the whole pipeline for one entry file: import resolution, semantic
/// lowering, then C generation. Every accumulated error is reported through
/// the session before this returns.
pub fn compile<D, R>(
    session: &mut Session<D>,
    resolver: &R,
    entry: &str,
) -> CompilerResult<Artifact>
where
    D: DiagnosticEmitter,
    R: SourceResolver,
{
    let (unit, errors) = ember_frontend::resolve_imports(&mut session.sources, resolver, entry);
    session.report_all(errors, &())?;

    let options = session.options;
    let lowered = ember_middle::lower(unit, &options);

    let total_errors = lowered.total_errors;
    session.report_all(lowered.errors, &())?;

    // recording may have been capped; any error still skips codegen
    if total_errors > 0 {
        return Err(CompilerError::HadErrors);
    }

    let c_source = ember_backend::generate(&lowered.unit, &session.sources, &options)?;

    Ok(Artifact {
        c_source,
        unit: lowered.unit,
    })
}
