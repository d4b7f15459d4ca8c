/// Compile-time feature toggles.
///
/// Only the code generator and the semantic error cap consult these; the
/// front-end passes behave identically under every configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompileOptions {
    /// Lower panic payloads to the log sink. When disabled the log step of
    /// the panic routine becomes a no-op and no logging facility is
    /// referenced in the generated output.
    pub logging: bool,

    /// Lower panic payloads to the display sink.
    pub printing: bool,

    /// Emit the heap-release hook in the panic routine.
    pub heap_allocator: bool,

    /// Semantic errors are recorded up to this cap; further errors are
    /// counted but not reported individually.
    pub max_errors: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            logging: true,
            printing: true,
            heap_allocator: true,
            max_errors: 64,
        }
    }
}
