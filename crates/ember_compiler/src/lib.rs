mod compiler;

pub use compiler::{compile, Artifact, CompilerError, CompilerResult};
