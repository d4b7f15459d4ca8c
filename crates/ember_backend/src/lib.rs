mod codegen;

#[cfg(test)]
mod tests;

pub use codegen::generate;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;
