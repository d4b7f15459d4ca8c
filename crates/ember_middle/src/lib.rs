mod error;
mod lower;

#[cfg(test)]
mod tests;

pub use error::SemanticError;
pub use lower::{lower, LowerOutput};
