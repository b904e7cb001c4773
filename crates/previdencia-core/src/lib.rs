pub mod analysis;
pub mod benchmarks;
pub mod calendar;
pub mod error;
pub mod report;
pub mod series;
pub mod solver;
pub mod statement;
pub mod types;

pub use error::PrevidenciaError;
pub use types::*;

/// Standard result type for all previdência operations
pub type PrevidenciaResult<T> = Result<T, PrevidenciaError>;
