pub mod error;
pub mod inputs;
pub mod time_value;
pub mod types;

#[cfg(feature = "valuation")]
pub mod export;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "financials")]
pub mod financials;

pub use error::IntrinsicError;
pub use inputs::ValuationInputs;
pub use types::*;

/// Standard result type for all valuation operations
pub type IntrinsicResult<T> = Result<T, IntrinsicError>;
