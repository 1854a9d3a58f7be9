use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntrinsicError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    /// Perpetuity growth at or above the discount rate has no finite terminal value.
    #[error("Terminal value undefined: perpetual growth ({growth}) must be below WACC ({wacc})")]
    TerminalValueUndefined { wacc: Decimal, growth: Decimal },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    /// A result fell outside the representable decimal range.
    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl IntrinsicError {
    /// True when the error is the g >= WACC precondition rather than a hard failure.
    pub fn is_terminal_undefined(&self) -> bool {
        matches!(self, IntrinsicError::TerminalValueUndefined { .. })
    }
}

/// Lift a `checked_*` result into an `Overflow` error naming the quantity.
pub(crate) fn checked(value: Option<Decimal>, context: &str) -> Result<Decimal, IntrinsicError> {
    value.ok_or_else(|| IntrinsicError::Overflow {
        context: context.to_string(),
    })
}

impl From<serde_json::Error> for IntrinsicError {
    fn from(e: serde_json::Error) -> Self {
        IntrinsicError::SerializationError(e.to_string())
    }
}
