use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineError {
    /// Admission rejected: circuit breaker is in HALTED or CLOSED
    MarketHalted,

    /// Admission rejected: circuit breaker is in the pre-open auction window
    PreOpenAuction,

    /// Limit price outside the symbol's allowed price band
    BandViolation,

    /// Cancel target not present in the order index
    UnknownOrder,

    /// Cancel target has already been completely filled
    OrderAlreadyFilled,

    /// Invalid quantity (zero)
    InvalidQuantity,

    /// Invalid price (zero on a priced order variant)
    InvalidPrice,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MarketHalted => {
                write!(f, "Market is currently halted due to circuit breaker")
            }
            EngineError::PreOpenAuction => {
                write!(f, "Market is in the pre-open auction window")
            }
            EngineError::BandViolation => {
                write!(f, "Price is outside the allowed band for this symbol")
            }
            EngineError::UnknownOrder => write!(f, "Order not found"),
            EngineError::OrderAlreadyFilled => write!(f, "Cannot cancel a filled order"),
            EngineError::InvalidQuantity => write!(f, "Invalid quantity"),
            EngineError::InvalidPrice => write!(f, "Invalid price"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
