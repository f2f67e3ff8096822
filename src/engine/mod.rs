//! Core matching engine module
//!
//! Per-symbol limit order books, the four order-variant execution protocols,
//! admission gating through the market-wide circuit breaker and per-symbol
//! price bands, and the append-only trade log.

pub mod book;
pub mod circuit_breaker;
pub mod engine;
pub mod error;
mod matching;
pub mod price_level;
pub mod side_book;
pub mod types;

// Re-export main types for convenience
pub use book::SymbolBook;
pub use circuit_breaker::{CircuitBreaker, CircuitLevel, MarketStatus};
pub use engine::{MatchingEngine, DEFAULT_REFERENCE_INDEX};
pub use error::{EngineError, EngineResult};
pub use price_level::PriceLevel;
pub use side_book::SideBook;
pub use types::{
    BookSnapshot, Order, OrderId, OrderStatus, OrderVariant, Price, PriceBand, Quantity,
    RestingOrder, Side, Trade,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // Test that all main types are accessible
        let _engine = MatchingEngine::new();
        let _book = SymbolBook::new("TEST".to_string());
        let _error = EngineError::UnknownOrder;
        let _status = MarketStatus::Normal;
    }
}
