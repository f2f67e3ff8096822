//! Equity Order-Matching Engine with Circuit Breakers
//!
//! A multi-symbol order-matching engine for equity markets with market-wide
//! circuit breakers and per-symbol price bands.
//!
//! # Features
//!
//! - **Price-Time Priority**: strict FIFO ordering within price levels
//! - **Four Order Variants**: LIMIT, MARKET, IOC, and FOK execution protocols
//! - **Circuit Breakers**: index-driven L1/L2/L3 halts with time-of-day
//!   durations and a pre-open auction window
//! - **Price Bands**: per-symbol limit-price admission ranges
//! - **Thread Safe**: per-symbol reader-writer locks let distinct symbols
//!   trade in parallel while snapshot readers run concurrently
//!
//! # Quick Start
//!
//! ```rust
//! use matchbook::{MatchingEngine, OrderVariant, Side};
//!
//! let engine = MatchingEngine::new();
//!
//! // Rest a bid, then cross it with an incoming ask
//! engine.place_order(Side::Buy, OrderVariant::Limit, 10050, 10, "AAPL")?;
//! engine.place_order(Side::Sell, OrderVariant::Limit, 10000, 8, "AAPL")?;
//!
//! let trades = engine.snapshot_trades("AAPL");
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].quantity, 8);
//! # Ok::<(), matchbook::EngineError>(())
//! ```
//!
//! # Architecture
//!
//! Each symbol owns a pair of side books behind one reader-writer lock:
//!
//! 1. **Side books**: `BTreeMap<Price, PriceLevel>` per side, best price at
//!    the map's buy-descending / sell-ascending end
//! 2. **Price levels**: FIFO queues of shared order handles; the engine's id
//!    map holds the authoritative reference and cancellation is lazy
//!
//! Admission consults the circuit breaker and the symbol's price band before
//! an order id is ever allocated, so rejections commit no state.

pub mod engine;
pub mod metrics;
pub mod utils;

// Re-export commonly used types
pub use engine::{
    BookSnapshot, CircuitLevel, EngineError, EngineResult, MarketStatus, MatchingEngine, Order,
    OrderId, OrderStatus, OrderVariant, Price, PriceBand, Quantity, RestingOrder, Side, Trade,
    DEFAULT_REFERENCE_INDEX,
};

pub use metrics::EngineMetrics;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_basic_trading_workflow() {
        let engine = MatchingEngine::new();

        // Add liquidity
        engine
            .place_order(Side::Sell, OrderVariant::Limit, 10000, 100, "TEST")
            .unwrap();

        // Match with a market order
        let id = engine
            .place_order(Side::Buy, OrderVariant::Market, 0, 50, "TEST")
            .unwrap();

        let trades = engine.snapshot_trades("TEST");
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 10000);
        assert_eq!(trades[0].quantity, 50);
        assert_eq!(engine.order(id).unwrap().status(), OrderStatus::Filled);
    }

    #[test]
    fn test_concurrent_trading_across_symbols() {
        let engine = Arc::new(MatchingEngine::new());
        let symbols = ["AAPL", "MSFT", "GOOG", "AMZN"];
        let mut handles = vec![];

        for symbol in symbols {
            let engine = Arc::clone(&engine);
            let handle = thread::spawn(move || {
                for i in 0..100u64 {
                    engine
                        .place_order(Side::Buy, OrderVariant::Limit, 10000 + i, 100, symbol)
                        .unwrap();
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Every order was accepted and rests on its own book.
        assert_eq!(engine.total_orders(), 400);
        for symbol in symbols {
            assert_eq!(engine.snapshot_book(symbol).bids.len(), 100);
            assert_eq!(engine.best_bid(symbol), Some(10099));
        }
    }
}
