use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::book::SymbolBook;
use crate::engine::circuit_breaker::{CircuitBreaker, MarketStatus};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::matching;
use crate::engine::types::{
    BookSnapshot, Order, OrderId, OrderStatus, OrderVariant, Price, PriceBand, Quantity, Side,
    Trade,
};

/// Default reference value for the market index at session open.
pub const DEFAULT_REFERENCE_INDEX: f64 = 17_500.0;

/// The matching engine: symbol registry, global order index, admission
/// gating, and the four execution protocols.
///
/// Safe for concurrent callers. Operations on distinct symbols run in
/// parallel; operations on one symbol are serialised by that symbol's
/// reader-writer lock, which also fixes the per-symbol trade-log order.
#[derive(Debug)]
pub struct MatchingEngine {
    books: DashMap<String, Arc<SymbolBook>>,
    orders: DashMap<OrderId, Arc<Order>>,
    bands: DashMap<String, PriceBand>,
    trades: RwLock<Vec<Trade>>,
    breaker: RwLock<CircuitBreaker>,
    next_order_id: AtomicU64,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::with_reference_index(DEFAULT_REFERENCE_INDEX)
    }

    pub fn with_reference_index(reference_index: f64) -> Self {
        Self {
            books: DashMap::new(),
            orders: DashMap::new(),
            bands: DashMap::new(),
            trades: RwLock::new(Vec::new()),
            breaker: RwLock::new(CircuitBreaker::new(reference_index)),
            next_order_id: AtomicU64::new(1),
        }
    }

    /// Install or replace the price band for a symbol.
    pub fn set_price_band(&self, symbol: &str, reference_price: Price, band_pct: f64) {
        info!(symbol, reference_price, band_pct, "price band installed");
        self.bands
            .insert(symbol.to_string(), PriceBand::new(reference_price, band_pct));
    }

    /// Feed a new index value into the circuit breaker. Returns `true` iff a
    /// halt is newly triggered.
    pub fn update_index(&self, value: f64, now: DateTime<Utc>) -> bool {
        self.breaker.write().update(value, now)
    }

    pub fn market_status(&self) -> MarketStatus {
        self.breaker.read().status()
    }

    /// End of the current halt or pre-open window, if one is running.
    pub fn halt_ends(&self) -> Option<DateTime<Utc>> {
        self.breaker.read().halt_ends()
    }

    /// Place an order. Returns the allocated order id; the order's fate
    /// (fills, residual handling) is visible through the order itself, the
    /// book snapshot, and the trade log.
    pub fn place_order(
        &self,
        side: Side,
        variant: OrderVariant,
        price: Price,
        quantity: Quantity,
        symbol: &str,
    ) -> EngineResult<OrderId> {
        if quantity == 0 {
            return Err(EngineError::InvalidQuantity);
        }
        if price == 0 && variant != OrderVariant::Market {
            return Err(EngineError::InvalidPrice);
        }

        self.check_admission()?;
        if variant == OrderVariant::Limit {
            self.check_band(symbol, price)?;
        }

        let id = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        let order = Arc::new(Order::new(
            id,
            symbol.to_string(),
            side,
            variant,
            if variant == OrderVariant::Market { 0 } else { price },
            quantity,
        ));
        self.orders.insert(id, Arc::clone(&order));

        info!(
            id,
            symbol,
            %side,
            %variant,
            price,
            quantity,
            "order placed"
        );

        let book = self.symbol_book(symbol);
        let mut sides = book.write();
        let mut executed = Vec::new();

        match variant {
            OrderVariant::Limit => {
                sides.side_mut(side).enqueue(Arc::clone(&order));
                matching::run_matching_pass(&mut sides, &mut executed);
            }
            OrderVariant::Market => {
                matching::execute_sweep(&mut sides, &order, None, &mut executed);
                // A market order never rests: with zero fills there is nothing
                // left for it to do, so it terminates cancelled.
                if order.status() == OrderStatus::Active {
                    order.cancel();
                }
            }
            OrderVariant::Ioc => {
                matching::execute_sweep(&mut sides, &order, Some(price), &mut executed);
                if order.status() != OrderStatus::Filled {
                    debug!(id, residual = order.remaining_quantity(), "IOC residual cancelled");
                    order.cancel();
                }
            }
            OrderVariant::Fok => {
                if matching::feasible_quantity(&sides, &order) >= quantity {
                    matching::execute_sweep(&mut sides, &order, Some(price), &mut executed);
                } else {
                    debug!(id, quantity, "FOK not fully fillable, killed");
                    order.cancel();
                }
            }
        }

        // Appended while the symbol lock is held so the per-symbol log order
        // matches execution order.
        if !executed.is_empty() {
            self.trades.write().append(&mut executed);
        }

        Ok(id)
    }

    /// Cancel an order by id.
    ///
    /// The order is only marked; physical removal from its price level is
    /// lazy and happens when a later matching pass reaches it. Cancelling an
    /// already-cancelled order is a benign no-op.
    pub fn cancel_order(&self, id: OrderId) -> EngineResult<()> {
        let order = self
            .orders
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::UnknownOrder)?;

        let book = self.symbol_book(&order.symbol);
        let _sides = book.write();

        match order.status() {
            OrderStatus::Filled => Err(EngineError::OrderAlreadyFilled),
            OrderStatus::Cancelled => Ok(()),
            _ => {
                order.cancel();
                info!(id, symbol = %order.symbol, remaining = order.remaining_quantity(), "order cancelled");
                Ok(())
            }
        }
    }

    /// Read-only view of a symbol's resting book. Unknown symbols yield an
    /// empty snapshot.
    pub fn snapshot_book(&self, symbol: &str) -> BookSnapshot {
        match self.books.get(symbol) {
            Some(book) => book.snapshot(),
            None => BookSnapshot::empty(symbol.to_string()),
        }
    }

    /// All trades recorded for a symbol, in execution order.
    pub fn snapshot_trades(&self, symbol: &str) -> Vec<Trade> {
        self.trades
            .read()
            .iter()
            .filter(|trade| trade.symbol == symbol)
            .cloned()
            .collect()
    }

    /// Look up an order by id.
    pub fn order(&self, id: OrderId) -> Option<Arc<Order>> {
        self.orders.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn best_bid(&self, symbol: &str) -> Option<Price> {
        self.books.get(symbol).and_then(|book| book.best_bid())
    }

    pub fn best_ask(&self, symbol: &str) -> Option<Price> {
        self.books.get(symbol).and_then(|book| book.best_ask())
    }

    pub fn spread(&self, symbol: &str) -> Option<Price> {
        self.books.get(symbol).and_then(|book| book.spread())
    }

    /// Total number of orders ever accepted.
    pub fn total_orders(&self) -> usize {
        self.orders.len()
    }

    fn check_admission(&self) -> EngineResult<()> {
        match self.breaker.read().status() {
            MarketStatus::Normal => Ok(()),
            MarketStatus::PreOpen => Err(EngineError::PreOpenAuction),
            MarketStatus::Halted | MarketStatus::Closed => Err(EngineError::MarketHalted),
        }
    }

    fn check_band(&self, symbol: &str, price: Price) -> EngineResult<()> {
        if let Some(band) = self.bands.get(symbol) {
            if !band.contains(price) {
                let (lower, upper) = band.limits();
                warn!(symbol, price, lower, upper, "limit price outside band");
                return Err(EngineError::BandViolation);
            }
        }
        Ok(())
    }

    fn symbol_book(&self, symbol: &str) -> Arc<SymbolBook> {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(SymbolBook::new(symbol.to_string())))
            .clone()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
