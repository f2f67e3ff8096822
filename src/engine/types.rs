use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use uuid::Uuid;

pub type OrderId = u64;
pub type Price = u64; // Price in ticks (1 tick = 0.01 currency units)
pub type Quantity = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderVariant {
    Limit,
    Market,
    Ioc, // Immediate-or-Cancel
    Fok, // Fill-or-Kill
}

impl fmt::Display for OrderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderVariant::Limit => write!(f, "LIMIT"),
            OrderVariant::Market => write!(f, "MARKET"),
            OrderVariant::Ioc => write!(f, "IOC"),
            OrderVariant::Fok => write!(f, "FOK"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    Active = 0,
    PartiallyFilled = 1,
    Filled = 2,
    Cancelled = 3,
}

impl OrderStatus {
    fn from_u8(raw: u8) -> OrderStatus {
        match raw {
            0 => OrderStatus::Active,
            1 => OrderStatus::PartiallyFilled,
            2 => OrderStatus::Filled,
            _ => OrderStatus::Cancelled,
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    /// Open orders are the ones visible in a resting book snapshot.
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Active | OrderStatus::PartiallyFilled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Active => write!(f, "ACTIVE"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A single order.
///
/// The authoritative home of an order is the engine's id map; price-level
/// queues hold additional `Arc` handles to the same allocation. `filled` and
/// `status` are atomics so those shared handles stay usable, but every
/// mutation happens under the owning symbol's exclusive lock.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub variant: OrderVariant,
    pub price: Price,
    pub quantity: Quantity,
    filled: AtomicU64,
    status: AtomicU8,
    pub submitted_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        symbol: String,
        side: Side,
        variant: OrderVariant,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            symbol,
            side,
            variant,
            price,
            quantity,
            filled: AtomicU64::new(0),
            status: AtomicU8::new(OrderStatus::Active as u8),
            submitted_at: Utc::now(),
        }
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.filled.load(Ordering::Relaxed)
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity()
    }

    pub fn status(&self) -> OrderStatus {
        OrderStatus::from_u8(self.status.load(Ordering::Relaxed))
    }

    /// Record a fill and recompute the status.
    ///
    /// Callers hold the symbol's exclusive lock and have already clamped the
    /// quantity to `remaining_quantity`, so an overfill is a broken invariant.
    pub fn fill(&self, quantity: Quantity) -> Result<(), &'static str> {
        let filled = self.filled.load(Ordering::Relaxed);
        if quantity > self.quantity - filled {
            return Err("cannot fill more than remaining quantity");
        }

        let filled = filled + quantity;
        self.filled.store(filled, Ordering::Relaxed);
        self.set_status(if filled == self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        });

        Ok(())
    }

    pub fn cancel(&self) {
        self.set_status(OrderStatus::Cancelled);
    }

    fn set_status(&self, status: OrderStatus) {
        self.status.store(status as u8, Ordering::Relaxed);
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Read-only view of this order for book snapshots.
    pub fn resting_view(&self) -> RestingOrder {
        RestingOrder {
            price: self.price,
            remaining_quantity: self.remaining_quantity(),
            id: self.id,
            variant: self.variant,
            status: self.status(),
            submitted_at: self.submitted_at,
        }
    }
}

/// An executed trade. Immutable once appended to the trade log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub symbol: String,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    pub fn new(
        symbol: String,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }
}

/// Per-symbol allowable limit-price range relative to a reference price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBand {
    pub reference_price: Price,
    pub band_pct: f64,
}

impl PriceBand {
    pub fn new(reference_price: Price, band_pct: f64) -> Self {
        Self {
            reference_price,
            band_pct,
        }
    }

    /// Lower and upper band limits in ticks.
    pub fn limits(&self) -> (f64, f64) {
        let reference = self.reference_price as f64;
        (
            reference * (1.0 - self.band_pct / 100.0),
            reference * (1.0 + self.band_pct / 100.0),
        )
    }

    pub fn contains(&self, price: Price) -> bool {
        let (lower, upper) = self.limits();
        let price = price as f64;
        price >= lower && price <= upper
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub bids: Vec<RestingOrder>,
    pub asks: Vec<RestingOrder>,
}

impl BookSnapshot {
    pub fn empty(symbol: String) -> Self {
        Self {
            symbol,
            timestamp: Utc::now(),
            bids: Vec::new(),
            asks: Vec::new(),
        }
    }
}

/// One resting order as seen by `snapshot_book`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestingOrder {
    pub price: Price,
    pub remaining_quantity: Quantity,
    pub id: OrderId,
    pub variant: OrderVariant,
    pub status: OrderStatus,
    pub submitted_at: DateTime<Utc>,
}
