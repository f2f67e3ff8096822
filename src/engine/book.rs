use chrono::Utc;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::engine::side_book::SideBook;
use crate::engine::types::{BookSnapshot, Price, Side};

/// Both sides of one symbol's book. Always accessed through the owning
/// [`SymbolBook`] lock.
#[derive(Debug)]
pub struct BookSides {
    pub bids: SideBook,
    pub asks: SideBook,
}

impl BookSides {
    pub(crate) fn new() -> Self {
        Self {
            bids: SideBook::new(Side::Buy),
            asks: SideBook::new(Side::Sell),
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    pub fn opposite_mut(&mut self, side: Side) -> &mut SideBook {
        self.side_mut(side.opposite())
    }

    pub fn opposite(&self, side: Side) -> &SideBook {
        match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        }
    }
}

/// The pair of side books for one symbol behind a reader-writer lock.
///
/// Writers (placement, matching, cancellation) take the exclusive lock;
/// snapshot readers share it. Entries are created on first reference and
/// persist for the life of the engine.
#[derive(Debug)]
pub struct SymbolBook {
    pub symbol: String,
    sides: RwLock<BookSides>,
}

impl SymbolBook {
    pub fn new(symbol: String) -> Self {
        info!(%symbol, "creating order book");
        Self {
            symbol,
            sides: RwLock::new(BookSides::new()),
        }
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, BookSides> {
        self.sides.write()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, BookSides> {
        self.sides.read()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.sides.read().bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.sides.read().asks.best_price()
    }

    pub fn spread(&self) -> Option<Price> {
        let sides = self.sides.read();
        match (sides.asks.best_price(), sides.bids.best_price()) {
            (Some(ask), Some(bid)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Read-only view of the open resting orders on both sides: bids in
    /// descending price order, asks ascending, FIFO within a level.
    pub fn snapshot(&self) -> BookSnapshot {
        let sides = self.sides.read();
        BookSnapshot {
            symbol: self.symbol.clone(),
            timestamp: Utc::now(),
            bids: sides.bids.resting_orders(),
            asks: sides.asks.resting_orders(),
        }
    }
}
