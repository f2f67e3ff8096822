use crate::engine::price_level::PriceLevel;
use crate::engine::types::{Order, Price, RestingOrder, Side};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One side of a symbol's book: an ordered map from price to level.
///
/// The best price is the highest key on the buy side and the lowest key on
/// the sell side; all walks run best-to-worst in that side's ordering.
#[derive(Debug)]
pub struct SideBook {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl SideBook {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Enqueue a resting order at the back of its price level, creating the
    /// level if needed.
    pub fn enqueue(&mut self, order: Arc<Order>) {
        let price = order.price;
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .enqueue(order);
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Drop the level at `price` if it holds no orders.
    pub fn remove_if_empty(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(|level| level.is_empty()) {
            self.levels.remove(&price);
        }
    }

    /// Price keys in best-to-worst order for this side.
    pub fn prices_best_first(&self) -> Vec<Price> {
        match self.side {
            Side::Buy => self.levels.keys().rev().copied().collect(),
            Side::Sell => self.levels.keys().copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Open resting orders, best price first, FIFO within each level.
    pub fn resting_orders(&self) -> Vec<RestingOrder> {
        let mut out = Vec::new();
        let levels: Box<dyn Iterator<Item = &PriceLevel> + '_> = match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        };

        for level in levels {
            for order in level.iter() {
                if order.status().is_open() {
                    out.push(order.resting_view());
                }
            }
        }

        out
    }
}
