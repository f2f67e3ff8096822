use crate::engine::types::{Order, Price, Quantity};
use std::collections::VecDeque;
use std::sync::Arc;

/// All resting orders at one price on one side of the book.
///
/// Orders are matched FIFO: enqueue at the back, consume from the front. The
/// queue holds shared handles; the engine's id map owns the authoritative
/// reference. Mutation is serialised by the symbol's exclusive lock, so no
/// interior locking is needed here.
#[derive(Debug)]
pub struct PriceLevel {
    pub price: Price,
    orders: VecDeque<Arc<Order>>,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
        }
    }

    /// Append an order, preserving time priority.
    pub fn enqueue(&mut self, order: Arc<Order>) {
        self.orders.push_back(order);
    }

    pub fn front(&self) -> Option<&Arc<Order>> {
        self.orders.front()
    }

    pub fn pop_front(&mut self) -> Option<Arc<Order>> {
        self.orders.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Total remaining quantity of non-terminal orders at this level.
    ///
    /// Cancelled orders may linger in the queue until a matching pass prunes
    /// them, so they must not count towards available liquidity.
    pub fn available_quantity(&self) -> Quantity {
        self.orders
            .iter()
            .filter(|order| !order.is_terminal())
            .map(|order| order.remaining_quantity())
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Order>> {
        self.orders.iter()
    }
}
