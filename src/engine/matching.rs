//! Matching algorithms for the four order variants.
//!
//! Every function here operates on a symbol's [`BookSides`] that the caller
//! already holds under the exclusive lock; trades are collected into the
//! caller's buffer and appended to the engine's log before the lock drops.

use std::cmp::min;
use tracing::debug;

use crate::engine::book::BookSides;
use crate::engine::types::{Order, Price, Quantity, Side, Trade};

/// Cross the best bid and ask levels until the book is no longer crossed.
///
/// Heads in a terminal status (cancelled, or filled and not yet pruned) are
/// popped lazily; empty levels are dropped. The execution price is the
/// sell-side head's limit price: the incoming order produced the crossing,
/// so the resting sell is the maker whose price binds.
pub(crate) fn run_matching_pass(sides: &mut BookSides, trades: &mut Vec<Trade>) {
    loop {
        let (Some(bid_price), Some(ask_price)) =
            (sides.bids.best_price(), sides.asks.best_price())
        else {
            break;
        };

        if bid_price < ask_price {
            break;
        }

        let buy_head = sides
            .bids
            .level_mut(bid_price)
            .and_then(|level| level.front().cloned());
        let Some(buy) = buy_head else {
            sides.bids.remove_if_empty(bid_price);
            continue;
        };

        let sell_head = sides
            .asks
            .level_mut(ask_price)
            .and_then(|level| level.front().cloned());
        let Some(sell) = sell_head else {
            sides.asks.remove_if_empty(ask_price);
            continue;
        };

        // Prune terminal heads before attempting a cross.
        if buy.is_terminal() || sell.is_terminal() {
            if buy.is_terminal() {
                if let Some(level) = sides.bids.level_mut(bid_price) {
                    level.pop_front();
                }
                sides.bids.remove_if_empty(bid_price);
            }
            if sell.is_terminal() {
                if let Some(level) = sides.asks.level_mut(ask_price) {
                    level.pop_front();
                }
                sides.asks.remove_if_empty(ask_price);
            }
            continue;
        }

        let quantity = min(buy.remaining_quantity(), sell.remaining_quantity());
        let price = sell.price;

        buy.fill(quantity).expect("fill should succeed");
        sell.fill(quantity).expect("fill should succeed");

        debug!(
            symbol = %sell.symbol,
            price,
            quantity,
            buy_id = buy.id,
            sell_id = sell.id,
            "trade executed"
        );
        trades.push(Trade::new(
            sell.symbol.clone(),
            buy.id,
            sell.id,
            price,
            quantity,
        ));

        if buy.is_terminal() {
            if let Some(level) = sides.bids.level_mut(bid_price) {
                level.pop_front();
            }
            sides.bids.remove_if_empty(bid_price);
        }
        if sell.is_terminal() {
            if let Some(level) = sides.asks.level_mut(ask_price) {
                level.pop_front();
            }
            sides.asks.remove_if_empty(ask_price);
        }
    }
}

/// Consume opposite-side liquidity best-to-worst for a MARKET, IOC, or FOK
/// order. `limit = None` sweeps without a price bound (MARKET).
///
/// Each fill executes at the resting maker's limit price. Cancelled heads
/// are popped and skipped. The incoming order is never enqueued.
pub(crate) fn execute_sweep(
    sides: &mut BookSides,
    order: &Order,
    limit: Option<Price>,
    trades: &mut Vec<Trade>,
) {
    let side = order.side;
    let book = sides.opposite_mut(side);

    for level_price in book.prices_best_first() {
        if order.remaining_quantity() == 0 {
            break;
        }

        if let Some(limit) = limit {
            let marketable = match side {
                Side::Buy => level_price <= limit,
                Side::Sell => level_price >= limit,
            };
            if !marketable {
                break;
            }
        }

        let Some(level) = book.level_mut(level_price) else {
            continue;
        };

        while order.remaining_quantity() > 0 {
            let Some(maker) = level.front().cloned() else {
                break;
            };
            if maker.is_terminal() {
                level.pop_front();
                continue;
            }

            let quantity = min(order.remaining_quantity(), maker.remaining_quantity());
            order.fill(quantity).expect("fill should succeed");
            maker.fill(quantity).expect("fill should succeed");

            let (buy_id, sell_id) = match side {
                Side::Buy => (order.id, maker.id),
                Side::Sell => (maker.id, order.id),
            };
            debug!(
                symbol = %order.symbol,
                price = level_price,
                quantity,
                buy_id,
                sell_id,
                variant = %order.variant,
                "trade executed"
            );
            trades.push(Trade::new(
                order.symbol.clone(),
                buy_id,
                sell_id,
                level_price,
                quantity,
            ));

            if maker.is_terminal() {
                level.pop_front();
            }
        }

        book.remove_if_empty(level_price);
    }
}

/// Liquidity available to `order` across marketable opposite-side levels.
///
/// The FOK feasibility scan: sums remaining quantity of non-terminal resting
/// orders best-to-worst, stopping early once the order's quantity is covered
/// or the next level is no longer marketable.
pub(crate) fn feasible_quantity(sides: &BookSides, order: &Order) -> Quantity {
    let book = sides.opposite(order.side);
    let mut available = 0;

    for level_price in book.prices_best_first() {
        let marketable = match order.side {
            Side::Buy => level_price <= order.price,
            Side::Sell => level_price >= order.price,
        };
        if !marketable {
            break;
        }

        if let Some(level) = book.level(level_price) {
            available += level.available_quantity();
        }
        if available >= order.quantity {
            break;
        }
    }

    available
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{OrderStatus, OrderVariant};
    use std::sync::Arc;

    fn limit_order(id: u64, side: Side, price: Price, quantity: Quantity) -> Arc<Order> {
        Arc::new(Order::new(
            id,
            "TEST".to_string(),
            side,
            OrderVariant::Limit,
            price,
            quantity,
        ))
    }

    fn rest(sides: &mut BookSides, order: &Arc<Order>) {
        sides.side_mut(order.side).enqueue(Arc::clone(order));
    }

    #[test]
    fn test_pass_leaves_uncrossed_book_alone() {
        let mut sides = BookSides::new();
        rest(&mut sides, &limit_order(1, Side::Buy, 10000, 100));
        rest(&mut sides, &limit_order(2, Side::Sell, 10100, 100));

        let mut trades = Vec::new();
        run_matching_pass(&mut sides, &mut trades);

        assert!(trades.is_empty());
        assert_eq!(sides.bids.best_price(), Some(10000));
        assert_eq!(sides.asks.best_price(), Some(10100));
    }

    #[test]
    fn test_pass_executes_at_sell_side_price() {
        let mut sides = BookSides::new();
        let bid = limit_order(1, Side::Buy, 10100, 5);
        let ask = limit_order(2, Side::Sell, 10000, 8);
        rest(&mut sides, &bid);
        rest(&mut sides, &ask);

        let mut trades = Vec::new();
        run_matching_pass(&mut sides, &mut trades);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 10000);
        assert_eq!(trades[0].quantity, 5);
        assert_eq!(trades[0].buy_order_id, 1);
        assert_eq!(trades[0].sell_order_id, 2);

        assert_eq!(bid.status(), OrderStatus::Filled);
        assert_eq!(ask.status(), OrderStatus::PartiallyFilled);
        assert_eq!(ask.remaining_quantity(), 3);

        // Filled bid was pruned with its level; the ask residual rests.
        assert_eq!(sides.bids.best_price(), None);
        assert_eq!(sides.asks.best_price(), Some(10000));
    }

    #[test]
    fn test_pass_walks_bid_levels_in_priority_order() {
        let mut sides = BookSides::new();
        rest(&mut sides, &limit_order(1, Side::Buy, 10050, 10));
        rest(&mut sides, &limit_order(2, Side::Buy, 10100, 5));
        let ask = limit_order(3, Side::Sell, 10000, 8);
        rest(&mut sides, &ask);

        let mut trades = Vec::new();
        run_matching_pass(&mut sides, &mut trades);

        // Best bid (10100) first, then the 10050 level, both at the ask price.
        assert_eq!(trades.len(), 2);
        assert_eq!((trades[0].buy_order_id, trades[0].quantity, trades[0].price), (2, 5, 10000));
        assert_eq!((trades[1].buy_order_id, trades[1].quantity, trades[1].price), (1, 3, 10000));

        assert_eq!(ask.status(), OrderStatus::Filled);
        assert_eq!(sides.asks.best_price(), None);
        assert_eq!(sides.bids.best_price(), Some(10050));
    }

    #[test]
    fn test_pass_respects_time_priority_within_level() {
        let mut sides = BookSides::new();
        let first = limit_order(1, Side::Buy, 10000, 100);
        let second = limit_order(2, Side::Buy, 10000, 200);
        rest(&mut sides, &first);
        rest(&mut sides, &second);
        rest(&mut sides, &limit_order(3, Side::Sell, 10000, 150));

        let mut trades = Vec::new();
        run_matching_pass(&mut sides, &mut trades);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].buy_order_id, 1);
        assert_eq!(trades[0].quantity, 100);
        assert_eq!(trades[1].buy_order_id, 2);
        assert_eq!(trades[1].quantity, 50);

        assert_eq!(first.status(), OrderStatus::Filled);
        assert_eq!(second.status(), OrderStatus::PartiallyFilled);
        assert_eq!(second.remaining_quantity(), 150);
    }

    #[test]
    fn test_pass_prunes_cancelled_head_without_filling_it() {
        let mut sides = BookSides::new();
        let cancelled = limit_order(1, Side::Buy, 10000, 100);
        let live = limit_order(2, Side::Buy, 10000, 100);
        cancelled.cancel();
        rest(&mut sides, &cancelled);
        rest(&mut sides, &live);
        rest(&mut sides, &limit_order(3, Side::Sell, 10000, 60));

        let mut trades = Vec::new();
        run_matching_pass(&mut sides, &mut trades);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buy_order_id, 2);
        assert_eq!(cancelled.filled_quantity(), 0);
        assert_eq!(live.filled_quantity(), 60);
    }

    #[test]
    fn test_pass_never_terminates_crossed() {
        let mut sides = BookSides::new();
        rest(&mut sides, &limit_order(1, Side::Buy, 10200, 10));
        rest(&mut sides, &limit_order(2, Side::Sell, 10000, 4));
        rest(&mut sides, &limit_order(3, Side::Sell, 10100, 4));

        let mut trades = Vec::new();
        run_matching_pass(&mut sides, &mut trades);

        assert_eq!(trades.len(), 2);
        if let (Some(bid), Some(ask)) = (sides.bids.best_price(), sides.asks.best_price()) {
            assert!(bid < ask);
        }
    }

    #[test]
    fn test_sweep_walks_levels_best_first() {
        let mut sides = BookSides::new();
        rest(&mut sides, &limit_order(1, Side::Sell, 2550, 5));
        rest(&mut sides, &limit_order(2, Side::Sell, 2600, 10));

        let market = Order::new(3, "TEST".to_string(), Side::Buy, OrderVariant::Market, 0, 7);
        let mut trades = Vec::new();
        execute_sweep(&mut sides, &market, None, &mut trades);

        assert_eq!(trades.len(), 2);
        assert_eq!((trades[0].price, trades[0].quantity), (2550, 5));
        assert_eq!((trades[1].price, trades[1].quantity), (2600, 2));
        assert_eq!(market.filled_quantity(), 7);
        assert_eq!(market.status(), OrderStatus::Filled);

        // The partially consumed 2600 level remains.
        assert_eq!(sides.asks.best_price(), Some(2600));
    }

    #[test]
    fn test_sweep_stops_at_limit() {
        let mut sides = BookSides::new();
        let bid = limit_order(1, Side::Buy, 5000, 5);
        rest(&mut sides, &bid);
        rest(&mut sides, &limit_order(2, Side::Buy, 4900, 10));

        let ioc = Order::new(3, "TEST".to_string(), Side::Sell, OrderVariant::Ioc, 5000, 7);
        let mut trades = Vec::new();
        execute_sweep(&mut sides, &ioc, Some(ioc.price), &mut trades);

        // Only the marketable 5000 level trades; 4900 is below the limit.
        assert_eq!(trades.len(), 1);
        assert_eq!((trades[0].price, trades[0].quantity), (5000, 5));
        assert_eq!(ioc.filled_quantity(), 5);
        assert_eq!(bid.status(), OrderStatus::Filled);
        assert_eq!(sides.bids.best_price(), Some(4900));
    }

    #[test]
    fn test_sweep_skips_cancelled_makers() {
        let mut sides = BookSides::new();
        let cancelled = limit_order(1, Side::Sell, 2550, 5);
        cancelled.cancel();
        rest(&mut sides, &cancelled);
        rest(&mut sides, &limit_order(2, Side::Sell, 2550, 5));

        let market = Order::new(3, "TEST".to_string(), Side::Buy, OrderVariant::Market, 0, 5);
        let mut trades = Vec::new();
        execute_sweep(&mut sides, &market, None, &mut trades);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].sell_order_id, 2);
        assert_eq!(cancelled.filled_quantity(), 0);
        // Both the cancelled and filled makers were drained, level pruned.
        assert_eq!(sides.asks.best_price(), None);
    }

    #[test]
    fn test_feasible_quantity_bounded_by_limit() {
        let mut sides = BookSides::new();
        rest(&mut sides, &limit_order(1, Side::Sell, 15100, 5));
        rest(&mut sides, &limit_order(2, Side::Sell, 15200, 5));

        let fok = Order::new(3, "TEST".to_string(), Side::Buy, OrderVariant::Fok, 15100, 10);
        assert_eq!(feasible_quantity(&sides, &fok), 5);

        let deep = Order::new(4, "TEST".to_string(), Side::Buy, OrderVariant::Fok, 15200, 10);
        assert_eq!(feasible_quantity(&sides, &deep), 10);
    }

    #[test]
    fn test_feasible_quantity_ignores_cancelled() {
        let mut sides = BookSides::new();
        let cancelled = limit_order(1, Side::Sell, 15100, 50);
        cancelled.cancel();
        rest(&mut sides, &cancelled);
        rest(&mut sides, &limit_order(2, Side::Sell, 15100, 5));

        let fok = Order::new(3, "TEST".to_string(), Side::Buy, OrderVariant::Fok, 15100, 10);
        assert_eq!(feasible_quantity(&sides, &fok), 5);
    }
}
