pub mod time;

/// Tick size used to convert between decimal text prices and engine ticks.
pub const TICK_SIZE: f64 = 0.01;

/// Convert ticks to a human-readable dollar price
pub fn format_price(price_ticks: u64) -> String {
    format!("${:.2}", price_ticks as f64 * TICK_SIZE)
}

/// Convert a decimal price to ticks
pub fn price_to_ticks(price: f64) -> u64 {
    (price / TICK_SIZE).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(10000), "$100.00");
        assert_eq!(format_price(12550), "$125.50");
        assert_eq!(format_price(99), "$0.99");
    }

    #[test]
    fn test_price_to_ticks() {
        assert_eq!(price_to_ticks(100.0), 10000);
        assert_eq!(price_to_ticks(125.50), 12550);
        assert_eq!(price_to_ticks(0.0), 0);
    }
}
