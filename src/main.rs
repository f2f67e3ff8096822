//! Script-file driver for the matching engine.
//!
//! Reads whitespace-separated commands from the file named by the first CLI
//! argument (or stdin when no file is given) and translates them into engine
//! calls. Unknown or malformed commands produce a diagnostic and are skipped.

use std::env;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process::ExitCode;
use std::str::SplitWhitespace;

use chrono::Utc;
use tracing::error;

use matchbook::utils::time::format_timestamp;
use matchbook::utils::{format_price, price_to_ticks};
use matchbook::{
    EngineMetrics, MarketStatus, MatchingEngine, OrderVariant, RestingOrder, Side,
};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Place {
        side: Side,
        variant: OrderVariant,
        price: f64,
        quantity: u64,
        symbol: String,
    },
    Cancel {
        id: u64,
    },
    PrintOrderBook {
        symbol: String,
    },
    PrintTrades {
        symbol: String,
    },
    UpdateIndex {
        value: f64,
    },
    SetPriceBand {
        symbol: String,
        reference: f64,
        pct: f64,
    },
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
enum ParseError {
    UnknownCommand(String),
    InvalidSide(String),
    InvalidVariant(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownCommand(cmd) => write!(f, "Unknown command: {cmd}"),
            ParseError::InvalidSide(side) => write!(f, "Invalid order side: {side}"),
            ParseError::InvalidVariant(variant) => write!(f, "Invalid order variant: {variant}"),
            ParseError::MissingArgument(what) => write!(f, "Missing argument: {what}"),
            ParseError::InvalidNumber(token) => write!(f, "Invalid number: {token}"),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let engine = MatchingEngine::new();
    let metrics = EngineMetrics::new();

    // Default per-symbol price bands.
    engine.set_price_band("RELIANCE", price_to_ticks(2000.0), 5.0);
    engine.set_price_band("INFY", price_to_ticks(1500.0), 10.0);
    engine.set_price_band("TATASTEEL", price_to_ticks(800.0), 20.0);

    let reader: Box<dyn BufRead> = match env::args().nth(1) {
        Some(path) => match File::open(&path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(err) => {
                eprintln!("Failed to open command file {path}: {err}");
                return ExitCode::from(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(%err, "failed to read command input");
                break;
            }
        };

        match parse_command(&line) {
            Ok(Some(Command::Exit)) => break,
            Ok(Some(command)) => execute(&engine, &metrics, command),
            Ok(None) => {}
            Err(err) => eprintln!("{err}"),
        }
    }

    metrics.log_summary();
    ExitCode::SUCCESS
}

/// Parse one input line. Blank lines yield `Ok(None)`.
fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return Ok(None);
    };

    let command = match command {
        "exit" => Command::Exit,
        "place_order" => {
            let side = match next_token(&mut tokens, "SIDE")? {
                "BUY" => Side::Buy,
                "SELL" => Side::Sell,
                other => return Err(ParseError::InvalidSide(other.to_string())),
            };
            let variant = match next_token(&mut tokens, "VARIANT")? {
                "LIMIT" => OrderVariant::Limit,
                "MARKET" => OrderVariant::Market,
                "IOC" => OrderVariant::Ioc,
                "FOK" => OrderVariant::Fok,
                other => return Err(ParseError::InvalidVariant(other.to_string())),
            };
            // The PRICE token is required even for MARKET orders (by
            // convention 0.0), where it is ignored.
            let price = parse_number::<f64>(next_token(&mut tokens, "PRICE")?)?;
            let quantity = parse_number::<u64>(next_token(&mut tokens, "QTY")?)?;
            let symbol = next_token(&mut tokens, "SYMBOL")?.to_string();
            Command::Place {
                side,
                variant,
                price,
                quantity,
                symbol,
            }
        }
        "cancel_order" => Command::Cancel {
            id: parse_number::<u64>(next_token(&mut tokens, "ID")?)?,
        },
        "print_orderbook" => Command::PrintOrderBook {
            symbol: next_token(&mut tokens, "SYMBOL")?.to_string(),
        },
        "print_trades" => Command::PrintTrades {
            symbol: next_token(&mut tokens, "SYMBOL")?.to_string(),
        },
        "update_index" => Command::UpdateIndex {
            value: parse_number::<f64>(next_token(&mut tokens, "VALUE")?)?,
        },
        "set_price_band" => Command::SetPriceBand {
            symbol: next_token(&mut tokens, "SYMBOL")?.to_string(),
            reference: parse_number::<f64>(next_token(&mut tokens, "REF")?)?,
            pct: parse_number::<f64>(next_token(&mut tokens, "PCT")?)?,
        },
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    Ok(Some(command))
}

fn next_token<'a>(
    tokens: &mut SplitWhitespace<'a>,
    what: &'static str,
) -> Result<&'a str, ParseError> {
    tokens.next().ok_or(ParseError::MissingArgument(what))
}

fn parse_number<T: std::str::FromStr>(token: &str) -> Result<T, ParseError> {
    token
        .parse()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))
}

fn execute(engine: &MatchingEngine, metrics: &EngineMetrics, command: Command) {
    match command {
        Command::Place {
            side,
            variant,
            price,
            quantity,
            symbol,
        } => {
            let ticks = price_to_ticks(price);
            let result =
                metrics.time_place_order(|| engine.place_order(side, variant, ticks, quantity, &symbol));
            match result {
                Ok(id) => {
                    metrics.increment_orders_placed();
                    if variant == OrderVariant::Market {
                        println!("Order Placed: {side} {quantity} {symbol} at MARKET (ID: {id})");
                    } else {
                        println!(
                            "Order Placed: {side} {quantity} {symbol} at {} ({variant}, ID: {id})",
                            format_price(ticks)
                        );
                    }
                }
                Err(err) => {
                    metrics.increment_orders_rejected();
                    eprintln!("Order rejected: {err}");
                }
            }
        }
        Command::Cancel { id } => {
            match metrics.time_cancel_order(|| engine.cancel_order(id)) {
                Ok(()) => {
                    metrics.increment_orders_cancelled();
                    println!("Order cancelled: {id}");
                }
                Err(err) => eprintln!("Cancel failed for order {id}: {err}"),
            }
        }
        Command::PrintOrderBook { symbol } => print_order_book(engine, &symbol),
        Command::PrintTrades { symbol } => print_trades(engine, &symbol),
        Command::UpdateIndex { value } => {
            if engine.update_index(value, Utc::now()) {
                println!("MARKET CIRCUIT BREAKER TRIGGERED!");
                match engine.market_status() {
                    MarketStatus::Closed => {
                        println!("Trading halted for the remainder of the day.");
                    }
                    _ => {
                        if let Some(ends) = engine.halt_ends() {
                            println!("Trading halted until: {}", ends.format("%H:%M:%S"));
                        }
                    }
                }
            }
        }
        Command::SetPriceBand {
            symbol,
            reference,
            pct,
        } => {
            engine.set_price_band(&symbol, price_to_ticks(reference), pct);
            println!("Price band set for {symbol}: {reference:.2} +/- {pct}%");
        }
        Command::Exit => {}
    }
}

fn print_order_book(engine: &MatchingEngine, symbol: &str) {
    let snapshot = engine.snapshot_book(symbol);

    println!("\nOrder Book for {symbol}:");
    println!("-------------------");

    println!("Buy Orders (highest first):");
    for order in &snapshot.bids {
        print_resting_order(order);
    }

    println!("\nSell Orders (lowest first):");
    for order in &snapshot.asks {
        print_resting_order(order);
    }
}

fn print_resting_order(order: &RestingOrder) {
    println!(
        "Price: {}, Qty: {}, ID: {}, Type: {}, Status: {}, Time: {}",
        format_price(order.price),
        order.remaining_quantity,
        order.id,
        order.variant,
        order.status,
        format_timestamp(&order.submitted_at)
    );
}

fn print_trades(engine: &MatchingEngine, symbol: &str) {
    println!("\nTrade History for {symbol}:");
    println!("------------------------");

    for trade in engine.snapshot_trades(symbol) {
        println!(
            "Time: {}, Qty: {}, Price: {}, Buy ID: {}, Sell ID: {}",
            format_timestamp(&trade.timestamp),
            trade.quantity,
            format_price(trade.price),
            trade.buy_order_id,
            trade.sell_order_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place_order() {
        let command = parse_command("place_order BUY LIMIT 100.50 10 AAPL")
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::Place {
                side: Side::Buy,
                variant: OrderVariant::Limit,
                price: 100.50,
                quantity: 10,
                symbol: "AAPL".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_market_order_requires_price_token() {
        let command = parse_command("place_order SELL MARKET 0.0 7 MSFT")
            .unwrap()
            .unwrap();
        assert!(matches!(
            command,
            Command::Place {
                variant: OrderVariant::Market,
                quantity: 7,
                ..
            }
        ));

        assert_eq!(
            parse_command("place_order SELL MARKET"),
            Err(ParseError::MissingArgument("PRICE"))
        );
    }

    #[test]
    fn test_parse_invalid_variant() {
        assert_eq!(
            parse_command("place_order BUY STOP 100.0 10 AAPL"),
            Err(ParseError::InvalidVariant("STOP".to_string()))
        );
    }

    #[test]
    fn test_parse_invalid_side() {
        assert_eq!(
            parse_command("place_order HOLD LIMIT 100.0 10 AAPL"),
            Err(ParseError::InvalidSide("HOLD".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(
            parse_command("modify_order 1"),
            Err(ParseError::UnknownCommand("modify_order".to_string()))
        );
    }

    #[test]
    fn test_parse_blank_line_is_skipped() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("exit").unwrap().unwrap(), Command::Exit);
        assert_eq!(
            parse_command("cancel_order 17").unwrap().unwrap(),
            Command::Cancel { id: 17 }
        );
        assert_eq!(
            parse_command("update_index 15400.0").unwrap().unwrap(),
            Command::UpdateIndex { value: 15400.0 }
        );
        assert_eq!(
            parse_command("print_orderbook AAPL").unwrap().unwrap(),
            Command::PrintOrderBook {
                symbol: "AAPL".to_string()
            }
        );
    }

    #[test]
    fn test_parse_set_price_band() {
        assert_eq!(
            parse_command("set_price_band RELIANCE 2000.0 5.0").unwrap().unwrap(),
            Command::SetPriceBand {
                symbol: "RELIANCE".to_string(),
                reference: 2000.0,
                pct: 5.0,
            }
        );
    }

    #[test]
    fn test_parse_invalid_number() {
        assert_eq!(
            parse_command("cancel_order abc"),
            Err(ParseError::InvalidNumber("abc".to_string()))
        );
    }
}
