use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::utils::time::minutes_since_open;

/// Market-wide trading state driven by the reference index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    Normal,
    Halted,
    PreOpen,
    Closed,
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketStatus::Normal => write!(f, "NORMAL"),
            MarketStatus::Halted => write!(f, "HALTED"),
            MarketStatus::PreOpen => write!(f, "PRE_OPEN"),
            MarketStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitLevel {
    None,
    L1,
    L2,
    L3,
}

impl fmt::Display for CircuitLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitLevel::None => write!(f, "NONE"),
            CircuitLevel::L1 => write!(f, "L1"),
            CircuitLevel::L2 => write!(f, "L2"),
            CircuitLevel::L3 => write!(f, "L3"),
        }
    }
}

/// Pre-open auction window length after every expired halt.
const PRE_OPEN_MINUTES: i64 = 15;

/// Market-wide circuit breaker.
///
/// Tracks the reference index against its session-open value and issues
/// halts at 10/15/20 percent drops, with halt durations keyed on minutes
/// since the 09:00 session open. Purely time-driven through explicit
/// `update` calls; it never spawns timers of its own.
#[derive(Debug)]
pub struct CircuitBreaker {
    reference_value: f64,
    current_value: f64,
    level: CircuitLevel,
    status: MarketStatus,
    halt_ends: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    pub fn new(reference_value: f64) -> Self {
        Self {
            reference_value,
            current_value: reference_value,
            level: CircuitLevel::None,
            status: MarketStatus::Normal,
            halt_ends: None,
        }
    }

    pub fn status(&self) -> MarketStatus {
        self.status
    }

    pub fn level(&self) -> CircuitLevel {
        self.level
    }

    pub fn reference_value(&self) -> f64 {
        self.reference_value
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    pub fn halt_ends(&self) -> Option<DateTime<Utc>> {
        self.halt_ends
    }

    /// Feed a new index value at `now`. Returns `true` iff a halt (or
    /// session close) is newly triggered by this update.
    pub fn update(&mut self, new_value: f64, now: DateTime<Utc>) -> bool {
        self.current_value = new_value;
        let percent_change = (new_value - self.reference_value) / self.reference_value * 100.0;

        match self.status {
            MarketStatus::Normal => {
                if percent_change <= -20.0 {
                    self.trigger(CircuitLevel::L3, now)
                } else if percent_change <= -15.0 {
                    self.trigger(CircuitLevel::L2, now)
                } else if percent_change <= -10.0 {
                    self.trigger(CircuitLevel::L1, now)
                } else {
                    false
                }
            }
            MarketStatus::Halted => {
                if self.halt_ends.is_some_and(|ends| now >= ends) {
                    self.status = MarketStatus::PreOpen;
                    self.halt_ends = Some(now + Duration::minutes(PRE_OPEN_MINUTES));
                    info!(level = %self.level, "halt expired, entering pre-open auction window");
                }
                false
            }
            MarketStatus::PreOpen => {
                if self.halt_ends.is_some_and(|ends| now >= ends) {
                    self.status = MarketStatus::Normal;
                    self.level = CircuitLevel::None;
                    self.halt_ends = None;
                    info!("pre-open window over, resuming normal trading");
                }
                false
            }
            // Terminal for the session.
            MarketStatus::Closed => false,
        }
    }

    fn trigger(&mut self, level: CircuitLevel, now: DateTime<Utc>) -> bool {
        let minutes = minutes_since_open(&now);

        let halt_minutes = match level {
            CircuitLevel::L1 => {
                if minutes < 240 {
                    Some(45)
                } else if minutes < 330 {
                    Some(15)
                } else {
                    // Late-session L1 drops do not halt trading.
                    info!(%level, minutes, "index drop past 14:30, no halt applied");
                    return false;
                }
            }
            CircuitLevel::L2 => {
                if minutes < 240 {
                    Some(105)
                } else if minutes < 300 {
                    Some(45)
                } else {
                    None
                }
            }
            CircuitLevel::L3 => None,
            CircuitLevel::None => unreachable!("trigger is only called with L1/L2/L3"),
        };

        self.level = level;
        match halt_minutes {
            Some(halt_minutes) => {
                self.status = MarketStatus::Halted;
                let ends = now + Duration::minutes(halt_minutes);
                self.halt_ends = Some(ends);
                warn!(
                    %level,
                    halt_minutes,
                    halt_ends = %ends.format("%H:%M:%S"),
                    "market circuit breaker triggered, trading halted"
                );
            }
            None => {
                self.status = MarketStatus::Closed;
                self.halt_ends = None;
                warn!(%level, "market circuit breaker triggered, trading closed for the session");
            }
        }

        true
    }
}
