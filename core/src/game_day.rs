//! Game-day counter. Owns the in-fiction calendar position.
//!
//! The day never goes below zero. Every way of changing it clamps
//! rather than failing, so callers always get a usable value back.

use crate::types::{GameDay, DEFAULT_GAME_DAY};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameClock {
    pub current_day: GameDay,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(DEFAULT_GAME_DAY)
    }
}

impl GameClock {
    pub fn new(current_day: GameDay) -> Self {
        Self { current_day }
    }

    /// Advance one day. No upper bound beyond the integer width.
    pub fn advance(&mut self) -> GameDay {
        self.current_day = self.current_day.saturating_add(1);
        self.current_day
    }

    /// Step back one day. Returns None (and changes nothing) at day 0.
    pub fn rewind(&mut self) -> Option<GameDay> {
        if self.current_day == 0 {
            return None;
        }
        self.current_day -= 1;
        Some(self.current_day)
    }

    /// Set an explicit day; negatives clamp to 0.
    pub fn set(&mut self, value: i64) -> GameDay {
        self.current_day = value.max(0) as GameDay;
        self.current_day
    }

    /// Set from free-form text as typed into a day field.
    pub fn set_from_input(&mut self, input: &str) -> GameDay {
        self.current_day = parse_day_input(input);
        self.current_day
    }
}

/// Read the leading integer of `input`, the way a numeric text field is read.
///
/// `"42"` → 42, `" 7 days"` → 7, `"3.9"` → 3, `"-5"` → 0, `"abc"` → 0.
pub fn parse_day_input(input: &str) -> GameDay {
    parse_leading_int(input).map(clamp_day).unwrap_or(0)
}

/// Decode a snapshot's `currentGameDay`.
///
/// `Ok(None)` means the field carries no day (JSON null) and the caller
/// should fall back to the default.
pub fn day_from_json(value: &Value) -> Result<Option<GameDay>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(day) = n.as_u64() {
                Ok(Some(day))
            } else if let Some(day) = n.as_i64() {
                Ok(Some(clamp_day(day)))
            } else {
                let day = n.as_f64().unwrap_or(0.0).trunc();
                Ok(Some(if day <= 0.0 { 0 } else { day as GameDay }))
            }
        }
        Value::String(s) => parse_leading_int(s)
            .map(|day| Some(clamp_day(day)))
            .ok_or_else(|| format!("{s:?}")),
        other => Err(other.to_string()),
    }
}

fn clamp_day(value: i64) -> GameDay {
    value.max(0) as GameDay
}

fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overlong digit runs saturate instead of failing.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
