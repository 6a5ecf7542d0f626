//! Delivery slot rules: bookable window and minimum lead time.
//!
//! Slots are hourly, "HH:00" within a configured window, and must lie at
//! least `min_lead_hours` ahead of now. Both failure modes surface the same
//! opaque message so callers cannot probe the exact cutoff.

use crate::config::AppConfig;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// The only slot rejection message ever shown to a caller.
pub const SLOT_UNAVAILABLE: &str = "Time slot is not available";

static SLOT_TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2}):00$").unwrap());

/// Explicit slot policy; constructed from config, defaults 07:00-19:00 with a
/// 3 hour lead time.
#[derive(Debug, Clone, Copy)]
pub struct SlotPolicy {
    pub start_hour: u32,
    pub end_hour: u32,
    pub min_lead_hours: i64,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            start_hour: 7,
            end_hour: 19,
            min_lead_hours: 3,
        }
    }
}

impl SlotPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            start_hour: config.slot_start_hour,
            end_hour: config.slot_end_hour,
            min_lead_hours: config.min_lead_hours,
        }
    }

    /// On-the-hour time string whose hour lies inside the bookable window.
    pub fn is_valid_slot(&self, time: &str) -> bool {
        let Some(caps) = SLOT_TIME_RE.captures(time) else {
            return false;
        };
        let Ok(hour) = caps[1].parse::<u32>() else {
            return false;
        };
        hour >= self.start_hour && hour <= self.end_hour
    }

    /// Slot lies at least `min_lead_hours` ahead of `now`.
    pub fn is_far_enough_ahead(&self, slot: NaiveDateTime, now: NaiveDateTime) -> bool {
        slot >= now + Duration::hours(self.min_lead_hours)
    }

    /// Full slot check; the error carries only the opaque message.
    pub fn check(&self, date: &str, time: &str, now: NaiveDateTime) -> Result<(), SlotUnavailable> {
        if !self.is_valid_slot(time) {
            return Err(SlotUnavailable);
        }
        let slot = parse_slot(date, time).ok_or(SlotUnavailable)?;
        if !self.is_far_enough_ahead(slot, now) {
            return Err(SlotUnavailable);
        }
        Ok(())
    }
}

/// Combines "YYYY-MM-DD" and "HH:00" into a local date-time.
pub fn parse_slot(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let caps = SLOT_TIME_RE.captures(time)?;
    let hour = caps[1].parse::<u32>().ok()?;
    date.and_hms_opt(hour, 0, 0)
}

/// Slot rejection; deliberately message-free beyond [`SLOT_UNAVAILABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotUnavailable;

impl std::fmt::Display for SlotUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(SLOT_UNAVAILABLE)
    }
}

impl std::error::Error for SlotUnavailable {}
