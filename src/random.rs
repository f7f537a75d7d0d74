//! Random number service served by the demo API backend.

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RandomResponse {
    pub random: i64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

/// An integer in `[0, 99]`.
pub fn generate() -> RandomResponse {
    RandomResponse {
        random: rand::thread_rng().gen_range(0..100),
        timestamp: timestamp(),
        range: None,
    }
}

/// An integer in `[min, max]`, inclusive. Bounds are swapped if reversed.
pub fn generate_in_range(min: i64, max: i64) -> RandomResponse {
    let (min, max) = if min > max { (max, min) } else { (min, max) };
    RandomResponse {
        random: rand::thread_rng().gen_range(min..=max),
        timestamp: timestamp(),
        range: Some(Range { min, max }),
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
