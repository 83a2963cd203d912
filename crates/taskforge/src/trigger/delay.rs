/*
 *  Copyright 2026 Taskforge Contributors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Delay and duration grammar.
//!
//! Delays are accepted either as absolute RFC 3339 timestamps or as compact
//! natural-language durations (`"1h30m"`). Durations stringify back through
//! [`stringify_duration`], which is also used to normalize numeric TTLs.
//!
//! A string that is neither a parseable date nor a matched duration is
//! silently treated as "no delay".

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// `(weeks)(days)(hours)(minutes)(seconds)`, every group optional, fixed
/// order. The empty string matches but contributes no groups.
static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)w)?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$")
        .expect("duration pattern is valid")
});

const SECONDS_PER_WEEK: i64 = 604_800;
const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Parses a delay into a concrete timestamp.
///
/// - empty string: no delay
/// - RFC 3339 timestamp: returned as-is, unless it is not in the future
/// - otherwise: natural-language duration added to now
pub fn parse_delay(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        let timestamp = parsed.with_timezone(&Utc);
        if timestamp <= Utc::now() {
            return None;
        }
        return Some(timestamp);
    }

    parse_natural_language_duration(value)
}

/// Parses a compact duration like `"1w2d3h4m5s"` and adds it to now.
/// Returns `None` when no unit group matched.
pub fn parse_natural_language_duration(value: &str) -> Option<DateTime<Utc>> {
    parse_duration_seconds(value).map(|seconds| Utc::now() + Duration::seconds(seconds))
}

/// Total seconds expressed by a compact duration string, or `None` when no
/// unit group matched.
pub fn parse_duration_seconds(value: &str) -> Option<i64> {
    let captures = DURATION_PATTERN.captures(value)?;

    let mut matched = false;
    let mut seconds = 0i64;
    for (group, unit) in [
        (1, SECONDS_PER_WEEK),
        (2, SECONDS_PER_DAY),
        (3, SECONDS_PER_HOUR),
        (4, SECONDS_PER_MINUTE),
        (5, 1),
    ] {
        if let Some(m) = captures.get(group) {
            matched = true;
            let magnitude: i64 = m.as_str().parse().ok()?;
            seconds += magnitude * unit;
        }
    }

    matched.then_some(seconds)
}

/// Renders a positive number of seconds as a compact duration string,
/// concatenating only the non-zero components in `w d h m s` order.
/// Returns `None` for zero or negative inputs.
pub fn stringify_duration(seconds: i64) -> Option<String> {
    if seconds <= 0 {
        return None;
    }

    let weeks = seconds / SECONDS_PER_WEEK;
    let days = (seconds % SECONDS_PER_WEEK) / SECONDS_PER_DAY;
    let hours = (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let remainder = seconds % SECONDS_PER_MINUTE;

    let mut out = String::new();
    for (magnitude, unit) in [
        (weeks, 'w'),
        (days, 'd'),
        (hours, 'h'),
        (minutes, 'm'),
        (remainder, 's'),
    ] {
        if magnitude > 0 {
            out.push_str(&magnitude.to_string());
            out.push(unit);
        }
    }

    Some(out)
}
