//! Commitment types: promises, obligations, and events with due timestamps.
//!
//! A commitment is a specialization of an entity plus its assertions: the
//! entity carries identity, the assertions carry description, due timestamp,
//! and lifecycle state. State transitions are monotonic: once a commitment
//! leaves `open` it can never return.

use crate::models::EntityId;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a commitment.
///
/// Transition rule: `Open → {Fulfilled, Broken, Cancelled}`. The three
/// target states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentState {
    /// Not yet resolved; the only state reminders fire for.
    Open,
    /// Completed as promised.
    Fulfilled,
    /// Due date passed without fulfillment and the owner conceded it.
    Broken,
    /// Withdrawn before resolution.
    Cancelled,
}

impl CommitmentState {
    /// Returns true for states a commitment can never leave.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Checks the monotonic transition rule.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(self, Self::Open) && target.is_terminal()
    }

    /// Returns the state as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Fulfilled => "fulfilled",
            Self::Broken => "broken",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a state from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "fulfilled" | "done" | "completed" => Some(Self::Fulfilled),
            "broken" | "missed" => Some(Self::Broken),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for CommitmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A commitment as surfaced by the tracker and query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    /// The commitment entity's id.
    pub id: EntityId,
    /// The entity that owns the promise (usually the user).
    pub owner: EntityId,
    /// Human-readable description.
    pub description: String,
    /// Absolute due timestamp, if one was given or could be resolved.
    pub due_at: Option<i64>,
    /// Current lifecycle state.
    pub state: CommitmentState,
    /// When the commitment was registered.
    pub created_at: i64,
}

impl Commitment {
    /// Returns true if the commitment is open and past due at `as_of`.
    #[must_use]
    pub fn is_overdue(&self, as_of: i64) -> bool {
        self.state == CommitmentState::Open && self.due_at.is_some_and(|due| due < as_of)
    }
}

/// A due timestamp specification as it arrives from dialogue.
///
/// May be absolute (epoch seconds, RFC 3339) or relative ("in 3 days",
/// "tomorrow 4pm"). Relative forms are resolved to absolute timestamps at
/// registration time against the supplied clock; they are never stored
/// unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueSpec {
    /// Already-absolute Unix timestamp.
    Absolute(i64),
    /// Offset from registration time.
    Relative(Duration),
    /// A calendar day (today + `day_offset`) at an optional wall-clock time.
    Calendar {
        /// Days from the registration day (0 = today, 1 = tomorrow).
        day_offset: i64,
        /// Time of day; end of day when absent.
        time: Option<NaiveTime>,
    },
}

static IN_RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^in\s+(\d+)\s*(second|minute|hour|day|week)s?$").expect("static regex")
});

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})(?::(\d{2}))?\s*(am|pm)?").expect("static regex"));

impl DueSpec {
    /// Parses a due expression.
    ///
    /// Accepted forms: epoch seconds, RFC 3339, `in N <unit>`, and
    /// `today`/`tomorrow` with an optional clock time (`tomorrow 4pm`,
    /// `today 16:30`). Day expressions without a time default to end of day.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] for expressions that match none
    /// of the accepted forms.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let lower = raw.trim().to_lowercase();
        if lower.is_empty() {
            return Err(crate::Error::Validation("empty due expression".to_string()));
        }

        if let Some(secs) = crate::models::parse_timestamp(raw) {
            return Ok(Self::Absolute(secs));
        }

        if let Some(caps) = IN_RELATIVE.captures(&lower) {
            let n: i64 = caps[1]
                .parse()
                .map_err(|_| crate::Error::Validation(format!("bad due quantity in '{raw}'")))?;
            let duration = match &caps[2] {
                "second" => Duration::seconds(n),
                "minute" => Duration::minutes(n),
                "hour" => Duration::hours(n),
                "day" => Duration::days(n),
                "week" => Duration::weeks(n),
                _ => unreachable!("regex alternation is exhaustive"),
            };
            return Ok(Self::Relative(duration));
        }

        let (day_offset, rest) = if let Some(rest) = lower.strip_prefix("tomorrow") {
            (1, rest.trim())
        } else if let Some(rest) = lower.strip_prefix("today") {
            (0, rest.trim())
        } else if lower == "tonight" {
            (0, "9pm")
        } else {
            return Err(crate::Error::Validation(format!(
                "unrecognized due expression: '{raw}'"
            )));
        };

        let time = if rest.is_empty() {
            None
        } else {
            Some(parse_clock_time(rest).ok_or_else(|| {
                crate::Error::Validation(format!("unrecognized time of day: '{rest}'"))
            })?)
        };

        Ok(Self::Calendar { day_offset, time })
    }

    /// Resolves the spec to an absolute Unix timestamp against `now`.
    #[must_use]
    pub fn resolve(&self, now: i64) -> i64 {
        match self {
            Self::Absolute(ts) => *ts,
            Self::Relative(duration) => now + duration.num_seconds(),
            Self::Calendar { day_offset, time } => {
                let base: DateTime<Utc> = Utc
                    .timestamp_opt(now, 0)
                    .single()
                    .unwrap_or_else(Utc::now);
                let day = base.date_naive() + Duration::days(*day_offset);
                let tod = time.unwrap_or_else(|| {
                    NaiveTime::from_hms_opt(23, 59, 59).expect("valid constant time")
                });
                Utc.from_utc_datetime(&day.and_time(tod)).timestamp()
            }
        }
    }
}

/// Parses clock-time fragments like `4pm`, `16:30`, `12 am`.
fn parse_clock_time(fragment: &str) -> Option<NaiveTime> {
    let trimmed = fragment.trim().trim_start_matches("at").trim();
    let caps = CLOCK_TIME.captures(trimmed)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps
        .get(2)
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    match caps.get(3).map(|m| m.as_str()) {
        Some("pm") if hour != 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute.min(59), 0)
}
