//! Contradiction resolver.
//!
//! A pure decision function: given a candidate assertion, the slot's current
//! active set, and the slot's full history, produce a [`Resolution`] the
//! store commits atomically. Ordering is by event time (`observed_at`), not
//! arrival time: a late-arriving fact about the past slots into history
//! without disturbing the current active state.

use crate::models::{Assertion, AssertionCandidate, AssertionId};
use crate::policy::{Cardinality, PredicateRegistry};

/// The resolver's verdict for one candidate write.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No contention: activate the candidate with an open interval.
    Accept,
    /// The candidate reaffirms an existing active assertion with the same
    /// object value: raise that assertion's confidence, write no new version.
    Reaffirm {
        /// The assertion being reaffirmed.
        existing: AssertionId,
        /// Its new confidence (max of old and candidate).
        confidence: f32,
    },
    /// The candidate is the latest observation for a single-valued slot:
    /// close the listed assertions' intervals at the candidate's
    /// `observed_at` and activate the candidate.
    Supersede {
        /// Active assertions whose intervals close at the candidate's start.
        close: Vec<AssertionId>,
    },
    /// Out-of-order arrival: the candidate was observed before the slot's
    /// current value. Insert it as already-superseded history with the given
    /// closed interval end; current active state is untouched.
    InsertSuperseded {
        /// Exclusive end for the candidate's interval (the `valid_from` of
        /// the next-later assertion in history).
        valid_to: i64,
        /// The assertion that supersedes the candidate.
        superseded_by: AssertionId,
        /// A history version whose interval still covers the candidate's
        /// `observed_at`; its `valid_to` must shrink to the candidate's
        /// start so the event-time chain stays non-overlapping.
        truncate: Option<AssertionId>,
    },
    /// The candidate contradicts a higher-confidence active assertion and
    /// falls below the confidence floor: write it as `active` for
    /// multi-source tracking, but emit a contradiction signal instead of
    /// superseding.
    FlagContradiction {
        /// The active assertion the candidate contradicts.
        existing: AssertionId,
    },
}

/// Decides what a candidate write does to its slot.
///
/// `active` is the slot's currently active assertions; `history` is the full
/// version chain ordered by `valid_from`. Both are snapshots taken under the
/// slot's exclusive section, so the decision commits against exactly the
/// state it read.
#[must_use]
pub fn resolve(
    registry: &PredicateRegistry,
    confidence_floor: f32,
    active: &[Assertion],
    history: &[Assertion],
    candidate: &AssertionCandidate,
) -> Resolution {
    // Reaffirmation applies to both cardinalities: an identical value is
    // never a new version.
    if let Some(same) = active.iter().find(|a| a.object.same_value(&candidate.object)) {
        return Resolution::Reaffirm {
            existing: same.id.clone(),
            confidence: same.confidence.max(candidate.confidence),
        };
    }

    match registry.cardinality_for(active, candidate) {
        Cardinality::Multi => Resolution::Accept,
        Cardinality::Single => resolve_single_valued(confidence_floor, active, history, candidate),
    }
}

fn resolve_single_valued(
    confidence_floor: f32,
    active: &[Assertion],
    history: &[Assertion],
    candidate: &AssertionCandidate,
) -> Resolution {
    // The slot's current value: latest by event time, ties broken by
    // confidence then arrival order. More than one active assertion only
    // occurs after flagged contradictions.
    let Some(current) = active.iter().max_by(|a, b| {
        a.observed_at
            .cmp(&b.observed_at)
            .then(a.confidence.total_cmp(&b.confidence))
            .then(a.recorded_at.cmp(&b.recorded_at))
    }) else {
        return Resolution::Accept;
    };

    if candidate.observed_at < current.observed_at {
        // A historical version with the same event time already claims the
        // instant: record the candidate with an empty interval.
        if let Some(twin) = history
            .iter()
            .filter(|a| a.observed_at == candidate.observed_at)
            .min_by_key(|a| a.recorded_at)
        {
            return Resolution::InsertSuperseded {
                valid_to: candidate.observed_at,
                superseded_by: twin.id.clone(),
                truncate: None,
            };
        }

        // Out-of-order arrival: find where the candidate slots into the
        // event-time chain, close its interval at the next-later version,
        // and shrink the prior version if its interval covers the gap.
        let next = history
            .iter()
            .filter(|a| a.observed_at > candidate.observed_at)
            .min_by_key(|a| (a.observed_at, a.recorded_at))
            .unwrap_or(current);
        let truncate = history
            .iter()
            .filter(|a| a.observed_at < candidate.observed_at)
            .max_by_key(|a| (a.observed_at, a.recorded_at))
            .filter(|prior| prior.interval.contains(candidate.observed_at))
            .map(|prior| prior.id.clone());
        return Resolution::InsertSuperseded {
            valid_to: next.interval.valid_from,
            superseded_by: next.id.clone(),
            truncate,
        };
    }

    if candidate.observed_at == current.observed_at {
        // Tie-break: higher confidence wins; still tied, the later-arriving
        // write wins (deterministic fallback, not a precision guarantee).
        if candidate.confidence < current.confidence {
            return Resolution::InsertSuperseded {
                valid_to: candidate.observed_at,
                superseded_by: current.id.clone(),
                truncate: None,
            };
        }
        return Resolution::Supersede {
            close: active.iter().map(|a| a.id.clone()).collect(),
        };
    }

    // Candidate is strictly later. A much weaker source does not silently
    // overwrite a stronger fact: flag for external review instead.
    if candidate.confidence < current.confidence - confidence_floor {
        return Resolution::FlagContradiction {
            existing: current.id.clone(),
        };
    }

    Resolution::Supersede {
        close: active.iter().map(|a| a.id.clone()).collect(),
    }
}
