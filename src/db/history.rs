//! Ordered logs of the intervals a ticket spent paused or in execution.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Interval with a fixed start and an end set once it is closed.
pub trait Span {
    fn start_time(&self) -> OffsetDateTime;

    fn end_time(&self) -> Option<OffsetDateTime>;

    fn close(&mut self, at: OffsetDateTime);

    fn is_open(&self) -> bool {
        self.end_time().is_none()
    }
}

/// Interval during which a ticket was on hold.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pause {
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub reason: String,
}

impl Pause {
    pub fn new(start_time: OffsetDateTime, reason: String) -> Self {
        Self {
            start_time,
            end_time: None,
            reason,
        }
    }
}

impl Span for Pause {
    fn start_time(&self) -> OffsetDateTime {
        self.start_time
    }

    fn end_time(&self) -> Option<OffsetDateTime> {
        self.end_time
    }

    fn close(&mut self, at: OffsetDateTime) {
        self.end_time = Some(at);
    }
}

/// Interval during which a ticket was being worked on.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
}

impl Execution {
    pub fn new(start_time: OffsetDateTime) -> Self {
        Self {
            start_time,
            end_time: None,
        }
    }
}

impl Span for Execution {
    fn start_time(&self) -> OffsetDateTime {
        self.start_time
    }

    fn end_time(&self) -> Option<OffsetDateTime> {
        self.end_time
    }

    fn close(&mut self, at: OffsetDateTime) {
        self.end_time = Some(at);
    }
}

/// Segments in the order they were opened. At most one is open.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History<S>(Vec<S>);

impl<S> Default for History<S> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<S> From<Vec<S>> for History<S> {
    fn from(segments: Vec<S>) -> Self {
        Self(segments)
    }
}

impl<S: Span> History<S> {
    pub fn segments(&self) -> &[S] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The most recent segment without an end.
    pub fn open_segment(&self) -> Option<&S> {
        self.0.iter().rev().find(|s| s.is_open())
    }

    /// Closes the most recent open segment at `at`.
    ///
    /// Returns `false` if nothing was open, which callers treat as a no-op.
    pub fn close_open(&mut self, at: OffsetDateTime) -> bool {
        match self.0.iter_mut().rev().find(|s| s.is_open()) {
            Some(segment) => {
                segment.close(at);
                true
            }
            None => false,
        }
    }

    /// Appends `segment`, closing a stale open one at its start first.
    pub fn start(&mut self, segment: S) {
        self.close_open(segment.start_time());
        self.0.push(segment);
    }

    /// Latest instant recorded in any segment.
    pub fn latest(&self) -> Option<OffsetDateTime> {
        self.0
            .iter()
            .flat_map(|s| [Some(s.start_time()), s.end_time()])
            .flatten()
            .max()
    }

    /// Sum of the closed segments. Open segments do not count yet.
    pub fn total_closed(&self) -> Duration {
        self.0
            .iter()
            .filter_map(|s| s.end_time().map(|end| end - s.start_time()))
            .filter(|d| d.is_positive())
            .sum()
    }
}
