//! Training model
//!
//! A training session and its ordered intervals.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One interval of a training. Serialized as `[duration, power, pace, rest]`;
/// the object form `{"duration", "power", "pace", "rest"}` is accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "IntervalTuple", from = "IntervalRepr")]
pub struct IntervalEntry {
    /// Duration in seconds
    pub duration: i32,
    /// Average power in watts
    pub power: i32,
    /// Pace in seconds per 500 m
    pub pace: Option<i32>,
    /// Rest after the interval in seconds
    pub rest: i32,
}

type IntervalTuple = (i32, i32, Option<i32>, i32);

#[derive(Deserialize)]
#[serde(untagged)]
enum IntervalRepr {
    Tuple(IntervalTuple),
    Object {
        duration: i32,
        power: i32,
        #[serde(default)]
        pace: Option<i32>,
        rest: i32,
    },
}

impl From<IntervalEntry> for IntervalTuple {
    fn from(i: IntervalEntry) -> Self {
        (i.duration, i.power, i.pace, i.rest)
    }
}

impl From<IntervalRepr> for IntervalEntry {
    fn from(repr: IntervalRepr) -> Self {
        match repr {
            IntervalRepr::Tuple((duration, power, pace, rest)) => Self {
                duration,
                power,
                pace,
                rest,
            },
            IntervalRepr::Object {
                duration,
                power,
                pace,
                rest,
            } => Self {
                duration,
                power,
                pace,
                rest,
            },
        }
    }
}

/// Training entry. Serialized as `[time, type_is_endurance, comment, [interval...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "TrainingTuple")]
pub struct TrainingEntry {
    pub time: NaiveDateTime,
    pub type_is_endurance: bool,
    pub comment: String,
    pub intervals: Vec<IntervalEntry>,
}

type TrainingTuple = (String, bool, String, Vec<IntervalEntry>);

/// Wire format for training timestamps
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl From<TrainingEntry> for TrainingTuple {
    fn from(t: TrainingEntry) -> Self {
        (
            t.time.format(TIME_FORMAT).to_string(),
            t.type_is_endurance,
            t.comment,
            t.intervals,
        )
    }
}
