//! Health data model
//!
//! One entry per user per calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily health entry. Serialized as `[date, resting_heart_rate, weight, comment]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "HealthTuple", from = "HealthTuple")]
pub struct HealthEntry {
    pub date: NaiveDate,
    pub resting_heart_rate: i32,
    pub weight: i32,
    pub comment: String,
}

type HealthTuple = (NaiveDate, i32, i32, String);

impl From<HealthEntry> for HealthTuple {
    fn from(e: HealthEntry) -> Self {
        (e.date, e.resting_heart_rate, e.weight, e.comment)
    }
}

impl From<HealthTuple> for HealthEntry {
    fn from((date, resting_heart_rate, weight, comment): HealthTuple) -> Self {
        Self {
            date,
            resting_heart_rate,
            weight,
            comment,
        }
    }
}
