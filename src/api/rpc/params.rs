//! Method parameters
//!
//! Parameters arrive either positionally, in the order each method declares
//! them, or by name. A missing or `null` parameter is a missing mandatory
//! argument; one of the wrong type is invalid params.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::RpcError;

/// Interval fields that must not be null, by position in the array form
const INTERVAL_FIELDS: [(usize, &str); 3] = [(0, "duration"), (1, "power"), (3, "rest")];

#[derive(Debug, Default)]
pub struct Params {
    positional: Vec<Value>,
    named: Map<String, Value>,
}

impl Params {
    pub fn new(raw: Option<Value>) -> Self {
        match raw {
            Some(Value::Array(positional)) => Self {
                positional,
                ..Self::default()
            },
            Some(Value::Object(named)) => Self {
                named,
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    fn raw(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.named.get(name))
            .filter(|v| !v.is_null())
    }

    /// Fetch and convert a mandatory parameter
    pub fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, RpcError> {
        let value = self
            .raw(index, name)
            .ok_or_else(|| RpcError::MissingArgument(name.to_string()))?;
        convert(value, name)
    }

    /// Refuse more positional parameters than the method declares
    pub fn at_most(&self, count: usize) -> Result<(), RpcError> {
        if self.positional.len() > count {
            return Err(RpcError::InvalidParams(format!(
                "expected at most {} parameters, got {}",
                count,
                self.positional.len()
            )));
        }
        Ok(())
    }

    /// Fetch the interval list, checking mandatory fields inside each interval.
    ///
    /// `pace` is the only interval field that may be null or left out.
    pub fn intervals<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<Vec<T>, RpcError> {
        let value = self
            .raw(index, name)
            .ok_or_else(|| RpcError::MissingArgument(name.to_string()))?;

        let Value::Array(items) = value else {
            return Err(RpcError::InvalidParams(format!("{} must be an array", name)));
        };
        if items.is_empty() {
            return Err(RpcError::InvalidParams(format!("{} must not be empty", name)));
        }

        for item in items {
            for (position, field) in INTERVAL_FIELDS {
                let present = match item {
                    Value::Array(fields) => fields.get(position).is_some_and(|v| !v.is_null()),
                    Value::Object(fields) => fields.get(field).is_some_and(|v| !v.is_null()),
                    _ => true,
                };
                if !present {
                    return Err(RpcError::MissingArgument(field.to_string()));
                }
            }
        }

        convert(value, name)
    }
}

fn convert<T: DeserializeOwned>(value: &Value, name: &str) -> Result<T, RpcError> {
    serde_json::from_value(value.clone())
        .map_err(|e| RpcError::InvalidParams(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntervalEntry;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_positional_and_named() {
        let positional = Params::new(Some(json!(["a@b.com", "pw"])));
        let named = Params::new(Some(json!({"password": "pw", "email": "a@b.com"})));

        for params in [positional, named] {
            let email: String = params.required(0, "email").unwrap();
            let password: String = params.required(1, "password").unwrap();
            assert_eq!((email.as_str(), password.as_str()), ("a@b.com", "pw"));
        }
    }

    #[test]
    fn test_missing_and_null_are_mandatory_errors() {
        let params = Params::new(Some(json!(["a@b.com", null])));
        assert_eq!(
            params.required::<String>(1, "password"),
            Err(RpcError::MissingArgument("password".into()))
        );
        assert_eq!(
            Params::new(None).required::<String>(0, "email"),
            Err(RpcError::MissingArgument("email".into()))
        );
    }

    #[test]
    fn test_wrong_type_is_invalid_params() {
        let params = Params::new(Some(json!([-3, "2024-13-45", "yes"])));
        assert!(matches!(params.required::<u32>(0, "days_in_the_past"), Err(RpcError::InvalidParams(_))));
        assert!(matches!(params.required::<NaiveDate>(1, "date"), Err(RpcError::InvalidParams(_))));
        assert!(matches!(params.required::<bool>(2, "coach"), Err(RpcError::InvalidParams(_))));
    }

    #[test]
    fn test_date_format() {
        let params = Params::new(Some(json!(["2024-02-29"])));
        let date: NaiveDate = params.required(0, "date").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_arity() {
        let params = Params::new(Some(json!([1, 2, 3])));
        assert!(params.at_most(3).is_ok());
        assert!(matches!(params.at_most(2), Err(RpcError::InvalidParams(_))));
    }

    #[test]
    fn test_intervals_pace_may_be_null() {
        let params = Params::new(Some(json!([[[600, 200, null, 60], {"duration": 300, "power": 250, "rest": 0}]])));
        let intervals: Vec<IntervalEntry> = params.intervals(0, "intervals").unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].pace, None);
        assert_eq!(intervals[1].duration, 300);
    }

    #[test]
    fn test_intervals_other_nulls_are_missing_arguments() {
        let params = Params::new(Some(json!([[[600, null, 100, 60]]])));
        assert_eq!(
            params.intervals::<IntervalEntry>(0, "intervals"),
            Err(RpcError::MissingArgument("power".into()))
        );

        let params = Params::new(Some(json!([[{"duration": 600, "power": 200}]])));
        assert_eq!(
            params.intervals::<IntervalEntry>(0, "intervals"),
            Err(RpcError::MissingArgument("rest".into()))
        );
    }

    #[test]
    fn test_intervals_must_be_non_empty_array() {
        let empty = Params::new(Some(json!([[]])));
        assert!(matches!(empty.intervals::<IntervalEntry>(0, "intervals"), Err(RpcError::InvalidParams(_))));

        let scalar = Params::new(Some(json!([5])));
        assert!(matches!(scalar.intervals::<IntervalEntry>(0, "intervals"), Err(RpcError::InvalidParams(_))));
    }
}
