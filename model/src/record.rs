/*!

A query client answers every attempt with a short sequence of raw [`Record`]s. The first names the
minions that returned a value, the second lists the minions that did not respond. The order is
what the Salt client produces, but each record is classified into a [`Response`] by its fields
rather than by its position.

!*/

use crate::constants::{FAILED_KEY, INCOMPLETE_STATUS, SUCCESS_STATUS};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One record yielded by a query client: an optional status and a JSON payload.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Record {
    pub status: Option<i32>,
    pub payload: String,
}

impl Record {
    pub fn new<S: Into<String>>(status: Option<i32>, payload: S) -> Self {
        Self {
            status,
            payload: payload.into(),
        }
    }

    /// Build a value record from the per-minion returns.
    pub fn value(status: Option<i32>, returns: &BTreeMap<String, Value>) -> Self {
        Self::new(status, Value::from(Map::from_iter(returns.clone())).to_string())
    }

    /// Build a failure record listing the minions that did not respond.
    pub fn failure<S: AsRef<str>>(status: Option<i32>, failed: &[S]) -> Self {
        let failed: Vec<Value> = failed.iter().map(|id| Value::from(id.as_ref())).collect();
        let mut payload = Map::new();
        payload.insert(FAILED_KEY.to_string(), Value::Array(failed));
        Self::new(status, Value::Object(payload).to_string())
    }

    /// A lone record standing for an attempt that did not complete, carrying whatever the remote
    /// end sent.
    pub fn incomplete<S: Into<String>>(payload: S) -> Self {
        Self::new(Some(INCOMPLETE_STATUS), payload)
    }

    /// Whether the status is the success sentinel. A missing status is not.
    pub fn is_success(&self) -> bool {
        self.status == Some(SUCCESS_STATUS)
    }

    /// A failure record is recognized by a `Failed` key listing minion ids, not by its position.
    pub fn is_failure_record(&self) -> bool {
        FailureRecord::from_record(self).is_some()
    }
}

/// The minions that returned a value, keyed by minion id.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRecord {
    pub status: Option<i32>,
    pub returns: BTreeMap<String, Value>,
}

/// The minions that were targeted but never answered.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FailureRecord {
    pub status: Option<i32>,
    pub failed: Vec<String>,
}

impl FailureRecord {
    /// Read a failure record out of a raw record. `None` unless the payload is an object whose
    /// `Failed` key holds a list of minion ids, so a minion that happens to be called `Failed`
    /// still reads as a value.
    pub fn from_record(record: &Record) -> Option<Self> {
        let payload: Value = serde_json::from_str(&record.payload).ok()?;
        let failed = payload
            .as_object()?
            .get(FAILED_KEY)?
            .as_array()?
            .iter()
            .map(|id| id.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            status: record.status,
            failed,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(SUCCESS_STATUS)
    }
}

impl ValueRecord {
    /// Decode the payload of a value record as a mapping of minion id to returned value.
    pub fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status: record.status,
            returns: serde_json::from_str(&record.payload)?,
        })
    }
}

/// A typed record. Failure records are told apart by field presence, everything else must decode
/// as a value record.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Value(ValueRecord),
    Failure(FailureRecord),
}

impl Response {
    /// Classify a single record, decoding a value record's payload eagerly.
    pub fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        match FailureRecord::from_record(record) {
            Some(failure) => Ok(Response::Failure(failure)),
            None => ValueRecord::from_record(record).map(Response::Value),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{FailureRecord, Record, Response, ValueRecord};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn failure_record_is_found_by_key() {
        let failure = Record::failure(Some(1), &["cmp002"]);
        assert!(failure.is_failure_record());
        assert_eq!(
            FailureRecord::from_record(&failure).unwrap().failed,
            vec!["cmp002".to_string()]
        );

        let value = Record::new(Some(0), r#"{"cfg01": "mitaka"}"#);
        assert!(!value.is_failure_record());
        assert!(!Record::new(None, "not json").is_failure_record());
    }

    #[test]
    fn minion_named_failed_is_a_value() {
        let record = Record::new(Some(0), r#"{"Failed": "x"}"#);
        assert!(!record.is_failure_record());
        assert!(matches!(
            Response::from_record(&record),
            Ok(Response::Value(ValueRecord { returns, .. })) if returns["Failed"] == "x"
        ));

        let unreadable = Record::new(Some(1), r#"{"Failed": [1, 2]}"#);
        assert!(FailureRecord::from_record(&unreadable).is_none());
    }

    #[test]
    fn undecodable_value_record_is_an_error() {
        assert!(Response::from_record(&Record::new(Some(0), "[1]")).is_err());
        assert_eq!(
            Response::from_record(&Record::failure(Some(0), &["ctl02"])).unwrap(),
            Response::Failure(FailureRecord {
                status: Some(0),
                failed: vec!["ctl02".to_string()],
            })
        );
    }

    #[test]
    fn value_record_keeps_non_string_returns() {
        let mut returns = BTreeMap::new();
        returns.insert("ctl01".to_string(), json!({"enabled": true}));
        let record = Record::value(Some(0), &returns);
        assert_eq!(
            Response::from_record(&record).unwrap(),
            Response::Value(ValueRecord {
                status: Some(0),
                returns,
            })
        );
    }

    #[test]
    fn missing_status_is_not_success() {
        assert!(!Record::new(None, "{}").is_success());
        assert!(Record::new(Some(0), "{}").is_success());
    }
}
