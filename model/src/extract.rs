/*!

The `extract` module turns the records a [`QueryClient`] yields into the single pillar value of a
single minion, or into a specific [`Error`]. Nothing here prints or exits, so every outcome can be
checked against a scripted client.

!*/

use crate::clients::QueryClient;
use crate::record::{Record, Response, ValueRecord};
use crate::Query;
use log::{debug, warn};
use serde_json::Value;
use snafu::{ensure, ResultExt, Snafu};
use std::num::NonZeroU32;

/// The `Result` type returned by [`extract`].
pub type Result<T> = std::result::Result<T, Error>;

/// Every way an extraction can fail. All of them are terminal.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Empty response"))]
    EmptyResponse,

    #[snafu(display("Too many results: expected 2 records, got {}", count))]
    TooManyResults { count: usize },

    #[snafu(display(
        "Error code returned: {}{}",
        display_status(*status),
        display_failed(failed)
    ))]
    RemoteError {
        /// The status of the failure record, which is what signalled the error.
        status: Option<i32>,
        /// The status of the value record, which becomes the exit status.
        value_status: Option<i32>,
        failed: Vec<String>,
    },

    #[snafu(display("Unable to decode response: {}", source))]
    Decoding { source: serde_json::Error },

    #[snafu(display(
        "Unable to decode response: expected a value record and a failure record, got {} and {}",
        first,
        second
    ))]
    MalformedResponse { first: String, second: String },

    #[snafu(display("no minions selected"))]
    NoTargetsMatched,

    #[snafu(display("Too many minions selected: {}", targets.join(", ")))]
    AmbiguousTarget { targets: Vec<String> },

    #[snafu(display("Unable to query the Salt API: {}", message))]
    Client { message: String },
}

/// The failure kinds of an extraction without their details.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FailureKind {
    EmptyResponse,
    TooManyResults,
    RemoteError,
    DecodingError,
    NoTargetsMatched,
    AmbiguousTarget,
    Client,
}

impl Error {
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::EmptyResponse => FailureKind::EmptyResponse,
            Error::TooManyResults { .. } => FailureKind::TooManyResults,
            Error::RemoteError { .. } => FailureKind::RemoteError,
            Error::Decoding { .. } | Error::MalformedResponse { .. } => FailureKind::DecodingError,
            Error::NoTargetsMatched => FailureKind::NoTargetsMatched,
            Error::AmbiguousTarget { .. } => FailureKind::AmbiguousTarget,
            Error::Client { .. } => FailureKind::Client,
        }
    }

    /// The process exit status for this failure. A remote error exits with the status of the
    /// value record even though the failure record carries the cause.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::RemoteError { value_status, .. } => value_status.unwrap_or(1),
            _ => 1,
        }
    }
}

fn display_status(status: Option<i32>) -> String {
    status.map_or_else(|| "none".to_string(), |status| status.to_string())
}

fn display_failed(failed: &[String]) -> String {
    if failed.is_empty() {
        String::new()
    } else {
        format!(", minions did not respond: {}", failed.join(", "))
    }
}

/// Query `client` up to `max_attempts` times until it yields more than one record, then reduce
/// the last attempt to the one value it carries.
pub async fn extract<C>(client: &C, query: &Query, max_attempts: NonZeroU32) -> Result<Value>
where
    C: QueryClient,
{
    let mut records = Vec::new();
    for attempt in 1..=max_attempts.get() {
        debug!(
            "Querying '{}' on '{}' ({}), attempt {} of {}",
            query.pillar(),
            query.target(),
            query.target_type(),
            attempt,
            max_attempts
        );
        records = client.query(query).await.map_err(|e| Error::Client {
            message: e.to_string(),
        })?;
        if records.len() > 1 {
            break;
        }
        warn!(
            "Attempt {} returned {} record(s), the response is incomplete",
            attempt,
            records.len()
        );
    }
    single_value(&records)
}

/// Validate the records of one attempt and return the value of the only minion that answered.
pub fn single_value(records: &[Record]) -> Result<Value> {
    let (first, second) = match records {
        [] | [_] => return EmptyResponseSnafu.fail(),
        [first, second] => (first, second),
        _ => {
            return TooManyResultsSnafu {
                count: records.len(),
            }
            .fail()
        }
    };

    let malformed = || Error::MalformedResponse {
        first: first.payload.clone(),
        second: second.payload.clone(),
    };

    // Pair the records by what they contain; a value record that does not decode is only reported
    // once the failure record has been checked.
    let (value_record, value, failure) =
        match (Response::from_record(first), Response::from_record(second)) {
            (Ok(Response::Failure(_)), Ok(Response::Failure(_))) => return Err(malformed()),
            (value, Ok(Response::Failure(failure))) => (first, value, failure),
            (Ok(Response::Failure(failure)), value) => (second, value, failure),
            _ => return Err(malformed()),
        };

    if !failure.is_success() {
        return RemoteSnafu {
            status: failure.status,
            value_status: value_record.status,
            failed: failure.failed,
        }
        .fail();
    }

    let returns = match value.context(DecodingSnafu)? {
        Response::Value(ValueRecord { returns, .. }) => returns,
        Response::Failure(_) => return Err(malformed()),
    };
    ensure!(!returns.is_empty(), NoTargetsMatchedSnafu);
    ensure!(
        returns.len() == 1,
        AmbiguousTargetSnafu {
            targets: returns.keys().cloned().collect::<Vec<_>>()
        }
    );
    returns
        .into_values()
        .next()
        .ok_or(Error::NoTargetsMatched)
}

#[cfg(test)]
mod test {
    use super::{single_value, Error, FailureKind};
    use crate::record::Record;
    use serde_json::json;

    fn ok_failure() -> Record {
        Record::failure(Some(0), &[] as &[&str])
    }

    #[test]
    fn one_minion_yields_its_value() {
        let records = vec![Record::new(Some(0), r#"{"nodeA": "x"}"#), ok_failure()];
        assert_eq!(single_value(&records).unwrap(), json!("x"));
    }

    #[test]
    fn record_count_is_checked_first() {
        assert!(matches!(single_value(&[]), Err(Error::EmptyResponse)));
        assert!(matches!(
            single_value(&[ok_failure()]),
            Err(Error::EmptyResponse)
        ));
        let three = vec![ok_failure(), ok_failure(), ok_failure()];
        assert!(matches!(
            single_value(&three),
            Err(Error::TooManyResults { count: 3 })
        ));
    }

    #[test]
    fn remote_error_exits_with_value_record_status() {
        let records = vec![
            Record::new(Some(5), r#"{"nodeA": "x"}"#),
            Record::failure(Some(1), &["nodeB"]),
        ];
        let error = single_value(&records).unwrap_err();
        assert_eq!(error.kind(), FailureKind::RemoteError);
        assert_eq!(error.exit_code(), 5);
        assert!(error.to_string().contains("nodeB"));
    }

    #[test]
    fn remote_error_without_value_status_exits_one() {
        let records = vec![
            Record::new(None, r#"{"nodeA": "x"}"#),
            Record::failure(None, &["nodeA"]),
        ];
        assert_eq!(single_value(&records).unwrap_err().exit_code(), 1);
    }

    #[test]
    fn undecodable_value_record_is_surfaced() {
        let records = vec![Record::new(Some(0), r#"["nodeA"]"#), ok_failure()];
        let error = single_value(&records).unwrap_err();
        assert!(matches!(error, Error::Decoding { .. }));
        assert_eq!(error.kind(), FailureKind::DecodingError);
    }

    #[test]
    fn minion_named_failed_is_not_mistaken_for_a_failure_record() {
        let records = vec![Record::new(Some(0), r#"{"Failed": "x"}"#), ok_failure()];
        assert_eq!(single_value(&records).unwrap(), json!("x"));
    }

    #[test]
    fn remote_error_is_checked_before_decoding() {
        let records = vec![Record::new(Some(3), "not json"), Record::failure(Some(1), &["nodeA"])];
        let error = single_value(&records).unwrap_err();
        assert_eq!(error.kind(), FailureKind::RemoteError);
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn two_value_records_are_malformed() {
        let records = vec![
            Record::new(Some(0), r#"{"nodeA": "x"}"#),
            Record::new(Some(0), r#"{"nodeB": "y"}"#),
        ];
        assert!(matches!(
            single_value(&records),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn minion_count_is_enforced() {
        let none = vec![Record::new(Some(0), "{}"), ok_failure()];
        assert!(matches!(single_value(&none), Err(Error::NoTargetsMatched)));

        let two = vec![
            Record::new(Some(0), r#"{"nodeB": "y", "nodeA": "x"}"#),
            ok_failure(),
        ];
        assert!(matches!(
            single_value(&two),
            Err(Error::AmbiguousTarget { targets }) if targets == ["nodeA", "nodeB"]
        ));
    }
}
