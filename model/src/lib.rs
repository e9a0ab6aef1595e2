/*!

This library provides the pieces of `get-pillar`: the pillar [`Query`], the [`Record`]s a remote
query client yields, a client for the Salt API, and the [`extract`] procedure that reduces the
records to a single value.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use config::SaltApiConfig;
pub use error::{Error, Result};
pub use extract::{extract, single_value, FailureKind};
pub use query::{Query, TargetType};
pub use record::{FailureRecord, Record, Response, ValueRecord};

pub mod clients;
mod config;
pub mod constants;
mod error;
pub mod extract;
mod query;
mod record;
