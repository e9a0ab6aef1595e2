mod error;
mod salt_api;

pub use error::{Error, Result};
pub use salt_api::SaltApiClient;

use crate::{Query, Record};
use async_trait::async_trait;
use std::fmt::{Debug, Display};

/// The `QueryClient` is an interface to whatever runs a pillar lookup on the remote minions. The
/// purpose of the interface is to allow injection of a scripted client for testing the extractor
/// without a Salt master. In practice you will use [`SaltApiClient`].
#[async_trait]
pub trait QueryClient {
    /// The error type returned by this trait's functions.
    type E: Debug + Display + Send + Sync + 'static;

    /// Run `query` once and return every record the remote end produced, in order. A complete
    /// answer is a value record followed by a failure record; anything shorter is incomplete.
    async fn query(&self, query: &Query) -> std::result::Result<Vec<Record>, Self::E>;
}
