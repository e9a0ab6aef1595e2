use snafu::Snafu;

/// The `Result` type returned by `clients`.
pub type Result<T> = std::result::Result<T, Error>;

/// The public error type returned by `clients`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

/// The private error type returned by `clients`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub(crate) enum InnerError {
    #[snafu(display("Error initializing the HTTP client: {}", source))]
    Initialization { source: reqwest::Error },

    #[snafu(display("Unable to build the '{}' endpoint URL: {}", path, source))]
    Endpoint {
        path: String,
        source: url::ParseError,
    },

    #[snafu(display("Unable to {}: {}", what, source))]
    Request {
        /// What we were trying to do, e.g. 'log in'.
        what: String,
        source: reqwest::Error,
    },

    #[snafu(display("Unable to {}: the Salt API returned {}: {}", what, status, body))]
    HttpStatus {
        what: String,
        status: u16,
        body: String,
    },

    #[snafu(display("Unable to deserialize the response to '{}': {}", what, source))]
    Deserialize {
        what: String,
        source: serde_json::Error,
    },

    #[snafu(display("The Salt API login response did not contain a token"))]
    MissingToken,
}
