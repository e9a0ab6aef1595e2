use snafu::Snafu;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Unable to read environment variable '{}': {}", key, source))]
    EnvRead {
        key: String,
        source: std::env::VarError,
    },

    #[snafu(display("Invalid query: {} must not be empty", what))]
    InvalidQuery { what: String },

    #[snafu(display("Unable to parse '{}' from '{}': {}", key, value, source))]
    InvalidUrl {
        key: String,
        value: String,
        source: url::ParseError,
    },

    #[snafu(display("Parse error: {}", source))]
    SerdePlain { source: serde_plain::Error },
}
