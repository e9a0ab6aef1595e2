use snafu::Snafu;

/// The crate-wide result type.
pub(crate) type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum Error {
    #[snafu(display("Unable to read the Salt API configuration: {}", source))]
    Config { source: pillar_model::Error },

    #[snafu(display("Unable to create the Salt API client: {}", source))]
    Client {
        source: pillar_model::clients::Error,
    },

    #[snafu(display("{}", source))]
    Query { source: pillar_model::Error },

    #[snafu(display("{}", source))]
    Extract {
        source: pillar_model::extract::Error,
    },

    #[snafu(display("Could not serialize the value as JSON: {}", source))]
    JsonSerialize { source: serde_json::Error },

    #[snafu(display("Could not serialize the value as YAML: {}", source))]
    YamlSerialize { source: serde_yaml::Error },
}

impl Error {
    /// The status the process exits with when `run` fails.
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            Error::Extract { source } => source.exit_code(),
            _ => 1,
        }
    }
}
