/*!

`get-pillar` prints the value of a single pillar of a single Salt minion, so that shell scripts and
test suites can read deployment parameters from the Salt master.

The Salt API is reached with the `SALTAPI_URL`, `SALTAPI_USER`, `SALTAPI_PASS` and `SALTAPI_EAUTH`
environment variables.

!*/

mod error;
mod output;

use clap::Parser;
use env_logger::Builder;
use error::Result;
use log::{debug, LevelFilter};
use output::OutputFormat;
use pillar_model::clients::SaltApiClient;
use pillar_model::constants::DEFAULT_MAX_ATTEMPTS;
use pillar_model::{extract, Query, SaltApiConfig, TargetType};
use snafu::ResultExt;
use std::num::NonZeroU32;
use std::time::Duration;

/// Print the value of a pillar on exactly one Salt minion.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    /// How many times to query the Salt API while its response is incomplete.
    #[clap(long = "max-attempts", default_value_t = default_max_attempts())]
    max_attempts: NonZeroU32,
    /// How the target is matched [glob|pcre|list|grain|grain_pcre|pillar|nodegroup|range|compound|ipcidr].
    #[clap(long = "target-type", default_value = "glob")]
    target_type: TargetType,
    /// Seconds to wait for the targeted minions to return.
    #[clap(long = "timeout", default_value = "60")]
    timeout: u64,
    /// Accept invalid TLS certificates from the Salt API.
    #[clap(long = "ignore-ssl")]
    ignore_ssl: bool,
    /// How to print the value [raw|json|yaml].
    #[clap(long = "output", default_value = "raw")]
    output: OutputFormat,
    /// The minion to query, e.g. 'cfg01*'.
    target: String,
    /// The pillar to read, e.g. '_param:openstack_version'.
    pillar: String,
}

fn default_max_attempts() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_MAX_ATTEMPTS).unwrap_or(NonZeroU32::MIN)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = SaltApiConfig::from_env().context(error::ConfigSnafu)?;
    config.ignore_ssl = args.ignore_ssl;
    config.timeout = Duration::from_secs(args.timeout);
    debug!("Using {:?}", config);

    let client = SaltApiClient::new(config).context(error::ClientSnafu)?;
    let query = Query::new(args.target, args.pillar)
        .context(error::QuerySnafu)?
        .with_target_type(args.target_type);
    let value = extract(&client, &query, args.max_attempts)
        .await
        .context(error::ExtractSnafu)?;
    println!("{}", args.output.render(&value)?);
    Ok(())
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use default log level for our crates only.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("pillar_model"), level)
                .init();
        }
    }
}
