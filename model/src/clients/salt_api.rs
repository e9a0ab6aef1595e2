use super::error::{self, Result};
use super::QueryClient;
use crate::constants::{
    AUTH_TOKEN_HEADER, INCOMPLETE_STATUS, LOOKUP_JID, PILLAR_GET, SUCCESS_STATUS,
};
use crate::{Query, Record, SaltApiConfig};
use async_trait::async_trait;
use log::{debug, info, trace};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use snafu::{ensure, OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, timeout_at, Instant};
use url::Url;

const LOGIN_PATH: &str = "login";

/// Salt API replies wrap their payload in a `return` list.
#[derive(Debug, Deserialize)]
struct SaltResponse<T> {
    #[serde(rename = "return", default = "Vec::new")]
    ret: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct LoginReturn {
    token: Option<String>,
}

/// What publishing a job looked like.
#[derive(Debug)]
enum Published {
    /// The job was accepted for these minions.
    Job { jid: String, minions: Vec<String> },
    /// The target matched no minions.
    NoMinions,
    /// The reply carried no job id; the raw reply is kept.
    Incomplete(String),
}

/// A [`QueryClient`] for the Salt API (`rest_cherrypy`). The query is published asynchronously to
/// the targeted minions, then the job is looked up until every targeted minion has returned or the
/// configured timeout elapses.
///
/// # Example
///
/// ```
///# use pillar_model::{Query, SaltApiConfig};
///# use pillar_model::clients::{QueryClient, SaltApiClient};
///# async fn no_run() {
/// let client = SaltApiClient::new(SaltApiConfig::from_env().unwrap()).unwrap();
/// let query = Query::new("cfg01*", "_param:openstack_version").unwrap();
/// let records = client.query(&query).await.unwrap();
///# }
/// ```
pub struct SaltApiClient {
    config: SaltApiConfig,
    http: reqwest::Client,
    token: Mutex<Option<String>>,
}

impl SaltApiClient {
    pub fn new(config: SaltApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.ignore_ssl)
            .build()
            .context(error::InitializationSnafu)?;
        Ok(Self {
            config,
            http,
            token: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = self.config.url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(path).context(error::EndpointSnafu { path })?)
    }

    /// Post `body` to `path`, giving up after `timeout`.
    async fn post<T>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
        what: &str,
        timeout: Duration,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(self.endpoint(path)?)
            .timeout(timeout)
            .header(ACCEPT, "application/json")
            .json(body);
        if let Some(token) = token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }
        let response = request.send().await.context(error::RequestSnafu { what })?;
        let status = response.status();
        let text = response.text().await.context(error::RequestSnafu { what })?;
        // The login reply carries the token.
        if path != LOGIN_PATH {
            trace!("Salt API reply to '{}' ({}): {}", what, status, text);
        }
        ensure!(
            status.is_success(),
            error::HttpStatusSnafu {
                what,
                status: status.as_u16(),
                body: text,
            }
        );
        Ok(serde_json::from_str(&text).context(error::DeserializeSnafu { what })?)
    }

    /// Log in once and reuse the token for the life of the client.
    async fn token(&self) -> Result<String> {
        let cached = self.token.lock().ok().and_then(|token| token.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        debug!(
            "Logging in to '{}' as '{}' with eauth '{}'",
            self.config.url, self.config.username, self.config.eauth
        );
        let body = json!({
            "username": self.config.username,
            "password": self.config.password,
            "eauth": self.config.eauth,
        });
        let response: SaltResponse<LoginReturn> = self
            .post(LOGIN_PATH, None, &body, "log in", self.config.timeout)
            .await?;
        let token = response
            .ret
            .into_iter()
            .next()
            .and_then(|login| login.token)
            .context(error::MissingTokenSnafu)?;
        if let Ok(mut cached) = self.token.lock() {
            *cached = Some(token.clone());
        }
        Ok(token)
    }

    async fn publish(&self, token: &str, query: &Query) -> Result<Published> {
        let body = json!([{
            "client": "local_async",
            "tgt": query.target(),
            "tgt_type": query.target_type(),
            "fun": PILLAR_GET,
            "arg": [query.pillar()],
        }]);
        let response: SaltResponse<Value> = self
            .post(
                "",
                Some(token),
                &body,
                "publish the pillar lookup",
                self.config.timeout,
            )
            .await?;
        let published = response.ret.into_iter().next().unwrap_or(Value::Null);
        let jid = published.get("jid").and_then(Value::as_str);
        Ok(match jid {
            Some(jid) => Published::Job {
                jid: jid.to_string(),
                minions: string_list(published.get("minions")),
            },
            None if published.as_object().map_or(false, |map| map.is_empty()) => {
                Published::NoMinions
            }
            None => Published::Incomplete(published.to_string()),
        })
    }

    async fn lookup(&self, token: &str, jid: &str) -> Result<BTreeMap<String, Value>> {
        let body = json!([{
            "client": "runner",
            "fun": LOOKUP_JID,
            "jid": jid,
        }]);
        // The caller bounds lookups by its deadline; the request timeout only has to outlast it.
        let timeout = self.config.timeout + self.config.poll_interval;
        let response: SaltResponse<BTreeMap<String, Value>> = self
            .post("", Some(token), &body, "look up the job", timeout)
            .await?;
        Ok(response.ret.into_iter().next().unwrap_or_default())
    }

    /// Look the job up until every minion in `minions` has returned or the timeout elapses. A
    /// lookup still in flight at the deadline is abandoned. Returns what came back and the minions
    /// that never answered.
    async fn wait_for_returns(
        &self,
        token: &str,
        jid: &str,
        minions: &[String],
    ) -> Result<(BTreeMap<String, Value>, Vec<String>)> {
        let deadline = Instant::now() + self.config.timeout;
        let mut returns = BTreeMap::new();
        loop {
            match timeout_at(deadline, self.lookup(token, jid)).await {
                Ok(lookup) => returns = lookup?,
                Err(_) => debug!("Lookup of job '{}' was still running at the deadline", jid),
            }
            let missing = missing_minions(minions, &returns);
            if missing.is_empty() {
                return Ok((returns, missing));
            }
            if Instant::now() >= deadline {
                info!(
                    "Job '{}' timed out waiting for: {}",
                    jid,
                    missing.join(", ")
                );
                return Ok((returns, missing));
            }
            debug!(
                "Job '{}' is waiting for {} of {} minion(s)",
                jid,
                missing.len(),
                minions.len()
            );
            sleep_until(deadline.min(Instant::now() + self.config.poll_interval)).await;
        }
    }
}

impl Debug for SaltApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let logged_in = self.token.lock().map(|token| token.is_some()).unwrap_or(false);
        f.debug_struct("SaltApiClient")
            .field("config", &self.config)
            .field("token", &if logged_in { "<redacted>" } else { "<none>" })
            .finish()
    }
}

fn missing_minions(minions: &[String], returns: &BTreeMap<String, Value>) -> Vec<String> {
    minions
        .iter()
        .filter(|minion| !returns.contains_key(minion.as_str()))
        .cloned()
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl QueryClient for SaltApiClient {
    type E = error::Error;

    async fn query(&self, query: &Query) -> Result<Vec<Record>> {
        let token = self.token().await?;
        match self.publish(&token, query).await? {
            Published::Job { jid, minions } => {
                debug!("Published job '{}' to {} minion(s)", jid, minions.len());
                let (returns, missing) = self.wait_for_returns(&token, &jid, &minions).await?;
                let failure_status = if missing.is_empty() {
                    SUCCESS_STATUS
                } else {
                    INCOMPLETE_STATUS
                };
                Ok(vec![
                    Record::value(Some(SUCCESS_STATUS), &returns),
                    Record::failure(Some(failure_status), &missing),
                ])
            }
            Published::NoMinions => {
                debug!("Target '{}' matched no minions", query.target());
                Ok(vec![
                    Record::value(Some(SUCCESS_STATUS), &BTreeMap::new()),
                    Record::failure(Some(SUCCESS_STATUS), &[] as &[&str]),
                ])
            }
            Published::Incomplete(reply) => {
                debug!("The Salt API did not return a job id: {}", reply);
                Ok(vec![Record::incomplete(reply)])
            }
        }
    }
}
