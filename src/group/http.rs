//! REST client for the Spotinst AWS Elastigroup endpoints.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{GroupInstance, ScaleItem, ScaleResult};
use super::{
    ClientFactory, Credentials, DetachRequest, GroupClient, GroupError, GroupFuture, ScaleRequest,
};

/// Default base URL of the Spotinst API.
pub const SPOTINST_API_BASE: &str = "https://api.spotinst.io";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("spotinst-machine/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct Envelope<T> {
    response: EnvelopeBody<T>,
}

#[derive(Deserialize)]
struct EnvelopeBody<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    response: ErrorBody,
}

#[derive(Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetachBody<'a> {
    instances_to_detach: &'a [String],
    should_decrement_target_capacity: bool,
}

/// Elastigroup client backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct SpotinstClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl SpotinstClient {
    /// Builds a client against the public Spotinst API.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::Config`] when the HTTP client cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self, GroupError> {
        Self::with_base_url(credentials, SPOTINST_API_BASE)
    }

    /// Builds a client against an alternative API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::Config`] when the HTTP client cannot be built.
    pub fn with_base_url(
        credentials: Credentials,
        base_url: impl Into<String>,
    ) -> Result<Self, GroupError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| GroupError::Config(err.to_string()))?;
        let base = base_url.into();
        Ok(Self {
            http,
            base_url: base.trim_end_matches('/').to_owned(),
            credentials,
        })
    }

    fn group_request(&self, method: Method, group_id: &str, suffix: &str) -> RequestBuilder {
        let url = format!("{}/aws/ec2/group/{group_id}/{suffix}", self.base_url);
        self.http
            .request(method, url)
            .bearer_auth(&self.credentials.token)
            .query(&[("accountId", self.credentials.account.as_str())])
    }

    async fn send<T: DeserializeOwned>(
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>, GroupError> {
        let response = request
            .send()
            .await
            .map_err(|err| GroupError::transport(endpoint, &err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| GroupError::transport(endpoint, &err))?;
        debug!(endpoint, status = status.as_u16(), "spotinst API responded");

        if !status.is_success() {
            return Err(GroupError::Api {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.response.items)
            .map_err(|err| GroupError::decode(endpoint, &err))
    }
}

fn api_error_message(body: &str) -> String {
    let parsed: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let messages: Vec<String> = parsed
        .response
        .errors
        .into_iter()
        .filter_map(|entry| match (entry.code, entry.message) {
            (Some(code), Some(message)) => Some(format!("{code}: {message}")),
            (None, Some(message)) => Some(message),
            (Some(code), None) => Some(code),
            (None, None) => None,
        })
        .collect();

    if messages.is_empty() {
        body.trim().to_owned()
    } else {
        messages.join("; ")
    }
}

impl GroupClient for SpotinstClient {
    fn scale<'a>(&'a self, request: &'a ScaleRequest) -> GroupFuture<'a, ScaleResult> {
        Box::pin(async move {
            let adjustment = request.adjustment.to_string();
            let builder = self
                .group_request(Method::PUT, &request.group_id, "scale/up")
                .query(&[("adjustment", adjustment.as_str())]);
            let items = Self::send::<ScaleItem>("scale", builder).await?;
            Ok(ScaleResult { items })
        })
    }

    fn status<'a>(&'a self, group_id: &'a str) -> GroupFuture<'a, Vec<GroupInstance>> {
        Box::pin(async move {
            let builder = self.group_request(Method::GET, group_id, "status");
            Self::send::<GroupInstance>("status", builder).await
        })
    }

    fn detach<'a>(&'a self, request: &'a DetachRequest) -> GroupFuture<'a, ()> {
        Box::pin(async move {
            let body = DetachBody {
                instances_to_detach: &request.instance_ids,
                should_decrement_target_capacity: request.decrement_capacity,
            };
            let builder = self
                .group_request(Method::PUT, &request.group_id, "detachInstances")
                .json(&body);
            Self::send::<serde_json::Value>("detach", builder).await?;
            Ok(())
        })
    }
}

/// Production factory building [`SpotinstClient`]s.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpClientFactory {
    base_url: String,
}

impl HttpClientFactory {
    /// Targets the public Spotinst API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(SPOTINST_API_BASE)
    }

    /// Targets an alternative API endpoint.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for HttpClientFactory {
    type Client = SpotinstClient;

    fn build(&self, credentials: &Credentials) -> Result<Self::Client, GroupError> {
        SpotinstClient::with_base_url(credentials.clone(), self.base_url.as_str())
    }
}
