use crate::requests::{Endpoint, WireRequest};
use common::types::config::EngineConfig;
use log::{debug, trace};
use reqwest::blocking::Client;
use std::time::Duration;

/// Body of one engine call, exactly as received, plus how the transport went.
///
/// `status` is absent when no HTTP answer arrived at all (refused connection, timeout). The
/// body then carries the transport error message instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub body: String,
    pub status: Option<u16>,
    pub success: bool,
}

impl RawResponse {
    fn transport_failure(err: reqwest::Error) -> Self {
        Self {
            body: err.to_string(),
            status: err.status().map(|status| status.as_u16()),
            success: false,
        }
    }
}

/// Blocking HTTP client for one engine profile. Shared by every execution unit; calls from a
/// single unit are issued one after another.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    profile: String,
}

impl OsrmClient {
    pub fn new(
        profile: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self { client, profile: profile.into() })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.profile.clone(),
            config.request_timeout.as_duration(),
            config.connect_timeout.as_duration(),
        )
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn url<R: WireRequest>(&self, request: &R, endpoint: &Endpoint) -> String {
        format!("{}{}", endpoint.base_url(), request.path(&self.profile))
    }

    /// Issues exactly one call and never fails: every problem is folded into the response.
    /// There are no retries.
    pub fn dispatch<R: WireRequest>(&self, request: &R, endpoint: &Endpoint) -> RawResponse {
        let url = self.url(request, endpoint);
        trace!(target: "dispatch", "GET {}", url);

        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(err) => {
                debug!(target: "dispatch", "{:?} call to {} failed: {}", R::KIND, endpoint, err);
                return RawResponse::transport_failure(err);
            }
        };

        let status = response.status();
        match response.text() {
            Ok(body) => {
                if !status.is_success() {
                    debug!(target: "dispatch", "{:?} call to {} answered {}", R::KIND, endpoint, status);
                }
                RawResponse { body, status: Some(status.as_u16()), success: status.is_success() }
            }
            // Body cut off midway, most likely by the request timeout
            Err(err) => RawResponse {
                body: err.to_string(),
                status: Some(status.as_u16()),
                success: false,
            },
        }
    }
}
