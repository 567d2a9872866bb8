//! Client for the NHL stats API (statsapi.web.nhl.com).
//!
//! Owns the transport capability, the endpoint directory, the entity
//! parsers, and the dispatch directory that ties the two together for
//! the population pipeline.

use std::future::Future;

use log::debug;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

pub mod dispatch;
pub mod parse;
pub mod status;
pub mod teams;
pub mod urls;

#[cfg(feature = "mock")]
pub mod mock;

pub use dispatch::{Dispatch, DispatchKind, UnknownDispatchKind};
pub use parse::ParseError;
pub use status::GameStatus;
pub use urls::Endpoint;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("error building stats API request")]
    RequestBuildError(#[source] reqwest::Error),

    #[error("error executing stats API request")]
    RequestExecuteError(#[source] reqwest::Error),

    #[error("stats API reported a server error")]
    StatusError(#[source] reqwest::Error),

    #[error("error extracting response body")]
    RequestBodyError(#[source] reqwest::Error),

    #[error("error deserializing stats API response")]
    DeserializeError(#[source] serde_json::Error),

    #[cfg(feature = "mock")]
    #[error("no scripted response for {0}")]
    NoScriptedResponse(String),

    #[cfg(feature = "mock")]
    #[error("scripted transport failure for {0}")]
    ScriptedFailure(String),
}

/// The transport capability: one HTTP GET, parsed JSON or an error.
///
/// Exactly one attempt per call. Retry and backoff, where wanted, are the
/// caller's business, not the transport's.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// The real transport, backed by a shared `reqwest` client.
pub struct StatsApi {
    client: reqwest::Client,
}

impl StatsApi {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for StatsApi {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StatsApi {
    async fn fetch(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<Value, FetchError> {
        debug!("Fetching {url} with params {params:?}");

        let request = self
            .client
            .get(url)
            .query(params)
            .build()
            .map_err(FetchError::RequestBuildError)?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::RequestExecuteError)?
            .error_for_status()
            .map_err(FetchError::StatusError)?;

        let body = response
            .text()
            .await
            .map_err(FetchError::RequestBodyError)?;

        serde_json::from_str(&body).map_err(FetchError::DeserializeError)
    }
}
