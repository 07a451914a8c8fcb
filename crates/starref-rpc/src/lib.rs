//! HTTP gateway adapter.
//!
//! Implements the `starref-core` [`Dispatcher`] port by posting each request as
//! JSON to an RPC gateway. A 2xx body is the raw result packet; anything else
//! is decoded as a `{code, message}` error status.

use async_trait::async_trait;

use starref_core::{
    config::Config,
    errors::{Error, RemoteError},
    ports::Dispatcher,
    wire::Request,
    Result,
};

/// Longest error body excerpt kept when the gateway doesn't send a status object.
const ERROR_BODY_EXCERPT: usize = 200;

#[derive(Clone, Debug)]
pub struct HttpDispatcher {
    url: String,
    api_token: Option<String>,
    http: reqwest::Client,
}

impl HttpDispatcher {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;
        Ok(Self {
            url: cfg.gateway_url.clone(),
            api_token: cfg.api_token.clone(),
            http,
        })
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn send(&self, request: Request) -> Result<Vec<u8>> {
        let method = request.method();
        let mut req = self.http.post(&self.url).json(&request);
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Remote(RemoteError::new(504, "Request timeout"))
            } else {
                Error::External(format!("gateway request error: {e}"))
            }
        })?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::External(format!("gateway read error: {e}")))?;
        tracing::debug!(method, status, len = body.len(), "gateway response");

        map_response(status, &body)
    }
}

/// Turn a gateway HTTP reply into the result packet or its error status.
fn map_response(status: u16, body: &[u8]) -> Result<Vec<u8>> {
    if (200..300).contains(&status) {
        return Ok(body.to_vec());
    }

    if let Ok(remote) = serde_json::from_slice::<RemoteError>(body) {
        return Err(Error::Remote(remote));
    }

    let text = String::from_utf8_lossy(body);
    Err(Error::Remote(RemoteError::new(
        i32::from(status),
        text.chars().take(ERROR_BODY_EXCERPT).collect::<String>(),
    )))
}
