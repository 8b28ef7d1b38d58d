use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, error};

use crate::connection::types::ConnectionError;

use super::{InboundRouter, TransportDriver};

pub const HTTP_CONTENT_TYPE: &str = "application/ssi-agent-wire";

/// `HttpDriver` posts every envelope to the endpoint on its own request
///
/// Delivery failures never reach the caller of `send`, they are logged and
/// given to the connection's error reporter. A non-empty response body is
/// the partner's reply and goes through the inbound path.
pub struct HttpDriver {
    endpoint: String,
    client: Client,
    router: Arc<InboundRouter>,
}

impl HttpDriver {
    pub fn new(
        endpoint: &str,
        router: Arc<InboundRouter>,
        request_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| ConnectionError::TransportError(err.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
            router,
        })
    }

    async fn post(&self, packed: Vec<u8>) -> Result<Option<Vec<u8>>, ConnectionError> {
        let response = self
            .client
            .post(self.endpoint.as_str())
            .header(CONTENT_TYPE, HTTP_CONTENT_TYPE)
            .body(packed)
            .send()
            .await
            .map_err(|err| ConnectionError::TransportError(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::TransportError(format!(
                "unexpected response status: {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ConnectionError::TransportError(err.to_string()))?;

        if body.is_empty() {
            return Ok(None);
        }

        Ok(Some(body.to_vec()))
    }
}

#[async_trait]
impl TransportDriver for HttpDriver {
    async fn send(&self, packed: Vec<u8>) -> Result<(), ConnectionError> {
        debug!("[http] posting envelope to: {}", self.endpoint);

        match self.post(packed).await {
            Ok(Some(reply)) => {
                debug!("[http] got a reply from: {}", self.endpoint);
                self.router.route_logged(&reply).await
            }
            Ok(None) => debug!("[http] no reply from: {}", self.endpoint),
            Err(err) => {
                error!("[http] delivery to {} failed: {}", self.endpoint, err);
                self.router.report(&err)
            }
        }

        Ok(())
    }

    fn needs_return_route_poll(&self) -> bool {
        true
    }

    async fn close(&self) {}
}
