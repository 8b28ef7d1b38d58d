use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::warn;

use crate::connection::types::ConnectionError;

use super::TransportDriver;

/// `UnsupportedDriver` backs a service whose scheme has no transport
pub struct UnsupportedDriver {
    scheme: String,
}

impl UnsupportedDriver {
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
        }
    }
}

#[async_trait]
impl TransportDriver for UnsupportedDriver {
    async fn send(&self, _packed: Vec<u8>) -> Result<(), ConnectionError> {
        warn!("[transport] no transport for scheme: {}", self.scheme);
        Err(ConnectionError::UnsupportedProtocol(self.scheme.clone()))
    }

    fn needs_return_route_poll(&self) -> bool {
        false
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::with_tokio::tokio;

    #[tokio::test]
    async fn test_send_is_refused() {
        let driver = UnsupportedDriver::new("ftp");
        let sent = driver.send(vec![1, 2, 3]).await;
        assert_eq!(
            sent.unwrap_err(),
            ConnectionError::UnsupportedProtocol("ftp".to_string())
        );
        assert!(!driver.needs_return_route_poll());
    }
}
