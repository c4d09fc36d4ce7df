//! ==============================================================================
//! transmit.rs - push readings to the ingestion endpoint
//! ==============================================================================
//!
//! purpose:
//!     one HTTP POST per reading, json body, no retries. a failed send is
//!     classified, logged and reported as `false`; the next scheduled cycle
//!     is the only retry there is.
//!
//! failure classes:
//!     - Connection: endpoint unreachable (refused, dns, tls handshake)
//!     - Timeout: no response within the configured request timeout
//!     - HttpStatus: a response arrived but was not 2xx
//!     - Unexpected: any other transport failure
//!
//! relationships:
//!     - used by: simulator.rs (once per cycle)
//!     - sends: domain.rs Reading as json
//!
//! ==============================================================================

use crate::domain::Reading;

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TransmitError {
    Connection { endpoint: String },
    Timeout { endpoint: String },
    HttpStatus { status: u16, body: String },
    Unexpected(String),
}

impl StdError for TransmitError {}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection { endpoint } => write!(
                f,
                "Connection Error: Could not connect to {}. Is the backend running?",
                endpoint
            ),
            Self::Timeout { endpoint } => {
                write!(f, "Timeout Error: The request to {} timed out.", endpoint)
            }
            Self::HttpStatus { status, body } => write!(f, "HTTP Error {}: {}", status, body),
            Self::Unexpected(description) => {
                write!(f, "An unexpected error occurred: {}", description)
            }
        }
    }
}

impl TransmitError {
    fn classify(error: reqwest::Error, endpoint: &str) -> Self {
        // a connect timeout reports both flags
        if error.is_timeout() {
            Self::Timeout { endpoint: endpoint.to_string() }
        } else if error.is_connect() {
            Self::Connection { endpoint: endpoint.to_string() }
        } else {
            Self::Unexpected(error_chain(&error))
        }
    }
}

/// `reqwest::Error` hides the hyper/io cause behind `source()`
fn error_chain(error: &dyn StdError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn delivered_message(reading: &Reading) -> String {
    format!(
        "Data sent successfully: {} - Temp: {:.1}C, Hum: {}%",
        reading.sensor_id(),
        reading.temperature(),
        reading.humidity()
    )
}

/// http client bound to one ingestion endpoint
#[derive(Clone)]
pub struct Transmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl Transmitter {
    /// `timeout` bounds a whole request; `None` waits forever
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    /// single POST attempt
    pub async fn send(&self, reading: &Reading) -> Result<(), TransmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(reading)
            .send()
            .await
            .map_err(|e| TransmitError::classify(e, &self.endpoint))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransmitError::HttpStatus { status: status.as_u16(), body })
    }

    /// send, log the outcome, and reduce it to delivered / not delivered
    pub async fn send_and_report(&self, reading: &Reading) -> bool {
        match self.send(reading).await {
            Ok(()) => {
                tracing::info!(sensor_id = reading.sensor_id(), "{}", delivered_message(reading));
                true
            }
            Err(e @ TransmitError::Unexpected(_)) => {
                tracing::error!(sensor_id = reading.sensor_id(), "{}", e);
                false
            }
            Err(e) => {
                tracing::warn!(sensor_id = reading.sensor_id(), "{}", e);
                false
            }
        }
    }
}
