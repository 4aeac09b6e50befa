//! Per-request forwarding outcome and its failure classification.

use serde::Serialize;
use std::fmt;

use crate::config::FailurePolicyConfig;

/// Why an upstream call never produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, connect timeout.
    Connect,
    /// No response headers within the upstream timeout.
    Timeout,
    /// Any other client error (protocol error, reset mid-response).
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Inclusive status range counted as breaker failures (5xx by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    min: u16,
    max: u16,
}

impl FailurePolicy {
    pub fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    pub fn is_failure(&self, status: u16) -> bool {
        (self.min..=self.max).contains(&status)
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::new(500, 599)
    }
}

impl From<&FailurePolicyConfig> for FailurePolicy {
    fn from(config: &FailurePolicyConfig) -> Self {
        Self::new(config.status_min, config.status_max)
    }
}

/// Result of one admitted upstream call, consumed once by the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub success: bool,
    pub http_status: Option<u16>,
    pub transport_error: Option<TransportErrorKind>,
}

impl ForwardOutcome {
    /// The upstream answered; classify its status with `policy`.
    pub fn from_status(status: u16, policy: &FailurePolicy) -> Self {
        Self {
            success: !policy.is_failure(status),
            http_status: Some(status),
            transport_error: None,
        }
    }

    /// The upstream could not be reached or did not answer in time.
    pub fn from_transport(kind: TransportErrorKind) -> Self {
        Self {
            success: false,
            http_status: None,
            transport_error: Some(kind),
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.transport_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let policy = FailurePolicy::default();

        assert!(ForwardOutcome::from_status(200, &policy).success);
        assert!(ForwardOutcome::from_status(404, &policy).success, "4xx is a client error");
        assert!(!ForwardOutcome::from_status(500, &policy).success);
        assert!(!ForwardOutcome::from_status(503, &policy).success);

        let timeout = ForwardOutcome::from_transport(TransportErrorKind::Timeout);
        assert!(!timeout.success);
        assert!(timeout.is_transport_failure());
        assert_eq!(timeout.http_status, None);
    }

    #[test]
    fn test_custom_range() {
        let policy = FailurePolicy::new(502, 504);
        assert!(ForwardOutcome::from_status(500, &policy).success);
        assert!(!ForwardOutcome::from_status(503, &policy).success);
    }
}
