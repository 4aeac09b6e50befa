//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with the configured deadline
//! - Classify client errors into transport failure kinds
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timeout is a transport failure like a refused connection
//! - Dropping the timed-out future cancels the upstream call

use std::future::Future;
use std::time::Duration;

use crate::resilience::outcome::TransportErrorKind;

/// Await `call` for at most `deadline`, mapping failures to a transport kind.
pub async fn with_deadline<F, T>(deadline: Duration, call: F) -> Result<T, TransportErrorKind>
where
    F: Future<Output = Result<T, hyper_util::client::legacy::Error>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(classify(&e)),
        Err(_) => Err(TransportErrorKind::Timeout),
    }
}

fn classify(error: &hyper_util::client::legacy::Error) -> TransportErrorKind {
    if error.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_elapses() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, hyper_util::client::legacy::Error>(())
        };
        let result = with_deadline(Duration::from_millis(20), slow).await;
        assert_eq!(result, Err(TransportErrorKind::Timeout));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let fast = async { Ok::<_, hyper_util::client::legacy::Error>(7) };
        assert_eq!(with_deadline(Duration::from_secs(1), fast).await, Ok(7));
    }
}
