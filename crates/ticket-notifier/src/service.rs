use std::time::Duration;

use ticket_circuitbreaker::CircuitBreaker;
use tokio::task::JoinHandle;

use crate::config::NotifierConfig;
use crate::transport::{NotificationPayload, NotificationTransport, TransportError};

const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fire-and-forget notification sender: [`NotifierService::send_notification`]
/// schedules a background task and returns immediately. The task never
/// propagates failure to the caller — terminal failure is only logged.
pub struct NotifierService {
    transport: std::sync::Arc<dyn NotificationTransport>,
    breaker: CircuitBreaker,
    config: NotifierConfig,
}

impl NotifierService {
    pub fn new(transport: std::sync::Arc<dyn NotificationTransport>, breaker: CircuitBreaker) -> Self {
        Self::with_config(transport, breaker, NotifierConfig::default())
    }

    pub fn with_config(
        transport: std::sync::Arc<dyn NotificationTransport>,
        breaker: CircuitBreaker,
        config: NotifierConfig,
    ) -> Self {
        Self {
            transport,
            breaker,
            config,
        }
    }

    /// Schedules the retry loop as a detached task and returns immediately.
    /// The returned handle is only useful for tests that want to wait for
    /// the background work to finish; production callers may drop it.
    pub fn send_notification(&self, payload: NotificationPayload) -> JoinHandle<()> {
        let transport = self.transport.clone();
        let breaker = self.breaker.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            send_with_retry(transport, breaker, config, payload).await;
        })
    }
}

async fn send_with_retry(
    transport: std::sync::Arc<dyn NotificationTransport>,
    breaker: CircuitBreaker,
    config: NotifierConfig,
    payload: NotificationPayload,
) {
    for attempt in 0..config.max_attempts {
        if let Err(open) = breaker.try_acquire().await {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                ticket_id = %payload.ticket_id,
                tenant_id = %payload.tenant_id,
                retry_after_ms = open.retry_after.as_millis() as u64,
                "notification terminated: circuit breaker open"
            );
            let _ = open;
            return;
        }

        let outcome = tokio::time::timeout(TRANSPORT_TIMEOUT, transport.send(&payload)).await;
        match outcome {
            Ok(Ok(())) => {
                breaker.record_success().await;
                return;
            }
            Ok(Err(err)) => {
                breaker.record_failure().await;
                if attempt + 1 == config.max_attempts {
                    log_terminal_failure(&payload, &err);
                    return;
                }
            }
            Err(_elapsed) => {
                breaker.record_failure().await;
                if attempt + 1 == config.max_attempts {
                    log_terminal_failure(&payload, &TransportError::Transport("timed out".to_string()));
                    return;
                }
            }
        }

        let delay = config.base_delay * 2u32.pow(attempt);
        let jitter = Duration::from_secs_f64(rand::random::<f64>() * config.jitter_fraction * delay.as_secs_f64());
        tokio::time::sleep(delay + jitter).await;
    }
}

fn log_terminal_failure(payload: &NotificationPayload, err: &TransportError) {
    #[cfg(feature = "tracing")]
    tracing::error!(
        ticket_id = %payload.ticket_id,
        tenant_id = %payload.tenant_id,
        error = %err,
        "notification failed after exhausting retries"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (payload, err);
}
