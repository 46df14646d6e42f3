//! Timer-based transport with optional failure injection.

use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::config::{ChatConfig, DelayConfig};
use crate::core::errors::{ChatError, ChatResult};
use crate::transport::{Operation, Transport, TransportFuture};

/// Random stream used for delay jitter and failure rolls.
const RNG_STREAM: u64 = 1;

/// Transport that sleeps for the configured latency of each operation.
pub struct SimulatedTransport {
    delays: DelayConfig,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedTransport {
    /// Create a transport from the shared config.
    #[must_use]
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            delays: config.delays.clone(),
            failure_rate: config.failure_rate,
            rng: Mutex::new(config.rng(RNG_STREAM)),
        }
    }

    /// Resolve the latency of one call, rolling the reply jitter if needed.
    async fn delay_for(&self, operation: Operation) -> Duration {
        match operation {
            Operation::SendCode => self.delays.send_code,
            Operation::VerifyCode => self.delays.verify_code,
            Operation::CreateChatroom => self.delays.create_chatroom,
            Operation::DeleteChatroom => self.delays.delete_chatroom,
            Operation::LoadOlder => self.delays.load_older,
            Operation::AssistantReply => {
                let (min, max) = (self.delays.reply_min, self.delays.reply_max);
                if min >= max {
                    return min;
                }
                let mut rng = self.rng.lock().await;
                rng.gen_range(min..=max)
            }
        }
    }

    async fn should_fail(&self, operation: Operation) -> bool {
        if !operation.can_fail() || self.failure_rate <= 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().await;
        rng.gen_bool(self.failure_rate.min(1.0))
    }
}

impl Transport for SimulatedTransport {
    fn round_trip(&self, operation: Operation) -> TransportFuture<'_, ChatResult<()>> {
        Box::pin(async move {
            let delay = self.delay_for(operation).await;
            debug!(%operation, ?delay, "Simulating round-trip");
            tokio::time::sleep(delay).await;

            if self.should_fail(operation).await {
                warn!(%operation, "Simulated round-trip failed");
                return Err(ChatError::TransportFailure { operation });
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_waits_configured_delay() {
        let transport = SimulatedTransport::new(&ChatConfig::default());
        let start = tokio::time::Instant::now();
        transport
            .round_trip(Operation::DeleteChatroom)
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed < Duration::from_millis(810));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_delay_within_bounds() {
        let config = ChatConfig::new().with_seed(3);
        let transport = SimulatedTransport::new(&config);
        for _ in 0..10 {
            let start = tokio::time::Instant::now();
            transport
                .round_trip(Operation::AssistantReply)
                .await
                .unwrap();
            let elapsed = start.elapsed();
            assert!(elapsed >= config.delays.reply_min);
            assert!(elapsed <= config.delays.reply_max + Duration::from_millis(5));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_rate_one_fails_backend_calls_only() {
        let config = ChatConfig::new()
            .with_delays(DelayConfig::instant())
            .with_failure_rate(1.0);
        let transport = SimulatedTransport::new(&config);

        let err = transport.round_trip(Operation::SendCode).await;
        assert!(matches!(
            err,
            Err(ChatError::TransportFailure {
                operation: Operation::SendCode
            })
        ));
        assert!(transport.round_trip(Operation::AssistantReply).await.is_ok());
    }
}
