use std::{future::Future, time::Duration};

use crate::Result;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub initial_backoff: Duration,
	pub max_backoff: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &vigil_config::Retry) -> Self {
		Self {
			max_attempts: cfg.max_attempts.max(1),
			initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
			max_backoff: Duration::from_millis(cfg.max_backoff_ms),
		}
	}

	pub fn none() -> Self {
		Self { max_attempts: 1, initial_backoff: Duration::ZERO, max_backoff: Duration::ZERO }
	}

	/// Backoff before retry number `attempt` (zero-based), doubling up to `max_backoff`.
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		let factor = 2_u32.saturating_pow(attempt);

		self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
	}

	/// Runs `op` until it succeeds, fails with a non-transient error, or attempts run out.
	pub async fn run<F, Fut, T>(&self, label: &str, mut op: F) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut attempt = 0;

		loop {
			match op().await {
				Ok(value) => return Ok(value),
				Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
					let delay = self.delay_for_attempt(attempt);

					tracing::warn!(
						error = %err,
						attempt = attempt + 1,
						delay_ms = delay.as_millis() as u64,
						"{label} failed. Retrying."
					);
					tokio::time::sleep(delay).await;

					attempt += 1;
				},
				Err(err) => return Err(err),
			}
		}
	}
}
