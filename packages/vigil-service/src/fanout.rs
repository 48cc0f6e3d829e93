use std::{future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};

use crate::{Error, Result};

/// Runs `op` over `inputs` with at most `limit` in flight and returns results in input order.
///
/// The first failure is returned as soon as it is observed. Dropping the returned future drops
/// the task set, which aborts every task still running.
pub async fn run_ordered<I, T, F, Fut>(inputs: Vec<I>, limit: usize, op: F) -> Result<Vec<T>>
where
	I: Send + 'static,
	T: Send + 'static,
	F: Fn(I) -> Fut,
	Fut: Future<Output = Result<T>> + Send + 'static,
{
	let permits = Arc::new(Semaphore::new(limit.max(1)));
	let mut tasks = JoinSet::new();
	let mut slots: Vec<Option<T>> = Vec::with_capacity(inputs.len());

	for (index, input) in inputs.into_iter().enumerate() {
		let permits = permits.clone();
		let fut = op(input);

		slots.push(None);
		tasks.spawn(async move {
			let _permit = permits
				.acquire_owned()
				.await
				.map_err(|err| Error::Task { message: err.to_string() })?;

			fut.await.map(|value| (index, value))
		});
	}

	while let Some(joined) = tasks.join_next().await {
		let (index, value) = joined.map_err(|err| Error::Task { message: err.to_string() })??;

		slots[index] = Some(value);
	}

	slots
		.into_iter()
		.map(|slot| {
			slot.ok_or_else(|| Error::Task { message: "Fan-out task produced no result.".to_string() })
		})
		.collect()
}
