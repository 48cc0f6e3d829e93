use std::{
	collections::HashMap,
	future::Future,
	hash::Hash,
	sync::Mutex,
	time::{Duration, Instant},
};

use crate::Result;

struct Entry<V> {
	value: V,
	loaded_at: Instant,
}

/// Values reloaded once older than the caller-supplied TTL.
///
/// The lock is never held across a load, so concurrent misses on the same key may both load.
/// The later write wins.
pub struct TtlCache<K, V> {
	entries: Mutex<HashMap<K, Entry<V>>>,
}
impl<K, V> TtlCache<K, V>
where
	K: Clone + Eq + Hash,
	V: Clone,
{
	pub fn new() -> Self {
		Self { entries: Mutex::new(HashMap::new()) }
	}

	pub async fn get_or_refresh<F, Fut>(&self, key: K, ttl: Duration, loader: F) -> Result<V>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<V>>,
	{
		if let Some(value) = self.fresh(&key, ttl) {
			return Ok(value);
		}

		let value = loader().await?;
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.insert(key, Entry { value: value.clone(), loaded_at: Instant::now() });

		Ok(value)
	}

	pub fn invalidate(&self, key: &K) {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).remove(key);
	}

	fn fresh(&self, key: &K, ttl: Duration) -> Option<V> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries
			.get(key)
			.filter(|entry| entry.loaded_at.elapsed() < ttl)
			.map(|entry| entry.value.clone())
	}
}
impl<K, V> Default for TtlCache<K, V>
where
	K: Clone + Eq + Hash,
	V: Clone,
{
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;
	use crate::Error;

	#[tokio::test]
	async fn fresh_entries_skip_the_loader() {
		let cache = TtlCache::new();
		let loads = AtomicUsize::new(0);

		for _ in 0..3 {
			let value = cache
				.get_or_refresh("rdc_code", Duration::from_secs(60), || async {
					loads.fetch_add(1, Ordering::SeqCst);

					Ok(vec!["A0401".to_string()])
				})
				.await
				.expect("Load failed.");

			assert_eq!(value, vec!["A0401".to_string()]);
		}

		assert_eq!(loads.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn stale_entries_are_reloaded() {
		let cache = TtlCache::new();
		let loads = AtomicUsize::new(0);

		for _ in 0..2 {
			cache
				.get_or_refresh("country", Duration::ZERO, || async {
					Ok(loads.fetch_add(1, Ordering::SeqCst))
				})
				.await
				.expect("Load failed.");
		}

		assert_eq!(loads.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn failed_loads_are_not_cached() {
		let cache: TtlCache<&str, u32> = TtlCache::new();
		let err = cache
			.get_or_refresh("country", Duration::from_secs(60), || async {
				Err(Error::RemoteQuery { message: "down".to_string() })
			})
			.await
			.expect_err("Expected load failure.");

		assert!(matches!(err, Error::RemoteQuery { .. }));

		let value = cache
			.get_or_refresh("country", Duration::from_secs(60), || async { Ok(7) })
			.await
			.expect("Load failed.");

		assert_eq!(value, 7);
	}
}
