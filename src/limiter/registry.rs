//! Client limiter registry and its background eviction sweep.

// std
use std::sync::Weak;
// crates.io
use tokio::{
	sync::oneshot,
	task::{JoinError, JoinHandle},
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{
	_prelude::*,
	config::LimiterConfig,
	error::ConfigError,
	limiter::{ClientKey, TokenBucket},
	obs,
};

#[derive(Debug)]
struct ClientState {
	bucket: TokenBucket,
	last_seen: Instant,
}
impl ClientState {
	fn touch(&mut self, now: Instant) -> bool {
		self.last_seen = now;

		self.bucket.try_take(now)
	}
}

/// Process-local registry of per-client token buckets.
///
/// Every admission and every sweep goes through one mutex; admission holds it for a single
/// map lookup, the sweep for one pass over the map.
#[derive(Debug)]
pub struct ClientLimiterRegistry {
	config: LimiterConfig,
	clients: Mutex<HashMap<ClientKey, ClientState>>,
}
impl ClientLimiterRegistry {
	/// Creates an empty registry after [validating](LimiterConfig::validate) `config`.
	pub fn new(config: LimiterConfig) -> Result<Self, ConfigError> {
		config.validate()?;

		Ok(Self { config, clients: Mutex::new(HashMap::new()) })
	}

	/// Limiter settings in effect.
	pub fn config(&self) -> &LimiterConfig {
		&self.config
	}

	/// Admits or rejects one request from `key` using the current clock.
	pub fn admit(&self, key: &ClientKey) -> bool {
		self.admit_at(key, Instant::now())
	}

	/// Admits or rejects one request from `key` at `now`.
	///
	/// Creates the client's bucket on first contact, refreshes its last-seen instant, and
	/// takes one token, all under the registry lock.
	pub fn admit_at(&self, key: &ClientKey, now: Instant) -> bool {
		let mut clients = self.clients.lock();

		if let Some(state) = clients.get_mut(key) {
			return state.touch(now);
		}

		clients
			.entry(key.clone())
			.or_insert_with(|| ClientState {
				bucket: TokenBucket::new(self.config.rps, self.config.burst, now),
				last_seen: now,
			})
			.touch(now)
	}

	/// Removes clients idle for longer than the configured threshold, using the current clock.
	pub fn sweep(&self) -> usize {
		self.sweep_at(Instant::now())
	}

	/// Removes clients whose last request is older than the idle threshold at `now`.
	///
	/// Returns how many clients were evicted.
	pub fn sweep_at(&self, now: Instant) -> usize {
		let idle_timeout = self.config.idle_timeout;
		let mut clients = self.clients.lock();
		let before = clients.len();

		clients.retain(|_, state| now.saturating_duration_since(state.last_seen) <= idle_timeout);

		let tracked = clients.len();

		drop(clients);

		let evicted = before - tracked;

		obs::report_sweep(evicted, tracked);

		evicted
	}

	/// Number of clients currently tracked.
	pub fn len(&self) -> usize {
		self.clients.lock().len()
	}

	/// Returns `true` if no client is tracked.
	pub fn is_empty(&self) -> bool {
		self.clients.lock().is_empty()
	}

	/// Returns `true` if `key` currently owns a bucket.
	pub fn contains(&self, key: &ClientKey) -> bool {
		self.clients.lock().contains_key(key)
	}

	/// Starts the periodic eviction sweep on the current tokio runtime.
	///
	/// The task holds only a weak reference, so it also ends once the registry is dropped.
	pub fn spawn_sweeper(self: &Arc<Self>) -> SweepHandle {
		let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
		let registry = Arc::downgrade(self);
		let period = self.config.sweep_interval;
		let task = tokio::spawn(async move {
			let mut ticker = time::interval_at(Instant::now() + period, period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					_ = &mut stop_rx => break,
					_ = ticker.tick() => {
						if !sweep_once(&registry) {
							break;
						}
					},
				}
			}
		});

		SweepHandle { stop: stop_tx, task }
	}
}

fn sweep_once(registry: &Weak<ClientLimiterRegistry>) -> bool {
	match registry.upgrade() {
		Some(registry) => {
			registry.sweep();

			true
		},
		None => false,
	}
}

/// Control handle for a running sweep task.
///
/// Dropping the handle closes the control channel, which also stops the task.
#[derive(Debug)]
pub struct SweepHandle {
	stop: oneshot::Sender<()>,
	task: JoinHandle<()>,
}
impl SweepHandle {
	/// Signals the sweep task to stop and waits for it to exit.
	pub async fn shutdown(self) -> Result<(), JoinError> {
		let Self { stop, task } = self;

		// The receiver is gone only if the task already exited.
		let _ = stop.send(());

		task.await
	}

	/// Returns `true` once the sweep task has exited.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}
}
