//! Keeps a [`SchemaStore`] in step with a [`SchemaSource`].
//!
//! # Data flow
//!
//! 1. Startup: one list-and-install before the loops start.
//! 2. Watch loop: every notification triggers a list-and-install; a reconnect after a
//!    dropped subscription triggers one as well, covering events lost in the gap.
//! 3. Resync loop: every `resync_interval` a list-and-install runs unconditionally.
//!
//! Both loops call [`SchemaSynchronizer::refresh`], which serializes list-and-install
//! so the last listing taken is the last one published. Either loop can be spawned
//! alone.
//!
//! # Failure modes & recovery
//!
//! * Refresh failures are logged; the previous snapshot stays published.
//! * Watch failures back off exponentially and retry until cancelled. No failure
//!   here ends a loop or reaches request handlers.

use std::sync::Arc;
use std::time::Duration;

use addrctl_worker::{BackoffPolicy, TaskClass, sleep_unless_cancelled};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{SchemaReader, SchemaSource, SchemaStore, SourceError, parse_schema};

/// Why a refresh ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
	Startup,
	Watch,
	Reconnect,
	Resync,
}

impl Trigger {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Startup => "startup",
			Self::Watch => "watch",
			Self::Reconnect => "reconnect",
			Self::Resync => "resync",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncOptions {
	/// Period of unconditional full refreshes.
	pub resync_interval: Duration,
	/// Delay policy between watch reconnection attempts.
	pub backoff: BackoffPolicy,
}

impl Default for SyncOptions {
	fn default() -> Self {
		Self {
			resync_interval: Duration::from_secs(300),
			backoff: BackoffPolicy::default(),
		}
	}
}

/// Outcome of one list-and-install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
	pub trigger: Trigger,
	pub generation: u64,
	pub types: usize,
	pub skipped: usize,
}

pub struct SchemaSynchronizer {
	source: Arc<dyn SchemaSource>,
	store: SchemaStore,
	options: SyncOptions,
	refresh_lock: tokio::sync::Mutex<()>,
}

impl SchemaSynchronizer {
	pub fn new(source: Arc<dyn SchemaSource>, store: SchemaStore, options: SyncOptions) -> Arc<Self> {
		Arc::new(Self {
			source,
			store,
			options,
			refresh_lock: tokio::sync::Mutex::new(()),
		})
	}

	pub fn reader(&self) -> SchemaReader {
		self.store.reader()
	}

	pub fn options(&self) -> &SyncOptions {
		&self.options
	}

	/// Lists the source, converts it, and publishes the result.
	///
	/// Malformed entries are logged and left out. A listing failure publishes nothing.
	pub async fn refresh(&self, trigger: Trigger) -> Result<RefreshReport, SourceError> {
		let _serial = self.refresh_lock.lock().await;
		let resources = self.source.list().await?;
		let parsed = parse_schema(&resources);
		for entry in &parsed.skipped {
			tracing::warn!(resource = %entry.resource, error = %entry.error, "schema.entry.malformed");
		}

		let types = parsed.schema.len();
		let skipped = parsed.skipped.len();
		let generation = self.store.install(parsed.schema);
		tracing::info!(generation, types, skipped, trigger = trigger.as_str(), "schema.install");
		Ok(RefreshReport {
			trigger,
			generation,
			types,
			skipped,
		})
	}

	async fn refresh_logged(&self, trigger: Trigger) {
		if let Err(error) = self.refresh(trigger).await {
			tracing::warn!(%error, trigger = trigger.as_str(), "schema.refresh.failed");
		}
	}

	/// Runs the startup refresh, then spawns the watch and resync loops.
	pub async fn start(self: &Arc<Self>, cancel: CancellationToken) -> SynchronizerHandle {
		self.refresh_logged(Trigger::Startup).await;
		let watch = self.spawn_watch(cancel.child_token());
		let resync = self.spawn_resync(cancel.child_token());
		SynchronizerHandle {
			cancel,
			tasks: vec![watch, resync],
		}
	}

	/// Spawns only the notification-driven producer.
	pub fn spawn_watch(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
		let this = Arc::clone(self);
		addrctl_worker::spawn(TaskClass::Watch, async move { this.run_watch(cancel).await })
	}

	/// Spawns only the timer-driven producer.
	pub fn spawn_resync(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
		let this = Arc::clone(self);
		addrctl_worker::spawn(TaskClass::Periodic, async move { this.run_resync(cancel).await })
	}

	async fn run_watch(&self, cancel: CancellationToken) {
		let mut backoff = self.options.backoff.start();
		let mut connected_before = false;

		loop {
			let opened = tokio::select! {
				_ = cancel.cancelled() => break,
				opened = self.source.watch() => opened,
			};

			match opened {
				Ok(mut watch) => {
					backoff.reset();
					tracing::debug!(reconnect = connected_before, "schema.watch.connected");
					if connected_before {
						self.refresh_logged(Trigger::Reconnect).await;
					}
					connected_before = true;

					loop {
						let event = tokio::select! {
							_ = cancel.cancelled() => return,
							event = watch.recv() => event,
						};
						let Some(event) = event else {
							break;
						};
						tracing::debug!(kind = event.kind.as_str(), resource = %event.name, "schema.watch.event");
						self.refresh_logged(Trigger::Watch).await;
					}
					tracing::warn!("schema.watch.disconnected");
				}
				Err(error) => {
					tracing::warn!(%error, attempt = backoff.attempt(), "schema.watch.failed");
				}
			}

			let delay = backoff.next_delay();
			tracing::debug!(delay_ms = delay.as_millis() as u64, "schema.watch.retry");
			if !sleep_unless_cancelled(&cancel, delay).await {
				break;
			}
		}
	}

	async fn run_resync(&self, cancel: CancellationToken) {
		let period = self.options.resync_interval.max(Duration::from_millis(1));
		let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = cancel.cancelled() => break,
				_ = ticker.tick() => {}
			}
			self.refresh_logged(Trigger::Resync).await;
		}
	}
}

/// Owns the running synchronizer loops.
#[derive(Debug)]
pub struct SynchronizerHandle {
	cancel: CancellationToken,
	tasks: Vec<JoinHandle<()>>,
}

impl SynchronizerHandle {
	pub fn cancel_token(&self) -> &CancellationToken {
		&self.cancel
	}

	pub fn is_running(&self) -> bool {
		self.tasks.iter().any(|task| !task.is_finished())
	}

	/// Stops both loops and waits for them to exit.
	pub async fn shutdown(self) {
		self.cancel.cancel();
		for task in self.tasks {
			if let Err(error) = task.await {
				tracing::warn!(%error, "schema.sync.join_failed");
			}
		}
	}
}

#[cfg(test)]
mod tests;
