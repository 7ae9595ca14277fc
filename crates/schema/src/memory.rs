//! In-process [`SchemaSource`] with call counting and failure injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{SchemaEvent, SchemaEventKind, SchemaResource, SchemaSource, SchemaWatch, SourceError};

const WATCH_BUFFER: usize = 64;

#[derive(Default)]
struct State {
	resources: IndexMap<String, SchemaResource>,
	watchers: Vec<mpsc::Sender<SchemaEvent>>,
}

/// Schema resources kept in memory, in insertion order.
///
/// Notifications are delivered best-effort: a watcher whose buffer is full misses
/// the event, the same way a real watch may drop events.
#[derive(Default)]
pub struct MemorySchemaSource {
	state: Mutex<State>,
	list_calls: AtomicUsize,
	watch_calls: AtomicUsize,
	fail_list: AtomicBool,
	fail_watch: AtomicBool,
}

impl MemorySchemaSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_resources(resources: impl IntoIterator<Item = SchemaResource>) -> Self {
		let source = Self::new();
		{
			let mut state = source.state.lock();
			for resource in resources {
				state.resources.insert(resource.name.clone(), resource);
			}
		}
		source
	}

	/// Adds or replaces a resource and notifies watchers.
	pub fn put(&self, resource: SchemaResource) {
		let mut state = self.state.lock();
		let name = resource.name.clone();
		let kind = match state.resources.insert(name.clone(), resource) {
			Some(_) => SchemaEventKind::Modified,
			None => SchemaEventKind::Added,
		};
		Self::notify(&mut state, SchemaEvent { kind, name });
	}

	/// Removes a resource and notifies watchers. Returns whether it existed.
	pub fn remove(&self, name: &str) -> bool {
		let mut state = self.state.lock();
		if state.resources.shift_remove(name).is_none() {
			return false;
		}
		Self::notify(
			&mut state,
			SchemaEvent {
				kind: SchemaEventKind::Deleted,
				name: name.to_string(),
			},
		);
		true
	}

	/// Changes the stored resources without notifying anybody.
	pub fn put_silently(&self, resource: SchemaResource) {
		self.state.lock().resources.insert(resource.name.clone(), resource);
	}

	/// Drops every open subscription; their streams end.
	pub fn disconnect_watchers(&self) {
		self.state.lock().watchers.clear();
	}

	pub fn set_fail_list(&self, fail: bool) {
		self.fail_list.store(fail, Ordering::SeqCst);
	}

	pub fn set_fail_watch(&self, fail: bool) {
		self.fail_watch.store(fail, Ordering::SeqCst);
	}

	pub fn list_calls(&self) -> usize {
		self.list_calls.load(Ordering::SeqCst)
	}

	pub fn watch_calls(&self) -> usize {
		self.watch_calls.load(Ordering::SeqCst)
	}

	pub fn watcher_count(&self) -> usize {
		let mut state = self.state.lock();
		state.watchers.retain(|tx| !tx.is_closed());
		state.watchers.len()
	}

	fn notify(state: &mut State, event: SchemaEvent) {
		state.watchers.retain(|tx| match tx.try_send(event.clone()) {
			Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
			Err(mpsc::error::TrySendError::Closed(_)) => false,
		});
	}
}

#[async_trait]
impl SchemaSource for MemorySchemaSource {
	async fn list(&self) -> Result<Vec<SchemaResource>, SourceError> {
		self.list_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_list.load(Ordering::SeqCst) {
			return Err(SourceError::unavailable("list failure injected"));
		}
		Ok(self.state.lock().resources.values().cloned().collect())
	}

	async fn watch(&self) -> Result<SchemaWatch, SourceError> {
		self.watch_calls.fetch_add(1, Ordering::SeqCst);
		if self.fail_watch.load(Ordering::SeqCst) {
			return Err(SourceError::unavailable("watch failure injected"));
		}
		let (tx, rx) = mpsc::channel(WATCH_BUFFER);
		self.state.lock().watchers.push(tx);
		Ok(rx)
	}
}
