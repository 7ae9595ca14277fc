//! In-process backing store.
//!
//! Behaves like the real store contract (per-key consistency, duplicate keys
//! rejected, cascade on address-space delete) and adds what tests need: call
//! counters and failure injection. Optionally enforces routable-address
//! uniqueness itself, which closes the race window the pre-write conflict scan
//! leaves open.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use addrctl_model::{Address, AddressSpace, AddressSpaceKey, ResourceKind, ServerMeta};
use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use crate::{AddressApi, AddressSpaceApi, StoreError};

#[derive(Default)]
struct State {
	spaces: BTreeMap<AddressSpaceKey, AddressSpace>,
	addresses: BTreeMap<AddressSpaceKey, BTreeMap<String, Address>>,
}

#[derive(Default)]
struct Inner {
	state: RwLock<State>,
	version: AtomicU64,
	space_calls: AtomicUsize,
	address_calls: AtomicUsize,
	fail_all: AtomicBool,
	unique_addresses: AtomicBool,
	failing_names: RwLock<FxHashSet<String>>,
}

impl Inner {
	fn next_meta(&self, previous: Option<&ServerMeta>) -> ServerMeta {
		ServerMeta {
			uid: Some(previous.and_then(|m| m.uid.clone()).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())),
			resource_version: Some(self.version.fetch_add(1, Ordering::SeqCst).wrapping_add(1)),
		}
	}

	fn check_failure(&self, name: Option<&str>) -> Result<(), StoreError> {
		if self.fail_all.load(Ordering::SeqCst) {
			return Err(StoreError::backend("injected store failure"));
		}
		if let Some(name) = name
			&& self.failing_names.read().contains(name)
		{
			return Err(StoreError::backend(format!("injected write failure for `{name}`")));
		}
		Ok(())
	}
}

/// Thread-safe in-memory store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
	inner: Arc<Inner>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes the store itself reject a second name for a routable address.
	pub fn enforce_unique_addresses(self, enforce: bool) -> Self {
		self.inner.unique_addresses.store(enforce, Ordering::SeqCst);
		self
	}

	/// Fails every subsequent call with a backend error.
	pub fn set_fail_all(&self, fail: bool) {
		self.inner.fail_all.store(fail, Ordering::SeqCst);
	}

	/// Fails writes (create/replace/delete) of the address or address space named `name`.
	pub fn fail_writes_for(&self, name: impl Into<String>) {
		self.inner.failing_names.write().insert(name.into());
	}

	pub fn clear_injected_failures(&self) {
		self.inner.fail_all.store(false, Ordering::SeqCst);
		self.inner.failing_names.write().clear();
	}

	/// Calls made through [`AddressSpaceApi`] methods.
	pub fn space_calls(&self) -> usize {
		self.inner.space_calls.load(Ordering::SeqCst)
	}

	/// Calls made through [`AddressApi`] methods, across all address spaces.
	pub fn address_calls(&self) -> usize {
		self.inner.address_calls.load(Ordering::SeqCst)
	}

	pub fn total_calls(&self) -> usize {
		self.space_calls() + self.address_calls()
	}

	/// Stores an address space directly, bypassing counters and failure injection.
	pub fn seed_address_space(&self, space: AddressSpace) {
		let mut state = self.inner.state.write();
		state.addresses.entry(space.key()).or_default();
		state.spaces.insert(space.key(), space);
	}

	/// Stores an address directly, bypassing counters, failure injection and checks.
	pub fn seed_address(&self, address: Address) {
		let mut state = self.inner.state.write();
		state.addresses.entry(address.address_space_key()).or_default().insert(address.name.clone(), address);
	}

	/// Snapshot of the addresses stored for one address space.
	pub fn stored_addresses(&self, space: &AddressSpaceKey) -> Vec<Address> {
		self.inner.state.read().addresses.get(space).map(|m| m.values().cloned().collect()).unwrap_or_default()
	}

	fn count_space_call(&self) {
		self.inner.space_calls.fetch_add(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl AddressSpaceApi for MemoryStore {
	async fn list_address_spaces(&self, namespace: &str) -> Result<Vec<AddressSpace>, StoreError> {
		self.count_space_call();
		self.inner.check_failure(None)?;
		let state = self.inner.state.read();
		Ok(state.spaces.values().filter(|s| s.namespace == namespace).cloned().collect())
	}

	async fn get_address_space(&self, namespace: &str, name: &str) -> Result<Option<AddressSpace>, StoreError> {
		self.count_space_call();
		self.inner.check_failure(None)?;
		Ok(self.inner.state.read().spaces.get(&AddressSpaceKey::new(namespace, name)).cloned())
	}

	async fn create_address_space(&self, mut space: AddressSpace) -> Result<AddressSpace, StoreError> {
		self.count_space_call();
		self.inner.check_failure(Some(&space.name))?;
		let key = space.key();
		let mut state = self.inner.state.write();
		if state.spaces.contains_key(&key) {
			return Err(StoreError::AlreadyExists {
				kind: ResourceKind::AddressSpace,
				key: key.to_string(),
			});
		}
		space.server = self.inner.next_meta(None);
		state.addresses.entry(key.clone()).or_default();
		state.spaces.insert(key, space.clone());
		Ok(space)
	}

	async fn replace_address_space(&self, mut space: AddressSpace) -> Result<AddressSpace, StoreError> {
		self.count_space_call();
		self.inner.check_failure(Some(&space.name))?;
		let key = space.key();
		let mut state = self.inner.state.write();
		let Some(current) = state.spaces.get(&key) else {
			return Err(StoreError::NotFound {
				kind: ResourceKind::AddressSpace,
				key: key.to_string(),
			});
		};
		if current.same_spec(&space) {
			return Ok(current.clone());
		}
		space.server = self.inner.next_meta(Some(&current.server));
		state.spaces.insert(key, space.clone());
		Ok(space)
	}

	async fn delete_address_space(&self, space: &AddressSpace) -> Result<(), StoreError> {
		self.count_space_call();
		self.inner.check_failure(Some(&space.name))?;
		let key = space.key();
		let mut state = self.inner.state.write();
		if state.spaces.remove(&key).is_none() {
			return Err(StoreError::NotFound {
				kind: ResourceKind::AddressSpace,
				key: key.to_string(),
			});
		}
		state.addresses.remove(&key);
		Ok(())
	}

	fn addresses(&self, space: &AddressSpace) -> Arc<dyn AddressApi> {
		Arc::new(MemoryAddressApi {
			inner: Arc::clone(&self.inner),
			space: space.key(),
		})
	}
}

struct MemoryAddressApi {
	inner: Arc<Inner>,
	space: AddressSpaceKey,
}

impl MemoryAddressApi {
	fn count_call(&self) {
		self.inner.address_calls.fetch_add(1, Ordering::SeqCst);
	}

	fn missing_space(&self) -> StoreError {
		StoreError::NotFound {
			kind: ResourceKind::AddressSpace,
			key: self.space.to_string(),
		}
	}

	fn check_unique(&self, existing: &BTreeMap<String, Address>, incoming: &Address) -> Result<(), StoreError> {
		if !self.inner.unique_addresses.load(Ordering::SeqCst) {
			return Ok(());
		}
		match existing.values().find(|e| e.address == incoming.address && e.name != incoming.name) {
			Some(holder) => Err(StoreError::Rejected {
				kind: ResourceKind::Address,
				key: incoming.name.clone(),
				reason: format!("address `{}` is held by `{}`", incoming.address, holder.name),
			}),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl AddressApi for MemoryAddressApi {
	async fn list_addresses(&self) -> Result<Vec<Address>, StoreError> {
		self.count_call();
		self.inner.check_failure(None)?;
		let state = self.inner.state.read();
		Ok(state.addresses.get(&self.space).map(|m| m.values().cloned().collect()).unwrap_or_default())
	}

	async fn get_address(&self, name: &str) -> Result<Option<Address>, StoreError> {
		self.count_call();
		self.inner.check_failure(None)?;
		Ok(self.inner.state.read().addresses.get(&self.space).and_then(|m| m.get(name)).cloned())
	}

	async fn create_address(&self, mut address: Address) -> Result<Address, StoreError> {
		self.count_call();
		self.inner.check_failure(Some(&address.name))?;
		let mut state = self.inner.state.write();
		let Some(existing) = state.addresses.get_mut(&self.space) else {
			return Err(self.missing_space());
		};
		if existing.contains_key(&address.name) {
			return Err(StoreError::AlreadyExists {
				kind: ResourceKind::Address,
				key: address.name,
			});
		}
		self.check_unique(existing, &address)?;
		address.server = self.inner.next_meta(None);
		existing.insert(address.name.clone(), address.clone());
		Ok(address)
	}

	async fn replace_address(&self, mut address: Address) -> Result<Address, StoreError> {
		self.count_call();
		self.inner.check_failure(Some(&address.name))?;
		let mut state = self.inner.state.write();
		let Some(existing) = state.addresses.get_mut(&self.space) else {
			return Err(self.missing_space());
		};
		let Some(current) = existing.get(&address.name) else {
			return Err(StoreError::NotFound {
				kind: ResourceKind::Address,
				key: address.name,
			});
		};
		if current.same_spec(&address) {
			return Ok(current.clone());
		}
		self.check_unique(existing, &address)?;
		address.server = self.inner.next_meta(existing.get(&address.name).map(|a| &a.server));
		existing.insert(address.name.clone(), address.clone());
		Ok(address)
	}

	async fn delete_address(&self, address: &Address) -> Result<(), StoreError> {
		self.count_call();
		self.inner.check_failure(Some(&address.name))?;
		let mut state = self.inner.state.write();
		let removed = state.addresses.get_mut(&self.space).and_then(|m| m.remove(&address.name));
		match removed {
			Some(_) => Ok(()),
			None => Err(StoreError::NotFound {
				kind: ResourceKind::Address,
				key: address.name.clone(),
			}),
		}
	}
}
