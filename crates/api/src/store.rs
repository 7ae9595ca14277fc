//! Contracts of the backing store holding address spaces and addresses.
//!
//! The store keeps each object consistent per key but offers no cross-key
//! transactions. Deleting an address space removes its addresses as part of the
//! store's own contract.

use std::sync::Arc;

use addrctl_model::{Address, AddressSpace};
use async_trait::async_trait;

use crate::StoreError;

/// Namespace-scoped access to address spaces.
#[async_trait]
pub trait AddressSpaceApi: Send + Sync + 'static {
	async fn list_address_spaces(&self, namespace: &str) -> Result<Vec<AddressSpace>, StoreError>;

	async fn get_address_space(&self, namespace: &str, name: &str) -> Result<Option<AddressSpace>, StoreError>;

	/// Fails with [`StoreError::AlreadyExists`] if the key is taken.
	async fn create_address_space(&self, space: AddressSpace) -> Result<AddressSpace, StoreError>;

	/// Fails with [`StoreError::NotFound`] if the key is absent.
	async fn replace_address_space(&self, space: AddressSpace) -> Result<AddressSpace, StoreError>;

	async fn delete_address_space(&self, space: &AddressSpace) -> Result<(), StoreError>;

	/// Address access scoped to one address space.
	fn addresses(&self, space: &AddressSpace) -> Arc<dyn AddressApi>;
}

/// Access to the addresses of one address space.
#[async_trait]
pub trait AddressApi: Send + Sync {
	async fn list_addresses(&self) -> Result<Vec<Address>, StoreError>;

	async fn get_address(&self, name: &str) -> Result<Option<Address>, StoreError>;

	/// Fails with [`StoreError::AlreadyExists`] if the name is taken.
	async fn create_address(&self, address: Address) -> Result<Address, StoreError>;

	/// Fails with [`StoreError::NotFound`] if the name is absent.
	async fn replace_address(&self, address: Address) -> Result<Address, StoreError>;

	async fn delete_address(&self, address: &Address) -> Result<(), StoreError>;
}
