//! Address-space operations. Unlike address listing, a denied address-space
//! listing is an error: the whole result lives in one namespace.

use addrctl_model::{AddressSpace, AddressSpaceResolver, ResourceKind, ResourceVerb};

use super::{ReconciliationHelper, logged};
use crate::{ApiError, Caller, Conflict};

impl ReconciliationHelper {
	pub async fn list_address_spaces(&self, caller: &Caller, namespace: &str) -> Result<Vec<AddressSpace>, ApiError> {
		let result = match self.authorize(caller, namespace, ResourceVerb::List) {
			Ok(()) => self.spaces.list_address_spaces(namespace).await.map_err(ApiError::from),
			Err(error) => Err(error),
		};
		logged("list_address_spaces", namespace, result)
	}

	pub async fn get_address_space(&self, caller: &Caller, namespace: &str, name: &str) -> Result<AddressSpace, ApiError> {
		let result = match self.authorize(caller, namespace, ResourceVerb::Get) {
			Ok(()) => self.require_space(namespace, name).await,
			Err(error) => Err(error),
		};
		logged("get_address_space", namespace, result)
	}

	pub async fn create_address_space(&self, caller: &Caller, space: AddressSpace) -> Result<AddressSpace, ApiError> {
		let namespace = space.namespace.clone();
		logged("create_address_space", &namespace, self.create_address_space_inner(caller, space).await)
	}

	/// Replaces an existing address space. Its addresses are left untouched.
	pub async fn replace_address_space(&self, caller: &Caller, space: AddressSpace) -> Result<AddressSpace, ApiError> {
		let namespace = space.namespace.clone();
		logged("replace_address_space", &namespace, self.replace_address_space_inner(caller, space).await)
	}

	/// Deletes an address space. The store removes its addresses along with it.
	pub async fn delete_address_space(&self, caller: &Caller, namespace: &str, name: &str) -> Result<(), ApiError> {
		logged("delete_address_space", namespace, self.delete_address_space_inner(caller, namespace, name).await)
	}

	async fn create_address_space_inner(&self, caller: &Caller, space: AddressSpace) -> Result<AddressSpace, ApiError> {
		self.authorize(caller, &space.namespace, ResourceVerb::Create)?;
		AddressSpaceResolver::new(&self.schema.current_schema()).validate(&space)?;
		if self.spaces.get_address_space(&space.namespace, &space.name).await?.is_some() {
			return Err(Conflict::DuplicateName {
				kind: ResourceKind::AddressSpace,
				name: space.name,
			}
			.into());
		}
		let created = self.spaces.create_address_space(space).await?;
		tracing::debug!(namespace = %created.namespace, name = %created.name, "api.address_space.created");
		Ok(created)
	}

	async fn replace_address_space_inner(&self, caller: &Caller, space: AddressSpace) -> Result<AddressSpace, ApiError> {
		self.authorize(caller, &space.namespace, ResourceVerb::Create)?;
		AddressSpaceResolver::new(&self.schema.current_schema()).validate(&space)?;
		self.require_space(&space.namespace, &space.name).await?;
		let replaced = self.spaces.replace_address_space(space).await?;
		tracing::debug!(namespace = %replaced.namespace, name = %replaced.name, "api.address_space.replaced");
		Ok(replaced)
	}

	async fn delete_address_space_inner(&self, caller: &Caller, namespace: &str, name: &str) -> Result<(), ApiError> {
		self.authorize(caller, namespace, ResourceVerb::Delete)?;
		let space = self.require_space(namespace, name).await?;
		self.spaces.delete_address_space(&space).await?;
		tracing::debug!(namespace, name, "api.address_space.deleted");
		Ok(())
	}
}
