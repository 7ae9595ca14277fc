//! Request-path operations over addresses and address spaces.
//!
//! # Mental model
//!
//! Every operation runs the same pipeline, stopping at the first failure:
//!
//! 1. Authorize the caller for the verb on the target namespace. Nothing touches
//!    the store before this passes.
//! 2. Resolve the owning address space through the store.
//! 3. Validate against one schema snapshot taken for the whole request.
//! 4. Scan the current address set for name and routable-address conflicts.
//! 5. Write through the store.
//!
//! # Invariants
//!
//! * A batch that conflicts with itself is rejected before any write.
//! * Conflict scanning is read-then-write. Without uniqueness enforced by the
//!   store, two concurrent creates of one routable address can both succeed.
//! * [`ReconciliationHelper::put_addresses`] is not atomic: on a store failure it
//!   keeps applying the remaining steps and reports the first failure at the end.

mod address_space;

use std::collections::BTreeMap;
use std::sync::Arc;

use addrctl_model::{Address, AddressResolver, AddressSpace, AddressSpaceKey, ResourceKind, ResourceVerb, Schema, ValidationError};
use addrctl_schema::SchemaReader;

use crate::{AddressApi, AddressSpaceApi, ApiError, Authorizer, Caller, Conflict, conflict};

/// Admission and reconciliation entry point handed to the transport layer.
#[derive(Clone)]
pub struct ReconciliationHelper {
	spaces: Arc<dyn AddressSpaceApi>,
	schema: SchemaReader,
	authorizer: Arc<dyn Authorizer>,
}

impl ReconciliationHelper {
	pub fn new(spaces: Arc<dyn AddressSpaceApi>, schema: SchemaReader, authorizer: Arc<dyn Authorizer>) -> Self {
		Self { spaces, schema, authorizer }
	}

	pub fn schema(&self) -> &SchemaReader {
		&self.schema
	}

	/// Addresses of every address space in `namespace` the caller may list.
	///
	/// A denied listing yields an empty result, never an error.
	pub async fn list_addresses(&self, caller: &Caller, namespace: &str) -> Result<Vec<Address>, ApiError> {
		if !self.permitted(caller, namespace, ResourceVerb::List) {
			tracing::debug!(caller = %caller.name, namespace, "api.list.filtered");
			return Ok(Vec::new());
		}
		logged("list_addresses", namespace, self.collect_addresses(namespace).await)
	}

	/// First address named `name` across the address spaces of `namespace`.
	pub async fn get_address(&self, caller: &Caller, namespace: &str, name: &str) -> Result<Address, ApiError> {
		logged("get_address", namespace, self.get_address_inner(caller, namespace, name).await)
	}

	pub async fn create_address(&self, caller: &Caller, address: Address) -> Result<Address, ApiError> {
		let namespace = address.namespace.clone();
		logged("create_address", &namespace, self.create_address_inner(caller, address).await)
	}

	/// Replaces an existing address. Replacing with an identical payload is a no-op.
	pub async fn replace_address(&self, caller: &Caller, address: Address) -> Result<Address, ApiError> {
		let namespace = address.namespace.clone();
		logged("replace_address", &namespace, self.replace_address_inner(caller, address).await)
	}

	/// Deletes the first address named `name` in `namespace` and returns what
	/// remains in its address space.
	pub async fn delete_address(&self, caller: &Caller, namespace: &str, name: &str) -> Result<Vec<Address>, ApiError> {
		logged("delete_address", namespace, self.delete_address_inner(caller, namespace, name).await)
	}

	/// Makes the address set of one address space equal to `desired`.
	///
	/// Addresses whose name is absent from `desired` are deleted first, then each
	/// desired address is created or replaced. Unchanged addresses are left alone.
	/// Returns the resulting listing.
	pub async fn put_addresses(&self, caller: &Caller, space_key: &AddressSpaceKey, desired: Vec<Address>) -> Result<Vec<Address>, ApiError> {
		logged("put_addresses", &space_key.namespace, self.put_addresses_inner(caller, space_key, desired).await)
	}

	/// Creates a batch spanning any number of address spaces.
	///
	/// Each address must name its address space. The batch is grouped by address
	/// space and every group is checked in full before its first write. Returns the
	/// created objects.
	pub async fn append_addresses(&self, caller: &Caller, addresses: Vec<Address>) -> Result<Vec<Address>, ApiError> {
		let mut groups: BTreeMap<AddressSpaceKey, Vec<Address>> = BTreeMap::new();
		for address in addresses {
			if address.address_space.is_empty() {
				let error = ApiError::from(ValidationError::MissingField {
					kind: ResourceKind::Address,
					field: "addressSpace",
				});
				return logged("append_addresses", &address.namespace, Err(error));
			}
			groups.entry(address.address_space_key()).or_default().push(address);
		}

		let mut created = Vec::new();
		for (key, batch) in groups {
			let result = self.append_group(caller, &key, batch).await;
			created.extend(logged("append_addresses", &key.namespace, result)?.1);
		}
		Ok(created)
	}

	/// Creates a batch in one address space and returns its resulting listing.
	///
	/// Addresses with an empty namespace or address-space reference adopt `space_key`.
	pub async fn append_addresses_to(&self, caller: &Caller, space_key: &AddressSpaceKey, addresses: Vec<Address>) -> Result<Vec<Address>, ApiError> {
		let result = match self.append_group(caller, space_key, addresses).await {
			Ok((api, _)) => api.list_addresses().await.map_err(ApiError::from),
			Err(error) => Err(error),
		};
		logged("append_addresses_to", &space_key.namespace, result)
	}

	async fn collect_addresses(&self, namespace: &str) -> Result<Vec<Address>, ApiError> {
		let mut out = Vec::new();
		for space in self.spaces.list_address_spaces(namespace).await? {
			out.extend(self.spaces.addresses(&space).list_addresses().await?);
		}
		Ok(out)
	}

	async fn get_address_inner(&self, caller: &Caller, namespace: &str, name: &str) -> Result<Address, ApiError> {
		self.authorize(caller, namespace, ResourceVerb::Get)?;
		match self.locate(namespace, name).await? {
			Some((_, address)) => Ok(address),
			None => Err(ApiError::not_found(ResourceKind::Address, name)),
		}
	}

	async fn create_address_inner(&self, caller: &Caller, address: Address) -> Result<Address, ApiError> {
		self.authorize(caller, &address.namespace, ResourceVerb::Create)?;
		let (space, api) = self.owning_space(&address).await?;
		let schema = self.schema.current_schema();
		validate_address(&schema, &space, &address)?;

		let existing = api.list_addresses().await?;
		if existing.iter().any(|e| e.name == address.name) {
			return Err(Conflict::DuplicateName {
				kind: ResourceKind::Address,
				name: address.name,
			}
			.into());
		}
		conflict::check_against(&existing, &address)?;

		let created = api.create_address(address).await?;
		tracing::debug!(namespace = %created.namespace, space = %created.address_space, name = %created.name, "api.address.created");
		Ok(created)
	}

	async fn replace_address_inner(&self, caller: &Caller, address: Address) -> Result<Address, ApiError> {
		self.authorize(caller, &address.namespace, ResourceVerb::Create)?;
		let (space, api) = self.owning_space(&address).await?;
		let schema = self.schema.current_schema();
		validate_address(&schema, &space, &address)?;

		let existing = api.list_addresses().await?;
		if !existing.iter().any(|e| e.name == address.name) {
			return Err(ApiError::not_found(ResourceKind::Address, address.name));
		}
		conflict::check_against(&existing, &address)?;

		let replaced = api.replace_address(address).await?;
		tracing::debug!(namespace = %replaced.namespace, space = %replaced.address_space, name = %replaced.name, "api.address.replaced");
		Ok(replaced)
	}

	async fn delete_address_inner(&self, caller: &Caller, namespace: &str, name: &str) -> Result<Vec<Address>, ApiError> {
		self.authorize(caller, namespace, ResourceVerb::Delete)?;
		let Some((api, address)) = self.locate(namespace, name).await? else {
			return Err(ApiError::not_found(ResourceKind::Address, name));
		};
		api.delete_address(&address).await?;
		tracing::debug!(namespace, space = %address.address_space, name, "api.address.deleted");
		Ok(api.list_addresses().await?)
	}

	async fn put_addresses_inner(&self, caller: &Caller, space_key: &AddressSpaceKey, desired: Vec<Address>) -> Result<Vec<Address>, ApiError> {
		self.authorize(caller, &space_key.namespace, ResourceVerb::Create)?;
		let space = self.require_space(&space_key.namespace, &space_key.name).await?;
		let desired = adopt(&space, desired);
		let schema = self.schema.current_schema();
		for address in &desired {
			validate_address(&schema, &space, address)?;
		}

		let api = self.spaces.addresses(&space);
		let existing = api.list_addresses().await?;
		conflict::check_all(&existing, &desired)?;
		let stale: Vec<&Address> = existing.iter().filter(|e| !desired.iter().any(|d| d.name == e.name)).collect();
		if !stale.is_empty() {
			self.authorize(caller, &space_key.namespace, ResourceVerb::Delete)?;
		}

		let mut first_error: Option<ApiError> = None;
		for address in stale {
			if let Err(error) = api.delete_address(address).await {
				record_step_failure(space_key, &mut first_error, error.into());
			}
		}
		for address in desired {
			let step = match existing.iter().find(|e| e.name == address.name) {
				Some(current) if current.same_spec(&address) => continue,
				Some(_) => api.replace_address(address).await,
				None => api.create_address(address).await,
			};
			if let Err(error) = step {
				record_step_failure(space_key, &mut first_error, error.into());
			}
		}
		if let Some(error) = first_error {
			return Err(error);
		}
		tracing::debug!(namespace = %space_key.namespace, space = %space_key.name, "api.put.applied");
		Ok(api.list_addresses().await?)
	}

	async fn append_group(&self, caller: &Caller, space_key: &AddressSpaceKey, batch: Vec<Address>) -> Result<(Arc<dyn AddressApi>, Vec<Address>), ApiError> {
		self.authorize(caller, &space_key.namespace, ResourceVerb::Create)?;
		let space = self.require_space(&space_key.namespace, &space_key.name).await?;
		let batch = adopt(&space, batch);
		let schema = self.schema.current_schema();
		for address in &batch {
			validate_address(&schema, &space, address)?;
		}

		let api = self.spaces.addresses(&space);
		let existing = api.list_addresses().await?;
		if let Some(taken) = batch.iter().find(|a| existing.iter().any(|e| e.name == a.name)) {
			return Err(Conflict::DuplicateName {
				kind: ResourceKind::Address,
				name: taken.name.clone(),
			}
			.into());
		}
		conflict::check_all(&existing, &batch)?;

		let mut created = Vec::with_capacity(batch.len());
		for address in batch {
			created.push(api.create_address(address).await?);
		}
		tracing::debug!(namespace = %space_key.namespace, space = %space_key.name, count = created.len(), "api.append.applied");
		Ok((api, created))
	}

	fn permitted(&self, caller: &Caller, namespace: &str, verb: ResourceVerb) -> bool {
		self.authorizer.is_permitted(caller, namespace, verb)
	}

	fn authorize(&self, caller: &Caller, namespace: &str, verb: ResourceVerb) -> Result<(), ApiError> {
		if self.permitted(caller, namespace, verb) {
			return Ok(());
		}
		Err(ApiError::Unauthorized {
			namespace: namespace.to_owned(),
			verb,
		})
	}

	async fn require_space(&self, namespace: &str, name: &str) -> Result<AddressSpace, ApiError> {
		self.spaces
			.get_address_space(namespace, name)
			.await?
			.ok_or_else(|| ApiError::not_found(ResourceKind::AddressSpace, name))
	}

	async fn owning_space(&self, address: &Address) -> Result<(AddressSpace, Arc<dyn AddressApi>), ApiError> {
		if address.address_space.is_empty() {
			return Err(ValidationError::MissingField {
				kind: ResourceKind::Address,
				field: "addressSpace",
			}
			.into());
		}
		let space = self.require_space(&address.namespace, &address.address_space).await?;
		let api = self.spaces.addresses(&space);
		Ok((space, api))
	}

	/// Scans address spaces in listing order; first match wins.
	async fn locate(&self, namespace: &str, name: &str) -> Result<Option<(Arc<dyn AddressApi>, Address)>, ApiError> {
		for space in self.spaces.list_address_spaces(namespace).await? {
			let api = self.spaces.addresses(&space);
			if let Some(address) = api.get_address(name).await? {
				return Ok(Some((api, address)));
			}
		}
		Ok(None)
	}
}

fn validate_address(schema: &Schema, space: &AddressSpace, address: &Address) -> Result<(), ValidationError> {
	AddressResolver::for_address_space(schema, space)?.validate_in(space, address).map(|_| ())
}

/// Fills in empty owner references from `space`.
fn adopt(space: &AddressSpace, batch: Vec<Address>) -> Vec<Address> {
	batch
		.into_iter()
		.map(|mut address| {
			if address.namespace.is_empty() {
				address.namespace.clone_from(&space.namespace);
			}
			if address.address_space.is_empty() {
				address.address_space.clone_from(&space.name);
			}
			address
		})
		.collect()
}

fn record_step_failure(space_key: &AddressSpaceKey, first_error: &mut Option<ApiError>, error: ApiError) {
	tracing::warn!(namespace = %space_key.namespace, space = %space_key.name, %error, "api.put.step_failed");
	if first_error.is_none() {
		*first_error = Some(error);
	}
}

fn logged<T>(operation: &'static str, namespace: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
	if let Err(error) = &result {
		tracing::warn!(operation, namespace, kind = ?error.kind(), %error, "api.request.failed");
	}
	result
}

#[cfg(test)]
mod tests;
