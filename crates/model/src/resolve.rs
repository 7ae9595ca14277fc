//! Schema resolution and structural validation.
//!
//! # Purpose
//!
//! Decide whether a candidate [`AddressSpace`] or [`Address`] fits a given [`Schema`].
//!
//! # Mental model
//!
//! * Callers pin one schema snapshot per request and hand it in by reference.
//! * Every function here is pure: the same schema and candidate always produce the
//!   same verdict, whatever happens to the published schema meanwhile.
//!
//! # Invariants
//!
//! * An accepted address space names a type present in the schema and a plan of that type.
//! * An accepted address names an address type of its owning address-space type and a
//!   plan of that address type.
//! * Cross-object uniqueness is not checked here.

use crate::{Address, AddressSpace, AddressSpaceType, AddressType, ResourceKind, Schema};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("{kind} is missing required field `{field}`")]
	MissingField { kind: ResourceKind, field: &'static str },
	#[error("unknown address space type `{type_name}`")]
	UnknownAddressSpaceType { type_name: String },
	#[error("plan `{plan}` is not defined for address space type `{type_name}`")]
	UnknownAddressSpacePlan { type_name: String, plan: String },
	#[error("address type `{type_name}` is not allowed in address space type `{space_type}`")]
	UnknownAddressType { space_type: String, type_name: String },
	#[error("plan `{plan}` is not defined for address type `{type_name}`")]
	UnknownAddressPlan { type_name: String, plan: String },
	#[error("address `{name}` belongs to address space `{actual}`, not `{expected}`")]
	WrongAddressSpace { name: String, expected: String, actual: String },
	#[error("address `{name}` belongs to namespace `{actual}`, not `{expected}`")]
	WrongNamespace { name: String, expected: String, actual: String },
}

/// Looks up an address-space type by name.
pub fn resolve_address_space_type<'s>(schema: &'s Schema, type_name: &str) -> Option<&'s AddressSpaceType> {
	schema.find_address_space_type(type_name)
}

fn require(kind: ResourceKind, field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::MissingField { kind, field });
	}
	Ok(())
}

/// Validates address spaces against one schema snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AddressSpaceResolver<'s> {
	schema: &'s Schema,
}

impl<'s> AddressSpaceResolver<'s> {
	pub fn new(schema: &'s Schema) -> Self {
		Self { schema }
	}

	/// Resolves the type of `space`, failing if the schema does not define it.
	pub fn resolve_type(&self, space: &AddressSpace) -> Result<&'s AddressSpaceType, ValidationError> {
		resolve_address_space_type(self.schema, &space.type_name).ok_or_else(|| ValidationError::UnknownAddressSpaceType {
			type_name: space.type_name.clone(),
		})
	}

	/// Checks required fields, type, and plan. Returns the resolved type on success.
	pub fn validate(&self, space: &AddressSpace) -> Result<&'s AddressSpaceType, ValidationError> {
		let kind = ResourceKind::AddressSpace;
		require(kind, "name", &space.name)?;
		require(kind, "namespace", &space.namespace)?;
		require(kind, "type", &space.type_name)?;
		require(kind, "plan", &space.plan)?;
		if let Some(cert) = &space.cert_spec {
			require(kind, "certSpec.provider", &cert.provider)?;
		}

		let space_type = self.resolve_type(space)?;
		if space_type.find_plan(&space.plan).is_none() {
			return Err(ValidationError::UnknownAddressSpacePlan {
				type_name: space_type.name.clone(),
				plan: space.plan.clone(),
			});
		}
		Ok(space_type)
	}
}

/// Validates addresses against the type of their owning address space.
#[derive(Debug, Clone, Copy)]
pub struct AddressResolver<'s> {
	space_type: &'s AddressSpaceType,
}

impl<'s> AddressResolver<'s> {
	pub fn new(space_type: &'s AddressSpaceType) -> Self {
		Self { space_type }
	}

	/// Resolves the owning address space's type in `schema` and builds a resolver for it.
	pub fn for_address_space(schema: &'s Schema, space: &AddressSpace) -> Result<Self, ValidationError> {
		AddressSpaceResolver::new(schema).resolve_type(space).map(Self::new)
	}

	pub fn space_type(&self) -> &'s AddressSpaceType {
		self.space_type
	}

	/// Checks required fields, address type, and plan. Returns the resolved address type.
	pub fn validate(&self, address: &Address) -> Result<&'s AddressType, ValidationError> {
		let kind = ResourceKind::Address;
		require(kind, "name", &address.name)?;
		require(kind, "address", &address.address)?;
		require(kind, "type", &address.type_name)?;
		require(kind, "plan", &address.plan)?;

		let address_type = self
			.space_type
			.find_address_type(&address.type_name)
			.ok_or_else(|| ValidationError::UnknownAddressType {
				space_type: self.space_type.name.clone(),
				type_name: address.type_name.clone(),
			})?;
		if address_type.find_plan(&address.plan).is_none() {
			return Err(ValidationError::UnknownAddressPlan {
				type_name: address_type.name.clone(),
				plan: address.plan.clone(),
			});
		}
		Ok(address_type)
	}

	/// Like [`Self::validate`], additionally requiring the address to reference `space`
	/// and share its namespace.
	pub fn validate_in(&self, space: &AddressSpace, address: &Address) -> Result<&'s AddressType, ValidationError> {
		let address_type = self.validate(address)?;
		if address.namespace != space.namespace {
			return Err(ValidationError::WrongNamespace {
				name: address.name.clone(),
				expected: space.namespace.clone(),
				actual: address.namespace.clone(),
			});
		}
		if address.address_space != space.name {
			return Err(ValidationError::WrongAddressSpace {
				name: address.name.clone(),
				expected: space.name.clone(),
				actual: address.address_space.clone(),
			});
		}
		Ok(address_type)
	}
}
