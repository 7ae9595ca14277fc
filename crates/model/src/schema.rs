//! Capability catalog: address-space types, their address types, and plans.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Named resource tier. Everything beyond the name is opaque to admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub resources: BTreeMap<String, f64>,
}

impl Plan {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: None,
			resources: BTreeMap::new(),
		}
	}

	pub fn with_resource(mut self, key: impl Into<String>, amount: f64) -> Self {
		self.resources.insert(key.into(), amount);
		self
	}
}

/// Kind of address (queue, topic, anycast, ...) allowed inside an address-space type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressType {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub plans: IndexMap<String, Plan>,
}

impl AddressType {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: None,
			plans: IndexMap::new(),
		}
	}

	pub fn with_plan(mut self, plan: Plan) -> Self {
		self.plans.insert(plan.name.clone(), plan);
		self
	}

	pub fn find_plan(&self, name: &str) -> Option<&Plan> {
		self.plans.get(name)
	}
}

/// One address-space type with its allowed address types and plans, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSpaceType {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default)]
	pub address_types: IndexMap<String, AddressType>,
	#[serde(default)]
	pub plans: IndexMap<String, Plan>,
}

impl AddressSpaceType {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: None,
			address_types: IndexMap::new(),
			plans: IndexMap::new(),
		}
	}

	pub fn with_address_type(mut self, address_type: AddressType) -> Self {
		self.address_types.insert(address_type.name.clone(), address_type);
		self
	}

	pub fn with_plan(mut self, plan: Plan) -> Self {
		self.plans.insert(plan.name.clone(), plan);
		self
	}

	pub fn find_address_type(&self, name: &str) -> Option<&AddressType> {
		self.address_types.get(name)
	}

	pub fn find_plan(&self, name: &str) -> Option<&Plan> {
		self.plans.get(name)
	}
}

/// Immutable catalog keyed by address-space type name.
///
/// The default value is the empty schema, which is what readers observe before
/// the first catalog has been loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
	types: IndexMap<String, AddressSpaceType>,
}

impl Schema {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn builder() -> SchemaBuilder {
		SchemaBuilder::default()
	}

	pub fn find_address_space_type(&self, name: &str) -> Option<&AddressSpaceType> {
		self.types.get(name)
	}

	pub fn address_space_types(&self) -> impl Iterator<Item = &AddressSpaceType> {
		self.types.values()
	}

	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}

/// Accumulates address-space types into a [`Schema`].
///
/// The first definition of a name wins; later duplicates are handed back to the
/// caller so it can report them.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
	types: IndexMap<String, AddressSpaceType>,
}

impl SchemaBuilder {
	pub fn push(&mut self, space_type: AddressSpaceType) -> Result<(), AddressSpaceType> {
		if self.types.contains_key(&space_type.name) {
			return Err(space_type);
		}
		self.types.insert(space_type.name.clone(), space_type);
		Ok(())
	}

	/// Chaining form of [`Self::push`]. A duplicate name is discarded; use `push`
	/// when the duplicate needs reporting.
	pub fn with(mut self, space_type: AddressSpaceType) -> Self {
		if let Err(duplicate) = self.push(space_type) {
			tracing::debug!(name = %duplicate.name, "schema.builder.duplicate_discarded");
		}
		self
	}

	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	pub fn build(self) -> Schema {
		Schema { types: self.types }
	}
}
