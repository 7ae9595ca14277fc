use serde::{Deserialize, Serialize};

use crate::{AddressSpaceKey, ServerMeta};

/// Identity of an address: unique name within one address space of a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressKey {
	pub namespace: String,
	pub address_space: String,
	pub name: String,
}

impl std::fmt::Display for AddressKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}/{}", self.namespace, self.address_space, self.name)
	}
}

/// Routable endpoint (queue, topic, ...) inside one address space.
///
/// `name` is the resource identity; `address` is the routable string messaging
/// clients use. Two addresses of one address space may not share `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	pub name: String,
	#[serde(default)]
	pub namespace: String,
	#[serde(default)]
	pub address_space: String,
	pub address: String,
	#[serde(rename = "type")]
	pub type_name: String,
	pub plan: String,
	#[serde(flatten)]
	pub server: ServerMeta,
}

impl Address {
	pub fn new(namespace: impl Into<String>, address_space: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			namespace: namespace.into(),
			address_space: address_space.into(),
			address: String::new(),
			type_name: String::new(),
			plan: String::new(),
			server: ServerMeta::default(),
		}
	}

	pub fn with_address(mut self, address: impl Into<String>) -> Self {
		self.address = address.into();
		self
	}

	pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
		self.type_name = type_name.into();
		self
	}

	pub fn with_plan(mut self, plan: impl Into<String>) -> Self {
		self.plan = plan.into();
		self
	}

	pub fn key(&self) -> AddressKey {
		AddressKey {
			namespace: self.namespace.clone(),
			address_space: self.address_space.clone(),
			name: self.name.clone(),
		}
	}

	pub fn address_space_key(&self) -> AddressSpaceKey {
		AddressSpaceKey::new(&self.namespace, &self.address_space)
	}

	/// Equality ignoring store-assigned fields.
	pub fn same_spec(&self, other: &Self) -> bool {
		self.name == other.name
			&& self.namespace == other.namespace
			&& self.address_space == other.address_space
			&& self.address == other.address
			&& self.type_name == other.type_name
			&& self.plan == other.plan
	}
}
