use serde::{Deserialize, Serialize};

use crate::ServerMeta;

/// Identity of an address space: unique name within a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressSpaceKey {
	pub namespace: String,
	pub name: String,
}

impl AddressSpaceKey {
	pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			name: name.into(),
		}
	}
}

impl std::fmt::Display for AddressSpaceKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.namespace, self.name)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationServiceType {
	#[default]
	None,
	Standard,
	External,
}

/// Reference to the service that authenticates messaging clients of an address space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticationService {
	#[serde(rename = "type", default)]
	pub kind: AuthenticationServiceType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub host: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub port: Option<u16>,
}

/// How endpoint certificates of an address space are provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertSpec {
	pub provider: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secret_name: Option<String>,
}

/// Isolated messaging domain of a declared type and plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
	pub name: String,
	#[serde(default)]
	pub namespace: String,
	#[serde(rename = "type")]
	pub type_name: String,
	pub plan: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication_service: Option<AuthenticationService>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cert_spec: Option<CertSpec>,
	#[serde(flatten)]
	pub server: ServerMeta,
}

impl AddressSpace {
	pub fn new(namespace: impl Into<String>, name: impl Into<String>, type_name: impl Into<String>, plan: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			namespace: namespace.into(),
			type_name: type_name.into(),
			plan: plan.into(),
			authentication_service: None,
			cert_spec: None,
			server: ServerMeta::default(),
		}
	}

	pub fn with_authentication_service(mut self, service: AuthenticationService) -> Self {
		self.authentication_service = Some(service);
		self
	}

	pub fn with_cert_spec(mut self, cert_spec: CertSpec) -> Self {
		self.cert_spec = Some(cert_spec);
		self
	}

	pub fn key(&self) -> AddressSpaceKey {
		AddressSpaceKey::new(&self.namespace, &self.name)
	}

	/// Equality ignoring store-assigned fields.
	pub fn same_spec(&self, other: &Self) -> bool {
		self.name == other.name
			&& self.namespace == other.namespace
			&& self.type_name == other.type_name
			&& self.plan == other.plan
			&& self.authentication_service == other.authentication_service
			&& self.cert_spec == other.cert_spec
	}
}
