use serde::{Deserialize, Serialize};

/// Object kinds managed by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
	AddressSpace,
	Address,
}

impl ResourceKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AddressSpace => "address space",
			Self::Address => "address",
		}
	}
}

impl std::fmt::Display for ResourceKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Fields owned by the backing store, never by the submitter.
///
/// Excluded from [`crate::Address::same_spec`] and [`crate::AddressSpace::same_spec`]
/// so that a stored object still compares equal to the payload that created it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMeta {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uid: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resource_version: Option<u64>,
}

impl ServerMeta {
	pub fn is_empty(&self) -> bool {
		self.uid.is_none() && self.resource_version.is_none()
	}
}
