use serde::{Deserialize, Serialize};

/// Operations a caller may be authorized for within a namespace.
///
/// `Create` covers both creation and full replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceVerb {
	Get,
	List,
	Create,
	Delete,
}

impl ResourceVerb {
	pub const ALL: [ResourceVerb; 4] = [Self::Get, Self::List, Self::Create, Self::Delete];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "get",
			Self::List => "list",
			Self::Create => "create",
			Self::Delete => "delete",
		}
	}
}

impl std::fmt::Display for ResourceVerb {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
