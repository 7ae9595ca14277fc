use addrctl_model::{ResourceKind, ResourceVerb, ValidationError};

/// Failure reported by a backing-store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("{kind} `{key}` already exists")]
	AlreadyExists { kind: ResourceKind, key: String },
	#[error("{kind} `{key}` does not exist")]
	NotFound { kind: ResourceKind, key: String },
	#[error("store rejected {kind} `{key}`: {reason}")]
	Rejected { kind: ResourceKind, key: String, reason: String },
	#[error("backing store failure: {0}")]
	Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
	pub fn backend(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
		Self::Backend(cause.into())
	}
}

/// Cross-object conflicts detected before writing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
	#[error("address `{address}` already exists with resource name `{existing}`")]
	RoutableAddress { address: String, existing: String, incoming: String },
	#[error("address `{address}` is defined in resource names `{first}` and `{second}`")]
	BatchRoutableAddress { address: String, first: String, second: String },
	#[error("{kind} `{name}` already exists")]
	DuplicateName { kind: ResourceKind, name: String },
	#[error("{kind} `{name}` appears more than once in the request")]
	BatchDuplicateName { kind: ResourceKind, name: String },
}

/// Coarse classification for mapping errors onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	NotFound,
	Validation,
	Conflict,
	Authorization,
	Adapter,
}

/// Error returned by every [`crate::ReconciliationHelper`] operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("{kind} `{name}` not found")]
	NotFound { kind: ResourceKind, name: String },
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Conflict(#[from] Conflict),
	#[error("not authorized to {verb} in namespace `{namespace}`")]
	Unauthorized { namespace: String, verb: ResourceVerb },
	#[error(transparent)]
	Store(#[from] StoreError),
}

impl ApiError {
	pub(crate) fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
		Self::NotFound { kind, name: name.into() }
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::NotFound { .. } => ErrorKind::NotFound,
			Self::Validation(_) => ErrorKind::Validation,
			Self::Conflict(_) => ErrorKind::Conflict,
			Self::Unauthorized { .. } => ErrorKind::Authorization,
			Self::Store(StoreError::AlreadyExists { .. } | StoreError::Rejected { .. }) => ErrorKind::Conflict,
			Self::Store(StoreError::NotFound { .. }) => ErrorKind::NotFound,
			Self::Store(StoreError::Backend(_)) => ErrorKind::Adapter,
		}
	}
}
