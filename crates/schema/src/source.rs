use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::SchemaResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaEventKind {
	Added,
	Modified,
	Deleted,
}

impl SchemaEventKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Added => "added",
			Self::Modified => "modified",
			Self::Deleted => "deleted",
		}
	}
}

/// Change notification for one schema resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEvent {
	pub kind: SchemaEventKind,
	pub name: String,
}

/// Subscription to schema change notifications. The stream ending means the
/// watch disconnected; events may have been dropped.
pub type SchemaWatch = mpsc::Receiver<SchemaEvent>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
	#[error("schema source unavailable: {reason}")]
	Unavailable { reason: String },
}

impl SourceError {
	pub fn unavailable(reason: impl Into<String>) -> Self {
		Self::Unavailable { reason: reason.into() }
	}
}

/// Read access to the schema resources held by the backing store.
#[async_trait]
pub trait SchemaSource: Send + Sync + 'static {
	/// Lists every schema resource.
	async fn list(&self) -> Result<Vec<SchemaResource>, SourceError>;

	/// Opens a change-notification subscription.
	async fn watch(&self) -> Result<SchemaWatch, SourceError>;
}
