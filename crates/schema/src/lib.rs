#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Capability schema cache.
//!
//! # Purpose
//!
//! Keep an always-readable, eventually consistent copy of the capability schema
//! that request handlers validate against.
//!
//! # Mental model
//!
//! * [`SchemaStore`] owns the write side and publishes whole [`addrctl_model::Schema`]
//!   values; [`SchemaReader`] handles are what request paths get.
//! * [`SchemaSynchronizer`] is the only writer. Two independent producers feed its
//!   single [`SchemaSynchronizer::refresh`] entry point: the watch loop (one refresh
//!   per change notification, reconnecting with backoff) and the resync loop (one
//!   refresh per interval tick).
//! * [`parse::parse_schema`] turns the external representation into a schema and
//!   reports, but never propagates, malformed entries.
//!
//! # Failure modes & recovery
//!
//! * A malformed entry is skipped; the remaining entries are still installed.
//! * A failed listing leaves the previous snapshot in place.
//! * A dropped watch is retried forever with exponential backoff; events missed in
//!   the gap are recovered by the relist after reconnecting and by the resync tick.

pub mod memory;
pub mod parse;
mod source;
mod store;
mod sync;

pub use parse::{ParseError, ParsedSchema, SchemaResource, SkippedEntry, parse_schema};
pub use source::{SchemaEvent, SchemaEventKind, SchemaSource, SchemaWatch, SourceError};
pub use store::{SchemaReader, SchemaSnapshot, SchemaStore};
pub use sync::{RefreshReport, SchemaSynchronizer, SyncOptions, SynchronizerHandle, Trigger};
