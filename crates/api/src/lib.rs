#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Admission and reconciliation of address spaces and addresses.
//!
//! # Purpose
//!
//! Decide whether a caller's request for an address or address space may be
//! written to the backing store, and write it. Requests are checked for
//! authorization, validated against the current capability schema, and scanned
//! for cross-object conflicts before any write.
//!
//! # Mental model
//!
//! * [`AddressSpaceApi`] / [`AddressApi`]: the backing store. Per-key consistency,
//!   no cross-key transactions.
//! * [`Authorizer`]: one boolean question per (caller, namespace, verb).
//! * [`ReconciliationHelper`]: the operations the transport layer exposes.
//! * [`Controller`]: wires the schema cache and its synchronizer to the helper.
//!
//! # Failure modes & recovery
//!
//! Every operation returns an [`ApiError`]; [`ApiError::kind`] gives the coarse
//! class a transport maps to a status code. Nothing here retries: store failures
//! surface as-is.

mod auth;
pub mod conflict;
mod controller;
mod error;
mod helper;
pub mod memory;
mod options;
mod store;

pub use auth::{AllowAll, Authorizer, Caller, RbacAuthorizer, role_for};
pub use controller::Controller;
pub use error::{ApiError, Conflict, ErrorKind, StoreError};
pub use helper::ReconciliationHelper;
pub use options::{OptionsError, ServerOptions};
pub use store::{AddressApi, AddressSpaceApi};
