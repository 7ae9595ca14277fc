#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Declarative model for messaging address spaces and addresses.
//!
//! # Purpose
//!
//! Define the objects a tenant submits ([`AddressSpace`], [`Address`]), the
//! capability catalog they are checked against ([`Schema`]), and the pure
//! resolution rules ([`resolve`]) that decide whether a candidate fits the catalog.
//!
//! # Invariants
//!
//! * A [`Schema`] is never mutated after construction; updates build a new value.
//! * Resolution never looks beyond the schema it is handed: cross-object checks
//!   (routable-address collisions, duplicate names) belong to the caller that owns
//!   the full object set.

mod address;
mod address_space;
mod meta;
pub mod resolve;
mod schema;
mod verb;

pub use address::{Address, AddressKey};
pub use address_space::{AddressSpace, AddressSpaceKey, AuthenticationService, AuthenticationServiceType, CertSpec};
pub use meta::{ResourceKind, ServerMeta};
pub use resolve::{AddressResolver, AddressSpaceResolver, ValidationError, resolve_address_space_type};
pub use schema::{AddressSpaceType, AddressType, Plan, Schema, SchemaBuilder};
pub use verb::ResourceVerb;
