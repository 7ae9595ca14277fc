//! Routable-address collision scanning.
//!
//! # Role
//!
//! Two addresses of one address space collide when they share the routable
//! `address` string under different resource names. Scans run against a listing
//! taken just before the write; a concurrent writer can still slip in between,
//! so this is a best-effort guard unless the store enforces uniqueness itself.

use addrctl_model::{Address, ResourceKind};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::Conflict;

/// Rejects a batch that repeats a name or maps one routable address to two names.
pub fn check_batch(batch: &[Address]) -> Result<(), Conflict> {
	let mut names: FxHashSet<&str> = FxHashSet::default();
	let mut by_address: FxHashMap<&str, &str> = FxHashMap::default();
	for address in batch {
		if !names.insert(&address.name) {
			return Err(Conflict::BatchDuplicateName {
				kind: ResourceKind::Address,
				name: address.name.clone(),
			});
		}
		if let Some(first) = by_address.insert(&address.address, &address.name) {
			return Err(Conflict::BatchRoutableAddress {
				address: address.address.clone(),
				first: first.to_string(),
				second: address.name.clone(),
			});
		}
	}
	Ok(())
}

/// Rejects `incoming` if an existing address with another name holds its routable address.
pub fn check_against(existing: &[Address], incoming: &Address) -> Result<(), Conflict> {
	match existing.iter().find(|e| e.address == incoming.address && e.name != incoming.name) {
		Some(holder) => Err(Conflict::RoutableAddress {
			address: incoming.address.clone(),
			existing: holder.name.clone(),
			incoming: incoming.name.clone(),
		}),
		None => Ok(()),
	}
}

/// [`check_batch`] followed by [`check_against`] for every batch member.
pub fn check_all(existing: &[Address], batch: &[Address]) -> Result<(), Conflict> {
	check_batch(batch)?;
	batch.iter().try_for_each(|incoming| check_against(existing, incoming))
}
