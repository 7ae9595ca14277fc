//! External schema representation and its conversion into [`Schema`].
//!
//! Each address-space type is stored as one named resource whose `data` is a JSON
//! document:
//!
//! ```json
//! {
//!   "name": "standard",
//!   "description": "Router-based messaging",
//!   "plans": [{ "name": "small-plan", "resources": { "router": 1.0 } }],
//!   "addressTypes": [{ "name": "queue", "plans": [{ "name": "small-plan" }] }]
//! }
//! ```
//!
//! Conversion is pure. A bad resource becomes a [`SkippedEntry`] and never affects
//! the other resources.

use std::collections::BTreeMap;

use addrctl_model::{AddressSpaceType, AddressType, Plan, Schema};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One schema resource as held by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaResource {
	pub name: String,
	pub data: String,
}

impl SchemaResource {
	pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			data: data.into(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("invalid schema document: {0}")]
	Json(#[from] serde_json::Error),
	#[error("{what} has an empty name")]
	EmptyName { what: &'static str },
	#[error("resource `{resource}` declares address space type `{declared}`")]
	NameMismatch { resource: String, declared: String },
	#[error("{owner} declares plan `{plan}` more than once")]
	DuplicatePlan { owner: String, plan: String },
	#[error("address space type `{owner}` declares address type `{address_type}` more than once")]
	DuplicateAddressType { owner: String, address_type: String },
	#[error("address space type `{name}` is already defined by an earlier resource")]
	DuplicateType { name: String },
}

/// A resource left out of the installed schema, with the reason.
#[derive(Debug)]
pub struct SkippedEntry {
	pub resource: String,
	pub error: ParseError,
}

/// Result of converting a full listing.
#[derive(Debug, Default)]
pub struct ParsedSchema {
	pub schema: Schema,
	pub skipped: Vec<SkippedEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanDoc {
	name: String,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	resources: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressTypeDoc {
	name: String,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	plans: Vec<PlanDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressSpaceTypeDoc {
	name: String,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	plans: Vec<PlanDoc>,
	#[serde(default)]
	address_types: Vec<AddressTypeDoc>,
}

fn non_empty(what: &'static str, name: &str) -> Result<(), ParseError> {
	if name.trim().is_empty() {
		return Err(ParseError::EmptyName { what });
	}
	Ok(())
}

fn convert_plans(owner: &str, docs: Vec<PlanDoc>) -> Result<IndexMap<String, Plan>, ParseError> {
	let mut plans = IndexMap::with_capacity(docs.len());
	for doc in docs {
		non_empty("plan", &doc.name)?;
		if plans.contains_key(&doc.name) {
			return Err(ParseError::DuplicatePlan {
				owner: owner.to_string(),
				plan: doc.name,
			});
		}
		let plan = Plan {
			name: doc.name.clone(),
			description: doc.description,
			resources: doc.resources,
		};
		plans.insert(doc.name, plan);
	}
	Ok(plans)
}

/// Converts one resource into an address-space type.
pub fn parse_resource(resource: &SchemaResource) -> Result<AddressSpaceType, ParseError> {
	let doc: AddressSpaceTypeDoc = serde_json::from_str(&resource.data)?;
	non_empty("address space type", &doc.name)?;
	if doc.name != resource.name {
		return Err(ParseError::NameMismatch {
			resource: resource.name.clone(),
			declared: doc.name,
		});
	}

	let plans = convert_plans(&format!("address space type `{}`", doc.name), doc.plans)?;
	let mut address_types = IndexMap::with_capacity(doc.address_types.len());
	for at in doc.address_types {
		non_empty("address type", &at.name)?;
		if address_types.contains_key(&at.name) {
			return Err(ParseError::DuplicateAddressType {
				owner: doc.name,
				address_type: at.name,
			});
		}
		let address_type = AddressType {
			name: at.name.clone(),
			description: at.description,
			plans: convert_plans(&format!("address type `{}`", at.name), at.plans)?,
		};
		address_types.insert(at.name, address_type);
	}

	Ok(AddressSpaceType {
		name: doc.name,
		description: doc.description,
		address_types,
		plans,
	})
}

/// Converts a full listing, skipping malformed and duplicate resources.
pub fn parse_schema<'a>(resources: impl IntoIterator<Item = &'a SchemaResource>) -> ParsedSchema {
	let mut builder = Schema::builder();
	let mut skipped = Vec::new();
	for resource in resources {
		let outcome = parse_resource(resource).and_then(|space_type| {
			builder
				.push(space_type)
				.map_err(|dup| ParseError::DuplicateType { name: dup.name })
		});
		if let Err(error) = outcome {
			skipped.push(SkippedEntry {
				resource: resource.name.clone(),
				error,
			});
		}
	}
	ParsedSchema {
		schema: builder.build(),
		skipped,
	}
}
