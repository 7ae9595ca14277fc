use std::sync::Arc;

use addrctl_model::{AddressSpaceType, AddressType, Plan};
use addrctl_schema::SchemaStore;
use pretty_assertions::assert_eq;

use super::*;
use crate::memory::MemoryStore;
use crate::{AllowAll, ErrorKind, RbacAuthorizer, StoreError};

fn standard_schema() -> Schema {
	let plan = Plan::new("small-plan");
	Schema::builder()
		.with(
			AddressSpaceType::new("standard")
				.with_plan(plan.clone())
				.with_address_type(AddressType::new("queue").with_plan(plan.clone()))
				.with_address_type(AddressType::new("anycast").with_plan(plan)),
		)
		.build()
}

struct Fixture {
	store: MemoryStore,
	helper: ReconciliationHelper,
	_schema: SchemaStore,
}

fn fixture_with(authorizer: Arc<dyn Authorizer>) -> Fixture {
	let schema = SchemaStore::new();
	schema.install(standard_schema());
	let store = MemoryStore::new();
	store.seed_address_space(space("myspace"));
	let helper = ReconciliationHelper::new(Arc::new(store.clone()), schema.reader(), authorizer);
	Fixture {
		store,
		helper,
		_schema: schema,
	}
}

fn fixture() -> Fixture {
	fixture_with(Arc::new(AllowAll))
}

fn space(name: &str) -> AddressSpace {
	AddressSpace::new("ns", name, "standard", "small-plan")
}

fn queue(name: &str, address: &str) -> Address {
	Address::new("ns", "myspace", name).with_address(address).with_type("queue").with_plan("small-plan")
}

fn admin() -> Caller {
	Caller::new("admin")
}

fn names(addresses: &[Address]) -> Vec<&str> {
	let mut names: Vec<&str> = addresses.iter().map(|a| a.name.as_str()).collect();
	names.sort_unstable();
	names
}

#[tokio::test]
async fn create_rejects_routable_collision_naming_holder() {
	let fx = fixture();
	fx.helper.create_address(&admin(), queue("q1", "Q1")).await.unwrap();
	let err = fx.helper.create_address(&admin(), queue("q2", "Q1")).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Conflict);
	match err {
		ApiError::Conflict(Conflict::RoutableAddress { existing, incoming, .. }) => {
			assert_eq!((existing.as_str(), incoming.as_str()), ("q1", "q2"));
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn create_rejects_duplicate_name_before_store() {
	let fx = fixture();
	fx.helper.create_address(&admin(), queue("q1", "Q1")).await.unwrap();
	let err = fx.helper.create_address(&admin(), queue("q1", "Q2")).await.unwrap_err();
	assert!(matches!(err, ApiError::Conflict(Conflict::DuplicateName { .. })));
}

#[tokio::test]
async fn create_validates_against_schema() {
	let fx = fixture();
	let topic = queue("t1", "T1").with_type("topic");
	let err = fx.helper.create_address(&admin(), topic).await.unwrap_err();
	assert!(matches!(err, ApiError::Validation(ValidationError::UnknownAddressType { .. })));

	let big = queue("q1", "Q1").with_plan("large-plan");
	let err = fx.helper.create_address(&admin(), big).await.unwrap_err();
	assert!(matches!(err, ApiError::Validation(ValidationError::UnknownAddressPlan { .. })));
	assert!(fx.store.stored_addresses(&space("myspace").key()).is_empty());
}

#[tokio::test]
async fn create_in_missing_space_is_not_found() {
	let fx = fixture();
	let orphan = Address::new("ns", "nowhere", "q1").with_address("Q1").with_type("queue").with_plan("small-plan");
	let err = fx.helper.create_address(&admin(), orphan).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unauthorized_create_makes_no_store_calls() {
	let fx = fixture_with(Arc::new(RbacAuthorizer));
	let reader = Caller::new("reader").with_grant("ns", ResourceVerb::List);
	let err = fx.helper.create_address(&reader, queue("q1", "Q1")).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Authorization);
	assert_eq!(fx.store.total_calls(), 0);
}

#[tokio::test]
async fn listing_filters_denied_namespaces() {
	let fx = fixture_with(Arc::new(RbacAuthorizer));
	fx.store.seed_address(queue("q1", "Q1"));
	let reader = Caller::new("reader").with_grant("ns", ResourceVerb::List);
	assert_eq!(names(&fx.helper.list_addresses(&reader, "ns").await.unwrap()), vec!["q1"]);
	let stranger = Caller::new("stranger");
	assert!(fx.helper.list_addresses(&stranger, "ns").await.unwrap().is_empty());
	let err = fx.helper.get_address(&stranger, "ns", "q1").await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[tokio::test]
async fn get_scans_spaces_and_reports_missing() {
	let fx = fixture();
	fx.store.seed_address_space(space("other"));
	fx.store.seed_address(Address::new("ns", "other", "a1").with_address("A1").with_type("anycast").with_plan("small-plan"));
	let found = fx.helper.get_address(&admin(), "ns", "a1").await.unwrap();
	assert_eq!(found.address_space, "other");
	let err = fx.helper.get_address(&admin(), "ns", "missing").await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn replace_requires_existing_and_is_idempotent() {
	let fx = fixture();
	let err = fx.helper.replace_address(&admin(), queue("q1", "Q1")).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);

	fx.helper.create_address(&admin(), queue("q1", "Q1")).await.unwrap();
	let first = fx.helper.replace_address(&admin(), queue("q1", "Q1")).await.unwrap();
	let second = fx.helper.replace_address(&admin(), queue("q1", "Q1")).await.unwrap();
	assert_eq!(first, second);
}

#[tokio::test]
async fn delete_returns_remaining_and_missing_is_not_found() {
	let fx = fixture();
	fx.store.seed_address(queue("q1", "Q1"));
	fx.store.seed_address(queue("q2", "Q2"));
	let remaining = fx.helper.delete_address(&admin(), "ns", "q1").await.unwrap();
	assert_eq!(names(&remaining), vec!["q2"]);
	let err = fx.helper.delete_address(&admin(), "ns", "q1").await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn put_reconciles_to_desired_set() {
	let fx = fixture();
	fx.store.seed_address(queue("q1", "Q1"));
	fx.store.seed_address(queue("q2", "Q2"));
	let desired = vec![queue("q2", "Q2-moved"), Address::new("", "", "q3").with_address("Q3").with_type("queue").with_plan("small-plan")];
	let result = fx.helper.put_addresses(&admin(), &space("myspace").key(), desired).await.unwrap();
	assert_eq!(names(&result), vec!["q2", "q3"]);
	let q2 = result.iter().find(|a| a.name == "q2").unwrap();
	assert_eq!(q2.address, "Q2-moved");
	let q3 = result.iter().find(|a| a.name == "q3").unwrap();
	assert_eq!((q3.namespace.as_str(), q3.address_space.as_str()), ("ns", "myspace"));
}

#[tokio::test]
async fn put_rejects_swapping_routable_addresses() {
	let fx = fixture();
	fx.store.seed_address(queue("q1", "A"));
	fx.store.seed_address(queue("q2", "B"));
	let err = fx.helper.put_addresses(&admin(), &space("myspace").key(), vec![queue("q1", "B"), queue("q2", "A")]).await.unwrap_err();
	assert!(matches!(err, ApiError::Conflict(Conflict::RoutableAddress { .. })));
}

#[tokio::test]
async fn put_rejects_collision_with_existing_address_without_writes() {
	let fx = fixture();
	fx.store.seed_address(queue("a1", "X"));
	fx.store.seed_address(queue("keep", "K"));
	let err = fx.helper.put_addresses(&admin(), &space("myspace").key(), vec![queue("keep", "K"), queue("b1", "X")]).await.unwrap_err();
	match err {
		ApiError::Conflict(Conflict::RoutableAddress { existing, incoming, .. }) => {
			assert_eq!((existing.as_str(), incoming.as_str()), ("a1", "b1"));
		}
		other => panic!("unexpected error: {other:?}"),
	}
	assert_eq!(names(&fx.store.stored_addresses(&space("myspace").key())), vec!["a1", "keep"]);
	assert_eq!(fx.store.address_calls(), 1);
}

#[tokio::test]
async fn foreign_namespace_addresses_are_rejected() {
	let fx = fixture();
	let key = space("myspace").key();
	let foreign = |name: &str| Address::new("other", "myspace", name).with_address(name.to_uppercase()).with_type("queue").with_plan("small-plan");

	let err = fx.helper.put_addresses(&admin(), &key, vec![foreign("f1")]).await.unwrap_err();
	assert!(matches!(err, ApiError::Validation(ValidationError::WrongNamespace { .. })));
	let err = fx.helper.append_addresses_to(&admin(), &key, vec![foreign("f1"), foreign("f2")]).await.unwrap_err();
	assert!(matches!(err, ApiError::Validation(ValidationError::WrongNamespace { .. })));

	fx.store.seed_address_space(AddressSpace::new("other", "elsewhere", "standard", "small-plan"));
	let mut misfiled = foreign("f3");
	misfiled.address_space = "elsewhere".into();
	misfiled.namespace = "ns".into();
	let err = fx.helper.create_address(&admin(), misfiled).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
	let err = fx.helper.create_address(&admin(), foreign("f4")).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);

	assert!(fx.store.stored_addresses(&key).is_empty());
}

#[tokio::test]
async fn put_with_removals_needs_delete_grant() {
	let fx = fixture_with(Arc::new(RbacAuthorizer));
	fx.store.seed_address(queue("q1", "Q1"));
	let creator = Caller::new("creator").with_grant("ns", ResourceVerb::Create);
	let err = fx.helper.put_addresses(&creator, &space("myspace").key(), vec![queue("q2", "Q2")]).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Authorization);
	assert_eq!(names(&fx.store.stored_addresses(&space("myspace").key())), vec!["q1"]);

	let kept = fx.helper.put_addresses(&creator, &space("myspace").key(), vec![queue("q1", "Q1"), queue("q2", "Q2")]).await.unwrap();
	assert_eq!(names(&kept), vec!["q1", "q2"]);
}

#[tokio::test]
async fn put_rejects_inconsistent_batch_without_writes() {
	let fx = fixture();
	fx.store.seed_address(queue("q1", "Q1"));
	let err = fx.helper.put_addresses(&admin(), &space("myspace").key(), vec![queue("a", "X"), queue("b", "X")]).await.unwrap_err();
	assert!(matches!(err, ApiError::Conflict(Conflict::BatchRoutableAddress { .. })));
	assert_eq!(names(&fx.store.stored_addresses(&space("myspace").key())), vec!["q1"]);
}

#[tokio::test]
async fn put_continues_past_store_failures() {
	let fx = fixture();
	fx.store.seed_address(queue("old", "OLD"));
	fx.store.fail_writes_for("q1");
	let err = fx.helper.put_addresses(&admin(), &space("myspace").key(), vec![queue("q1", "Q1"), queue("q2", "Q2")]).await.unwrap_err();
	assert!(matches!(err, ApiError::Store(StoreError::Backend(_))));
	assert_eq!(names(&fx.store.stored_addresses(&space("myspace").key())), vec!["q2"]);
}

#[tokio::test]
async fn append_groups_by_space_and_returns_created() {
	let fx = fixture();
	fx.store.seed_address_space(space("other"));
	let batch = vec![
		queue("q1", "Q1"),
		Address::new("ns", "other", "q1").with_address("Q1").with_type("queue").with_plan("small-plan"),
	];
	let created = fx.helper.append_addresses(&admin(), batch).await.unwrap();
	assert_eq!(created.len(), 2);
	assert!(created.iter().all(|a| a.server.uid.is_some()));
}

#[tokio::test]
async fn append_requires_space_reference() {
	let fx = fixture();
	let loose = Address::new("ns", "", "q1").with_address("Q1").with_type("queue").with_plan("small-plan");
	let err = fx.helper.append_addresses(&admin(), vec![loose]).await.unwrap_err();
	assert!(matches!(err, ApiError::Validation(ValidationError::MissingField { field: "addressSpace", .. })));
}

#[tokio::test]
async fn append_to_rejects_existing_names_and_collisions() {
	let fx = fixture();
	fx.store.seed_address(queue("q1", "Q1"));
	let key = space("myspace").key();
	let err = fx.helper.append_addresses_to(&admin(), &key, vec![queue("q1", "Q9")]).await.unwrap_err();
	assert!(matches!(err, ApiError::Conflict(Conflict::DuplicateName { .. })));
	let err = fx.helper.append_addresses_to(&admin(), &key, vec![queue("q2", "Q1")]).await.unwrap_err();
	assert!(matches!(err, ApiError::Conflict(Conflict::RoutableAddress { .. })));

	let listing = fx.helper.append_addresses_to(&admin(), &key, vec![queue("q2", "Q2")]).await.unwrap();
	assert_eq!(names(&listing), vec!["q1", "q2"]);
}

#[tokio::test]
async fn address_space_lifecycle() {
	let fx = fixture();
	let created = fx.helper.create_address_space(&admin(), space("fresh")).await.unwrap();
	assert!(created.server.uid.is_some());
	let err = fx.helper.create_address_space(&admin(), space("fresh")).await.unwrap_err();
	assert!(matches!(err, ApiError::Conflict(Conflict::DuplicateName { .. })));

	let bad = AddressSpace::new("ns", "bad", "brokered", "small-plan");
	let err = fx.helper.create_address_space(&admin(), bad).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Validation);

	let listed = fx.helper.list_address_spaces(&admin(), "ns").await.unwrap();
	assert_eq!(listed.len(), 2);
	fx.helper.delete_address_space(&admin(), "ns", "fresh").await.unwrap();
	let err = fx.helper.get_address_space(&admin(), "ns", "fresh").await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
	let err = fx.helper.replace_address_space(&admin(), space("fresh")).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn address_space_listing_denial_is_an_error() {
	let fx = fixture_with(Arc::new(RbacAuthorizer));
	let err = fx.helper.list_address_spaces(&Caller::new("nobody"), "ns").await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Authorization);
	assert_eq!(fx.store.total_calls(), 0);
}

#[tokio::test]
async fn schema_snapshot_changes_take_effect_on_next_request() {
	let schema = SchemaStore::new();
	let store = MemoryStore::new();
	store.seed_address_space(space("myspace"));
	let helper = ReconciliationHelper::new(Arc::new(store), schema.reader(), Arc::new(AllowAll));
	let err = helper.create_address(&admin(), queue("q1", "Q1")).await.unwrap_err();
	assert!(matches!(err, ApiError::Validation(ValidationError::UnknownAddressSpaceType { .. })));
	schema.install(standard_schema());
	helper.create_address(&admin(), queue("q1", "Q1")).await.unwrap();
}
