//! Per-namespace authorization.

use addrctl_model::ResourceVerb;
use rustc_hash::FxHashSet;

/// Identity of the party issuing a request, with the roles it was granted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
	pub name: String,
	roles: FxHashSet<String>,
}

impl Caller {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			roles: FxHashSet::default(),
		}
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.roles.insert(role.into());
		self
	}

	/// Grants `verb` on `namespace` in the role format [`RbacAuthorizer`] checks.
	pub fn with_grant(self, namespace: &str, verb: ResourceVerb) -> Self {
		self.with_role(role_for(namespace, verb))
	}

	/// Same roles, acting under another identity.
	pub fn impersonating(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn has_role(&self, role: &str) -> bool {
		self.roles.contains(role)
	}
}

/// Role name granting `verb` on `namespace`.
pub fn role_for(namespace: &str, verb: ResourceVerb) -> String {
	format!("{namespace}:{verb}")
}

/// Answers whether a caller may perform a verb in a namespace.
pub trait Authorizer: Send + Sync {
	fn is_permitted(&self, caller: &Caller, namespace: &str, verb: ResourceVerb) -> bool;
}

impl<F> Authorizer for F
where
	F: Fn(&Caller, &str, ResourceVerb) -> bool + Send + Sync,
{
	fn is_permitted(&self, caller: &Caller, namespace: &str, verb: ResourceVerb) -> bool {
		self(caller, namespace, verb)
	}
}

/// Role-based check: permitted iff the caller holds [`role_for`]`(namespace, verb)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacAuthorizer;

impl Authorizer for RbacAuthorizer {
	fn is_permitted(&self, caller: &Caller, namespace: &str, verb: ResourceVerb) -> bool {
		caller.has_role(&role_for(namespace, verb))
	}
}

/// Permits everything. Used when role checks are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
	fn is_permitted(&self, _caller: &Caller, _namespace: &str, _verb: ResourceVerb) -> bool {
		true
	}
}
