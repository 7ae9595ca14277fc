//! Process wiring: schema cache, its synchronizer, and the request helper.

use std::sync::Arc;

use addrctl_schema::{SchemaReader, SchemaSource, SchemaStore, SchemaSynchronizer, SynchronizerHandle};
use tokio_util::sync::CancellationToken;

use crate::{AddressSpaceApi, AllowAll, Authorizer, Caller, ReconciliationHelper, ServerOptions};

/// Running core: owns the synchronizer tasks for as long as it lives.
pub struct Controller {
	options: ServerOptions,
	helper: ReconciliationHelper,
	sync: SynchronizerHandle,
}

impl Controller {
	/// Loads the schema once, starts the watch and resync loops, and builds the helper.
	///
	/// `authorizer` is consulted only when RBAC is enabled; otherwise every caller
	/// is permitted.
	pub async fn start(options: ServerOptions, schema_source: Arc<dyn SchemaSource>, store: Arc<dyn AddressSpaceApi>, authorizer: Arc<dyn Authorizer>) -> Self {
		let schema_store = SchemaStore::new();
		let synchronizer = SchemaSynchronizer::new(schema_source, schema_store, options.sync_options());
		let sync = synchronizer.start(CancellationToken::new()).await;

		let authorizer: Arc<dyn Authorizer> = if options.enable_rbac { authorizer } else { Arc::new(AllowAll) };
		let helper = ReconciliationHelper::new(store, synchronizer.reader(), authorizer);
		tracing::info!(
			namespace = %options.namespace,
			rbac = options.enable_rbac,
			resync_secs = options.resync_interval.as_secs(),
			"controller.start"
		);
		Self { options, helper, sync }
	}

	pub fn helper(&self) -> &ReconciliationHelper {
		&self.helper
	}

	pub fn schema(&self) -> &SchemaReader {
		self.helper.schema()
	}

	pub fn options(&self) -> &ServerOptions {
		&self.options
	}

	/// Rewrites the caller's identity to the impersonated user, keeping its roles.
	pub fn effective_caller(&self, caller: Caller) -> Caller {
		match &self.options.impersonate_user {
			Some(user) => caller.impersonating(user.as_str()),
			None => caller,
		}
	}

	pub fn is_running(&self) -> bool {
		self.sync.is_running()
	}

	/// Cancels the background loops and waits for them to exit.
	pub async fn shutdown(self) {
		self.sync.shutdown().await;
		tracing::info!(namespace = %self.options.namespace, "controller.stop");
	}
}
