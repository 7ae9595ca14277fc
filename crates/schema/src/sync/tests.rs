use std::time::Duration;

use super::*;
use crate::SchemaResource;
use crate::memory::MemorySchemaSource;

fn resource(name: &str) -> SchemaResource {
	SchemaResource::new(
		name,
		format!(r#"{{"name": "{name}", "plans": [{{"name": "small-plan"}}], "addressTypes": [{{"name": "queue", "plans": [{{"name": "small-plan"}}]}}]}}"#),
	)
}

fn options(resync: Duration) -> SyncOptions {
	SyncOptions {
		resync_interval: resync,
		backoff: BackoffPolicy::new(Duration::from_millis(10), Duration::from_millis(80)),
	}
}

fn synchronizer(source: &Arc<MemorySchemaSource>, resync: Duration) -> Arc<SchemaSynchronizer> {
	let source: Arc<dyn SchemaSource> = source.clone();
	SchemaSynchronizer::new(source, SchemaStore::new(), options(resync))
}

async fn eventually(mut condition: impl FnMut() -> bool) {
	for _ in 0..2_000 {
		if condition() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	panic!("condition not reached");
}

fn type_names(reader: &SchemaReader) -> Vec<String> {
	reader.current_schema().address_space_types().map(|t| t.name.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn startup_installs_valid_entries_and_skips_malformed() {
	let source = Arc::new(MemorySchemaSource::with_resources([
		resource("standard"),
		SchemaResource::new("broken", "{\"name\": 7}"),
		resource("brokered"),
		resource("mqtt"),
	]));
	let sync = synchronizer(&source, Duration::from_secs(3600));
	let handle = sync.start(CancellationToken::new()).await;

	let reader = sync.reader();
	assert_eq!(reader.generation(), 1);
	assert_eq!(type_names(&reader), ["standard", "brokered", "mqtt"]);
	handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn refresh_reports_counts() {
	let source = Arc::new(MemorySchemaSource::with_resources([resource("standard"), SchemaResource::new("bad", "[]")]));
	let sync = synchronizer(&source, Duration::from_secs(3600));
	let report = sync.refresh(Trigger::Resync).await.unwrap();
	assert_eq!(
		report,
		RefreshReport {
			trigger: Trigger::Resync,
			generation: 1,
			types: 1,
			skipped: 1,
		}
	);
}

#[tokio::test(start_paused = true)]
async fn failed_listing_keeps_previous_snapshot() {
	let source = Arc::new(MemorySchemaSource::with_resources([resource("standard")]));
	let sync = synchronizer(&source, Duration::from_secs(3600));
	sync.refresh(Trigger::Startup).await.unwrap();

	source.set_fail_list(true);
	assert!(sync.refresh(Trigger::Resync).await.is_err());
	assert_eq!(sync.reader().generation(), 1);
	assert_eq!(type_names(&sync.reader()), ["standard"]);
}

#[tokio::test(start_paused = true)]
async fn watch_notification_installs_new_schema() {
	let source = Arc::new(MemorySchemaSource::with_resources([resource("standard")]));
	let sync = synchronizer(&source, Duration::from_secs(3600));
	let handle = sync.start(CancellationToken::new()).await;
	eventually(|| source.watcher_count() == 1).await;

	source.put(resource("brokered"));
	let reader = sync.reader();
	eventually(|| reader.current_schema().find_address_space_type("brokered").is_some()).await;

	source.remove("standard");
	eventually(|| reader.current_schema().find_address_space_type("standard").is_none()).await;
	handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn resync_recovers_changes_without_notifications() {
	let source = Arc::new(MemorySchemaSource::with_resources([resource("standard")]));
	let sync = synchronizer(&source, Duration::from_secs(60));
	sync.refresh(Trigger::Startup).await.unwrap();
	let cancel = CancellationToken::new();
	let resync = sync.spawn_resync(cancel.clone());

	source.put_silently(resource("brokered"));
	tokio::time::sleep(Duration::from_secs(30)).await;
	assert!(sync.reader().current_schema().find_address_space_type("brokered").is_none());

	tokio::time::sleep(Duration::from_secs(31)).await;
	let reader = sync.reader();
	eventually(|| reader.current_schema().find_address_space_type("brokered").is_some()).await;
	assert_eq!(source.watch_calls(), 0);

	cancel.cancel();
	resync.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn watch_failures_are_retried_with_backoff() {
	let source = Arc::new(MemorySchemaSource::with_resources([resource("standard")]));
	source.set_fail_watch(true);
	let sync = synchronizer(&source, Duration::from_secs(3600));
	let handle = sync.start(CancellationToken::new()).await;

	eventually(|| source.watch_calls() >= 5).await;
	assert!(handle.is_running());
	assert_eq!(type_names(&sync.reader()), ["standard"]);

	source.set_fail_watch(false);
	eventually(|| source.watcher_count() == 1).await;
	source.put(resource("mqtt"));
	let reader = sync.reader();
	eventually(|| reader.current_schema().find_address_space_type("mqtt").is_some()).await;
	handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn reconnect_relists_to_cover_dropped_events() {
	let source = Arc::new(MemorySchemaSource::with_resources([resource("standard")]));
	let sync = synchronizer(&source, Duration::from_secs(3600));
	let handle = sync.start(CancellationToken::new()).await;
	eventually(|| source.watcher_count() == 1).await;

	source.disconnect_watchers();
	source.put_silently(resource("brokered"));

	let reader = sync.reader();
	eventually(|| reader.current_schema().find_address_space_type("brokered").is_some()).await;
	assert_eq!(source.watch_calls(), 2);
	handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn startup_survives_unavailable_source() {
	let source = Arc::new(MemorySchemaSource::with_resources([resource("standard")]));
	source.set_fail_list(true);
	let sync = synchronizer(&source, Duration::from_secs(1));
	let handle = sync.start(CancellationToken::new()).await;
	assert_eq!(sync.reader().generation(), 0);
	assert!(sync.reader().current_schema().is_empty());

	source.set_fail_list(false);
	let reader = sync.reader();
	eventually(|| reader.current_schema().find_address_space_type("standard").is_some()).await;
	handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_backoff() {
	let source = Arc::new(MemorySchemaSource::new());
	source.set_fail_watch(true);
	let sync = SchemaSynchronizer::new(
		source.clone(),
		SchemaStore::new(),
		SyncOptions {
			resync_interval: Duration::from_secs(3600),
			backoff: BackoffPolicy::new(Duration::from_secs(600), Duration::from_secs(600)),
		},
	);
	let handle = sync.start(CancellationToken::new()).await;
	eventually(|| source.watch_calls() == 1).await;

	tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
		.await
		.expect("shutdown should not wait for the backoff to elapse");
	assert_eq!(source.watch_calls(), 1);
}
