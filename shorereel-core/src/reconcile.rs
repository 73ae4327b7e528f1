//! The status reconciler.
//!
//! A re-entrant polling loop that advances catalog records through the
//! provider's asynchronous transcode lifecycle until each reaches a
//! terminal remote state. It starts purely from the persisted catalog,
//! so a fresh process can always pick up where a previous one stopped.

use std::time::Duration;

use log::{debug, info, warn};

use crate::catalog::{Catalog, CatalogLock};
use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::publish::{RemoteStatus, VideoHost};

/// Counts from one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Records that reached `ready` during this pass.
    pub became_ready: usize,
    /// Records still awaiting a terminal state after this pass.
    pub pending: usize,
    /// Records that entered the absorbing `errored` state this pass.
    pub errored: usize,
}

/// Bounds for a continuous reconcile invocation.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Maximum number of passes before giving up for this invocation.
    pub attempts: u32,
    /// Fixed delay between passes.
    pub delay: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            attempts: 1,
            delay: Duration::from_secs(30),
        }
    }
}

/// One sweep of all non-terminal records against the provider.
///
/// Per-record provider errors are logged and skipped: the record's
/// state is left untouched and it is retried on the next pass. The
/// caller persists the catalog after the pass.
pub fn reconcile_pass(catalog: &mut Catalog, host: &dyn VideoHost) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let provider = host.name().to_string();

    for record in catalog.pending_mut() {
        // Resolve the asset id from the upload session if the provider
        // has not assigned one yet. "Not yet" is not an error.
        let needs_resolution = record
            .provider_refs
            .get(&provider)
            .is_some_and(|r| r.asset_id.is_none());
        if needs_resolution {
            let upload_id = match record.provider_refs.get(&provider) {
                Some(r) => r.upload_id.clone(),
                None => continue,
            };
            match host.resolve_upload(&upload_id) {
                Ok(Some(asset_id)) => {
                    debug!("{}: upload {} became asset {}", record.title, upload_id, asset_id);
                    if let Some(r) = record.provider_refs.get_mut(&provider) {
                        r.asset_id = Some(asset_id);
                    }
                }
                Ok(None) => {
                    debug!("{}: upload {} still in progress", record.title, upload_id);
                    outcome.pending += 1;
                    continue;
                }
                Err(e) => {
                    warn!(
                        "Query failed for upload {} ({}): {}; will retry next pass",
                        upload_id, record.title, e
                    );
                    outcome.pending += 1;
                    continue;
                }
            }
        }

        let asset_id = match record
            .provider_refs
            .get(&provider)
            .and_then(|r| r.asset_id.clone())
        {
            Some(id) => id,
            None => {
                // No reference for this provider at all; nothing this
                // reconciler can advance.
                warn!("{} has no {} reference; leaving untouched", record.title, provider);
                outcome.pending += 1;
                continue;
            }
        };

        match host.asset_status(&asset_id) {
            Ok(RemoteStatus::Ready { playback_id }) => {
                if record.mark_ready(playback_id) {
                    info!("{}: ready (playback {})", record.title, record.playback_ref.as_deref().unwrap_or(""));
                    outcome.became_ready += 1;
                }
            }
            Ok(RemoteStatus::Preparing) => {
                record.mark_preparing();
                outcome.pending += 1;
            }
            Ok(RemoteStatus::Errored) => {
                warn!("{}: provider reported a transcode failure", record.title);
                record.mark_errored();
                outcome.errored += 1;
            }
            Err(e) => {
                warn!(
                    "Query failed for asset {} ({}): {}; will retry next pass",
                    asset_id, record.title, e
                );
                outcome.pending += 1;
            }
        }
    }

    outcome
}

/// Runs bounded reconciliation over the persisted catalog.
///
/// Repeats up to `options.attempts` passes with `options.delay` between
/// them, stopping early the moment nothing is pending. Exhausting the
/// attempt budget with records still pending is not an error; they stay
/// eligible for a future invocation. The catalog is persisted once per
/// pass.
pub fn reconcile(
    config: &CoreConfig,
    host: &dyn VideoHost,
    options: &ReconcileOptions,
) -> CoreResult<ReconcileOutcome> {
    let _lock = CatalogLock::acquire(&config.catalog_path)?;
    let mut catalog = Catalog::open(&config.catalog_path)?;

    if catalog.pending_count() == 0 {
        info!("All records already have a terminal remote state");
        return Ok(ReconcileOutcome::default());
    }

    let mut last = ReconcileOutcome::default();
    for attempt in 1..=options.attempts {
        info!(
            "Reconcile pass {}/{} ({} pending)",
            attempt,
            options.attempts,
            catalog.pending_count()
        );
        last = reconcile_pass(&mut catalog, host);
        catalog.save()?;

        if last.pending == 0 {
            break;
        }
        if attempt < options.attempts {
            std::thread::sleep(options.delay);
        }
    }

    info!(
        "Reconcile summary: {} ready, {} pending, {} errored",
        last.became_ready, last.pending, last.errored
    );
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AssetRecord, MediaAttributes, ProviderRef};
    use crate::catalog::RemoteState;
    use crate::error::{provider_error, CoreResult};
    use crate::publish::UploadSession;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Scripted provider: upload sessions resolve after a configured
    /// number of queries, asset statuses replay a fixed sequence.
    struct ScriptedHost {
        resolve_after: RefCell<HashMap<String, u32>>,
        statuses: RefCell<HashMap<String, Vec<CoreResult<RemoteStatus>>>>,
        status_queries: Cell<usize>,
    }

    impl ScriptedHost {
        fn new() -> Self {
            Self {
                resolve_after: RefCell::new(HashMap::new()),
                statuses: RefCell::new(HashMap::new()),
                status_queries: Cell::new(0),
            }
        }

        fn resolve_upload_after(&self, upload_id: &str, queries: u32) {
            self.resolve_after
                .borrow_mut()
                .insert(upload_id.to_string(), queries);
        }

        fn push_status(&self, asset_id: &str, status: CoreResult<RemoteStatus>) {
            self.statuses
                .borrow_mut()
                .entry(asset_id.to_string())
                .or_default()
                .push(status);
        }
    }

    impl VideoHost for ScriptedHost {
        fn name(&self) -> &str {
            "mux"
        }

        fn create_upload(&self) -> CoreResult<UploadSession> {
            unreachable!("reconciler never creates uploads")
        }

        fn push_bytes(&self, _upload_url: &str, _bytes: &[u8]) -> CoreResult<()> {
            unreachable!("reconciler never uploads bytes")
        }

        fn resolve_upload(&self, session_id: &str) -> CoreResult<Option<String>> {
            let mut map = self.resolve_after.borrow_mut();
            match map.get_mut(session_id) {
                Some(0) => Ok(Some(format!("asset-for-{session_id}"))),
                Some(n) => {
                    *n -= 1;
                    Ok(None)
                }
                None => Ok(None),
            }
        }

        fn asset_status(&self, asset_id: &str) -> CoreResult<RemoteStatus> {
            self.status_queries.set(self.status_queries.get() + 1);
            let mut map = self.statuses.borrow_mut();
            let queue = map
                .get_mut(asset_id)
                .unwrap_or_else(|| panic!("unexpected status query for {asset_id}"));
            if queue.len() > 1 {
                queue.remove(0)
            } else {
                // Last scripted status repeats (provider state is stable).
                match &queue[0] {
                    Ok(s) => Ok(s.clone()),
                    Err(_) => Err(provider_error("mux", "scripted failure")),
                }
            }
        }
    }

    fn record_with_ref(hash: &str, upload_id: &str, asset_id: Option<&str>) -> AssetRecord {
        let mut record = AssetRecord::new(
            hash.to_string(),
            format!("Clip {hash}"),
            "data:image/jpeg;base64,xx".to_string(),
            MediaAttributes {
                duration_seconds: 10.0,
                width: 1920,
                height: 1080,
                size_bytes: 1000,
            },
        );
        record.provider_refs.insert(
            "mux".to_string(),
            ProviderRef {
                upload_id: upload_id.to_string(),
                asset_id: asset_id.map(String::from),
            },
        );
        record
    }

    fn catalog_with(records: Vec<AssetRecord>) -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::open(&dir.path().join("catalog.json")).unwrap();
        for record in records {
            catalog.append(record).unwrap();
        }
        (dir, catalog)
    }

    #[test]
    fn unassigned_upload_stays_uploading_without_error() {
        let host = ScriptedHost::new();
        host.resolve_upload_after("up-1", 5);
        let (_dir, mut catalog) = catalog_with(vec![record_with_ref("a", "up-1", None)]);

        let outcome = reconcile_pass(&mut catalog, &host);
        assert_eq!(outcome, ReconcileOutcome { became_ready: 0, pending: 1, errored: 0 });
        assert_eq!(catalog.records()[0].remote_state, RemoteState::Uploading);
    }

    #[test]
    fn resolved_upload_advances_to_preparing() {
        let host = ScriptedHost::new();
        host.resolve_upload_after("up-1", 0);
        host.push_status("asset-for-up-1", Ok(RemoteStatus::Preparing));
        let (_dir, mut catalog) = catalog_with(vec![record_with_ref("a", "up-1", None)]);

        let outcome = reconcile_pass(&mut catalog, &host);
        assert_eq!(outcome.pending, 1);
        let record = &catalog.records()[0];
        assert_eq!(record.remote_state, RemoteState::Preparing);
        assert_eq!(
            record.provider_refs["mux"].asset_id.as_deref(),
            Some("asset-for-up-1")
        );
    }

    #[test]
    fn ready_sets_playback_ref_and_later_passes_skip_the_record() {
        let host = ScriptedHost::new();
        host.push_status(
            "asset-1",
            Ok(RemoteStatus::Ready { playback_id: "pb-1".to_string() }),
        );
        let (_dir, mut catalog) =
            catalog_with(vec![record_with_ref("a", "up-1", Some("asset-1"))]);

        let outcome = reconcile_pass(&mut catalog, &host);
        assert_eq!(outcome, ReconcileOutcome { became_ready: 1, pending: 0, errored: 0 });
        let record = &catalog.records()[0];
        assert_eq!(record.remote_state, RemoteState::Ready);
        assert_eq!(record.playback_ref.as_deref(), Some("pb-1"));

        let queries_before = host.status_queries.get();
        let outcome = reconcile_pass(&mut catalog, &host);
        assert_eq!(outcome, ReconcileOutcome::default());
        assert_eq!(host.status_queries.get(), queries_before);
    }

    #[test]
    fn provider_failure_is_absorbing() {
        let host = ScriptedHost::new();
        host.push_status("asset-1", Ok(RemoteStatus::Errored));
        let (_dir, mut catalog) =
            catalog_with(vec![record_with_ref("a", "up-1", Some("asset-1"))]);

        let outcome = reconcile_pass(&mut catalog, &host);
        assert_eq!(outcome.errored, 1);
        assert_eq!(catalog.records()[0].remote_state, RemoteState::Errored);

        // Errored is terminal: never polled again.
        let queries_before = host.status_queries.get();
        reconcile_pass(&mut catalog, &host);
        assert_eq!(host.status_queries.get(), queries_before);
    }

    #[test]
    fn transient_query_failure_leaves_state_unchanged() {
        let host = ScriptedHost::new();
        host.push_status("asset-1", Err(provider_error("mux", "connection reset")));
        let (_dir, mut catalog) =
            catalog_with(vec![record_with_ref("a", "up-1", Some("asset-1"))]);

        let outcome = reconcile_pass(&mut catalog, &host);
        assert_eq!(outcome, ReconcileOutcome { became_ready: 0, pending: 1, errored: 0 });
        assert_eq!(catalog.records()[0].remote_state, RemoteState::Uploading);
    }

    #[test]
    fn split_invocations_reach_the_same_end_state_as_one() {
        // Provider script: preparing on the first two queries, then ready.
        let build_host = || {
            let host = ScriptedHost::new();
            host.push_status("asset-1", Ok(RemoteStatus::Preparing));
            host.push_status("asset-1", Ok(RemoteStatus::Preparing));
            host.push_status(
                "asset-1",
                Ok(RemoteStatus::Ready { playback_id: "pb-9".to_string() }),
            );
            host
        };

        // N+M passes, uninterrupted.
        let host = build_host();
        let (_d1, mut uninterrupted) =
            catalog_with(vec![record_with_ref("a", "up-1", Some("asset-1"))]);
        for _ in 0..3 {
            reconcile_pass(&mut uninterrupted, &host);
        }

        // N passes, persist, then M passes from the persisted state.
        let host = build_host();
        let (_d2, mut resumed) =
            catalog_with(vec![record_with_ref("a", "up-1", Some("asset-1"))]);
        for _ in 0..2 {
            reconcile_pass(&mut resumed, &host);
        }
        resumed.save().unwrap();
        let path = resumed.path().to_path_buf();
        let mut resumed = Catalog::open(&path).unwrap();
        reconcile_pass(&mut resumed, &host);

        let a = &uninterrupted.records()[0];
        let b = &resumed.records()[0];
        assert_eq!(a.remote_state, RemoteState::Ready);
        assert_eq!(b.remote_state, a.remote_state);
        assert_eq!(b.playback_ref, a.playback_ref);
    }

    #[test]
    fn bounded_loop_stops_early_when_nothing_pends() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::for_library(dir.path().to_path_buf());

        let mut catalog = Catalog::open(&config.catalog_path).unwrap();
        catalog
            .append(record_with_ref("a", "up-1", Some("asset-1")))
            .unwrap();
        catalog.save().unwrap();

        let host = ScriptedHost::new();
        host.push_status(
            "asset-1",
            Ok(RemoteStatus::Ready { playback_id: "pb-1".to_string() }),
        );

        let options = ReconcileOptions { attempts: 50, delay: Duration::from_secs(0) };
        let outcome = reconcile(&config, &host, &options).unwrap();
        assert_eq!(outcome.pending, 0);
        // One query resolved everything; the loop did not burn 50 passes.
        assert_eq!(host.status_queries.get(), 1);

        let persisted = Catalog::open(&config.catalog_path).unwrap();
        assert_eq!(persisted.records()[0].remote_state, RemoteState::Ready);
    }

    #[test]
    fn exhausted_budget_with_pending_records_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::for_library(dir.path().to_path_buf());

        let mut catalog = Catalog::open(&config.catalog_path).unwrap();
        catalog
            .append(record_with_ref("a", "up-1", Some("asset-1")))
            .unwrap();
        catalog.save().unwrap();

        let host = ScriptedHost::new();
        host.push_status("asset-1", Ok(RemoteStatus::Preparing));

        let options = ReconcileOptions { attempts: 3, delay: Duration::from_secs(0) };
        let outcome = reconcile(&config, &host, &options).unwrap();
        assert_eq!(outcome.pending, 1);

        let persisted = Catalog::open(&config.catalog_path).unwrap();
        assert_eq!(persisted.records()[0].remote_state, RemoteState::Preparing);
    }
}
