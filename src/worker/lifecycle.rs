//! Worker lifecycle control
//!
//! [`CacheWorker`] sequences install → activate → ready and dispatches
//! intercepted requests and control messages. Each phase is an explicit
//! async handler returning a `Result`; the hosting environment awaits a
//! phase before driving the next one. Readiness is published on a watch
//! channel — consumers observing [`WorkerState::Active`] route their
//! traffic through this instance.

use crate::audit::AuditLog;
use crate::error::{PrecacheError, PrecacheResult};
use crate::manifest::Manifest;
use crate::net::{Fetcher, Request};
use crate::store::StoreProvider;
use crate::worker::reconcile::ReconcileSummary;
use crate::worker::router::RouteOutcome;
use crate::worker::{install, prefetch, reconcile, router};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Control message forcing immediate takeover
pub const MSG_SKIP_WAITING: &str = "skipWaiting";
/// Control message triggering the bulk prefetcher
pub const MSG_DOWNLOAD_OFFLINE: &str = "downloadOffline";

/// Lifecycle state of a worker instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Staging the shell set
    Installing,
    /// Shell staged, waiting to activate
    Waiting,
    /// Reconciling the content store
    Activating,
    /// Reconciled and claimed; serving traffic
    Active,
    /// Activation failed; stores were reset and this instance serves nothing
    Inert,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Inert => "inert",
        };
        f.write_str(s)
    }
}

/// The cache lifecycle controller
pub struct CacheWorker {
    manifest: Manifest,
    shell: Vec<String>,
    origin: String,
    stores: Arc<dyn StoreProvider>,
    fetcher: Arc<dyn Fetcher>,
    audit: AuditLog,
    instance: Uuid,
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
    download_concurrency: usize,
}

impl CacheWorker {
    pub fn new(
        manifest: Manifest,
        shell: Vec<String>,
        origin: String,
        stores: Arc<dyn StoreProvider>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Installing);
        Self {
            manifest,
            shell,
            origin,
            stores,
            fetcher,
            audit: AuditLog::disabled(),
            instance: Uuid::new_v4(),
            state,
            skip_waiting: AtomicBool::new(false),
            download_concurrency: 8,
        }
    }

    /// Attach an operational audit log
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Set the fetch concurrency used by the bulk prefetcher
    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency.max(1);
        self
    }

    /// Unique id of this worker instance
    pub fn instance(&self) -> Uuid {
        self.instance
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Observe lifecycle transitions; `Active` is the readiness claim
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Whether immediate takeover was requested
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::Relaxed)
    }

    /// Request immediate takeover of traffic routing
    pub fn skip_waiting(&self) {
        if !self.skip_waiting.swap(true, Ordering::Relaxed) {
            debug!(instance = %self.instance, "Skip-waiting requested");
        }
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }

    /// Install phase: stage the shell set
    ///
    /// A new instance never queues behind a previously active one for
    /// installation, so takeover is requested up front. On failure the
    /// worker stays in `Installing` and the previously active deployment
    /// remains in control.
    pub async fn handle_install(&self) -> PrecacheResult<()> {
        self.skip_waiting();
        self.set_state(WorkerState::Installing);

        match install::prefetch_shell(&*self.stores, &*self.fetcher, &self.origin, &self.shell)
            .await
        {
            Ok(staged) => {
                info!(instance = %self.instance, staged, "Shell staged");
                self.audit
                    .log(
                        "install",
                        &serde_json::json!({
                            "instance": self.instance.to_string(),
                            "staged": staged,
                        }),
                    )
                    .await;
                self.set_state(WorkerState::Waiting);
                Ok(())
            }
            Err(e) => {
                warn!(instance = %self.instance, "Install failed: {}", e);
                self.audit
                    .log(
                        "install_failed",
                        &serde_json::json!({
                            "instance": self.instance.to_string(),
                            "error": e.to_string(),
                        }),
                    )
                    .await;
                Err(e)
            }
        }
    }

    /// Activate phase: reconcile the content store and claim traffic
    ///
    /// Any fault collapses all three stores to a clean first-run state and
    /// leaves this instance inert.
    pub async fn handle_activate(&self) -> PrecacheResult<ReconcileSummary> {
        self.set_state(WorkerState::Activating);

        match reconcile::reconcile(&*self.stores, &self.origin, &self.manifest).await {
            Ok(summary) => {
                self.audit
                    .log(
                        "activate",
                        &serde_json::json!({
                            "instance": self.instance.to_string(),
                            "preserved": summary.preserved,
                            "evicted": summary.evicted,
                            "installed": summary.installed,
                            "cold_start": summary.cold_start,
                        }),
                    )
                    .await;
                self.set_state(WorkerState::Active);
                info!(instance = %self.instance, "Worker active");
                Ok(summary)
            }
            Err(e) => {
                let err = PrecacheError::upgrade(e);
                error!(instance = %self.instance, "Failed to upgrade resource cache: {}", err);
                if let Err(wipe_err) = reconcile::wipe_all(&*self.stores).await {
                    error!("Failed to reset stores after upgrade failure: {}", wipe_err);
                }
                self.audit
                    .log(
                        "upgrade_failed",
                        &serde_json::json!({
                            "instance": self.instance.to_string(),
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                self.set_state(WorkerState::Inert);
                Err(err)
            }
        }
    }

    /// Route one intercepted request
    pub async fn handle_fetch(&self, request: &Request) -> PrecacheResult<RouteOutcome> {
        router::route(
            &*self.stores,
            &*self.fetcher,
            &self.origin,
            &self.manifest,
            request,
        )
        .await
    }

    /// Handle an inbound control message; unrecognized payloads are ignored
    pub async fn handle_message(&self, message: &str) -> PrecacheResult<()> {
        match message {
            MSG_SKIP_WAITING => {
                self.skip_waiting();
                Ok(())
            }
            MSG_DOWNLOAD_OFFLINE => {
                self.download_offline().await?;
                Ok(())
            }
            other => {
                debug!("Ignoring unrecognized control message {:?}", other);
                Ok(())
            }
        }
    }

    /// Prefetch every manifest resource missing from the content store
    ///
    /// Runs on explicit command, independent of lifecycle state.
    pub async fn download_offline(&self) -> PrecacheResult<usize> {
        let fetched = prefetch::download_offline(
            &*self.stores,
            &*self.fetcher,
            &self.origin,
            &self.manifest,
            self.download_concurrency,
        )
        .await?;
        self.audit
            .log(
                "download_offline",
                &serde_json::json!({
                    "instance": self.instance.to_string(),
                    "fetched": fetched,
                }),
            )
            .await;
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::canonical_url;
    use crate::store::memory::MemoryStores;
    use crate::store::{Store, CONTENT_STORE, MANIFEST_STORE, SNAPSHOT_KEY, TEMP_STORE};
    use crate::worker::router::ServeSource;
    use crate::worker::testing::{manifest_of, FailingStores, MockFetcher, ORIGIN};

    fn worker_with(
        stores: Arc<dyn StoreProvider>,
        fetcher: Arc<MockFetcher>,
        entries: &[(&str, &str)],
        shell: &[&str],
    ) -> CacheWorker {
        CacheWorker::new(
            manifest_of(entries),
            shell.iter().map(|s| s.to_string()).collect(),
            ORIGIN.to_string(),
            stores,
            fetcher,
        )
    }

    #[tokio::test]
    async fn install_then_activate_reaches_active() {
        let stores = Arc::new(MemoryStores::new());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_ok("https://app.example.com/main.dart.js", b"js");
        fetcher.serve_ok("https://app.example.com/index.html", b"html");

        let worker = worker_with(
            stores.clone(),
            fetcher,
            &[("/", "r"), ("index.html", "r"), ("main.dart.js", "m")],
            &["main.dart.js", "index.html"],
        );

        assert_eq!(worker.state(), WorkerState::Installing);
        worker.handle_install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Waiting);

        let summary = worker.handle_activate().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Active);
        assert!(summary.cold_start);
        assert_eq!(summary.installed, 2);

        // Content holds exactly the shell; the snapshot equals the manifest.
        let content = stores.open(CONTENT_STORE).await.unwrap();
        assert_eq!(content.keys().await.unwrap().len(), 2);
        let snapshot = stores
            .open(MANIFEST_STORE)
            .await
            .unwrap()
            .get(SNAPSHOT_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            Manifest::from_snapshot_json(&snapshot.body).unwrap(),
            manifest_of(&[("/", "r"), ("index.html", "r"), ("main.dart.js", "m")])
        );
    }

    #[tokio::test]
    async fn install_failure_never_reaches_waiting() {
        let stores = Arc::new(MemoryStores::new());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail("https://app.example.com/main.dart.js");

        let worker = worker_with(
            stores.clone(),
            fetcher,
            &[("main.dart.js", "m")],
            &["main.dart.js"],
        );

        assert!(worker.handle_install().await.is_err());
        assert_eq!(worker.state(), WorkerState::Installing);

        let temp = stores.open(TEMP_STORE).await.unwrap();
        assert!(temp.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn activation_failure_collapses_all_stores() {
        // The snapshot write is the last reconcile step; failing it exercises
        // recovery after the content store was already mutated.
        let stores = Arc::new(FailingStores::failing_put(MANIFEST_STORE));
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_ok("https://app.example.com/index.html", b"html");

        let worker = worker_with(
            stores.clone(),
            fetcher,
            &[("index.html", "i")],
            &["index.html"],
        );

        worker.handle_install().await.unwrap();
        let err = worker.handle_activate().await.unwrap_err();

        assert!(matches!(err, PrecacheError::Upgrade { .. }));
        assert_eq!(worker.state(), WorkerState::Inert);
        for name in [CONTENT_STORE, TEMP_STORE, MANIFEST_STORE] {
            assert!(!stores.has(name).await.unwrap(), "{name} should be gone");
        }
    }

    #[tokio::test]
    async fn claim_is_observable_on_the_watch_channel() {
        let stores = Arc::new(MemoryStores::new());
        let fetcher = Arc::new(MockFetcher::new());

        let worker = worker_with(stores, fetcher, &[("/", "r")], &[]);
        let rx = worker.subscribe();

        worker.handle_install().await.unwrap();
        worker.handle_activate().await.unwrap();

        assert_eq!(*rx.borrow(), WorkerState::Active);
    }

    #[tokio::test]
    async fn skip_waiting_message_sets_the_flag() {
        let stores = Arc::new(MemoryStores::new());
        let worker = worker_with(stores, Arc::new(MockFetcher::new()), &[("/", "r")], &[]);

        // handle_install has not run; only the message requests takeover.
        assert!(!worker.skip_waiting_requested());
        worker.handle_message(MSG_SKIP_WAITING).await.unwrap();
        assert!(worker.skip_waiting_requested());
    }

    #[tokio::test]
    async fn download_offline_message_fills_the_cache() {
        let stores = Arc::new(MemoryStores::new());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve_ok("https://app.example.com/", b"index");
        fetcher.serve_ok("https://app.example.com/extra.js", b"extra");

        let worker = worker_with(
            stores.clone(),
            fetcher,
            &[("/", "r"), ("extra.js", "e")],
            &[],
        );

        worker.handle_message(MSG_DOWNLOAD_OFFLINE).await.unwrap();

        let content = stores.open(CONTENT_STORE).await.unwrap();
        assert_eq!(
            content.keys().await.unwrap(),
            [
                "https://app.example.com/",
                "https://app.example.com/extra.js"
            ]
        );
    }

    #[tokio::test]
    async fn unknown_message_is_ignored() {
        let stores = Arc::new(MemoryStores::new());
        let worker = worker_with(stores, Arc::new(MockFetcher::new()), &[("/", "r")], &[]);

        worker.handle_message("selfDestruct").await.unwrap();

        assert!(!worker.skip_waiting_requested());
        assert_eq!(worker.state(), WorkerState::Installing);
    }

    #[tokio::test]
    async fn handle_fetch_routes_through_the_cache() {
        let stores = Arc::new(MemoryStores::new());
        let fetcher = Arc::new(MockFetcher::new());

        let worker = worker_with(
            stores.clone(),
            fetcher,
            &[("/", "r"), ("main.dart.js", "m")],
            &[],
        );

        let content = stores.open(CONTENT_STORE).await.unwrap();
        content
            .put(
                &canonical_url(ORIGIN, "main.dart.js"),
                &crate::store::CachedResponse::ok_with_body(b"cached".to_vec()),
            )
            .await
            .unwrap();

        let outcome = worker
            .handle_fetch(&Request::get("https://app.example.com/main.dart.js"))
            .await
            .unwrap();
        match outcome {
            RouteOutcome::Served { source, .. } => assert_eq!(source, ServeSource::Cache),
            RouteOutcome::Passthrough => panic!("expected a served response"),
        }

        let passthrough = worker
            .handle_fetch(&Request::get("https://app.example.com/api/data"))
            .await
            .unwrap();
        assert_eq!(passthrough, RouteOutcome::Passthrough);
    }
}
