//! The supervisor: owner of every process-wide registry.
//!
//! One value, created at startup and shared behind an `Arc` — the tmux
//! runner, the stream registry, the handler registry, the introspector,
//! the config store, per-pane execution locks, and the identity of the
//! forbidden "current" pane. Pane objects are cheap handles into it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use termtap_process::{
    Confirmer, AutoConfirm, HandlerRegistry, Introspect, PaneProcesses, ProcessHandler,
    SystemIntrospector,
};
use termtap_stream::{StreamRegistry, default_stream_dir};
use termtap_tmux::{
    PaneAddress, TmuxCommandRunner, TmuxPaneInfo, current_pane_id, kill_session, resolve_panes,
    resolve_single,
};

use crate::config::{ConfigStore, NullConfig};
use crate::error::TermtapError;
use crate::pane::Pane;

pub struct Supervisor {
    runner: Arc<dyn TmuxCommandRunner>,
    streams: StreamRegistry,
    handlers: HandlerRegistry,
    introspector: Arc<dyn Introspect>,
    config: Arc<dyn ConfigStore>,
    confirmer: Arc<dyn Confirmer>,
    /// The pane this supervisor itself runs in; send/kill against it are
    /// refused. Detected once at startup.
    current_pane: Option<String>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    /// Panes with a pending interrupt, consumed by the running execute.
    interrupts: Mutex<HashSet<String>>,
    cmd_seq: AtomicU64,
}

impl Supervisor {
    /// Build a supervisor over the given runner, detecting the current
    /// pane when running inside tmux.
    pub fn new(runner: Arc<dyn TmuxCommandRunner>) -> Self {
        let current_pane = current_pane_id(&runner).unwrap_or_else(|e| {
            tracing::warn!("could not detect current pane: {e}");
            None
        });
        Self {
            runner,
            streams: StreamRegistry::new(default_stream_dir()),
            handlers: HandlerRegistry::new(),
            introspector: Arc::new(SystemIntrospector::default()),
            config: Arc::new(NullConfig),
            confirmer: Arc::new(AutoConfirm),
            current_pane,
            locks: Mutex::new(HashMap::new()),
            interrupts: Mutex::new(HashSet::new()),
            cmd_seq: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_stream_dir(mut self, dir: std::path::PathBuf) -> Self {
        self.streams = StreamRegistry::new(dir);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: Arc<dyn ConfigStore>) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    #[must_use]
    pub fn with_introspector(mut self, introspector: Arc<dyn Introspect>) -> Self {
        self.introspector = introspector;
        self
    }

    #[must_use]
    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Override current-pane detection (tests, or drivers that know).
    #[must_use]
    pub fn with_current_pane(mut self, pane_id: Option<String>) -> Self {
        self.current_pane = pane_id;
        self
    }

    // ------------------------------------------------------------------
    // accessors used by Pane and the engine
    // ------------------------------------------------------------------

    pub fn runner(&self) -> &Arc<dyn TmuxCommandRunner> {
        &self.runner
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    pub fn introspector(&self) -> &Arc<dyn Introspect> {
        &self.introspector
    }

    pub fn config(&self) -> &Arc<dyn ConfigStore> {
        &self.config
    }

    pub fn confirmer(&self) -> &dyn Confirmer {
        self.confirmer.as_ref()
    }

    pub fn handler_for(&self, procs: &PaneProcesses) -> &dyn ProcessHandler {
        self.handlers.handler_for(procs.process.as_ref())
    }

    pub fn is_current_pane(&self, pane_id: &str) -> bool {
        self.current_pane.as_deref() == Some(pane_id)
    }

    /// Refuse send/kill against the supervisor's own pane.
    pub fn ensure_not_current(&self, pane_id: &str) -> Result<(), TermtapError> {
        if self.is_current_pane(pane_id) {
            return Err(TermtapError::CurrentPane(pane_id.to_string()));
        }
        Ok(())
    }

    /// The execution lock for a pane, created on first use.
    pub fn lock_for(&self, pane_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(pane_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub fn flag_interrupt(&self, pane_id: &str) {
        self.interrupts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pane_id.to_string());
    }

    /// Consume a pending interrupt for the pane, if any.
    pub fn take_interrupt(&self, pane_id: &str) -> bool {
        self.interrupts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(pane_id)
    }

    /// Mint an opaque short command id, unique within this supervisor.
    pub fn mint_cmd_id(&self) -> String {
        let seq = self.cmd_seq.fetch_add(1, Ordering::Relaxed);
        format!("cmd_{}_{seq}", Utc::now().timestamp_millis())
    }

    // ------------------------------------------------------------------
    // address resolution
    // ------------------------------------------------------------------

    /// Resolve an address string to pane metadata, service references
    /// included. Bare sessions may match several panes.
    pub fn resolve(&self, address: &str) -> Result<Vec<TmuxPaneInfo>, TermtapError> {
        let parsed: PaneAddress = address.parse()?;
        let concrete = self.resolve_service(parsed)?;
        Ok(resolve_panes(&self.runner, &concrete)?)
    }

    /// Resolve to exactly one pane; a multi-pane match is an error that
    /// enumerates the candidates.
    pub fn resolve_one(&self, address: &str) -> Result<TmuxPaneInfo, TermtapError> {
        let parsed: PaneAddress = address.parse()?;
        let concrete = self.resolve_service(parsed)?;
        Ok(resolve_single(&self.runner, &concrete)?)
    }

    /// Map a `session.service` reference to its configured pane through
    /// the init-group table; other address shapes pass through.
    fn resolve_service(&self, address: PaneAddress) -> Result<PaneAddress, TermtapError> {
        let PaneAddress::Service { session, service } = address else {
            return Ok(address);
        };
        let group =
            self.config
                .init_group(&session)
                .ok_or_else(|| TermtapError::ServiceNotFound {
                    session: session.clone(),
                    service: service.clone(),
                })?;
        let svc = group
            .services
            .iter()
            .find(|s| s.name == service)
            .ok_or_else(|| TermtapError::ServiceNotFound {
                session: session.clone(),
                service: service.clone(),
            })?;
        Ok(PaneAddress::Target {
            session,
            window: 0,
            pane: svc.pane,
        })
    }

    /// A pane handle for a single-pane address.
    pub fn pane(self: &Arc<Self>, address: &str) -> Result<Pane, TermtapError> {
        let info = self.resolve_one(address)?;
        Ok(Pane::new(self.clone(), info.pane_id))
    }

    /// Pane handles for every pane an address matches.
    pub fn panes(self: &Arc<Self>, address: &str) -> Result<Vec<Pane>, TermtapError> {
        let infos = self.resolve(address)?;
        Ok(infos
            .into_iter()
            .map(|info| Pane::new(self.clone(), info.pane_id))
            .collect())
    }

    /// A pane handle for a known pane id, skipping resolution.
    pub fn pane_by_id(self: &Arc<Self>, pane_id: &str) -> Pane {
        Pane::new(self.clone(), pane_id.to_string())
    }

    /// All panes across all sessions, with the current pane annotated.
    pub fn list_panes(&self) -> Result<Vec<TmuxPaneInfo>, TermtapError> {
        Ok(termtap_tmux::list_panes(&self.runner)?)
    }

    pub fn kill_session(&self, name: &str) -> Result<(), TermtapError> {
        Ok(kill_session(&self.runner, name)?)
    }

    /// Stop every active stream; called on shutdown.
    pub fn stop_all_streams(&self) {
        self.streams.stop_all(&self.runner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termtap_tmux::TmuxError;

    struct ListRunner;
    impl TmuxCommandRunner for ListRunner {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            if args.first() == Some(&"list-panes") {
                return Ok([
                    "%0\tdemo\t0\t0\tdev\t1\t10",
                    "%1\tdemo\t0\t1\tdev\t0\t11",
                ]
                .join("\n"));
            }
            Ok(String::new())
        }
    }

    fn supervisor() -> Arc<Supervisor> {
        Arc::new(Supervisor::new(Arc::new(ListRunner)).with_current_pane(None))
    }

    #[test]
    fn current_pane_guard() {
        let sup = Arc::new(
            Supervisor::new(Arc::new(ListRunner)).with_current_pane(Some("%0".to_string())),
        );
        assert!(sup.ensure_not_current("%1").is_ok());
        let err = sup.ensure_not_current("%0").unwrap_err();
        assert!(matches!(err, TermtapError::CurrentPane(_)));
    }

    #[test]
    fn ambiguous_session_address_enumerates_panes() {
        let sup = supervisor();
        let err = sup.pane("demo").unwrap_err();
        match err {
            TermtapError::AddressAmbiguous { panes, .. } => {
                assert_eq!(panes, vec!["demo:0.0".to_string(), "demo:0.1".to_string()]);
            }
            other => panic!("expected AddressAmbiguous, got {other:?}"),
        }
    }

    #[test]
    fn service_without_config_is_service_not_found() {
        let sup = supervisor();
        let err = sup.pane("demo.backend").unwrap_err();
        assert!(matches!(err, TermtapError::ServiceNotFound { .. }));
    }

    #[test]
    fn service_resolves_through_init_group() {
        use crate::config::{InitGroup, ServiceSpec};

        struct OneGroup;
        impl ConfigStore for OneGroup {
            fn pane_config(&self, _address: &str) -> Option<crate::config::PaneConfig> {
                None
            }
            fn init_group(&self, name: &str) -> Option<InitGroup> {
                (name == "demo").then(|| InitGroup {
                    name: "demo".to_string(),
                    layout: "tiled".to_string(),
                    services: vec![ServiceSpec {
                        name: "backend".to_string(),
                        command: "serve".to_string(),
                        pane: 1,
                        cwd: None,
                        ready_pattern: None,
                        depends_on: vec![],
                        timeout_secs: None,
                    }],
                })
            }
            fn list_init_groups(&self) -> Vec<String> {
                vec!["demo".to_string()]
            }
        }
        let sup = Arc::new(
            Supervisor::new(Arc::new(ListRunner))
                .with_current_pane(None)
                .with_config(Arc::new(OneGroup)),
        );
        let pane = sup.pane("demo.backend").expect("resolve service");
        assert_eq!(pane.id(), "%1");
    }

    #[test]
    fn lock_for_is_per_pane_and_stable() {
        let sup = supervisor();
        let a1 = sup.lock_for("%0");
        let a2 = sup.lock_for("%0");
        let b = sup.lock_for("%1");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn interrupt_flag_is_consumed_once() {
        let sup = supervisor();
        assert!(!sup.take_interrupt("%0"));
        sup.flag_interrupt("%0");
        assert!(sup.take_interrupt("%0"));
        assert!(!sup.take_interrupt("%0"));
    }

    #[test]
    fn cmd_ids_are_unique() {
        let sup = supervisor();
        let a = sup.mint_cmd_id();
        let b = sup.mint_cmd_id();
        assert_ne!(a, b);
        assert!(a.starts_with("cmd_"));
    }
}
