//! Multi-service initializer: bring up a named group of services, each in
//! its own pane, honoring dependency order and readiness patterns.
//!
//! Services are topologically sorted by `depends_on`, then started level
//! by level — independent services of the same level launch as concurrent
//! tasks; the next level waits until every dependency reported ready.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;

use termtap_tmux::{SplitDirection, create_session, session_exists, split_pane};

use crate::config::{InitGroup, ServiceSpec};
use crate::error::TermtapError;
use crate::execute::{CommandStatus, ExecuteRequest};
use crate::supervisor::Supervisor;

const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome for one service of the group.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceReport {
    pub name: String,
    pub pane_address: String,
    pub status: CommandStatus,
}

/// Start every service of the group. Fails fast on setup errors (existing
/// session, dependency cycle); service start failures are reported in the
/// result and stop later levels from launching.
pub async fn run_init_group(
    supervisor: &Arc<Supervisor>,
    group: &InitGroup,
) -> Result<Vec<ServiceReport>, TermtapError> {
    if group.services.is_empty() {
        return Err(TermtapError::InitGroup(format!(
            "group '{}' has no services",
            group.name
        )));
    }
    if session_exists(supervisor.runner(), &group.name) {
        return Err(TermtapError::InitGroup(format!(
            "session '{}' already exists",
            group.name
        )));
    }

    let levels = sort_by_dependencies(&group.services)?;

    create_panes(supervisor, group)?;

    let mut reports = Vec::with_capacity(group.services.len());
    let mut failed = false;

    for level in levels {
        if failed {
            break;
        }
        let mut set = JoinSet::new();
        for service in level {
            let supervisor = supervisor.clone();
            let session = group.name.clone();
            set.spawn(async move { start_service(&supervisor, &session, &service).await });
        }
        while let Some(joined) = set.join_next().await {
            let report = joined
                .map_err(|e| TermtapError::InitGroup(format!("service task failed: {e}")))??;
            if !matches!(
                report.status,
                CommandStatus::Ready | CommandStatus::Completed | CommandStatus::Running
            ) {
                tracing::warn!(service = %report.name, status = %report.status, "service failed to start");
                failed = true;
            }
            reports.push(report);
        }
    }

    Ok(reports)
}

/// Create the session and enough panes for the highest pane index, then
/// apply the group's layout.
fn create_panes(supervisor: &Arc<Supervisor>, group: &InitGroup) -> Result<(), TermtapError> {
    let by_pane: HashMap<u32, &ServiceSpec> =
        group.services.iter().map(|s| (s.pane, s)).collect();
    let max_pane = group.services.iter().map(|s| s.pane).max().unwrap_or(0);

    let cwd_for = |idx: u32| by_pane.get(&idx).and_then(|s| s.cwd.as_deref());
    let first = create_session(
        supervisor.runner(),
        &group.name,
        cwd_for(0),
        &[],
        None,
    )?;

    for idx in 1..=max_pane {
        split_pane(
            supervisor.runner(),
            &first,
            cwd_for(idx),
            SplitDirection::Vertical,
        )?;
        // Re-tile after every split so small terminals don't run out of
        // room for further splits.
        supervisor
            .runner()
            .run(&["select-layout", "-t", &group.name, &group.layout])?;
    }
    Ok(())
}

async fn start_service(
    supervisor: &Arc<Supervisor>,
    session: &str,
    service: &ServiceSpec,
) -> Result<ServiceReport, TermtapError> {
    let address = format!("{session}:0.{}", service.pane);
    let pane = supervisor.pane(&address)?;

    let timeout = service
        .timeout_secs
        .map(Duration::from_secs_f64)
        .unwrap_or(DEFAULT_SERVICE_TIMEOUT);

    let mut request = ExecuteRequest::new(&service.command).with_timeout(timeout);
    match &service.ready_pattern {
        Some(pattern) => request = request.with_ready_pattern(pattern),
        // No readiness signal: fire and keep going.
        None => request = request.no_wait(),
    }

    let result = pane.execute(request).await?;
    tracing::info!(service = %service.name, status = %result.status, "service started");
    Ok(ServiceReport {
        name: service.name.clone(),
        pane_address: address,
        status: result.status,
    })
}

/// Kahn's algorithm, returning services grouped by dependency level.
fn sort_by_dependencies(services: &[ServiceSpec]) -> Result<Vec<Vec<ServiceSpec>>, TermtapError> {
    let names: HashSet<&str> = services.iter().map(|s| s.name.as_str()).collect();
    for service in services {
        for dep in &service.depends_on {
            if !names.contains(dep.as_str()) {
                return Err(TermtapError::InitGroup(format!(
                    "service '{}' depends on unknown service '{dep}'",
                    service.name
                )));
            }
        }
    }

    let mut remaining: Vec<ServiceSpec> = services.to_vec();
    let mut started: HashSet<String> = HashSet::new();
    let mut levels = Vec::new();

    while !remaining.is_empty() {
        let (ready, rest): (Vec<ServiceSpec>, Vec<ServiceSpec>) = remaining
            .into_iter()
            .partition(|s| s.depends_on.iter().all(|d| started.contains(d)));
        if ready.is_empty() {
            let names: Vec<&str> = rest.iter().map(|s| s.name.as_str()).collect();
            return Err(TermtapError::InitGroup(format!(
                "dependency cycle among: {}",
                names.join(", ")
            )));
        }
        started.extend(ready.iter().map(|s| s.name.clone()));
        levels.push(ready);
        remaining = rest;
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, deps: &[&str]) -> ServiceSpec {
        ServiceSpec {
            name: name.to_string(),
            command: format!("run-{name}"),
            pane: 0,
            cwd: None,
            ready_pattern: None,
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            timeout_secs: None,
        }
    }

    #[test]
    fn sort_independent_services_one_level() {
        let levels =
            sort_by_dependencies(&[service("a", &[]), service("b", &[])]).expect("sort");
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].len(), 2);
    }

    #[test]
    fn sort_chain_is_levelled() {
        let levels = sort_by_dependencies(&[
            service("frontend", &["backend"]),
            service("backend", &["db"]),
            service("db", &[]),
        ])
        .expect("sort");
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0][0].name, "db");
        assert_eq!(levels[1][0].name, "backend");
        assert_eq!(levels[2][0].name, "frontend");
    }

    #[test]
    fn sort_diamond_dependencies() {
        let levels = sort_by_dependencies(&[
            service("app", &["api", "worker"]),
            service("api", &["db"]),
            service("worker", &["db"]),
            service("db", &[]),
        ])
        .expect("sort");
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[1].len(), 2, "api and worker share a level");
    }

    #[test]
    fn sort_cycle_is_error() {
        let err = sort_by_dependencies(&[service("a", &["b"]), service("b", &["a"])]).unwrap_err();
        match err {
            TermtapError::InitGroup(msg) => assert!(msg.contains("cycle")),
            other => panic!("expected InitGroup, got {other:?}"),
        }
    }

    #[test]
    fn sort_unknown_dependency_is_error() {
        let err = sort_by_dependencies(&[service("a", &["ghost"])]).unwrap_err();
        match err {
            TermtapError::InitGroup(msg) => assert!(msg.contains("ghost")),
            other => panic!("expected InitGroup, got {other:?}"),
        }
    }
}
