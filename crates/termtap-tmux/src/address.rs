//! Pane address parsing and resolution.
//!
//! A target written by a human (or an RPC client) takes one of four shapes:
//! a raw pane id (`%42`), an explicit `session:window.pane` triple with
//! window and pane defaulting to 0, a bare session name resolving to every
//! pane of that session, or a `session.service` reference resolved through
//! configuration by the caller.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;
use crate::pane_info::{TmuxPaneInfo, list_panes};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no pane matches '{0}'")]
    NotFound(String),

    #[error("'{address}' matches multiple panes: {}", panes.join(", "))]
    Ambiguous { address: String, panes: Vec<String> },

    #[error(transparent)]
    Tmux(#[from] TmuxError),
}

/// A parsed pane target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneAddress {
    /// Raw pane id, e.g. `%42`.
    Id(String),
    /// Explicit `session:window.pane`; window/pane omitted in the input
    /// default to 0.
    Target {
        session: String,
        window: u32,
        pane: u32,
    },
    /// Bare session name — resolves to all panes of the session.
    Session(String),
    /// `session.service` — resolved through configuration by the caller.
    Service { session: String, service: String },
}

impl FromStr for PaneAddress {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ResolveError::NotFound(s.to_string()));
        }
        if s.starts_with('%') {
            return Ok(PaneAddress::Id(s.to_string()));
        }
        if let Some((session, rest)) = s.split_once(':') {
            let (window, pane) = match rest.split_once('.') {
                Some((w, p)) => (parse_index(s, w)?, parse_index(s, p)?),
                None => (parse_index(s, rest)?, 0),
            };
            return Ok(PaneAddress::Target {
                session: session.to_string(),
                window,
                pane,
            });
        }
        // `session.service` — service names are not numeric, which is what
        // distinguishes them from a window.pane suffix (that form always
        // carries a ':').
        if let Some((session, service)) = s.split_once('.') {
            if !session.is_empty() && !service.is_empty() {
                return Ok(PaneAddress::Service {
                    session: session.to_string(),
                    service: service.to_string(),
                });
            }
        }
        Ok(PaneAddress::Session(s.to_string()))
    }
}

fn parse_index(full: &str, part: &str) -> Result<u32, ResolveError> {
    if part.is_empty() {
        return Ok(0);
    }
    part.parse()
        .map_err(|_| ResolveError::NotFound(full.to_string()))
}

impl fmt::Display for PaneAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaneAddress::Id(id) => f.write_str(id),
            PaneAddress::Target {
                session,
                window,
                pane,
            } => write!(f, "{session}:{window}.{pane}"),
            PaneAddress::Session(name) => f.write_str(name),
            PaneAddress::Service { session, service } => write!(f, "{session}.{service}"),
        }
    }
}

/// Resolve an address to every matching pane.
///
/// A bare session matches all of its panes; the other shapes match at most
/// one. Service references are the caller's job (they need config) and
/// resolve to nothing here.
pub fn resolve_panes(
    runner: &impl TmuxCommandRunner,
    address: &PaneAddress,
) -> Result<Vec<TmuxPaneInfo>, ResolveError> {
    let panes = list_panes(runner)?;
    let matched: Vec<TmuxPaneInfo> = match address {
        PaneAddress::Id(id) => panes.into_iter().filter(|p| p.pane_id == *id).collect(),
        PaneAddress::Target {
            session,
            window,
            pane,
        } => panes
            .into_iter()
            .filter(|p| {
                p.session_name == *session && p.window_index == *window && p.pane_index == *pane
            })
            .collect(),
        PaneAddress::Session(name) => panes
            .into_iter()
            .filter(|p| p.session_name == *name)
            .collect(),
        PaneAddress::Service { .. } => Vec::new(),
    };
    if matched.is_empty() {
        return Err(ResolveError::NotFound(address.to_string()));
    }
    Ok(matched)
}

/// Resolve an address to exactly one pane.
///
/// A bare session that holds more than one pane is ambiguous for
/// single-pane operations; the error enumerates the candidates so the
/// driver can pick one.
pub fn resolve_single(
    runner: &impl TmuxCommandRunner,
    address: &PaneAddress,
) -> Result<TmuxPaneInfo, ResolveError> {
    let mut matched = resolve_panes(runner, address)?;
    if matched.len() > 1 {
        return Err(ResolveError::Ambiguous {
            address: address.to_string(),
            panes: matched.iter().map(|p| p.address()).collect(),
        });
    }
    Ok(matched.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pane_id() {
        let addr: PaneAddress = "%42".parse().expect("should parse");
        assert_eq!(addr, PaneAddress::Id("%42".to_string()));
    }

    #[test]
    fn parse_full_target() {
        let addr: PaneAddress = "dev:1.2".parse().expect("should parse");
        assert_eq!(
            addr,
            PaneAddress::Target {
                session: "dev".to_string(),
                window: 1,
                pane: 2
            }
        );
    }

    #[test]
    fn parse_session_window_defaults_pane() {
        let addr: PaneAddress = "dev:1".parse().expect("should parse");
        assert_eq!(
            addr,
            PaneAddress::Target {
                session: "dev".to_string(),
                window: 1,
                pane: 0
            }
        );
    }

    #[test]
    fn parse_bare_session() {
        let addr: PaneAddress = "dev".parse().expect("should parse");
        assert_eq!(addr, PaneAddress::Session("dev".to_string()));
    }

    #[test]
    fn parse_service_reference() {
        let addr: PaneAddress = "demo.backend".parse().expect("should parse");
        assert_eq!(
            addr,
            PaneAddress::Service {
                session: "demo".to_string(),
                service: "backend".to_string()
            }
        );
    }

    #[test]
    fn parse_empty_is_error() {
        assert!("".parse::<PaneAddress>().is_err());
        assert!("   ".parse::<PaneAddress>().is_err());
    }

    #[test]
    fn parse_bad_window_index_is_error() {
        assert!("dev:x.0".parse::<PaneAddress>().is_err());
    }

    #[test]
    fn display_round_trip() {
        for s in ["%3", "dev:0.0", "demo.backend", "main"] {
            let addr: PaneAddress = s.parse().expect("should parse");
            let shown = addr.to_string();
            let reparsed: PaneAddress = shown.parse().expect("should reparse");
            assert_eq!(addr, reparsed);
        }
    }

    struct TwoPaneRunner;
    impl TmuxCommandRunner for TwoPaneRunner {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            assert!(args.contains(&"list-panes"));
            Ok([
                "%0\tdemo\t0\t0\tdev\t1\t10",
                "%1\tdemo\t0\t1\tdev\t0\t11",
                "%2\tother\t0\t0\tmain\t1\t12",
            ]
            .join("\n"))
        }
    }

    #[test]
    fn resolve_session_returns_all_panes() {
        let addr: PaneAddress = "demo".parse().expect("parse");
        let panes = resolve_panes(&TwoPaneRunner, &addr).expect("resolve");
        assert_eq!(panes.len(), 2);
    }

    #[test]
    fn resolve_single_ambiguous_enumerates() {
        let addr: PaneAddress = "demo".parse().expect("parse");
        let err = resolve_single(&TwoPaneRunner, &addr).unwrap_err();
        match err {
            ResolveError::Ambiguous { panes, .. } => {
                assert_eq!(panes, vec!["demo:0.0".to_string(), "demo:0.1".to_string()]);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn resolve_single_by_id() {
        let addr: PaneAddress = "%2".parse().expect("parse");
        let pane = resolve_single(&TwoPaneRunner, &addr).expect("resolve");
        assert_eq!(pane.session_name, "other");
    }

    #[test]
    fn resolve_target_with_index() {
        let addr: PaneAddress = "demo:0.1".parse().expect("parse");
        let pane = resolve_single(&TwoPaneRunner, &addr).expect("resolve");
        assert_eq!(pane.pane_id, "%1");
    }

    #[test]
    fn resolve_unknown_is_not_found() {
        let addr: PaneAddress = "ghost".parse().expect("parse");
        let err = resolve_panes(&TwoPaneRunner, &addr).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[test]
    fn resolve_service_is_not_found_without_config() {
        let addr: PaneAddress = "demo.backend".parse().expect("parse");
        let err = resolve_panes(&TwoPaneRunner, &addr).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }
}
