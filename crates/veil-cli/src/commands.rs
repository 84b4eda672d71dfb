//! Command implementations.
//!
//! Every command except `config` runs against a [`Session`]: a
//! [`MemoryHost`] loaded from the configured fixture, with the overlay wired
//! over it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use veil_acl::{ConfidentialityHooks, PropagationReport, QueryFragment, Target};
use veil_api::{AppState, Server};
use veil_auth::DirectoryResolver;
use veil_core::{Decision, DocKind, Error, Operation, RecordId, Result, RoleDirectory};
use veil_storage::MemoryHost;

use crate::config::VeilConfig;

/// A fixture-backed host and the hooks over it.
pub struct Session {
    /// The loaded host
    pub host: Arc<MemoryHost>,
    /// The overlay
    pub hooks: Arc<ConfidentialityHooks>,
    fixture: PathBuf,
}

impl Session {
    /// Load the fixture named by `config` (or `fixture`, if given).
    ///
    /// # Errors
    ///
    /// Fails if no fixture is configured or it can't be loaded.
    pub async fn open(config: &VeilConfig, fixture: Option<&Path>) -> Result<Self> {
        let fixture = config.fixture_path(fixture)?;
        let host = Arc::new(MemoryHost::from_fixture(&fixture).await?);
        let hooks = Arc::new(ConfidentialityHooks::new(
            host.clone(),
            host.clone(),
            &config.acl,
        ));
        log::debug!("Opened host fixture {}", fixture.display());
        Ok(Self {
            host,
            hooks,
            fixture,
        })
    }

    /// The fixture file backing this session.
    pub fn fixture(&self) -> &Path {
        &self.fixture
    }

    /// Write the host back to its fixture.
    ///
    /// # Errors
    ///
    /// Fails if the file can't be written.
    pub async fn save(&self) -> Result<()> {
        self.host.save_fixture(&self.fixture).await
    }
}

/// Evaluate `op` on one record as `user`.
///
/// # Errors
///
/// Fails on an unknown kind or operation.
pub async fn check(
    session: &Session,
    user: &str,
    kind: &str,
    id: &str,
    op: &str,
) -> Result<Decision> {
    let kind: DocKind = kind.parse()?;
    let op: Operation = op.parse()?;
    let principal = session.host.principal(user).await?;
    let id = RecordId::new(id);
    Ok(session
        .hooks
        .has_permission(kind, Target::Id(&id), &principal, op)
        .await)
}

/// The list condition for `user` on `kind`.
///
/// # Errors
///
/// Fails on an unknown kind.
pub async fn filter(session: &Session, user: &str, kind: &str) -> Result<QueryFragment> {
    let kind: DocKind = kind.parse()?;
    let principal = session.host.principal(user).await?;
    Ok(session.hooks.list_filter(kind, &principal).await)
}

/// Re-propagate every BOM and save the fixture.
///
/// The fixture is saved even when some dependents failed, so the ones that
/// succeeded are kept.
///
/// # Errors
///
/// Fails if the BOMs can't be listed or the fixture can't be written.
pub async fn resync(session: &Session) -> Result<PropagationReport> {
    let report = session.hooks.resync_all().await?;
    for failure in &report.failed {
        log::warn!("{}", Error::from(failure));
    }
    session.save().await?;
    Ok(report)
}

/// Serve the HTTP API over the session's host until Ctrl-C.
///
/// # Errors
///
/// Fails on an invalid address or if the server can't run.
pub async fn serve(
    session: &Session,
    config: &VeilConfig,
    addr: Option<&str>,
) -> veil_api::Result<()> {
    let addr = addr.unwrap_or(&config.server.addr);
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| Error::config(format!("Invalid listen address '{addr}': {e}")))?;
    if !config.auth.enabled {
        log::warn!(
            "Auth disabled; tokenless requests act as '{}' and bearer tokens are taken as user names",
            config.auth.anonymous_user
        );
    }
    let state = AppState::new(session.hooks.clone(), session.host.clone());
    let resolver = Arc::new(DirectoryResolver::new(session.host.clone()));
    Server::from_parts(addr, state, resolver, config.auth.clone())?
        .run()
        .await
}
