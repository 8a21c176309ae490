//! The credential exit surface consumed by the hosting agent
//!
//! Lifecycle mirrors the host's extension-point contract: `initialize` runs
//! once per agent start (and again on reconfiguration), `resolve_*` once
//! per connection attempt, `shutdown` at agent stop. Nothing here ever
//! raises to the host: initialization reports success even when the
//! configuration is broken, and query failures surface as `NotFound`. The
//! design favors agent availability over strict configuration correctness;
//! problems surface only in the logs.

use crate::config::{ConfigError, ConfigParser};
use crate::resolver::CredentialResolver;
use crate::table::CredentialTable;
use crate::LookupResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Host property naming the credential configuration file
pub const CREDENTIAL_CONFIG_PROPERTY: &str = "protocolBridgeCredentialConfiguration";

/// Environment flag that turns on verbose diagnostic logging
pub const DEBUG_LOG_ENV: &str = "ENABLE_PBA_CREDENTIAL_DEBUG_LOG";

/// Credential exit: owns the current table and answers the host's queries.
///
/// The table reference is guarded by a read-mostly lock and replaced
/// wholesale on (re)initialization: the new table is built off to the side
/// and published in one swap, so in-flight queries never observe a
/// partially built table.
pub struct BridgeCredentialExit {
    table: RwLock<Arc<CredentialTable>>,
    debug_enabled: AtomicBool,
}

impl BridgeCredentialExit {
    /// Create an exit with an empty table; all lookups miss until
    /// `initialize` loads a configuration.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Arc::new(CredentialTable::new())),
            debug_enabled: AtomicBool::new(false),
        }
    }

    /// Initialize (or re-initialize) from the host's property map.
    ///
    /// Always returns `true`: the agent must be able to come up even with a
    /// broken credential configuration, so every failure is logged and
    /// swallowed. Lookups simply miss until a good configuration loads.
    pub fn initialize(&self, properties: &HashMap<String, String>) -> bool {
        let debug_enabled = std::env::var(DEBUG_LOG_ENV)
            .map(|value| value.trim() == "true")
            .unwrap_or(false);
        self.debug_enabled.store(debug_enabled, Ordering::Relaxed);

        let path = match properties.get(CREDENTIAL_CONFIG_PROPERTY) {
            Some(path) if !path.trim().is_empty() => path.trim().to_string(),
            _ => {
                error!("{}", ConfigError::ConfigMissing);
                self.publish(CredentialTable::new());
                return true;
            }
        };

        let outcome = ConfigParser::new().verbose(debug_enabled).load(&path);
        if outcome.loaded {
            info!(path, entries = outcome.table.len(), "credential table loaded");
        } else {
            warn!(path, "no credential entries loaded");
        }
        self.publish(outcome.table);
        true
    }

    /// Clear the table; subsequent lookups miss
    pub fn shutdown(&self) {
        self.publish(CredentialTable::new());
    }

    /// Resolve by raw identity key
    pub fn resolve_by_key(&self, identity: &str) -> LookupResult {
        if self.debug_enabled.load(Ordering::Relaxed) {
            debug!(identity, "resolving credentials by key");
        }
        self.resolver().resolve_by_key(identity)
    }

    /// Resolve by destination endpoint host and requester identity
    pub fn resolve_by_endpoint(&self, host: &str, requester: Option<&str>) -> LookupResult {
        if self.debug_enabled.load(Ordering::Relaxed) {
            debug!(host, requester, "resolving credentials for endpoint");
        }
        self.resolver().resolve_by_endpoint(host, requester)
    }

    fn publish(&self, table: CredentialTable) {
        *self.table.write() = Arc::new(table);
    }

    fn resolver(&self) -> CredentialResolver {
        CredentialResolver::new(Arc::clone(&self.table.read()))
    }
}

impl Default for BridgeCredentialExit {
    fn default() -> Self {
        Self::new()
    }
}
