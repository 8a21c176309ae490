//! Credential lookup over a loaded table

mod matcher;

pub use matcher::PatternError;

use crate::table::CredentialTable;
use crate::LookupResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers lookup queries against one published table snapshot.
///
/// Holding an `Arc` snapshot keeps queries immune to concurrent
/// reconfiguration: a resolver created before a table swap keeps answering
/// from the table it was created with, and never observes a partially built
/// replacement.
pub struct CredentialResolver {
    table: Arc<CredentialTable>,
}

impl CredentialResolver {
    /// Create a resolver over a table snapshot
    pub fn new(table: Arc<CredentialTable>) -> Self {
        Self { table }
    }

    /// Look up an opaque identity key directly.
    ///
    /// The key is trimmed and matched exactly against the table; no
    /// requester pattern is consulted on this path.
    pub fn resolve_by_key(&self, identity: &str) -> LookupResult {
        match self.table.get(identity.trim()) {
            Some(entry) => LookupResult::Found(entry.auth.clone()),
            None => LookupResult::NotFound,
        }
    }

    /// Look up credentials for a destination host on behalf of a requester
    /// identity.
    ///
    /// A missing requester, or an entry without a pattern, matches
    /// unconditionally. Every internal failure, including a pattern that
    /// fails to compile, collapses to `NotFound`; this path never errors
    /// outward.
    pub fn resolve_by_endpoint(&self, host: &str, requester: Option<&str>) -> LookupResult {
        let host = host.trim();
        let Some(entry) = self.table.get(host) else {
            debug!(host, "no credential entry for server");
            return LookupResult::NotFound;
        };

        let (Some(requester), Some(pattern)) = (requester, entry.requester_pattern.as_deref())
        else {
            // Nothing to check, or nothing to check against: the entry
            // applies unconditionally.
            return LookupResult::Found(entry.auth.clone());
        };

        match matcher::requester_matches(pattern, requester) {
            Ok(true) => {
                debug!(host, pattern, "requester accepted");
                LookupResult::Found(entry.auth.clone())
            }
            Ok(false) => {
                debug!(host, pattern, requester, "requester does not match entry pattern");
                LookupResult::NotFound
            }
            Err(err) => {
                warn!(host, error = %err, "requester pattern rejected");
                LookupResult::NotFound
            }
        }
    }
}
