//! The in-memory credential table

use crate::CredentialEntry;
use std::collections::HashMap;

/// Host-keyed credential table built by the config parser.
///
/// Inserting an entry for a host that is already present replaces the
/// earlier entry, plain-map style; later records in a configuration file
/// silently win over earlier ones. The table is never mutated after a load
/// completes; queries run against a published, immutable snapshot.
#[derive(Debug, Default)]
pub struct CredentialTable {
    entries: HashMap<String, CredentialEntry>,
}

impl CredentialTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, keyed by its server host. Last write wins.
    pub fn insert(&mut self, entry: CredentialEntry) {
        self.entries.insert(entry.server_host.clone(), entry);
    }

    /// Look up the entry for a server host
    pub fn get(&self, host: &str) -> Option<&CredentialEntry> {
        self.entries.get(host)
    }

    /// Iterate over all entries
    pub fn entries(&self) -> impl Iterator<Item = &CredentialEntry> {
        self.entries.values()
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
