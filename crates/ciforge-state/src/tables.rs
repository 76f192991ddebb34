//! redb table definitions for the config store.

use redb::TableDefinition;

/// Deployment config records keyed by deployment name.
pub const CONFIGS: TableDefinition<&str, &[u8]> = TableDefinition::new("configs");

/// Opaque assets keyed by `{deployment}/{asset}`.
pub const ASSETS: TableDefinition<&str, &[u8]> = TableDefinition::new("assets");
