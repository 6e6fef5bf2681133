/// All entity identifiers (agents, pairings, commands, VMs, tenants)
/// are UUIDs; new rows use UUIDv7 so index order follows insert order.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
