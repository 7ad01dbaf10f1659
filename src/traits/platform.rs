use crate::connection::Connection;
use crate::error::Result;

/// Dialect collaborator: emits the engine-specific statement text the
/// driver itself needs.
pub trait DatabasePlatform: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &str;

    /// Statement reading the current value of `sequence` as a single row
    /// with a single column.
    fn sequence_current_value_sql(&self, sequence: &str) -> String {
        format!("SELECT GEN_ID({}, 0) FROM RDB$DATABASE", sequence)
    }
}

/// Default dialect, used when the host framework provides none.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlatform;

impl DatabasePlatform for DefaultPlatform {
    fn name(&self) -> &str {
        "firebird"
    }
}

/// Introspection collaborator, handed a live connection by the driver.
pub trait SchemaManager: Send + Sync {
    /// Returns the names of the user tables visible on the connection.
    fn list_table_names(&self, connection: &Connection) -> Result<Vec<String>>;
}
