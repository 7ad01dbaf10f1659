use std::sync::Arc;

use crate::config::{ConnectionParams, DriverOptions};
use crate::connection::Connection;
use crate::error::{IbrsError, NativeError, Result};
use crate::traits::{DatabasePlatform, DefaultPlatform, NativeClient, SchemaManager};
use crate::translator;

/// Entry point used by the host framework.
///
/// Holds the native client and the external collaborators, and opens
/// [`Connection`]s.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use ibrs::{ConnectionParams, Driver, DriverOptions};
/// use ibrs::drivers::InMemoryTestClient;
///
/// let driver = Driver::new(Arc::new(InMemoryTestClient::new()));
/// let params = ConnectionParams::new("app.fdb");
/// let conn = driver
///     .connect(&params, Some("SYSDBA"), Some("masterkey"), &DriverOptions::default())
///     .unwrap();
/// conn.exec("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(50))").unwrap();
/// assert_eq!(conn.exec("INSERT INTO users VALUES (1, 'John')").unwrap(), 1);
/// ```
#[derive(Clone)]
pub struct Driver {
    client: Arc<dyn NativeClient>,
    platform: Arc<dyn DatabasePlatform>,
    schema_manager: Option<Arc<dyn SchemaManager>>,
}

impl Driver {
    pub fn new(client: Arc<dyn NativeClient>) -> Self {
        Self {
            client,
            platform: Arc::new(DefaultPlatform),
            schema_manager: None,
        }
    }

    pub fn with_platform(mut self, platform: Arc<dyn DatabasePlatform>) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_schema_manager(mut self, schema_manager: Arc<dyn SchemaManager>) -> Self {
        self.schema_manager = Some(schema_manager);
        self
    }

    /// Attaches to the target and opens the initial transaction.
    pub fn connect(
        &self,
        params: &ConnectionParams,
        user: Option<&str>,
        password: Option<&str>,
        options: &DriverOptions,
    ) -> Result<Connection> {
        Connection::open(
            Arc::clone(&self.client),
            Arc::clone(&self.platform),
            params,
            user,
            password,
            options,
        )
    }

    pub fn database_platform(&self) -> &dyn DatabasePlatform {
        &*self.platform
    }

    pub fn schema_manager(&self) -> Result<&dyn SchemaManager> {
        self.schema_manager
            .as_deref()
            .ok_or_else(|| IbrsError::usage("no schema manager configured"))
    }

    /// Converts a native error into its typed error, reporting `message`.
    pub fn convert_exception(&self, message: &str, native: &NativeError) -> IbrsError {
        translator::convert_exception(message, native)
    }
}
