#![allow(dead_code)]

use std::sync::Arc;

use ibrs::drivers::InMemoryTestClient;
use ibrs::{Connection, ConnectionParams, Driver, DriverOptions, NativeClient};
use tracing_subscriber::EnvFilter;

pub const DSN: &str = "test.fdb";
pub const USER: &str = "SYSDBA";
pub const PASSWORD: &str = "masterkey";

/// Routes driver logs to the test output. Set `RUST_LOG=ibrs=trace` to see them.
pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn driver() -> (Arc<InMemoryTestClient>, Driver) {
    init_logs();
    let client = Arc::new(InMemoryTestClient::new().with_credentials(USER, PASSWORD));
    let driver = Driver::new(Arc::clone(&client) as Arc<dyn NativeClient>);
    (client, driver)
}

pub fn connect(driver: &Driver) -> Connection {
    connect_with(driver, &DriverOptions::default())
}

pub fn connect_with(driver: &Driver, options: &DriverOptions) -> Connection {
    driver
        .connect(&ConnectionParams::new(DSN), Some(USER), Some(PASSWORD), options)
        .unwrap()
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    let mut stmt = conn
        .query(&format!("SELECT COUNT(*) FROM {}", table))
        .unwrap();
    stmt.fetch_column(0).unwrap().and_then(|v| v.as_i64()).unwrap()
}
