//! Connection target and driver options.

use serde::{Deserialize, Serialize};

use crate::error::{IbrsError, Result};

/// Where to connect. Assembled into the `host/port:dbname` target string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Server host; `None` attaches to a local database.
    pub host: Option<String>,
    /// Server port; only used together with a host.
    pub port: Option<u16>,
    /// Database path or alias on the server.
    pub dbname: String,
    /// Connection character set.
    pub charset: Option<String>,
    /// SQL role to assume after attaching.
    pub role: Option<String>,
}

impl ConnectionParams {
    pub fn new(dbname: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Renders the target string: `host/port:dbname`, `host:dbname` without
    /// a port, or just `dbname` without a host.
    pub fn dsn(&self) -> String {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => format!("{}/{}:{}", host, port, self.dbname),
            (Some(host), None) => format!("{}:{}", host, self.dbname),
            (None, _) => self.dbname.clone(),
        }
    }
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// The engine's closest isolation clause. The engine never reads
    /// uncommitted data, so read-uncommitted shares read-committed's clause.
    pub fn sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted | IsolationLevel::ReadCommitted => {
                "READ COMMITTED RECORD_VERSION"
            }
            IsolationLevel::RepeatableRead => "SNAPSHOT",
            IsolationLevel::Serializable => "SNAPSHOT TABLE STABILITY",
        }
    }
}

/// Server-side lock-wait policy of a transaction.
/// Configured as an integer: `-1` waits forever, `0` does not wait, `n > 0`
/// waits `n` seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum WaitPolicy {
    #[default]
    Forever,
    NoWait,
    Timeout(u32),
}

impl TryFrom<i32> for WaitPolicy {
    type Error = IbrsError;

    fn try_from(seconds: i32) -> Result<Self> {
        match seconds {
            -1 => Ok(WaitPolicy::Forever),
            0 => Ok(WaitPolicy::NoWait),
            n if n > 0 => Ok(WaitPolicy::Timeout(n as u32)),
            n => Err(IbrsError::Config(format!(
                "lock wait must be -1, 0 or a positive number of seconds, got {}",
                n
            ))),
        }
    }
}

impl From<WaitPolicy> for i32 {
    fn from(policy: WaitPolicy) -> i32 {
        match policy {
            WaitPolicy::Forever => -1,
            WaitPolicy::NoWait => 0,
            WaitPolicy::Timeout(n) => n.min(i32::MAX as u32) as i32,
        }
    }
}

impl WaitPolicy {
    pub fn sql(self) -> String {
        match self {
            WaitPolicy::Forever => "WAIT".to_string(),
            WaitPolicy::NoWait => "NO WAIT".to_string(),
            WaitPolicy::Timeout(n) => format!("WAIT LOCK TIMEOUT {}", n),
        }
    }
}

/// Options recognized by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Default isolation of every transaction the connection opens.
    pub isolation: IsolationLevel,
    /// Lock-wait policy of every transaction the connection opens.
    pub lock_wait: WaitPolicy,
    /// Commit after every statement unless a transaction was begun explicitly.
    pub autocommit: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            isolation: IsolationLevel::default(),
            lock_wait: WaitPolicy::default(),
            autocommit: true,
        }
    }
}

impl DriverOptions {
    pub fn isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    /// Sets the lock wait from the integer convention (-1, 0, n).
    pub fn lock_wait(mut self, seconds: i32) -> Result<Self> {
        self.lock_wait = WaitPolicy::try_from(seconds)?;
        Ok(self)
    }

    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions {
            isolation: self.isolation,
            wait: self.lock_wait,
        }
    }
}

/// Parameters of a single native transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub isolation: IsolationLevel,
    pub wait: WaitPolicy,
}

impl TransactionOptions {
    /// The statement that starts a transaction with these options.
    pub fn start_sql(&self) -> String {
        format!(
            "SET TRANSACTION READ WRITE ISOLATION LEVEL {} {}",
            self.isolation.sql(),
            self.wait.sql()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsn_formats() {
        let full = ConnectionParams::new("/data/app.fdb").host("db").port(3050);
        assert_eq!(full.dsn(), "db/3050:/data/app.fdb");
        let no_port = ConnectionParams::new("app").host("db");
        assert_eq!(no_port.dsn(), "db:app");
        let local = ConnectionParams::new("app").port(3050);
        assert_eq!(local.dsn(), "app");
    }

    #[test]
    fn test_start_sql() {
        let options = TransactionOptions {
            isolation: IsolationLevel::Serializable,
            wait: WaitPolicy::Timeout(5),
        };
        assert_eq!(
            options.start_sql(),
            "SET TRANSACTION READ WRITE ISOLATION LEVEL SNAPSHOT TABLE STABILITY WAIT LOCK TIMEOUT 5"
        );
        let defaults = TransactionOptions::default();
        assert_eq!(
            defaults.start_sql(),
            "SET TRANSACTION READ WRITE ISOLATION LEVEL READ COMMITTED RECORD_VERSION WAIT"
        );
    }

    #[test]
    fn test_wait_policy_from_integer() {
        assert_eq!(WaitPolicy::try_from(-1).unwrap(), WaitPolicy::Forever);
        assert_eq!(WaitPolicy::try_from(0).unwrap(), WaitPolicy::NoWait);
        assert_eq!(WaitPolicy::try_from(30).unwrap(), WaitPolicy::Timeout(30));
        assert!(matches!(
            WaitPolicy::try_from(-5),
            Err(IbrsError::Config(_))
        ));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: DriverOptions =
            serde_json::from_str(r#"{"isolation": "repeatable-read", "lock_wait": 0}"#).unwrap();
        assert_eq!(options.isolation, IsolationLevel::RepeatableRead);
        assert_eq!(options.lock_wait, WaitPolicy::NoWait);
        assert!(options.autocommit);
    }

    #[test]
    fn test_options_reject_bad_values() {
        assert!(serde_json::from_str::<DriverOptions>(r#"{"lock_wait": -3}"#).is_err());
        assert!(serde_json::from_str::<DriverOptions>(r#"{"isolation": "chaos"}"#).is_err());
    }

    #[test]
    fn test_params_round_trip() {
        let params = ConnectionParams::new("app").host("db").port(3050).charset("UTF8");
        let json = serde_json::to_string(&params).unwrap();
        let back: ConnectionParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
