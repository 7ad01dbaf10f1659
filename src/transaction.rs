//! Transaction state machine.
//!
//! The engine cannot hold a connection without a transaction, so one is
//! always live. It is either *implicit* (opened by the driver, committed
//! with commit-retaining after every statement while autocommit is on) or
//! *explicit* (opened by `begin`, finished by `commit`/`rollback`). Finishing
//! either kind immediately opens a new implicit one. The transitions below
//! are the only place transaction handles are opened or finalized.

use std::sync::Arc;

use crate::config::TransactionOptions;
use crate::error::{IbrsError, NativeError, Result};
use crate::guard::Guarded;
use crate::traits::{ConnectionHandle, NativeClient, TransactionHandle};

/// Who opened the live transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOrigin {
    /// Opened by the driver to emulate autocommit
    Implicit,
    /// Opened by the caller through `begin_transaction`
    Explicit,
}

#[derive(Debug, Clone, Copy)]
enum Finish {
    Commit,
    Rollback,
}

struct ActiveTransaction {
    guard: Guarded<TransactionHandle>,
    origin: TransactionOrigin,
}

pub(crate) struct TransactionManager {
    client: Arc<dyn NativeClient>,
    connection: ConnectionHandle,
    options: TransactionOptions,
    autocommit: bool,
    active: Option<ActiveTransaction>,
}

fn transaction_error(native: NativeError) -> IbrsError {
    IbrsError::Transaction(native)
}

fn no_transaction() -> IbrsError {
    IbrsError::transaction("no transaction active")
}

impl TransactionManager {
    /// Opens the initial implicit transaction.
    pub(crate) fn start(
        client: Arc<dyn NativeClient>,
        connection: ConnectionHandle,
        options: TransactionOptions,
        autocommit: bool,
    ) -> Result<Self> {
        let mut manager = Self {
            client,
            connection,
            options,
            autocommit,
            active: None,
        };
        manager.open(TransactionOrigin::Implicit)?;
        Ok(manager)
    }

    pub(crate) fn handle(&self) -> Option<TransactionHandle> {
        self.active.as_ref().map(|a| a.guard.get())
    }

    pub(crate) fn origin(&self) -> Option<TransactionOrigin> {
        self.active.as_ref().map(|a| a.origin)
    }

    pub(crate) fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Switches autocommit. Turning it on while an implicit transaction is
    /// live commits that transaction's pending work.
    pub(crate) fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        let enabling = autocommit && !self.autocommit;
        self.autocommit = autocommit;
        if enabling {
            self.auto_commit()?;
        }
        Ok(())
    }

    /// Commits whatever is pending and opens an explicit transaction.
    ///
    /// The engine has no nested transactions, so a `begin` inside an explicit
    /// transaction also commits the outer work first.
    pub(crate) fn begin(&mut self) -> Result<()> {
        if self.active.is_some() {
            self.finish(Finish::Commit)?;
        }
        self.open(TransactionOrigin::Explicit)
    }

    pub(crate) fn commit(&mut self) -> Result<()> {
        self.finish(Finish::Commit)?;
        self.open(TransactionOrigin::Implicit)
    }

    pub(crate) fn rollback(&mut self) -> Result<()> {
        self.finish(Finish::Rollback)?;
        self.open(TransactionOrigin::Implicit)
    }

    /// Commit-and-retain after a statement, when autocommit applies.
    pub(crate) fn auto_commit(&mut self) -> Result<()> {
        if !self.autocommit {
            return Ok(());
        }
        let active = self.active.as_ref().ok_or_else(no_transaction)?;
        if active.origin == TransactionOrigin::Explicit {
            return Ok(());
        }
        let handle = active.guard.get();
        self.client
            .commit_retaining(handle)
            .map_err(transaction_error)?;
        tracing::trace!(%handle, "autocommit retained");
        Ok(())
    }

    /// Rolls back the live transaction, if any, without opening another.
    ///
    /// The handle gets exactly one rollback attempt: on failure the error is
    /// reported and the transaction is forgotten all the same.
    pub(crate) fn close(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };
        let handle = active.guard.get();
        active.guard.release().map_err(transaction_error)?;
        tracing::debug!(%handle, "transaction closed");
        Ok(())
    }

    fn open(&mut self, origin: TransactionOrigin) -> Result<()> {
        let handle = self
            .client
            .start_transaction(self.connection, &self.options)
            .map_err(transaction_error)?;
        tracing::debug!(%handle, ?origin, "transaction started");
        self.active = Some(ActiveTransaction {
            guard: Guarded::new(Arc::clone(&self.client), handle, |c, h| c.rollback(h)),
            origin,
        });
        Ok(())
    }

    /// Ends the live transaction. On failure the transaction stays live, as
    /// it does on the server.
    fn finish(&mut self, finish: Finish) -> Result<()> {
        let active = self.active.as_ref().ok_or_else(no_transaction)?;
        let handle = active.guard.get();
        let result = match finish {
            Finish::Commit => self.client.commit(handle),
            Finish::Rollback => self.client.rollback(handle),
        };
        result.map_err(transaction_error)?;
        if let Some(active) = self.active.take() {
            active.guard.disarm();
        }
        tracing::debug!(%handle, ?finish, "transaction finished");
        Ok(())
    }
}
