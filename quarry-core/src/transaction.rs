use crate::{Connection, Database, Error, Executor, Result, Session, SqlError, TransactionIsolation};
use std::{cell::RefCell, fmt, rc::Rc};

#[derive(Default)]
struct TransactionState {
    /// Acquired on the first statement.
    connection: Option<Box<dyn Connection>>,
    original_auto_commit: bool,
    /// Set only when the isolation level was changed.
    original_isolation: Option<TransactionIsolation>,
    closed: bool,
}

struct TransactionInner {
    database: Database,
    isolation: Option<TransactionIsolation>,
    state: RefCell<TransactionState>,
}

/// A unit of work spanning several statements on the same connection.
///
/// Handles are created by [`Database::use_transaction`] and stay on the thread that opened them.
/// Nested scopes join the transaction through [`Transaction::use_transaction`]: only the
/// outermost scope commits or rolls back.
#[derive(Clone)]
pub struct Transaction {
    inner: Rc<TransactionInner>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.try_borrow();
        f.debug_struct("Transaction")
            .field("isolation", &self.inner.isolation)
            .field(
                "connected",
                &state.as_ref().map(|v| v.connection.is_some()).ok(),
            )
            .field("closed", &state.as_ref().map(|v| v.closed).ok())
            .finish()
    }
}

/// Rolls back unless committed, then closes. Runs on error returns and on panics alike.
struct TransactionGuard<'a> {
    transaction: &'a Transaction,
    committed: bool,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = self.transaction.rollback() {
                log::warn!("Failed to rollback the transaction: {:#}", e);
            }
        }
        self.transaction.close();
    }
}

impl Transaction {
    pub(crate) fn run<R>(
        database: Database,
        isolation: Option<TransactionIsolation>,
        f: impl FnOnce(&Transaction) -> Result<R>,
    ) -> Result<R> {
        let transaction = Transaction {
            inner: Rc::new(TransactionInner {
                database,
                isolation,
                state: Default::default(),
            }),
        };
        let mut guard = TransactionGuard {
            transaction: &transaction,
            committed: false,
        };
        let result = f(&transaction)?;
        transaction.commit()?;
        guard.committed = true;
        Ok(result)
    }

    /// Run `f` in this transaction, the outermost scope decides how it ends.
    pub fn use_transaction<R>(&self, f: impl FnOnce(&Transaction) -> Result<R>) -> Result<R> {
        f(self)
    }

    pub fn isolation(&self) -> Option<TransactionIsolation> {
        self.inner.isolation
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .state
            .try_borrow()
            .map(|v| v.closed)
            .unwrap_or(false)
    }

    fn begin(&self, state: &mut TransactionState) -> Result<Box<dyn Connection>> {
        let mut connection = self.inner.database.connection()?;
        state.original_auto_commit = connection.auto_commit();
        if let Some(isolation) = self.inner.isolation {
            let original = connection.transaction_isolation()?;
            if original != isolation {
                connection.set_transaction_isolation(isolation)?;
                state.original_isolation = Some(original);
            }
        }
        connection.set_auto_commit(false)?;
        log::debug!(target: "quarry::sql", "Transaction started");
        Ok(connection)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut TransactionState) -> Result<R>) -> Result<R> {
        let mut state = self
            .inner
            .state
            .try_borrow_mut()
            .map_err(|_| Error::msg("The transaction connection is already in use"))?;
        f(&mut state)
    }

    fn commit(&self) -> Result<()> {
        self.with_state(|state| match state.connection.as_mut() {
            Some(connection) => {
                connection.commit()?;
                log::debug!(target: "quarry::sql", "Transaction committed");
                Ok(())
            }
            None => Ok(()),
        })
        .map_err(|e| self.inner.database.translate(e))
    }

    fn rollback(&self) -> Result<()> {
        self.with_state(|state| match state.connection.as_mut() {
            Some(connection) => {
                connection.rollback()?;
                log::debug!(target: "quarry::sql", "Transaction rolled back");
                Ok(())
            }
            None => Ok(()),
        })
        .map_err(|e| self.inner.database.translate(e))
    }

    /// Restore the connection settings, best effort, and release it.
    fn close(&self) {
        let Ok(mut state) = self.inner.state.try_borrow_mut() else {
            log::warn!("Cannot close a transaction while its connection is in use");
            return;
        };
        if let Some(mut connection) = state.connection.take() {
            if let Some(isolation) = state.original_isolation.take() {
                if let Err(e) = connection.set_transaction_isolation(isolation) {
                    log::warn!(
                        "Failed to restore the transaction isolation {}: {:#}",
                        isolation,
                        e
                    );
                }
            }
            if let Err(e) = connection.set_auto_commit(state.original_auto_commit) {
                log::warn!("Failed to restore the auto commit mode: {:#}", e);
            }
        }
        state.closed = true;
    }
}

impl Executor for Transaction {
    fn database(&self) -> &Database {
        &self.inner.database
    }

    fn use_connection<R>(&self, f: impl FnOnce(&mut dyn Connection) -> Result<R>) -> Result<R> {
        self.with_state(|state| {
            if state.closed {
                return Err(SqlError::TransactionClosed.into());
            }
            let connection = match state.connection.take() {
                Some(connection) => connection,
                None => self.begin(state)?,
            };
            let connection = state.connection.insert(connection);
            f(connection.as_mut())
        })
        .map_err(|e| self.inner.database.translate(e))
    }

    fn session(&self) -> Session {
        Session::Transaction(self.clone())
    }
}
