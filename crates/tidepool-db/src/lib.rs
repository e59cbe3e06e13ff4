pub mod convert;
pub mod error;
pub mod feed;
pub mod graph;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod search;
pub mod users;

pub use error::{Result, StoreError};

use rusqlite::{Connection, InterruptHandle, OpenFlags};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DbOptions {
    /// Read-only connections handed out round-robin to queries.
    pub reader_pool_size: usize,
    /// How long a statement waits on a locked database before failing with `Timeout`.
    pub busy_timeout: Duration,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            reader_pool_size: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

struct Pool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

/// Entity store: one writer connection plus a pool of read-only connections.
///
/// Cloning is cheap and shares the connections. A clone made with
/// [`Database::for_call`] is bound to a [`StoreCall`] and stops touching the
/// database once that call is cancelled.
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool>,
    call: Option<StoreCall>,
}

impl Database {
    pub fn open(path: &Path, options: &DbOptions) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        writer.busy_timeout(options.busy_timeout)?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(options.reader_pool_size);
        for _ in 0..options.reader_pool_size {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(options.busy_timeout)?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            readers.len()
        );
        Ok(Self::from_connections(writer, readers))
    }

    /// Private in-memory database. Reads go through the writer connection.
    pub fn open_in_memory() -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        writer.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&writer)?;

        Ok(Self::from_connections(writer, Vec::new()))
    }

    fn from_connections(writer: Connection, readers: Vec<Mutex<Connection>>) -> Self {
        Self {
            pool: Arc::new(Pool {
                writer: Mutex::new(writer),
                readers,
                reader_idx: AtomicUsize::new(0),
            }),
            call: None,
        }
    }

    /// A handle on the same connections whose work is abandoned once `call`
    /// is cancelled.
    pub fn for_call(&self, call: &StoreCall) -> Database {
        Database {
            pool: Arc::clone(&self.pool),
            call: Some(call.clone()),
        }
    }

    /// `Timeout` once the bound call has been cancelled. Mutations check this
    /// right before committing.
    pub(crate) fn ensure_live(&self) -> Result<()> {
        match &self.call {
            Some(call) if call.is_cancelled() => Err(StoreError::Timeout),
            _ => Ok(()),
        }
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        if self.pool.readers.is_empty() {
            return self.with_conn_mut(|conn| f(conn));
        }

        let idx = self.pool.reader_idx.fetch_add(1, Ordering::Relaxed) % self.pool.readers.len();
        let conn = self.pool.readers[idx]
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("reader lock poisoned: {}", e)))?;
        let _attached = self.attach(&conn)?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .pool
            .writer
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("writer lock poisoned: {}", e)))?;
        let _attached = self.attach(&conn)?;
        f(&mut conn)
    }

    // The returned guard must be dropped before the connection lock is released.
    fn attach(&self, conn: &Connection) -> Result<Option<Attached<'_>>> {
        match &self.call {
            Some(call) => call.attach(conn).map(Some),
            None => Ok(None),
        }
    }
}

/// Cancellation for one store call.
///
/// While the call holds a connection, [`StoreCall::cancel`] interrupts the
/// statement running on it. Once cancelled, the call cannot pick up another
/// connection or commit a mutation.
#[derive(Clone, Default)]
pub struct StoreCall {
    state: Arc<Mutex<CallState>>,
}

#[derive(Default)]
struct CallState {
    cancelled: bool,
    interrupt: Option<InterruptHandle>,
}

impl StoreCall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut state = self.lock();
        state.cancelled = true;
        if let Some(handle) = &state.interrupt {
            warn!("Interrupting cancelled store call");
            handle.interrupt();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    fn attach(&self, conn: &Connection) -> Result<Attached<'_>> {
        let mut state = self.lock();
        if state.cancelled {
            return Err(StoreError::Timeout);
        }
        state.interrupt = Some(conn.get_interrupt_handle());
        Ok(Attached(self))
    }

    fn lock(&self) -> MutexGuard<'_, CallState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Attached<'a>(&'a StoreCall);

impl Drop for Attached<'_> {
    fn drop(&mut self) {
        self.0.lock().interrupt = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{add_post, add_user, seeded};

    #[test]
    fn cancelled_call_touches_nothing() {
        let db = seeded();
        let call = StoreCall::new();
        let scoped = db.for_call(&call);

        assert!(scoped.is_following("alice", "bob").unwrap());
        call.cancel();

        assert!(matches!(scoped.follow("carol", "bob"), Err(StoreError::Timeout)));
        assert!(matches!(scoped.is_following("alice", "bob"), Err(StoreError::Timeout)));
        assert!(!db.is_following("carol", "bob").unwrap());
    }

    #[test]
    fn cancel_interrupts_a_running_statement() {
        let db = seeded();
        let call = StoreCall::new();
        let scoped = db.for_call(&call);

        let runaway = std::thread::spawn(move || {
            scoped.with_conn(|conn| {
                Ok(conn.query_row(
                    "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n)
                     SELECT count(*) FROM n",
                    [],
                    |row| row.get::<_, i64>(0),
                )?)
            })
        });

        std::thread::sleep(Duration::from_millis(50));
        call.cancel();

        assert!(matches!(runaway.join().unwrap(), Err(StoreError::Timeout)));
        // the connection is usable again for other calls
        assert!(db.is_following("alice", "bob").unwrap());
    }

    #[test]
    fn file_backed_readers_see_committed_writes() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(
            &dir.path().join("tidepool.db"),
            &DbOptions {
                reader_pool_size: 2,
                ..DbOptions::default()
            },
        )
        .unwrap();

        add_user(&db, "u-alice", "alice");
        add_user(&db, "u-bob", "bob");
        db.follow("alice", "bob").unwrap();
        add_post(&db, "1", "bob", "Cat nap", &["cat"]);

        // round-robin over two readers: each query lands on both
        for _ in 0..2 {
            assert!(db.is_following("alice", "bob").unwrap());
        }
        for _ in 0..2 {
            assert_eq!(db.home_feed("alice").unwrap().len(), 1);
        }

        let mode: String = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(mode, "wal");

        let write = db.with_conn(|conn| Ok(conn.execute("DELETE FROM posts", [])?));
        assert!(write.is_err());
        assert_eq!(db.post_count().unwrap(), 1);
    }
}
