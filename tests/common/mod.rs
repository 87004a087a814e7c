//! In-memory driver adapters shared by the integration tests.

#![allow(dead_code)]

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use postgres_mcp_server::db::{CatalogSource, RawValue, RowCursor, RowSource};
use postgres_mcp_server::error::{DbError, DbResult};
use postgres_mcp_server::models::{ColumnDescriptor, SchemaRow};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::io;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;

/// One scripted stream element.
#[derive(Debug, Clone)]
pub enum Step {
    Row(Vec<RawValue>),
    DecodeError(&'static str),
    StreamError(&'static str),
}

impl Step {
    fn into_result(self) -> DbResult<Vec<RawValue>> {
        match self {
            Step::Row(values) => Ok(values),
            Step::DecodeError(msg) => Err(DbError::decode(msg)),
            Step::StreamError(msg) => Err(DbError::database(msg, None, "check the query")),
        }
    }
}

/// Flags the drop of the stream that owns it.
struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Scripted row source that records every call.
#[derive(Default)]
pub struct StubRows {
    columns: Vec<ColumnDescriptor>,
    steps: Vec<Step>,
    open_error: Option<&'static str>,
    hang: bool,
    calls: AtomicUsize,
    seen_sql: Mutex<Vec<String>>,
    released: Arc<AtomicBool>,
}

impl StubRows {
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, ty)| ColumnDescriptor::new(*name, *ty))
                .collect(),
            ..Self::default()
        }
    }

    pub fn with_row(mut self, values: Vec<RawValue>) -> Self {
        self.steps.push(Step::Row(values));
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Fail when the cursor is opened, as a bad statement would.
    pub fn failing_open(mut self, message: &'static str) -> Self {
        self.open_error = Some(message);
        self
    }

    /// Never finish the stream after the scripted steps.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_sql(&self) -> Vec<String> {
        self.seen_sql.lock().unwrap().clone()
    }

    /// True once a cursor handed out by this source has been dropped.
    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl RowSource for StubRows {
    fn open<'a>(
        &'a self,
        sql: &'a str,
    ) -> impl Future<Output = DbResult<RowCursor<'a>>> + Send + 'a {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_sql.lock().unwrap().push(sql.to_string());

        let outcome = match self.open_error {
            Some(message) => Err(DbError::database(
                message,
                Some("42601".to_string()),
                "Check the SQL syntax and referenced objects",
            )),
            None => {
                let guard = ReleaseGuard(self.released.clone());
                let scripted = stream::iter(self.steps.clone()).map(Step::into_result);
                let rows: BoxStream<'a, DbResult<Vec<RawValue>>> = if self.hang {
                    scripted.chain(stream::pending()).boxed()
                } else {
                    scripted.boxed()
                };
                let rows = rows
                    .map(move |row| {
                        let _held = &guard;
                        row
                    })
                    .boxed();
                Ok(RowCursor {
                    columns: self.columns.clone(),
                    rows,
                })
            }
        };
        async move { outcome }
    }
}

/// Catalog source backed by a fixed row list. The table filter is applied the
/// way the catalog query applies it.
#[derive(Default)]
pub struct StubCatalog {
    rows: Vec<SchemaRow>,
    fail_after: Option<usize>,
    hang: bool,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl StubCatalog {
    pub fn new(rows: Vec<SchemaRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Yield `n` rows, then a stream error.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl CatalogSource for StubCatalog {
    fn schema_rows<'a>(
        &'a self,
        schema: &'a str,
        table: Option<&'a str>,
    ) -> BoxStream<'a, DbResult<SchemaRow>> {
        self.requests
            .lock()
            .unwrap()
            .push((schema.to_string(), table.map(str::to_string)));

        let mut results: Vec<DbResult<SchemaRow>> = self
            .rows
            .iter()
            .filter(|row| table.is_none_or(|name| row.table_name == name))
            .cloned()
            .map(Ok)
            .collect();

        if let Some(n) = self.fail_after {
            results.truncate(n);
            results.push(Err(DbError::connection(
                "connection reset by peer",
                "Check network connectivity and database server status",
            )));
        }

        let rows = stream::iter(results);
        if self.hang {
            rows.chain(stream::pending()).boxed()
        } else {
            rows.boxed()
        }
    }
}

/// Log output captured from the current thread.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's log events into a buffer until the guard drops.
    pub fn install() -> (Self, DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines at INFO level.
    pub fn info_lines(&self) -> Vec<String> {
        self.text()
            .lines()
            .filter(|line| line.contains(" INFO "))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
