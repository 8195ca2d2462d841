use std::collections::VecDeque;

use rusqlite::{params, Row, Statement};

use super::error::CollectionError;

/// Rows fetched per query round trip.
pub const PAGE_SIZE: i64 = 256;

/// A table row type that can be read page by page, newest first.
pub trait Record: Sized {
    /// Query returning rows with `id < ?1`, ordered by id descending,
    /// at most `?2` of them.
    const QUERY: &'static str;

    fn id(&self) -> i64;

    fn from_row(row: &Row<'_>, collection_created: i64) -> rusqlite::Result<Self>;
}

/// Forward-only cursor over the rows of one query.
///
/// Rows are loaded lazily in pages keyed on the last id seen, so the
/// order is always descending id. A cursor cannot be rewound; ask the
/// reader for a new one to start over. The prepared statement is released
/// by [`Cursor::close`] or when the cursor is dropped.
pub struct Cursor<'conn, T: Record> {
    stmt: Option<Statement<'conn>>,
    collection_created: i64,
    upper_bound: i64,
    page: VecDeque<T>,
    exhausted: bool,
    current: Option<T>,
}

impl<'conn, T: Record> Cursor<'conn, T> {
    pub(crate) fn new(stmt: Statement<'conn>, collection_created: i64) -> Self {
        Self {
            stmt: Some(stmt),
            collection_created,
            upper_bound: i64::MAX,
            page: VecDeque::new(),
            exhausted: false,
            current: None,
        }
    }

    /// Move to the next row. Returns `false` once the rows are used up.
    pub fn advance(&mut self) -> Result<bool, CollectionError> {
        if self.page.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                self.current = None;
                return Err(e);
            }
        }
        self.current = self.page.pop_front();
        Ok(self.current.is_some())
    }

    /// The row the last successful [`advance`](Self::advance) moved to.
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Take ownership of the current row.
    pub fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    /// Release the underlying statement.
    pub fn close(mut self) -> Result<(), CollectionError> {
        self.page.clear();
        if let Some(stmt) = self.stmt.take() {
            stmt.finalize()?;
        }
        Ok(())
    }

    fn fetch_page(&mut self) -> Result<(), CollectionError> {
        let Some(stmt) = self.stmt.as_mut() else {
            self.exhausted = true;
            return Ok(());
        };

        let mut rows = stmt.query(params![self.upper_bound, PAGE_SIZE])?;
        let mut fetched = 0;
        while let Some(row) = rows.next()? {
            let record = T::from_row(row, self.collection_created)?;
            self.upper_bound = record.id();
            self.page.push_back(record);
            fetched += 1;
        }

        if fetched < PAGE_SIZE {
            self.exhausted = true;
        }
        Ok(())
    }
}

impl<T: Record + Clone> Iterator for Cursor<'_, T> {
    type Item = Result<T, CollectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => self.current.clone().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
