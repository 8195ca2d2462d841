use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, Row};
use tempfile::TempPath;

use super::cursor::{Cursor, Record};
use super::error::CollectionError;
use super::model::{
    decode_due, join_fields, Card, Collection, Deck, DeckConfig, GraveKind, Interval, Model, Note,
    Queue, Review,
};

type Result<T> = std::result::Result<T, CollectionError>;

/// Read access (plus note field updates) to an Anki collection database.
pub struct CollectionReader {
    conn: Connection,
    path: PathBuf,
    temp: Option<TempPath>,
}

impl CollectionReader {
    /// Open an existing `collection.anki2` in place. Updates go straight to this file.
    pub fn open_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CollectionError::NotFound(format!(
                "collection database {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        log::info!("Opened collection {}", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
            temp: None,
        })
    }

    /// Open a database extracted from a package.
    ///
    /// The bytes are copied to a private temporary file that is deleted on
    /// [`close`](Self::close) (or drop). Updates never reach the package.
    pub fn open_extracted(bytes: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("anki-sqlite3-")
            .suffix(".anki2")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        let temp = file.into_temp_path();

        let conn = Connection::open(&temp)?;
        log::debug!("Extracted collection to {}", temp.display());
        Ok(Self {
            conn,
            path: temp.to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Location of the database file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the `col` row.
    ///
    /// Decks recorded in the graveyard are dropped and each remaining deck
    /// gets its options group attached when one exists.
    pub fn load_collection(&self) -> Result<Collection> {
        let deleted_decks = self.graves(GraveKind::Deck)?;

        let (id, created, modified, schema_modified, version, usn, last_sync, models, decks, dconf, tags) =
            self.conn.query_row(
                "SELECT id, crt, mod, scm, ver, usn, ls, models, decks, dconf, tags FROM col",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                        row.get::<_, String>(10)?,
                    ))
                },
            )?;

        let mut collection = Collection {
            id,
            created,
            modified,
            schema_modified,
            version,
            usn,
            last_sync,
            models: keyed_by_id::<Model>(&models)?,
            decks: keyed_by_id::<Deck>(&decks)?,
            deck_configs: keyed_by_id::<DeckConfig>(&dconf)?,
            tags: if tags.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&tags)?
            },
        };

        collection.decks.retain(|id, deck| {
            let keep = !deleted_decks.contains(id);
            if !keep {
                log::debug!("Skipping deleted deck [{id}] {}", deck.name);
            }
            keep
        });

        for deck in collection.decks.values_mut() {
            deck.config = match deck.config_id {
                Some(config_id) => {
                    let config = collection.deck_configs.get(&config_id).cloned();
                    if config.is_none() {
                        log::debug!("Deck [{}] references missing config {config_id}", deck.id);
                    }
                    config
                }
                None => None,
            };
        }

        Ok(collection)
    }

    /// Live notes, newest first.
    pub fn notes(&self) -> Result<Cursor<'_, Note>> {
        self.cursor()
    }

    /// Live cards, newest first.
    pub fn cards(&self) -> Result<Cursor<'_, Card>> {
        self.cursor()
    }

    /// Review log entries of live cards, newest first.
    pub fn reviews(&self) -> Result<Cursor<'_, Review>> {
        self.cursor()
    }

    fn cursor<T: Record>(&self) -> Result<Cursor<'_, T>> {
        let created: i64 = self.conn.query_row("SELECT crt FROM col", [], |row| row.get(0))?;
        let stmt = self.conn.prepare(T::QUERY)?;
        Ok(Cursor::new(stmt, created))
    }

    /// Replace all field values of a note.
    ///
    /// Stamps the modification time and marks the note for the next sync.
    /// Exactly one row must change.
    pub fn update_note_fields<S: AsRef<str>>(&self, note_id: i64, values: &[S]) -> Result<()> {
        let joined = join_fields(values);
        let now = chrono::Utc::now().timestamp();
        let affected = self.conn.execute(
            "UPDATE notes SET flds = ?1, mod = ?2, usn = -1 WHERE id = ?3",
            params![joined, now, note_id],
        )?;
        if affected != 1 {
            return Err(CollectionError::Consistency(format!(
                "updating note {note_id} changed {affected} rows"
            )));
        }
        log::debug!("Updated note {note_id}");
        Ok(())
    }

    /// Close the connection and delete the temporary copy, if any.
    ///
    /// Both steps always run; every failure is reported.
    pub fn close(self) -> Result<()> {
        let mut errors = Vec::new();

        if let Err((_conn, e)) = self.conn.close() {
            errors.push(CollectionError::Sqlite(e));
        }
        if let Some(temp) = self.temp {
            let display = temp.display().to_string();
            if let Err(e) = temp.close() {
                log::warn!("Cannot remove {display}: {e}");
                errors.push(CollectionError::Io(e));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(CollectionError::Close(errors)),
        }
    }

    fn graves(&self, kind: GraveKind) -> Result<HashSet<i64>> {
        let mut stmt = self.conn.prepare("SELECT oid FROM graves WHERE type = ?1")?;
        let ids = stmt
            .query_map(params![kind.tag()], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(ids)
    }
}

fn keyed_by_id<T: serde::de::DeserializeOwned>(json: &str) -> Result<HashMap<i64, T>> {
    if json.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let raw: HashMap<String, T> = serde_json::from_str(json)?;
    raw.into_iter()
        .map(|(key, value)| {
            key.trim()
                .parse::<i64>()
                .map(|id| (id, value))
                .map_err(|_| CollectionError::Format(format!("non-numeric id key {key:?}")))
        })
        .collect()
}

impl Record for Note {
    const QUERY: &'static str = "
        SELECT n.id, n.guid, n.mid, n.mod, n.usn, n.tags, n.flds,
            CAST(n.sfld AS text), n.csum
        FROM notes n
        LEFT JOIN graves g ON g.oid = n.id AND g.type = 1
        WHERE g.oid IS NULL AND n.id < ?1
        ORDER BY n.id DESC
        LIMIT ?2";

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>, _collection_created: i64) -> rusqlite::Result<Self> {
        Ok(Note {
            id: row.get(0)?,
            guid: row.get(1)?,
            model_id: row.get(2)?,
            modified: row.get(3)?,
            usn: row.get(4)?,
            tags: row.get(5)?,
            fields_raw: row.get(6)?,
            sort_field: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            checksum: row.get(8)?,
        })
    }
}

impl Record for Card {
    const QUERY: &'static str = r#"
        SELECT c.id, c.nid, c.did, c.ord, c.mod, c.usn, c.type, c.queue, c.due, c.ivl,
            c.factor, c.reps, c.lapses, c."left", c.odue, c.odid
        FROM cards c
        LEFT JOIN graves g ON g.oid = c.id AND g.type = 0
        WHERE g.oid IS NULL AND c.id < ?1
        ORDER BY c.id DESC
        LIMIT ?2"#;

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>, collection_created: i64) -> rusqlite::Result<Self> {
        let queue = Queue::from(row.get::<_, i64>(7)?);
        Ok(Card {
            id: row.get(0)?,
            note_id: row.get(1)?,
            deck_id: row.get(2)?,
            ord: row.get(3)?,
            modified: row.get(4)?,
            usn: row.get(5)?,
            kind: row.get(6)?,
            queue,
            due: decode_due(queue, row.get(8)?, collection_created),
            interval: Interval::from_card_column(row.get(9)?),
            factor: row.get::<_, i64>(10)? as f64 / 1000.0,
            reps: row.get(11)?,
            lapses: row.get(12)?,
            left: row.get(13)?,
            original_due: decode_due(queue, row.get(14)?, collection_created),
            original_deck_id: row.get(15)?,
        })
    }
}

impl Record for Review {
    const QUERY: &'static str = "
        SELECT r.id, r.cid, r.usn, r.ease, r.ivl, r.lastIvl, r.factor, r.time, r.type
        FROM revlog r
        LEFT JOIN graves g ON g.oid = r.cid AND g.type = 0
        WHERE g.oid IS NULL AND r.id < ?1
        ORDER BY r.id DESC
        LIMIT ?2";

    fn id(&self) -> i64 {
        self.id
    }

    fn from_row(row: &Row<'_>, _collection_created: i64) -> rusqlite::Result<Self> {
        Ok(Review {
            id: row.get(0)?,
            card_id: row.get(1)?,
            usn: row.get(2)?,
            ease: row.get(3)?,
            interval: Interval::from_stored(row.get(4)?),
            last_interval: Interval::from_stored(row.get(5)?),
            factor: row.get::<_, i64>(6)? as f64 / 1000.0,
            time_ms: row.get(7)?,
            kind: row.get(8)?,
        })
    }
}
