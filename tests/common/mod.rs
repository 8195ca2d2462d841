//! Shared fixtures: a minimal but real Anki collection database.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anki_tts::{SynthesisEngine, SynthesisResult};
use rusqlite::{params, Connection};

pub const CREATED: i64 = 1000;
pub const DECK_SPANISH: i64 = 1_500_000_000_001;
pub const DECK_OTHER: i64 = 1_500_000_000_002;
pub const DECK_DELETED: i64 = 1_500_000_000_003;
pub const MODEL_BASIC: i64 = 1_342_697_561_419;
pub const MODEL_CLOZE: i64 = 1_342_697_561_420;

const SCHEMA: &str = r#"
CREATE TABLE col (
    id integer primary key, crt integer not null, mod integer not null,
    scm integer not null, ver integer not null, dty integer not null,
    usn integer not null, ls integer not null, conf text not null,
    models text not null, decks text not null, dconf text not null, tags text not null
);
CREATE TABLE notes (
    id integer primary key, guid text not null, mid integer not null,
    mod integer not null, usn integer not null, tags text not null,
    flds text not null, sfld integer not null, csum integer not null,
    flags integer not null, data text not null
);
CREATE TABLE cards (
    id integer primary key, nid integer not null, did integer not null,
    ord integer not null, mod integer not null, usn integer not null,
    type integer not null, queue integer not null, due integer not null,
    ivl integer not null, factor integer not null, reps integer not null,
    lapses integer not null, "left" integer not null, odue integer not null,
    odid integer not null, flags integer not null, data text not null
);
CREATE TABLE revlog (
    id integer primary key, cid integer not null, usn integer not null,
    ease integer not null, ivl integer not null, lastIvl integer not null,
    factor integer not null, time integer not null, type integer not null
);
CREATE TABLE graves (usn integer not null, oid integer not null, type integer not null);
"#;

/// Collection with decks "Spanish", "Other" and a graveyard'd "Deleted",
/// note types "Basic" (Front/Back) and "Cloze" (Text/Extra).
pub fn create_collection(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    let decks = format!(
        r#"{{
            "{DECK_SPANISH}": {{"id": {DECK_SPANISH}, "name": "Spanish", "conf": 1}},
            "{DECK_OTHER}": {{"id": {DECK_OTHER}, "name": "Other", "conf": 99}},
            "{DECK_DELETED}": {{"id": {DECK_DELETED}, "name": "Deleted", "conf": 1}}
        }}"#
    );
    let dconf = r#"{"1": {"id": 1, "name": "Default", "autoplay": true, "replayq": true, "maxTaken": 60}}"#;
    let models = format!(
        r#"{{
            "{MODEL_BASIC}": {{"id": {MODEL_BASIC}, "name": "Basic", "did": {DECK_SPANISH}, "sortf": 0,
                "flds": [{{"name": "Front", "ord": 0}}, {{"name": "Back", "ord": 1}}]}},
            "{MODEL_CLOZE}": {{"id": "{MODEL_CLOZE}", "name": "Cloze", "did": null, "type": 1,
                "flds": [{{"name": "Text", "ord": 0}}, {{"name": "Extra", "ord": 1}}]}}
        }}"#
    );

    conn.execute(
        "INSERT INTO col VALUES (1, ?1, 0, 0, 11, 0, 0, 0, '{}', ?2, ?3, ?4, '{\"verb\": 0}')",
        params![CREATED, models, decks, dconf],
    )
    .unwrap();
    grave(&conn, DECK_DELETED, 2);
    conn
}

pub fn insert_note(conn: &Connection, id: i64, model_id: i64, fields: &[&str]) {
    let flds = fields.join("\x1f");
    conn.execute(
        "INSERT INTO notes VALUES (?1, ?2, ?3, 1, 0, ' spanish ', ?4, ?5, 12345, 0, '')",
        params![id, format!("guid{id}"), model_id, flds, fields[0]],
    )
    .unwrap();
}

pub fn insert_card(conn: &Connection, id: i64, note_id: i64, deck_id: i64) {
    insert_scheduled_card(conn, id, note_id, deck_id, 0, 0, 0);
}

pub fn insert_scheduled_card(
    conn: &Connection,
    id: i64,
    note_id: i64,
    deck_id: i64,
    queue: i64,
    due: i64,
    ivl: i64,
) {
    conn.execute(
        "INSERT INTO cards VALUES (?1, ?2, ?3, 0, 1, 0, ?4, ?4, ?5, ?6, 2500, 3, 1, 0, ?5, 0, 0, '')",
        params![id, note_id, deck_id, queue, due, ivl],
    )
    .unwrap();
}

pub fn insert_review(conn: &Connection, id: i64, card_id: i64, ivl: i64, last_ivl: i64) {
    conn.execute(
        "INSERT INTO revlog VALUES (?1, ?2, 0, 3, ?3, ?4, 2500, 6000, 1)",
        params![id, card_id, ivl, last_ivl],
    )
    .unwrap();
}

pub fn grave(conn: &Connection, oid: i64, kind: i64) {
    conn.execute("INSERT INTO graves VALUES (0, ?1, ?2)", params![oid, kind])
        .unwrap();
}

pub fn note_fields(path: &Path, id: i64) -> (String, i64, i64) {
    let conn = Connection::open(path).unwrap();
    conn.query_row(
        "SELECT flds, mod, usn FROM notes WHERE id = ?1",
        params![id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .unwrap()
}

/// Zip a database file into `.apkg` bytes with the given media.
pub fn package(db_path: &Path, media: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    writer.start_file("collection.anki2", options).unwrap();
    writer.write_all(&std::fs::read(db_path).unwrap()).unwrap();

    let manifest: serde_json::Map<String, serde_json::Value> = media
        .iter()
        .map(|(entry, name, _)| (entry.to_string(), serde_json::Value::from(*name)))
        .collect();
    writer.start_file("media", options).unwrap();
    writer
        .write_all(serde_json::to_string(&manifest).unwrap().as_bytes())
        .unwrap();

    for (entry, _, data) in media {
        writer.start_file(entry.to_string(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Synthesis fake that records every request and writes a fixed payload.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub calls: Rc<RefCell<Vec<(String, PathBuf)>>>,
    pub fail: bool,
}

impl RecordingEngine {
    pub fn texts(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(t, _)| t.clone()).collect()
    }
}

impl SynthesisEngine for RecordingEngine {
    type SynthesisParams = ();

    fn synthesize(
        &mut self,
        text: &str,
        _params: Option<()>,
    ) -> Result<SynthesisResult, Box<dyn std::error::Error>> {
        if self.fail {
            return Err("synthesis backend down".into());
        }
        Ok(SynthesisResult {
            audio: format!("audio:{text}").into_bytes(),
        })
    }

    fn synthesize_to_file(
        &mut self,
        text: &str,
        path: &Path,
        params: Option<()>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.calls
            .borrow_mut()
            .push((text.to_string(), path.to_path_buf()));
        self.synthesize(text, params)?.write_to(path)
    }
}
