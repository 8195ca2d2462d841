mod common;

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::Path;

use anki_tts::collection::CollectionReader;
use anki_tts::pipeline::{
    AugmentConfig, AugmentConfigBuilder, AugmentError, AugmentReport, Augmenter, AutoConfirm,
    Confirm,
};
use common::*;
use pretty_assertions::assert_eq;

struct Fixture {
    _dir: tempfile::TempDir,
    db: std::path::PathBuf,
    media: std::path::PathBuf,
}

fn fixture(setup: impl FnOnce(&rusqlite::Connection)) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("collection.anki2");
    let media = dir.path().join("collection.media");
    fs::create_dir(&media).unwrap();
    let conn = create_collection(&db);
    setup(&conn);
    drop(conn);
    Fixture {
        _dir: dir,
        db,
        media,
    }
}

fn config(media: &Path, columns: &[&str]) -> AugmentConfig {
    AugmentConfigBuilder::default()
        .deck_name("Spanish")
        .model_name("Basic")
        .speech_columns(columns.iter().map(|c| c.to_string()).collect::<Vec<_>>())
        .locale("es-ES")
        .media_dir(media)
        .build()
        .unwrap()
}

fn run<C: Confirm>(
    fx: &Fixture,
    columns: &[&str],
    engine: RecordingEngine,
    confirm: C,
) -> Result<AugmentReport, AugmentError> {
    let reader = CollectionReader::open_path(&fx.db).unwrap();
    let report = Augmenter::new(config(&fx.media, columns), engine, (), confirm).run(&reader);
    reader.close().unwrap();
    report
}

struct CountingConfirm<'a> {
    asked: &'a Cell<usize>,
    answer: bool,
}

impl Confirm for CountingConfirm<'_> {
    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.answer)
    }
}

#[test]
fn voices_back_field_and_rewrites_note() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["Hello", "Hola [sound:x.mp3]"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
    });
    let engine = RecordingEngine::default();

    let report = run(&fx, &["Back"], engine.clone(), AutoConfirm(true)).unwrap();

    assert_eq!(engine.texts(), vec!["Hola".to_string()]);
    assert_eq!(engine.calls.borrow()[0].1, fx.media.join("es-ES-Hola.mp3"));
    assert_eq!(
        fs::read(fx.media.join("es-ES-Hola.mp3")).unwrap(),
        b"audio:Hola"
    );

    let (flds, _, usn) = note_fields(&fx.db, 1);
    assert_eq!(flds, "Hello\x1fHola[sound:es-ES-Hola.mp3]");
    assert_eq!(usn, -1);

    assert_eq!(
        report,
        AugmentReport {
            cards_examined: 1,
            notes_processed: 1,
            fields_synthesized: 1,
            fields_unchanged: 0,
            notes_updated: 1,
            skipped: 0,
        }
    );
}

#[test]
fn second_run_changes_nothing() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["Hello", "Hola [sound:x.mp3]"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
    });
    run(&fx, &["Back"], RecordingEngine::default(), AutoConfirm(true)).unwrap();
    let (after_first, ..) = note_fields(&fx.db, 1);

    let engine = RecordingEngine::default();
    let asked = Cell::new(0);
    let confirm = CountingConfirm {
        asked: &asked,
        answer: true,
    };
    let report = run(&fx, &["Back"], engine.clone(), confirm).unwrap();

    assert!(engine.texts().is_empty());
    assert_eq!(asked.get(), 0);
    assert_eq!(report.fields_unchanged, 1);
    assert_eq!(report.notes_updated, 0);
    assert_eq!(note_fields(&fx.db, 1).0, after_first);
}

#[test]
fn declined_confirmation_synthesizes_but_keeps_notes() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["Hello", "Hola"]);
        insert_note(conn, 2, MODEL_BASIC, &["Bye", "Adiós"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
        insert_card(conn, 20, 2, DECK_SPANISH);
    });
    let engine = RecordingEngine::default();
    let asked = Cell::new(0);
    let confirm = CountingConfirm {
        asked: &asked,
        answer: false,
    };

    let report = run(&fx, &["Back"], engine.clone(), confirm).unwrap();

    assert_eq!(asked.get(), 1);
    assert_eq!(engine.texts().len(), 2);
    assert_eq!(report.fields_synthesized, 2);
    assert_eq!(report.notes_updated, 0);
    assert_eq!(note_fields(&fx.db, 1).0, "Hello\x1fHola");
    assert_eq!(note_fields(&fx.db, 2).0, "Bye\x1fAdiós");
}

#[test]
fn asks_once_for_many_notes() {
    let fx = fixture(|conn| {
        for id in 1..=5 {
            let back = format!("palabra {id}");
            insert_note(conn, id, MODEL_BASIC, &["front", back.as_str()]);
            insert_card(conn, 100 + id, id, DECK_SPANISH);
        }
    });
    let asked = Cell::new(0);
    let confirm = CountingConfirm {
        asked: &asked,
        answer: true,
    };

    let report = run(&fx, &["Back"], RecordingEngine::default(), confirm).unwrap();

    assert_eq!(asked.get(), 1);
    assert_eq!(report.notes_updated, 5);
    assert_eq!(
        note_fields(&fx.db, 3).0,
        "front\x1fpalabra 3[sound:es-ES-palabra_3.mp3]"
    );
}

#[test]
fn only_matching_deck_and_note_type_are_touched() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["a", "Hola"]);
        insert_card(conn, 10, 1, DECK_OTHER);
        insert_note(conn, 2, MODEL_CLOZE, &["{{c1::Hola}}", "Adiós"]);
        insert_card(conn, 20, 2, DECK_SPANISH);
    });
    let engine = RecordingEngine::default();

    let report = run(&fx, &["Back", "Extra"], engine.clone(), AutoConfirm(true)).unwrap();

    assert!(engine.texts().is_empty());
    assert_eq!(report.cards_examined, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(note_fields(&fx.db, 1).0, "a\x1fHola");
    assert_eq!(note_fields(&fx.db, 2).0, "{{c1::Hola}}\x1fAdiós");
}

#[test]
fn note_with_several_cards_is_processed_once() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["Hello", "Hola"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
        insert_card(conn, 11, 1, DECK_SPANISH);
    });
    let engine = RecordingEngine::default();

    let report = run(&fx, &["Back"], engine.clone(), AutoConfirm(true)).unwrap();

    assert_eq!(engine.texts(), vec!["Hola".to_string()]);
    assert_eq!(report.cards_examined, 2);
    assert_eq!(report.notes_processed, 1);
    assert_eq!(report.notes_updated, 1);
}

#[test]
fn voices_every_configured_column_and_sanitizes_text() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["<b>¿Qué?</b>", "uno &amp; dos"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
    });
    let engine = RecordingEngine::default();

    run(&fx, &["Front", "Back"], engine.clone(), AutoConfirm(true)).unwrap();

    assert_eq!(
        engine.texts(),
        vec!["Qué?".to_string(), "uno dos".to_string()]
    );
    let (flds, ..) = note_fields(&fx.db, 1);
    assert_eq!(
        flds,
        "<b>¿Qué?</b>[sound:es-ES-b__Qu____b_ed2347b4.mp3]\x1funo &amp; dos[sound:es-ES-uno__amp__dos.mp3]"
    );
}

#[test]
fn accented_and_non_latin_text_get_their_own_audio() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["a", "día"]);
        insert_note(conn, 2, MODEL_BASIC, &["b", "dúa"]);
        insert_note(conn, 3, MODEL_BASIC, &["c", "Привет"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
        insert_card(conn, 20, 2, DECK_SPANISH);
        insert_card(conn, 30, 3, DECK_SPANISH);
    });
    let engine = RecordingEngine::default();

    let report = run(&fx, &["Back"], engine.clone(), AutoConfirm(true)).unwrap();

    assert_eq!(report.fields_synthesized, 3);
    assert_eq!(report.notes_updated, 3);
    let mut paths: Vec<_> = engine.calls.borrow().iter().map(|(_, p)| p.clone()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 3);

    for (id, text, file) in [
        (1, "día", "es-ES-d_a_bfbf4474.mp3"),
        (2, "dúa", "es-ES-d_a_af5c4e20.mp3"),
        (3, "Привет", "es-ES-dd679c0b.mp3"),
    ] {
        assert_eq!(
            fs::read_to_string(fx.media.join(file)).unwrap(),
            format!("audio:{text}")
        );
        let (flds, ..) = note_fields(&fx.db, id);
        assert!(flds.ends_with(&format!("\x1f{text}[sound:{file}]")), "{flds}");
    }

    let second = run(&fx, &["Back"], RecordingEngine::default(), AutoConfirm(true)).unwrap();
    assert_eq!(second.fields_unchanged, 3);
    assert_eq!(second.fields_synthesized, 0);
}

#[test]
fn synthesis_failure_aborts_before_writing() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["Hello", "Hola"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
    });
    let engine = RecordingEngine {
        fail: true,
        ..Default::default()
    };

    let err = run(&fx, &["Back"], engine, AutoConfirm(true)).unwrap_err();

    match err {
        AugmentError::Synthesis { text, .. } => assert_eq!(text, "Hola"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(note_fields(&fx.db, 1).0, "Hello\x1fHola");
}

#[test]
fn field_count_mismatch_is_an_error() {
    let fx = fixture(|conn| {
        insert_note(conn, 1, MODEL_BASIC, &["only one field"]);
        insert_card(conn, 10, 1, DECK_SPANISH);
    });

    let err = run(&fx, &["Back"], RecordingEngine::default(), AutoConfirm(true)).unwrap_err();
    assert!(matches!(err, AugmentError::Consistency(_)));
}
