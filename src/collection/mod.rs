//! Anki collection database access.
//!
//! A collection is a SQLite database (`collection.anki2`) with these tables
//! of interest:
//!
//! | Table | Holds |
//! |---|---|
//! | `col` | one row: creation time plus JSON maps of decks, deck options and note types |
//! | `notes` | field values joined with `\x1f`, tags, note type id |
//! | `cards` | one row per card: note, deck and scheduling state |
//! | `revlog` | one row per review |
//! | `graves` | ids deleted since the last sync (`0` card, `1` note, `2` deck) |
//!
//! Objects listed in `graves` are never returned, even when their rows are
//! still present.
//!
//! # Scheduling columns
//!
//! - `ivl` is in days when positive and in seconds (negated) when negative,
//!   decoded to [`Interval`].
//! - `due` is a timestamp for learning cards and a day offset from the
//!   collection's creation for review cards, decoded to seconds since the
//!   epoch. New and suspended cards have no decoded due time.
//! - `factor` is stored in permille and exposed as a float (`2500` -> `2.5`).
//!
//! # Example
//!
//! ```rust,no_run
//! use anki_tts::collection::CollectionReader;
//! use std::path::Path;
//!
//! let reader = CollectionReader::open_path(Path::new("collection.anki2"))?;
//! let collection = reader.load_collection()?;
//! for deck in collection.decks.values() {
//!     println!("[{}] {}", deck.id, deck.name);
//! }
//!
//! let mut notes = reader.notes()?;
//! while notes.advance()? {
//!     let note = notes.current().unwrap();
//!     println!("{}: {:?}", note.id, note.fields());
//! }
//! notes.close()?;
//! reader.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cursor;
pub mod error;
pub mod model;
pub mod reader;

pub use cursor::{Cursor, Record};
pub use error::CollectionError;
pub use model::{
    Card, Collection, Deck, DeckConfig, Field, GraveKind, Interval, Model, Note, Queue, Review,
    FIELD_SEPARATOR,
};
pub use reader::CollectionReader;
