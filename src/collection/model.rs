use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Separator between the field values stored in `notes.flds`.
pub const FIELD_SEPARATOR: char = '\x1f';

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Object type recorded in the `graves` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraveKind {
    Card = 0,
    Note = 1,
    Deck = 2,
}

impl GraveKind {
    pub fn tag(self) -> i64 {
        self as i64
    }
}

/// The `col` row: collection metadata and the JSON-encoded deck, deck
/// config and note type maps.
#[derive(Debug, Clone)]
pub struct Collection {
    pub id: i64,
    /// Creation time, seconds since the epoch. Review due dates count days from here.
    pub created: i64,
    pub modified: i64,
    pub schema_modified: i64,
    pub version: i64,
    pub usn: i64,
    pub last_sync: i64,
    pub decks: HashMap<i64, Deck>,
    pub deck_configs: HashMap<i64, DeckConfig>,
    pub models: HashMap<i64, Model>,
    pub tags: HashMap<String, i64>,
}

impl Collection {
    pub fn deck_by_name(&self, name: &str) -> Option<&Deck> {
        self.decks.values().find(|d| d.name == name)
    }

    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.models.values().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Deck {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub name: String,
    /// Options group. Filtered decks have none.
    #[serde(rename = "conf", default, deserialize_with = "de_opt_id")]
    pub config_id: Option<i64>,
    #[serde(rename = "dyn", default)]
    pub dynamic: i64,
    #[serde(rename = "desc", default)]
    pub description: String,
    #[serde(skip)]
    pub config: Option<DeckConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeckConfig {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub autoplay: bool,
    #[serde(rename = "replayq", default)]
    pub replay_question: bool,
    #[serde(rename = "maxTaken", default)]
    pub max_taken: i64,
}

/// A note type.
#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    #[serde(deserialize_with = "de_id")]
    pub id: i64,
    pub name: String,
    #[serde(rename = "flds", default)]
    pub fields: Vec<Field>,
    #[serde(rename = "did", default, deserialize_with = "de_opt_id")]
    pub deck_id: Option<i64>,
    #[serde(rename = "sortf", default)]
    pub sort_field: usize,
    #[serde(rename = "type", default)]
    pub kind: i64,
}

impl Model {
    /// Position of the field called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub ord: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub guid: String,
    pub model_id: i64,
    pub modified: i64,
    pub usn: i64,
    pub tags: String,
    /// All field values joined with [`FIELD_SEPARATOR`].
    pub fields_raw: String,
    pub sort_field: String,
    pub checksum: i64,
}

impl Note {
    /// Field values in note type order.
    pub fn fields(&self) -> Vec<String> {
        split_fields(&self.fields_raw)
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split_whitespace().collect()
    }
}

pub fn split_fields(raw: &str) -> Vec<String> {
    raw.split(FIELD_SEPARATOR).map(str::to_string).collect()
}

pub fn join_fields<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(FIELD_SEPARATOR);
        }
        out.push_str(v.as_ref());
    }
    out
}

/// A stored interval.
///
/// Positive values in the database count days, negative values are
/// seconds (learning steps) stored negated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Days(i64),
    Seconds(i64),
}

impl Interval {
    pub fn from_stored(raw: i64) -> Self {
        if raw < 0 {
            Interval::Seconds(-raw)
        } else {
            Interval::Days(raw)
        }
    }

    /// Card intervals use 0 for "no interval yet".
    pub fn from_card_column(raw: i64) -> Option<Self> {
        (raw != 0).then(|| Self::from_stored(raw))
    }

    pub fn as_secs(self) -> i64 {
        match self {
            Interval::Days(d) => d * SECONDS_PER_DAY,
            Interval::Seconds(s) => s,
        }
    }
}

/// Card queue. Determines how `due` is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queue {
    New,
    Learning,
    Review,
    DayLearning,
    Suspended,
    Buried,
    Other(i64),
}

impl From<i64> for Queue {
    fn from(raw: i64) -> Self {
        match raw {
            0 => Queue::New,
            1 => Queue::Learning,
            2 => Queue::Review,
            3 => Queue::DayLearning,
            -1 => Queue::Suspended,
            -2 | -3 => Queue::Buried,
            other => Queue::Other(other),
        }
    }
}

/// Decode a stored `due`/`odue` into seconds since the epoch.
///
/// Learning cards store a timestamp, review cards a day number relative to
/// the collection's creation. Other queues have no decodable due time.
pub fn decode_due(queue: Queue, raw: i64, collection_created: i64) -> Option<i64> {
    match queue {
        Queue::Learning => Some(raw),
        Queue::Review => Some(raw * SECONDS_PER_DAY + collection_created),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: i64,
    pub note_id: i64,
    pub deck_id: i64,
    pub ord: i64,
    pub modified: i64,
    pub usn: i64,
    pub kind: i64,
    pub queue: Queue,
    /// Seconds since the epoch, see [`decode_due`].
    pub due: Option<i64>,
    pub interval: Option<Interval>,
    /// Ease factor, e.g. `2.5`.
    pub factor: f64,
    pub reps: i64,
    pub lapses: i64,
    pub left: i64,
    pub original_due: Option<i64>,
    pub original_deck_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: i64,
    pub card_id: i64,
    pub usn: i64,
    pub ease: i64,
    pub interval: Interval,
    pub last_interval: Interval,
    pub factor: f64,
    /// Answer time in milliseconds.
    pub time_ms: i64,
    pub kind: i64,
}

/// Ids in the JSON maps are numbers in most collections and strings in some.
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(i64),
        Float(f64),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Float(f) => Ok(f as i64),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn de_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "de_id")] i64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}
