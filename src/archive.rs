//! `.apkg` package access.
//!
//! A package is a zip archive holding the collection database
//! (`collection.anki2`), a JSON manifest (`media`) mapping numeric entry
//! names to real media file names, and the media files themselves stored
//! under those numeric names.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::collection::{CollectionError, CollectionReader};

/// Entry holding the collection database.
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Entry holding the media manifest.
pub const MEDIA_MANIFEST_ENTRY: &str = "media";

type Result<T> = std::result::Result<T, CollectionError>;

/// Name lookup over the entries of a package.
pub struct ArchiveIndex<R> {
    zip: zip::ZipArchive<R>,
    entries: HashMap<String, usize>,
    /// Real media file name -> archive entry name.
    media: HashMap<String, String>,
}

impl ArchiveIndex<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        log::info!("Reading package {}", path.display());
        Self::new(file)
    }
}

impl ArchiveIndex<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ArchiveIndex<R> {
    /// Index every entry and decode the media manifest.
    ///
    /// Fails when the collection database or the manifest entry is missing,
    /// or when the manifest names an entry the archive doesn't have.
    pub fn new(reader: R) -> Result<Self> {
        let mut zip = zip::ZipArchive::new(reader)?;

        let mut entries = HashMap::new();
        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            entries.insert(entry.name().to_string(), i);
        }

        if !entries.contains_key(COLLECTION_ENTRY) {
            return Err(CollectionError::Format(format!(
                "unable to find `{COLLECTION_ENTRY}` in archive"
            )));
        }

        let mut index = Self {
            zip,
            entries,
            media: HashMap::new(),
        };
        index.media = index.read_manifest()?;
        log::debug!(
            "Indexed {} entries, {} media files",
            index.entries.len(),
            index.media.len()
        );
        Ok(index)
    }

    fn read_manifest(&mut self) -> Result<HashMap<String, String>> {
        if !self.entries.contains_key(MEDIA_MANIFEST_ENTRY) {
            return Err(CollectionError::Format(format!(
                "unable to find `{MEDIA_MANIFEST_ENTRY}` in archive"
            )));
        }

        let bytes = self.read_file(MEDIA_MANIFEST_ENTRY)?;
        let manifest: HashMap<String, String> = serde_json::from_slice(&bytes).map_err(|e| {
            CollectionError::Format(format!("invalid `{MEDIA_MANIFEST_ENTRY}` manifest: {e}"))
        })?;

        let mut media = HashMap::with_capacity(manifest.len());
        for (entry, filename) in manifest {
            if entry.parse::<u64>().is_err() {
                return Err(CollectionError::Format(format!(
                    "media manifest key {entry:?} is not numeric"
                )));
            }
            if !self.entries.contains_key(&entry) {
                return Err(CollectionError::Format(format!(
                    "media file {filename:?} refers to missing entry {entry}"
                )));
            }
            media.insert(filename, entry);
        }
        Ok(media)
    }

    /// Names of all file entries.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Real names of the media files.
    pub fn media_names(&self) -> impl Iterator<Item = &str> {
        self.media.keys().map(String::as_str)
    }

    /// Read an entry by its archive name.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let i = *self
            .entries
            .get(name)
            .ok_or_else(|| CollectionError::NotFound(format!("`{name}` in zip index")))?;
        let mut entry = self.zip.by_index(i)?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a media file by its real file name.
    pub fn read_media_file(&mut self, filename: &str) -> Result<Vec<u8>> {
        let entry = self
            .media
            .get(filename)
            .cloned()
            .ok_or_else(|| CollectionError::NotFound(format!("`{filename}` in media index")))?;
        self.read_file(&entry)
    }

    /// Bytes of the embedded collection database.
    pub fn read_collection(&mut self) -> Result<Vec<u8>> {
        self.read_file(COLLECTION_ENTRY)
    }
}

/// An opened package: its archive index plus a reader over the extracted
/// collection.
pub struct Package<R> {
    index: ArchiveIndex<R>,
    reader: CollectionReader,
}

impl Package<File> {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_index(ArchiveIndex::open(path)?)
    }
}

impl Package<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_index(ArchiveIndex::from_bytes(bytes)?)
    }
}

impl<R: Read + Seek> Package<R> {
    pub fn from_index(mut index: ArchiveIndex<R>) -> Result<Self> {
        let db = index.read_collection()?;
        let reader = CollectionReader::open_extracted(&db)?;
        Ok(Self { index, reader })
    }

    pub fn reader(&self) -> &CollectionReader {
        &self.reader
    }

    pub fn index(&mut self) -> &mut ArchiveIndex<R> {
        &mut self.index
    }

    pub fn read_media_file(&mut self, filename: &str) -> Result<Vec<u8>> {
        self.index.read_media_file(filename)
    }

    /// Close the extracted collection and release the archive.
    pub fn close(self) -> Result<()> {
        self.reader.close()
    }
}
