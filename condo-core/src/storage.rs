//! Line-oriented record storage
//!
//! Every store is a plain text file with one record per line. Mutations either
//! append a single line or rewrite the whole file; there is no index and no
//! locking, the file itself is the only source of truth.
//!
//! Lines are read as raw bytes. Text that is not valid UTF-8 is decoded as
//! Latin-1, and rewrites copy untouched records back byte for byte.

use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Split, Write};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::models::FIELD_DELIMITER;

/// Handles appending, reading and patching records of one store file
#[derive(Debug, Clone)]
pub struct RecordStore {
    file_path: PathBuf,
}

/// Lazy iterator over the lines of a store; the file handle is released on drop
pub struct RecordLines {
    path: PathBuf,
    lines: Split<BufReader<File>>,
}

impl Iterator for RecordLines {
    type Item = StoreResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next().map(|line| {
            line.map(|bytes| decode_line(strip_carriage_return(bytes)))
                .map_err(|e| StoreError::io(&self.path, e))
        })
    }
}

fn strip_carriage_return(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    bytes
}

/// Decodes a record as UTF-8, falling back to Latin-1
fn decode_line(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => {
            let line: String = e.into_bytes().into_iter().map(char::from).collect();
            debug!("Decoded non UTF-8 record as Latin-1: {:?}", line);
            line
        }
    }
}

impl RecordStore {
    /// Creates a new RecordStore for the given file path
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn open(&self) -> StoreResult<BufReader<File>> {
        let file = File::open(&self.file_path).map_err(|e| StoreError::io(&self.file_path, e))?;
        Ok(BufReader::new(file))
    }

    /// Appends one line, creating the file if needed
    pub fn append(&self, line: &str) -> StoreResult<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| StoreError::io(&self.file_path, e))?;
        writeln!(file, "{}", line).map_err(|e| StoreError::io(&self.file_path, e))?;

        debug!("Appended record to {:?}", self.file_path);
        Ok(())
    }

    /// Opens the store and yields its lines in file order
    pub fn read_all(&self) -> StoreResult<RecordLines> {
        Ok(RecordLines {
            path: self.file_path.clone(),
            lines: self.open()?.split(b'\n'),
        })
    }

    /// Reads every line eagerly
    pub fn read_lines(&self) -> StoreResult<Vec<String>> {
        self.read_all()?.collect()
    }

    fn read_raw(&self) -> StoreResult<Vec<Vec<u8>>> {
        self.open()?
            .split(b'\n')
            .map(|line| {
                line.map(strip_carriage_return)
                    .map_err(|e| StoreError::io(&self.file_path, e))
            })
            .collect()
    }

    fn write_raw(&self, lines: &[Vec<u8>]) -> StoreResult<()> {
        let file = File::create(&self.file_path).map_err(|e| StoreError::io(&self.file_path, e))?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writer
                .write_all(line)
                .map_err(|e| StoreError::io(&self.file_path, e))?;
            writer
                .write_all(b"\n")
                .map_err(|e| StoreError::io(&self.file_path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&self.file_path, e))?;

        debug!("Rewrote {:?}", self.file_path);
        Ok(())
    }

    /// Replaces the whole content of the store with `lines`
    pub fn rewrite<I, S>(&self, lines: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<Vec<u8>> = lines
            .into_iter()
            .map(|line| line.as_ref().as_bytes().to_vec())
            .collect();
        self.write_raw(&lines)
    }

    /// Drops every line for which `keep` returns false, returning how many were dropped.
    ///
    /// The file is only rewritten when something was dropped.
    pub fn retain<F>(&self, mut keep: F) -> StoreResult<usize>
    where
        F: FnMut(&str) -> bool,
    {
        let mut kept = Vec::new();
        let mut removed = 0;

        for raw in self.read_raw()? {
            if keep(&decode_line(raw.clone())) {
                kept.push(raw);
            } else {
                removed += 1;
            }
        }

        if removed > 0 {
            self.write_raw(&kept)?;
        }
        Ok(removed)
    }

    /// Overwrites field `field_index` of the record whose first field equals `key`.
    ///
    /// The whole file is rewritten. A key that matches no record leaves the
    /// content unchanged. Lines whose first field is not an integer are kept
    /// verbatim and reported. If the matching record is too short for
    /// `field_index`, nothing is written.
    pub fn update_field(&self, key: u32, field_index: usize, new_value: &str) -> StoreResult<()> {
        let delimiter = FIELD_DELIMITER as u8;
        let mut lines = Vec::new();
        let mut matched = false;

        for raw in self.read_raw()? {
            let mut fields: Vec<&[u8]> = raw.split(|b| *b == delimiter).collect();
            let id = std::str::from_utf8(fields[0])
                .ok()
                .and_then(|first| first.trim().parse::<u32>().ok());

            match id {
                Some(id) if id == key => {
                    if field_index >= fields.len() {
                        return Err(StoreError::FieldOutOfRange {
                            key,
                            index: field_index,
                            fields: fields.len(),
                        });
                    }
                    fields[field_index] = new_value.as_bytes();
                    matched = true;
                    lines.push(fields.join(&delimiter));
                }
                Some(_) => lines.push(raw),
                None => {
                    warn!(
                        "Keeping malformed record in {:?}: {:?}",
                        self.file_path,
                        decode_line(raw.clone())
                    );
                    lines.push(raw);
                }
            }
        }

        if !matched {
            debug!("No record with key {} in {:?}", key, self.file_path);
        }

        self.write_raw(&lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(dir: &TempDir, content: &str) -> RecordStore {
        let path = dir.path().join("store.txt");
        fs::write(&path, content).unwrap();
        RecordStore::new(path)
    }

    #[test]
    fn test_append_creates_and_grows_file() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("nested").join("log.txt"));

        store.append("first").unwrap();
        store.append("second").unwrap();

        assert_eq!(store.read_lines().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_read_all_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("missing.txt"));

        assert!(matches!(store.read_all(), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_update_field_patches_only_matching_record() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "1,Cubierta,false,111\n2,Descubierta,false,222\n");

        store.update_field(2, 2, "true").unwrap();

        assert_eq!(
            store.read_lines().unwrap(),
            vec!["1,Cubierta,false,111", "2,Descubierta,true,222"]
        );
    }

    #[test]
    fn test_update_field_unknown_key_is_noop() {
        let dir = TempDir::new().unwrap();
        let content = "1,Cubierta,false,111\nheader line\n2,Descubierta,true,222\n";
        let store = store_with(&dir, content);

        store.update_field(99, 2, "true").unwrap();

        assert_eq!(fs::read_to_string(store.path()).unwrap(), content);
    }

    #[test]
    fn test_update_field_out_of_range_leaves_store() {
        let dir = TempDir::new().unwrap();
        let content = "1,Cubierta\n";
        let store = store_with(&dir, content);

        let err = store.update_field(1, 2, "true").unwrap_err();

        assert!(matches!(
            err,
            StoreError::FieldOutOfRange { key: 1, index: 2, fields: 2 }
        ));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), content);
    }

    #[test]
    fn test_read_all_decodes_latin1_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.txt");
        fs::write(&path, b"Ana,Gomez,111\r\nJos\xe9,Mu\xf1oz,222\nLuis,Diaz,333\n").unwrap();
        let store = RecordStore::new(&path);

        assert_eq!(
            store.read_lines().unwrap(),
            vec!["Ana,Gomez,111", "José,Muñoz,222", "Luis,Diaz,333"]
        );
    }

    #[test]
    fn test_update_field_keeps_latin1_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.txt");
        fs::write(&path, b"1,Cubierta,false,111\n2,Peque\xf1a,false,222\n").unwrap();
        let store = RecordStore::new(&path);

        store.update_field(1, 2, "true").unwrap();

        assert_eq!(
            fs::read(&path).unwrap(),
            b"1,Cubierta,true,111\n2,Peque\xf1a,false,222\n".to_vec()
        );
    }

    #[test]
    fn test_retain_rewrites_only_on_removal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.txt");
        fs::write(&path, b"keep\r\ndrop \xb0\nkeep \xb0\n").unwrap();
        let store = RecordStore::new(&path);

        assert_eq!(store.retain(|line| line != "missing").unwrap(), 0);
        assert_eq!(fs::read(&path).unwrap(), b"keep\r\ndrop \xb0\nkeep \xb0\n".to_vec());

        assert_eq!(store.retain(|line| !line.starts_with("drop")).unwrap(), 1);
        assert_eq!(fs::read(&path).unwrap(), b"keep\nkeep \xb0\n".to_vec());
    }

    #[test]
    fn test_rewrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, "a\nb\nc\n");

        store.rewrite(["a", "c"]).unwrap();

        assert_eq!(store.read_lines().unwrap(), vec!["a", "c"]);
    }
}
