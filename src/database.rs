//! The on-disk hash table mapping position keys to winning columns
//!
//! # File Format
//! All integers are little-endian. The file starts with a 12-byte header:
//! board width and height, the ply window the entries were generated over,
//! the per-slot key and value widths in bytes, two reserved zero bytes and
//! the table size in slots. The header is followed by the key array and then
//! the value array.
//!
//! The table itself is open-addressed with linear probing. Each slot holds
//! a 32-bit partial position key (`key >> 16`) and the winning column; a
//! slot with key 0 is empty and ends any probe sequence that reaches it.

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::{generator::CriticalEntry, HEIGHT, WIDTH};

const KEY_BYTES: u8 = 4;
const VALUE_BYTES: u8 = 1;
const HEADER_BYTES: usize = 12;

/// A lookup table of critical positions and their winning columns
///
/// # Notes
/// The table is sized to the smallest prime at least twice the entry count,
/// keeping the load factor at or below one half so linear probe runs stay
/// short. Entries are inserted in discovery order, which makes the serialized
/// file a deterministic function of the collected entries
///
/// Only a 32-bit portion of each position key is stored per slot, so a
/// lookup can in principle report a false match; with half the table empty
/// and full keys spread over 49 bits this is rare enough for the consumer
/// to accept
pub struct CriticalDatabase {
    min_ply: u8,
    max_ply: u8,
    keys: Vec<u32>,
    values: Vec<u8>,
}

impl CriticalDatabase {
    /// Builds the hash table from collected entries
    pub fn build(entries: &[CriticalEntry], min_ply: u8, max_ply: u8) -> Self {
        let table_size = next_prime(entries.len() * 2);
        let mut keys = vec![0u32; table_size];
        let mut values = vec![0u8; table_size];

        for entry in entries {
            let mut index = (entry.key % table_size as u64) as usize;
            while keys[index] != 0 {
                index = (index + 1) % table_size;
            }
            keys[index] = (entry.key >> 16) as u32;
            values[index] = entry.winning_column;
        }

        Self {
            min_ply,
            max_ply,
            keys,
            values,
        }
    }

    /// Returns the number of slots in the table
    pub fn table_size(&self) -> usize {
        self.keys.len()
    }

    /// Accesses the first ply of the window the database was generated over
    pub fn min_ply(&self) -> u8 {
        self.min_ply
    }

    /// Accesses the last ply of the window the database was generated over
    pub fn max_ply(&self) -> u8 {
        self.max_ply
    }

    /// Looks up the winning column recorded for a position key
    pub fn get(&self, key: u64) -> Option<u8> {
        let table_size = self.keys.len();
        let partial_key = (key >> 16) as u32;
        let mut index = (key % table_size as u64) as usize;
        while self.keys[index] != 0 {
            if self.keys[index] == partial_key {
                return Some(self.values[index]);
            }
            index = (index + 1) % table_size;
        }
        None
    }

    /// Writes the database to `path`
    ///
    /// The file is assembled in a temporary sibling and moved into place
    /// once complete, so `path` never holds a truncated database
    pub fn save(&self, path: &Path) -> Result<()> {
        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(directory).with_context(|| {
            format!("failed to create a temporary file in {}", directory.display())
        })?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            writer.write_all(&[
                WIDTH as u8,
                HEIGHT as u8,
                self.min_ply,
                self.max_ply,
                KEY_BYTES,
                VALUE_BYTES,
                0,
                0,
            ])?;
            writer.write_all(&(self.keys.len() as u32).to_le_bytes())?;
            for key in &self.keys {
                writer.write_all(&key.to_le_bytes())?;
            }
            writer.write_all(&self.values)?;
            writer.flush()?;
        }

        temp.persist(path)
            .map_err(|error| error.error)
            .with_context(|| format!("failed to move the database into place at {}", path.display()))?;
        Ok(())
    }

    /// Reads a database back from `path`, validating the header
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; HEADER_BYTES];
        reader.read_exact(&mut header)?;
        if header[0] != WIDTH as u8 || header[1] != HEIGHT as u8 {
            bail!(
                "{} was generated for a {}x{} board",
                path.display(),
                header[0],
                header[1]
            );
        }
        if header[4] != KEY_BYTES || header[5] != VALUE_BYTES {
            bail!("{} uses an unsupported slot layout", path.display());
        }
        let table_size = u32::from_le_bytes(header[8..12].try_into()?) as usize;

        let mut keys = vec![0u32; table_size];
        let mut bytes = [0u8; 4];
        for key in keys.iter_mut() {
            reader.read_exact(&mut bytes)?;
            *key = u32::from_le_bytes(bytes);
        }
        let mut values = vec![0u8; table_size];
        reader.read_exact(&mut values)?;

        Ok(Self {
            min_ply: header[2],
            max_ply: header[3],
            keys,
            values,
        })
    }
}

/// Returns the smallest prime greater than or equal to `n`
pub(crate) fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut divisor = 3;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}
