use super::{Entry, KeyError, Keyring};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::RngCore;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub const HASH_FILE: &str = ".hash";
pub const KEY_FILE: &str = ".key";

/// Bytes per entry: base64 of 24 random bytes.
pub const ENTRY_LEN: usize = 32;
/// One entry per hour for a day.
pub const MAX_ENTRIES: usize = 24;

const RANDOM_LEN: usize = 24;

/// Rolls `.hash` then `.key` inside `dir` and returns the refreshed keyring.
pub fn roll(dir: &Path) -> anyhow::Result<Keyring> {
    let hashes = roll_file(&dir.join(HASH_FILE))?;
    let keys = roll_file(&dir.join(KEY_FILE))?;
    Ok(Keyring::pair(hashes, keys))
}

/// Appends a fresh entry to the file at `path`, dropping the oldest ones
/// beyond [`MAX_ENTRIES`]. Returns every entry, oldest first.
pub fn roll_file(path: &Path) -> anyhow::Result<Vec<Entry>> {
    let mut file = open(path)?;
    let mut data = Vec::with_capacity(ENTRY_LEN * MAX_ENTRIES);
    file.read_to_end(&mut data)?;

    if data.len() % ENTRY_LEN != 0 {
        return Err(KeyError::Corrupt {
            path: path.to_owned(),
            len: data.len(),
        }
        .into());
    }

    let keep = ENTRY_LEN * (MAX_ENTRIES - 1);
    if data.len() > keep {
        tracing::debug!(path = %path.display(), "24 hours of entries, dropping the oldest");
        data.drain(..data.len() - keep);
    }

    data.extend_from_slice(&generate_entry());

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&data)?;
    file.sync_all()?;

    Ok(data
        .chunks_exact(ENTRY_LEN)
        .map(|chunk| {
            let mut entry = [0u8; ENTRY_LEN];
            entry.copy_from_slice(chunk);
            entry
        })
        .collect())
}

fn open(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn generate_entry() -> Entry {
    let mut bytes = [0u8; RANDOM_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);

    let mut entry = [0u8; ENTRY_LEN];
    entry.copy_from_slice(URL_SAFE.encode(bytes).as_bytes());
    entry
}
