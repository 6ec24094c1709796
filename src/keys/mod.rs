//! Rolling key material for the `sid` cookie.
//!
//! Two files back the keyring: `.hash` feeds the authentication half of the
//! cookie key, `.key` the encryption half. Every roll appends one entry to
//! each and drops the oldest once a day's worth has accumulated.

mod roll;
pub mod rotation;

pub use roll::{roll, roll_file, ENTRY_LEN, HASH_FILE, KEY_FILE, MAX_ENTRIES};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("corruption of data in rolling key file {path:?}: {len} bytes is not a whole number of entries")]
    Corrupt { path: PathBuf, len: usize },
}

pub type Entry = [u8; ENTRY_LEN];

#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub hash: Entry,
    pub key: Entry,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyPair(..)")
    }
}

/// Key pairs ordered oldest to newest.
#[derive(Clone, Default, Debug)]
pub struct Keyring {
    pairs: Vec<KeyPair>,
}

impl Keyring {
    /// Pairs entries by age, newest with newest. When one file holds more
    /// entries than the other (a roll that failed halfway) the surplus old
    /// entries are ignored.
    pub fn pair(hashes: Vec<Entry>, keys: Vec<Entry>) -> Self {
        let mut pairs: Vec<KeyPair> = hashes
            .into_iter()
            .rev()
            .zip(keys.into_iter().rev())
            .map(|(hash, key)| KeyPair { hash, key })
            .collect();
        pairs.reverse();
        Self { pairs }
    }

    /// The pair new cookies are sealed with.
    pub fn current(&self) -> Option<&KeyPair> {
        self.pairs.last()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &KeyPair> {
        self.pairs.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Keyring shared between request handlers and the rotation task.
#[derive(Clone, Default, Debug)]
pub struct SharedKeyring(Arc<RwLock<Keyring>>);

impl SharedKeyring {
    pub fn new(keyring: Keyring) -> Self {
        Self(Arc::new(RwLock::new(keyring)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Keyring> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn replace(&self, keyring: Keyring) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = keyring;
    }
}

/// Rolls once so there is always a current pair, even on first start.
pub fn load_or_roll(dir: &Path) -> anyhow::Result<Keyring> {
    let keyring = roll(dir)?;
    tracing::info!(
        dir = %dir.display(),
        pairs = keyring.len(),
        "loaded cookie keyring"
    );
    Ok(keyring)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(byte: u8) -> Entry {
        [byte; ENTRY_LEN]
    }

    #[test]
    fn pairs_newest_with_newest() {
        let keyring = Keyring::pair(
            vec![entry(1), entry(2), entry(3)],
            vec![entry(20), entry(30)],
        );
        assert_eq!(keyring.len(), 2);
        let current = keyring.current().expect("current");
        assert_eq!(current.hash, entry(3));
        assert_eq!(current.key, entry(30));
        let oldest = keyring.newest_first().last().expect("oldest");
        assert_eq!(oldest.hash, entry(2));
        assert_eq!(oldest.key, entry(20));
    }

    #[test]
    fn empty_keyring_has_no_current_pair() {
        assert!(Keyring::default().current().is_none());
    }

    #[test]
    fn replace_is_seen_by_clones() {
        let shared = SharedKeyring::default();
        let reader = shared.clone();
        shared.replace(Keyring::pair(vec![entry(1)], vec![entry(2)]));
        assert_eq!(reader.read().len(), 1);
    }
}
