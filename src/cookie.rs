//! Sealed cookie values.
//!
//! A value is `timestamp|json`, encrypted with AES-256-GCM under a key derived
//! from the current keyring pair. The cookie name is bound as associated data
//! so a value cannot be replayed under another name. Decoding walks the
//! keyring newest first, so cookies survive key rotation until their pair
//! rolls out of the files.

use crate::keys::{KeyPair, Keyring};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use thiserror::Error;

pub const SESSION_COOKIE: &str = "sid";

const NONCE_LEN: usize = 12;
const KEY_INFO: &[u8] = b"catalog-auth cookie";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieError {
    #[error("cookie value is malformed")]
    Malformed,
    #[error("cookie value does not authenticate under any known key")]
    Tampered,
    #[error("cookie has expired")]
    Expired,
    #[error("cookie was issued in the future")]
    NotYetValid,
    #[error("no cookie keys are loaded")]
    EmptyKeyring,
    #[error("could not derive cookie key")]
    KeyDerivation,
    #[error("could not seal cookie value")]
    Seal,
}

fn cipher(pair: &KeyPair) -> Result<Aes256Gcm, CookieError> {
    let hk = Hkdf::<Sha256>::new(Some(&pair.hash), &pair.key);
    let mut okm = [0u8; 32];
    hk.expand(KEY_INFO, &mut okm)
        .map_err(|_| CookieError::KeyDerivation)?;
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&okm)))
}

pub fn encode<T: Serialize>(
    keyring: &Keyring,
    name: &str,
    value: &T,
    now: DateTime<Utc>,
) -> Result<String, CookieError> {
    let pair = keyring.current().ok_or(CookieError::EmptyKeyring)?;
    let json = serde_json::to_string(value).map_err(|_| CookieError::Malformed)?;
    let plaintext = format!("{}|{}", now.timestamp(), json);

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let sealed = cipher(pair)?
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext.as_bytes(),
                aad: name.as_bytes(),
            },
        )
        .map_err(|_| CookieError::Seal)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(URL_SAFE_NO_PAD.encode(out))
}

pub fn decode<T: DeserializeOwned>(
    keyring: &Keyring,
    name: &str,
    value: &str,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<T, CookieError> {
    if keyring.is_empty() {
        return Err(CookieError::EmptyKeyring);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| CookieError::Malformed)?;
    if bytes.len() <= NONCE_LEN {
        return Err(CookieError::Malformed);
    }
    let (nonce, sealed) = bytes.split_at(NONCE_LEN);

    let mut opened = None;
    for pair in keyring.newest_first() {
        let payload = Payload {
            msg: sealed,
            aad: name.as_bytes(),
        };
        if let Ok(plaintext) = cipher(pair)?.decrypt(Nonce::from_slice(nonce), payload) {
            opened = Some(plaintext);
            break;
        }
    }
    let plaintext = opened.ok_or(CookieError::Tampered)?;

    let text = std::str::from_utf8(&plaintext).map_err(|_| CookieError::Malformed)?;
    let (issued, json) = text.split_once('|').ok_or(CookieError::Malformed)?;
    let issued: i64 = issued.parse().map_err(|_| CookieError::Malformed)?;

    if issued > now.timestamp() {
        return Err(CookieError::NotYetValid);
    }
    if issued < now.timestamp() - max_age.num_seconds() {
        return Err(CookieError::Expired);
    }

    serde_json::from_str(json).map_err(|_| CookieError::Malformed)
}
