use crate::{auth::AuthError, config::Settings, model::Redacted};
use argon2::password_hash::{
    rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

#[derive(Clone, Debug)]
pub struct Argon {
    secret: Redacted<String>,
    memory_size: Option<u32>,
    iterations: Option<u32>,
}

impl Argon {
    pub fn new(settings: &Settings) -> Self {
        let Settings {
            argon_secret,
            argon_memory_size,
            argon_iterations,
            ..
        } = settings;
        Self {
            secret: Redacted::new(argon_secret.to_owned()),
            memory_size: argon_memory_size.to_owned(),
            iterations: argon_iterations.to_owned(),
        }
    }

    fn hasher(&self) -> Result<Argon2<'_>, AuthError> {
        let params = Params::new(
            self.memory_size.unwrap_or(Params::DEFAULT_M_COST),
            self.iterations.unwrap_or(Params::DEFAULT_T_COST),
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|_| AuthError::ArgonError)?;
        Argon2::new_with_secret(
            self.secret.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            params,
        )
        .map_err(|_| AuthError::ArgonError)
    }

    pub fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| AuthError::ArgonError)?;
        Ok(hash.to_string())
    }

    /// Spends the same work as [`Argon::verify`] without anything to compare
    /// against, for log-ins naming an unknown email.
    pub fn decoy(&self, password: &str) -> anyhow::Result<()> {
        self.hash(password).map(drop)
    }

    /// A mismatch is `Ok(false)`; only an unreadable hash is an error.
    pub fn verify(&self, hash: &str, password: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::ArgonError)?;
        match self.hasher()?.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(_) => Err(AuthError::ArgonError.into()),
        }
    }
}
