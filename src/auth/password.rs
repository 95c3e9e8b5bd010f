use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;
use uuid::Uuid;

/// Argon2id hasher with a configurable iteration count (the work factor).
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a random throwaway secret, checked when there is no stored hash.
    decoy: String,
}

impl PasswordHasher {
    pub fn new(cost: Option<u32>) -> anyhow::Result<Self> {
        let params = match cost {
            Some(t_cost) => Params::new(
                Params::DEFAULT_M_COST,
                t_cost,
                Params::DEFAULT_P_COST,
                None,
            )
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?,
            None => Params::default(),
        };
        let mut hasher = Self {
            params,
            decoy: String::new(),
        };
        hasher.decoy = hasher.hash(&Uuid::new_v4().to_string())?;
        Ok(hasher)
    }

    pub fn decoy_hash(&self) -> &str {
        &self.decoy
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes with a fresh random salt; the salt and params travel inside the
    /// returned PHC string.
    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Constant-time check of `plain` against a stored hash. The params stored
    /// in the hash win over `self.params`, so cost changes keep old hashes valid.
    pub fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(self
            .argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// `hash` on the blocking pool.
    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    /// Runs a full verification against the decoy hash and discards the
    /// result. Costs the same as a real `verify_blocking`.
    pub async fn verify_decoy_blocking(&self, plain: String) {
        let decoy = self.decoy.clone();
        if let Err(e) = self.verify_blocking(plain, decoy).await {
            error!(error = %e, "argon2 decoy verify error");
        }
    }

    /// `verify` on the blocking pool.
    pub async fn verify_blocking(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await?
    }
}
