use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kb: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kb: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

fn argon2_with_params(params: &KdfParams) -> Result<Argon2<'static>, &'static str> {
    let params = Params::new(params.memory_kb, params.iterations, params.parallelism, None)
        .map_err(|_| "invalid kdf params")?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn peppered(password: &str, pepper: &str) -> String {
    let mut out = String::with_capacity(password.len() + pepper.len());
    out.push_str(password);
    out.push_str(pepper);
    out
}

/// Hashes a login password into a PHC string with a random salt.
#[instrument(level = "debug", skip_all)]
pub fn hash_password(
    password: &str,
    pepper: &str,
    params: &KdfParams,
) -> Result<String, &'static str> {
    let argon2 = argon2_with_params(params)?;
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(peppered(password, pepper).as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| "hash failed")
}

#[instrument(level = "debug", skip_all)]
pub fn verify_password(stored: &str, password: &str, pepper: &str) -> Result<bool, &'static str> {
    let parsed = PasswordHash::new(stored).map_err(|_| "invalid password hash")?;
    // Cost parameters come from the PHC string itself.
    Ok(Argon2::default()
        .verify_password(peppered(password, pepper).as_bytes(), &parsed)
        .is_ok())
}
