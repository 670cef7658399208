/// Password hashing and verification using Argon2id
use crate::error::{LoanTrackerError, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;

/// Stand-in secret hashed once per hasher; never a real account's password
const DUMMY_PASSWORD: &str = "loan-tracker-dummy-password";

/// Argon2id hasher with a fixed cost
///
/// Cheap to clone; build one at startup and share it.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// PHC string made with this hasher's cost, verified against on misses
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.argon2.params();
        f.debug_struct("PasswordHasher")
            .field("memory_kib", &params.m_cost())
            .field("iterations", &params.t_cost())
            .field("parallelism", &params.p_cost())
            .finish()
    }
}

impl PasswordHasher {
    /// Create a hasher with an explicit cost
    ///
    /// ## Arguments
    ///
    /// * `memory_kib` - Memory cost in KiB (at least 8 per lane)
    /// * `iterations` - Number of passes
    /// * `parallelism` - Number of lanes
    ///
    /// ## Errors
    ///
    /// Returns `LoanTrackerError::Internal` if argon2 rejects the parameters
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| LoanTrackerError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;

        Ok(Self {
            argon2,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Hash a password
    ///
    /// ## Security
    ///
    /// - Algorithm: Argon2id
    /// - Salt: Random salt generated per password, so hashing the same input
    ///   twice yields different digests
    ///
    /// ## Returns
    ///
    /// PHC-formatted hash string safe for database storage
    pub fn hash(&self, password: &str) -> Result<String> {
        hash_with(&self.argon2, password)
    }

    /// Verify a password against its hash
    ///
    /// The cost recorded in the PHC string is used, so hashes made with an
    /// older cost keep verifying. The digest comparison is constant-time.
    ///
    /// ## Returns
    ///
    /// `true` if password matches hash, `false` otherwise. A stored hash that
    /// does not parse is an internal error, not a mismatch.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
            LoanTrackerError::Internal(format!("Invalid password hash format: {}", e))
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(LoanTrackerError::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    /// Run a full verify against the internal dummy hash and discard the result
    ///
    /// Lets a lookup miss cost the same Argon2 work as a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| LoanTrackerError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}
