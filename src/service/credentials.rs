/// Password digest seam
///
/// Password hashing is not part of the habit domain. Backends receive a
/// `CredentialHasher` and only ever store and compare its output.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

const SCHEME: &str = "sha256";

/// Produces and verifies password digests
pub trait CredentialHasher: Send + Sync {
    /// Digest a password for storage
    fn hash(&self, password: &str) -> String;

    /// Whether `password` matches a digest previously produced by `hash`
    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// Salted SHA-256 digests in the form `sha256$<salt>$<hex>`
///
/// A single fast hash pass is a placeholder, not a password KDF. Deployments
/// that store real credentials should inject a memory-hard hasher (Argon2 or
/// similar) through `with_hasher` on either backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    fn digest_with_salt(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let hex = Self::digest_with_salt(&salt, password);
        format!("{SCHEME}${salt}${hex}")
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        let mut parts = digest.splitn(3, '$');
        let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }

        let actual = Self::digest_with_salt(salt, password);
        actual.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}
