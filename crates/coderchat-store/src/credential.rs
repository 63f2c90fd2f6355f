//! Credential hashing.
//!
//! Credentials are stored as `blake3$<salt hex>$<digest hex>` where the
//! digest is BLAKE3 over `salt || credential`.  Verification recomputes the
//! digest and compares in constant time, so a check succeeds exactly when
//! the supplied credential equals the registered one byte-for-byte.
//!
//! Rows written by older builds hold the credential verbatim; those are
//! still accepted (constant-time compare) so an existing `chat.db` keeps
//! working.

use rand::RngCore;
use subtle::ConstantTimeEq;

const SCHEME: &str = "blake3";
const SALT_LEN: usize = 16;

/// Hash a credential with a fresh random salt.
pub fn hash_credential(credential: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    encode(&salt, credential)
}

/// Check `supplied` against a stored credential string.
pub fn verify_credential(stored: &str, supplied: &str) -> bool {
    let Some(rest) = stored.strip_prefix(SCHEME).and_then(|r| r.strip_prefix('$')) else {
        return ct_eq(stored.as_bytes(), supplied.as_bytes());
    };

    let Some((salt_hex, digest_hex)) = rest.split_once('$') else {
        tracing::warn!("malformed credential record");
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        tracing::warn!("malformed credential record");
        return false;
    };

    let actual = digest(&salt, supplied);
    ct_eq(actual.as_bytes(), &expected)
}

fn encode(salt: &[u8], credential: &str) -> String {
    format!(
        "{SCHEME}${}${}",
        hex::encode(salt),
        digest(salt, credential).to_hex()
    )
}

fn digest(salt: &[u8], credential: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(credential.as_bytes());
    hasher.finalize()
}

fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).unwrap_u8() == 1
}
