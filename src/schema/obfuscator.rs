use sha2::{Digest, Sha256};

/// Deterministic, injective-per-schema mapping from human-readable
/// identifiers to opaque persisted names. The registry records the reverse
/// lookup in the compiled artifact so debugging and regeneration can get the
/// original names back.
pub trait NameObfuscator: Send + Sync {
    fn obfuscate(&self, name: &str) -> String;
}

/// Identity obfuscation, the default.
pub struct PlainNameObfuscator;

impl NameObfuscator for PlainNameObfuscator {
    fn obfuscate(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Hash-based obfuscation: `gql_` followed by the SHA-256 hex digest of the
/// name. The prefix keeps the result a valid identifier.
pub struct HashNameObfuscator;

impl NameObfuscator for HashNameObfuscator {
    fn obfuscate(&self, name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        format!("gql_{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_obfuscation_is_deterministic() {
        let obfuscator = HashNameObfuscator;
        assert_eq!(obfuscator.obfuscate("Book"), obfuscator.obfuscate("Book"));
    }

    #[test]
    fn hash_obfuscation_distinguishes_names() {
        let obfuscator = HashNameObfuscator;
        assert_ne!(obfuscator.obfuscate("Book"), obfuscator.obfuscate("Author"));
    }

    #[test]
    fn hash_obfuscation_yields_valid_identifiers() {
        let opaque = HashNameObfuscator.obfuscate("Book");
        assert!(opaque.starts_with("gql_"));
        assert!(opaque.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn plain_obfuscation_is_identity() {
        assert_eq!(PlainNameObfuscator.obfuscate("Book"), "Book");
    }
}
