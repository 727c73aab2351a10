//! Master credentials for envelope encryption.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Key-derivation overrides carried alongside a password.
///
/// Present when a host wants to migrate an archive to a different round
/// count; absent means the sealing default applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// PBKDF2-HMAC-SHA256 rounds to use on the next seal.
    pub rounds: u32,
}

/// Password plus optional key-derivation parameters.
///
/// Opaque to everything except the envelope codec. The password is zeroed
/// when the credentials are dropped, and `Debug` never reveals it.
#[derive(Clone)]
pub struct Credentials {
    password: Zeroizing<String>,
    key_derivation: Option<KeyDerivationParams>,
}

impl Credentials {
    /// Wrap a master password.
    pub fn from_password(password: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            key_derivation: None,
        }
    }

    /// Wrap a master password with explicit derivation parameters.
    pub fn with_key_derivation(password: impl Into<String>, params: KeyDerivationParams) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            key_derivation: Some(params),
        }
    }

    /// The master password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Derivation overrides, if any.
    pub fn key_derivation(&self) -> Option<KeyDerivationParams> {
        self.key_derivation
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &"<redacted>")
            .field("key_derivation", &self.key_derivation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::from_password("hunter2");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_key_derivation_round_trip() {
        let creds =
            Credentials::with_key_derivation("pw", KeyDerivationParams { rounds: 300_000 });
        assert_eq!(creds.key_derivation().unwrap().rounds, 300_000);
        assert!(Credentials::from_password("pw").key_derivation().is_none());
    }
}
