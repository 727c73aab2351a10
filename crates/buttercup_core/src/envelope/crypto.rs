//! Cryptographic primitive for the envelope.
//!
//! PBKDF2-HMAC-SHA256 key derivation, AES-256-CBC with PKCS7 padding, and
//! HMAC-SHA256 authentication. 64 bytes are derived per password: the first
//! half keys the cipher, the second half keys the MAC.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{ButtercupError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

pub(crate) const SALT_LEN: usize = 16;
pub(crate) const IV_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Cipher and MAC keys derived from one password. Zeroed on drop.
pub(crate) struct DerivedKeys {
    material: Zeroizing<[u8; KEY_LEN * 2]>,
}

impl DerivedKeys {
    pub(crate) fn cipher_key(&self) -> &[u8] {
        &self.material[..KEY_LEN]
    }

    pub(crate) fn hmac_key(&self) -> &[u8] {
        &self.material[KEY_LEN..]
    }
}

/// Stretch a password into cipher + MAC key material.
pub(crate) fn derive_keys(password: &str, salt: &[u8], rounds: u32) -> DerivedKeys {
    let mut material = Zeroizing::new([0u8; KEY_LEN * 2]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, material.as_mut_slice());
    DerivedKeys { material }
}

/// Fresh random bytes from the OS.
pub(crate) fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    OsRng.fill_bytes(&mut out);
    out
}

pub(crate) fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Vec<u8> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).expect("key and IV lengths are fixed");
    cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

pub(crate) fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| ButtercupError::AuthenticationFailure)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ButtercupError::AuthenticationFailure)
}

/// HMAC-SHA256 tag over `message`.
pub(crate) fn authenticate(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time verification of an HMAC-SHA256 tag.
pub(crate) fn verify(key: &[u8], message: &[u8], tag: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}
