//! The encrypted envelope format.
//!
//! On disk an archive is a two-line UTF-8 text:
//!
//! ```text
//! b~>buttercup/a v1.0
//! <BASE64 of salt$iv$rounds$ciphertext$hmac>
//! ```
//!
//! The first line is a human-readable signature; loading refuses anything
//! without it. The Base64 body decodes to a self-describing delimited
//! packet: salt (hex), IV (hex), PBKDF2 round count (decimal), ciphertext
//! (Base64), and an HMAC-SHA256 tag (hex) over the first four fields. The
//! tag is verified in constant time before any decryption work.

mod crypto;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

use crate::config::{EnvelopeConfig, MIN_KDF_ROUNDS};
use crate::credentials::Credentials;
use crate::error::{ButtercupError, Result};

/// Signature prefix; the full first line appends `<major>.<minor>`.
pub const SIGNATURE_PREFIX: &str = "b~>buttercup/a v";

const FORMAT_MAJOR: u32 = 1;
const FORMAT_MINOR: u32 = 0;

/// Encrypt history lines into envelope text.
pub fn seal_history(
    lines: &[String],
    credentials: &Credentials,
    config: &EnvelopeConfig,
) -> Result<String> {
    let requested = credentials
        .key_derivation()
        .map(|params| params.rounds)
        .unwrap_or_else(|| config.effective_rounds());
    let rounds = requested.max(MIN_KDF_ROUNDS);

    let salt = crypto::random_bytes::<{ crypto::SALT_LEN }>();
    let iv = crypto::random_bytes::<{ crypto::IV_LEN }>();
    let keys = crypto::derive_keys(credentials.password(), &salt, rounds);

    let plaintext = lines.join("\n");
    let ciphertext = crypto::encrypt(plaintext.as_bytes(), keys.cipher_key(), &iv);

    let authenticated = format!(
        "{}${}${}${}",
        hex::encode(salt),
        hex::encode(iv),
        rounds,
        BASE64.encode(&ciphertext)
    );
    let tag = crypto::authenticate(keys.hmac_key(), authenticated.as_bytes());
    let packed = format!("{}${}", authenticated, hex::encode(tag));

    debug!(lines = lines.len(), rounds, "sealed archive history");
    Ok(format!(
        "{SIGNATURE_PREFIX}{FORMAT_MAJOR}.{FORMAT_MINOR}\n{}",
        BASE64.encode(packed.as_bytes())
    ))
}

/// Decrypt envelope text back into history lines.
pub fn open_history(text: &str, credentials: &Credentials) -> Result<Vec<String>> {
    let (signature, body) = match text.split_once('\n') {
        Some(parts) => parts,
        None => (text, ""),
    };
    check_signature(signature)?;

    let packed = BASE64
        .decode(body.trim())
        .map_err(|_| ButtercupError::AuthenticationFailure)?;
    let packed = String::from_utf8(packed).map_err(|_| ButtercupError::AuthenticationFailure)?;

    let fields: Vec<&str> = packed.split('$').collect();
    let [salt_hex, iv_hex, rounds_str, ciphertext_b64, tag_hex] = fields[..] else {
        return Err(ButtercupError::AuthenticationFailure);
    };

    let salt = hex::decode(salt_hex).map_err(|_| ButtercupError::AuthenticationFailure)?;
    let iv = hex::decode(iv_hex).map_err(|_| ButtercupError::AuthenticationFailure)?;
    let rounds: u32 = rounds_str
        .parse()
        .map_err(|_| ButtercupError::AuthenticationFailure)?;
    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|_| ButtercupError::AuthenticationFailure)?;
    let tag = hex::decode(tag_hex).map_err(|_| ButtercupError::AuthenticationFailure)?;

    let keys = crypto::derive_keys(credentials.password(), &salt, rounds);
    let authenticated_len = packed.len() - tag_hex.len() - 1;
    if !crypto::verify(
        keys.hmac_key(),
        packed[..authenticated_len].as_bytes(),
        &tag,
    ) {
        return Err(ButtercupError::AuthenticationFailure);
    }

    let plaintext = crypto::decrypt(&ciphertext, keys.cipher_key(), &iv)?;
    let plaintext =
        String::from_utf8(plaintext).map_err(|_| ButtercupError::AuthenticationFailure)?;

    let lines: Vec<String> = plaintext
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    debug!(lines = lines.len(), rounds, "opened archive envelope");
    Ok(lines)
}

fn check_signature(line: &str) -> Result<()> {
    let version = line
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| ButtercupError::UnrecognizedFormat("missing signature".into()))?;
    let (major, _minor) = version
        .split_once('.')
        .ok_or_else(|| ButtercupError::UnrecognizedFormat(format!("bad version '{version}'")))?;
    let major: u32 = major
        .parse()
        .map_err(|_| ButtercupError::UnrecognizedFormat(format!("bad version '{version}'")))?;
    if major > FORMAT_MAJOR {
        return Err(ButtercupError::UnrecognizedFormat(format!(
            "unsupported major version {major}"
        )));
    }
    Ok(())
}
