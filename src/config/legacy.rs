//! Legacy key-value credential format
//!
//! One property per line, `hostname=userId!encodingType!password`, with
//! encoding type `0` = plain text and `1` = base64. This is the format the
//! earliest bridge agents shipped with; files in the field still use it, so
//! it remains the fallback whenever a file fails the structured parse.
//! Legacy entries carry no requester constraint of their own; every entry
//! gets the match-any pattern.

use super::ConfigError;
use crate::table::CredentialTable;
use crate::{AuthMaterial, CredentialEntry, Secret};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::warn;

const ENCODED_PLAIN_TEXT: i32 = 0;
const ENCODED_BASE64: i32 = 1;

/// Requester pattern applied to every legacy entry
const LEGACY_MATCH_ANY: &str = ".*";

/// Parse legacy key-value text into `table`.
///
/// Invalid lines and undecodable entries are skipped with a logged reason;
/// parsing always continues with the next line.
pub(crate) fn parse(text: &str, table: &mut CredentialTable) {
    for line in text.lines() {
        let line = line.trim();
        // Blank lines and property-file comments
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((host, value)) = line.split_once('=') else {
            warn!("{}", ConfigError::LegacyParse(line.to_string()));
            continue;
        };
        let host = host.trim();
        match parse_value(value) {
            Ok(Some(auth)) => table.insert(CredentialEntry {
                server_host: host.to_string(),
                requester_pattern: Some(LEGACY_MATCH_ANY.to_string()),
                auth,
            }),
            Ok(None) => {}
            Err(err) => warn!(host, error = %err, "skipping credential entry"),
        }
    }
}

/// Split a `userId!encodingType!password` value into login material.
///
/// Tokens are `!`-separated with empty tokens skipped; a value with no
/// tokens at all produces no entry. A non-numeric encoding type is logged
/// and treated as plain text.
fn parse_value(value: &str) -> Result<Option<AuthMaterial>, ConfigError> {
    let mut tokens = value.split('!').filter(|token| !token.is_empty());
    let Some(username) = tokens.next() else {
        return Ok(None);
    };
    let username = username.trim().to_string();
    let encoding_text = tokens.next().map(str::trim).unwrap_or("");
    let password = tokens.next().map(str::trim).unwrap_or("");

    let encoding = match encoding_text.parse::<i32>() {
        Ok(encoding) => encoding,
        Err(err) => {
            warn!(encoding = encoding_text, error = %err, "unparsable encoding type, assuming plain text");
            ENCODED_PLAIN_TEXT
        }
    };

    let password = match encoding {
        ENCODED_PLAIN_TEXT => password.to_string(),
        ENCODED_BASE64 => decode_password(password)?,
        other => return Err(ConfigError::UnknownEncoding(other)),
    };

    Ok(Some(AuthMaterial::UserPassword {
        username,
        password: Secret::new(password),
    }))
}

fn decode_password(encoded: &str) -> Result<String, ConfigError> {
    let bytes = STANDARD.decode(encoded).map_err(|err| ConfigError::Decode {
        field: "password",
        reason: err.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|err| ConfigError::Decode {
        field: "password",
        reason: err.to_string(),
    })
}
