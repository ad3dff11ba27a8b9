//! Config writer

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::crypt::Cipher;
use super::error::ConfigError;
use super::store::ConfigStore;
use super::value::ValueCell;
use crate::constants::encryption::TAG;
use crate::constants::syntax::{BLOCK, COMMENT, INHERITANCE, LIST_SEPARATOR, RANDOM_SEPARATOR};

/// Text written after `key = ` so that loading it gives back the same cell.
///
/// Block cells are always quoted. A plain cell is written as is when the
/// loader reads it back unchanged; otherwise it may only be quoted when it
/// has no list, random range or reference syntax for the block to switch off.
fn format_value(section: &str, key: &str, cell: &ValueCell) -> Result<String, ConfigError> {
    let literal = cell.literal();
    let quote = BLOCK as char;
    let unrepresentable = || ConfigError::Unrepresentable {
        section: section.to_string(),
        key: key.to_string(),
    };

    if cell.is_block() {
        if literal.contains(quote) {
            return Err(unrepresentable());
        }
        return Ok(format!("{quote}{literal}{quote}"));
    }

    let verbatim = !literal.contains(COMMENT as char)
        && !literal.contains(['\n', '\r'])
        && literal.trim() == literal;
    if verbatim {
        if literal.starts_with(quote) {
            // `""` at the start of a value stands for one literal quote
            return Ok(format!("{quote}{literal}"));
        }
        return Ok(literal.to_string());
    }

    let plain_text = literal.trim() == literal
        && !literal.contains([quote, LIST_SEPARATOR, RANDOM_SEPARATOR])
        && !literal.starts_with(INHERITANCE);
    if plain_text {
        return Ok(format!("{quote}{literal}{quote}"));
    }
    Err(unrepresentable())
}

impl ConfigStore {
    /// Write every section to `path`, encrypted when `encrypt` is set
    pub fn save(&self, path: impl AsRef<Path>, encrypt: bool) -> Result<(), ConfigError> {
        self.save_filtered(path, encrypt, |_, _, _| true)
    }

    /// Write the sections and keys accepted by `filter`.
    ///
    /// The filter receives `(section, None, encrypt)` once per section and
    /// `(section, Some(key), encrypt)` once per key of an accepted section.
    /// Nothing is written when a value cannot be expressed in the file format.
    pub fn save_filtered<F>(&self, path: impl AsRef<Path>, encrypt: bool, mut filter: F) -> Result<(), ConfigError>
    where
        F: FnMut(&str, Option<&str>, bool) -> bool,
    {
        let path = path.as_ref();
        let cipher = if encrypt {
            let key = self.encryption_key().ok_or(ConfigError::MissingEncryptionKey)?;
            Some(Cipher::new(key.as_bytes()).ok_or(ConfigError::MissingEncryptionKey)?)
        } else {
            None
        };

        let mut text = String::new();
        for section in self.sections() {
            if !filter(section.name(), None, encrypt) {
                continue;
            }

            // Writing to a String cannot fail
            let _ = match section.parent() {
                Some(parent) => writeln!(text, "[{}{INHERITANCE}{parent}]", section.name()),
                None => writeln!(text, "[{}]", section.name()),
            };
            for (key, cell) in section.entries() {
                if !filter(section.name(), Some(key), encrypt) {
                    continue;
                }
                let value = format_value(section.name(), key, cell).inspect_err(|_| {
                    warn!(section = %section.name(), key = %key, literal = %cell.literal(), "Value cannot be saved");
                })?;
                let _ = writeln!(text, "{key} = {value}");
            }
            text.push('\n');
        }

        let mut body = text.into_bytes();
        let mut bytes = Vec::with_capacity(body.len() + TAG.len());
        if let Some(mut cipher) = cipher {
            bytes.extend_from_slice(TAG);
            cipher.apply(&mut body);
        }
        bytes.extend_from_slice(&body);

        fs::write(path, bytes).map_err(|err| ConfigError::io(path, err))?;
        info!(path = %path.display(), encrypted = encrypt, "Saved config file");
        Ok(())
    }
}
