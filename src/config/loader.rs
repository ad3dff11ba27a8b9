//! Config file loader
//!
//! Files are read in fixed-size chunks. Each chunk is decrypted as it arrives
//! (when the file starts with the encryption tag) and appended to a pending
//! buffer; complete statements are parsed off the front and whatever is left,
//! a partial line or an unterminated block, is carried into the next round.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::crypt::Cipher;
use super::error::ConfigError;
use super::store::ConfigStore;
use super::value::ValueCell;
use crate::constants::config::CHUNK_SIZE;
use crate::constants::encryption::TAG;
use crate::constants::syntax::{ASSIGN, BLOCK, COMMENT, INCLUDE, SECTION_END, SECTION_START};

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Skip,
    Section(String),
    Include(String),
    Entry { key: String, value: String, block: bool },
    Malformed { reason: &'static str, line: String },
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn is_line_break(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Parse one statement from the front of `buf`.
///
/// Returns the statement and the number of bytes it used, or `None` when
/// more input is needed to finish it.
fn next_statement(buf: &[u8], eof: bool) -> Option<(Statement, usize)> {
    let Some(start) = buf.iter().position(|byte| !byte.is_ascii_whitespace()) else {
        return if buf.is_empty() {
            None
        } else {
            Some((Statement::Skip, buf.len()))
        };
    };

    let line = &buf[start..];
    let line_end = line.iter().position(|&byte| is_line_break(byte));
    let end = match line_end {
        Some(end) => Some(end),
        None if eof => Some(line.len()),
        None => None,
    };

    match line[0] {
        COMMENT => {
            let end = end?;
            Some((Statement::Skip, start + end))
        }
        SECTION_START => {
            let end = end?;
            let text = &line[..end];
            let statement = match text.iter().position(|&byte| byte == SECTION_END) {
                Some(close) => Statement::Section(lossy(&text[1..close]).trim().to_string()),
                None => Statement::Malformed {
                    reason: "Section header is missing its closing bracket",
                    line: lossy(text).into_owned(),
                },
            };
            Some((statement, start + end))
        }
        INCLUDE => {
            let end = end?;
            let text = &line[..end];
            let statement = match text[1..].iter().position(|&byte| byte == INCLUDE) {
                Some(close) => Statement::Include(lossy(&text[1..close + 1]).trim().to_string()),
                None => Statement::Malformed {
                    reason: "Include is missing its closing marker",
                    line: lossy(text).into_owned(),
                },
            };
            Some((statement, start + end))
        }
        _ => next_entry(line, end, eof).map(|(statement, used)| (statement, start + used)),
    }
}

fn next_entry(line: &[u8], end: Option<usize>, eof: bool) -> Option<(Statement, usize)> {
    // Until the line is complete only the part read so far can be inspected
    let scope = &line[..end.unwrap_or(line.len())];
    let stop = scope
        .iter()
        .position(|&byte| byte == COMMENT)
        .unwrap_or(scope.len());

    let Some(assign) = scope[..stop].iter().position(|&byte| byte == ASSIGN) else {
        let end = end?;
        return Some((
            Statement::Malformed {
                reason: "Key has no value",
                line: lossy(&line[..end]).into_owned(),
            },
            end,
        ));
    };

    let key = lossy(&scope[..assign]).trim().to_string();
    let mut value_start = assign + 1;
    while value_start < scope.len() && is_blank(scope[value_start]) {
        value_start += 1;
    }

    // A quote ending the buffer could still turn out to be `""`
    if line.get(value_start) == Some(&BLOCK) && value_start + 1 == line.len() && !eof {
        return None;
    }

    let opens_block = line.get(value_start) == Some(&BLOCK)
        && line.get(value_start + 1) != Some(&BLOCK);
    // `""x` is a plain value starting with one quote
    if line.get(value_start) == Some(&BLOCK) && !opens_block {
        value_start += 1;
    }

    if key.is_empty() {
        let end = end?;
        return Some((
            Statement::Malformed {
                reason: "Value has no key",
                line: lossy(&line[..end]).into_owned(),
            },
            end,
        ));
    }

    if opens_block {
        return next_block(line, key, value_start + 1, eof);
    }

    let end = end?;
    let value_end = line[value_start..end]
        .iter()
        .position(|&byte| byte == COMMENT)
        .map(|at| value_start + at)
        .unwrap_or(end)
        .max(value_start);
    let value = lossy(&line[value_start..value_end]).trim_end().to_string();

    Some((Statement::Entry { key, value, block: false }, end))
}

fn next_block(line: &[u8], key: String, content_start: usize, eof: bool) -> Option<(Statement, usize)> {
    let content_start = content_start.min(line.len());
    match line[content_start..].iter().position(|&byte| byte == BLOCK) {
        Some(at) => {
            let close = content_start + at;
            // Anything after the closing quote up to the line break is ignored
            let rest = &line[close + 1..];
            let used = match rest.iter().position(|&byte| is_line_break(byte)) {
                Some(at) => close + 1 + at,
                None if eof => line.len(),
                None => return None,
            };
            let value = lossy(&line[content_start..close]).into_owned();
            Some((Statement::Entry { key, value, block: true }, used))
        }
        None if eof => {
            warn!(key = %key, "Block value is missing its closing quote, keeping the rest of the file");
            let value = lossy(&line[content_start..]).into_owned();
            Some((Statement::Entry { key, value, block: true }, line.len()))
        }
        None => None,
    }
}

impl ConfigStore {
    /// Load a config file.
    ///
    /// Fails only when the file cannot be read (or is encrypted and no key is
    /// set); malformed lines are logged and skipped. The selected section is
    /// the same before and after the call.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| ConfigError::io(path, err))?;

        let top_level = self.begin_load();
        let previous = self.current_section().map(str::to_string);
        let result = self.read_stream(BufReader::with_capacity(CHUNK_SIZE, file), path);
        self.set_current(previous);
        self.end_load();

        if result.is_ok() {
            info!(path = %path.display(), "Loaded config file");
            if top_level {
                self.record_history(path);
            }
        }
        result
    }

    /// Load config text held in memory; includes resolve against the working directory
    pub fn load_str(&mut self, text: &str) -> Result<(), ConfigError> {
        self.begin_load();
        let previous = self.current_section().map(str::to_string);
        let result = self.read_stream(text.as_bytes(), Path::new(""));
        self.set_current(previous);
        self.end_load();
        result
    }

    fn read_stream<R: BufRead>(&mut self, mut reader: R, path: &Path) -> Result<(), ConfigError> {
        let head = reader.fill_buf().map_err(|err| ConfigError::io(path, err))?;
        let mut cipher = if head.starts_with(TAG) {
            reader.consume(TAG.len());
            let key = self.encryption_key().ok_or(ConfigError::MissingEncryptionKey)?;
            debug!(path = %path.display(), "Decrypting config file");
            Some(Cipher::new(key.as_bytes()).ok_or(ConfigError::MissingEncryptionKey)?)
        } else {
            None
        };

        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);
        loop {
            let read = reader
                .read(&mut chunk)
                .map_err(|err| ConfigError::io(path, err))?;
            let eof = read == 0;

            let fresh = &mut chunk[..read];
            if let Some(cipher) = &mut cipher {
                cipher.apply(fresh);
            }
            pending.extend_from_slice(fresh);

            let mut used = 0;
            while let Some((statement, length)) = next_statement(&pending[used..], eof) {
                used += length;
                self.apply_statement(statement, path);
            }
            pending.drain(..used);

            if eof {
                return Ok(());
            }
        }
    }

    fn apply_statement(&mut self, statement: Statement, path: &Path) {
        match statement {
            Statement::Skip => {}
            Statement::Section(name) => {
                if let Err(err) = self.select_section(&name) {
                    warn!(path = %path.display(), section = %name, error = %err, "Invalid section header");
                }
            }
            Statement::Include(target) => {
                let target = include_path(path, &target);
                debug!(path = %target.display(), "Including config file");
                if let Err(err) = self.load(&target) {
                    warn!(path = %target.display(), error = %err, "Failed to include config file");
                }
            }
            Statement::Entry { key, value, block } => {
                if let Err(err) = self.insert_value(&key, ValueCell::new(value, block)) {
                    warn!(path = %path.display(), key = %key, error = %err, "Config value skipped");
                }
            }
            Statement::Malformed { reason, line } => {
                warn!(path = %path.display(), line = %line, "{reason}");
            }
        }
    }
}

/// Resolve an include as given, falling back to the including file's directory
fn include_path(from: &Path, target: &str) -> PathBuf {
    let target = PathBuf::from(target);
    if target.exists() || target.is_absolute() {
        return target;
    }
    match from.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            let candidate = dir.join(&target);
            if candidate.exists() { candidate } else { target }
        }
        _ => target,
    }
}
