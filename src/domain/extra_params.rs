//! Ordered key/value configuration bag passed to signer engines.
//!
//! Requests carry it as a base64-encoded `.properties` block. Keys keep the
//! order in which they were first seen.

use crate::domain::encoding::decode_base64_lenient;
use crate::infra::error::{SigningError, SigningResult};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtraParams(IndexMap<String, String>);

impl ExtraParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a base64 `.properties` block.
    ///
    /// # Errors
    /// Fails when the block is not valid base64 or not UTF-8 text.
    pub fn from_base64(encoded: &str) -> SigningResult<Self> {
        let bytes = decode_base64_lenient(encoded)?;
        let text = String::from_utf8(bytes).map_err(|_| {
            SigningError::InvalidParameter("properties block is not UTF-8".to_string())
        })?;
        Ok(Self::parse_properties(&text))
    }

    /// Parse `.properties` text: `key=value`, `key:value` or `key value`
    /// entries, `#`/`!` comment lines, trailing-backslash continuations and
    /// backslash escapes (`\t \n \r \f \uXXXX`).
    #[must_use]
    pub fn parse_properties(text: &str) -> Self {
        let mut params = Self::new();
        let mut logical = String::new();

        for raw_line in text.lines() {
            let line = raw_line.trim_start();
            if logical.is_empty() && (line.is_empty() || line.starts_with(['#', '!'])) {
                continue;
            }

            if ends_with_continuation(line) {
                logical.push_str(&line[..line.len() - 1]);
                continue;
            }
            logical.push_str(line);

            let (key, value) = split_entry(&logical);
            params.0.insert(unescape(key), unescape(value));
            logical.clear();
        }

        if !logical.is_empty() {
            let (key, value) = split_entry(&logical);
            params.0.insert(unescape(key), unescape(value));
        }
        params
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of a boolean entry; only a case-insensitive `true` is true.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(parse_permissive_bool)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove an entry, preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for ExtraParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// `true` (any case) is true, everything else is false.
#[must_use]
pub fn parse_permissive_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
    trailing % 2 == 1
}

/// Split a logical line at the first unescaped `=`, `:` or whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                let value = line[index + 1..].trim_start();
                return (&line[..index], value);
            }
            c if c.is_whitespace() => {
                let rest = line[index..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map_or(rest, str::trim_start);
                return (&line[..index], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
