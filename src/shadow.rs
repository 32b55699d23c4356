//! Flat key/value shadow documents, read with a single-pass scanner instead of
//! a general JSON parser.

use serde_json::Value;

use crate::constants::{SHADOW_TABLE_CAPACITY, SHADOW_TOKEN_MAX};

const REPORTED_MARKER: &str = "reported";
const DESIRED_MARKER: &str = "desired";

/// Wraps name/value pairs into the desired-state envelope. Every value is
/// written as an escaped string literal, which `ShadowDocument::decode` reads
/// back unescaped.
pub fn encode<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let body = pairs
        .into_iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                Value::String(name.as_ref().to_owned()),
                Value::String(value.as_ref().to_owned())
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{\"state\": {{\"desired\": {{{body}}}}}}}")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShadowEntry {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    Default,
    InQuotes,
    Escaped,
    Unicode { code: u32, digits: u8 },
}

fn push_token_char(token: &mut String, token_len: &mut usize, ch: char) {
    if *token_len < SHADOW_TOKEN_MAX {
        token.push(ch);
    }
    *token_len += 1;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Searching,
    /// Provisional capture of a desired object; dropped if a reported
    /// object shows up later in the document.
    Desired,
    Reported,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShadowDocument {
    entries: Vec<ShadowEntry>,
    pending_name: Option<String>,
}

impl ShadowDocument {
    pub fn decode(text: &str) -> Self {
        let mut doc = Self::default();
        let mut state = ScanState::Default;
        let mut section = Section::Searching;
        let mut expect_value = false;
        let mut desired_taken = false;
        let mut token = String::new();
        let mut token_len = 0usize;

        for ch in text.chars() {
            match state {
                ScanState::InQuotes if ch == '\\' => state = ScanState::Escaped,
                ScanState::InQuotes if ch != '"' => push_token_char(&mut token, &mut token_len, ch),
                ScanState::Escaped => {
                    state = ScanState::InQuotes;
                    let unescaped = match ch {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        'u' => {
                            state = ScanState::Unicode { code: 0, digits: 0 };
                            continue;
                        }
                        other => other,
                    };
                    push_token_char(&mut token, &mut token_len, unescaped);
                }
                ScanState::Unicode { code, digits } => {
                    let code = code * 16 + ch.to_digit(16).unwrap_or(0);
                    if digits < 3 {
                        state = ScanState::Unicode {
                            code,
                            digits: digits + 1,
                        };
                    } else {
                        state = ScanState::InQuotes;
                        let unescaped = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                        push_token_char(&mut token, &mut token_len, unescaped);
                    }
                }
                ScanState::InQuotes => {
                    state = ScanState::Default;
                    if token.contains(REPORTED_MARKER) {
                        if section != Section::Reported {
                            doc.clear();
                            section = Section::Reported;
                        }
                    } else if token.contains(DESIRED_MARKER)
                        && section == Section::Searching
                        && !desired_taken
                    {
                        section = Section::Desired;
                        desired_taken = true;
                    } else if section != Section::Searching {
                        if expect_value {
                            doc.push_value(&token);
                            expect_value = false;
                        } else {
                            doc.set_name(&token);
                        }
                    }
                }
                ScanState::Default => match ch {
                    '"' => {
                        state = ScanState::InQuotes;
                        token.clear();
                        token_len = 0;
                    }
                    ':' => expect_value = true,
                    '{' => expect_value = false,
                    '}' => match section {
                        Section::Reported => break,
                        Section::Desired => section = Section::Searching,
                        Section::Searching => {}
                    },
                    _ => {}
                },
            }
        }
        doc
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.pending_name = None;
    }

    fn set_name(&mut self, name: &str) {
        if self.entries.len() < SHADOW_TABLE_CAPACITY {
            self.pending_name = Some(name.to_owned());
        }
    }

    /// A value without a preceding name still fills the slot, with an
    /// empty name.
    fn push_value(&mut self, value: &str) {
        if self.entries.len() >= SHADOW_TABLE_CAPACITY {
            return;
        }
        self.entries.push(ShadowEntry {
            name: self.pending_name.take().unwrap_or_default(),
            value: value.to_owned(),
        });
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    pub fn entries(&self) -> &[ShadowEntry] {
        &self.entries
    }

    pub fn pending_name(&self) -> Option<&str> {
        self.pending_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
