//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Path pattern language used by permissions.
//!
//! Patterns are matched against the whole candidate string with `.` as the
//! segment separator:
//!
//! | Syntax        | Matches                                          |
//! |---------------|--------------------------------------------------|
//! | `?`           | one character other than `.`                     |
//! | `*`           | zero or more characters within one segment       |
//! | `.**`         | zero or more trailing segments (end only)        |
//! | `{name}`      | one non-empty segment, captured as `name`        |
//! | `{name:re}`   | text matching `re`, captured as `name`           |
//!
//! Everything else matches literally.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while compiling a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `{` has no matching `}`.
    #[error("pattern '{pattern}' has an unclosed capture")]
    UnclosedCapture {
        /// The offending pattern
        pattern: String,
    },

    /// `**` appears somewhere other than a trailing `.**` segment.
    #[error("pattern '{pattern}' uses '**' before its last segment")]
    MisplacedDoubleStar {
        /// The offending pattern
        pattern: String,
    },

    /// A capture name is empty or not an identifier.
    #[error("pattern '{pattern}' has an invalid capture name '{name}'")]
    InvalidCaptureName {
        /// The offending pattern
        pattern: String,
        /// The rejected name
        name: String,
    },

    /// The compiled expression was rejected by the regex engine.
    #[error("pattern '{pattern}' is not a valid expression: {message}")]
    Regex {
        /// The offending pattern
        pattern: String,
        /// Regex engine diagnostic
        message: String,
    },
}

/// A compiled path pattern.
///
/// # Examples
///
/// ```rust
/// use crirpc::security::PathPattern;
///
/// let pattern = PathPattern::new("srv://{user}@chat.**")?;
/// assert!(pattern.matches("srv://alice@chat.Room/post"));
/// assert!(!pattern.matches("srv://alice@mail.Inbox"));
///
/// let captures = pattern.captures("srv://alice@chat.Room").unwrap();
/// assert_eq!(captures["user"], "alice");
/// # Ok::<(), crirpc::security::PatternError>(())
/// ```
#[derive(Clone)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is malformed.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let (expression, names) = translate(pattern)?;
        let regex = Regex::new(&expression).map_err(|e| PatternError::Regex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            names,
        })
    }

    /// The pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the whole of `candidate` matches.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Returns the named captures if `candidate` matches.
    #[must_use]
    pub fn captures(&self, candidate: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(candidate)?;
        Some(
            self.names
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn translate(pattern: &str) -> Result<(String, Vec<String>), PatternError> {
    let misplaced = || PatternError::MisplacedDoubleStar {
        pattern: pattern.to_string(),
    };

    let mut expression = String::from("^");
    let mut names = Vec::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '.' if chars[i + 1..] == ['*', '*'] => {
                expression.push_str(r"(?:\..*)?");
                i = chars.len();
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.len() != 2 {
                    return Err(misplaced());
                }
                expression.push_str(".*");
                i = chars.len();
            }
            '*' => {
                expression.push_str("[^.]*");
                i += 1;
            }
            '?' => {
                expression.push_str("[^.]");
                i += 1;
            }
            '{' => {
                let (capture, name, next) = capture(pattern, &chars, i)?;
                expression.push_str(&capture);
                names.push(name);
                i = next;
            }
            c => {
                let mut buf = [0u8; 4];
                expression.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    expression.push('$');
    Ok((expression, names))
}

/// Translates the capture starting at `chars[start] == '{'`.
///
/// Returns the regex group, the capture name and the index after the `}`.
fn capture(pattern: &str, chars: &[char], start: usize) -> Result<(String, String, usize), PatternError> {
    let mut depth = 0usize;
    let mut end = None;
    for (offset, c) in chars[start..].iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.ok_or_else(|| PatternError::UnclosedCapture {
        pattern: pattern.to_string(),
    })?;

    let body: String = chars[start + 1..end].iter().collect();
    let (name, expression) = match body.split_once(':') {
        Some((name, expression)) => (name.to_string(), expression.to_string()),
        None => (body.clone(), "[^.]+".to_string()),
    };
    if !is_identifier(&name) {
        return Err(PatternError::InvalidCaptureName {
            pattern: pattern.to_string(),
            name,
        });
    }
    Ok((format!("(?P<{name}>{expression})"), name, end + 1))
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathPattern({})", self.source)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PathPattern {}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        Self::new(pattern)
    }
}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        PathPattern::new(&source).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(source: &str) -> PathPattern {
        PathPattern::new(source).unwrap()
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let p = pattern("srv://a.*.C");
        assert!(p.matches("srv://a.b.C"));
        assert!(p.matches("srv://a..C"));
        assert!(!p.matches("srv://a.b.x.C"));
    }

    #[test]
    fn test_trailing_double_star() {
        let p = pattern("srv://*.**");
        assert!(p.matches("srv://a.b.C"));
        assert!(p.matches("srv://a"));
        assert!(p.matches("srv://a.b.C/method"));
        assert!(!p.matches("evt://a.b.C"));

        let everything = pattern("**");
        assert!(everything.matches("anything.at.all"));
    }

    #[test]
    fn test_misplaced_double_star() {
        assert!(matches!(
            PathPattern::new("srv://**.C"),
            Err(PatternError::MisplacedDoubleStar { .. })
        ));
        assert!(PathPattern::new("a.**.b").is_err());
    }

    #[test]
    fn test_question_mark() {
        let p = pattern("srv://v?.Api");
        assert!(p.matches("srv://v1.Api"));
        assert!(!p.matches("srv://v10.Api"));
        assert!(!p.matches("srv://v..Api"));
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let p = pattern("srv://a+b.C");
        assert!(p.matches("srv://a+b.C"));
        assert!(!p.matches("srv://aab.C"));
    }

    #[test]
    fn test_named_captures() {
        let p = pattern("stream://{device}@sensor.{kind:[a-z]+}");
        let captures = p.captures("stream://dev-1@sensor.temp").unwrap();
        assert_eq!(captures["device"], "dev-1");
        assert_eq!(captures["kind"], "temp");
        assert!(p.captures("stream://dev-1@sensor.Temp").is_none());

        let nested = pattern("srv://{v:[0-9]{1,2}}.Api");
        assert!(nested.matches("srv://12.Api"));
        assert!(!nested.matches("srv://123.Api"));
    }

    #[test]
    fn test_invalid_captures() {
        assert!(matches!(
            PathPattern::new("srv://{name"),
            Err(PatternError::UnclosedCapture { .. })
        ));
        assert!(matches!(
            PathPattern::new("srv://{1x}"),
            Err(PatternError::InvalidCaptureName { .. })
        ));
        assert!(matches!(
            PathPattern::new("srv://{x:(}"),
            Err(PatternError::Regex { .. })
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let p = pattern("srv://*.**");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"srv://*.**\"");
        let back: PathPattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
