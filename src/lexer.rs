//! Splitting of raw input lines into argument vectors.
//!
//! There is no quoting, escaping or substitution: a token is a maximal run of
//! non-whitespace characters.

use std::fmt;

/// Ordered command-line tokens; the first element is the command name.
///
/// Tokens are never empty. The vector owns its strings, so it does not borrow
/// the line it was produced from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentVector {
    tokens: Vec<String>,
}

impl ArgumentVector {
    /// The command name, if there is at least one token.
    pub fn name(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Every token after the command name.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ArgumentVector {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// Split `input` on whitespace into at most `max_tokens` tokens.
///
/// Runs of delimiters never yield empty tokens. Text after the last accepted
/// token is dropped without error. A blank line gives an empty vector.
pub fn tokenize(input: &str, max_tokens: usize) -> ArgumentVector {
    input.split_whitespace().take(max_tokens).collect()
}
