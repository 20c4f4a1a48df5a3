//! Glob filter lists.
//!
//! One list type serves both uses: hostmask ignores (`nick!user@host`) and
//! message-text filters. Any match drops the whole message; nothing is ever
//! partially redacted.
//!
//! Patterns accept `{a,b}` alternation (nestable) and `\` escapes on top of
//! the usual `*`, `?` and `[...]`. Alternation is expanded into one compiled
//! pattern per branch.

use glob::{MatchOptions, Pattern, PatternError};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// `*` must cross every character, including `/` in hostnames and text.
const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Errors building a filter list.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error("unclosed brace in glob pattern {pattern:?}")]
    UnclosedBrace { pattern: String },
}

/// An ordered list of compiled glob patterns.
#[derive(Debug, Clone, Default)]
pub struct GlobList {
    /// One entry per configured pattern, holding its expanded branches.
    patterns: Vec<Vec<Pattern>>,
}

impl GlobList {
    /// Compile every pattern; the first invalid one fails the whole list.
    pub fn new<I, S>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|raw| compile(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// True if any pattern matches the whole of `candidate`.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.patterns
            .iter()
            .flatten()
            .any(|pattern| pattern.matches_with(candidate, OPTIONS))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn compile(raw: &str) -> Result<Vec<Pattern>, FilterError> {
    let branches = expand_braces(raw).ok_or_else(|| FilterError::UnclosedBrace {
        pattern: raw.to_owned(),
    })?;
    branches
        .iter()
        .map(|branch| {
            Pattern::new(&translate_escapes(branch)).map_err(|source| {
                FilterError::InvalidPattern {
                    pattern: raw.to_owned(),
                    source,
                }
            })
        })
        .collect()
}

/// Expand the first top-level `{...}` group, recursing into each branch.
///
/// Escaped braces and commas are skipped and left in place. `None` when a
/// group is never closed; a stray `}` is literal.
fn expand_braces(raw: &str) -> Option<Vec<String>> {
    let bytes = raw.as_bytes();
    let mut open = 0;
    let mut depth = 0usize;
    let mut commas = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => {
                if depth == 0 {
                    open = i;
                }
                depth += 1;
            }
            b',' if depth == 1 => commas.push(i),
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let (prefix, suffix) = (&raw[..open], &raw[i + 1..]);
                    let mut bounds = Vec::with_capacity(commas.len() + 2);
                    bounds.push(open);
                    bounds.extend(commas);
                    bounds.push(i);
                    let mut expanded = Vec::new();
                    for pair in bounds.windows(2) {
                        let branch = &raw[pair[0] + 1..pair[1]];
                        expanded.extend(expand_braces(&format!("{prefix}{branch}{suffix}"))?);
                    }
                    return Some(expanded);
                }
            }
            _ => {}
        }
        i += 1;
    }
    (depth == 0).then(|| vec![raw.to_owned()])
}

/// Rewrite `\x` into the bracket form the matcher understands.
///
/// Inside a character class the escaped character is kept as-is. A trailing
/// backslash is literal.
fn translate_escapes(branch: &str) -> String {
    let mut out = String::with_capacity(branch.len());
    let mut in_class = false;
    let mut chars = branch.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if in_class => out.push(escaped),
                Some(escaped) => {
                    out.push_str(&Pattern::escape(escaped.encode_utf8(&mut [0; 4])));
                }
                None => out.push('\\'),
            },
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

impl<'de> Deserialize<'de> for GlobList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Vec::<String>::deserialize(deserializer)?;
        GlobList::new(raw).map_err(serde::de::Error::custom)
    }
}
