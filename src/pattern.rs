//! Regular-expression patterns carried as data.
//!
//! A [`Pattern`] keeps the source text and the flag set of a pattern so it can
//! be written into an envelope (`{"r": source, "f": flags, "#": "RegExp"}`)
//! and rebuilt on the other side. The flag string is canonical: flags are
//! always rendered in `g`, `i`, `u`, `m`, `y` order, whatever order they were
//! given in.

use crate::{Error, Result};
use std::fmt;

/// Source text used when a pattern is created from an empty string.
pub const EMPTY_SOURCE: &str = "(?:)";

/// The flag set of a [`Pattern`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub struct PatternFlags {
    pub global: bool,
    pub ignore_case: bool,
    pub unicode: bool,
    pub multiline: bool,
    pub sticky: bool,
}

impl PatternFlags {
    /// Parses a flag string. Each of `g`, `i`, `u`, `m`, `y` may appear at
    /// most once, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for unknown or repeated flags.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_proto::PatternFlags;
    ///
    /// let flags = PatternFlags::parse("mig").unwrap();
    /// assert_eq!(flags.to_string(), "gim");
    /// assert!(PatternFlags::parse("gg").is_err());
    /// assert!(PatternFlags::parse("x").is_err());
    /// ```
    pub fn parse(flags: &str) -> Result<Self> {
        let mut parsed = PatternFlags::default();
        for c in flags.chars() {
            let slot = match c {
                'g' => &mut parsed.global,
                'i' => &mut parsed.ignore_case,
                'u' => &mut parsed.unicode,
                'm' => &mut parsed.multiline,
                'y' => &mut parsed.sticky,
                other => {
                    return Err(Error::invalid_pattern(format!(
                        "unknown flag '{}' in \"{}\"",
                        other, flags
                    )))
                }
            };
            if *slot {
                return Err(Error::invalid_pattern(format!(
                    "duplicate flag '{}' in \"{}\"",
                    c, flags
                )));
            }
            *slot = true;
        }
        Ok(parsed)
    }
}

impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (set, c) in [
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.unicode, 'u'),
            (self.multiline, 'm'),
            (self.sticky, 'y'),
        ] {
            if set {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

/// A regular-expression pattern: source text plus flags.
///
/// # Examples
///
/// ```rust
/// use serde_proto::Pattern;
///
/// let pattern = Pattern::new("d[0-9]+", "yig").unwrap();
/// assert_eq!(pattern.source(), "d[0-9]+");
/// assert_eq!(pattern.flags_string(), "giy");
/// assert_eq!(pattern.to_string(), "/d[0-9]+/giy");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    source: String,
    flags: PatternFlags,
}

impl Pattern {
    /// Creates a pattern from source text and a flag string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the flag string is malformed.
    pub fn new(source: impl Into<String>, flags: &str) -> Result<Self> {
        Ok(Pattern::with_flags(source, PatternFlags::parse(flags)?))
    }

    #[must_use]
    pub fn with_flags(source: impl Into<String>, flags: PatternFlags) -> Self {
        let mut source = source.into();
        if source.is_empty() {
            source = EMPTY_SOURCE.to_string();
        }
        Pattern { source, flags }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    /// The canonical flag string, in `g`, `i`, `u`, `m`, `y` order.
    #[must_use]
    pub fn flags_string(&self) -> String {
        self.flags.to_string()
    }

    /// Compiles the pattern with the `regex` engine.
    ///
    /// Only `i` and `m` change matching behavior there; `g`, `u` and `y` are
    /// iteration and encoding concerns of the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the source does not compile.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_proto::Pattern;
    ///
    /// let re = Pattern::new("^abc$", "im").unwrap().to_regex().unwrap();
    /// assert!(re.is_match("x\nABC\ny"));
    /// ```
    pub fn to_regex(&self) -> Result<regex::Regex> {
        regex::RegexBuilder::new(&self.source)
            .case_insensitive(self.flags.ignore_case)
            .multi_line(self.flags.multiline)
            .build()
            .map_err(Error::invalid_pattern)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_flags_canonical_order() {
        let flags = PatternFlags::parse("ymuig").unwrap();
        assert_eq!(flags.to_string(), "giumy");
    }

    #[test]
    fn test_no_flags() {
        let pattern = Pattern::new("abc", "").unwrap();
        assert_eq!(pattern.flags(), PatternFlags::default());
        assert_eq!(pattern.flags_string(), "");
    }

    #[test]
    fn test_empty_source_normalized() {
        let pattern = Pattern::new("", "g").unwrap();
        assert_eq!(pattern.source(), EMPTY_SOURCE);
    }

    #[test]
    fn test_rejects_unsupported_flag() {
        let err = Pattern::new("a", "gs").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern(_)));
    }

    #[test]
    fn test_to_regex_rejects_bad_source() {
        let pattern = Pattern::new("(unclosed", "").unwrap();
        assert!(pattern.to_regex().is_err());
    }

    #[test]
    fn test_to_regex_case_insensitive() {
        let re = Pattern::new("hello", "i").unwrap().to_regex().unwrap();
        assert!(re.is_match("HeLLo"));
    }
}
