//! Configuration options for the codec.
//!
//! - whether dates carry the reserved `"Date"` tag
//! - whether patterns carry the reserved `"RegExp"` tag
//! - JSON layout (compact or pretty, indent width)
//!
//! ## Examples
//!
//! ```rust
//! use serde_proto::{Codec, CodecOptions};
//!
//! // Dates stay RFC 3339 strings, patterns are still tagged
//! let options = CodecOptions::new().with_dates(false);
//! let codec = Codec::new(options);
//!
//! // Pretty-printed output with 4-space indentation
//! let options = CodecOptions::new().with_pretty(true).with_indent(4);
//! ```

/// Configuration options for packing and JSON rendering.
///
/// # Examples
///
/// ```rust
/// use serde_proto::CodecOptions;
///
/// let options = CodecOptions::default();
/// assert!(options.tag_dates);
/// assert!(options.tag_patterns);
///
/// let options = CodecOptions::plain();
/// assert!(!options.tag_dates);
/// assert!(!options.tag_patterns);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    pub tag_dates: bool,
    pub tag_patterns: bool,
    pub pretty: bool,
    pub indent: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            tag_dates: true,
            tag_patterns: true,
            pretty: false,
            indent: 2,
        }
    }
}

impl CodecOptions {
    /// Creates default options: dates and patterns tagged, compact JSON.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with no built-in tagging: only user prototypes and special
    /// numbers are encoded.
    #[must_use]
    pub fn plain() -> Self {
        CodecOptions {
            tag_dates: false,
            tag_patterns: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_dates(mut self, tag_dates: bool) -> Self {
        self.tag_dates = tag_dates;
        self
    }

    #[must_use]
    pub fn with_patterns(mut self, tag_patterns: bool) -> Self {
        self.tag_patterns = tag_patterns;
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Sets the indentation size used for pretty output. Default is 2.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}
