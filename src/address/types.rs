/// Address and pattern definitions with validation
///
/// Addresses are dot-separated hierarchies; patterns add the `#` subtree
/// wildcard (trailing only) and the `*` single-segment wildcard.

use std::fmt;
use std::str::FromStr;

/// Segment separator within addresses and patterns
pub const SEPARATOR: char = '.';

/// Wildcard matching the remainder of an address, including zero segments
pub const ANY_WORDS: &str = "#";

/// Wildcard matching exactly one segment
pub const SINGLE_WORD: &str = "*";

/// Result type for address parsing
pub type AddressResult<T> = Result<T, AddressError>;

/// Errors raised while parsing addresses or patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Empty address or pattern string
    EmptyAddress,
    /// A segment between separators is empty
    EmptySegment,
    /// Wildcard token used in a non-standalone or invalid position
    InvalidWildcard(String),
    /// Wildcard token found in a concrete address
    WildcardInAddress(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "Address cannot be empty"),
            Self::EmptySegment => write!(f, "Address segment cannot be empty"),
            Self::InvalidWildcard(msg) => write!(f, "Invalid wildcard usage: {}", msg),
            Self::WildcardInAddress(msg) => {
                write!(f, "Concrete address cannot contain wildcards: {}", msg)
            }
        }
    }
}

impl std::error::Error for AddressError {}

fn split_segments(s: &str) -> AddressResult<Vec<String>> {
    if s.is_empty() {
        return Err(AddressError::EmptyAddress);
    }

    let segments: Vec<String> = s.split(SEPARATOR).map(|seg| seg.to_string()).collect();

    for segment in &segments {
        if segment.is_empty() {
            return Err(AddressError::EmptySegment);
        }
    }

    Ok(segments)
}

/// A concrete hierarchical routing key
///
/// Addresses never contain wildcard tokens; they are the strings messages
/// are sent to or consumed from (e.g. `jms.queue.orders`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Original address string
    raw: String,
    /// Parsed segments
    segments: Vec<String>,
}

impl Address {
    /// Parse a concrete address
    ///
    /// # Errors
    ///
    /// Returns an error for empty strings, empty segments, or any wildcard
    /// token appearing in the string.
    pub fn new(s: &str) -> AddressResult<Self> {
        let segments = split_segments(s)?;

        for segment in &segments {
            if segment.contains('*') || segment.contains('#') {
                return Err(AddressError::WildcardInAddress(format!(
                    "'{}' in '{}'",
                    segment, s
                )));
            }
        }

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }

    /// Returns the segments of this address
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the raw address string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the depth of this address (number of segments)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// An address specification binding roles to a range of addresses
///
/// A pattern is a dot-separated hierarchy where:
/// - a plain segment matches itself,
/// - `*` matches exactly one segment in its position,
/// - a trailing `#` matches the rest of the address, including nothing
///   (`orders.#` matches both `orders` and `orders.widgets.eu`).
///
/// Exact addresses are valid patterns matching only themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressPattern {
    /// Original pattern string
    raw: String,
    /// Parsed segments
    segments: Vec<String>,
    /// Whether this pattern contains wildcard tokens
    has_wildcards: bool,
}

impl AddressPattern {
    /// Parse a pattern
    ///
    /// # Errors
    ///
    /// Returns an error for empty strings, empty segments, wildcard tokens
    /// embedded inside a segment, or `#` anywhere but the final segment.
    pub fn new(s: &str) -> AddressResult<Self> {
        let segments = split_segments(s)?;

        for (idx, segment) in segments.iter().enumerate() {
            let embedded = (segment.contains('*') || segment.contains('#'))
                && segment != SINGLE_WORD
                && segment != ANY_WORDS;
            if embedded {
                return Err(AddressError::InvalidWildcard(format!(
                    "Wildcards must be standalone segments: '{}'",
                    segment
                )));
            }

            if segment == ANY_WORDS && idx < segments.len() - 1 {
                return Err(AddressError::InvalidWildcard(
                    "'#' can only appear as the final segment".to_string(),
                ));
            }
        }

        let has_wildcards = segments
            .iter()
            .any(|seg| seg == SINGLE_WORD || seg == ANY_WORDS);

        Ok(Self {
            raw: s.to_string(),
            segments,
            has_wildcards,
        })
    }

    /// Returns the segments of this pattern
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the raw pattern string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this pattern contains wildcard tokens
    pub fn has_wildcards(&self) -> bool {
        self.has_wildcards
    }

    /// Whether this pattern matches only one concrete address
    pub fn is_exact(&self) -> bool {
        !self.has_wildcards
    }

    /// Checks whether this pattern matches a concrete address
    pub fn matches(&self, address: &Address) -> bool {
        let pattern = &self.segments;
        let target = address.segments();

        if let Some(last) = pattern.last() {
            if last == ANY_WORDS {
                return Self::matches_prefix(&pattern[..pattern.len() - 1], target);
            }
        }

        if pattern.len() != target.len() {
            return false;
        }

        pattern
            .iter()
            .zip(target.iter())
            .all(|(pat, seg)| pat == SINGLE_WORD || pat == seg)
    }

    fn matches_prefix(prefix: &[String], target: &[String]) -> bool {
        if prefix.len() > target.len() {
            return false;
        }

        prefix
            .iter()
            .zip(target.iter())
            .all(|(pat, seg)| pat == SINGLE_WORD || pat == seg)
    }
}

impl FromStr for AddressPattern {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
