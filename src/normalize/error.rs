//! Error types for deep immutability normalization.
//!
//! Mutating a frozen container has no error type: the mutators only exist
//! on the transient working copies, so such a call does not compile.

use std::fmt;

use thiserror::Error;

/// One step from a composite value to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An element of a sequence, by index.
    Index(usize),
    /// The value of a map entry, by the debug rendering of its key.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(formatter, "[{index}]"),
            Self::Key(key) => write!(formatter, "[{key}]"),
        }
    }
}

/// The location of a value inside the tree being normalized.
///
/// Rendered as `$` for the root followed by one bracketed segment per step,
/// for example `$["servers"][2]`.
///
/// # Examples
///
/// ```rust
/// use safekit::normalize::{PathSegment, ValuePath};
///
/// let path = ValuePath::from(vec![
///     PathSegment::Key("\"servers\"".to_string()),
///     PathSegment::Index(2),
/// ]);
/// assert_eq!(path.to_string(), r#"$["servers"][2]"#);
/// assert_eq!(ValuePath::root().to_string(), "$");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValuePath {
    segments: Vec<PathSegment>,
}

impl ValuePath {
    /// Returns the path of the root value.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Returns `true` if this is the path of the root value.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the steps from the root, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the nesting depth (the number of steps).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl From<Vec<PathSegment>> for ValuePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "$")?;
        for segment in &self.segments {
            write!(formatter, "{segment}")?;
        }
        Ok(())
    }
}

/// A leaf that has no way to be copied into an immutable form.
///
/// Raised by the normalizer under [`NonCopyablePolicy::Fail`](super::NonCopyablePolicy::Fail).
///
/// # Examples
///
/// ```rust
/// use safekit::normalize::{NonCopyableValueError, ValuePath};
///
/// let error = NonCopyableValueError::new(ValuePath::root(), "Socket", "Socket(80)");
/// assert_eq!(
///     error.to_string(),
///     "value at $ of type `Socket` cannot be copied into an immutable form: Socket(80)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value at {path} of type `{type_name}` cannot be copied into an immutable form: {value}")]
pub struct NonCopyableValueError {
    /// Where the value sits in the tree.
    pub path: ValuePath,
    /// The Rust type name of the leaf.
    pub type_name: &'static str,
    /// The debug rendering of the leaf.
    pub value: String,
}

impl NonCopyableValueError {
    /// Creates a new `NonCopyableValueError`.
    #[must_use]
    pub fn new(path: ValuePath, type_name: &'static str, value: impl Into<String>) -> Self {
        Self {
            path,
            type_name,
            value: value.into(),
        }
    }
}

/// Errors that abort a normalization.
///
/// A failed normalization returns no partial result; every container built
/// so far is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A leaf could not be copied and the policy is
    /// [`Fail`](super::NonCopyablePolicy::Fail).
    #[error(transparent)]
    NonCopyable(#[from] NonCopyableValueError),

    /// The value nests deeper than the configured limit.
    #[error("value nesting exceeds the depth limit of {limit} at {path}")]
    DepthLimitExceeded {
        /// The configured maximum depth.
        limit: usize,
        /// The first value found beyond the limit.
        path: ValuePath,
    },
}

impl NormalizeError {
    /// Returns the path of the value that caused the error.
    #[must_use]
    pub const fn path(&self) -> &ValuePath {
        match self {
            Self::NonCopyable(error) => &error.path,
            Self::DepthLimitExceeded { path, .. } => path,
        }
    }
}
