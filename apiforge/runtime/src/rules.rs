//! Predicate helpers called by generated validation code.
//!
//! Each helper takes the value by reference and returns whether the rule
//! holds. Patterns were checked when the code was generated; they are
//! compiled once here and cached for the life of the process.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{LazyLock, Mutex};

use regex::Regex;

static PATTERNS: LazyLock<Mutex<HashMap<String, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Values a numeric range can be checked against.
pub trait Numeric {
    /// The value as a float.
    fn as_f64(&self) -> f64;
}

impl Numeric for i64 {
    fn as_f64(&self) -> f64 {
        *self as f64
    }
}

impl Numeric for f64 {
    fn as_f64(&self) -> f64 {
        *self
    }
}

/// Values with a length: strings count characters, lists count elements.
pub trait Measured {
    /// Number of characters or elements.
    fn measure(&self) -> usize;
}

impl Measured for str {
    fn measure(&self) -> usize {
        self.chars().count()
    }
}

impl Measured for String {
    fn measure(&self) -> usize {
        self.as_str().measure()
    }
}

impl<T> Measured for Vec<T> {
    fn measure(&self) -> usize {
        self.len()
    }
}

/// Inclusive numeric bounds.
///
/// ```
/// use apiforge_runtime::rules::in_range;
///
/// assert!(in_range(&5i64, Some(1.0), Some(10.0)));
/// assert!(!in_range(&0.5f64, Some(1.0), None));
/// ```
pub fn in_range<N: Numeric + ?Sized>(value: &N, min: Option<f64>, max: Option<f64>) -> bool {
    let v = value.as_f64();
    min.is_none_or(|min| v >= min) && max.is_none_or(|max| v <= max)
}

/// Inclusive length bounds.
pub fn length<M: Measured + ?Sized>(value: &M, min: Option<usize>, max: Option<usize>) -> bool {
    let n = value.measure();
    min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max)
}

/// At least one character or element.
pub fn non_empty<M: Measured + ?Sized>(value: &M) -> bool {
    value.measure() > 0
}

/// Regex match anywhere in `value` (anchor the pattern for full matches).
///
/// ```
/// use apiforge_runtime::rules::matches;
///
/// assert!(matches("ABC", "^[A-Z]+$"));
/// assert!(!matches("abc", "^[A-Z]+$"));
/// ```
pub fn matches(value: &str, pattern: &str) -> bool {
    let mut cache = PATTERNS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(regex) = cache.get(pattern) {
        return regex.is_match(value);
    }
    match Regex::new(pattern) {
        Ok(regex) => {
            let matched = regex.is_match(value);
            cache.insert(pattern.to_string(), regex);
            matched
        }
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid validation pattern");
            false
        }
    }
}

/// Textual membership in `values`.
///
/// ```
/// use apiforge_runtime::rules::one_of;
///
/// assert!(one_of(&"sold".to_string(), &["available", "sold"]));
/// assert!(one_of(&2i64, &["1", "2"]));
/// ```
pub fn one_of<S: Display + ?Sized>(value: &S, values: &[&str]) -> bool {
    let text = value.to_string();
    values.iter().any(|v| *v == text)
}
