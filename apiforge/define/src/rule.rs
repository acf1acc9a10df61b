//! Validation rules attached to properties, parameters and types.
//!
//! Rules are declarative constraints. The generator turns them into
//! predicates; the [`Display`](std::fmt::Display) rendering is what ends up in
//! validation error messages, so it reads as a sentence fragment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A declarative constraint on a value.
///
/// ## Examples
///
/// ```
/// use apiforge_define::Rule;
///
/// assert_eq!(Rule::range(Some(1.0), Some(10.0)).to_string(), "between 1 and 10");
/// assert_eq!(Rule::NonEmpty.to_string(), "not empty");
///
/// let rule: Rule = serde_json::from_str(r#"{"rule":"length","max":32}"#).unwrap();
/// assert_eq!(rule, Rule::Length { min: None, max: Some(32) });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Inclusive numeric bounds.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Inclusive bounds on string length (in characters) or list length.
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    /// String or list must not be empty.
    NonEmpty,
    /// String must match the regular expression.
    Pattern { pattern: String },
    /// Scalar must equal one of the listed values (compared by text).
    OneOf { values: Vec<String> },
    /// Every nested rule must hold.
    All { rules: Vec<Rule> },
}

impl Rule {
    /// Creates a numeric range rule.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Rule::Range { min, max }
    }

    /// Creates a length rule.
    pub fn length(min: Option<usize>, max: Option<usize>) -> Self {
        Rule::Length { min, max }
    }

    /// Creates a pattern rule.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Rule::Pattern {
            pattern: pattern.into(),
        }
    }

    /// Creates an enumeration rule.
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::OneOf {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Combines an explicitly attached rule with the rule carried on a type.
    ///
    /// Both apply when both exist; the attached rule is checked first.
    ///
    /// ```
    /// use apiforge_define::Rule;
    ///
    /// let own = Rule::NonEmpty;
    /// let carried = Rule::length(None, Some(8));
    /// assert_eq!(
    ///     Rule::combine(Some(&own), Some(&carried)),
    ///     Some(Rule::All { rules: vec![own.clone(), carried.clone()] })
    /// );
    /// assert_eq!(Rule::combine(None, Some(&carried)), Some(carried));
    /// assert_eq!(Rule::combine(None, None), None);
    /// ```
    pub fn combine(attached: Option<&Rule>, carried: Option<&Rule>) -> Option<Rule> {
        match (attached, carried) {
            (Some(a), Some(c)) => Some(Rule::All {
                rules: vec![a.clone(), c.clone()],
            }),
            (Some(r), None) | (None, Some(r)) => Some(r.clone()),
            (None, None) => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Range { min, max } => bounds(f, "", *min, *max),
            Rule::Length { min, max } => bounds(f, "length ", *min, *max),
            Rule::NonEmpty => write!(f, "not empty"),
            Rule::Pattern { pattern } => write!(f, "matches `{pattern}`"),
            Rule::OneOf { values } => write!(f, "one of [{}]", values.join(", ")),
            Rule::All { rules } => {
                let parts: Vec<String> = rules.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" and "))
            }
        }
    }
}

fn bounds<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    min: Option<T>,
    max: Option<T>,
) -> fmt::Result {
    match (min, max) {
        (Some(min), Some(max)) => write!(f, "{prefix}between {min} and {max}"),
        (Some(min), None) => write!(f, "{prefix}at least {min}"),
        (None, Some(max)) => write!(f, "{prefix}at most {max}"),
        (None, None) => write!(f, "{prefix}unbounded"),
    }
}
