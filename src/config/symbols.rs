//! Comparison and logical symbols accepted in rule text

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RuleError};

/// Comparison operators allowed inside a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Equal (=)
    Equal,
    /// Not equal (!=)
    NotEqual,
}

impl Comparator {
    /// Declaration order of the comparator set. The legacy syntax gate searches in this order.
    pub const ALL: [Comparator; 6] = [
        Comparator::Greater,
        Comparator::Less,
        Comparator::GreaterEqual,
        Comparator::LessEqual,
        Comparator::Equal,
        Comparator::NotEqual,
    ];

    /// Two-character symbols before their one-character prefixes
    pub const LONGEST_FIRST: [Comparator; 6] = [
        Comparator::GreaterEqual,
        Comparator::LessEqual,
        Comparator::NotEqual,
        Comparator::Greater,
        Comparator::Less,
        Comparator::Equal,
    ];

    /// Leftmost comparator in `text` and its byte offset; the longest symbol
    /// wins at a given offset, so `<=` is never read as `<` then `=`
    pub fn leftmost(text: &str) -> Option<(usize, Comparator)> {
        text.char_indices().find_map(|(i, _)| {
            let rest = &text[i..];
            Self::LONGEST_FIRST
                .into_iter()
                .find(|c| rest.starts_with(c.symbol()))
                .map(|c| (i, c))
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::GreaterEqual => ">=",
            Comparator::LessEqual => "<=",
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Exact whole-token match; `>=` never resolves to `>`
impl FromStr for Comparator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ">" => Ok(Comparator::Greater),
            "<" => Ok(Comparator::Less),
            ">=" => Ok(Comparator::GreaterEqual),
            "<=" => Ok(Comparator::LessEqual),
            "=" => Ok(Comparator::Equal),
            "!=" => Ok(Comparator::NotEqual),
            other => Err(RuleError::InvalidOperator(other.to_string())),
        }
    }
}

/// Logical connective joining two sub-expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connective {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Connective {
    /// Scan order used when looking for a split point
    pub const ALL: [Connective; 2] = [Connective::And, Connective::Or];

    pub fn keyword(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }

    /// The keyword with its surrounding single spaces, as it appears between operands
    pub fn infix(self) -> &'static str {
        match self {
            Connective::And => " AND ",
            Connective::Or => " OR ",
        }
    }

    /// Boolean meaning of the connective
    #[inline]
    pub fn apply(self, left: bool, right: impl FnOnce() -> bool) -> bool {
        match self {
            Connective::And => left && right(),
            Connective::Or => left || right(),
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Connective {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AND" => Ok(Connective::And),
            "OR" => Ok(Connective::Or),
            other => Err(RuleError::InvalidOperator(other.to_string())),
        }
    }
}
