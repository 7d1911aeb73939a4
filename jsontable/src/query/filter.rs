//! `find_one_by` criteria.
//!
//! A criterion string is either a literal compared for equality, or
//! `text|MODE` where `MODE` is one of `START_BY`, `END_BY`, `CONTAINS` or
//! `EXACT`. The mode suffix only applies when `text` contains no digits;
//! otherwise the whole string, pipe included, is the literal.

use crate::error::{JsonTableError, Result};
use crate::schema::normalize_name;
use crate::value::Row;
use std::fmt;

pub const START_BY: &str = "START_BY";
pub const END_BY: &str = "END_BY";
pub const CONTAINS: &str = "CONTAINS";
pub const EXACT: &str = "EXACT";

const SEPARATOR: char = '|';

/// How a literal is compared against a stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Exact(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
}

impl Pattern {
    /// Parse a criterion string. Never fails: anything without a usable
    /// mode suffix is an exact literal.
    pub fn parse(raw: &str) -> Self {
        let Some((text, mode)) = raw.rsplit_once(SEPARATOR) else {
            return Pattern::Exact(raw.to_string());
        };
        if text.chars().any(|c| c.is_ascii_digit()) {
            return Pattern::Exact(raw.to_string());
        }

        let text = text.to_string();
        match mode {
            START_BY => Pattern::StartsWith(text),
            END_BY => Pattern::EndsWith(text),
            CONTAINS => Pattern::Contains(text),
            EXACT => Pattern::Exact(text),
            _ => Pattern::Exact(raw.to_string()),
        }
    }

    pub fn literal(&self) -> &str {
        match self {
            Pattern::Exact(s) | Pattern::StartsWith(s) | Pattern::EndsWith(s) | Pattern::Contains(s) => s,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Pattern::Exact(_) => EXACT,
            Pattern::StartsWith(_) => START_BY,
            Pattern::EndsWith(_) => END_BY,
            Pattern::Contains(_) => CONTAINS,
        }
    }

    /// Test `value` against the literal, upper-casing both unless case sensitive.
    pub fn is_match(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.compare(value, self.literal())
        } else {
            self.compare(&value.to_uppercase(), &self.literal().to_uppercase())
        }
    }

    fn compare(&self, value: &str, literal: &str) -> bool {
        match self {
            Pattern::Exact(_) => value == literal,
            Pattern::StartsWith(_) => value.starts_with(literal),
            Pattern::EndsWith(_) => value.ends_with(literal),
            Pattern::Contains(_) => value.contains(literal),
        }
    }
}

impl fmt::Display for Pattern {
    /// The criterion string form, e.g. `An|START_BY`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.literal(), self.mode())
    }
}

/// One column-match rule. Criteria combine with logical AND.
///
/// The column name is upper-cased on construction, the same way row keys are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriterion {
    column: String,
    pattern: Pattern,
    case_sensitive: bool,
}

impl FilterCriterion {
    pub fn new(column: &str, pattern: Pattern, case_sensitive: bool) -> Result<Self> {
        if column.trim().is_empty() {
            return Err(JsonTableError::InvalidArgument(
                "Criterion column cannot be empty".into(),
            ));
        }
        Ok(FilterCriterion {
            column: normalize_name(column),
            pattern,
            case_sensitive,
        })
    }

    /// Parse a criterion string such as `An|START_BY` for `column`.
    pub fn parse(column: &str, raw: &str, case_sensitive: bool) -> Result<Self> {
        Self::new(column, Pattern::parse(raw), case_sensitive)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Null, nested and missing cells never match.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .and_then(|value| value.as_text())
            .map(|text| self.pattern.is_match(&text, self.case_sensitive))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_modes() {
        assert_eq!(Pattern::parse("An|START_BY"), Pattern::StartsWith("An".into()));
        assert_eq!(Pattern::parse("an|END_BY"), Pattern::EndsWith("an".into()));
        assert_eq!(Pattern::parse("an|CONTAINS"), Pattern::Contains("an".into()));
        assert_eq!(Pattern::parse("Baker|EXACT"), Pattern::Exact("Baker".into()));
        assert_eq!(Pattern::parse("Stephanie"), Pattern::Exact("Stephanie".into()));
    }

    #[test]
    fn test_parse_literal_fallbacks() {
        // digits in the text disable the mode suffix
        assert_eq!(Pattern::parse("R2|START_BY"), Pattern::Exact("R2|START_BY".into()));
        // unknown or lower-case modes are literal text
        assert_eq!(Pattern::parse("An|BEGINS"), Pattern::Exact("An|BEGINS".into()));
        assert_eq!(Pattern::parse("An|start_by"), Pattern::Exact("An|start_by".into()));
        assert_eq!(Pattern::parse("|"), Pattern::Exact("|".into()));
    }

    #[test]
    fn test_pipe_inside_pattern() {
        let pattern = Pattern::parse("a|b|CONTAINS");
        assert_eq!(pattern, Pattern::Contains("a|b".into()));
        assert!(pattern.is_match("xa|by", true));
        assert!(!pattern.is_match("ab", true));
    }

    #[test]
    fn test_case_sensitivity() {
        let pattern = Pattern::parse("an|END_BY");
        assert!(pattern.is_match("Julian", true));
        assert!(!pattern.is_match("AndreAn", true));
        assert!(pattern.is_match("AndreAn", false));
    }

    #[test]
    fn test_display_round_trips() {
        let pattern = Pattern::StartsWith("An".into());
        assert_eq!(pattern.to_string(), "An|START_BY");
        assert_eq!(Pattern::parse(&pattern.to_string()), pattern);
    }

    #[test]
    fn test_criterion_matches_row() {
        let row = Row::from([
            ("FIRST_NAME".to_string(), Value::from("Andrea")),
            ("AGE".to_string(), Value::Int(21)),
            ("NOTE".to_string(), Value::Null),
        ]);

        assert!(FilterCriterion::parse("first_name", "An|START_BY", true).unwrap().matches(&row));
        assert!(FilterCriterion::parse("age", "21", true).unwrap().matches(&row));
        assert!(!FilterCriterion::parse("note", "null", true).unwrap().matches(&row));
        assert!(!FilterCriterion::parse("missing", "x", true).unwrap().matches(&row));
        assert!(FilterCriterion::parse("", "x", true).is_err());
    }

    #[test]
    fn test_criterion_column_is_normalized() {
        let criterion =
            FilterCriterion::new("first_name", Pattern::Contains("dre".into()), false).unwrap();
        assert_eq!(criterion.column(), "FIRST_NAME");
        assert_eq!(criterion.pattern().mode(), CONTAINS);
        assert!(!criterion.is_case_sensitive());

        let row = Row::from([("FIRST_NAME".to_string(), Value::from("ANDREA"))]);
        assert!(criterion.matches(&row));
    }
}
