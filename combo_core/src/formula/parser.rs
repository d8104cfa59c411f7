//! Formula parsing and validation
//!
//! Turns a raw combination formula string ("1.2DL + 1.6LL") into validated
//! load terms, or rejects it with a precise reason.
//!
//! The grammar is a flat sum of signed terms:
//!
//! ```text
//! formula := TERM (SIGN TERM)*
//! TERM    := [SIGN] DIGITS ['.' DIGITS] ['*'] CODE
//! CODE    := 2-3 uppercase ASCII letters
//! ```
//!
//! Parsing is a single forward scan with no backtracking, so pathological
//! inputs (repeated-alternation sequences, 10k-character strings) complete
//! in linear time.
//!
//! # Example
//! ```
//! use combo_core::formula::{Formula, LoadCode};
//!
//! let formula = Formula::parse("1.2DL + 1.6LL").unwrap();
//! assert_eq!(formula.factor(LoadCode::Dl), Some(1.2));
//! assert_eq!(formula.factor(LoadCode::Ll), Some(1.6));
//!
//! assert!(Formula::parse("1.2DL +").is_err());     // trailing operator
//! assert!(Formula::parse("-1.2DL").is_err());      // negative factor
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::load_codes::{LoadCode, LoadCodeSet};
use crate::errors::{ComboError, ComboResult, FormulaErrorKind};

/// Configuration for formula validation.
///
/// The source system carried two divergent validators; this unifies them
/// into one with an explicit configuration. The default matches the
/// stricter rule set: negative factors rejected, factors capped at 1000,
/// all eight load codes accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Accept negative effective factors (e.g. "1.0DL - 0.6WL")
    pub allow_negative_factors: bool,
    /// Largest accepted factor magnitude
    pub max_factor: f64,
    /// Which load codes are valid
    pub codes: LoadCodeSet,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            allow_negative_factors: false,
            max_factor: 1000.0,
            codes: LoadCodeSet::Standard,
        }
    }
}

impl ValidationOptions {
    /// The older six-code validation path (no TL/CL)
    pub fn legacy() -> Self {
        ValidationOptions {
            codes: LoadCodeSet::Legacy,
            ..ValidationOptions::default()
        }
    }
}

/// A single factored load term within a formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadTerm {
    /// Load code the factor applies to
    pub code: LoadCode,
    /// Signed numeric multiplier
    pub factor: f64,
}

/// A validated load-combination formula.
///
/// Immutable once parsed. Terms keep their textual order; [`Formula::factors`]
/// collapses them into a map where the last occurrence of a repeated code
/// wins (map-assignment semantics, duplicates are never summed).
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    terms: Vec<LoadTerm>,
}

impl Formula {
    /// Parse and validate with the default options
    pub fn parse(input: &str) -> ComboResult<Formula> {
        Formula::parse_with(input, &ValidationOptions::default())
    }

    /// Parse and validate with explicit options
    pub fn parse_with(input: &str, options: &ValidationOptions) -> ComboResult<Formula> {
        let terms = Parser::new(input, options).run()?;
        Ok(Formula {
            source: input.trim().to_string(),
            terms,
        })
    }

    /// The normalized (trimmed) source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Terms in textual order, duplicates included
    pub fn terms(&self) -> &[LoadTerm] {
        &self.terms
    }

    /// Factors keyed by load code; last occurrence wins for repeated codes
    pub fn factors(&self) -> HashMap<LoadCode, f64> {
        let mut map = HashMap::new();
        for term in &self.terms {
            map.insert(term.code, term.factor);
        }
        map
    }

    /// The effective factor for a code (last occurrence), if present
    pub fn factor(&self, code: LoadCode) -> Option<f64> {
        self.terms
            .iter()
            .rev()
            .find(|t| t.code == code)
            .map(|t| t.factor)
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Validate a formula without keeping the parse result
pub fn validate_formula(input: &str) -> ComboResult<()> {
    Formula::parse(input).map(|_| ())
}

/// Single-pass scanner over the formula text
struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
    options: &'a ValidationOptions,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, options: &'a ValidationOptions) -> Self {
        Parser {
            input,
            chars: input.chars().collect(),
            pos: 0,
            options,
        }
    }

    fn run(mut self) -> ComboResult<Vec<LoadTerm>> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            return Err(self.fail(FormulaErrorKind::Empty, "Formula is empty"));
        }
        if let Some(last) = trimmed.chars().last() {
            if matches!(last, '+' | '-' | '*') {
                return Err(self.fail(
                    FormulaErrorKind::Incomplete,
                    "Formula ends with an operator",
                ));
            }
        }

        let mut terms: Vec<LoadTerm> = Vec::new();
        loop {
            self.skip_ws();
            if self.at_end() {
                break;
            }
            let sign = if terms.is_empty() {
                self.leading_sign()?
            } else {
                self.separator_sign()?
            };
            let term = self.term(sign, terms.is_empty())?;
            terms.push(term);
        }

        if terms.is_empty() {
            return Err(self.fail(FormulaErrorKind::NoTerms, "No valid load factors found"));
        }
        Ok(terms)
    }

    /// An optional explicit sign on the first term. A sign here must be
    /// immediately followed by a digit; "+ 1.2DL" is a dangling operator.
    fn leading_sign(&mut self) -> ComboResult<f64> {
        match self.peek() {
            Some(c @ ('+' | '-')) => {
                let next_is_digit = self
                    .chars
                    .get(self.pos + 1)
                    .is_some_and(|n| n.is_ascii_digit());
                if !next_is_digit {
                    return Err(self.fail(
                        FormulaErrorKind::Incomplete,
                        "Formula starts with a dangling operator",
                    ));
                }
                self.pos += 1;
                Ok(if c == '-' { -1.0 } else { 1.0 })
            }
            _ => Ok(1.0),
        }
    }

    /// The operator(s) separating two terms: at least one sign required,
    /// two tolerated ("+-" reads as explicit-negative-after-plus), three
    /// or more rejected.
    fn separator_sign(&mut self) -> ComboResult<f64> {
        let mut count = 0usize;
        let mut sign = 1.0;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('+') => {
                    count += 1;
                    self.pos += 1;
                }
                Some('-') => {
                    count += 1;
                    sign = -sign;
                    self.pos += 1;
                }
                _ => break,
            }
            if count >= 3 {
                return Err(self.fail(
                    FormulaErrorKind::RepeatedOperator,
                    "Too many consecutive operators",
                ));
            }
        }
        if count == 0 {
            // a digit or letter here is two terms run together; anything
            // else is a stray token
            return Err(match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() => self.fail(
                    FormulaErrorKind::MissingOperator,
                    "Missing operator between load terms",
                ),
                Some(c) => self.fail(
                    FormulaErrorKind::InvalidSyntax,
                    format!("Unexpected character '{c}' in formula"),
                ),
                None => self.fail(
                    FormulaErrorKind::Incomplete,
                    "Formula ends with an operator",
                ),
            });
        }
        Ok(sign)
    }

    /// One `factor [*] CODE` term
    fn term(&mut self, sign: f64, first: bool) -> ComboResult<LoadTerm> {
        self.skip_ws();

        // factor digits
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected_at_factor(first));
        }
        // optional decimal part; a bare trailing '.' is not part of a number
        if self.peek() == Some('.') {
            let after_dot_is_digit = self
                .chars
                .get(self.pos + 1)
                .is_some_and(|n| n.is_ascii_digit());
            if !after_dot_is_digit {
                return Err(self.fail(
                    FormulaErrorKind::InvalidSyntax,
                    "Malformed load factor",
                ));
            }
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        // the scanner only admits `digits[.digits]`, which always parses
        let magnitude: f64 = digits.parse().map_err(|_| {
            self.fail(FormulaErrorKind::InvalidSyntax, "Malformed load factor")
        })?;

        // optional '*' with surrounding whitespace
        self.skip_ws();
        if self.peek() == Some('*') {
            self.pos += 1;
            self.skip_ws();
        }

        // load code: run of uppercase ASCII letters
        let code_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
            self.pos += 1;
        }
        let run: String = self.chars[code_start..self.pos].iter().collect();
        if run.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.fail(
                    FormulaErrorKind::InvalidSyntax,
                    format!("Unexpected character '{c}' after load factor"),
                ),
                None => self.fail(
                    FormulaErrorKind::InvalidSyntax,
                    "Load factor without a load code",
                ),
            });
        }
        if run.len() > 3 {
            return Err(self.fail(
                FormulaErrorKind::MissingOperator,
                format!("Missing operator between load terms near '{run}'"),
            ));
        }
        let code = LoadCode::from_code(&run).ok_or_else(|| {
            self.fail(
                FormulaErrorKind::UnknownLoadCode,
                format!("Invalid load type: {run}"),
            )
        })?;
        if !self.options.codes.contains(code) {
            return Err(self.fail(
                FormulaErrorKind::UnknownLoadCode,
                format!("Invalid load type: {run}"),
            ));
        }

        // engineering-sanity range check on the effective factor
        let factor = sign * magnitude;
        if factor < 0.0 && !self.options.allow_negative_factors {
            return Err(self.fail(
                FormulaErrorKind::NegativeFactor,
                format!("Negative load factor: {factor}"),
            ));
        }
        if magnitude > self.options.max_factor {
            return Err(self.fail(
                FormulaErrorKind::FactorTooLarge,
                format!(
                    "Load factor {} exceeds maximum {}",
                    magnitude, self.options.max_factor
                ),
            ));
        }

        Ok(LoadTerm { code, factor })
    }

    /// Error for a non-digit where a factor was expected. Before the first
    /// term this means no recognizable term exists at all.
    fn unexpected_at_factor(&self, first: bool) -> ComboError {
        if first {
            return self.fail(FormulaErrorKind::NoTerms, "No valid load factors found");
        }
        match self.peek() {
            Some(c) => self.fail(
                FormulaErrorKind::InvalidSyntax,
                format!("Expected a load factor, found '{c}'"),
            ),
            None => self.fail(FormulaErrorKind::Incomplete, "Formula ends with an operator"),
        }
    }

    fn fail(&self, kind: FormulaErrorKind, reason: impl Into<String>) -> ComboError {
        ComboError::formula(self.input.trim(), kind, reason)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(input: &str) -> FormulaErrorKind {
        match Formula::parse(input) {
            Err(e) => e.formula_kind().expect("expected formula error"),
            Ok(_) => panic!("formula '{input}' unexpectedly valid"),
        }
    }

    #[test]
    fn test_basic_formula() {
        let f = Formula::parse("1.2DL + 1.6LL").unwrap();
        assert_eq!(f.terms().len(), 2);
        assert_eq!(f.factor(LoadCode::Dl), Some(1.2));
        assert_eq!(f.factor(LoadCode::Ll), Some(1.6));
        assert_eq!(f.factor(LoadCode::Wl), None);
    }

    #[test]
    fn test_valid_formula_corpus() {
        let valid = [
            "1.2DL + 1.6LL",
            "1.0DL + 0.5LL + 1.0WL",
            "0.9DL + 1.0EQ",
            "1.2*DL + 1.6*LL",
            "1.35DL + 1.5LL + 0.9WL",
            "1.2DL + 1.0LL + 1.0WL + 0.5SL",
            "1.2DL + 1.0EQ + 1.0LL + 0.2SL",
            "1.4DL",
            "+1.4DL",
            "1.2 * DL + 1.6 LL",
        ];
        for formula in valid {
            assert!(
                Formula::parse(formula).is_ok(),
                "'{formula}' should be valid"
            );
        }
    }

    #[test]
    fn test_accepted_factors_in_range() {
        let valid = ["1.2DL + 1.6LL", "1000.0DL", "0DL + 1LL", "1.2*DL + 1.6*LL"];
        for formula in valid {
            let parsed = Formula::parse(formula).unwrap();
            let factors = parsed.factors();
            assert!(!factors.is_empty());
            for (_, factor) in factors {
                assert!((0.0..=1000.0).contains(&factor));
            }
        }
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(kind_of(""), FormulaErrorKind::Empty);
        assert_eq!(kind_of("   "), FormulaErrorKind::Empty);
    }

    #[test]
    fn test_trailing_operator() {
        assert_eq!(kind_of("1.2DL +"), FormulaErrorKind::Incomplete);
        assert_eq!(kind_of("1.2DL -"), FormulaErrorKind::Incomplete);
        assert_eq!(kind_of("1.2DL *"), FormulaErrorKind::Incomplete);
        assert_eq!(kind_of("1.2DL + 1.6LL +"), FormulaErrorKind::Incomplete);
    }

    #[test]
    fn test_dangling_leading_operator() {
        assert_eq!(kind_of("+ 1.2DL"), FormulaErrorKind::Incomplete);
        assert_eq!(kind_of("+DL"), FormulaErrorKind::Incomplete);
    }

    #[test]
    fn test_missing_factors() {
        assert_eq!(kind_of("DL + LL"), FormulaErrorKind::NoTerms);
        assert_eq!(kind_of("abc + def"), FormulaErrorKind::NoTerms);
    }

    #[test]
    fn test_missing_operator_between_terms() {
        assert_eq!(kind_of("1.2DL 1.6LL"), FormulaErrorKind::MissingOperator);
        assert_eq!(kind_of("1.2DL1.6LL"), FormulaErrorKind::MissingOperator);
        assert_eq!(kind_of("1.2DLLL"), FormulaErrorKind::MissingOperator);
    }

    #[test]
    fn test_operator_runs() {
        // two consecutive signs are tolerated; the pair multiplies through
        let f = Formula::parse("1.2DL ++ 1.6LL").unwrap();
        assert_eq!(f.factor(LoadCode::Ll), Some(1.6));
        // "+-" yields a negative factor, rejected by the range rule
        assert_eq!(kind_of("1.2DL +- 1.6LL"), FormulaErrorKind::NegativeFactor);
        // three or more signs are a syntax error
        assert_eq!(kind_of("1.2DL +++ 1.6LL"), FormulaErrorKind::RepeatedOperator);
        assert_eq!(kind_of("1.2DL --- 1.6LL"), FormulaErrorKind::RepeatedOperator);
    }

    #[test]
    fn test_factor_boundaries() {
        assert!(Formula::parse("1000.0DL").is_ok());
        assert_eq!(kind_of("1000.1DL"), FormulaErrorKind::FactorTooLarge);
        assert!(Formula::parse("0DL + 1LL").is_ok());
        assert_eq!(kind_of("-1.2DL + 1.6LL"), FormulaErrorKind::NegativeFactor);
    }

    #[test]
    fn test_negative_allowed_when_configured() {
        let options = ValidationOptions {
            allow_negative_factors: true,
            ..ValidationOptions::default()
        };
        let f = Formula::parse_with("1.0DL - 0.6WL", &options).unwrap();
        assert_eq!(f.factor(LoadCode::Wl), Some(-0.6));
        // magnitude cap still applies
        assert!(Formula::parse_with("-1000.1DL", &options).is_err());
    }

    #[test]
    fn test_unknown_load_type() {
        assert_eq!(kind_of("1.2XL + 1.6LL"), FormulaErrorKind::UnknownLoadCode);
        assert_eq!(kind_of("1.0D + 1.0LL"), FormulaErrorKind::UnknownLoadCode);
    }

    #[test]
    fn test_legacy_code_set() {
        assert!(Formula::parse("1.0TL + 1.0CL").is_ok());
        let legacy = ValidationOptions::legacy();
        let err = Formula::parse_with("1.0TL", &legacy).unwrap_err();
        assert_eq!(err.formula_kind(), Some(FormulaErrorKind::UnknownLoadCode));
        assert!(Formula::parse_with("1.2DL + 1.6LL", &legacy).is_ok());
    }

    #[test]
    fn test_lowercase_rejected() {
        assert_eq!(kind_of("1.2dl + 1.6LL"), FormulaErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_scientific_notation_rejected() {
        assert_eq!(kind_of("1e2DL"), FormulaErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_stray_characters() {
        assert_eq!(kind_of("1.2DL + 1.6LL !"), FormulaErrorKind::InvalidSyntax);
        assert_eq!(kind_of("1.2 + 1.6LL"), FormulaErrorKind::InvalidSyntax);
        assert_eq!(kind_of("1.2DL & 1.6LL"), FormulaErrorKind::InvalidSyntax);
        assert_eq!(kind_of("1.DL"), FormulaErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_duplicate_code_last_wins() {
        let f = Formula::parse("1.2DL + 1.6DL").unwrap();
        assert_eq!(f.terms().len(), 2);
        assert_eq!(f.factor(LoadCode::Dl), Some(1.6));
        assert_eq!(f.factors().len(), 1);
    }

    #[test]
    fn test_long_pathological_input() {
        // repeated-alternation style input around 10k characters must not
        // hang and must fail with a precise reason
        let mut formula = String::from("1.2DL");
        while formula.len() < 10_000 {
            formula.push_str(" + 1.6LL");
        }
        assert!(Formula::parse(&formula).is_ok());

        let mut bad = formula.clone();
        bad.push_str(" invalid");
        assert!(Formula::parse(&bad).is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let f = Formula::parse("  1.2DL + 1.6LL  ").unwrap();
        assert_eq!(f.to_string(), "1.2DL + 1.6LL");
    }
}
