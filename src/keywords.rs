// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Keyword filter expressions
//!
//! A [`KeywordExpression`] is a propositional sentence over photo keywords in
//! conjunctive normal form: a conjunction of clauses, each clause a
//! disjunction of possibly negated keyword symbols. An empty clause denotes
//! `true`, so the default expression accepts every photo.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A keyword symbol, possibly negated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub symbol: String,
    pub negated: bool,
}

impl Literal {
    pub fn new(symbol: impl Into<String>, negated: bool) -> Self {
        Self {
            symbol: symbol.into(),
            negated,
        }
    }

    /// Truth value of this literal for the given keyword set
    pub fn holds<K: KeywordSet + ?Sized>(&self, keywords: &K) -> bool {
        keywords.has_keyword(&self.symbol) != self.negated
    }
}

/// Anything that can answer "does this photo carry keyword X"
pub trait KeywordSet {
    fn has_keyword(&self, keyword: &str) -> bool;
}

impl KeywordSet for BTreeSet<String> {
    fn has_keyword(&self, keyword: &str) -> bool {
        self.contains(keyword)
    }
}

impl KeywordSet for HashSet<String> {
    fn has_keyword(&self, keyword: &str) -> bool {
        self.contains(keyword)
    }
}

impl KeywordSet for [String] {
    fn has_keyword(&self, keyword: &str) -> bool {
        self.iter().any(|k| k == keyword)
    }
}

impl KeywordSet for [&str] {
    fn has_keyword(&self, keyword: &str) -> bool {
        self.iter().any(|k| *k == keyword)
    }
}

/// Visibility filter over keywords in CNF.
///
/// Equality is structural: two expressions that accept the same photos but
/// list their clauses in a different order are not equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Literal>>", into = "Vec<Vec<Literal>>")]
pub struct KeywordExpression {
    /// Never empty.
    clauses: Vec<Vec<Literal>>,
}

impl KeywordExpression {
    pub fn new() -> Self {
        Self {
            clauses: vec![Vec::new()],
        }
    }

    /// Append a literal to the last clause
    pub fn add_literal(&mut self, symbol: impl Into<String>, negated: bool) {
        if let Some(last) = self.clauses.last_mut() {
            last.push(Literal::new(symbol, negated));
        }
    }

    /// Append a new empty clause (denoting `true` until literals are added)
    pub fn add_clause(&mut self) {
        self.clauses.push(Vec::new());
    }

    pub fn delete_last_clause(&mut self) {
        self.clauses.pop();
        if self.clauses.is_empty() {
            self.add_clause();
        }
    }

    /// Reset to a single empty clause
    pub fn clear(&mut self) {
        self.clauses.clear();
        self.add_clause();
    }

    /// Check whether a photo with the given keywords passes the filter
    pub fn evaluate<K: KeywordSet + ?Sized>(&self, keywords: &K) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.is_empty() || clause.iter().any(|l| l.holds(keywords)))
    }

    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// True if every clause is empty, i.e. the expression accepts everything
    pub fn is_trivial(&self) -> bool {
        self.clauses.iter().all(Vec::is_empty)
    }
}

impl Default for KeywordExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<Vec<Literal>>> for KeywordExpression {
    type Error = String;

    fn try_from(clauses: Vec<Vec<Literal>>) -> Result<Self, Self::Error> {
        if clauses.is_empty() {
            return Err("keyword expression needs at least one clause".to_string());
        }
        Ok(Self { clauses })
    }
}

impl From<KeywordExpression> for Vec<Vec<Literal>> {
    fn from(expr: KeywordExpression) -> Self {
        expr.clauses
    }
}

impl fmt::Display for KeywordExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str("and\n")?;
            }
            f.write_str(" ")?;
            if clause.is_empty() {
                f.write_str(" true")?;
            }
            for (j, literal) in clause.iter().enumerate() {
                if j > 0 {
                    f.write_str(" or")?;
                }
                if literal.negated {
                    f.write_str(" not")?;
                }
                write!(f, " {}", literal.symbol)?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
