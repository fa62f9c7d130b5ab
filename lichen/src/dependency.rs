// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Dependency patterns and virtual package providers.
//!
//! A pattern is the expression a package uses to declare a runtime
//! dependency: a bare package name, or a name qualified by a version
//! bound such as `libfoo>=1.2_1`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Comparison operator of a versioned [`Pattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    LessEqual,
    GreaterEqual,
    Equal,
    Less,
    Greater,
}

impl Op {
    /// Operator tokens, multi-character first so `<=` never parses as `<`
    const TOKENS: [(&'static str, Self); 5] = [
        ("<=", Self::LessEqual),
        (">=", Self::GreaterEqual),
        ("=", Self::Equal),
        ("<", Self::Less),
        (">", Self::Greater),
    ];

    fn allows(self, ordering: Ordering) -> bool {
        match self {
            Self::LessEqual => ordering != Ordering::Greater,
            Self::GreaterEqual => ordering != Ordering::Less,
            Self::Equal => ordering == Ordering::Equal,
            Self::Less => ordering == Ordering::Less,
            Self::Greater => ordering == Ordering::Greater,
        }
    }

    fn token(self) -> &'static str {
        match self {
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "=",
            Self::Less => "<",
            Self::Greater => ">",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A dependency pattern: a bare `name`, or `name<op><version>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    name: String,
    constraint: Option<(Op, String)>,
}

impl Pattern {
    /// Pattern matching `name` in any version
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    /// The same version bound, rewritten against another package name
    pub(crate) fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: self.constraint.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version bound, if the pattern carries one
    pub fn version(&self) -> Option<&str> {
        self.constraint
            .as_ref()
            .map(|(_, version)| version.as_str())
    }

    /// Does `version` fall within this pattern's bound?
    ///
    /// A bare pattern places no bound and matches any version.
    pub fn matches_version(&self, version: &str) -> bool {
        match &self.constraint {
            Some((op, bound)) => op.allows(vercmp::compare(version, bound)),
            None => true,
        }
    }

    /// Does the fully qualified `name-version` string satisfy this pattern?
    pub fn matches_pkgver(&self, pkgver: &str) -> Result<bool, ParseError> {
        let (name, version) = split_pkgver(pkgver)?;

        Ok(name == self.name && self.matches_version(version))
    }
}

impl FromStr for Pattern {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for (token, op) in Op::TOKENS {
            let Some(at) = s.find(token) else {
                continue;
            };

            let name = s[..at].trim();
            let version = s[at + token.len()..].trim();

            if name.is_empty() {
                return Err(ParseError::EmptyName(s.into()));
            }
            if version.is_empty() {
                return Err(ParseError::MissingVersion(s.into()));
            }

            return Ok(Self {
                name: name.into(),
                constraint: Some((op, version.into())),
            });
        }

        let name = s.trim();
        if name.is_empty() {
            return Err(ParseError::EmptyName(s.into()));
        }

        Ok(Self::bare(name))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some((op, version)) => write!(f, "{}{op}{version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A virtual package declared by a concrete one, e.g. `awk-1.0`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provider {
    pub name: String,
    pub version: String,
}

impl Provider {
    /// Does this provider satisfy `pattern`?
    pub fn satisfies(&self, pattern: &Pattern) -> bool {
        self.name == pattern.name() && pattern.matches_version(&self.version)
    }
}

impl FromStr for Provider {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, version) = split_pkgver(s)?;

        Ok(Self {
            name: name.into(),
            version: version.into(),
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// Split a fully qualified `name-version` string.
///
/// The version never contains `-`, so the split happens at the last
/// occurrence; package names themselves may carry dashes.
pub fn split_pkgver(pkgver: &str) -> Result<(&str, &str), ParseError> {
    pkgver
        .rsplit_once('-')
        .filter(|(name, version)| !name.is_empty() && !version.is_empty())
        .ok_or_else(|| ParseError::InvalidPkgver(pkgver.into()))
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("empty package name in {0:?}")]
    EmptyName(String),

    #[error("missing version after operator in {0:?}")]
    MissingVersion(String),

    #[error("expected name-version, got {0:?}")]
    InvalidPkgver(String),
}
