// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use derive_more::{Display, From, Into};

use crate::dependency::{Pattern, Provider};

/// The name of a package
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct Name(String);

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// The metadata of a package record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    /// Package name
    pub name: Name,

    /// Package version, including any revision suffix
    pub version: String,

    /// Origin repository; unset for records known only to the
    /// installed database
    pub repository: Option<String>,

    /// Runtime dependencies, in declaration order
    pub run_depends: Vec<Pattern>,

    /// Virtual packages this record provides
    pub provides: Vec<Provider>,
}

impl Meta {
    /// Fully qualified `name-version` identifier
    pub fn pkgver(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// First declared provider satisfying `pattern`, if any
    pub fn provider_for(&self, pattern: &Pattern) -> Option<&Provider> {
        self.provides
            .iter()
            .find(|provider| provider.satisfies(pattern))
    }
}
