// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Narrow interfaces onto the stores the resolver consults: the
//! installed package database and the pool of enabled repositories.
//!
//! Implementations are expected to report absence as `Ok(None)`;
//! [`Error`] is reserved for genuine backing store failures.

use thiserror::Error;

use crate::package::{Name, Record};
use crate::Pattern;

/// Lookups against the installed package database
pub trait InstalledSource {
    /// The installed package named `name`
    fn query_name(&self, name: &Name) -> Result<Option<Record>, Error>;

    /// An installed package providing the virtual `name`
    fn query_provider(&self, name: &Name) -> Result<Option<Record>, Error>;
}

/// Lookups against the pool of enabled repositories
pub trait PoolSource {
    /// Best candidate whose own name and version satisfy `pattern`
    fn query_pattern(&self, pattern: &Pattern) -> Result<Option<Record>, Error>;

    /// Best candidate providing a virtual that satisfies `pattern`
    fn query_provider(&self, pattern: &Pattern) -> Result<Option<Record>, Error>;
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io")]
    Io(#[from] std::io::Error),

    #[error("backing store: {0}")]
    Backend(String),
}
