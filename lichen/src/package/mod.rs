// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use strum::{Display, EnumString};

pub use self::meta::{Meta, Name};

pub mod meta;

/// On-disk lifecycle state of a package name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum State {
    NotInstalled,
    Unpacked,
    Installed,
    ConfigFiles,
    HalfRemoved,
}

/// Why a [`Record`] joined the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Install,
    Update,
    Configure,
}

/// A package record plus the annotations the resolver attaches to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub meta: Meta,

    /// State of this package name on disk before the transaction runs
    pub state: State,

    /// Action tag, set once the record joins a transaction
    pub action: Option<Action>,

    /// True for records pulled in as dependencies rather than requested
    /// by the user
    pub automatic: bool,
}

impl Record {
    pub fn new(meta: Meta, state: State) -> Self {
        Self {
            meta,
            state,
            action: None,
            automatic: false,
        }
    }
}
