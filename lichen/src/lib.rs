// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

pub use self::config::VirtualPackages;
pub use self::dependency::{Pattern, Provider};
pub use self::package::Record;
pub use self::registry::{InstalledSource, PoolSource};
pub use self::resolver::Resolver;
pub use self::transaction::Transaction;

pub mod config;
pub mod dependency;
pub mod package;
pub mod registry;
pub mod resolver;
pub mod transaction;
