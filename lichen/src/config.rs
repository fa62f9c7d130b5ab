// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Virtual package aliasing.
//!
//! An administrator can pin the concrete package preferred to provide a
//! virtual name, e.g. mapping `awk` to `gawk`. Aliases are read from
//! YAML fragments below the vendor and admin configuration trees, with
//! admin entries overriding vendor ones.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DOMAIN: &str = "virtual";
const EXTENSION: &str = "conf";

/// Map of virtual package names to the concrete package preferred to
/// provide them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualPackages(HashMap<String, String>);

impl VirtualPackages {
    pub fn with(items: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(items.into_iter().collect())
    }

    /// Concrete package aliased to the virtual `name`, if configured
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Entries of `other` override entries of `self`
    pub fn merge(self, other: Self) -> Self {
        Self(self.0.into_iter().chain(other.0).collect())
    }

    /// Load and merge alias fragments below `root`, vendor configuration
    /// first, administrator configuration last
    pub fn load(root: impl AsRef<Path>) -> Result<Self, Error> {
        let mut merged = Self::default();

        for base in ["usr/share/lichen", "etc/lichen"] {
            let dir = root.as_ref().join(base);

            let file = dir.join(format!("{DOMAIN}.{EXTENSION}"));
            if file.exists() {
                merged = merged.merge(read_fragment(&file)?);
            }

            for path in fragment_paths(&dir.join(format!("{DOMAIN}.{EXTENSION}.d")))? {
                merged = merged.merge(read_fragment(&path)?);
            }
        }

        Ok(merged)
    }
}

fn read_fragment(path: &Path) -> Result<VirtualPackages, Error> {
    Ok(serde_yaml::from_str(&fs::read_to_string(path)?)?)
}

fn fragment_paths(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(error) => return Err(error.into()),
    };

    let mut paths = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION))
        .collect::<Vec<_>>();
    paths.sort();

    Ok(paths)
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io")]
    Io(#[from] io::Error),

    #[error("yaml")]
    Yaml(#[from] serde_yaml::Error),
}
