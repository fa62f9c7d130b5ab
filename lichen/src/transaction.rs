// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! The pending transaction: records queued for action, plus the
//! dependency patterns nothing could satisfy.

use std::cmp::Ordering;

use log::debug;
use thiserror::Error;

use crate::dependency::Pattern;
use crate::package::{Action, Record, State};

#[derive(Debug, Default)]
pub struct Transaction {
    queued: Vec<Record>,
    missing: Vec<Pattern>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records queued for action, in depth-first resolution order.
    ///
    /// The order is observable: the topological sort run before
    /// execution uses it as a stable tie-breaker.
    pub fn queued(&self) -> &[Record] {
        &self.queued
    }

    /// Patterns with no satisfying candidate anywhere
    pub fn missing(&self) -> &[Pattern] {
        &self.missing
    }

    /// Queue `record`, annotated with the state its package name had on
    /// disk and the action to take
    pub(crate) fn store(&mut self, mut record: Record, state: State, action: Action) {
        record.state = state;
        record.action = Some(action);
        record.automatic = true;
        self.queued.push(record);
    }

    /// Queued record keyed by `name`, regardless of version
    pub(crate) fn queued_by_name(&self, name: &str) -> Option<&Record> {
        self.queued
            .iter()
            .find(|record| record.meta.name.as_ref() == name)
    }

    /// Queued record whose own name and version satisfy `pattern`
    pub(crate) fn find_queued(&self, pattern: &Pattern) -> Option<&Record> {
        self.queued.iter().find(|record| {
            record.meta.name.as_ref() == pattern.name()
                && pattern.matches_version(&record.meta.version)
        })
    }

    /// Queued record providing a virtual that satisfies `pattern`
    pub(crate) fn find_queued_provider(&self, pattern: &Pattern) -> Option<&Record> {
        self.queued
            .iter()
            .find(|record| record.meta.provider_for(pattern).is_some())
    }

    /// Record `pattern` as unresolvable.
    ///
    /// At most one entry is kept per package name and the greatest
    /// version bound wins. Returns false when an equal or newer entry
    /// was already present.
    pub(crate) fn add_missing(&mut self, pattern: Pattern) -> Result<bool, Error> {
        let version = pattern
            .version()
            .ok_or_else(|| Error::Unversioned(pattern.clone()))?
            .to_owned();

        let mut replace = None;

        for (index, existing) in self.missing.iter().enumerate() {
            if existing.name() != pattern.name() {
                continue;
            }

            // Entries only enter the set through the gate above, so a
            // version bound is always present
            let Some(held) = existing.version() else {
                continue;
            };

            match vercmp::compare(held, &version) {
                Ordering::Less => {
                    replace = Some(index);
                    break;
                }
                Ordering::Equal | Ordering::Greater => return Ok(false),
            }
        }

        if let Some(index) = replace {
            let superseded = self.missing.remove(index);
            debug!("missing dependency '{superseded}' superseded by '{pattern}'");
        }
        self.missing.push(pattern);

        Ok(true)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing dependency pattern carries no version bound: {0}")]
    Unversioned(Pattern),
}
