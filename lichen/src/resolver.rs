// SPDX-FileCopyrightText: Copyright © 2020-2024 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Resolution of transitive runtime dependencies.
//!
//! For every pattern reachable from a record's `run_depends` the driver
//! decides, in order: is it satisfied by an installed package, is it
//! satisfied by an already queued record, can the repository pool offer
//! a candidate, and under which action tag does that candidate join the
//! transaction. Unresolvable patterns land in the missing set instead
//! of failing the traversal.

use log::{debug, trace, warn};
use thiserror::Error;

use crate::config::VirtualPackages;
use crate::dependency::Pattern;
use crate::package::{Action, Name, Record, State};
use crate::registry::{self, InstalledSource, PoolSource};
use crate::transaction::{self, Transaction};

/// Upper bound on the depth of a runtime dependency chain
pub const MAX_DEPTH: usize = 512;

/// Resolves the runtime dependencies of repository records into a
/// [`Transaction`]
pub struct Resolver<'a, I, P> {
    installed: &'a I,
    pool: &'a P,
    virtuals: &'a VirtualPackages,
}

impl<'a, I, P> Resolver<'a, I, P>
where
    I: InstalledSource,
    P: PoolSource,
{
    pub fn new(installed: &'a I, pool: &'a P, virtuals: &'a VirtualPackages) -> Self {
        Self {
            installed,
            pool,
            virtuals,
        }
    }

    /// Resolve every runtime dependency of `record`, accumulating the
    /// outcome into `tx`.
    ///
    /// May be called repeatedly with the same transaction to resolve
    /// sibling targets. On error `tx` is left partially extended and
    /// must be discarded by the caller.
    pub fn resolve(&self, tx: &mut Transaction, record: &Record) -> Result<(), Error> {
        if record.meta.run_depends.is_empty() {
            return Ok(());
        }

        let mut trail = Vec::new();

        self.resolve_depends(tx, record, 0, &mut trail)
    }

    fn resolve_depends(
        &self,
        tx: &mut Transaction,
        record: &Record,
        depth: usize,
        trail: &mut Vec<Name>,
    ) -> Result<(), Error> {
        if depth >= MAX_DEPTH {
            return Err(Error::DepthExceeded);
        }
        // The depth limit alone cannot tell a cycle from a deep chain
        if trail.contains(&record.meta.name) {
            return Err(Error::DependencyCycle(record.meta.name.clone()));
        }

        trail.push(record.meta.name.clone());
        let result = self.walk(tx, record, depth, trail);
        trail.pop();

        result
    }

    fn walk(
        &self,
        tx: &mut Transaction,
        record: &Record,
        depth: usize,
        trail: &mut Vec<Name>,
    ) -> Result<(), Error> {
        let pkgver = record.meta.pkgver();

        for required in &record.meta.run_depends {
            // Administrator aliases redirect a virtual name to a
            // concrete package before any lookup runs
            let pattern = match self.virtuals.alias(required.name()) {
                Some(target) => {
                    trace!("{pkgver}: '{required}' aliased to '{target}'");
                    required.with_name(target)
                }
                None => required.clone(),
            };

            let mut intent = Action::Install;
            let mut unsuitable = None;

            // A dependency satisfied by the installed database needs no
            // further work
            if let Some(found) = self.query_installed(pattern.name())? {
                if found.meta.provider_for(&pattern).is_some() {
                    trace!(
                        "{pkgver}: '{pattern}' provided by installed {}",
                        found.meta.pkgver()
                    );
                    continue;
                }

                let matched = found.meta.name.as_ref() == pattern.name()
                    && pattern.matches_version(&found.meta.version);

                match (matched, found.state) {
                    (true, State::Installed) => {
                        trace!(
                            "{pkgver}: '{pattern}' satisfied by installed {}",
                            found.meta.pkgver()
                        );
                        continue;
                    }
                    (true, State::Unpacked) => intent = Action::Configure,
                    (true, _) => {}
                    (false, _) => unsuitable = Some(found.meta.pkgver()),
                }
            }

            // Already queued by an earlier branch of the walk
            if let Some(queued) = tx
                .find_queued_provider(&pattern)
                .or_else(|| tx.find_queued(&pattern))
            {
                trace!(
                    "{pkgver}: '{pattern}' already queued as {}",
                    queued.meta.pkgver()
                );
                continue;
            }

            // An exhausted pool records the pattern as missing rather
            // than failing the traversal
            let candidate = match self.query_pool(&pattern)? {
                Some(candidate) => candidate,
                None => {
                    if let Some(installed_pkgver) = unsuitable {
                        debug!(
                            "{pkgver}: installed {installed_pkgver} does not satisfy '{pattern}'"
                        );
                    }
                    if tx.add_missing(pattern.clone())? {
                        warn!("{pkgver}: missing dependency '{pattern}'");
                    }
                    continue;
                }
            };

            // First match wins per package name; alternative providers
            // are not reconciled here
            if let Some(queued) = tx.queued_by_name(candidate.meta.name.as_ref()) {
                trace!(
                    "{pkgver}: '{pattern}' resolves to already queued {}",
                    queued.meta.pkgver()
                );
                continue;
            }

            // Re-check the installed database under the candidate's own
            // name to settle the action tag and the pre-transaction state
            let state = match self.query_installed(candidate.meta.name.as_ref())? {
                None => {
                    intent = Action::Install;
                    State::NotInstalled
                }
                Some(found) => {
                    match found.state {
                        State::Installed => intent = Action::Update,
                        State::Unpacked => intent = Action::Install,
                        _ => {}
                    }
                    found.state
                }
            };

            debug!(
                "{pkgver}: queueing {} ({intent}) for '{pattern}'",
                candidate.meta.pkgver()
            );

            let child = candidate.clone();
            tx.store(candidate, state, intent);

            if !child.meta.run_depends.is_empty() {
                self.resolve_depends(tx, &child, depth + 1, trail)?;
            }
        }

        Ok(())
    }

    /// Installed lookup by real name first, then by provided virtual
    fn query_installed(&self, name: &str) -> Result<Option<Record>, registry::Error> {
        let name = Name::from(name);

        if let Some(found) = self.installed.query_name(&name)? {
            return Ok(Some(found));
        }

        self.installed.query_provider(&name)
    }

    /// Pool lookup preferring virtual providers over real candidates
    fn query_pool(&self, pattern: &Pattern) -> Result<Option<Record>, registry::Error> {
        if let Some(found) = self.pool.query_provider(pattern)? {
            return Ok(Some(found));
        }

        self.pool.query_pattern(pattern)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("dependency chain exceeds {MAX_DEPTH} levels")]
    DepthExceeded,

    #[error("dependency cycle through {0}")]
    DependencyCycle(Name),

    #[error("registry lookup")]
    Lookup(#[from] registry::Error),

    #[error("transaction")]
    Transaction(#[from] transaction::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::package::Meta;
    use crate::registry::test::Memory;

    fn meta(name: &str, version: &str, depends: &[&str], provides: &[&str]) -> Meta {
        Meta {
            name: Name::from(name),
            version: version.to_owned(),
            repository: Some("https://repo.example.org/current".to_owned()),
            run_depends: depends.iter().map(|d| d.parse().unwrap()).collect(),
            provides: provides.iter().map(|p| p.parse().unwrap()).collect(),
        }
    }

    fn available(name: &str, version: &str, depends: &[&str]) -> Record {
        Record::new(meta(name, version, depends, &[]), State::NotInstalled)
    }

    fn installed(name: &str, version: &str, state: State) -> Record {
        Record::new(meta(name, version, &[], &[]), state)
    }

    fn resolve(
        installed: Vec<Record>,
        pool: Vec<Record>,
        target: &Record,
    ) -> (Transaction, Result<(), Error>) {
        let installed = Memory::new(installed);
        let pool = Memory::new(pool);
        let virtuals = VirtualPackages::default();
        let resolver = Resolver::new(&installed, &pool, &virtuals);

        let mut tx = Transaction::new();
        let result = resolver.resolve(&mut tx, target);

        (tx, result)
    }

    fn queued_names(tx: &Transaction) -> Vec<String> {
        tx.queued().iter().map(|r| r.meta.pkgver()).collect()
    }

    #[test]
    fn no_runtime_depends_is_a_noop() {
        let target = available("a", "1", &[]);
        let (tx, result) = resolve(vec![], vec![], &target);

        assert!(result.is_ok());
        assert!(tx.queued().is_empty());
        assert!(tx.missing().is_empty());
    }

    #[test]
    fn installed_dependency_satisfies() {
        let target = available("app", "1", &["libc>=2"]);
        let (tx, result) = resolve(
            vec![installed("libc", "2.5", State::Installed)],
            vec![],
            &target,
        );

        assert!(result.is_ok());
        assert!(tx.queued().is_empty());
        assert!(tx.missing().is_empty());
    }

    #[test]
    fn unresolvable_dependency_goes_missing() {
        let target = available("app", "1", &["zzz>=1"]);
        let (tx, result) = resolve(vec![], vec![], &target);

        assert!(result.is_ok());
        assert!(tx.queued().is_empty());
        assert_eq!(tx.missing().len(), 1);
        assert_eq!(tx.missing()[0].to_string(), "zzz>=1");
    }

    #[test]
    fn missing_entries_keep_newest_bound() {
        let first = available("app", "1", &["foo>=1.0"]);
        let second = available("tool", "1", &["foo>=2.0"]);

        for targets in [[&first, &second], [&second, &first]] {
            let pool = Memory::new(vec![]);
            let empty = Memory::new(vec![]);
            let virtuals = VirtualPackages::default();
            let resolver = Resolver::new(&empty, &pool, &virtuals);

            let mut tx = Transaction::new();
            for target in targets {
                resolver.resolve(&mut tx, target).unwrap();
            }

            assert_eq!(tx.missing().len(), 1);
            assert_eq!(tx.missing()[0].to_string(), "foo>=2.0");
        }
    }

    #[test]
    fn transitive_depends_queue_in_preorder() {
        let target = available("app", "1", &["a>=1"]);
        let (tx, result) = resolve(
            vec![],
            vec![available("a", "1", &["b>=1"]), available("b", "1", &[])],
            &target,
        );

        assert!(result.is_ok());
        assert_eq!(queued_names(&tx), ["a-1", "b-1"]);
        assert!(tx.missing().is_empty());

        for record in tx.queued() {
            assert_eq!(record.action, Some(Action::Install));
            assert!(record.automatic);
            assert_eq!(record.state, State::NotInstalled);
        }
    }

    #[test]
    fn sibling_branches_share_queued_records() {
        // Both a and b depend on libz; it is queued exactly once
        let target = available("app", "1", &["a>=1", "b>=1"]);
        let (tx, result) = resolve(
            vec![],
            vec![
                available("a", "1", &["libz>=1"]),
                available("b", "1", &["libz>=1"]),
                available("libz", "1.3", &[]),
            ],
            &target,
        );

        assert!(result.is_ok());
        assert_eq!(queued_names(&tx), ["a-1", "libz-1.3", "b-1"]);
    }

    #[test]
    fn re_resolution_is_a_noop() {
        let target = available("app", "1", &["a>=1", "zzz>=9"]);
        let pool = Memory::new(vec![
            available("a", "1", &["b>=1"]),
            available("b", "1", &[]),
        ]);
        let empty = Memory::new(vec![]);
        let virtuals = VirtualPackages::default();
        let resolver = Resolver::new(&empty, &pool, &virtuals);

        let mut tx = Transaction::new();
        resolver.resolve(&mut tx, &target).unwrap();
        let first_queued = queued_names(&tx);
        let first_missing = tx.missing().to_vec();

        resolver.resolve(&mut tx, &target).unwrap();
        assert_eq!(queued_names(&tx), first_queued);
        assert_eq!(tx.missing(), first_missing);
    }

    #[test]
    fn installed_candidate_tagged_update() {
        let target = available("app", "1", &["foo>=2.0"]);
        let (tx, result) = resolve(
            vec![installed("foo", "1.0", State::Installed)],
            vec![available("foo", "2.0", &[])],
            &target,
        );

        assert!(result.is_ok());
        let queued = &tx.queued()[0];
        assert_eq!(queued.action, Some(Action::Update));
        assert_eq!(queued.state, State::Installed);
    }

    #[test]
    fn unpacked_candidate_tagged_install() {
        // The configure intent from the installed check is overridden
        // once a pool candidate is re-examined
        let target = available("app", "1", &["foo>=1.0"]);
        let (tx, result) = resolve(
            vec![installed("foo", "1.0", State::Unpacked)],
            vec![available("foo", "1.0", &[])],
            &target,
        );

        assert!(result.is_ok());
        let queued = &tx.queued()[0];
        assert_eq!(queued.action, Some(Action::Install));
        assert_eq!(queued.state, State::Unpacked);
    }

    #[test]
    fn config_files_candidate_tagged_install() {
        let target = available("app", "1", &["foo>=1.0"]);
        let (tx, result) = resolve(
            vec![installed("foo", "1.0", State::ConfigFiles)],
            vec![available("foo", "1.2", &[])],
            &target,
        );

        assert!(result.is_ok());
        let queued = &tx.queued()[0];
        assert_eq!(queued.action, Some(Action::Install));
        assert_eq!(queued.state, State::ConfigFiles);
    }

    #[test]
    fn installed_provider_satisfies() {
        let bash = Record::new(meta("bash", "5.2", &[], &["sh-1"]), State::Installed);

        let target = available("app", "1", &["sh>=1"]);
        let (tx, result) = resolve(vec![bash], vec![], &target);

        assert!(result.is_ok());
        assert!(tx.queued().is_empty());
        assert!(tx.missing().is_empty());
    }

    #[test]
    fn queued_provider_satisfies() {
        let dash = Record::new(meta("dash", "0.5", &[], &["sh-1"]), State::NotInstalled);

        let target = available("app", "1", &["dash>=0.5", "sh>=1"]);
        let (tx, result) = resolve(vec![], vec![dash], &target);

        assert!(result.is_ok());
        assert_eq!(queued_names(&tx), ["dash-0.5"]);
    }

    #[test]
    fn pool_provider_preferred_over_real_candidate() {
        let gawk = Record::new(meta("gawk", "5.2", &[], &["awk-1"]), State::NotInstalled);
        let awk = available("awk", "0.1", &[]);

        let target = available("app", "1", &["awk>=0.1"]);
        let (tx, result) = resolve(vec![], vec![gawk, awk], &target);

        assert!(result.is_ok());
        assert_eq!(queued_names(&tx), ["gawk-5.2"]);
    }

    #[test]
    fn alias_redirects_virtual_lookup() {
        let installed = Memory::new(vec![]);
        let pool = Memory::new(vec![available("gawk", "5.2", &[])]);
        let virtuals = VirtualPackages::with([("awk".to_owned(), "gawk".to_owned())]);
        let resolver = Resolver::new(&installed, &pool, &virtuals);

        let target = available("app", "1", &["awk>=1"]);
        let mut tx = Transaction::new();
        resolver.resolve(&mut tx, &target).unwrap();

        assert_eq!(queued_names(&tx), ["gawk-5.2"]);
    }

    #[test]
    fn same_name_candidate_not_requeued() {
        // The queued a-1 does not satisfy `a=2`, but records are keyed
        // by name: the first selection wins
        let target = available("app", "1", &["a=1", "a=2"]);
        let (tx, result) = resolve(
            vec![],
            vec![available("a", "1", &[]), available("a", "2", &[])],
            &target,
        );

        assert!(result.is_ok());
        assert_eq!(queued_names(&tx), ["a-1"]);
    }

    #[test]
    fn bare_pattern_cannot_go_missing() {
        let target = available("app", "1", &["zzz"]);
        let (_, result) = resolve(vec![], vec![], &target);

        assert!(matches!(
            result,
            Err(Error::Transaction(transaction::Error::Unversioned(_)))
        ));
    }

    #[test]
    fn dependency_cycle_detected() {
        // a pulls in a newer build of the target itself
        let target = available("app", "1", &["a>=1"]);
        let (_, result) = resolve(
            vec![],
            vec![
                available("a", "1", &["app>=2"]),
                available("app", "2", &["a>=1"]),
            ],
            &target,
        );

        assert!(matches!(result, Err(Error::DependencyCycle(_))));
    }

    #[test]
    fn deep_chain_resolves() {
        let mut pool = Vec::new();
        for index in 0..64 {
            let depends = format!("p{}>=1", index + 1);
            pool.push(available(&format!("p{index}"), "1", &[&depends]));
        }
        pool.push(available("p64", "1", &[]));

        let target = available("app", "1", &["p0>=1"]);
        let (tx, result) = resolve(vec![], pool, &target);

        assert!(result.is_ok());
        assert_eq!(tx.queued().len(), 65);
    }

    #[test]
    fn depth_limit_enforced() {
        let mut pool = Vec::new();
        for index in 0..512 {
            let depends = format!("p{}>=1", index + 1);
            pool.push(available(&format!("p{index}"), "1", &[&depends]));
        }
        pool.push(available("p512", "1", &[]));

        let target = available("app", "1", &["p0>=1"]);
        let (_, result) = resolve(vec![], pool, &target);

        assert!(matches!(result, Err(Error::DepthExceeded)));
    }

    #[test]
    fn queued_names_are_unique() {
        let target = available("app", "1", &["a>=1", "b>=1", "c>=1"]);
        let (tx, result) = resolve(
            vec![],
            vec![
                available("a", "1", &["libz>=1"]),
                available("b", "1", &["libz>=1", "a>=1"]),
                available("c", "1", &["b>=1"]),
                available("libz", "1.3", &[]),
            ],
            &target,
        );

        assert!(result.is_ok());

        let mut names: Vec<_> = tx
            .queued()
            .iter()
            .map(|r| r.meta.name.as_ref().to_owned())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tx.queued().len());
    }
}
