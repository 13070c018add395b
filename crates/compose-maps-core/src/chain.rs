//! Kind-bucketed reconciliation of contribution chains.
//!
//! [`ContributionChain`] owns the live contributors of one node. Every pass
//! the node hands it the latest [`Modifier`]; the chain folds the modifier
//! into one ordered descriptor list per kind, diffs each list against the
//! previous generation and records a disposition per slot, then commits the
//! dispositions in a separate pass. Diffing never calls into descriptors or
//! contributors, so committing is the only place user code runs.
//!
//! The diff is positional. A slot whose descriptor is unchanged is reused
//! without any call, a slot whose descriptor changed value but kept its type
//! is updated in place, and a slot whose descriptor changed type is replaced.
//! When the number of descriptors of a kind changes, that kind is rebuilt
//! from scratch. Moves are never detected: swapping two descriptors of the
//! same type produces two updates.

use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::config::ReconcileConfig;
use crate::contribution::{AnyContribution, Contributor, Descriptor, TypeMismatch};
use crate::error::ReconcileError;
use crate::kind::{Kind, KindSet};
use crate::modifier::Modifier;
use crate::platform::{Native, Platform, Target};

/// What a reconciliation pass decided for a single slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Disposition {
    Reuse,
    Update,
    Replace,
    Remove,
}

impl Disposition {
    /// Compares the descriptors occupying the same slot in two generations.
    ///
    /// Never yields [`Disposition::Remove`]; removals only come from
    /// structural changes.
    pub fn between<P: Platform>(
        previous: &dyn AnyContribution<P>,
        next: &dyn AnyContribution<P>,
    ) -> Disposition {
        if previous.equals(next) {
            Disposition::Reuse
        } else if previous.contribution_type() == next.contribution_type() {
            Disposition::Update
        } else {
            Disposition::Replace
        }
    }
}

/// Counts of the calls made by one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub reused: usize,
    pub updated: usize,
    pub replaced: usize,
    pub removed: usize,
    pub created: usize,
}

impl CommitReport {
    /// True when the commit did not call into any descriptor.
    pub fn is_noop(&self) -> bool {
        self.updated == 0 && self.replaced == 0 && self.removed == 0 && self.created == 0
    }
}

enum Pending<P: Platform> {
    Update(Descriptor<P>),
    Replace(Descriptor<P>),
    Remove,
}

enum Entry<P: Platform> {
    Clean(Descriptor<P>),
    Dirty {
        previous: Descriptor<P>,
        pending: Pending<P>,
    },
}

impl<P: Platform> Entry<P> {
    /// The descriptor that produced the live contributor in this slot.
    fn descriptor(&self) -> &Descriptor<P> {
        match self {
            Entry::Clean(descriptor) => descriptor,
            Entry::Dirty { previous, .. } => previous,
        }
    }

    fn disposition(&self) -> Option<Disposition> {
        match self {
            Entry::Clean(_) => None,
            Entry::Dirty { pending, .. } => Some(match pending {
                Pending::Update(_) => Disposition::Update,
                Pending::Replace(_) => Disposition::Replace,
                Pending::Remove => Disposition::Remove,
            }),
        }
    }

    fn mark(&mut self, pending: Pending<P>) {
        let previous = Rc::clone(self.descriptor());
        *self = Entry::Dirty { previous, pending };
    }
}

/// Parallel lists of entries and contributors for one kind.
struct Bucket<P: Platform> {
    entries: Vec<Entry<P>>,
    contributors: Vec<Box<dyn Contributor<P>>>,
    staged: Vec<Descriptor<P>>,
}

impl<P: Platform> Default for Bucket<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            contributors: Vec::new(),
            staged: Vec::new(),
        }
    }
}

type Generation<P> = [Vec<Descriptor<P>>; Kind::COUNT];

/// Live contributors of a node, reconciled against successive modifiers.
pub struct ContributionChain<P: Platform> {
    scope: KindSet,
    buckets: [Bucket<P>; Kind::COUNT],
    config: ReconcileConfig,
    dirty: bool,
    reused: usize,
}

impl<P: Platform> ContributionChain<P> {
    /// Creates an empty chain that only tracks the kinds in `scope`.
    pub fn new(scope: KindSet) -> Self {
        Self::with_config(scope, ReconcileConfig::default())
    }

    pub fn with_config(scope: KindSet, config: ReconcileConfig) -> Self {
        Self {
            scope: scope & KindSet::USER,
            buckets: std::array::from_fn(|_| Bucket::default()),
            config,
            dirty: false,
            reused: 0,
        }
    }

    pub fn scope(&self) -> KindSet {
        self.scope
    }

    pub fn config(&self) -> ReconcileConfig {
        self.config
    }

    /// Diffs `modifier` against the current generation and commits the result.
    pub fn reconcile(&mut self, modifier: &Modifier<P>) -> Result<CommitReport, ReconcileError> {
        self.diff(modifier)?;
        self.commit()
    }

    /// Tears down every contributor.
    pub fn detach_all(&mut self) -> Result<CommitReport, ReconcileError> {
        self.reconcile(&Modifier::empty())
    }

    /// Records a disposition for every slot without calling into any
    /// descriptor or contributor. Must be followed by [`commit`](Self::commit).
    pub fn diff(&mut self, modifier: &Modifier<P>) -> Result<(), ReconcileError> {
        if self.dirty {
            return Err(ReconcileError::PendingCommit);
        }
        let next = self.bucket_descriptors(modifier)?;
        let had_previous = self.buckets.iter().any(|bucket| !bucket.entries.is_empty());
        let has_next = next.iter().any(|descriptors| !descriptors.is_empty());
        self.reused = 0;

        match (had_previous, has_next) {
            (false, false) => return Ok(()),
            (false, true) => {
                self.trace_generation("initial population");
                for (bucket, descriptors) in self.buckets.iter_mut().zip(next) {
                    bucket.staged = descriptors;
                }
            }
            (true, false) => {
                self.trace_generation("teardown");
                for bucket in &mut self.buckets {
                    for entry in &mut bucket.entries {
                        entry.mark(Pending::Remove);
                    }
                }
            }
            (true, true) => {
                let same_shape = self
                    .buckets
                    .iter()
                    .zip(&next)
                    .all(|(bucket, descriptors)| bucket.entries.len() == descriptors.len());
                self.trace_generation(if same_shape {
                    "positional diff"
                } else {
                    "structural rebuild"
                });
                for (kind, descriptors) in Kind::ALL.into_iter().zip(next) {
                    if self.buckets[kind.index()].entries.len() == descriptors.len() {
                        self.diff_positional(kind, descriptors)?;
                    } else {
                        self.rebuild(kind, descriptors);
                    }
                }
            }
        }

        self.dirty = true;
        Ok(())
    }

    /// Applies the dispositions recorded by [`diff`](Self::diff): updates,
    /// then replacements, then removals, then freshly created entries.
    pub fn commit(&mut self) -> Result<CommitReport, ReconcileError> {
        if !self.dirty {
            return Ok(CommitReport::default());
        }
        let mut report = CommitReport {
            reused: mem::take(&mut self.reused),
            ..CommitReport::default()
        };

        for kind in Kind::ALL {
            self.commit_updates(kind, &mut report)?;
        }
        for kind in Kind::ALL {
            self.commit_replacements(kind, &mut report)?;
        }
        for kind in Kind::ALL {
            self.commit_removals(kind, &mut report)?;
        }
        for kind in Kind::ALL {
            self.commit_staged(kind, &mut report)?;
        }
        for bucket in &mut self.buckets {
            if bucket.contributors.is_empty() {
                *bucket = Bucket::default();
            }
        }

        self.dirty = false;
        if !report.is_noop() {
            log::debug!("committed contributions {report:?}");
        }
        Ok(report)
    }

    /// Applies every contributor of the target's kind, in order.
    ///
    /// Returns the number of contributors invoked.
    pub fn contribute(&mut self, mut target: Target<'_, P>) -> usize {
        let bucket = &mut self.buckets[target.kind().index()];
        for contributor in &mut bucket.contributors {
            contributor.contribute(target.reborrow());
        }
        bucket.contributors.len()
    }

    /// Takes the native object held by the owning delegate of `kind`, if the
    /// current generation has one.
    pub fn delegate_native(&mut self, kind: Kind) -> Result<Option<Native<P>>, ReconcileError> {
        let bucket = &mut self.buckets[kind.index()];
        let mut delegates = bucket
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.descriptor().is_delegate())
            .map(|(index, _)| index);
        let Some(index) = delegates.next() else {
            return Ok(None);
        };
        if delegates.next().is_some() {
            return Err(ReconcileError::DuplicateDelegate { kind });
        }
        Ok(bucket.contributors[index].adopt(kind))
    }

    /// Number of live contributors of `kind`.
    pub fn len(&self, kind: Kind) -> usize {
        self.buckets[kind.index()].contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets
            .iter()
            .all(|bucket| bucket.contributors.is_empty())
    }

    /// True between [`diff`](Self::diff) and [`commit`](Self::commit).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The pending disposition of a slot, if the last diff marked it.
    pub fn disposition(&self, kind: Kind, index: usize) -> Option<Disposition> {
        self.buckets[kind.index()]
            .entries
            .get(index)
            .and_then(Entry::disposition)
    }

    /// Descriptors behind the live contributors of `kind`.
    pub fn descriptors(&self, kind: Kind) -> impl Iterator<Item = &Descriptor<P>> + '_ {
        self.buckets[kind.index()].entries.iter().map(Entry::descriptor)
    }

    /// Downcasts the contributor at `index` of `kind`.
    pub fn contributor<C: Contributor<P>>(&self, kind: Kind, index: usize) -> Option<&C> {
        self.buckets[kind.index()]
            .contributors
            .get(index)
            .and_then(|contributor| (**contributor).as_any().downcast_ref::<C>())
    }

    pub fn contributor_mut<C: Contributor<P>>(&mut self, kind: Kind, index: usize) -> Option<&mut C> {
        self.buckets[kind.index()]
            .contributors
            .get_mut(index)
            .and_then(|contributor| (**contributor).as_any_mut().downcast_mut::<C>())
    }

    fn bucket_descriptors(&self, modifier: &Modifier<P>) -> Result<Generation<P>, ReconcileError> {
        let mut next: Generation<P> = Default::default();
        modifier.fold(Ok(()), |result, descriptor| {
            result?;
            let kinds = descriptor.kinds();
            if kinds.is_reserved() {
                return Err(ReconcileError::ReservedKind {
                    descriptor: descriptor.name(),
                });
            }
            if (kinds & KindSet::USER).is_empty() {
                return Err(ReconcileError::EmptyKindSet {
                    descriptor: descriptor.name(),
                });
            }
            for kind in (kinds & self.scope).kinds() {
                next[kind.index()].push(Rc::clone(descriptor));
            }
            Ok(())
        })?;

        for kind in Kind::ALL {
            let delegates = next[kind.index()]
                .iter()
                .filter(|descriptor| descriptor.is_delegate())
                .count();
            if delegates > 1 {
                return Err(ReconcileError::DuplicateDelegate { kind });
            }
        }
        Ok(next)
    }

    fn diff_positional(
        &mut self,
        kind: Kind,
        next: Vec<Descriptor<P>>,
    ) -> Result<(), ReconcileError> {
        let verbose = self.config.verbose;
        let bucket = &mut self.buckets[kind.index()];
        for (index, (entry, descriptor)) in bucket.entries.iter_mut().zip(next).enumerate() {
            let disposition = Disposition::between(&**entry.descriptor(), &*descriptor);
            if verbose {
                log::debug!("{kind}[{index}] {disposition:?} {}", descriptor.name());
            }
            match disposition {
                Disposition::Reuse => self.reused += 1,
                Disposition::Update => entry.mark(Pending::Update(descriptor)),
                Disposition::Replace => entry.mark(Pending::Replace(descriptor)),
                Disposition::Remove => {
                    return Err(ReconcileError::UnexpectedDisposition {
                        kind,
                        index,
                        disposition,
                    })
                }
            }
        }
        Ok(())
    }

    fn rebuild(&mut self, kind: Kind, next: Vec<Descriptor<P>>) {
        let bucket = &mut self.buckets[kind.index()];
        if self.config.verbose {
            log::debug!(
                "{kind} rebuilt: {} removed, {} staged",
                bucket.entries.len(),
                next.len()
            );
        }
        for entry in &mut bucket.entries {
            entry.mark(Pending::Remove);
        }
        bucket.staged = next;
    }

    fn commit_updates(&mut self, kind: Kind, report: &mut CommitReport) -> Result<(), ReconcileError> {
        let bucket = &mut self.buckets[kind.index()];
        for (index, entry) in bucket.entries.iter_mut().enumerate() {
            let Entry::Dirty {
                pending: Pending::Update(next),
                ..
            } = entry
            else {
                continue;
            };
            let next = Rc::clone(next);
            next.update_contributor(bucket.contributors[index].as_mut())
                .map_err(|mismatch| mismatched(kind, index, mismatch))?;
            *entry = Entry::Clean(next);
            report.updated += 1;
        }
        Ok(())
    }

    fn commit_replacements(
        &mut self,
        kind: Kind,
        report: &mut CommitReport,
    ) -> Result<(), ReconcileError> {
        let bucket = &mut self.buckets[kind.index()];
        for (index, entry) in bucket.entries.iter_mut().enumerate() {
            let Entry::Dirty {
                previous,
                pending: Pending::Replace(next),
            } = entry
            else {
                continue;
            };
            let (previous, next) = (Rc::clone(previous), Rc::clone(next));
            let slot = &mut bucket.contributors[index];
            previous
                .detach_contributor(slot.as_mut())
                .map_err(|mismatch| mismatched(kind, index, mismatch))?;
            let mut created = next.create_contributor();
            next.attach_contributor(created.as_mut())
                .map_err(|mismatch| mismatched(kind, index, mismatch))?;
            *slot = created;
            *entry = Entry::Clean(next);
            report.replaced += 1;
        }
        Ok(())
    }

    fn commit_removals(&mut self, kind: Kind, report: &mut CommitReport) -> Result<(), ReconcileError> {
        let bucket = &mut self.buckets[kind.index()];
        let has_removals = bucket
            .entries
            .iter()
            .any(|entry| entry.disposition() == Some(Disposition::Remove));
        if !has_removals {
            return Ok(());
        }

        let entries = mem::take(&mut bucket.entries);
        let contributors = mem::take(&mut bucket.contributors);
        for (index, (entry, mut contributor)) in entries.into_iter().zip(contributors).enumerate() {
            match entry {
                Entry::Dirty {
                    previous,
                    pending: Pending::Remove,
                } => {
                    previous
                        .detach_contributor(contributor.as_mut())
                        .map_err(|mismatch| mismatched(kind, index, mismatch))?;
                    report.removed += 1;
                }
                entry => {
                    bucket.entries.push(entry);
                    bucket.contributors.push(contributor);
                }
            }
        }
        Ok(())
    }

    fn commit_staged(&mut self, kind: Kind, report: &mut CommitReport) -> Result<(), ReconcileError> {
        let bucket = &mut self.buckets[kind.index()];
        for descriptor in mem::take(&mut bucket.staged) {
            let index = bucket.contributors.len();
            let mut contributor = descriptor.create_contributor();
            descriptor
                .attach_contributor(contributor.as_mut())
                .map_err(|mismatch| mismatched(kind, index, mismatch))?;
            bucket.entries.push(Entry::Clean(descriptor));
            bucket.contributors.push(contributor);
            report.created += 1;
        }
        Ok(())
    }

    fn trace_generation(&self, case: &str) {
        if self.config.verbose {
            log::debug!("reconciling {:?}: {case}", self.scope);
        }
    }
}

fn mismatched(kind: Kind, index: usize, mismatch: TypeMismatch) -> ReconcileError {
    ReconcileError::ContributorMismatch {
        kind,
        index,
        expected: mismatch.expected,
    }
}

impl<P: Platform> fmt::Debug for ContributionChain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContributionChain")
            .field("scope", &self.scope)
            .field("surface", &self.len(Kind::Surface))
            .field("root", &self.len(Kind::Root))
            .field("overlay", &self.len(Kind::Overlay))
            .field("dirty", &self.dirty)
            .finish()
    }
}
