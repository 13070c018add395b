//! Keyed property descriptors for the one-setter-per-contribution case.

use std::fmt;

use crate::contribution::{Contribution, Contributor};
use crate::kind::KindSet;
use crate::platform::{Native, Platform, Target};

pub type ApplyFn<P, V> = fn(Target<'_, P>, &V);
pub type UndoFn<P> = fn(Target<'_, P>);

/// Sets one native property to a value.
///
/// Two setters with the same key are updates of one another; a different key
/// is a different behavior and replaces the contributor. The optional undo
/// runs on detach against the last native object the setter was applied to.
pub struct Setter<P: Platform, V> {
    key: &'static str,
    kinds: KindSet,
    value: V,
    apply: ApplyFn<P, V>,
    undo: Option<UndoFn<P>>,
}

impl<P: Platform, V> Setter<P, V> {
    pub fn new(key: &'static str, kinds: KindSet, value: V, apply: ApplyFn<P, V>) -> Self {
        Self {
            key,
            kinds,
            value,
            apply,
            undo: None,
        }
    }

    pub fn with_undo(mut self, undo: UndoFn<P>) -> Self {
        self.undo = Some(undo);
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<P: Platform, V: fmt::Debug> fmt::Debug for Setter<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("key", &self.key)
            .field("kinds", &self.kinds)
            .field("value", &self.value)
            .finish()
    }
}

impl<P: Platform, V: PartialEq> PartialEq for Setter<P, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.kinds == other.kinds && self.value == other.value
    }
}

/// Live state of a [`Setter`].
pub struct SetterContributor<P: Platform, V> {
    value: V,
    apply: ApplyFn<P, V>,
    last: Option<Native<P>>,
}

impl<P: Platform, V> SetterContributor<P, V> {
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The native object this setter was last applied to.
    pub fn last_target(&self) -> Option<&Native<P>> {
        self.last.as_ref()
    }
}

impl<P: Platform, V: 'static> Contributor<P> for SetterContributor<P, V> {
    fn contribute(&mut self, target: Target<'_, P>) {
        self.last = Some(target.to_native());
        (self.apply)(target, &self.value);
    }
}

impl<P, V> Contribution<P> for Setter<P, V>
where
    P: Platform,
    V: Clone + fmt::Debug + PartialEq + 'static,
{
    type Contributor = SetterContributor<P, V>;

    fn kinds(&self) -> KindSet {
        self.kinds
    }

    fn create(&self) -> Self::Contributor {
        SetterContributor {
            value: self.value.clone(),
            apply: self.apply,
            last: None,
        }
    }

    fn update(&self, contributor: &mut Self::Contributor) {
        contributor.value = self.value.clone();
        contributor.apply = self.apply;
    }

    fn on_detach(&self, contributor: &mut Self::Contributor) {
        if let (Some(undo), Some(mut native)) = (self.undo, contributor.last.take()) {
            undo(native.as_target());
        }
    }

    fn variant(&self) -> &'static str {
        self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ContributionChain;
    use crate::kind::Kind;
    use crate::modifier::Modifier;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Props = Rc<RefCell<Vec<String>>>;

    struct Recording;

    impl Platform for Recording {
        type Surface = Props;
        type Root = Props;
        type Overlay = Props;
    }

    fn props(target: Target<'_, Recording>) -> Props {
        match target {
            Target::Surface(props) | Target::Root(props) | Target::Overlay(props) => props.clone(),
        }
    }

    fn set_alpha(target: Target<'_, Recording>, value: &u8) {
        props(target).borrow_mut().push(format!("alpha={value}"));
    }

    fn set_title(target: Target<'_, Recording>, value: &u8) {
        props(target).borrow_mut().push(format!("title={value}"));
    }

    fn clear_alpha(target: Target<'_, Recording>) {
        props(target).borrow_mut().push("alpha cleared".to_string());
    }

    fn alpha(value: u8) -> Modifier<Recording> {
        Modifier::element(
            Setter::new("alpha", KindSet::OVERLAY, value, set_alpha).with_undo(clear_alpha),
        )
    }

    #[test]
    fn same_key_updates_and_applies_new_value() {
        let native = Props::default();
        let mut chain = ContributionChain::new(KindSet::OVERLAY);

        chain.reconcile(&alpha(1)).unwrap();
        chain.contribute(Target::Overlay(&mut native.clone()));
        let report = chain.reconcile(&alpha(2)).unwrap();
        chain.contribute(Target::Overlay(&mut native.clone()));

        assert_eq!(report.updated, 1);
        assert_eq!(*native.borrow(), vec!["alpha=1", "alpha=2"]);
        let contributor = chain
            .contributor::<SetterContributor<Recording, u8>>(Kind::Overlay, 0)
            .unwrap();
        assert_eq!(*contributor.value(), 2);
        assert!(contributor.last_target().is_some());
    }

    #[test]
    fn different_key_replaces_and_runs_undo() {
        let native = Props::default();
        let mut chain = ContributionChain::new(KindSet::OVERLAY);
        chain.reconcile(&alpha(1)).unwrap();
        chain.contribute(Target::Overlay(&mut native.clone()));

        let title = Modifier::element(Setter::new("title", KindSet::OVERLAY, 1u8, set_title));
        let report = chain.reconcile(&title).unwrap();
        chain.contribute(Target::Overlay(&mut native.clone()));

        assert_eq!(report.replaced, 1);
        assert_eq!(
            *native.borrow(),
            vec!["alpha=1", "alpha cleared", "title=1"]
        );
    }

    #[test]
    fn undo_is_skipped_when_never_applied() {
        let native = Props::default();
        let mut chain = ContributionChain::new(KindSet::OVERLAY);
        chain.reconcile(&alpha(1)).unwrap();
        chain.detach_all().unwrap();
        assert!(native.borrow().is_empty());
    }
}
