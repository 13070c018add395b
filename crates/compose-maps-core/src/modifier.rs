//! Persistent modifier chains.
//!
//! A [`Modifier`] is an immutable list of contribution descriptors built with
//! [`Modifier::then`]. Chains share structure, so extending a chain never
//! copies the descriptors it already holds. The UI layer builds a fresh chain
//! every pass and hands it to a node, which reconciles it against the chain it
//! saw last time.

use std::fmt;
use std::rc::Rc;

use crate::contribution::{contribution, Contribution, Descriptor};
use crate::kind::Kind;
use crate::platform::Platform;

enum Link<P: Platform> {
    Element(Descriptor<P>),
    Combined { head: Modifier<P>, tail: Modifier<P> },
}

/// Ordered, immutable chain of contribution descriptors.
pub struct Modifier<P: Platform> {
    link: Option<Rc<Link<P>>>,
}

impl<P: Platform> Modifier<P> {
    /// The canonical empty chain.
    pub const fn empty() -> Self {
        Self { link: None }
    }

    /// A chain holding a single typed descriptor.
    pub fn element<E: Contribution<P>>(element: E) -> Self {
        Self::from_descriptor(contribution(element))
    }

    pub fn from_descriptor(descriptor: Descriptor<P>) -> Self {
        Self {
            link: Some(Rc::new(Link::Element(descriptor))),
        }
    }

    /// Appends `element` to this chain.
    pub fn with<E: Contribution<P>>(&self, element: E) -> Self {
        self.then(Self::element(element))
    }

    /// Returns a chain representing `self` followed by `next`.
    pub fn then(&self, next: Modifier<P>) -> Modifier<P> {
        if self.is_empty() {
            return next;
        }
        if next.is_empty() {
            return self.clone();
        }
        Modifier {
            link: Some(Rc::new(Link::Combined {
                head: self.clone(),
                tail: next,
            })),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.link.is_none()
    }

    /// Visits every descriptor in declaration order.
    pub fn fold<R>(&self, initial: R, mut operation: impl FnMut(R, &Descriptor<P>) -> R) -> R {
        let mut acc = initial;
        let mut pending: Vec<&Modifier<P>> = vec![self];
        while let Some(modifier) = pending.pop() {
            match modifier.link.as_deref() {
                None => {}
                Some(Link::Element(descriptor)) => acc = operation(acc, descriptor),
                Some(Link::Combined { head, tail }) => {
                    pending.push(tail);
                    pending.push(head);
                }
            }
        }
        acc
    }

    pub fn any(&self, mut predicate: impl FnMut(&Descriptor<P>) -> bool) -> bool {
        self.fold(false, |found, descriptor| found || predicate(descriptor))
    }

    pub fn all(&self, mut predicate: impl FnMut(&Descriptor<P>) -> bool) -> bool {
        self.fold(true, |ok, descriptor| ok && predicate(descriptor))
    }

    pub fn len(&self) -> usize {
        self.fold(0, |count, _| count + 1)
    }

    /// Collects the descriptors in declaration order.
    pub fn descriptors(&self) -> Vec<Descriptor<P>> {
        self.fold(Vec::new(), |mut acc, descriptor| {
            acc.push(Rc::clone(descriptor));
            acc
        })
    }

    /// Collects the descriptors that apply to `kind`.
    pub fn descriptors_of(&self, kind: Kind) -> Vec<Descriptor<P>> {
        self.fold(Vec::new(), |mut acc, descriptor| {
            if descriptor.kinds().contains_kind(kind) {
                acc.push(Rc::clone(descriptor));
            }
            acc
        })
    }
}

impl<P: Platform> Clone for Modifier<P> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
        }
    }
}

impl<P: Platform> Default for Modifier<P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<P: Platform> PartialEq for Modifier<P> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((lhs, rhs)) = pending.pop() {
            match (lhs.link.as_ref(), rhs.link.as_ref()) {
                (None, None) => {}
                (Some(a), Some(b)) if Rc::ptr_eq(a, b) => {}
                (Some(a), Some(b)) => match (&**a, &**b) {
                    (Link::Element(a), Link::Element(b)) => {
                        if !a.equals(&**b) {
                            return false;
                        }
                    }
                    (
                        Link::Combined { head: ah, tail: at },
                        Link::Combined { head: bh, tail: bt },
                    ) => {
                        pending.push((ah, bh));
                        pending.push((at, bt));
                    }
                    _ => return false,
                },
                _ => return false,
            }
        }
        true
    }
}

impl<P: Platform> fmt::Debug for Modifier<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Modifier::Empty");
        }
        f.debug_list().entries(self.descriptors()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contribution::Contributor;
    use crate::kind::KindSet;
    use crate::platform::Target;

    struct Unit;

    impl Platform for Unit {
        type Surface = ();
        type Root = ();
        type Overlay = ();
    }

    struct Noop;

    impl Contributor<Unit> for Noop {
        fn contribute(&mut self, _target: Target<'_, Unit>) {}
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        name: &'static str,
        kinds: KindSet,
    }

    fn tag(name: &'static str) -> Modifier<Unit> {
        Modifier::element(Tag {
            name,
            kinds: KindSet::OVERLAY,
        })
    }

    impl Contribution<Unit> for Tag {
        type Contributor = Noop;

        fn kinds(&self) -> KindSet {
            self.kinds
        }

        fn create(&self) -> Noop {
            Noop
        }

        fn update(&self, _contributor: &mut Noop) {}
    }

    fn names(modifier: &Modifier<Unit>) -> Vec<&'static str> {
        modifier.fold(Vec::new(), |mut acc, descriptor| {
            // Descriptors debug-print as their typed element.
            let text = format!("{descriptor:?}");
            let name = ["a", "b", "c", "d"]
                .into_iter()
                .find(|name| text.contains(&format!("name: \"{name}\"")))
                .unwrap_or("?");
            acc.push(name);
            acc
        })
    }

    #[test]
    fn then_with_empty_is_identity() {
        let a = tag("a");
        let empty = Modifier::<Unit>::empty();

        assert!(empty.then(empty.clone()).is_empty());
        assert_eq!(a.then(Modifier::empty()), a);
        assert_eq!(Modifier::empty().then(a.clone()), a);
    }

    #[test]
    fn fold_visits_in_declaration_order() {
        let left = tag("a").then(tag("b"));
        let right = tag("c").then(tag("d"));
        let chain = left.then(right);

        assert_eq!(chain.len(), 4);
        assert_eq!(names(&chain), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn then_shares_structure_and_leaves_operands_untouched() {
        let base = tag("a");
        let extended = base.then(tag("b"));
        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_ne!(base, extended);
    }

    #[test]
    fn equality_is_structural() {
        let first = tag("a").then(tag("b"));
        let second = tag("a").then(tag("b"));
        let third = tag("a").then(tag("c"));

        assert_eq!(first, second);
        assert_ne!(first, third);
        assert_ne!(first, tag("a"));
        assert_eq!(Modifier::<Unit>::empty(), Modifier::default());
    }

    #[test]
    fn queries_are_built_on_fold() {
        let chain = tag("a").then(Modifier::element(Tag {
            name: "b",
            kinds: KindSet::ROOT | KindSet::SURFACE,
        }));

        assert_eq!(chain.descriptors_of(Kind::Overlay).len(), 1);
        assert_eq!(chain.descriptors_of(Kind::Root).len(), 1);
        assert!(chain.any(|d| d.kinds().contains_kind(Kind::Surface)));
        assert!(!chain.all(|d| d.kinds().contains_kind(Kind::Overlay)));
        assert_eq!(chain.descriptors().len(), 2);
    }
}
