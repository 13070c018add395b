//! Contribution descriptors and the live contributors they produce.
//!
//! A [`Contribution`] is an immutable, value-comparable description of one
//! behavior. The reconciliation engine turns it into a [`Contributor`], a
//! live object that is kept across generations and applied against native
//! objects whenever the owning node contributes.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::kind::{Kind, KindSet};
use crate::platform::{Native, Platform, Target};

/// Upcast helper so typed descriptors can recover their contributor type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Live object materialized from a descriptor.
///
/// Contributors are applied against the native object of the kind bucket
/// they live in. A contributor created for a multi-kind descriptor exists once
/// per kind and only ever sees targets of that kind.
pub trait Contributor<P: Platform>: AsAny {
    fn contribute(&mut self, target: Target<'_, P>);

    /// Hands over the native object of `kind` when this contributor is the
    /// owning delegate for it.
    fn adopt(&mut self, _kind: Kind) -> Option<Native<P>> {
        None
    }
}

impl<P: Platform> fmt::Debug for dyn Contributor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contributor").finish_non_exhaustive()
    }
}

/// Strongly typed descriptor that can create and update its contributor.
pub trait Contribution<P: Platform>: fmt::Debug + PartialEq + 'static {
    type Contributor: Contributor<P>;

    fn kinds(&self) -> KindSet;

    fn create(&self) -> Self::Contributor;

    fn update(&self, contributor: &mut Self::Contributor);

    fn on_attach(&self, _contributor: &mut Self::Contributor) {}

    fn on_detach(&self, _contributor: &mut Self::Contributor) {}

    /// Whether this descriptor owns the native object of its kinds.
    fn is_delegate(&self) -> bool {
        false
    }

    /// Distinguishes descriptors that share a Rust type but not a behavior,
    /// such as different keys of a generic setter.
    fn variant(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Identity used to decide between an in-place update and a replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContributionType {
    type_id: TypeId,
    variant: &'static str,
}

impl ContributionType {
    pub fn variant(&self) -> &'static str {
        self.variant
    }
}

/// Returned when a contributor is handed to a descriptor that did not
/// create it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeMismatch {
    pub expected: &'static str,
}

/// Type-erased descriptor used by the reconciliation engine.
pub trait AnyContribution<P: Platform>: fmt::Debug {
    fn contribution_type(&self) -> ContributionType;

    fn name(&self) -> &'static str;

    fn kinds(&self) -> KindSet;

    fn is_delegate(&self) -> bool;

    fn create_contributor(&self) -> Box<dyn Contributor<P>>;

    fn update_contributor(&self, contributor: &mut dyn Contributor<P>) -> Result<(), TypeMismatch>;

    fn attach_contributor(&self, contributor: &mut dyn Contributor<P>) -> Result<(), TypeMismatch>;

    fn detach_contributor(&self, contributor: &mut dyn Contributor<P>) -> Result<(), TypeMismatch>;

    /// Value equality across erased descriptors.
    fn equals(&self, other: &dyn AnyContribution<P>) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to an erased descriptor.
pub type Descriptor<P> = Rc<dyn AnyContribution<P>>;

struct TypedContribution<P, E> {
    element: E,
    _platform: PhantomData<fn() -> P>,
}

impl<P, E> TypedContribution<P, E>
where
    P: Platform,
    E: Contribution<P>,
{
    fn new(element: E) -> Self {
        Self {
            element,
            _platform: PhantomData,
        }
    }

    fn typed<'c>(
        contributor: &'c mut dyn Contributor<P>,
    ) -> Result<&'c mut E::Contributor, TypeMismatch> {
        contributor
            .as_any_mut()
            .downcast_mut::<E::Contributor>()
            .ok_or(TypeMismatch {
                expected: type_name::<E>(),
            })
    }
}

impl<P, E> fmt::Debug for TypedContribution<P, E>
where
    P: Platform,
    E: Contribution<P>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.element.fmt(f)
    }
}

impl<P, E> AnyContribution<P> for TypedContribution<P, E>
where
    P: Platform,
    E: Contribution<P>,
{
    fn contribution_type(&self) -> ContributionType {
        ContributionType {
            type_id: TypeId::of::<E>(),
            variant: self.element.variant(),
        }
    }

    fn name(&self) -> &'static str {
        type_name::<E>()
    }

    fn kinds(&self) -> KindSet {
        self.element.kinds()
    }

    fn is_delegate(&self) -> bool {
        self.element.is_delegate()
    }

    fn create_contributor(&self) -> Box<dyn Contributor<P>> {
        Box::new(self.element.create())
    }

    fn update_contributor(&self, contributor: &mut dyn Contributor<P>) -> Result<(), TypeMismatch> {
        self.element.update(Self::typed(contributor)?);
        Ok(())
    }

    fn attach_contributor(&self, contributor: &mut dyn Contributor<P>) -> Result<(), TypeMismatch> {
        self.element.on_attach(Self::typed(contributor)?);
        Ok(())
    }

    fn detach_contributor(&self, contributor: &mut dyn Contributor<P>) -> Result<(), TypeMismatch> {
        self.element.on_detach(Self::typed(contributor)?);
        Ok(())
    }

    fn equals(&self, other: &dyn AnyContribution<P>) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| other.element == self.element)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Wraps a typed descriptor into the shared erased form stored in modifiers.
pub fn contribution<P, E>(element: E) -> Descriptor<P>
where
    P: Platform,
    E: Contribution<P>,
{
    Rc::new(TypedContribution::new(element))
}
