use std::sync::Arc;

use crate::error::ConstructError;
use crate::identity::{Registrable, TypeKey};
use crate::implementation::Arguments;

/// A type the injector can construct from resolved dependencies.
///
/// ```rust
/// use std::sync::Arc;
/// use rinject::{ConstructError, Injectable, Registrable};
///
/// struct Clock;
/// impl Registrable for Clock {}
/// impl Injectable for Clock {
///     type Dependencies = ();
///     fn construct(_: ()) -> Result<Self, ConstructError> {
///         Ok(Clock)
///     }
/// }
///
/// struct Scheduler {
///     clock: Arc<Clock>,
/// }
/// impl Registrable for Scheduler {}
/// impl Injectable for Scheduler {
///     type Dependencies = (Arc<Clock>,);
///     fn construct((clock,): Self::Dependencies) -> Result<Self, ConstructError> {
///         Ok(Scheduler { clock })
///     }
/// }
/// ```
pub trait Injectable: Registrable + Sized + Send + Sync {
    /// Tuple of `Arc<_>` dependencies, resolved before construction.
    type Dependencies: Dependencies;

    fn construct(dependencies: Self::Dependencies) -> Result<Self, ConstructError>;
}

/// Declared constructor arguments.
pub trait Dependencies: Sized {
    /// Keys to resolve, in order.
    fn arguments() -> Vec<TypeKey>;

    fn from_arguments(arguments: &mut Arguments) -> Result<Self, ConstructError>;
}

impl Dependencies for () {
    fn arguments() -> Vec<TypeKey> {
        Vec::new()
    }

    fn from_arguments(_: &mut Arguments) -> Result<Self, ConstructError> {
        Ok(())
    }
}

macro_rules! impl_dependencies {
    ($($name:ident),+) => {
        impl<$($name),+> Dependencies for ($(Arc<$name>,)+)
        where
            $($name: Registrable + ?Sized + Send + Sync,)+
        {
            fn arguments() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$name>()),+]
            }

            fn from_arguments(arguments: &mut Arguments) -> Result<Self, ConstructError> {
                Ok(($(arguments.take::<$name>()?,)+))
            }
        }
    };
}

impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);
impl_dependencies!(A, B, C, D, E, F, G);
impl_dependencies!(A, B, C, D, E, F, G, H);
