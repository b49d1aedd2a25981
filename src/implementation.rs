//! Constructible units and their resolved argument lists.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::ConstructError;
use crate::identity::{Registrable, TypeKey};
use crate::interfaces::injectable::{Dependencies, Injectable};

/// A type-erased resolved value. The concrete type inside is always
/// `Arc<T>` for the key's type `T`, which lets trait objects go through the
/// same path as sized types.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Constructor = dyn Fn(&mut Arguments) -> Result<Instance, ConstructError> + Send + Sync;

pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    Arc::new(value)
}

pub(crate) fn downcast<T: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Option<Arc<T>> {
    instance.downcast_ref::<Arc<T>>().cloned()
}

/// Resolved constructor arguments, in declaration order.
pub struct Arguments {
    values: Vec<(TypeKey, Instance)>,
    cursor: usize,
}

impl Arguments {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Arguments {
            values: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    pub(crate) fn push(&mut self, key: TypeKey, instance: Instance) {
        self.values.push((key, instance));
    }

    /// Takes the next argument as an `Arc<T>`.
    pub fn take<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, ConstructError> {
        let (key, instance) = self
            .values
            .get(self.cursor)
            .ok_or_else(|| format!("missing argument #{} of type '{}'", self.cursor, type_name::<T>()))?;
        let value = downcast::<T>(instance).ok_or_else(|| {
            format!(
                "argument #{} resolved from '{}' is not a '{}'",
                self.cursor,
                key,
                type_name::<T>()
            )
        })?;
        self.cursor += 1;
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.values.iter().map(|(key, _)| key.name()))
            .finish()
    }
}

/// Construction logic for one implementation type plus the argument keys
/// it declares.
#[derive(Clone)]
pub struct Implementation {
    type_id: TypeId,
    name: &'static str,
    arguments: Vec<TypeKey>,
    constructor: Arc<Constructor>,
}

impl Implementation {
    /// Implementation backed by [`Injectable::construct`].
    pub fn of<I: Injectable>() -> Self {
        Implementation {
            type_id: TypeId::of::<I>(),
            name: type_name::<I>(),
            arguments: I::Dependencies::arguments(),
            constructor: Arc::new(|arguments: &mut Arguments| {
                let dependencies = I::Dependencies::from_arguments(arguments)?;
                let instance = I::construct(dependencies)?;
                Ok(erase(Arc::new(instance)))
            }),
        }
    }

    /// Implementation backed by a zero-argument closure.
    pub fn from_fn<I, F>(constructor: F) -> Self
    where
        I: Registrable + Send + Sync,
        F: Fn() -> Result<I, ConstructError> + Send + Sync + 'static,
    {
        Implementation {
            type_id: TypeId::of::<I>(),
            name: type_name::<I>(),
            arguments: Vec::new(),
            constructor: Arc::new(move |_: &mut Arguments| Ok(erase(Arc::new(constructor()?)))),
        }
    }

    /// Implementation that hands out a pre-built instance.
    pub fn from_instance<I: Registrable + Send + Sync>(instance: Arc<I>) -> Self {
        Implementation {
            type_id: TypeId::of::<I>(),
            name: type_name::<I>(),
            arguments: Vec::new(),
            constructor: Arc::new(move |_: &mut Arguments| Ok(erase(instance.clone()))),
        }
    }

    /// Identity of the implementation type; the singleton cache keys on it.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arguments(&self) -> &[TypeKey] {
        &self.arguments
    }

    pub(crate) fn construct(&self, arguments: &mut Arguments) -> Result<Instance, ConstructError> {
        (self.constructor)(arguments)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish()
    }
}
