//! The per request store of provider outputs.
//!
//! Every slot is sealed read-only once written, so nothing downstream can swap a provider
//! output through the [`Value`] handle it was given. Only the store itself replaces a slot,
//! when a later provider produces the same type, by unlocking it with [`sudo`].

use micro_reflect::{ReflectError, TypeKey, Value, sudo};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Values {
    slots: HashMap<TypeKey, Value>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: TypeKey) -> Option<&Value> {
        self.slots.get(&key)
    }

    /// Clones out the stored value of type `T`
    pub fn get_as<T: Clone + 'static>(&self) -> Option<T> {
        self.get(TypeKey::of::<T>()).and_then(|value| value.downcast_ref::<T>()).cloned()
    }

    #[inline]
    pub fn contains(&self, key: TypeKey) -> bool {
        self.slots.contains_key(&key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores `value` under `key`, replacing any earlier value of that key.
    ///
    /// # Errors
    /// [`ReflectError::TypeMismatch`] when `value` does not hold the type `key` names.
    pub(crate) fn store(&mut self, key: TypeKey, value: Value) -> Result<(), ReflectError> {
        match self.slots.entry(key) {
            Entry::Vacant(entry) => {
                if value.key() != key {
                    return Err(ReflectError::type_mismatch(key.name(), value.type_name()));
                }
                entry.insert(value.into_read_only());
            }
            Entry::Occupied(mut entry) => {
                debug!(type_name = key.name(), "overwriting provider output");
                let mut slot = sudo(entry.get().clone());
                slot.set(value)?;
                entry.insert(slot.into_read_only());
            }
        }
        Ok(())
    }
}
