use crate::error::ReflectError;
use crate::flag::Flag;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::offset_of;
use std::sync::Arc;

/// Identity of a type: its [`TypeId`] plus the type name for diagnostics.
///
/// Equality and hashing only consider the [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: std::any::type_name::<T>() }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Layout entry of a [`Value`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

/// A type erased, cheaply clonable handle to a shared value.
#[derive(Clone)]
pub struct Value {
    key: TypeKey,
    data: Arc<dyn Any + Send + Sync>,
    flag: Flag,
}

impl Value {
    /// Field layout of the handle, consumed by [`sudo`](crate::sudo).
    pub const FIELDS: &'static [FieldInfo] = &[
        FieldInfo { name: "key", offset: offset_of!(Value, key), size: size_of::<TypeKey>() },
        FieldInfo { name: "data", offset: offset_of!(Value, data), size: size_of::<Arc<dyn Any + Send + Sync>>() },
        FieldInfo { name: "flag", offset: offset_of!(Value, flag), size: size_of::<Flag>() },
    ];

    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self { key: TypeKey::of::<T>(), data: value, flag: Flag::EMPTY }
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    #[inline]
    pub fn flag(&self) -> Flag {
        self.flag
    }

    #[must_use]
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flag = self.flag.union(flag);
        self
    }

    /// Seals the handle; later [`Value::set`] calls fail until it passes through
    /// [`sudo`](crate::sudo).
    #[must_use]
    pub fn into_read_only(self) -> Self {
        self.with_flag(Flag::STICKY_RO)
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.flag.is_read_only()
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.data.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.data).downcast::<T>().ok()
    }

    /// Replaces the held value with the one behind `other`.
    ///
    /// # Errors
    /// [`ReflectError::ReadOnly`] on a sealed handle, [`ReflectError::TypeMismatch`] when
    /// `other` holds a different type.
    pub fn set(&mut self, other: Value) -> Result<(), ReflectError> {
        if self.is_read_only() {
            return Err(ReflectError::read_only(self.type_name()));
        }

        if self.key != other.key {
            return Err(ReflectError::type_mismatch(self.type_name(), other.type_name()));
        }

        self.data = other.data;
        Ok(())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value").field("type", &self.key).field("flag", &self.flag).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{TypeKey, Value};
    use crate::{Flag, ReflectError};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    struct User {
        name: String,
    }

    #[test]
    fn test_type_key_ignores_name() {
        assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
        assert_ne!(TypeKey::of::<u32>(), TypeKey::of::<i32>());
        assert_eq!(TypeKey::of::<String>().name(), "alloc::string::String");
    }

    #[test]
    fn test_downcast() {
        let value = Value::new(User { name: "bingoo".into() });

        assert!(value.is::<User>());
        assert!(!value.is::<String>());
        assert_eq!(value.downcast_ref::<User>().map(|u| u.name.as_str()), Some("bingoo"));
        assert!(value.downcast_ref::<String>().is_none());

        let shared = value.downcast_arc::<User>().unwrap();
        let again = value.downcast_arc::<User>().unwrap();
        assert!(Arc::ptr_eq(&shared, &again));
    }

    #[test]
    fn test_set() {
        let mut value = Value::new(1_i64);
        value.set(Value::new(2_i64)).unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&2));

        let err = value.set(Value::new("x")).unwrap_err();
        assert!(matches!(err, ReflectError::TypeMismatch { expected: "i64", .. }));
    }

    #[test]
    fn test_set_read_only() {
        let mut value = Value::new(1_i64).into_read_only();
        assert_eq!(value.flag(), Flag::STICKY_RO);
        assert_eq!(value.set(Value::new(2_i64)), Err(ReflectError::read_only("i64")));
        assert_eq!(value.downcast_ref::<i64>(), Some(&1));
    }

    #[test]
    fn test_fields() {
        let names = Value::FIELDS.iter().map(|f| f.name).collect::<Vec<_>>();
        assert_eq!(names, ["key", "data", "flag"]);
    }
}
