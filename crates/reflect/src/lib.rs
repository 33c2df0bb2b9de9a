//! Type erased value handles carrying capability flags.
//!
//! A [`Value`] wraps any `Send + Sync` value behind an `Arc<dyn Any>` together with its
//! [`TypeKey`] and a [`Flag`] word. Handles marked read-only refuse [`Value::set`]; the
//! [`sudo`] function is the single place allowed to lift that protection.
//!
//! # Example
//!
//! ```
//! use micro_reflect::{sudo, Value};
//!
//! let mut sealed = Value::new(1_u32).into_read_only();
//! assert!(sealed.set(Value::new(2_u32)).is_err());
//!
//! let mut open = sudo(sealed);
//! open.set(Value::new(2_u32)).unwrap();
//! assert_eq!(open.downcast_ref::<u32>(), Some(&2));
//! ```

mod error;
mod flag;
mod sudo;
mod value;

pub use error::ReflectError;
pub use flag::Flag;
pub use sudo::{ensure_layout, sudo};
pub use value::{FieldInfo, TypeKey, Value};
