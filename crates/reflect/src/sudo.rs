use crate::error::ReflectError;
use crate::flag::Flag;
use crate::value::Value;
use once_cell::sync::Lazy;

const FLAG_FIELD: &str = "flag";

// resolved once per process, panics when the layout has no usable flag field
static FLAG_OFFSET: Lazy<usize> = Lazy::new(|| match locate_flag() {
    Ok(offset) => offset,
    Err(e) => panic!("{e}, micro-reflect does not support this build"),
});

fn locate_flag() -> Result<usize, ReflectError> {
    let field = Value::FIELDS
        .iter()
        .find(|field| field.name == FLAG_FIELD)
        .ok_or(ReflectError::MissingField { name: FLAG_FIELD })?;

    if field.size != size_of::<Flag>() {
        return Err(ReflectError::FieldLayout { name: FLAG_FIELD, expected: size_of::<Flag>(), actual: field.size });
    }

    Ok(field.offset)
}

/// Resolves the flag offset now.
///
/// Call it during startup so a broken layout fails the process before any request is served.
pub fn ensure_layout() {
    Lazy::force(&FLAG_OFFSET);
}

/// Returns `value` with its read-only bits cleared, so [`Value::set`] succeeds on it.
///
/// Every other flag bit is kept. Clearing an already clear handle is a no-op.
///
/// # Panics
/// When the flag field cannot be located in [`Value::FIELDS`].
#[must_use]
pub fn sudo(mut value: Value) -> Value {
    let offset = *FLAG_OFFSET;

    // SAFETY: `offset` is the `offset_of!` of `Value::flag`, whose size was checked to match
    // `Flag`, so the pointer stays inside `value`, is aligned for `Flag`, and `value` is owned
    // here with no other borrow alive.
    unsafe {
        let flag = (&raw mut value).cast::<u8>().add(offset).cast::<Flag>();
        flag.write(flag.read().difference(Flag::RO));
    }

    value
}
