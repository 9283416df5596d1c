//! Conversions between Rust values and [`Dynamic`].
//!
//! - [`FromDynamic`]: extract a Rust value from an argument or output
//! - [`IntoDynamic`]: turn a Rust value into a [`Dynamic`]
//!
//! Decorator arguments arrive as literals, so the conversions are lenient
//! where a literal can stand for the target: an integer converts to a
//! float, and a number of seconds (integer or float) converts to a
//! [`Duration`].
//!
//! ```ignore
//! let limit: u64 = u64::from_dynamic(&args[0])?;
//! let delay: Duration = Duration::from_dynamic(&Dynamic::Float(0.5))?;
//! ```

use std::time::Duration;

use crate::runtime::{Callable, Dynamic};
use crate::ConversionError;

/// Extract a value from a [`Dynamic`].
pub trait FromDynamic: Sized {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError>;
}

/// Convert a value into a [`Dynamic`].
pub trait IntoDynamic {
    fn into_dynamic(self) -> Dynamic;
}

fn mismatch(expected: &'static str, value: &Dynamic) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: value.type_name(),
    }
}

// ============================================================================
// Integers
// ============================================================================

macro_rules! impl_dynamic_int {
    ($($ty:ty),*) => {
        $(
            impl FromDynamic for $ty {
                fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
                    match value {
                        Dynamic::Int(v) => <$ty>::try_from(*v).map_err(|_| {
                            ConversionError::IntegerOverflow {
                                value: *v,
                                target_type: stringify!($ty),
                            }
                        }),
                        _ => Err(mismatch("int", value)),
                    }
                }
            }
        )*
    };
}

impl_dynamic_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

macro_rules! impl_into_dynamic_lossless {
    ($($ty:ty),*) => {
        $(
            impl IntoDynamic for $ty {
                fn into_dynamic(self) -> Dynamic {
                    Dynamic::Int(i64::from(self))
                }
            }
        )*
    };
}

impl_into_dynamic_lossless!(i8, i16, i32, i64, u8, u16, u32);

// Counters beyond i64::MAX saturate
impl IntoDynamic for u64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Int(i64::try_from(self).unwrap_or(i64::MAX))
    }
}

impl IntoDynamic for usize {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Int(i64::try_from(self).unwrap_or(i64::MAX))
    }
}

// ============================================================================
// Floats
// ============================================================================

impl FromDynamic for f64 {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Float(v) => Ok(*v),
            Dynamic::Int(v) => Ok(*v as f64),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl IntoDynamic for f64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Float(self)
    }
}

impl IntoDynamic for f32 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Float(f64::from(self))
    }
}

// ============================================================================
// Durations
// ============================================================================

/// Seconds, as an integer or a float. Negative, NaN and infinite values are
/// rejected.
impl FromDynamic for Duration {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        let seconds = match value {
            Dynamic::Int(v) => *v as f64,
            Dynamic::Float(v) => *v,
            _ => return Err(mismatch("seconds", value)),
        };
        Duration::try_from_secs_f64(seconds).map_err(|_| ConversionError::FloatConversion {
            value: seconds,
            target_type: "Duration",
        })
    }
}

impl IntoDynamic for Duration {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Float(self.as_secs_f64())
    }
}

// ============================================================================
// Bool, unit, strings
// ============================================================================

impl FromDynamic for bool {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Bool(v) => Ok(*v),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl IntoDynamic for bool {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Bool(self)
    }
}

impl FromDynamic for () {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Void => Ok(()),
            _ => Err(mismatch("void", value)),
        }
    }
}

impl IntoDynamic for () {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Void
    }
}

impl FromDynamic for String {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            _ => Err(mismatch("string", value)),
        }
    }
}

impl IntoDynamic for String {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self)
    }
}

impl IntoDynamic for &str {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self.to_owned())
    }
}

// ============================================================================
// Containers and passthrough
// ============================================================================

impl<T: FromDynamic> FromDynamic for Vec<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::List(items) => items.iter().map(T::from_dynamic).collect(),
            _ => Err(mismatch("list", value)),
        }
    }
}

impl<T: IntoDynamic> IntoDynamic for Vec<T> {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::List(self.into_iter().map(IntoDynamic::into_dynamic).collect())
    }
}

impl<T: FromDynamic> FromDynamic for Option<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Null | Dynamic::Void => Ok(None),
            other => T::from_dynamic(other).map(Some),
        }
    }
}

impl FromDynamic for Dynamic {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoDynamic for Dynamic {
    fn into_dynamic(self) -> Dynamic {
        self
    }
}

impl FromDynamic for Callable {
    fn from_dynamic(value: &Dynamic) -> Result<Self, ConversionError> {
        match value {
            Dynamic::Function(callable) => Ok(callable.clone()),
            _ => Err(mismatch("function", value)),
        }
    }
}

impl IntoDynamic for Callable {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Function(self)
    }
}
