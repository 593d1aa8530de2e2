//! Typed attribute values attached to errors.
//!
//! [`Attr`] is a `(key, Value)` pair. [`Value`] is a closed set of variants so
//! that typed lookups ([`FromValue`]) can report a mismatch as an ordinary
//! result instead of panicking.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, SecondsFormat, Utc};

// ============================================================================
// AnyValue Trait - combines Any + Debug in a single trait object
// ============================================================================

/// Trait combining `Any` and `Debug` for opaque attribute values.
///
/// Anything that is `Debug + Send + Sync + 'static` can be stored through
/// [`Attr::any`] and later recovered with [`Value::downcast_ref`].
pub trait AnyValue: std::any::Any + fmt::Debug + Send + Sync {
    /// Get a reference to self as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Get the type name for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: std::any::Any + fmt::Debug + Send + Sync> AnyValue for T {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// ============================================================================
// Kind / Value
// ============================================================================

/// The variant of a [`Value`], used in lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    Time,
    Duration,
    Group,
    Any,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Time => "time",
            Kind::Duration => "duration",
            Kind::Group => "group",
            Kind::Any => "any",
        };
        f.write_str(name)
    }
}

/// An attribute value.
#[derive(Clone)]
#[non_exhaustive]
pub enum Value {
    /// Text. `Cow` keeps static strings allocation-free.
    String(Cow<'static, str>),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Time(SystemTime),
    Duration(Duration),
    /// Nested attributes, rendered as `[k=v k=v]`.
    Group(Vec<Attr>),
    /// Opaque value formatted via Debug.
    Any(Arc<dyn AnyValue>),
}

impl Value {
    /// Which variant this is.
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::Bool(_) => Kind::Bool,
            Value::Time(_) => Kind::Time,
            Value::Duration(_) => Kind::Duration,
            Value::Group(_) => Kind::Group,
            Value::Any(_) => Kind::Any,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Downcast an opaque value to its concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            // (**v) so as_any is called on the trait object, not the Arc
            Value::Any(v) => (**v).as_any().downcast_ref(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Group(a), Value::Group(b)) => a == b,
            // Opaque values only compare equal to themselves.
            (Value::Any(a), Value::Any(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Any(v) => write!(f, "{:?}", &**v),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{}", v),
            Value::Uint(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Time(t) => f.write_str(&format_time(*t)),
            Value::Duration(d) => write!(f, "{:?}", d),
            Value::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", attr)?;
                }
                f.write_str("]")
            }
            Value::Any(v) => write!(f, "{:?}", &**v),
        }
    }
}

pub(crate) fn format_time(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Self {
        Value::String(Cow::Borrowed(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Cow::Owned(v))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(v: Cow<'static, str>) -> Self {
        Value::String(v)
    }
}

macro_rules! value_from {
    ($variant:ident: $target:ty => $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }
        )+
    };
}

value_from!(Int: i64 => i8, i16, i32, i64);
value_from!(Uint: u64 => u8, u16, u32, u64);
value_from!(Float: f64 => f32, f64);

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint(v as u64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<SystemTime> for Value {
    fn from(v: SystemTime) -> Self {
        Value::Time(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(v: Vec<Attr>) -> Self {
        Value::Group(v)
    }
}

// ============================================================================
// Attr
// ============================================================================

/// A key/value pair of error metadata.
///
/// ```rust
/// use attrerr::Attr;
/// use std::time::Duration;
///
/// let a = Attr::uint("device_id", 9);
/// assert_eq!(a.key(), "device_id");
/// assert_eq!(a.to_string(), "device_id=9");
///
/// let b = Attr::new("elapsed", Duration::from_millis(1500));
/// assert_eq!(b.to_string(), "elapsed=1.5s");
/// ```
#[derive(Clone, PartialEq)]
pub struct Attr {
    key: Cow<'static, str>,
    value: Value,
}

impl Attr {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, Value::Int(value))
    }

    pub fn uint(key: impl Into<Cow<'static, str>>, value: u64) -> Self {
        Self::new(key, Value::Uint(value))
    }

    pub fn float(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, Value::Float(value))
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn time(key: impl Into<Cow<'static, str>>, value: SystemTime) -> Self {
        Self::new(key, Value::Time(value))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    pub fn group(key: impl Into<Cow<'static, str>>, attrs: impl IntoIterator<Item = Attr>) -> Self {
        Self::new(key, Value::Group(attrs.into_iter().collect()))
    }

    /// Store an opaque value, formatted with Debug and retrievable by downcast.
    pub fn any<T: AnyValue>(key: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::new(key, Value::Any(Arc::new(value)))
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The key as stored, cheap to clone when it was a `&'static str`.
    #[inline]
    pub(crate) fn key_cow(&self) -> &Cow<'static, str> {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (Cow<'static, str>, Value) {
        (self.key, self.value)
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.key, self.value)
    }
}

impl<K: Into<Cow<'static, str>>, V: Into<Value>> From<(K, V)> for Attr {
    fn from((key, value): (K, V)) -> Self {
        Attr::new(key, value)
    }
}

/// Build a `Vec<Attr>` from `key => value` pairs.
///
/// ```rust
/// let attrs = attrerr::attrs!["user" => "ada", "retries" => 3u64];
/// assert_eq!(attrs.len(), 2);
/// assert_eq!(attrs[1].to_string(), "retries=3");
/// ```
#[macro_export]
macro_rules! attrs {
    () => { ::std::vec::Vec::<$crate::Attr>::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Attr::new($key, $value)),+]
    };
}

// ============================================================================
// FromValue - typed extraction
// ============================================================================

/// Types that can be read back out of a [`Value`].
pub trait FromValue: Sized {
    /// The variant this type is stored as.
    const KIND: Kind;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! from_value {
    ($t:ty, $kind:ident, $v:ident => $e:expr) => {
        impl FromValue for $t {
            const KIND: Kind = Kind::$kind;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$kind($v) => Some($e),
                    _ => None,
                }
            }
        }
    };
}

from_value!(String, String, s => s.to_string());
from_value!(i64, Int, v => *v);
from_value!(u64, Uint, v => *v);
from_value!(f64, Float, v => *v);
from_value!(bool, Bool, v => *v);
from_value!(SystemTime, Time, v => *v);
from_value!(Duration, Duration, v => *v);
from_value!(Vec<Attr>, Group, v => v.clone());

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{Attr, Value, format_time};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    impl Serialize for Value {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Value::String(s) => serializer.serialize_str(s),
                Value::Int(v) => serializer.serialize_i64(*v),
                Value::Uint(v) => serializer.serialize_u64(*v),
                Value::Float(v) => serializer.serialize_f64(*v),
                Value::Bool(v) => serializer.serialize_bool(*v),
                Value::Time(t) => serializer.serialize_str(&format_time(*t)),
                Value::Duration(d) => serializer.serialize_str(&format!("{:?}", d)),
                Value::Group(attrs) => {
                    let mut map = serializer.serialize_map(Some(attrs.len()))?;
                    for attr in attrs {
                        map.serialize_entry(attr.key(), attr.value())?;
                    }
                    map.end()
                }
                Value::Any(v) => serializer.serialize_str(&format!("{:?}", &**v)),
            }
        }
    }

    impl Serialize for Attr {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(self.key(), self.value())?;
            map.end()
        }
    }
}
