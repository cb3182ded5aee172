/// A dynamic view of a member value.
///
/// Accessors on shapes return a [`Value`] borrowing from the owner, so the
/// comparison engine can walk object graphs without cloning nested shapes.
/// Scalars are stored inline; nested shapes are borrowed as `&dyn Shape` and
/// dispatched on their runtime type.
///
/// The integer/float distinction mirrors the declared numeric types closely
/// enough for convention lookups on container elements, which only know the
/// runtime value.
use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use uuid::Uuid;

use crate::shape::Shape;
use crate::types::{TypeCategory, TypeDesc, short_type_name};

/// A value read from a shape member, or an element of a container member.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (fits in i64).
    Integer(i64),
    /// Unsigned integer that does not fit in i64.
    UnsignedInteger(u64),
    /// IEEE 754 double-precision float.
    Float(f64),
    /// UTF-8 text, borrowed where possible.
    Text(Cow<'a, str>),
    /// UUID.
    Uuid(Uuid),
    /// Timestamp with offset.
    DateTime(DateTime<FixedOffset>),
    /// Calendar date.
    Date(NaiveDate),
    /// Signed duration.
    Duration(TimeDelta),
    /// A field-less enumeration variant.
    Enum(EnumValue),
    /// Ordered sequence of values.
    Seq(Sequence<'a>),
    /// Keyed collection of values.
    Map(Mapping<'a>),
    /// A nested shape.
    Entity(&'a dyn Shape),
}

/// A variant of a field-less enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Descriptor of the enumeration type.
    pub ty: TypeDesc,
    /// Variant name.
    pub variant: String,
}

/// An ordered sequence.
///
/// `counted` is `false` for forward-only streams whose cardinality is not
/// known up front; the collection differencer skips the count check for them.
#[derive(Debug, Clone)]
pub struct Sequence<'a> {
    /// Elements in iteration order.
    pub items: Vec<Value<'a>>,
    /// Whether the sequence can report its length.
    pub counted: bool,
}

impl<'a> Sequence<'a> {
    /// Number of elements, if the sequence reports one.
    pub fn count(&self) -> Option<usize> {
        self.counted.then_some(self.items.len())
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A keyed collection preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct Mapping<'a> {
    /// Key/value pairs in insertion order.
    pub entries: Vec<(Value<'a>, Value<'a>)>,
}

impl<'a> Mapping<'a> {
    /// Looks up the value stored under `key`.
    pub fn get(&self, key: &Value<'_>) -> Option<&Value<'a>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &Value<'_>) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> Value<'a> {
    /// Borrows a nested shape.
    pub fn entity(shape: &'a dyn Shape) -> Self {
        Self::Entity(shape)
    }

    /// Borrows an optional nested shape; `None` becomes [`Value::Null`].
    pub fn entity_opt<T: Shape>(shape: Option<&'a T>) -> Self {
        match shape {
            Some(s) => Self::Entity(s),
            None => Self::Null,
        }
    }

    /// A counted sequence of nested shapes.
    pub fn list<T: Shape>(items: &'a [T]) -> Self {
        Self::Seq(Sequence {
            items: items.iter().map(|item| Self::Entity(item)).collect(),
            counted: true,
        })
    }

    /// An optional counted sequence of nested shapes.
    pub fn list_opt<T: Shape>(items: Option<&'a [T]>) -> Self {
        items.map_or(Self::Null, Self::list)
    }

    /// A counted sequence of values.
    pub fn seq<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<'a>>,
    {
        Self::Seq(Sequence {
            items: items.into_iter().map(Into::into).collect(),
            counted: true,
        })
    }

    /// A forward-only sequence that cannot report its length.
    pub fn stream<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<'a>>,
    {
        Self::Seq(Sequence {
            items: items.into_iter().map(Into::into).collect(),
            counted: false,
        })
    }

    /// A keyed collection.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value<'a>>,
        V: Into<Value<'a>>,
    {
        Self::Map(Mapping {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        })
    }

    /// A variant of a field-less enumeration, named by its `Debug` output.
    pub fn enumeration<E: fmt::Debug + 'static>(variant: &E) -> Self {
        Self::Enum(EnumValue {
            ty: TypeDesc::for_type::<E>(
                short_type_name(std::any::type_name::<E>()),
                TypeCategory::Enum,
            ),
            variant: format!("{variant:?}"),
        })
    }

    /// Returns `true` if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text if this is [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::Uuid(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Duration(_)
            | Self::Enum(_)
            | Self::Seq(_)
            | Self::Map(_)
            | Self::Entity(_) => None,
        }
    }

    /// Returns the i64 value if this is an integer type.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::UnsignedInteger(n) => i64::try_from(*n).ok(),
            Self::Null
            | Self::Bool(_)
            | Self::Float(_)
            | Self::Text(_)
            | Self::Uuid(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Duration(_)
            | Self::Enum(_)
            | Self::Seq(_)
            | Self::Map(_)
            | Self::Entity(_) => None,
        }
    }

    /// Returns the f64 value if this is a float or an integer type.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(n) => Some(*n as f64),
            Self::UnsignedInteger(n) => Some(*n as f64),
            Self::Null
            | Self::Bool(_)
            | Self::Text(_)
            | Self::Uuid(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Duration(_)
            | Self::Enum(_)
            | Self::Seq(_)
            | Self::Map(_)
            | Self::Entity(_) => None,
        }
    }

    /// Returns the bool value if this is [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Null
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::Text(_)
            | Self::Uuid(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Duration(_)
            | Self::Enum(_)
            | Self::Seq(_)
            | Self::Map(_)
            | Self::Entity(_) => None,
        }
    }

    /// Returns the nested shape if this is [`Value::Entity`].
    pub fn as_entity(&self) -> Option<&'a dyn Shape> {
        match self {
            Self::Entity(s) => Some(*s),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::Text(_)
            | Self::Uuid(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Duration(_)
            | Self::Enum(_)
            | Self::Seq(_)
            | Self::Map(_) => None,
        }
    }

    /// Returns the sequence if this is [`Value::Seq`].
    pub fn as_seq(&self) -> Option<&Sequence<'a>> {
        match self {
            Self::Seq(s) => Some(s),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::Text(_)
            | Self::Uuid(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Duration(_)
            | Self::Enum(_)
            | Self::Map(_)
            | Self::Entity(_) => None,
        }
    }

    /// Returns the mapping if this is [`Value::Map`].
    pub fn as_map(&self) -> Option<&Mapping<'a>> {
        match self {
            Self::Map(m) => Some(m),
            Self::Null
            | Self::Bool(_)
            | Self::Integer(_)
            | Self::UnsignedInteger(_)
            | Self::Float(_)
            | Self::Text(_)
            | Self::Uuid(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Duration(_)
            | Self::Enum(_)
            | Self::Seq(_)
            | Self::Entity(_) => None,
        }
    }

    /// Descriptor of the runtime type carried by this value.
    ///
    /// Integers report `i64`/`u64` and floats report `f64` regardless of the
    /// declared width; nested shapes report their exact shape.
    pub fn runtime_type(&self) -> TypeDesc {
        match self {
            Self::Null => TypeDesc::dynamic(),
            Self::Bool(_) => TypeDesc::of::<bool>(),
            Self::Integer(_) => TypeDesc::of::<i64>(),
            Self::UnsignedInteger(_) => TypeDesc::of::<u64>(),
            Self::Float(_) => TypeDesc::of::<f64>(),
            Self::Text(_) => TypeDesc::of::<String>(),
            Self::Uuid(_) => TypeDesc::of::<Uuid>(),
            Self::DateTime(_) => TypeDesc::of::<DateTime<FixedOffset>>(),
            Self::Date(_) => TypeDesc::of::<NaiveDate>(),
            Self::Duration(_) => TypeDesc::of::<TimeDelta>(),
            Self::Enum(e) => e.ty.clone(),
            Self::Seq(_) => TypeDesc::list_of(TypeDesc::dynamic()),
            Self::Map(_) => TypeDesc::map_of(TypeDesc::dynamic(), TypeDesc::dynamic()),
            Self::Entity(s) => s.shape_type(),
        }
    }

    /// Converts borrowed text into owned text so the value outlives its owner.
    ///
    /// Nested shapes cannot be detached and become their display form.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Integer(i) => Value::Integer(i),
            Self::UnsignedInteger(u) => Value::UnsignedInteger(u),
            Self::Float(f) => Value::Float(f),
            Self::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Self::Uuid(u) => Value::Uuid(u),
            Self::DateTime(d) => Value::DateTime(d),
            Self::Date(d) => Value::Date(d),
            Self::Duration(d) => Value::Duration(d),
            Self::Enum(e) => Value::Enum(e),
            Self::Seq(s) => Value::Seq(Sequence {
                items: s.items.into_iter().map(Value::into_owned).collect(),
                counted: s.counted,
            }),
            Self::Map(m) => Value::Map(Mapping {
                entries: m
                    .entries
                    .into_iter()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect(),
            }),
            Self::Entity(s) => Value::Text(Cow::Owned(s.display_name())),
        }
    }
}

impl<'b> PartialEq<Value<'b>> for Value<'_> {
    fn eq(&self, other: &Value<'b>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::UnsignedInteger(a), Value::UnsignedInteger(b)) => a == b,
            (Value::Integer(a), Value::UnsignedInteger(b))
            | (Value::UnsignedInteger(b), Value::Integer(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a.items == b.items,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.entries
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| other == v))
            }
            (Value::Entity(a), Value::Entity(b)) => std::ptr::addr_eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::UnsignedInteger(u) => write!(f, "{u}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::DateTime(d) => write!(f, "{}", d.to_rfc3339()),
            Self::Date(d) => write!(f, "{d}"),
            Self::Duration(d) => write!(f, "{d}"),
            Self::Enum(e) => write!(f, "{}", e.variant),
            Self::Seq(_) => write!(f, "[...]"),
            Self::Map(_) => write!(f, "{{...}}"),
            Self::Entity(s) => f.write_str(&s.display_name()),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

macro_rules! from_signed {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(v: $ty) -> Self {
                    Self::Integer(i64::from(v))
                }
            }
        )+
    };
}

from_signed!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value<'_> {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Self::Integer(i),
            Err(_) => Self::UnsignedInteger(v),
        }
    }
}

impl From<usize> for Value<'_> {
    fn from(v: usize) -> Self {
        Self::from(v as u64)
    }
}

impl From<isize> for Value<'_> {
    fn from(v: isize) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value<'_> {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<char> for Value<'_> {
    fn from(v: char) -> Self {
        Self::Text(Cow::Owned(v.to_string()))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Self::Text(Cow::Borrowed(v))
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(v: &'a String) -> Self {
        Self::Text(Cow::Borrowed(v.as_str()))
    }
}

impl From<String> for Value<'_> {
    fn from(v: String) -> Self {
        Self::Text(Cow::Owned(v))
    }
}

impl From<Uuid> for Value<'_> {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<DateTime<FixedOffset>> for Value<'_> {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTime(v)
    }
}

impl From<DateTime<Utc>> for Value<'_> {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v.fixed_offset())
    }
}

impl From<NaiveDate> for Value<'_> {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<TimeDelta> for Value<'_> {
    fn from(v: TimeDelta) -> Self {
        Self::Duration(v)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value<'_> {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Self::UnsignedInteger(u)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Null
                }
            }
            serde_json::Value::String(s) => Self::Text(Cow::Owned(s)),
            serde_json::Value::Array(a) => Self::seq(a.into_iter().map(Value::from)),
            serde_json::Value::Object(m) => {
                Self::map(m.into_iter().map(|(k, v)| (Value::from(k), Value::from(v))))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FromValue
// ---------------------------------------------------------------------------

/// Unwraps a [`Value`] into a concrete scalar type.
///
/// Used by typed comparers; `None` means the runtime value has another type.
pub trait FromValue: Sized {
    /// Converts `value`, or returns `None` if its runtime type does not fit.
    fn from_value(value: &Value<'_>) -> Option<Self>;
}

impl FromValue for bool {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        value.as_i64().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        match value {
            Value::UnsignedInteger(n) => Some(*n),
            Value::Integer(n) => u64::try_from(*n).ok(),
            Value::Null
            | Value::Bool(_)
            | Value::Float(_)
            | Value::Text(_)
            | Value::Uuid(_)
            | Value::DateTime(_)
            | Value::Date(_)
            | Value::Duration(_)
            | Value::Enum(_)
            | Value::Seq(_)
            | Value::Map(_)
            | Value::Entity(_) => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for String {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        match value {
            Value::Uuid(u) => Some(*u),
            Value::Text(s) => Uuid::parse_str(s).ok(),
            Value::Null
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::UnsignedInteger(_)
            | Value::Float(_)
            | Value::DateTime(_)
            | Value::Date(_)
            | Value::Duration(_)
            | Value::Enum(_)
            | Value::Seq(_)
            | Value::Map(_)
            | Value::Entity(_) => None,
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        match value {
            Value::DateTime(d) => Some(*d),
            Value::Null
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::UnsignedInteger(_)
            | Value::Float(_)
            | Value::Text(_)
            | Value::Uuid(_)
            | Value::Date(_)
            | Value::Duration(_)
            | Value::Enum(_)
            | Value::Seq(_)
            | Value::Map(_)
            | Value::Entity(_) => None,
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        match value {
            Value::Date(d) => Some(*d),
            Value::DateTime(d) => Some(d.date_naive()),
            Value::Null
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::UnsignedInteger(_)
            | Value::Float(_)
            | Value::Text(_)
            | Value::Uuid(_)
            | Value::Duration(_)
            | Value::Enum(_)
            | Value::Seq(_)
            | Value::Map(_)
            | Value::Entity(_) => None,
        }
    }
}

impl FromValue for TimeDelta {
    fn from_value(value: &Value<'_>) -> Option<Self> {
        match value {
            Value::Duration(d) => Some(*d),
            Value::Null
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::UnsignedInteger(_)
            | Value::Float(_)
            | Value::Text(_)
            | Value::Uuid(_)
            | Value::DateTime(_)
            | Value::Date(_)
            | Value::Enum(_)
            | Value::Seq(_)
            | Value::Map(_)
            | Value::Entity(_) => None,
        }
    }
}
