/// Declared-type descriptors.
///
/// A [`TypeDesc`] is the shape-descriptor that conventions are keyed on: a
/// display name, an optional [`TypeId`] for exact matching, and a
/// [`TypeCategory`] that lets generic conventions (enumerations, sequences,
/// dictionaries, well-known scalars) be expressed as predicates.
///
/// The [`Describe`] trait supplies descriptors for standard library, `uuid`
/// and `chrono` types. Shapes get theirs from [`Reflect::type_desc`].
///
/// [`Reflect::type_desc`]: crate::shape::Reflect::type_desc
use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::shape::Reflect;
use crate::value::Value;

/// Broad classification of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    /// Booleans, characters and integers.
    Primitive,
    /// Binary floating point numbers.
    Float,
    /// Strings.
    Text,
    /// UUIDs.
    Uuid,
    /// Dates, times, durations and time zones.
    Temporal,
    /// The [`TypeDesc`] type itself.
    TypeDescriptor,
    /// A field-less enumeration compared by variant.
    Enum,
    /// A shape with value semantics (plain data struct).
    ValueShape,
    /// A shape with reference semantics.
    Shape,
    /// The dynamic [`Value`] type; the runtime value decides.
    Dynamic,
    /// An optional wrapper around a non-nullable type.
    Nullable(Box<TypeDesc>),
    /// A sequence of elements of the given type.
    Sequence(Box<TypeDesc>),
    /// A keyed map.
    Dictionary(Box<TypeDesc>, Box<TypeDesc>),
}

/// Descriptor of a declared (or runtime) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDesc {
    name: String,
    id: Option<TypeId>,
    category: TypeCategory,
    /// Parent shapes embedded by this shape, nearest first.
    ancestors: Vec<TypeId>,
}

impl TypeDesc {
    /// Creates a descriptor with no [`TypeId`]; it can only be matched by name or category.
    pub fn new(name: impl Into<String>, category: TypeCategory) -> Self {
        Self {
            name: name.into(),
            id: None,
            category,
            ancestors: Vec::new(),
        }
    }

    /// Creates a descriptor bound to the Rust type `T`.
    pub fn for_type<T: 'static>(name: impl Into<String>, category: TypeCategory) -> Self {
        Self {
            name: name.into(),
            id: Some(TypeId::of::<T>()),
            category,
            ancestors: Vec::new(),
        }
    }

    /// Returns the descriptor of a [`Describe`] type.
    pub fn of<T: Describe>() -> Self {
        T::describe()
    }

    /// Returns the descriptor of a shape.
    pub fn shape<T: Reflect>() -> Self {
        T::type_desc()
    }

    /// A sequence of `element`.
    pub fn list_of(element: TypeDesc) -> Self {
        Self::new(
            format!("Vec<{}>", element.name),
            TypeCategory::Sequence(Box::new(element)),
        )
    }

    /// A map from `key` to `value`.
    pub fn map_of(key: TypeDesc, value: TypeDesc) -> Self {
        Self::new(
            format!("Map<{}, {}>", key.name, value.name),
            TypeCategory::Dictionary(Box::new(key), Box::new(value)),
        )
    }

    /// The dynamic value type.
    pub fn dynamic() -> Self {
        Self::for_type::<Value<'static>>("Value", TypeCategory::Dynamic)
    }

    /// Wraps `inner` in an optional.
    ///
    /// Only types that cannot already be absent (primitives, floats, enums
    /// and value shapes) become [`TypeCategory::Nullable`]; every other
    /// category already admits a missing value and is returned unchanged.
    pub fn optional(inner: TypeDesc) -> Self {
        match inner.category {
            TypeCategory::Primitive
            | TypeCategory::Float
            | TypeCategory::Enum
            | TypeCategory::ValueShape => Self::new(
                format!("Option<{}>", inner.name),
                TypeCategory::Nullable(Box::new(inner)),
            ),
            TypeCategory::Text
            | TypeCategory::Uuid
            | TypeCategory::Temporal
            | TypeCategory::TypeDescriptor
            | TypeCategory::Shape
            | TypeCategory::Dynamic
            | TypeCategory::Nullable(_)
            | TypeCategory::Sequence(_)
            | TypeCategory::Dictionary(_, _) => inner,
        }
    }

    /// Display name of the type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound [`TypeId`], if any.
    pub fn type_id(&self) -> Option<TypeId> {
        self.id
    }

    /// Records the parent shapes this shape embeds, nearest first.
    pub fn with_ancestors(mut self, ancestors: Vec<TypeId>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// Parent shapes embedded by this shape, nearest first.
    pub fn ancestors(&self) -> &[TypeId] {
        &self.ancestors
    }

    /// The bound [`TypeId`] followed by those of the ancestors.
    pub fn lineage(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.id.into_iter().chain(self.ancestors.iter().copied())
    }

    /// Classification of the type.
    pub fn category(&self) -> &TypeCategory {
        &self.category
    }

    /// Returns `true` if this descriptor is bound to `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.id == Some(TypeId::of::<T>())
    }

    /// Returns `true` if this descriptor (or the type it wraps, for a
    /// nullable) is bound to the given [`TypeId`].
    pub fn matches_id(&self, id: TypeId) -> bool {
        self.id == Some(id) || self.unwrap_nullable().id == Some(id)
    }

    /// Strips one level of [`TypeCategory::Nullable`].
    pub fn unwrap_nullable(&self) -> &TypeDesc {
        match &self.category {
            TypeCategory::Nullable(inner) => inner,
            TypeCategory::Primitive
            | TypeCategory::Float
            | TypeCategory::Text
            | TypeCategory::Uuid
            | TypeCategory::Temporal
            | TypeCategory::TypeDescriptor
            | TypeCategory::Enum
            | TypeCategory::ValueShape
            | TypeCategory::Shape
            | TypeCategory::Dynamic
            | TypeCategory::Sequence(_)
            | TypeCategory::Dictionary(_, _) => self,
        }
    }

    /// Returns `true` for the immutable scalars that are always compared by value.
    pub fn is_well_known_scalar(&self) -> bool {
        matches!(
            self.category,
            TypeCategory::Text
                | TypeCategory::Uuid
                | TypeCategory::Float
                | TypeCategory::Temporal
                | TypeCategory::TypeDescriptor
        )
    }

    /// Returns `true` for sequences.
    pub fn is_sequence(&self) -> bool {
        matches!(self.category, TypeCategory::Sequence(_))
    }

    /// Returns `true` for dictionaries.
    pub fn is_dictionary(&self) -> bool {
        matches!(self.category, TypeCategory::Dictionary(_, _))
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Strips module paths from every segment of a `std::any::type_name` string.
///
/// `my_crate::model::Wrapper<my_crate::model::Simple>` becomes `Wrapper<Simple>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_path_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

// ---------------------------------------------------------------------------
// Describe
// ---------------------------------------------------------------------------

/// Supplies the declared-type descriptor of a non-shape type.
pub trait Describe: 'static {
    /// Returns the descriptor for `Self`.
    fn describe() -> TypeDesc;
}

macro_rules! describe_as {
    ($category:ident: $($ty:ty),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDesc {
                    TypeDesc::for_type::<$ty>(
                        short_type_name(std::any::type_name::<$ty>()),
                        TypeCategory::$category,
                    )
                }
            }
        )+
    };
}

describe_as!(Primitive: bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
describe_as!(Float: f32, f64);
describe_as!(Text: String, &'static str);
describe_as!(Uuid: uuid::Uuid);
describe_as!(
    Temporal: chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
    chrono::TimeDelta,
    chrono::FixedOffset,
    chrono::Utc,
    std::time::Duration,
);
describe_as!(TypeDescriptor: TypeDesc);

impl Describe for Value<'static> {
    fn describe() -> TypeDesc {
        TypeDesc::dynamic()
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDesc {
        let inner = T::describe();
        let mut desc = TypeDesc::optional(inner);
        if matches!(desc.category, TypeCategory::Nullable(_)) {
            desc.id = Some(TypeId::of::<Option<T>>());
        }
        desc
    }
}

impl<T: Describe> Describe for Box<T> {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

impl<T: Describe> Describe for Rc<T> {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

impl<T: Describe> Describe for Arc<T> {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

macro_rules! describe_sequence {
    ($($container:ident),+) => {
        $(
            impl<T: Describe> Describe for $container<T> {
                fn describe() -> TypeDesc {
                    let element = T::describe();
                    TypeDesc::for_type::<$container<T>>(
                        format!("{}<{}>", stringify!($container), element.name),
                        TypeCategory::Sequence(Box::new(element)),
                    )
                }
            }
        )+
    };
}

describe_sequence!(Vec, VecDeque, BTreeSet, HashSet);

macro_rules! describe_dictionary {
    ($($container:ident),+) => {
        $(
            impl<K: Describe, V: Describe> Describe for $container<K, V> {
                fn describe() -> TypeDesc {
                    let key = K::describe();
                    let value = V::describe();
                    TypeDesc::for_type::<$container<K, V>>(
                        format!("{}<{}, {}>", stringify!($container), key.name, value.name),
                        TypeCategory::Dictionary(Box::new(key), Box::new(value)),
                    )
                }
            }
        )+
    };
}

describe_dictionary!(HashMap, BTreeMap);
