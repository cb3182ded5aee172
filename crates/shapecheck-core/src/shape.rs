/// Shape reflection.
///
/// A shape lists its directly declared members as `(name, declared type,
/// accessor)` triples and, optionally, an embedded parent shape whose members
/// are compared first. Implementations are written by hand (or generated) per
/// type; there is no runtime reflection.
///
/// [`Reflect`] is the static, per-type side. Every `Reflect` type is also a
/// [`Shape`], the object-safe side used when a nested value is only known at
/// runtime.
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::types::{Describe, TypeCategory, TypeDesc, short_type_name};
use crate::value::Value;

/// Reads one member from its owner. `Err` carries the extraction error text.
pub type Accessor<T> = for<'a> fn(&'a T) -> Result<Value<'a>, String>;

/// Reads one member from its owner; cannot fail.
pub type InfallibleAccessor<T> = for<'a> fn(&'a T) -> Value<'a>;

/// Static reflection over a shape type.
pub trait Reflect: Any + fmt::Debug + Sized {
    /// `true` for plain data structs compared by value semantics.
    const VALUE_SHAPE: bool = false;

    /// Members declared directly on this shape, in comparison order.
    fn members() -> Vec<Member<Self>>;

    /// The embedded parent shape, if this shape extends another.
    fn parent() -> Option<ParentLink<Self>> {
        None
    }

    /// Display name used as the default comparison label.
    fn shape_name() -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Declared-type descriptor of this shape.
    fn type_desc() -> TypeDesc {
        let category = if Self::VALUE_SHAPE {
            TypeCategory::ValueShape
        } else {
            TypeCategory::Shape
        };
        let ancestors = Self::parent()
            .map(|link| link.desc.ty.lineage().collect())
            .unwrap_or_default();
        TypeDesc::for_type::<Self>(Self::shape_name(), category).with_ancestors(ancestors)
    }
}

/// Object-safe view of a shape instance.
pub trait Shape: Any + fmt::Debug {
    /// Name of the runtime shape.
    fn display_name(&self) -> String;

    /// Descriptor of the runtime shape.
    fn shape_type(&self) -> TypeDesc;

    /// [`TypeId`] of the runtime shape.
    fn shape_id(&self) -> TypeId;

    /// Members and parent of the runtime shape.
    fn descriptor(&self) -> ShapeDescriptor;

    /// Upcast used to recover the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Reflect> Shape for T {
    fn display_name(&self) -> String {
        T::shape_name()
    }

    fn shape_type(&self) -> TypeDesc {
        T::type_desc()
    }

    fn shape_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn descriptor(&self) -> ShapeDescriptor {
        ShapeDescriptor::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

enum AccessorFn<T> {
    Infallible(InfallibleAccessor<T>),
    Fallible(Accessor<T>),
}

/// A named, typed, readable member of the shape `T`.
pub struct Member<T> {
    name: String,
    ty: TypeDesc,
    read: AccessorFn<T>,
}

impl<T: Reflect> Member<T> {
    /// A member with an explicit declared type.
    pub fn new(name: impl Into<String>, ty: TypeDesc, read: InfallibleAccessor<T>) -> Self {
        Self {
            name: name.into(),
            ty,
            read: AccessorFn::Infallible(read),
        }
    }

    /// A member whose accessor can fail.
    pub fn fallible(name: impl Into<String>, ty: TypeDesc, read: Accessor<T>) -> Self {
        Self {
            name: name.into(),
            ty,
            read: AccessorFn::Fallible(read),
        }
    }

    /// A member declared as the non-shape type `V`.
    pub fn of<V: Describe>(name: impl Into<String>, read: InfallibleAccessor<T>) -> Self {
        Self::new(name, V::describe(), read)
    }

    /// A member declared as the shape `V`.
    pub fn shape<V: Reflect>(name: impl Into<String>, read: InfallibleAccessor<T>) -> Self {
        Self::new(name, V::type_desc(), read)
    }

    /// A member declared as a sequence of the shape `V`.
    pub fn list<V: Reflect>(name: impl Into<String>, read: InfallibleAccessor<T>) -> Self {
        Self::new(name, TypeDesc::list_of(V::type_desc()), read)
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn declared_type(&self) -> &TypeDesc {
        &self.ty
    }

    fn erase(self) -> MemberDesc {
        MemberDesc {
            name: self.name,
            ty: self.ty,
            owner: T::type_desc(),
            accessor: Arc::new(TypedAccessor { read: self.read }),
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

trait ErasedAccessor: Send + Sync {
    fn read<'a>(&self, owner: &'a dyn Shape) -> Result<Value<'a>, String>;
}

struct TypedAccessor<T> {
    read: AccessorFn<T>,
}

impl<T: Reflect> ErasedAccessor for TypedAccessor<T> {
    fn read<'a>(&self, owner: &'a dyn Shape) -> Result<Value<'a>, String> {
        let Some(owner) = owner.as_any().downcast_ref::<T>() else {
            return Err(format!(
                "member of {} read from a {}",
                T::shape_name(),
                owner.display_name()
            ));
        };
        match self.read {
            AccessorFn::Infallible(read) => Ok(read(owner)),
            AccessorFn::Fallible(read) => read(owner),
        }
    }
}

/// A type-erased member descriptor.
#[derive(Clone)]
pub struct MemberDesc {
    name: String,
    ty: TypeDesc,
    owner: TypeDesc,
    accessor: Arc<dyn ErasedAccessor>,
}

impl MemberDesc {
    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn declared_type(&self) -> &TypeDesc {
        &self.ty
    }

    /// Shape that declares the member.
    pub fn owner(&self) -> &TypeDesc {
        &self.owner
    }

    /// Reads the member from `owner`.
    ///
    /// Fails with the accessor's error text, or when `owner` is not the
    /// declaring shape.
    pub fn read<'a>(&self, owner: &'a dyn Shape) -> Result<Value<'a>, String> {
        self.accessor.read(owner)
    }
}

impl fmt::Debug for MemberDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDesc")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Parents
// ---------------------------------------------------------------------------

/// Projection from a derived shape `T` to its embedded parent shape.
pub struct ParentLink<T> {
    desc: ParentDesc,
    _owner: PhantomData<fn(&T)>,
}

impl<T: Reflect> ParentLink<T> {
    /// Links `T` to the parent shape `P` reached through `project`.
    pub fn new<P: Reflect>(project: for<'a> fn(&'a T) -> &'a P) -> Self {
        Self {
            desc: ParentDesc {
                ty: P::type_desc(),
                describe: ShapeDescriptor::of::<P>,
                projection: Arc::new(TypedParent { project }),
            },
            _owner: PhantomData,
        }
    }
}

trait ErasedParent: Send + Sync {
    fn project<'a>(&self, owner: &'a dyn Shape) -> Option<&'a dyn Shape>;
}

struct TypedParent<T, P> {
    project: for<'a> fn(&'a T) -> &'a P,
}

impl<T: Reflect, P: Reflect> ErasedParent for TypedParent<T, P> {
    fn project<'a>(&self, owner: &'a dyn Shape) -> Option<&'a dyn Shape> {
        let owner = owner.as_any().downcast_ref::<T>()?;
        let parent: &'a dyn Shape = (self.project)(owner);
        Some(parent)
    }
}

/// A type-erased parent link.
#[derive(Clone)]
pub struct ParentDesc {
    ty: TypeDesc,
    describe: fn() -> ShapeDescriptor,
    projection: Arc<dyn ErasedParent>,
}

impl ParentDesc {
    /// Descriptor of the parent shape.
    pub fn parent_type(&self) -> &TypeDesc {
        &self.ty
    }

    /// Members and grand-parent of the parent shape.
    pub fn descriptor(&self) -> ShapeDescriptor {
        (self.describe)()
    }

    /// Projects a derived instance onto its parent portion.
    pub fn project<'a>(&self, owner: &'a dyn Shape) -> Option<&'a dyn Shape> {
        self.projection.project(owner)
    }
}

impl fmt::Debug for ParentDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentDesc")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ShapeDescriptor
// ---------------------------------------------------------------------------

/// The reflected layout of one shape.
#[derive(Debug, Clone)]
pub struct ShapeDescriptor {
    ty: TypeDesc,
    members: Vec<MemberDesc>,
    parent: Option<ParentDesc>,
}

impl ShapeDescriptor {
    /// Reflects the shape `T`.
    pub fn of<T: Reflect>() -> Self {
        Self {
            ty: T::type_desc(),
            members: T::members().into_iter().map(Member::erase).collect(),
            parent: T::parent().map(|link| link.desc),
        }
    }

    /// Descriptor of the shape.
    pub fn shape_type(&self) -> &TypeDesc {
        &self.ty
    }

    /// Directly declared members.
    pub fn members(&self) -> &[MemberDesc] {
        &self.members
    }

    /// Looks up a directly declared member.
    pub fn member(&self, name: &str) -> Option<&MemberDesc> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The parent link, if any.
    pub fn parent(&self) -> Option<&ParentDesc> {
        self.parent.as_ref()
    }
}
