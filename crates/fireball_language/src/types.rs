//! The Fireball type lattice.
//!
//! Types are arena-allocated and shared by reference: the checker interns
//! exactly one [`Type`] per declaration plus one per distinct pointer
//! spelling, so every expression node points at a shared node. Struct
//! field lists are filled in a second pass (via an interior-mutable slice)
//! so pointer fields can refer back to structs that are still being
//! resolved.
//!
//! | Type | Size (bytes) |
//! |------|--------------|
//! | primitives | their width (`void` is 0) |
//! | pointer | word size, fixed to 8 |
//! | struct | sum of field sizes (packed, no alignment padding) |
//! | enum | size of the underlying primitive |
//! | function | 4 (table-slot placeholder) |
//!
//! Equality is structural; [`Type::can_assign_to`] equals [`Type::equals`]
//! for everything except function types, which recurse through
//! `can_assign_to` on parameters and returns.

use fireball_base::{Interner, Symbol};
use std::cell::Cell;

/// The closed set of scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 12] = [
        PrimitiveKind::Void,
        PrimitiveKind::Bool,
        PrimitiveKind::I8,
        PrimitiveKind::I16,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
    ];

    /// `true` for the eight integer kinds; `bool` is not an integer.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8
                | PrimitiveKind::I16
                | PrimitiveKind::I32
                | PrimitiveKind::I64
                | PrimitiveKind::U8
                | PrimitiveKind::U16
                | PrimitiveKind::U32
                | PrimitiveKind::U64
        )
    }

    /// `true` for `f32` and `f64`.
    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }

    /// `true` for the signed integer kinds.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64
        )
    }

    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            PrimitiveKind::Void => 0,
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 => 2,
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
        }
    }

    /// The source-level spelling.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
        }
    }

    /// Maps a source spelling back to a kind.
    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A named struct field.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub name: Symbol,
    pub ty: &'a Type<'a>,
}

/// A single enum case with its resolved integer value.
#[derive(Debug, Clone, Copy)]
pub struct EnumCase {
    pub name: Symbol,
    pub value: i64,
    /// `true` when the value was auto-assigned rather than written out.
    pub infer_value: bool,
}

/// A named function parameter.
#[derive(Debug, Clone, Copy)]
pub struct Param<'a> {
    pub name: Symbol,
    pub ty: &'a Type<'a>,
}

/// A struct definition viewed as a type.
///
/// `fields` starts empty and is filled once every named type has a shell,
/// which is what lets `*Self` pointer fields resolve.
#[derive(Debug)]
pub struct StructType<'a> {
    pub name: Symbol,
    fields: Cell<&'a [Field<'a>]>,
}

impl<'a> StructType<'a> {
    pub fn new(name: Symbol) -> Self {
        Self { name, fields: Cell::new(&[]) }
    }

    pub fn fields(&self) -> &'a [Field<'a>] {
        self.fields.get()
    }

    pub fn set_fields(&self, fields: &'a [Field<'a>]) {
        self.fields.set(fields);
    }

    /// Returns `(index, field)` for the named field.
    pub fn field(&self, name: Symbol) -> Option<(usize, Field<'a>)> {
        self.fields
            .get()
            .iter()
            .enumerate()
            .find(|(_, field)| field.name == name)
            .map(|(i, field)| (i, *field))
    }
}

/// An enum definition viewed as a type.
#[derive(Debug)]
pub struct EnumType<'a> {
    pub name: Symbol,
    pub underlying: PrimitiveKind,
    pub cases: &'a [EnumCase],
    /// `true` when the underlying type was not written in source.
    pub infer_type: bool,
}

impl<'a> EnumType<'a> {
    pub fn case(&self, name: Symbol) -> Option<&EnumCase> {
        self.cases.iter().find(|case| case.name == name)
    }
}

/// A function signature viewed as a type.
#[derive(Debug)]
pub struct FunctionType<'a> {
    pub name: Symbol,
    pub params: &'a [Param<'a>],
    pub variadic: bool,
    pub returns: &'a Type<'a>,
    pub is_extern: bool,
}

/// A Fireball type.
#[derive(Debug)]
pub enum Type<'a> {
    Primitive(PrimitiveKind),
    Pointer(&'a Type<'a>),
    Struct(StructType<'a>),
    Enum(EnumType<'a>),
    Function(FunctionType<'a>),
}

impl<'a> Type<'a> {
    /// Size in bytes; see the module table.
    pub fn size(&self) -> usize {
        match self {
            Type::Primitive(kind) => kind.size(),
            Type::Pointer(_) => 8,
            Type::Struct(s) => s.fields().iter().map(|field| field.ty.size()).sum(),
            Type::Enum(e) => e.underlying.size(),
            Type::Function(_) => 4,
        }
    }

    /// Structural equality.
    ///
    /// Struct equality is field-wise on field types; enum equality compares
    /// the underlying kind and every case; function equality compares
    /// returns and parameter types. Interned types short-circuit on pointer
    /// identity, which also terminates recursive struct comparisons.
    pub fn equals(&self, other: &Type<'a>) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        match (self, other) {
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::Pointer(a), Type::Pointer(b)) => a.equals(b),
            (Type::Struct(a), Type::Struct(b)) => {
                let (fa, fb) = (a.fields(), b.fields());
                fa.len() == fb.len()
                    && fa.iter().zip(fb).all(|(x, y)| x.ty.equals(y.ty))
            }
            (Type::Enum(a), Type::Enum(b)) => {
                a.underlying == b.underlying
                    && a.cases.len() == b.cases.len()
                    && a.cases
                        .iter()
                        .zip(b.cases)
                        .all(|(x, y)| x.name == y.name && x.value == y.value)
            }
            (Type::Function(a), Type::Function(b)) => {
                a.returns.equals(b.returns)
                    && a.params.len() == b.params.len()
                    && a.params.iter().zip(b.params).all(|(x, y)| x.ty.equals(y.ty))
            }
            _ => false,
        }
    }

    /// Assignability.
    ///
    /// Identical to [`Type::equals`] except for function types, where
    /// parameter and return compatibility recurse through `can_assign_to`.
    pub fn can_assign_to(&self, other: &Type<'a>) -> bool {
        match (self, other) {
            (Type::Function(a), Type::Function(b)) => {
                a.returns.can_assign_to(b.returns)
                    && a.params.len() == b.params.len()
                    && a.params
                        .iter()
                        .zip(b.params)
                        .all(|(x, y)| x.ty.can_assign_to(y.ty))
            }
            _ => self.equals(other),
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&'a Type<'a>> {
        match self {
            Type::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructType<'a>> {
        match self {
            Type::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType<'a>> {
        match self {
            Type::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType<'a>> {
        match self {
            Type::Function(f) => Some(f),
            _ => None,
        }
    }

    /// `true` if this is exactly the given primitive kind.
    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        self.as_primitive() == Some(kind)
    }

    pub fn is_void(&self) -> bool {
        self.is_primitive(PrimitiveKind::Void)
    }

    /// `true` for integer primitives and enums (which carry integers).
    pub fn is_integer(&self) -> bool {
        match self {
            Type::Primitive(kind) => kind.is_integer(),
            _ => false,
        }
    }

    /// The source-level spelling, for diagnostics and hover text.
    pub fn display(&self, interner: &Interner) -> String {
        match self {
            Type::Primitive(kind) => kind.name().to_string(),
            Type::Pointer(pointee) => format!("*{}", pointee.display(interner)),
            Type::Struct(s) => interner.resolve(s.name).to_string(),
            Type::Enum(e) => interner.resolve(e.name).to_string(),
            Type::Function(f) => {
                let params: Vec<String> =
                    f.params.iter().map(|p| p.ty.display(interner)).collect();
                format!(
                    "func({}) -> {}",
                    params.join(", "),
                    f.returns.display(interner)
                )
            }
        }
    }
}
