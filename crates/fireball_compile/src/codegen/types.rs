//! Fireball type → LLVM type spelling.

use fireball_base::Interner;
use fireball_language::types::{PrimitiveKind, Type};

/// The LLVM spelling of a type.
///
/// Pointers are opaque (`ptr`); enums lower to their underlying integer;
/// function values are pointers.
pub fn ir_type(ty: &Type, interner: &Interner) -> String {
    match ty {
        Type::Primitive(kind) => ir_primitive(*kind).to_string(),
        Type::Pointer(_) => "ptr".to_string(),
        Type::Struct(s) => format!("%struct.{}", interner.resolve(s.name)),
        Type::Enum(e) => ir_primitive(e.underlying).to_string(),
        Type::Function(_) => "ptr".to_string(),
    }
}

pub fn ir_primitive(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Void => "void",
        PrimitiveKind::Bool => "i1",
        PrimitiveKind::I8 | PrimitiveKind::U8 => "i8",
        PrimitiveKind::I16 | PrimitiveKind::U16 => "i16",
        PrimitiveKind::I32 | PrimitiveKind::U32 => "i32",
        PrimitiveKind::I64 | PrimitiveKind::U64 => "i64",
        PrimitiveKind::F32 => "float",
        PrimitiveKind::F64 => "double",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signedness_is_erased() {
        assert_eq!(ir_primitive(PrimitiveKind::I32), "i32");
        assert_eq!(ir_primitive(PrimitiveKind::U32), "i32");
        assert_eq!(ir_primitive(PrimitiveKind::I8), "i8");
        assert_eq!(ir_primitive(PrimitiveKind::U8), "i8");
    }

    #[test]
    fn floats_use_llvm_names() {
        assert_eq!(ir_primitive(PrimitiveKind::F32), "float");
        assert_eq!(ir_primitive(PrimitiveKind::F64), "double");
    }

    #[test]
    fn pointers_are_opaque() {
        let interner = Interner::new();
        let i32_ty = Type::Primitive(PrimitiveKind::I32);
        assert_eq!(ir_type(&Type::Pointer(&i32_ty), &interner), "ptr");
    }
}
