//! Type objects and the detail records they share.
//!
//! Every object lives in a [`TypeStore`](crate::TypeStore) and is referred to
//! by a copyable handle. Two handles are the same object iff they are equal;
//! structurally identical objects created separately stay distinct.

use bitflags::bitflags;
use indexmap::IndexMap;
use pyz_parser::{NodeIndex, ParameterCategory};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Handle to a [`Type`].
    TypeId
);
handle!(
    /// Handle to a [`ClassDetail`], shared by a class and its instances.
    ClassDetailId
);
handle!(FunctionDetailId);
handle!(TypeVarDetailId);

/// Category tag carried by every type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCategory {
    Unbound,
    Unknown,
    Any,
    None,
    Never,
    Function,
    OverloadedFunction,
    Class,
    Module,
    Union,
    TypeVar,
}

impl TypeCategory {
    pub const COUNT: usize = TypeCategory::TypeVar as usize + 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Variance {
    Invariant,
    Covariant,
    Contravariant,
}

impl Variance {
    pub const COUNT: usize = Variance::Contravariant as usize + 1;
}

bitflags! {
    /// Whether a type denotes the class object itself or a value of it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        const INSTANTIABLE = 1 << 0;
        const INSTANCE = 1 << 1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassTypeFlags: u32 {
        const BUILT_IN_CLASS = 1 << 0;
        const SPECIAL_BUILT_IN = 1 << 1;
        const DATA_CLASS = 1 << 2;
        const FROZEN_DATA_CLASS = 1 << 3;
        const SKIP_SYNTHESIZED_DATA_CLASS_INIT = 1 << 4;
        const SKIP_SYNTHESIZED_DATA_CLASS_EQ = 1 << 5;
        const SYNTHESIZED_DATA_CLASS_ORDER = 1 << 6;
        const TYPED_DICT_CLASS = 1 << 7;
        const CAN_OMIT_DICT_VALUES = 1 << 8;
        const SUPPORTS_ABSTRACT_METHODS = 1 << 9;
        const PROPERTY_CLASS = 1 << 10;
        const FINAL = 1 << 11;
        const PROTOCOL_CLASS = 1 << 12;
        const PSEUDO_GENERIC_CLASS = 1 << 13;
        const RUNTIME_CHECKABLE = 1 << 14;
        const TYPING_EXTENSION_CLASS = 1 << 15;
        const PARTIALLY_EVALUATED = 1 << 16;
        const HAS_CUSTOM_CLASS_GET_ITEM = 1 << 17;
        const TUPLE_CLASS = 1 << 18;
        const ENUM_CLASS = 1 << 19;
        const DATA_CLASS_KEYWORD_ONLY_PARAMS = 1 << 20;
        const CLASS_PROPERTY = 1 << 21;
        const DEFINED_IN_STUB = 1 << 22;
        const READ_ONLY_INSTANCE_VARIABLES = 1 << 23;
        const GENERATE_DATA_CLASS_SLOTS = 1 << 24;
        const SYNTHESIZE_DATA_CLASS_UNSAFE_HASH = 1 << 25;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionTypeFlags: u32 {
        const CONSTRUCTOR_METHOD = 1 << 0;
        const CLASS_METHOD = 1 << 1;
        const STATIC_METHOD = 1 << 2;
        const ABSTRACT_METHOD = 1 << 3;
        const GENERATOR = 1 << 4;
        const DISABLE_DEFAULT_CHECKS = 1 << 5;
        const SYNTHESIZED_METHOD = 1 << 6;
        const SKIP_CONSTRUCTOR_CHECK = 1 << 7;
        const OVERLOADED = 1 << 8;
        const ASYNC = 1 << 9;
        const WRAP_RETURN_TYPE_IN_AWAIT = 1 << 10;
        const STUB_DEFINITION = 1 << 11;
        const PY_TYPED_DEFINITION = 1 << 12;
        const FINAL = 1 << 13;
        const UNANNOTATED_PARAMS = 1 << 14;
        const SKIP_ARGS_KWARGS_COMPATIBILITY_CHECK = 1 << 15;
        const PARAM_SPEC_VALUE = 1 << 16;
    }
}

/// Value carried by a literal class instance such as `Literal[3]`.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub flags: TypeFlags,
    pub kind: TypeKind,
}

/// Per-category payload. Field order here is the order fields are printed in.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Unbound,
    Unknown {
        is_incomplete: bool,
    },
    Any,
    None,
    Never,
    Function {
        details: FunctionDetailId,
        bound_to_type: Option<TypeId>,
        bound_parameters: Option<Vec<ParamSpecEntry>>,
    },
    OverloadedFunction {
        overloads: Vec<TypeId>,
    },
    Class {
        details: ClassDetailId,
        type_arguments: Option<Vec<TypeId>>,
        literal_value: Option<LiteralValue>,
    },
    Module {
        module_name: String,
        fields: IndexMap<String, TypeId>,
    },
    Union {
        subtypes: Vec<TypeId>,
    },
    TypeVar {
        details: TypeVarDetailId,
        scope_id: Option<String>,
        name_with_scope: Option<String>,
    },
}

impl Type {
    pub fn new(flags: TypeFlags, kind: TypeKind) -> Self {
        Type { flags, kind }
    }

    pub fn category(&self) -> TypeCategory {
        match self.kind {
            TypeKind::Unbound => TypeCategory::Unbound,
            TypeKind::Unknown { .. } => TypeCategory::Unknown,
            TypeKind::Any => TypeCategory::Any,
            TypeKind::None => TypeCategory::None,
            TypeKind::Never => TypeCategory::Never,
            TypeKind::Function { .. } => TypeCategory::Function,
            TypeKind::OverloadedFunction { .. } => TypeCategory::OverloadedFunction,
            TypeKind::Class { .. } => TypeCategory::Class,
            TypeKind::Module { .. } => TypeCategory::Module,
            TypeKind::Union { .. } => TypeCategory::Union,
            TypeKind::TypeVar { .. } => TypeCategory::TypeVar,
        }
    }

    pub fn is_instantiable(&self) -> bool {
        self.flags.contains(TypeFlags::INSTANTIABLE)
    }

    pub fn is_instance(&self) -> bool {
        self.flags.contains(TypeFlags::INSTANCE)
    }

    pub fn class_details(&self) -> Option<ClassDetailId> {
        match self.kind {
            TypeKind::Class { details, .. } => Some(details),
            _ => None,
        }
    }

    pub fn function_details(&self) -> Option<FunctionDetailId> {
        match self.kind {
            TypeKind::Function { details, .. } => Some(details),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDetail {
    pub name: String,
    pub full_name: String,
    pub module_name: String,
    pub flags: ClassTypeFlags,
    pub type_source_id: u32,
    pub base_classes: Vec<TypeId>,
    pub mro: Vec<TypeId>,
    pub declared_metaclass: Option<TypeId>,
    pub effective_metaclass: Option<TypeId>,
    pub fields: IndexMap<String, TypeId>,
    pub type_parameters: Vec<TypeId>,
    pub doc_string: Option<String>,
    pub declaration: Option<NodeIndex>,
}

impl ClassDetail {
    pub fn new(name: &str, module_name: &str, flags: ClassTypeFlags) -> Self {
        let full_name = if module_name.is_empty() {
            name.to_string()
        } else {
            format!("{module_name}.{name}")
        };
        ClassDetail {
            name: name.to_string(),
            full_name,
            module_name: module_name.to_string(),
            flags,
            type_source_id: 0,
            base_classes: Vec::new(),
            mro: Vec::new(),
            declared_metaclass: None,
            effective_metaclass: None,
            fields: IndexMap::new(),
            type_parameters: Vec::new(),
            doc_string: None,
            declaration: None,
        }
    }
}

/// One declared parameter of a function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub category: ParameterCategory,
    pub name: Option<String>,
    pub has_declared_type: bool,
    pub type_id: TypeId,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDetail {
    pub name: String,
    pub full_name: String,
    pub module_name: String,
    pub flags: FunctionTypeFlags,
    pub parameters: Vec<FunctionParameter>,
    pub declared_return_type: Option<TypeId>,
    pub declaration: Option<NodeIndex>,
}

impl FunctionDetail {
    pub fn new(name: &str, full_name: &str, module_name: &str, flags: FunctionTypeFlags) -> Self {
        FunctionDetail {
            name: name.to_string(),
            full_name: full_name.to_string(),
            module_name: module_name.to_string(),
            flags,
            parameters: Vec::new(),
            declared_return_type: None,
            declaration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeVarDetail {
    pub name: String,
    pub constraints: Vec<TypeId>,
    pub bound_type: Option<TypeId>,
    pub variance: Variance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpecEntry {
    pub category: ParameterCategory,
    pub name: Option<String>,
    pub type_id: TypeId,
}
