//! Arena owning every type object and detail record.

use crate::types::{
    ClassDetail, ClassDetailId, FunctionDetail, FunctionDetailId, LiteralValue, Type, TypeFlags,
    TypeId, TypeKind, TypeVarDetail, TypeVarDetailId,
};
use rustc_hash::FxHashMap;

/// Flags of the special forms, which stand for both a class and its values.
const SPECIAL_FORM_FLAGS: TypeFlags = TypeFlags::INSTANTIABLE.union(TypeFlags::INSTANCE);

/// Append-only storage for the type graph.
///
/// The graph may be cyclic (a class can list itself in its own `mro`, a
/// metaclass can be an instance of itself); handles keep that representable
/// without shared ownership.
#[derive(Debug, Clone)]
pub struct TypeStore {
    types: Vec<Type>,
    classes: Vec<ClassDetail>,
    functions: Vec<FunctionDetail>,
    type_vars: Vec<TypeVarDetail>,
    instance_cache: FxHashMap<ClassDetailId, TypeId>,
    class_type_cache: FxHashMap<ClassDetailId, TypeId>,
    next_type_source_id: u32,
    unbound: TypeId,
    unknown: TypeId,
    incomplete_unknown: TypeId,
    any: TypeId,
    none: TypeId,
    never: TypeId,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        let mut store = TypeStore {
            types: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            type_vars: Vec::new(),
            instance_cache: FxHashMap::default(),
            class_type_cache: FxHashMap::default(),
            next_type_source_id: 1,
            unbound: TypeId(0),
            unknown: TypeId(0),
            incomplete_unknown: TypeId(0),
            any: TypeId(0),
            none: TypeId(0),
            never: TypeId(0),
        };
        store.unbound = store.add_type(Type::new(SPECIAL_FORM_FLAGS, TypeKind::Unbound));
        store.unknown = store.add_type(Type::new(
            SPECIAL_FORM_FLAGS,
            TypeKind::Unknown {
                is_incomplete: false,
            },
        ));
        store.incomplete_unknown = store.add_type(Type::new(
            SPECIAL_FORM_FLAGS,
            TypeKind::Unknown {
                is_incomplete: true,
            },
        ));
        store.any = store.add_type(Type::new(SPECIAL_FORM_FLAGS, TypeKind::Any));
        store.none = store.add_type(Type::new(TypeFlags::INSTANCE, TypeKind::None));
        store.never = store.add_type(Type::new(SPECIAL_FORM_FLAGS, TypeKind::Never));
        store
    }

    // =========================================================================
    // Shared singletons
    // =========================================================================

    pub fn unbound(&self) -> TypeId {
        self.unbound
    }

    pub fn unknown(&self) -> TypeId {
        self.unknown
    }

    /// Unknown produced while a dependency was still being evaluated.
    pub fn incomplete_unknown(&self) -> TypeId {
        self.incomplete_unknown
    }

    pub fn any(&self) -> TypeId {
        self.any
    }

    pub fn none(&self) -> TypeId {
        self.none
    }

    pub fn never(&self) -> TypeId {
        self.never
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    pub fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Register a class detail record, assigning its `type_source_id`.
    pub fn add_class(&mut self, mut detail: ClassDetail) -> ClassDetailId {
        detail.type_source_id = self.next_type_source_id;
        self.next_type_source_id += 1;
        let id = ClassDetailId(self.classes.len() as u32);
        self.classes.push(detail);
        id
    }

    pub fn add_function(&mut self, detail: FunctionDetail) -> FunctionDetailId {
        let id = FunctionDetailId(self.functions.len() as u32);
        self.functions.push(detail);
        id
    }

    pub fn add_type_var(&mut self, detail: TypeVarDetail) -> TypeVarDetailId {
        let id = TypeVarDetailId(self.type_vars.len() as u32);
        self.type_vars.push(detail);
        id
    }

    /// The class object (`type[C]`) for a detail record. Shared per class.
    pub fn class_type(&mut self, details: ClassDetailId) -> TypeId {
        if let Some(&existing) = self.class_type_cache.get(&details) {
            return existing;
        }
        let id = self.add_type(Type::new(
            TypeFlags::INSTANTIABLE,
            TypeKind::Class {
                details,
                type_arguments: None,
                literal_value: None,
            },
        ));
        self.class_type_cache.insert(details, id);
        id
    }

    /// A class object carrying explicit type arguments (`list[int]` used as
    /// a value).
    pub fn specialized_class(
        &mut self,
        details: ClassDetailId,
        type_arguments: Vec<TypeId>,
    ) -> TypeId {
        self.add_type(Type::new(
            TypeFlags::INSTANTIABLE,
            TypeKind::Class {
                details,
                type_arguments: Some(type_arguments),
                literal_value: None,
            },
        ))
    }

    /// The plain instance type of a class. Shared per class so repeated
    /// lookups return the same handle.
    pub fn class_instance(&mut self, details: ClassDetailId) -> TypeId {
        if let Some(&existing) = self.instance_cache.get(&details) {
            return existing;
        }
        let id = self.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Class {
                details,
                type_arguments: None,
                literal_value: None,
            },
        ));
        self.instance_cache.insert(details, id);
        id
    }

    /// A fresh literal instance; literals are never shared.
    pub fn literal_instance(&mut self, details: ClassDetailId, value: LiteralValue) -> TypeId {
        self.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Class {
                details,
                type_arguments: None,
                literal_value: Some(value),
            },
        ))
    }

    pub fn specialized_instance(
        &mut self,
        details: ClassDetailId,
        type_arguments: Vec<TypeId>,
    ) -> TypeId {
        self.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Class {
                details,
                type_arguments: Some(type_arguments),
                literal_value: None,
            },
        ))
    }

    /// Union of `subtypes`, collapsing duplicates. A single member is
    /// returned as is; an empty list yields `Never`.
    pub fn union(&mut self, subtypes: &[TypeId]) -> TypeId {
        let mut members: Vec<TypeId> = Vec::with_capacity(subtypes.len());
        for &ty in subtypes {
            match &self.types[ty.index()].kind {
                TypeKind::Union { subtypes: nested } => {
                    for &inner in nested {
                        if !members.contains(&inner) {
                            members.push(inner);
                        }
                    }
                }
                _ => {
                    if !members.contains(&ty) {
                        members.push(ty);
                    }
                }
            }
        }
        match members.len() {
            0 => self.never,
            1 => members[0],
            _ => self.add_type(Type::new(
                TypeFlags::INSTANCE,
                TypeKind::Union { subtypes: members },
            )),
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.index())
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut Type> {
        self.types.get_mut(id.index())
    }

    pub fn class(&self, id: ClassDetailId) -> Option<&ClassDetail> {
        self.classes.get(id.index())
    }

    pub fn class_mut(&mut self, id: ClassDetailId) -> Option<&mut ClassDetail> {
        self.classes.get_mut(id.index())
    }

    pub fn function(&self, id: FunctionDetailId) -> Option<&FunctionDetail> {
        self.functions.get(id.index())
    }

    pub fn function_mut(&mut self, id: FunctionDetailId) -> Option<&mut FunctionDetail> {
        self.functions.get_mut(id.index())
    }

    pub fn type_var(&self, id: TypeVarDetailId) -> Option<&TypeVarDetail> {
        self.type_vars.get(id.index())
    }

    /// Detail record of a class type (instance or instantiable).
    pub fn class_of(&self, id: TypeId) -> Option<&ClassDetail> {
        self.get(id)
            .and_then(Type::class_details)
            .and_then(|details| self.class(details))
    }

    /// Look up `name` on a class, searching its MRO in order.
    pub fn lookup_class_member(&self, details: ClassDetailId, name: &str) -> Option<TypeId> {
        let class = self.class(details)?;
        if let Some(&found) = class.fields.get(name) {
            return Some(found);
        }
        class
            .mro
            .iter()
            .filter_map(|&ty| self.class_of(ty))
            .find_map(|ancestor| ancestor.fields.get(name).copied())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
