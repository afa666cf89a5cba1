//! Synthesized `builtins`, `typing` and `abc` modules.
//!
//! There are no stub files to read, so the handful of classes and functions
//! the evaluator needs are built directly into the `TypeStore`.

use indexmap::IndexMap;
use pyz_parser::ParameterCategory;
use pyz_solver::{
    ClassDetail, ClassDetailId, ClassTypeFlags, FunctionDetail, FunctionParameter,
    FunctionTypeFlags, Type, TypeFlags, TypeId, TypeKind, TypeStore,
};
use tracing::debug;

/// Handles to the synthesized classes the evaluator refers to by role.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub object: ClassDetailId,
    pub type_class: ClassDetailId,
    pub int: ClassDetailId,
    pub float: ClassDetailId,
    pub complex: ClassDetailId,
    pub str: ClassDetailId,
    pub bytes: ClassDetailId,
    pub bool: ClassDetailId,
    pub list: ClassDetailId,
    pub dict: ClassDetailId,
    pub set: ClassDetailId,
    pub tuple: ClassDetailId,
    pub slice: ClassDetailId,
    pub ellipsis: ClassDetailId,
    pub range: ClassDetailId,
    pub property: ClassDetailId,
    pub staticmethod: ClassDetailId,
    pub classmethod: ClassDetailId,
    pub base_exception: ClassDetailId,
    pub type_var: ClassDetailId,
    pub generic: ClassDetailId,
    pub coroutine: ClassDetailId,
    pub generator: ClassDetailId,
    /// `typing.overload`, `typing.final` and friends, by function name.
    pub flag_decorators: IndexMap<String, TypeId>,
    /// Module types keyed by module name.
    pub modules: IndexMap<String, TypeId>,
}

impl Builtins {
    /// Populate `store` with the synthesized modules.
    pub fn new(store: &mut TypeStore) -> Self {
        let mut builder = ModuleBuilder::new(store, "builtins");

        // `object` and `type` refer to each other: `type` derives from
        // `object`, and both use `type` as their metaclass.
        let object = builder.class("object", &[]);
        let type_class = builder.class("type", &[object]);
        let type_ref = builder.store.class_type(type_class);
        for class in [object, type_class] {
            if let Some(detail) = builder.store.class_mut(class) {
                detail.declared_metaclass = None;
                detail.effective_metaclass = Some(type_ref);
            }
        }
        builder.metaclass = Some(type_ref);

        let int = builder.class("int", &[object]);
        let float = builder.class("float", &[object]);
        let complex = builder.class("complex", &[object]);
        let str = builder.class("str", &[object]);
        let bytes = builder.class("bytes", &[object]);
        let bool = builder.class("bool", &[int]);
        let list = builder.class("list", &[object]);
        let dict = builder.class("dict", &[object]);
        let set = builder.class("set", &[object]);
        let tuple = builder.class_with_flags("tuple", &[object], ClassTypeFlags::TUPLE_CLASS);
        let slice = builder.class("slice", &[object]);
        let ellipsis = builder.class("ellipsis", &[object]);
        let range = builder.class("range", &[object]);
        let property =
            builder.class_with_flags("property", &[object], ClassTypeFlags::PROPERTY_CLASS);
        let staticmethod = builder.class("staticmethod", &[object]);
        let classmethod = builder.class("classmethod", &[object]);
        let base_exception = builder.class("BaseException", &[object]);
        let exception = builder.class("Exception", &[base_exception]);
        for name in ["ValueError", "TypeError", "KeyError", "RuntimeError"] {
            builder.class(name, &[exception]);
        }

        let int_t = builder.store.class_instance(int);
        let str_t = builder.store.class_instance(str);
        let bool_t = builder.store.class_instance(bool);
        let none_t = builder.store.none();
        let object_t = builder.store.class_instance(object);
        let list_str = builder.store.specialized_instance(list, vec![str_t]);

        builder.method(object, "__init__", &[], none_t);
        builder.method(object, "__repr__", &[], str_t);
        builder.method(str, "upper", &[], str_t);
        builder.method(str, "lower", &[], str_t);
        builder.method(str, "strip", &[], str_t);
        builder.method(str, "join", &[("iterable", object_t)], str_t);
        builder.method(str, "split", &[], list_str);
        builder.method(list, "append", &[("item", object_t)], none_t);
        builder.method(list, "__len__", &[], int_t);
        builder.method(dict, "__len__", &[], int_t);

        builder.function("len", &[("obj", object_t)], int_t);
        builder.function("print", &[("values", object_t)], none_t);
        builder.function("isinstance", &[("obj", object_t), ("cls", object_t)], bool_t);
        builder.function("repr", &[("obj", object_t)], str_t);
        builder.function("id", &[("obj", object_t)], int_t);
        let builtins_module = builder.finish();

        let mut builder = ModuleBuilder::new(store, "typing");
        builder.metaclass = Some(type_ref);
        let type_var = builder.class("TypeVar", &[object]);
        let generic = builder.special_form("Generic");
        let protocol =
            builder.class_with_flags("Protocol", &[generic], ClassTypeFlags::PROTOCOL_CLASS);
        if let Some(detail) = builder.store.class_mut(protocol) {
            detail.flags |= ClassTypeFlags::SPECIAL_BUILT_IN;
        }
        for form in [
            "Any", "Optional", "Union", "Literal", "Callable", "ClassVar", "Final", "Type",
        ] {
            builder.special_form(form);
        }
        builder.alias("List", list);
        builder.alias("Dict", dict);
        builder.alias("Set", set);
        builder.alias("Tuple", tuple);
        let coroutine = builder.class("Coroutine", &[object]);
        let generator = builder.class("Generator", &[object]);

        let unknown = builder.store.unknown();
        let mut flag_decorators = IndexMap::new();
        for name in ["overload", "final", "runtime_checkable"] {
            let decorator = builder.function(name, &[("f", unknown)], unknown);
            flag_decorators.insert(name.to_string(), decorator);
        }
        let typing_module = builder.finish();

        let mut builder = ModuleBuilder::new(store, "abc");
        builder.metaclass = Some(type_ref);
        builder.class_with_flags("ABC", &[object], ClassTypeFlags::SUPPORTS_ABSTRACT_METHODS);
        let abstractmethod = builder.function("abstractmethod", &[("f", unknown)], unknown);
        flag_decorators.insert("abstractmethod".to_string(), abstractmethod);
        let abc_module = builder.finish();

        let mut modules = IndexMap::new();
        modules.insert("builtins".to_string(), builtins_module);
        modules.insert("typing".to_string(), typing_module);
        modules.insert("abc".to_string(), abc_module);
        debug!(types = store.type_count(), "synthesized builtin modules");

        Builtins {
            object,
            type_class,
            int,
            float,
            complex,
            str,
            bytes,
            bool,
            list,
            dict,
            set,
            tuple,
            slice,
            ellipsis,
            range,
            property,
            staticmethod,
            classmethod,
            base_exception,
            type_var,
            generic,
            coroutine,
            generator,
            flag_decorators,
            modules,
        }
    }

    pub fn module(&self, name: &str) -> Option<TypeId> {
        self.modules.get(name).copied()
    }

    /// Look up a name in the `builtins` module.
    pub fn lookup(&self, store: &TypeStore, name: &str) -> Option<TypeId> {
        let module = self.module("builtins")?;
        match &store.get(module)?.kind {
            TypeKind::Module { fields, .. } => fields.get(name).copied(),
            _ => None,
        }
    }

    /// Name of the flag decorator `ty` is, if any.
    pub fn flag_decorator_name(&self, ty: TypeId) -> Option<&str> {
        self.flag_decorators
            .iter()
            .find(|(_, decorator)| **decorator == ty)
            .map(|(name, _)| name.as_str())
    }
}

struct ModuleBuilder<'s> {
    store: &'s mut TypeStore,
    module_name: &'static str,
    fields: IndexMap<String, TypeId>,
    metaclass: Option<TypeId>,
}

impl<'s> ModuleBuilder<'s> {
    fn new(store: &'s mut TypeStore, module_name: &'static str) -> Self {
        ModuleBuilder {
            store,
            module_name,
            fields: IndexMap::new(),
            metaclass: None,
        }
    }

    fn class(&mut self, name: &str, bases: &[ClassDetailId]) -> ClassDetailId {
        self.class_with_flags(name, bases, ClassTypeFlags::empty())
    }

    fn class_with_flags(
        &mut self,
        name: &str,
        bases: &[ClassDetailId],
        flags: ClassTypeFlags,
    ) -> ClassDetailId {
        let flags = flags | ClassTypeFlags::BUILT_IN_CLASS;
        let mut detail = ClassDetail::new(name, self.module_name, flags);
        detail.effective_metaclass = self.metaclass;
        let id = self.store.add_class(detail);
        let class_type = self.store.class_type(id);

        let base_types: Vec<TypeId> = bases.iter().map(|&b| self.store.class_type(b)).collect();
        let mut mro = vec![class_type];
        for &base in bases {
            if let Some(base_detail) = self.store.class(base) {
                for &ancestor in &base_detail.mro {
                    if !mro.contains(&ancestor) {
                        mro.push(ancestor);
                    }
                }
            }
        }
        if let Some(detail) = self.store.class_mut(id) {
            detail.base_classes = base_types;
            detail.mro = mro;
        }
        self.fields.insert(name.to_string(), class_type);
        id
    }

    /// A `typing` special form such as `Optional`, modelled as a class.
    fn special_form(&mut self, name: &str) -> ClassDetailId {
        self.class_with_flags(name, &[], ClassTypeFlags::SPECIAL_BUILT_IN)
    }

    /// Export an existing class under another name (`typing.List`).
    fn alias(&mut self, name: &str, target: ClassDetailId) {
        let class_type = self.store.class_type(target);
        self.fields.insert(name.to_string(), class_type);
    }

    fn build_function(
        &mut self,
        name: &str,
        full_name: String,
        receiver: Option<TypeId>,
        params: &[(&str, TypeId)],
        return_type: TypeId,
    ) -> TypeId {
        let mut detail =
            FunctionDetail::new(name, &full_name, self.module_name, FunctionTypeFlags::empty());
        if let Some(receiver) = receiver {
            detail.parameters.push(FunctionParameter {
                category: ParameterCategory::Simple,
                name: Some("self".to_string()),
                has_declared_type: false,
                type_id: receiver,
                has_default: false,
            });
        }
        detail.parameters.extend(params.iter().map(|&(param, type_id)| FunctionParameter {
            category: ParameterCategory::Simple,
            name: Some(param.to_string()),
            has_declared_type: true,
            type_id,
            has_default: false,
        }));
        detail.declared_return_type = Some(return_type);
        let details = self.store.add_function(detail);
        self.store.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Function {
                details,
                bound_to_type: None,
                bound_parameters: None,
            },
        ))
    }

    fn method(
        &mut self,
        class: ClassDetailId,
        name: &str,
        params: &[(&str, TypeId)],
        return_type: TypeId,
    ) {
        let Some(class_name) = self.store.class(class).map(|c| c.full_name.clone()) else {
            return;
        };
        let receiver = self.store.class_instance(class);
        let full_name = format!("{class_name}.{name}");
        let method = self.build_function(name, full_name, Some(receiver), params, return_type);
        if let Some(detail) = self.store.class_mut(class) {
            detail.fields.insert(name.to_string(), method);
        }
    }

    fn function(&mut self, name: &str, params: &[(&str, TypeId)], return_type: TypeId) -> TypeId {
        let full_name = format!("{}.{name}", self.module_name);
        let function = self.build_function(name, full_name, None, params, return_type);
        self.fields.insert(name.to_string(), function);
        function
    }

    fn finish(self) -> TypeId {
        self.store.add_type(Type::new(
            TypeFlags::INSTANCE,
            TypeKind::Module {
                module_name: self.module_name.to_string(),
                fields: self.fields,
            },
        ))
    }
}
