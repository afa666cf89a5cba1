//! End-to-end tests for the lazy type evaluator.

use pyz_checker::{BinderState, CheckerState};
use pyz_parser::{NodeIndex, NodeKind, ParseResults, parse_file};
use pyz_solver::{LiteralValue, TypeEvaluator, TypeId, TypeKind, TypeStore};

struct Fixture {
    results: ParseResults,
    binder: BinderState,
}

impl Fixture {
    fn new(source: &str) -> Self {
        let results = parse_file("test.py", source);
        let mut binder = BinderState::new();
        binder.bind_module(&results.arena, results.parse_tree);
        Fixture { results, binder }
    }

    fn checker(&self) -> CheckerState<'_> {
        CheckerState::new(&self.results.arena, &self.binder, "test")
    }

    /// The `nth` `Name` node spelling `name`, in source order.
    fn name(&self, name: &str, nth: usize) -> NodeIndex {
        let mut names: Vec<(u32, NodeIndex)> = self
            .results
            .arena
            .iter()
            .filter(|(_, node)| node.name_value() == Some(name))
            .map(|(index, node)| (node.start, index))
            .collect();
        names.sort();
        names[nth].1
    }

    fn nth_node(&self, kind: NodeKind, nth: usize) -> NodeIndex {
        self.results
            .arena
            .iter()
            .filter(|(_, node)| node.kind() == kind)
            .map(|(index, _)| index)
            .nth(nth)
            .unwrap()
    }
}

/// Short human-readable rendering used by the assertions below.
fn describe(types: &TypeStore, ty: TypeId) -> String {
    let resolved = types.get(ty).unwrap();
    match &resolved.kind {
        TypeKind::Unbound => "Unbound".to_string(),
        TypeKind::Unknown { .. } => "Unknown".to_string(),
        TypeKind::Any => "Any".to_string(),
        TypeKind::None => "None".to_string(),
        TypeKind::Never => "Never".to_string(),
        TypeKind::Function { details, .. } => {
            format!("function {}", types.function(*details).unwrap().name)
        }
        TypeKind::OverloadedFunction { overloads } => format!("Overload[{}]", overloads.len()),
        TypeKind::Module { module_name, .. } => format!("Module({module_name})"),
        TypeKind::Union { subtypes } => subtypes
            .iter()
            .map(|&subtype| describe(types, subtype))
            .collect::<Vec<_>>()
            .join(" | "),
        TypeKind::TypeVar { details, .. } => types.type_var(*details).unwrap().name.clone(),
        TypeKind::Class {
            details,
            type_arguments,
            literal_value,
        } => {
            let mut text = match literal_value {
                Some(LiteralValue::Int(value)) => format!("Literal[{value}]"),
                Some(LiteralValue::Bool(value)) => format!("Literal[{value}]"),
                Some(LiteralValue::Str(value)) => format!("Literal['{value}']"),
                Some(LiteralValue::Float(value)) => format!("Literal[{value}]"),
                None => types.class(*details).unwrap().name.clone(),
            };
            if let Some(arguments) = type_arguments {
                let arguments: Vec<String> = arguments
                    .iter()
                    .map(|&argument| describe(types, argument))
                    .collect();
                text = format!("{text}[{}]", arguments.join(", "));
            }
            if resolved.is_instantiable() {
                format!("type[{text}]")
            } else {
                text
            }
        }
    }
}

fn type_of(checker: &mut CheckerState<'_>, node: NodeIndex) -> String {
    let ty = checker.get_type(node).unwrap();
    describe(checker.types(), ty)
}

#[test]
fn unannotated_parameter_is_unknown() {
    let fixture = Fixture::new("def f(x):\n    return x\n");
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("x", 1)), "Unknown");
    assert_eq!(type_of(&mut checker, fixture.name("f", 0)), "function f");
}

#[test]
fn queries_are_memoized() {
    let fixture = Fixture::new("a = [1, 2]\nb = a\n");
    let mut checker = fixture.checker();
    let usage = fixture.name("a", 1);
    let first = checker.get_type(usage).unwrap();
    let second = checker.get_type(usage).unwrap();
    assert_eq!(first, second);
    assert_eq!(describe(checker.types(), first), "list[int]");
}

#[test]
fn non_expression_nodes_have_no_type() {
    let fixture = Fixture::new("def f():\n    pass\n");
    let mut checker = fixture.checker();
    let suite = fixture.nth_node(NodeKind::Suite, 0);
    assert_eq!(checker.get_type(suite), None);
}

#[test]
fn literals_and_containers() {
    let source = "\
n = 3
s = 'a' 'b'
f = f'{n}'
t = (1, 'x')
d = {'k': 1.5}
c = [i for i in range(3)]
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("n", 0)), "Literal[3]");
    assert_eq!(type_of(&mut checker, fixture.name("s", 0)), "Literal['ab']");
    assert_eq!(type_of(&mut checker, fixture.name("f", 0)), "str");
    assert_eq!(
        type_of(&mut checker, fixture.name("t", 0)),
        "tuple[Literal[1], Literal['x']]"
    );
    assert_eq!(type_of(&mut checker, fixture.name("d", 0)), "dict[str, float]");
}

#[test]
fn unpacking_and_loops() {
    let source = "\
a, b = 1, 'two'
for item in ['x', 'y']:
    pass
last = item
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("b", 0)), "Literal['two']");
    assert_eq!(type_of(&mut checker, fixture.name("item", 1)), "str");
}

#[test]
fn latest_preceding_assignment_wins_in_same_scope() {
    let source = "\
v = 1
v = 'text'
w = v
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("v", 2)), "Literal['text']");
}

#[test]
fn class_instances_methods_and_attributes() {
    let source = "\
class Point:
    def __init__(self, x: int):
        self.x = x

    def norm(self) -> float:
        return 1.0

p = Point(1)
n = p.norm()
v = p.x
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("p", 0)), "Point");
    assert_eq!(type_of(&mut checker, fixture.name("n", 0)), "float");
    assert_eq!(type_of(&mut checker, fixture.name("v", 0)), "int");
    assert_eq!(type_of(&mut checker, fixture.name("Point", 0)), "type[Point]");
}

#[test]
fn bound_methods_drop_the_receiver() {
    let source = "\
class Greeter:
    def greet(self, name: str) -> str:
        return name

g = Greeter().greet
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    let ty = checker.get_type(fixture.name("g", 0)).unwrap();
    let Some(TypeKind::Function {
        bound_to_type: Some(receiver),
        bound_parameters: Some(parameters),
        ..
    }) = checker.types().get(ty).map(|t| &t.kind)
    else {
        panic!("expected a bound method");
    };
    assert_eq!(describe(checker.types(), *receiver), "Greeter");
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0].name.as_deref(), Some("name"));
}

#[test]
fn self_referencing_class_terminates() {
    let source = "\
class Node:
    def next(self) -> \"Node\":
        return self

    def walk(self):
        return self.next().next()

result = Node().walk()
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("result", 0)), "Node");
}

#[test]
fn property_reads_return_getter_type() {
    let source = "\
class Box:
    @property
    def size(self) -> int:
        return 1

    @size.setter
    def size(self, value: int) -> None:
        pass

s = Box().size
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("s", 0)), "int");
}

#[test]
fn typevars_are_scoped_and_solved() {
    let source = "\
from typing import TypeVar
T = TypeVar('T')
def ident(v: T) -> T:
    return v
r = ident(3)
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("r", 0)), "int");

    let annotation = checker.get_type(fixture.name("v", 1)).unwrap();
    let Some(TypeKind::TypeVar {
        scope_id,
        name_with_scope,
        ..
    }) = checker.types().get(annotation).map(|t| &t.kind)
    else {
        panic!("expected a TypeVar");
    };
    assert_eq!(scope_id.as_deref(), Some("test.ident"));
    assert_eq!(name_with_scope.as_deref(), Some("T.test.ident"));
}

#[test]
fn generic_class_parameters_come_from_generic_base() {
    let source = "\
from typing import Generic, TypeVar
T = TypeVar('T')
class Box(Generic[T]):
    def get(self) -> T:
        return self.value
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    let class = fixture.nth_node(NodeKind::Class, 0);
    let result = checker.get_type_of_class(class).unwrap();
    let detail = checker.types().class_of(result.class_type).unwrap();
    assert_eq!(detail.type_parameters.len(), 1);

    // Methods share their class's TypeVar scope.
    let method = fixture.nth_node(NodeKind::Function, 0);
    let function = checker.get_type_of_function(method).unwrap();
    let types = checker.types();
    let details = types.get(function.function_type).unwrap().function_details();
    let declared = types.function(details.unwrap()).unwrap().declared_return_type;
    let Some(TypeKind::TypeVar { scope_id, .. }) =
        declared.and_then(|ty| types.get(ty)).map(|t| &t.kind)
    else {
        panic!("expected a TypeVar return type");
    };
    assert_eq!(scope_id.as_deref(), Some("test.Box"));
}

#[test]
fn async_and_generator_functions() {
    let source = "\
async def fetch() -> int:
    return 1

def numbers():
    yield 1
    yield 2

c = fetch()
g = numbers()
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(
        type_of(&mut checker, fixture.name("c", 0)),
        "Coroutine[Any, Any, int]"
    );
    assert_eq!(
        type_of(&mut checker, fixture.name("g", 0)),
        "Generator[Literal[1] | Literal[2], Any, None]"
    );
}

#[test]
fn decorated_overloads_combine() {
    let source = "\
from typing import overload

@overload
def parse(v: int) -> int: ...
@overload
def parse(v: str) -> str: ...
def parse(v):
    return v

x = parse
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("x", 0)), "Overload[3]");
}

#[test]
fn imports_resolve_synthesized_modules() {
    let source = "\
import typing
from abc import ABC, abstractmethod
from missing import thing
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("typing", 0)), "Module(typing)");
    assert_eq!(type_of(&mut checker, fixture.name("ABC", 0)), "type[ABC]");
    assert_eq!(type_of(&mut checker, fixture.name("thing", 0)), "Unknown");
}

#[test]
fn annotations_expand_typing_forms() {
    let source = "\
from typing import Optional, Union, List
a: Optional[int] = None
b: Union[int, str] = 1
c: List[str] = []
d: int | None = None
";
    let fixture = Fixture::new(source);
    let mut checker = fixture.checker();
    assert_eq!(type_of(&mut checker, fixture.name("a", 0)), "int | None");
    assert_eq!(type_of(&mut checker, fixture.name("b", 0)), "int | str");
    assert_eq!(type_of(&mut checker, fixture.name("c", 0)), "list[str]");
    assert_eq!(type_of(&mut checker, fixture.name("d", 0)), "int | None");
}
