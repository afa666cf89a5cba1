//! Canonical names for the closed enumerations and bitmasks that appear in
//! debug dumps.
//!
//! Every renderer takes the raw code so that values from a newer tree or type
//! model still print: anything outside a table renders as
//! `Unknown Value!! (<raw>)`. Bitmasks list their set names in table order,
//! comma-joined, or `None` when no known bit is set.

use std::borrow::Cow;

use pyz_common::{LineMap, TextRange};
use pyz_parser::ErrorCategory;
use pyz_scanner::{KeywordKind, NewLineKind, OperatorKind, StringFlags, Token, TokenKind};
use pyz_solver::{ClassTypeFlags, FunctionTypeFlags, TypeCategory, TypeFlags, Variance};

const TOKEN_KIND_NAMES: [&str; TokenKind::COUNT] = [
    "Invalid",
    "EndOfStream",
    "NewLine",
    "Indent",
    "Dedent",
    "String",
    "Number",
    "Identifier",
    "Keyword",
    "Operator",
    "Colon",
    "Semicolon",
    "Comma",
    "OpenParenthesis",
    "CloseParenthesis",
    "OpenBracket",
    "CloseBracket",
    "OpenCurlyBrace",
    "CloseCurlyBrace",
    "Ellipsis",
    "Dot",
    "Arrow",
    "Backtick",
];

const NEW_LINE_KIND_NAMES: [&str; NewLineKind::COUNT] = [
    "CarriageReturn",
    "LineFeed",
    "CarriageReturnLineFeed",
    "Implied",
];

const OPERATOR_NAMES: [&str; OperatorKind::COUNT] = [
    "Add",
    "AddEqual",
    "Assign",
    "BitwiseAnd",
    "BitwiseAndEqual",
    "BitwiseInvert",
    "BitwiseOr",
    "BitwiseOrEqual",
    "BitwiseXor",
    "BitwiseXorEqual",
    "Divide",
    "DivideEqual",
    "Equals",
    "FloorDivide",
    "FloorDivideEqual",
    "GreaterThan",
    "GreaterThanOrEqual",
    "LeftShift",
    "LeftShiftEqual",
    "LessOrGreaterThan",
    "LessThan",
    "LessThanOrEqual",
    "MatrixMultiply",
    "MatrixMultiplyEqual",
    "Mod",
    "ModEqual",
    "Multiply",
    "MultiplyEqual",
    "NotEquals",
    "Power",
    "PowerEqual",
    "RightShift",
    "RightShiftEqual",
    "Subtract",
    "SubtractEqual",
    "Walrus",
    "And",
    "Or",
    "Not",
    "Is",
    "IsNot",
    "In",
    "NotIn",
];

const KEYWORD_NAMES: [&str; KeywordKind::COUNT] = [
    "And", "As", "Assert", "Async", "Await", "Break", "Class", "Continue", "Debug", "Def", "Del",
    "Elif", "Else", "Except", "False", "Finally", "For", "From", "Global", "If", "Import", "In",
    "Is", "Lambda", "None", "Nonlocal", "Not", "Or", "Pass", "Raise", "Return", "True", "Try",
    "While", "With", "Yield",
];

const ERROR_CATEGORY_NAMES: [&str; ErrorCategory::COUNT] = [
    "MissingIn",
    "MissingElse",
    "MissingExpression",
    "MissingIndexOrSlice",
    "MissingDecoratorCallName",
    "MissingCallCloseParen",
    "MissingIndexCloseBracket",
    "MissingMemberAccessName",
    "MissingTupleCloseParen",
    "MissingListCloseBracket",
    "MissingFunctionParameterList",
    "MaxDepthExceeded",
];

const TYPE_CATEGORY_NAMES: [&str; TypeCategory::COUNT] = [
    "Unbound",
    "Unknown",
    "Any",
    "None",
    "Never",
    "Function",
    "OverloadedFunction",
    "Class",
    "Module",
    "Union",
    "TypeVar",
];

const VARIANCE_NAMES: [&str; Variance::COUNT] = ["Invariant", "Covariant", "Contravariant"];

// Shared by parameters and param-spec entries.
const PARAMETER_CATEGORY_NAMES: [&str; 3] = ["Simple", "VarArgList", "VarArgDictionary"];

const ARGUMENT_CATEGORY_NAMES: [&str; 3] = ["Simple", "UnpackedList", "UnpackedDictionary"];

const STRING_FLAG_NAMES: &[(u32, &str)] = &[
    (StringFlags::SINGLE_QUOTE.bits(), "SingleQuote"),
    (StringFlags::DOUBLE_QUOTE.bits(), "DoubleQuote"),
    (StringFlags::TRIPLICATE.bits(), "Triplicate"),
    (StringFlags::RAW.bits(), "Raw"),
    (StringFlags::UNICODE.bits(), "Unicode"),
    (StringFlags::BYTES.bits(), "Bytes"),
    (StringFlags::FORMAT.bits(), "Format"),
    (StringFlags::UNTERMINATED.bits(), "Unterminated"),
];

const TYPE_FLAG_NAMES: &[(u32, &str)] = &[
    (TypeFlags::INSTANTIABLE.bits(), "Instantiable"),
    (TypeFlags::INSTANCE.bits(), "Instance"),
];

const CLASS_FLAG_NAMES: &[(u32, &str)] = &[
    (ClassTypeFlags::BUILT_IN_CLASS.bits(), "BuiltInClass"),
    (ClassTypeFlags::SPECIAL_BUILT_IN.bits(), "SpecialBuiltIn"),
    (ClassTypeFlags::DATA_CLASS.bits(), "DataClass"),
    (ClassTypeFlags::FROZEN_DATA_CLASS.bits(), "FrozenDataClass"),
    (
        ClassTypeFlags::SKIP_SYNTHESIZED_DATA_CLASS_INIT.bits(),
        "SkipSynthesizedDataClassInit",
    ),
    (
        ClassTypeFlags::SKIP_SYNTHESIZED_DATA_CLASS_EQ.bits(),
        "SkipSynthesizedDataClassEq",
    ),
    (
        ClassTypeFlags::SYNTHESIZED_DATA_CLASS_ORDER.bits(),
        "SynthesizedDataClassOrder",
    ),
    (ClassTypeFlags::TYPED_DICT_CLASS.bits(), "TypedDictClass"),
    (ClassTypeFlags::CAN_OMIT_DICT_VALUES.bits(), "CanOmitDictValues"),
    (
        ClassTypeFlags::SUPPORTS_ABSTRACT_METHODS.bits(),
        "SupportsAbstractMethods",
    ),
    (ClassTypeFlags::PROPERTY_CLASS.bits(), "PropertyClass"),
    (ClassTypeFlags::FINAL.bits(), "Final"),
    (ClassTypeFlags::PROTOCOL_CLASS.bits(), "ProtocolClass"),
    (ClassTypeFlags::PSEUDO_GENERIC_CLASS.bits(), "PseudoGenericClass"),
    (ClassTypeFlags::RUNTIME_CHECKABLE.bits(), "RuntimeCheckable"),
    (ClassTypeFlags::TYPING_EXTENSION_CLASS.bits(), "TypingExtensionClass"),
    (ClassTypeFlags::PARTIALLY_EVALUATED.bits(), "PartiallyEvaluated"),
    (
        ClassTypeFlags::HAS_CUSTOM_CLASS_GET_ITEM.bits(),
        "HasCustomClassGetItem",
    ),
    (ClassTypeFlags::TUPLE_CLASS.bits(), "TupleClass"),
    (ClassTypeFlags::ENUM_CLASS.bits(), "EnumClass"),
    (
        ClassTypeFlags::DATA_CLASS_KEYWORD_ONLY_PARAMS.bits(),
        "DataClassKeywordOnlyParams",
    ),
    (ClassTypeFlags::CLASS_PROPERTY.bits(), "ClassProperty"),
    (ClassTypeFlags::DEFINED_IN_STUB.bits(), "DefinedInStub"),
    (
        ClassTypeFlags::READ_ONLY_INSTANCE_VARIABLES.bits(),
        "ReadOnlyInstanceVariables",
    ),
    (
        ClassTypeFlags::GENERATE_DATA_CLASS_SLOTS.bits(),
        "GenerateDataClassSlots",
    ),
    (
        ClassTypeFlags::SYNTHESIZE_DATA_CLASS_UNSAFE_HASH.bits(),
        "SynthesizeDataClassUnsafeHash",
    ),
];

const FUNCTION_FLAG_NAMES: &[(u32, &str)] = &[
    (FunctionTypeFlags::CONSTRUCTOR_METHOD.bits(), "ConstructorMethod"),
    (FunctionTypeFlags::CLASS_METHOD.bits(), "ClassMethod"),
    (FunctionTypeFlags::STATIC_METHOD.bits(), "StaticMethod"),
    (FunctionTypeFlags::ABSTRACT_METHOD.bits(), "AbstractMethod"),
    (FunctionTypeFlags::GENERATOR.bits(), "Generator"),
    (FunctionTypeFlags::DISABLE_DEFAULT_CHECKS.bits(), "DisableDefaultChecks"),
    (FunctionTypeFlags::SYNTHESIZED_METHOD.bits(), "SynthesizedMethod"),
    (FunctionTypeFlags::SKIP_CONSTRUCTOR_CHECK.bits(), "SkipConstructorCheck"),
    (FunctionTypeFlags::OVERLOADED.bits(), "Overloaded"),
    (FunctionTypeFlags::ASYNC.bits(), "Async"),
    (
        FunctionTypeFlags::WRAP_RETURN_TYPE_IN_AWAIT.bits(),
        "WrapReturnTypeInAwait",
    ),
    (FunctionTypeFlags::STUB_DEFINITION.bits(), "StubDefinition"),
    (FunctionTypeFlags::PY_TYPED_DEFINITION.bits(), "PyTypedDefinition"),
    (FunctionTypeFlags::FINAL.bits(), "Final"),
    (FunctionTypeFlags::UNANNOTATED_PARAMS.bits(), "UnannotatedParams"),
    (
        FunctionTypeFlags::SKIP_ARGS_KWARGS_COMPATIBILITY_CHECK.bits(),
        "SkipArgsKwargsCompatibilityCheck",
    ),
    (FunctionTypeFlags::PARAM_SPEC_VALUE.bits(), "ParamSpecValue"),
];

fn unknown_value(raw: u32) -> String {
    format!("Unknown Value!! ({raw})")
}

fn enum_name(table: &'static [&'static str], raw: u32) -> Cow<'static, str> {
    match table.get(raw as usize) {
        Some(&name) => Cow::Borrowed(name),
        None => Cow::Owned(unknown_value(raw)),
    }
}

fn flag_names(table: &[(u32, &str)], raw: u32) -> String {
    let names: Vec<&str> = table
        .iter()
        .filter(|(bit, _)| raw & bit != 0)
        .map(|&(_, name)| name)
        .collect();
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(",")
    }
}

pub fn token_kind_name(raw: u32) -> Cow<'static, str> {
    enum_name(&TOKEN_KIND_NAMES, raw)
}

pub fn new_line_kind_name(raw: u32) -> Cow<'static, str> {
    enum_name(&NEW_LINE_KIND_NAMES, raw)
}

pub fn operator_name(raw: u32) -> Cow<'static, str> {
    enum_name(&OPERATOR_NAMES, raw)
}

pub fn keyword_name(raw: u32) -> Cow<'static, str> {
    enum_name(&KEYWORD_NAMES, raw)
}

pub fn error_category_name(raw: u32) -> Cow<'static, str> {
    enum_name(&ERROR_CATEGORY_NAMES, raw)
}

pub fn variance_name(raw: u32) -> Cow<'static, str> {
    enum_name(&VARIANCE_NAMES, raw)
}

pub fn parameter_category_name(raw: u32) -> Cow<'static, str> {
    enum_name(&PARAMETER_CATEGORY_NAMES, raw)
}

pub fn argument_category_name(raw: u32) -> Cow<'static, str> {
    enum_name(&ARGUMENT_CATEGORY_NAMES, raw)
}

/// Type category name. A class category reads `Class` for the class object
/// itself and `Object` for its instances.
pub fn type_category_name(raw: u32, instantiable: bool) -> Cow<'static, str> {
    if raw == TypeCategory::Class as u32 && !instantiable {
        return Cow::Borrowed("Object");
    }
    enum_name(&TYPE_CATEGORY_NAMES, raw)
}

pub fn string_flag_names(raw: u32) -> String {
    flag_names(STRING_FLAG_NAMES, raw)
}

pub fn type_flag_names(raw: u32) -> String {
    flag_names(TYPE_FLAG_NAMES, raw)
}

pub fn class_flag_names(raw: u32) -> String {
    flag_names(CLASS_FLAG_NAMES, raw)
}

pub fn function_flag_names(raw: u32) -> String {
    flag_names(FUNCTION_FLAG_NAMES, raw)
}

/// `(line,col)-(line,col)` for a byte range.
pub fn text_span(range: TextRange, lines: &LineMap) -> String {
    lines.range_of(range).to_string()
}

/// One-line description of a token:
/// `(Kind[, NewLine][, Operator][, Keyword][, [StringFlags]], span) <json>`.
pub fn token_string(token: &Token, lines: &LineMap) -> String {
    let mut out = String::from("(");
    out.push_str(&token_kind_name(token.kind as u32));
    if let Some(kind) = token.new_line_kind() {
        out.push_str(", ");
        out.push_str(&new_line_kind_name(kind as u32));
    }
    if let Some(operator) = token.operator_kind() {
        out.push_str(", ");
        out.push_str(&operator_name(operator as u32));
    }
    if let Some(keyword) = token.keyword_kind() {
        out.push_str(", ");
        out.push_str(&keyword_name(keyword as u32));
    }
    if let Some(flags) = token.string_flags() {
        out.push_str(", [");
        out.push_str(&string_flag_names(flags.bits()));
        out.push(']');
    }
    out.push_str(", ");
    out.push_str(&text_span(token.range(), lines));
    out.push_str(") ");
    out.push_str(&serde_json::to_string(token).unwrap_or_default());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyz_scanner::TokenData;

    #[test]
    fn enum_names_follow_declaration_order() {
        assert_eq!(token_kind_name(TokenKind::Backtick as u32), "Backtick");
        assert_eq!(operator_name(OperatorKind::NotIn as u32), "NotIn");
        assert_eq!(keyword_name(KeywordKind::Debug as u32), "Debug");
        assert_eq!(variance_name(Variance::Covariant as u32), "Covariant");
        assert_eq!(parameter_category_name(2), "VarArgDictionary");
        assert_eq!(argument_category_name(1), "UnpackedList");
    }

    #[test]
    fn out_of_range_values_never_fail() {
        assert_eq!(type_category_name(99, false), "Unknown Value!! (99)");
        assert_eq!(token_kind_name(200), "Unknown Value!! (200)");
        assert_eq!(variance_name(3), "Unknown Value!! (3)");
    }

    #[test]
    fn class_category_depends_on_instantiability() {
        let class = TypeCategory::Class as u32;
        assert_eq!(type_category_name(class, true), "Class");
        assert_eq!(type_category_name(class, false), "Object");
        assert_eq!(type_category_name(TypeCategory::Module as u32, false), "Module");
    }

    #[test]
    fn bitmasks_render_in_table_order() {
        assert_eq!(function_flag_names(0), "None");
        assert_eq!(
            function_flag_names(FunctionTypeFlags::ASYNC.bits()),
            "Async"
        );
        let two = FunctionTypeFlags::OVERLOADED | FunctionTypeFlags::CLASS_METHOD;
        assert_eq!(function_flag_names(two.bits()), "ClassMethod,Overloaded");
        assert_eq!(
            type_flag_names((TypeFlags::INSTANCE | TypeFlags::INSTANTIABLE).bits()),
            "Instantiable,Instance"
        );
        assert_eq!(
            class_flag_names(ClassTypeFlags::BUILT_IN_CLASS.bits()),
            "BuiltInClass"
        );
    }

    #[test]
    fn token_string_includes_kind_specific_details() {
        let lines = LineMap::build("x += 'a'\n");
        let operator = Token::new(
            TokenKind::Operator,
            2,
            2,
            TokenData::Operator(OperatorKind::AddEqual),
        );
        let text = token_string(&operator, &lines);
        assert!(
            text.starts_with("(Operator, AddEqual, (0,2)-(0,4)) {"),
            "unexpected token string: {text}"
        );

        let string = Token::new(
            TokenKind::String,
            5,
            3,
            TokenData::String {
                flags: StringFlags::SINGLE_QUOTE,
                escaped_value: "a".to_string(),
                has_unescape_errors: false,
            },
        );
        let text = token_string(&string, &lines);
        assert!(
            text.starts_with("(String, [SingleQuote], (0,5)-(0,8)) "),
            "unexpected token string: {text}"
        );
    }
}
