//! Typedef mirroring, the worklist drain, declaration ordering and output
//! determinism.

mod common;

use common::*;
use cpp2c::model::*;

#[test]
fn plain_typedef_is_mirrored() {
    let unit = Unit {
        typedefs: vec![TypedefDef {
            qual_name: "MyInt".to_string(),
            name: "MyInt".to_string(),
            ty: TypeExpr::fundamental("int"),
        }],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    assert!(out.header.contains("typedef int MyInt;"));
}

#[test]
fn namespaced_typedef_gets_mangled_alias_and_cast() {
    let unit = Unit {
        typedefs: vec![TypedefDef {
            qual_name: "ns::Len".to_string(),
            name: "Len".to_string(),
            ty: TypeExpr::fundamental("unsigned long"),
        }],
        free_functions: vec![free_func(
            "take",
            TypeExpr::fundamental("void"),
            vec![ParamDef::new("n", TypeExpr::named("ns::Len", NamedKind::Typedef))],
        )],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    assert!(out.header.contains("typedef unsigned long ns_Len;"));
    assert!(out.header.contains("void take(bool *ptr_was_exception, ns_Len n);"));
    // The namespaced alias needs a cast back to the C++ spelling.
    assert!(out.cpp.contains("take((ns::Len)n);"));
}

#[test]
fn typedef_of_enum_is_mirrored_after_its_enum() {
    let unit = Unit {
        typedefs: vec![TypedefDef {
            qual_name: "ColorAlias".to_string(),
            name: "ColorAlias".to_string(),
            ty: TypeExpr::named("N::Color", NamedKind::Enum),
        }],
        extra_enums: vec![EnumDef {
            qual_name: "N::Color".to_string(),
            name: "Color".to_string(),
            values: vec![("Red".to_string(), 0)],
        }],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    assert!(out.header.contains("typedef enum N_Color ColorAlias;"));
    assert!(out.header.contains("enum N_Color {"));
    assert!(out.header.contains("\tRed1=0"));

    // The tag may not be forward-referenced: the enum declaration must
    // precede the mirror that names it.
    let enum_line = line_of(&out.header, "enum N_Color {");
    let typedef_line = line_of(&out.header, "typedef enum N_Color ColorAlias;");
    assert!(
        enum_line < typedef_line,
        "enum declared at line {enum_line}, typedef mirror at {typedef_line}"
    );
}

#[test]
fn typedef_of_enum_pointer_also_pulls_the_enum_forward() {
    let unit = Unit {
        typedefs: vec![TypedefDef {
            qual_name: "ColorPtr".to_string(),
            name: "ColorPtr".to_string(),
            ty: TypeExpr::ptr(TypeExpr::named("N::Color", NamedKind::Enum)),
        }],
        extra_enums: vec![EnumDef {
            qual_name: "N::Color".to_string(),
            name: "Color".to_string(),
            values: vec![("Red".to_string(), 0)],
        }],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    let enum_line = line_of(&out.header, "enum N_Color {");
    let typedef_line = line_of(&out.header, "typedef enum N_Color * ColorPtr;");
    assert!(
        enum_line < typedef_line,
        "enum declared at line {enum_line}, typedef mirror at {typedef_line}"
    );
}

#[test]
fn function_pointer_typedef_is_mirrored_with_declarator_name() {
    let unit = Unit {
        typedefs: vec![TypedefDef {
            qual_name: "callback_t".to_string(),
            name: "callback_t".to_string(),
            ty: TypeExpr::ptr(TypeExpr::Function {
                ret: Box::new(TypeExpr::fundamental("void")),
                params: vec![TypeExpr::fundamental("int")],
                variadic: false,
            }),
        }],
        free_functions: vec![free_func(
            "on_event",
            TypeExpr::fundamental("void"),
            vec![ParamDef::new(
                "cb",
                TypeExpr::named("callback_t", NamedKind::Typedef),
            )],
        )],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    assert!(out.header.contains("typedef void (*callback_t)(int);"));
    // A typedef'd function pointer keeps its alias in prototypes.
    assert!(out.header.contains("void on_event(bool *ptr_was_exception, callback_t cb);"));
    assert!(out.cpp.contains("on_event(cb);"));
}

#[test]
fn typedef_to_class_is_not_mirrored() {
    let unit = Unit {
        typedefs: vec![TypedefDef {
            qual_name: "Handle".to_string(),
            name: "Handle".to_string(),
            ty: TypeExpr::named("V", NamedKind::Class),
        }],
        extra_classes: vec![class("V")],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    assert!(!out.header.contains("typedef V"));
    assert!(!out.header.contains("typedef Handle"));
}

#[test]
fn declarations_precede_prototypes_in_the_header() {
    // The enum is only discovered while lowering the function, yet its
    // declaration must land above the prototype.
    let unit = Unit {
        free_functions: vec![free_func(
            "next",
            TypeExpr::fundamental("void"),
            vec![ParamDef::new("c", TypeExpr::named("N::Color", NamedKind::Enum))],
        )],
        extra_enums: vec![EnumDef {
            qual_name: "N::Color".to_string(),
            name: "Color".to_string(),
            values: vec![("Red".to_string(), 0)],
        }],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    let enum_line = line_of(&out.header, "enum N_Color {");
    let proto_line = line_of(&out.header, "void next(");
    assert!(
        enum_line < proto_line,
        "enum declared at line {enum_line}, prototype at {proto_line}"
    );
}

#[test]
fn transitively_referenced_class_is_drained() {
    // W is only reachable through V::wrap's return type.
    let mut v = class("V");
    v.methods.push(method(
        "V",
        "wrap",
        TypeExpr::ptr(TypeExpr::named("W", NamedKind::Class)),
        vec![],
    ));
    let unit = Unit {
        classes: vec![v],
        extra_classes: vec![class("W")],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    assert!(out.header.contains("typedef struct _W *PTR_W;"));
    // The drained class gets a full body too.
    assert!(out.header.contains("PTR_W W(bool *ptr_was_exception);"));
    assert!(
        out.header
            .contains("void W_delete_W(bool *ptr_was_exception, PTR_W class_this);")
    );
}

#[test]
fn runs_are_byte_identical() {
    let mut v = class("V");
    v.methods.push(method(
        "V",
        "f",
        TypeExpr::fundamental("int"),
        vec![ParamDef::new("x", TypeExpr::fundamental("int"))],
    ));
    let unit = Unit {
        classes: vec![v],
        enums: vec![EnumDef {
            qual_name: "Mode".to_string(),
            name: "Mode".to_string(),
            values: vec![("On".to_string(), 1)],
        }],
        ..Unit::default()
    };

    let first = generate(&unit, &c99_opts());
    let second = generate(&unit, &c99_opts());
    assert_eq!(first.header, second.header);
    assert_eq!(first.cpp, second.cpp);
    assert_eq!(first.def, second.def);
}

#[test]
fn emitted_identifiers_are_legal_and_unique() {
    let mut v = class("ns::V");
    v.methods.push(method(
        "ns::V",
        "f",
        TypeExpr::fundamental("int"),
        vec![],
    ));
    let unit = Unit {
        classes: vec![v],
        free_functions: vec![
            free_func("ns::f", TypeExpr::fundamental("void"), vec![]),
            free_func("f", TypeExpr::fundamental("void"), vec![]),
        ],
        ..Unit::default()
    };
    let out = generate(&unit, &c99_opts());
    let def = out.def.expect("def file");

    let mut seen = std::collections::HashSet::new();
    for line in def.lines().skip(2) {
        let name = line.trim();
        assert!(
            name.chars().next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false)
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "illegal C identifier: {name}"
        );
        assert!(seen.insert(name.to_string()), "duplicate identifier: {name}");
    }
    assert!(!seen.is_empty());
}
