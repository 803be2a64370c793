//! Generator option combinations: exception handling, error argument,
//! operators, camel case, verbose comments and the def file.

mod common;

use common::*;
use cpp2c::emit::GenOptions;
use cpp2c::model::*;

fn widget_unit() -> Unit {
    let mut w = class("Widget");
    w.methods.push(method(
        "Widget",
        "resize",
        TypeExpr::fundamental("void"),
        vec![ParamDef::new("size", TypeExpr::fundamental("int"))],
    ));
    let mut eq = func(
        DeclKind::MemberOp,
        "Widget::operator==",
        Some("Widget"),
        TypeExpr::fundamental("bool"),
        vec![ParamDef::new(
            "arg0",
            TypeExpr::reference(TypeExpr::konst(TypeExpr::named("Widget", NamedKind::Class))),
        )],
    );
    eq.is_const = true;
    w.operators.push(eq);
    Unit {
        classes: vec![w],
        free_functions: vec![free_func(
            "do_thing",
            TypeExpr::fundamental("void"),
            vec![],
        )],
        ..Unit::default()
    }
}

#[test]
fn nothrow_mode_drops_try_catch_and_uses_nothrow_new() {
    let opts = GenOptions {
        exceptions: false,
        error_arg: false,
        ..c99_opts()
    };
    let out = generate(&widget_unit(), &opts);

    assert!(!out.cpp.contains("try {"));
    assert!(!out.cpp.contains("catch(...)"));
    assert!(!out.header.contains("ptr_was_exception"));
    assert!(out.cpp.contains("return (PTR_Widget)new (std::nothrow) Widget;"));
}

#[test]
fn error_argument_can_be_disabled_independently() {
    let opts = GenOptions {
        error_arg: false,
        ..c99_opts()
    };
    let out = generate(&widget_unit(), &opts);

    // Still wrapped, but no flag parameter and no flag writes.
    assert!(out.cpp.contains("try {"));
    assert!(!out.header.contains("ptr_was_exception"));
    assert!(!out.cpp.contains("(*ptr_was_exception)"));
    assert!(out.header.contains("void Widget_resize(PTR_Widget class_this, int size);"));
}

#[test]
fn exception_wrapper_writes_the_flag_when_present() {
    let out = generate(&widget_unit(), &c99_opts());
    assert!(
        out.cpp
            .contains("if((void *)ptr_was_exception != NULL) (*ptr_was_exception) = false;")
    );
    assert!(
        out.cpp
            .contains("if((void *)ptr_was_exception != NULL) (*ptr_was_exception) = true;")
    );
}

#[test]
fn pre_c99_wrapper_uses_compat_macros() {
    let out = generate(&widget_unit(), &GenOptions::default());
    assert!(
        out.cpp
            .contains("if((void *)ptr_was_exception != NULL) (*ptr_was_exception) = FALSE_C;")
    );
    assert!(
        out.cpp
            .contains("if((void *)ptr_was_exception != NULL) (*ptr_was_exception) = TRUE_C;")
    );
    assert!(
        out.header
            .contains("void Widget_resize(BOOL_C *ptr_was_exception, PTR_Widget class_this, int size);")
    );
}

#[test]
fn operators_can_be_suppressed() {
    let opts = GenOptions {
        operators: false,
        ..c99_opts()
    };
    let out = generate(&widget_unit(), &opts);
    assert!(!out.header.contains("operator_equal"));

    let out = generate(&widget_unit(), &c99_opts());
    assert!(out.header.contains(
        "bool Widget_operator_equal_const(bool *ptr_was_exception, const PTR_Widget class_this, const PTR_Widget arg0);"
    ));
}

#[test]
fn def_file_is_suppressed_with_dl_off() {
    let opts = GenOptions {
        generate_dl: false,
        ..c99_opts()
    };
    let out = generate(&widget_unit(), &opts);
    assert!(out.def.is_none());
    assert!(!out.cpp.contains("DllMain"));
}

#[test]
fn dll_main_boilerplate_is_emitted_with_dl_on() {
    let out = generate(&widget_unit(), &c99_opts());
    assert!(out.cpp.contains("#ifdef WIN32"));
    assert!(out.cpp.contains("extern \"C\" BOOL WINAPI DllMain("));
    assert!(out.cpp.contains("DLL_PROCESS_ATTACH"));
}

#[test]
fn camel_case_renames_functions_and_exports() {
    let opts = GenOptions {
        camel_case: true,
        ..c99_opts()
    };
    let out = generate(&widget_unit(), &opts);
    assert!(out.header.contains("void DoThing(bool *ptr_was_exception);"));
    assert!(!out.header.contains("void do_thing("));
    let def = out.def.expect("def file");
    assert!(def.contains("\tDoThing\n"));
}

#[test]
fn verbose_comments_follow_the_flag() {
    let out = generate(&widget_unit(), &c99_opts());
    assert!(out.header.contains("/* A C wrapper for class Widget */"));
    assert!(out.header.contains("/* A C wrapper for func do_thing() */"));

    let opts = GenOptions {
        verbose: false,
        ..c99_opts()
    };
    let out = generate(&widget_unit(), &opts);
    assert!(!out.header.contains("A C wrapper for"));
}

#[test]
fn full_string_mode_skips_the_compact_surface() {
    // With no std::string typedef in the unit the special case is a no-op
    // either way; with one present, full mode emits nothing up front.
    let unit = Unit {
        extra_classes: vec![class("std::basic_string<char>")],
        extra_typedefs: vec![TypedefDef {
            qual_name: "std::string".to_string(),
            name: "string".to_string(),
            ty: TypeExpr::named("std::basic_string<char>", NamedKind::Class),
        }],
        ..Unit::default()
    };
    let opts = GenOptions {
        compact_string: false,
        ..c99_opts()
    };
    let out = generate(&unit, &opts);
    assert!(!out.header.contains("PTR_std_string"));

    let out = generate(&unit, &c99_opts());
    assert!(out.header.contains("PTR_std_string"));
}
