//! Shared fixture builders for the pipeline tests.
#![allow(dead_code)]

use cpp2c::emit::{GenOptions, Outputs};
use cpp2c::model::*;

/// Run the whole translation over a hand-built unit for input `Foo.h`.
pub fn generate(unit: &Unit, opts: &GenOptions) -> Outputs {
    cpp2c::generate_from_decls(unit, "Foo.h", opts).expect("translation failed")
}

/// Default options, C99 mode (native `bool` in prototypes).
pub fn c99_opts() -> GenOptions {
    GenOptions {
        c99: true,
        ..GenOptions::default()
    }
}

pub fn func(
    kind: DeclKind,
    qual_name: &str,
    parent: Option<&str>,
    ret: TypeExpr,
    params: Vec<ParamDef>,
) -> FuncDef {
    FuncDef {
        kind,
        qual_name: qual_name.to_string(),
        name: cpp2c::mangle::last_segment(qual_name).to_string(),
        parent: parent.map(str::to_string),
        ret,
        params,
        is_static: false,
        is_const: false,
        is_variadic: false,
    }
}

pub fn free_func(qual_name: &str, ret: TypeExpr, params: Vec<ParamDef>) -> FuncDef {
    func(DeclKind::FreeFunc, qual_name, None, ret, params)
}

pub fn method(class_qual: &str, name: &str, ret: TypeExpr, params: Vec<ParamDef>) -> FuncDef {
    func(
        DeclKind::MemberFunc,
        &format!("{class_qual}::{name}"),
        Some(class_qual),
        ret,
        params,
    )
}

/// Unqualified class name, without template arguments — what the parser
/// reports as the declaration's own name.
fn simple_of(qual_name: &str) -> &str {
    cpp2c::mangle::last_segment(qual_name)
        .split('<')
        .next()
        .unwrap()
}

pub fn ctor(class_qual: &str, params: Vec<ParamDef>) -> FuncDef {
    let simple = simple_of(class_qual);
    let mut f = func(
        DeclKind::Ctor,
        &format!("{class_qual}::{simple}"),
        Some(class_qual),
        TypeExpr::fundamental("void"),
        params,
    );
    f.name = simple.to_string();
    f
}

pub fn dtor(class_qual: &str) -> FuncDef {
    let simple = simple_of(class_qual);
    let mut f = func(
        DeclKind::Dtor,
        &format!("{class_qual}::~{simple}"),
        Some(class_qual),
        TypeExpr::fundamental("void"),
        vec![],
    );
    f.name = format!("~{simple}");
    f
}

/// A complete, default-constructible, copyable class with a public dtor.
pub fn class(qual_name: &str) -> ClassDef {
    let simple = simple_of(qual_name).to_string();
    ClassDef {
        qual_name: qual_name.to_string(),
        name: simple,
        is_complete: true,
        ctors: vec![ctor(qual_name, vec![])],
        dtor: Some(dtor(qual_name)),
        has_public_dtor: true,
        methods: vec![],
        operators: vec![],
        has_copy_ctor: Some(true),
        has_default_ctor_and_assign: Some(true),
    }
}

/// Line index of the first line containing `needle`.
pub fn line_of(text: &str, needle: &str) -> usize {
    text.lines()
        .position(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("'{needle}' not found in:\n{text}"))
}
