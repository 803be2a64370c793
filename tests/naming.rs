//! Name mangling, the operator table and the uniqueness ledger.

use cpp2c::context::Context;
use cpp2c::mangle;

#[test]
fn qualified_names_flatten_to_c_identifiers() {
    assert_eq!(mangle::c_name("ns::Widget"), "ns_Widget");
    assert_eq!(mangle::c_name("::ns::Widget"), "ns_Widget");
    assert_eq!(mangle::c_name("A::~A"), "A_delete_A");
    assert_eq!(mangle::c_name("v<int, char>"), "v_int_char_");
    assert_eq!(mangle::c_name("T*"), "T_ptr_");
    assert_eq!(mangle::c_name("T&"), "T_ref_");
}

#[test]
fn operator_words_scan_longest_token_first() {
    let table = mangle::operators_longest_first();
    assert_eq!(mangle::operator_word(&table, "+"), Some("plus"));
    assert_eq!(mangle::operator_word(&table, "+="), Some("plus_assign"));
    assert_eq!(mangle::operator_word(&table, "<<"), Some("shift_left"));
    assert_eq!(mangle::operator_word(&table, "<<="), Some("shift_left_assign"));
    assert_eq!(mangle::operator_word(&table, "()"), Some("function_call"));
    assert_eq!(mangle::operator_word(&table, "[]"), Some("subscript"));
    // Whitespace inside the token is irrelevant.
    assert_eq!(mangle::operator_word(&table, "new []"), Some("new_array"));
    assert_eq!(mangle::operator_word(&table, "new[]"), Some("new_array"));
    assert_eq!(mangle::operator_word(&table, "delete []"), Some("delete_array"));
    // Legacy pairings, replicated as-is.
    assert_eq!(mangle::operator_word(&table, "="), Some("assign"));
    assert_eq!(mangle::operator_word(&table, "!="), Some("not_assign"));
    // Conversion operators are not in the table.
    assert_eq!(mangle::operator_word(&table, "int"), None);
}

#[test]
fn ledger_numbers_duplicates_in_emission_order() {
    let mut ctx = Context::new(false);
    assert_eq!(ctx.unique_token("f", false), "f");
    assert_eq!(ctx.unique_token("f", false), "f1");
    assert_eq!(ctx.unique_token("f", false), "f2");
    assert_eq!(ctx.unique_token("g", false), "g");
}

#[test]
fn ledger_always_suffixes_when_forced() {
    let mut ctx = Context::new(false);
    assert_eq!(ctx.unique_token("X", true), "X1");
    assert_eq!(ctx.unique_token("X", true), "X2");
}

#[test]
fn camel_case_capitalizes_words() {
    assert_eq!(mangle::camel_case("func_name"), "FuncName");
    assert_eq!(mangle::camel_case("do_thing2"), "DoThing2");
    assert_eq!(mangle::camel_case("a"), "A");
}

#[test]
fn header_guard_uppercases_and_replaces_dots() {
    assert_eq!(mangle::header_guard("Foo_C_Wrapper.h"), "FOO_C_WRAPPER_H");
}

#[test]
fn enum_tags_avoid_global_redefinition() {
    assert_eq!(mangle::enum_tag("Mode", "Mode"), "Mode_C");
    assert_eq!(mangle::enum_tag("ns::Mode", "Mode"), "ns_Mode");
}

#[test]
fn segment_helpers_are_template_aware() {
    let name = "std::basic_string<char, std::char_traits<char> >";
    assert_eq!(
        mangle::last_segment(name),
        "basic_string<char, std::char_traits<char> >"
    );
    assert_eq!(mangle::qualifier_prefix(name), "std");
    assert_eq!(mangle::last_segment("f"), "f");
    assert_eq!(mangle::qualifier_prefix("f"), "");
}

#[test]
fn class_ptr_names() {
    assert_eq!(mangle::class_ptr_name("std_string"), "PTR_std_string");
}
