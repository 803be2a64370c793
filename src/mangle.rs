//! Name mangling — pure functions from C++ qualified names to C identifiers.
//!
//! Everything here is deterministic and context-free; uniqueness across one
//! output translation unit is the [`Context`](crate::context::Context)
//! ledger's job, not ours.

/// Operator token → word form. Longest tokens must be tried first so that
/// `+=` wins over `+` and `<<=` over `<<`; callers get a pre-sorted view via
/// [`operators_longest_first`].
///
/// The `'='`/`'!='` pairings (`assign`/`not_assign`) replicate the legacy
/// wrapper ABI verbatim even though `not_assign` is a misnomer for `!=`.
pub const OPERATOR_MAP: &[(&str, &str)] = &[
    ("+", "plus"),
    ("-", "minus"),
    ("*", "multiply"),
    ("/", "division"),
    ("%", "mod"),
    ("^", "bitwise_xor"),
    ("&", "bitwise_and"),
    ("|", "bitwise_or"),
    ("~", "bitwise_not"),
    ("!", "not"),
    ("=", "assign"),
    ("<", "smaller"),
    (">", "bigger"),
    ("+=", "plus_assign"),
    ("-=", "minus_assign"),
    ("*=", "multiply_assign"),
    ("/=", "division_assign"),
    ("%=", "mod_assign"),
    ("^=", "bitwise_xor_assign"),
    ("&=", "bitwise_and_assign"),
    ("|=", "bitwise_or_assign"),
    ("<<", "shift_left"),
    (">>", "shift_right"),
    ("<<=", "shift_left_assign"),
    (">>=", "shift_right_assign"),
    ("==", "equal"),
    ("!=", "not_assign"),
    ("<=", "smaller_or_equal"),
    (">=", "bigger_or_equal"),
    ("&&", "and"),
    ("||", "or"),
    ("++", "plus_plus"),
    ("--", "minus_minus"),
    (",", "comma"),
    ("->*", "pointer_redirect"),
    ("->", "redirect"),
    ("()", "function_call"),
    ("[]", "subscript"),
    ("new", "new"),
    ("new []", "new_array"),
    ("delete", "delete"),
    ("delete []", "delete_array"),
];

/// The operator table sorted by descending token length.
pub fn operators_longest_first() -> Vec<(&'static str, &'static str)> {
    let mut table = OPERATOR_MAP.to_vec();
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    table
}

/// Translate one operator token (the part after the `operator` keyword) to
/// its word form. Spacing inside the token is ignored so both `new[]` and
/// `new []` resolve. Returns `None` for tokens outside the table (e.g.
/// user-defined literal suffixes).
pub fn operator_word(table: &[(&'static str, &'static str)], token: &str) -> Option<&'static str> {
    let wanted: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    table
        .iter()
        .find(|(tok, _)| tok.chars().filter(|c| !c.is_whitespace()).eq(wanted.chars()))
        .map(|(_, word)| *word)
}

/// Strip the global-namespace prefix of a C++ declaration string.
pub fn strip_global_ns(decl_str: &str) -> &str {
    decl_str.trim_start_matches(':')
}

/// Map a C++ qualified name to a legal C identifier stem.
///
/// Namespace separators become underscores, the destructor tilde becomes
/// `delete_`, and template punctuation is flattened.
pub fn c_name(qualified: &str) -> String {
    strip_global_ns(qualified)
        .replace("::", "_")
        .replace('~', "delete_")
        .replace('>', "_")
        .replace('<', "_")
        .replace(' ', "")
        .replace(',', "_")
        .replace('*', "_ptr_")
        .replace('&', "_ref_")
}

/// Opaque-handle type name for a class's mangled C name.
pub fn class_ptr_name(class_c_name: &str) -> String {
    format!("PTR_{class_c_name}")
}

/// C tag for a C++ enum. Global-scope enums get a `_C` suffix: unlike a
/// typedef, redeclaring an enum tag in the generated header is a hard C
/// compilation error when the original header is also visible.
pub fn enum_tag(qualified: &str, simple_name: &str) -> String {
    let tag = c_name(qualified);
    if tag == simple_name {
        format!("{tag}_C")
    } else {
        tag
    }
}

/// The last `::`-separated segment of a qualified name, ignoring separators
/// nested inside template argument lists.
pub fn last_segment(qualified: &str) -> &str {
    let mut depth = 0usize;
    let bytes = qualified.as_bytes();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && i + 1 < bytes.len() && bytes[i + 1] == b':' => {
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    &qualified[start..]
}

/// Everything before the last `::`-separated segment, template-aware.
/// Returns `""` for unqualified names.
pub fn qualifier_prefix(qualified: &str) -> &str {
    let tail = last_segment(qualified);
    let cut = qualified.len() - tail.len();
    qualified[..cut].trim_end_matches(':')
}

/// snake_case → UpperCamelCase, e.g. `func_name` → `FuncName`.
pub fn camel_case(identifier: &str) -> String {
    identifier
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Header guard for a generated header file name, e.g.
/// `Foo_C_Wrapper.h` → `FOO_C_WRAPPER_H`.
pub fn header_guard(generated_header_file_name: &str) -> String {
    generated_header_file_name.to_uppercase().replace('.', "_")
}
