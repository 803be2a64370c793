//! Lowering — C++ types and callables to C-surface descriptions.
//!
//! [`ArgInfo`] peels a [`TypeExpr`] one layer at a time into a C type string
//! plus the flags the thunk generator needs; [`FuncInfo`] classifies a
//! callable and lowers its signature. Both register transitively referenced
//! classes/typedefs/enums into the [`Context`] worklists as they go.

use thiserror::Error;

use crate::context::Context;
use crate::mangle;
use crate::model::{DeclKind, DeclSource, FuncDef, NamedKind, TypeExpr};

/// Synthetic identifier for the implicit `this` parameter.
pub const THIS_VAR_NAME: &str = "class_this";
/// Synthetic identifier for the `new[]` element-count parameter.
pub const ARRAY_SIZE_VAR_NAME: &str = "arr_size";
/// Synthetic identifier for the caller-provided error flag.
pub const WAS_EXCEPTION_ARG_NAME: &str = "ptr_was_exception";
/// Temporary used by the default-construct-then-assign return strategy.
pub const RET_VAL_CLASS_NAME: &str = "ptr_ret_val_class";
/// Sentinel returned from a thunk when a C++ exception was intercepted.
pub const RET_VAL_ON_EXCEPTION: &str = "NULL";
/// Pre-C99 bool compatibility names.
pub const C_BOOL_TYPE_NAME: &str = "BOOL_C";
pub const C_TRUE_VAL: &str = "TRUE_C";
pub const C_FALSE_VAL: &str = "FALSE_C";

/// A construct the C surface cannot express. Skipped (with a warning) or
/// escalated depending on `ignore_unsupported_features`.
#[derive(Debug, Error)]
#[error("unsupported feature: {0}")]
pub struct Unsupported(pub String);

pub type LowerResult<T> = Result<T, Unsupported>;

/// Render a base type plus its pointer levels, innermost first.
fn assemble_c_type(is_const: bool, base: &str, ptrs: &[bool]) -> String {
    let mut out = String::new();
    if is_const {
        out.push_str("const ");
    }
    out.push_str(base);
    // Pointers read right to left, so the stack is rendered reversed.
    for &level_const in ptrs.iter().rev() {
        out.push_str(if level_const { "* const" } else { "*" });
    }
    out
}

/// A lowered C++ type: the C-surface type string, an optional cast, and the
/// flags that drive thunk generation.
#[derive(Debug, Clone)]
pub struct ArgInfo {
    /// C type string as it appears in the generated prototype.
    pub c_type: String,
    /// Cast applied when bridging; empty when none is needed. Arguments cast
    /// C→C++ with this string, returns cast C++→C with `c_type`.
    pub cast: String,
    /// Parameter name ("" for return types).
    pub name: String,
    pub is_const: bool,
    pub is_ref: bool,
    pub is_class: bool,
    pub is_ptr: bool,
    pub is_enum: bool,
    pub is_typedef: bool,
    pub is_func_ptr: bool,
    /// One implicit indirection is inserted at the call site (`*` on
    /// arguments, heap placement on by-value class returns).
    pub is_redirected: bool,
    /// Plain C declaration — eligible for typedef mirroring.
    pub is_c_decl: bool,
    /// Substituted C++ name of the class leaf, for casts and `new`.
    pub class_name: String,
    pub can_copy: Option<bool>,
    pub can_default_assign: Option<bool>,
    is_void: bool,
}

impl ArgInfo {
    /// Lower `ty`, registering discovered declarations in `ctx`.
    pub fn lower(
        ty: &TypeExpr,
        src: &dyn DeclSource,
        ctx: &mut Context,
        name: &str,
    ) -> LowerResult<ArgInfo> {
        let spelling = ty.cpp_spelling();
        if spelling.contains("std::_Aux_cont") {
            // MSVC auxiliary container internals leak into some template
            // instantiations and have no C counterpart.
            return Err(Unsupported(format!(
                "no support for std::_Aux_cont in: {spelling}"
            )));
        }

        let mut info = ArgInfo {
            c_type: String::new(),
            cast: String::new(),
            name: name.to_string(),
            is_const: false,
            is_ref: false,
            is_class: false,
            is_ptr: false,
            is_enum: false,
            is_typedef: false,
            is_func_ptr: false,
            is_redirected: false,
            is_c_decl: false,
            class_name: String::new(),
            can_copy: None,
            can_default_assign: None,
            is_void: ty.is_void(),
        };

        // Const flags pushed per pointer level; the current-level flag lives
        // in info.is_const and is consumed by each pointer layer.
        let mut ptrs: Vec<bool> = Vec::new();
        // First typedef on the chain — the one whose name appears in the
        // outer spelling and therefore the one rewritten to its C alias.
        let mut first_typedef: Option<(String, String)> = None;
        let mut func_ptr: Option<FuncPtrInfo> = None;
        let mut class_leaf: Option<String> = None;
        let mut enum_leaf: Option<String> = None;
        let mut leaf_spelling = String::new();

        let mut cur = ty.clone();
        loop {
            match cur {
                TypeExpr::Named {
                    name: type_name,
                    kind: NamedKind::Typedef,
                } => {
                    info.is_typedef = true;
                    let (qual, c_alias) = ctx.typedef_data(&type_name);
                    let target = src.lookup_typedef(&type_name).ok_or_else(|| {
                        Unsupported(format!("unresolvable typedef {type_name}"))
                    })?;
                    if first_typedef.is_none() {
                        first_typedef = Some((qual, c_alias));
                    }
                    cur = target.ty;
                }
                TypeExpr::Named {
                    name: type_name,
                    kind: NamedKind::Class,
                } => {
                    info.is_class = true;
                    class_leaf = Some(type_name);
                    break;
                }
                TypeExpr::Named {
                    name: type_name,
                    kind: NamedKind::Enum,
                } => {
                    info.is_enum = true;
                    enum_leaf = Some(type_name);
                    break;
                }
                TypeExpr::Const(inner) => {
                    info.is_const = true;
                    cur = *inner;
                }
                TypeExpr::Volatile(inner) => {
                    cur = *inner;
                }
                TypeExpr::Pointer(inner) => match *inner {
                    TypeExpr::Function {
                        ret,
                        params,
                        variadic,
                    } => {
                        if variadic {
                            return Err(Unsupported(
                                "ellipsis arg types are not handled".to_string(),
                            ));
                        }
                        info.is_func_ptr = true;
                        func_ptr = Some(FuncPtrInfo::lower(&ret, &params, name, src, ctx)?);
                        break;
                    }
                    pointee => {
                        ptrs.push(info.is_const);
                        info.is_const = false;
                        cur = pointee;
                    }
                },
                TypeExpr::Array(inner) => {
                    ptrs.push(info.is_const);
                    info.is_const = false;
                    cur = *inner;
                }
                TypeExpr::Reference(inner) => {
                    // Only the outermost reference counts; further references
                    // on the chain flatten into it.
                    info.is_ref = true;
                    cur = *inner;
                }
                TypeExpr::Fundamental(s) => {
                    leaf_spelling = s;
                    break;
                }
                TypeExpr::Function { .. } => {
                    return Err(Unsupported(format!("bare function type: {spelling}")));
                }
                TypeExpr::MemberPointer => {
                    return Err(Unsupported(format!(
                        "member function pointers are not supported: {spelling}"
                    )));
                }
                TypeExpr::Ellipsis => {
                    return Err(Unsupported("ellipsis arg types are not handled".to_string()));
                }
                TypeExpr::Unknown(s) => {
                    return Err(Unsupported(format!("unknown arg type: {s}")));
                }
            }
        }

        let is_c_bool = leaf_spelling == "bool" && !ctx.is_c99;
        info.is_c_decl = !(info.is_class || info.is_ref || is_c_bool);
        info.is_redirected = info.is_class || info.is_ref;

        if info.is_c_decl {
            // Keep the original spelling, rewriting typedef/enum names to
            // their C aliases; record the C++ spelling as the cast whenever
            // the rewrite changed a token.
            let mut c_type = mangle::strip_global_ns(&spelling).to_string();
            if let Some((qual, c_alias)) = &first_typedef {
                if c_alias != qual {
                    info.cast = c_type.clone();
                }
                c_type = c_type.replace(qual.as_str(), c_alias);
            } else if let Some(enum_name) = &enum_leaf {
                info.cast = c_type.clone();
                let (_, tag) = ctx.enum_data(enum_name);
                c_type = c_type.replace(enum_name.as_str(), &format!("enum {tag}"));
            }
            info.c_type = c_type;
        } else if info.is_class {
            let qual = class_leaf.expect("class leaf");
            let class = src.lookup_class(&qual).ok_or_else(|| {
                Unsupported(format!(
                    "no concrete class for class declaration {qual}; \
                     possible reason: template instantiation is missing"
                ))
            })?;
            if class.is_complete {
                info.can_copy = class.has_copy_ctor;
                info.can_default_assign = class.has_default_ctor_and_assign;
            }
            let (class_name, ptr_name) = ctx.class_data(&qual);
            info.class_name = class_name;
            let mut base = ptr_name.clone();
            if let Some(level_const) = ptrs.pop() {
                // The handle already carries one indirection; the const of
                // the consumed level resurfaces on the handle itself.
                if level_const {
                    base = format!("const {base}");
                }
                info.is_redirected = false;
            }
            info.c_type = assemble_c_type(info.is_const, &base, &ptrs);
            info.cast = info
                .c_type
                .replace(&ptr_name, &format!("{}*", info.class_name));
        } else {
            // Reference to a non-class type, or bool pre-C99.
            let base = match &enum_leaf {
                Some(enum_name) => enum_name.clone(),
                None => leaf_spelling.clone(),
            };
            if info.is_ref {
                // References lower to a const pointer level.
                ptrs.push(true);
            }
            let mut c_type = assemble_c_type(info.is_const, &base, &ptrs);
            if is_c_bool {
                info.cast = c_type.clone();
                c_type = c_type.replace("bool", C_BOOL_TYPE_NAME);
            } else if let Some(enum_name) = &enum_leaf {
                info.cast = c_type.clone();
                let (_, tag) = ctx.enum_data(enum_name);
                c_type = c_type.replace(enum_name.as_str(), &format!("enum {tag}"));
            }
            info.c_type = c_type;
        }

        if info.is_func_ptr && !info.is_typedef {
            info.c_type = func_ptr.expect("func ptr info").type_str;
        }

        info.is_ptr = !ptrs.is_empty();
        Ok(info)
    }

    /// True for `void` returns.
    pub fn is_void(&self) -> bool {
        self.is_void
    }

    /// `type name` pair for a prototype parameter list.
    pub fn type_name_str(&self) -> String {
        if self.is_func_ptr && !self.is_typedef {
            // The name is already embedded in the function-pointer form;
            // the replace covers nameless renderings.
            return self.c_type.replace("(*)", &format!("(*{})", self.name));
        }
        format!("{} {}", self.c_type, self.name)
    }
}

/// Lowered function-pointer type.
#[derive(Debug, Clone)]
pub struct FuncPtrInfo {
    /// Full C declarator, e.g. `void (*callback)(int, char*)`.
    pub type_str: String,
}

impl FuncPtrInfo {
    pub fn lower(
        ret: &TypeExpr,
        params: &[TypeExpr],
        name: &str,
        src: &dyn DeclSource,
        ctx: &mut Context,
    ) -> LowerResult<FuncPtrInfo> {
        let mut arg_types = Vec::new();
        for param in params {
            arg_types.push(ArgInfo::lower(param, src, ctx, "")?.c_type);
        }
        let ret_info = ArgInfo::lower(ret, src, ctx, "")?;
        Ok(FuncPtrInfo {
            type_str: format!("{} (*{})({})", ret_info.c_type, name, arg_types.join(", ")),
        })
    }
}

/// A lowered callable, ready for thunk emission.
#[derive(Debug, Clone)]
pub struct FuncInfo {
    pub kind: DeclKind,
    /// Substituted qualified C++ name — the call expression for free and
    /// static callables.
    pub full_name: String,
    /// Unqualified member name — the call expression through `this`.
    pub member_name: String,
    /// C name stem, before the uniqueness ledger.
    pub c_name: String,
    pub ret: ArgInfo,
    pub args: Vec<ArgInfo>,
    /// Number of trailing parameters with default arguments.
    pub optional_args: usize,
    /// `"PTR_T class_this"` (possibly const-prefixed) for members/dtors.
    pub class_arg: Option<String>,
    /// `"((const T*) class_this)->"` for instance members, else empty.
    pub class_redirection: String,
    /// Substituted qualified name of the owning class.
    pub class_name: String,
    pub is_static: bool,
    pub is_default_ctor: bool,
    pub error_arg: bool,
    pub is_c99: bool,
}

impl FuncInfo {
    pub fn lower(
        func: &FuncDef,
        src: &dyn DeclSource,
        ctx: &mut Context,
        error_arg: bool,
        min_args_only: bool,
    ) -> LowerResult<FuncInfo> {
        if func.is_variadic {
            return Err(Unsupported("ellipsis arg types are not handled".to_string()));
        }

        let full_name = ctx.full_name(&func.qual_name);

        let mut c_name = match func.kind {
            DeclKind::MemberOp | DeclKind::FreeOp => {
                let token = func.name.trim_start_matches("operator").trim();
                let word = ctx.operator_word(token).ok_or_else(|| {
                    Unsupported(format!("operator {token} has no word form"))
                })?;
                let prefix = mangle::qualifier_prefix(&func.qual_name);
                if prefix.is_empty() {
                    format!("operator_{word}")
                } else {
                    format!("{}_operator_{word}", ctx.c_name(prefix))
                }
            }
            DeclKind::Dtor => {
                // Derive from the parent class, which keeps the name stable
                // even when the parser hands out a synthetic dtor token for
                // declaration-only classes.
                let parent = parent_of(func)?;
                let simple = mangle::last_segment(parent)
                    .split('<')
                    .next()
                    .unwrap_or_default();
                ctx.c_name(&format!("{parent}::~{simple}"))
            }
            DeclKind::Ctor => ctx.c_name(parent_of(func)?),
            DeclKind::MemberFunc | DeclKind::FreeFunc => ctx.c_name(&func.qual_name),
        };

        let params = if min_args_only {
            func.required_params()
        } else {
            func.params.clone()
        };
        let optional_args = if min_args_only {
            0
        } else {
            func.params.iter().filter(|p| p.has_default).count()
        };

        let mut args = Vec::new();
        for param in &params {
            args.push(ArgInfo::lower(&param.ty, src, ctx, &param.name)?);
        }

        let mut class_arg = None;
        let mut class_redirection = String::new();
        let mut class_name = String::new();
        let mut is_static = false;
        if matches!(
            func.kind,
            DeclKind::MemberFunc | DeclKind::MemberOp | DeclKind::Dtor
        ) {
            let parent = parent_of(func)?;
            let (cls_full, ptr_name) = ctx.class_data(parent);
            class_name = cls_full;
            let mut arg = format!("{ptr_name} {THIS_VAR_NAME}");

            if matches!(func.kind, DeclKind::MemberFunc | DeclKind::MemberOp) {
                is_static = func.is_static;
                if is_static {
                    c_name.push_str("_static");
                }
                let mut const_redirection = "";
                if func.is_const {
                    arg = format!("const {arg}");
                    c_name.push_str("_const");
                    const_redirection = "const ";
                }
                if !is_static {
                    class_redirection =
                        format!("(({const_redirection}{class_name}*) {THIS_VAR_NAME})->");
                }
            }
            class_arg = Some(arg);
        }

        let ret = match func.kind {
            DeclKind::Ctor => ArgInfo::lower(
                &TypeExpr::named(parent_of(func)?, NamedKind::Class),
                src,
                ctx,
                "",
            )?,
            DeclKind::Dtor => ArgInfo::lower(&TypeExpr::fundamental("void"), src, ctx, "")?,
            _ => ArgInfo::lower(&func.ret, src, ctx, "")?,
        };

        Ok(FuncInfo {
            kind: func.kind,
            full_name,
            member_name: func.name.clone(),
            c_name,
            ret,
            args,
            optional_args,
            class_arg,
            class_redirection,
            class_name,
            is_static,
            is_default_ctor: func.kind == DeclKind::Ctor && func.params.is_empty(),
            error_arg,
            is_c99: ctx.is_c99,
        })
    }

    /// True when the thunk takes the implicit `this` parameter. Class-scope
    /// allocation operators are implicitly static and take none.
    pub fn takes_this(&self) -> bool {
        matches!(self.kind, DeclKind::Dtor)
            || (matches!(self.kind, DeclKind::MemberFunc | DeclKind::MemberOp) && !self.is_static)
    }

    /// C parameter declarations for an arity using the first `n_args`
    /// lowered parameters: error flag, then `this`, then the arguments.
    pub fn c_arg_decls(&self, n_args: usize) -> Vec<String> {
        let mut decls = Vec::new();
        if self.error_arg {
            let bool_type = if self.is_c99 { "bool" } else { C_BOOL_TYPE_NAME };
            decls.push(format!("{bool_type} *{WAS_EXCEPTION_ARG_NAME}"));
        }
        if self.takes_this() {
            decls.push(self.class_arg.clone().expect("member has class arg"));
        }
        for arg in &self.args[..n_args] {
            decls.push(arg.type_name_str());
        }
        decls
    }
}

fn parent_of(func: &FuncDef) -> LowerResult<&str> {
    func.parent.as_deref().ok_or_else(|| {
        Unsupported(format!("member callable {} has no parent class", func.qual_name))
    })
}
