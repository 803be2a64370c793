//! Emitter — lowered declarations to the generated `.h`/`.cpp`/`.def` text.
//!
//! Output goes through [`MemoryFile`] buffers with a single movable mark at
//! the top of the header: handle typedefs, enum and typedef mirrors are
//! inserted at the mark so they precede every prototype, no matter when the
//! worklist drain discovers them. Nothing touches the filesystem here; the
//! caller flushes the finished [`Outputs`] exactly once.

use std::collections::HashSet;

use anyhow::{Context as _, Result};
use tracing::{debug, warn};

use crate::context::Context;
use crate::lower::{
    ARRAY_SIZE_VAR_NAME, ArgInfo, C_BOOL_TYPE_NAME, C_FALSE_VAL, C_TRUE_VAL, FuncInfo,
    LowerResult, RET_VAL_CLASS_NAME, RET_VAL_ON_EXCEPTION, THIS_VAR_NAME, Unsupported,
    WAS_EXCEPTION_ARG_NAME,
};
use crate::mangle;
use crate::model::{ClassDef, DeclKind, DeclSource, EnumDef, FuncDef, NamedKind, TypeExpr, TypedefDef};

/// Suffix appended to the input header's stem for all three outputs.
pub const GENERATED_FILE_SUFFIX: &str = "_C_Wrapper";

const DLL_MAIN_TEXT: &str = r#"#ifdef WIN32
#include <Windows.h>
extern "C" BOOL WINAPI DllMain(
    HINSTANCE hinstDLL,  // handle to DLL module
    DWORD fdwReason,     // reason for calling function
    LPVOID lpReserved )  // reserved
{
    // Perform actions based on the reason for calling.
    switch( fdwReason )
    {
        case DLL_PROCESS_ATTACH:
         // Initialize once for each new process.
         // Return FALSE to fail DLL load.
            break;

        case DLL_THREAD_ATTACH:
         // Do thread-specific initialization.
            break;

        case DLL_THREAD_DETACH:
         // Do thread-specific cleanup.
            break;

        case DLL_PROCESS_DETACH:
         // Perform any necessary cleanup.
            break;
    }
    return TRUE;  // Successful DLL_PROCESS_ATTACH.
}
#endif  // WIN32"#;

/// Generator options, already merged from CLI, config file and defaults.
#[derive(Debug, Clone)]
pub struct GenOptions {
    /// Emit the `.def` file and the DllMain boilerplate.
    pub generate_dl: bool,
    /// Wrap every thunk body in try/catch.
    pub exceptions: bool,
    /// Add the `bool *ptr_was_exception` first parameter.
    pub error_arg: bool,
    /// Compact `std::string`/`std::wstring` surface instead of the full
    /// recursive expansion.
    pub compact_string: bool,
    /// Wrap operators.
    pub operators: bool,
    pub assume_copy: bool,
    pub assume_assign: bool,
    /// Emit per-declaration source-reference comments.
    pub verbose: bool,
    /// Target C99: native `bool`/`true`/`false`.
    pub c99: bool,
    /// UpperCamelCase function names.
    pub camel_case: bool,
    /// Log and skip unsupported declarations instead of aborting.
    pub ignore_unsupported: bool,
}

impl Default for GenOptions {
    fn default() -> GenOptions {
        GenOptions {
            generate_dl: true,
            exceptions: true,
            error_arg: true,
            compact_string: true,
            operators: true,
            assume_copy: false,
            assume_assign: false,
            verbose: true,
            c99: false,
            camel_case: false,
            ignore_unsupported: true,
        }
    }
}

/// The finished output text of one run.
#[derive(Debug)]
pub struct Outputs {
    /// Stem shared by the three files, e.g. `Foo_C_Wrapper`.
    pub base_name: String,
    pub header: String,
    pub cpp: String,
    pub def: Option<String>,
}

/// An in-memory line buffer with one movable insertion mark.
///
/// `write_tail` appends below the mark, `write_at_mark` inserts above it in
/// call order; `set_mark` moves the mark below everything written so far.
#[derive(Debug, Default)]
pub struct MemoryFile {
    before_mark: Vec<String>,
    after_mark: Vec<String>,
}

impl MemoryFile {
    pub fn write_tail(&mut self, line: &str) {
        self.after_mark.push(line.to_string());
    }

    pub fn write_at_mark(&mut self, line: &str) {
        self.before_mark.push(line.to_string());
    }

    pub fn set_mark(&mut self) {
        self.before_mark.append(&mut self.after_mark);
    }

    pub fn contents(&self) -> String {
        let mut out = String::new();
        for line in self.before_mark.iter().chain(self.after_mark.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Stem of the generated files for an input header file name.
pub fn wrapper_base_name(header_file_name: &str) -> Result<String> {
    let dot = header_file_name
        .rfind(".h")
        .with_context(|| format!("input '{header_file_name}' is not a header file"))?;
    Ok(format!(
        "{}{GENERATED_FILE_SUFFIX}",
        &header_file_name[..dot]
    ))
}

/// How a by-value or reference return crosses the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetStrategy {
    /// Return the call result directly (with cast/address-of as needed).
    Direct,
    /// Heap-copy through the public copy constructor.
    HeapCopy,
    /// Default-construct on the heap, then assign the call result into it.
    DefaultAssign,
}

/// Run the whole translation over a declaration source.
pub fn translate(
    src: &dyn DeclSource,
    header_file_name: &str,
    opts: &GenOptions,
) -> Result<Outputs> {
    let base_name = wrapper_base_name(header_file_name)?;
    let mut opts = opts.clone();
    // The error argument only exists together with exception interception.
    if !opts.exceptions {
        opts.error_arg = false;
    }
    let mut ctx = Context::new(opts.c99);
    let operators = opts.operators;
    let mut emitter = Emitter::new(src, opts, header_file_name, &base_name);

    emitter.emit_prefix();

    for typedef_qual in ["std::string", "std::wstring"] {
        emitter.emit_std_string(&mut ctx, typedef_qual)?;
    }

    for class in src.classes() {
        emitter.emit_class_handle(&mut ctx, &class.qual_name, None);
    }
    for typedef in src.typedefs() {
        let result = emitter.emit_typedef(&mut ctx, typedef);
        emitter.handle_unsupported(result)?;
    }
    for en in src.enums() {
        emitter.emit_enum(&mut ctx, en);
    }
    for class in src.classes() {
        emitter.emit_class_body(&mut ctx, class)?;
    }
    for func in src.free_functions() {
        let result = emitter.emit_func(&mut ctx, func, false, false);
        emitter.handle_unsupported(result)?;
    }
    if operators {
        for op in src.free_operators() {
            let result = emitter.emit_func(&mut ctx, op, false, false);
            emitter.handle_unsupported(result)?;
        }
    }

    emitter.drain(&mut ctx)?;
    emitter.emit_suffix();

    Ok(emitter.finish())
}

struct Emitter<'s> {
    src: &'s dyn DeclSource,
    opts: GenOptions,
    header_file_name: String,
    base_name: String,
    h: MemoryFile,
    cpp: MemoryFile,
    def: Option<MemoryFile>,
    emitted_typedefs: HashSet<String>,
    emitted_enums: HashSet<String>,
}

impl<'s> Emitter<'s> {
    fn new(
        src: &'s dyn DeclSource,
        opts: GenOptions,
        header_file_name: &str,
        base_name: &str,
    ) -> Emitter<'s> {
        let def = opts.generate_dl.then(MemoryFile::default);
        Emitter {
            src,
            opts,
            header_file_name: header_file_name.to_string(),
            base_name: base_name.to_string(),
            h: MemoryFile::default(),
            cpp: MemoryFile::default(),
            def,
            emitted_typedefs: HashSet::new(),
            emitted_enums: HashSet::new(),
        }
    }

    /// Apply the unsupported-handler policy to one guarded emission.
    fn handle_unsupported(&self, result: LowerResult<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) if self.opts.ignore_unsupported => {
                warn!(error = %err, "skipping unsupported declaration");
                Ok(())
            }
            Err(err) => Err(anyhow::Error::new(err)),
        }
    }

    fn verbose_comment(&self, what: &str) -> String {
        if self.opts.verbose {
            format!("\t/* A C wrapper for {what} */")
        } else {
            String::new()
        }
    }

    fn write_def_line(&mut self, line: &str) {
        if let Some(def) = &mut self.def {
            def.write_tail(line);
        }
    }

    // -----------------------------------------------------------------------
    // Prefix / suffix
    // -----------------------------------------------------------------------

    fn emit_prefix(&mut self) {
        self.cpp
            .write_tail(&format!("#include \"{}\"", self.header_file_name));
        self.cpp
            .write_tail(&format!("#include \"{}.h\"", self.base_name));
        if self.def.is_some() {
            self.write_def_line(&format!("LIBRARY \"{}\"", self.base_name));
            self.write_def_line("EXPORTS");
        }

        let guard = mangle::header_guard(&format!("{}.h", self.base_name));
        self.h.write_tail(&format!("#ifndef {guard}"));
        self.h.write_tail(&format!("#define {guard}"));
        self.h.write_tail("#ifdef __cplusplus\nextern \"C\" {\n#endif");

        if !self.opts.c99 {
            self.h.write_tail(&format!("#define {C_FALSE_VAL} 0"));
            self.h.write_tail(&format!("#define {C_TRUE_VAL} 1"));
            self.h
                .write_tail(&format!("typedef unsigned char {C_BOOL_TYPE_NAME};"));
        }

        // Typedefs, handle declarations and enums inserted from now on land
        // above every prototype.
        self.h.set_mark();

        if self.opts.generate_dl {
            self.cpp.write_tail(DLL_MAIN_TEXT);
        }
    }

    fn emit_suffix(&mut self) {
        self.h.write_tail("#ifdef __cplusplus\n}\n#endif /* __cplusplus */");
        let guard = mangle::header_guard(&format!("{}.h", self.base_name));
        self.h.write_tail(&format!("#endif /* {guard} */"));
    }

    fn finish(self) -> Outputs {
        Outputs {
            base_name: self.base_name,
            header: self.h.contents(),
            cpp: self.cpp.contents(),
            def: self.def.map(|d| d.contents()),
        }
    }

    // -----------------------------------------------------------------------
    // Declarations at the header mark
    // -----------------------------------------------------------------------

    fn emit_class_handle(&mut self, ctx: &mut Context, qual_name: &str, alternate: Option<&str>) {
        let (class_c_name, ptr_name) = ctx.add_class(qual_name, alternate);
        let comment = self.verbose_comment(&format!("class {}", ctx.full_name(qual_name)));
        self.h.write_at_mark(&format!(
            "typedef struct _{class_c_name} *{ptr_name};{comment}"
        ));
    }

    fn emit_enum(&mut self, ctx: &mut Context, en: &EnumDef) {
        if !self.emitted_enums.insert(en.qual_name.clone()) {
            return;
        }
        let tag = ctx.add_enum(&en.qual_name);
        let comment = self.verbose_comment(&format!("enum {}", en.qual_name));
        self.h.write_at_mark(&format!("enum {tag} {{"));
        // Enumerators from different namespaces collapse into C's flat
        // namespace, so every one gets an occurrence suffix.
        let entries: Vec<String> = en
            .values
            .iter()
            .map(|(name, value)| format!("\t{}={}", ctx.unique_token(name, true), value))
            .collect();
        self.h.write_at_mark(&entries.join(",\n"));
        self.h.write_at_mark(&format!("}};{comment}"));
        debug!(name = %en.qual_name, tag = %tag, "emitted enum");
    }

    fn emit_typedef(&mut self, ctx: &mut Context, typedef: &TypedefDef) -> LowerResult<()> {
        if self.emitted_typedefs.contains(&typedef.qual_name) {
            return Ok(());
        }
        let alias = ctx.c_name(&typedef.qual_name);
        let info = ArgInfo::lower(&typedef.ty, self.src, ctx, &alias)?;
        self.emitted_typedefs.insert(typedef.qual_name.clone());
        // Targets that are not plain C declarations (classes, references)
        // get no mirror; their uses go through the opaque handle instead.
        if info.is_c_decl {
            // The enum must be declared ahead of the mirror that names its
            // tag — a forward-referenced enum tag is ill-formed in C.
            if info.is_enum
                && let Some(enum_qual) = peel_to_enum(&typedef.ty, self.src)
                && let Some(en) = self.src.lookup_enum(&enum_qual)
            {
                self.emit_enum(ctx, &en);
            }
            let comment = self.verbose_comment(&format!("typedef {}", typedef.qual_name));
            self.h
                .write_at_mark(&format!("typedef {};{comment}", info.type_name_str()));
            ctx.add_typedef(&typedef.qual_name);
            debug!(name = %typedef.qual_name, alias = %alias, "emitted typedef");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    fn emit_class_body(&mut self, ctx: &mut Context, class: &ClassDef) -> Result<()> {
        for ctor in &class.ctors {
            let result = self.emit_func(ctx, ctor, false, false);
            self.handle_unsupported(result)?;
        }

        if class.has_public_dtor
            && let Some(dtor) = &class.dtor
        {
            let result = self.emit_func(ctx, dtor, false, false);
            self.handle_unsupported(result)?;

            // new[]/delete[] variants need default construction.
            if let Some(default_ctor) = class.default_ctor() {
                let result = self.emit_func(ctx, default_ctor, true, false);
                self.handle_unsupported(result)?;
                let result = self.emit_func(ctx, dtor, true, false);
                self.handle_unsupported(result)?;
            }
        }

        for method in &class.methods {
            let result = self.emit_func(ctx, method, false, false);
            self.handle_unsupported(result)?;
        }
        if self.opts.operators {
            for op in &class.operators {
                let result = self.emit_func(ctx, op, false, false);
                self.handle_unsupported(result)?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // std::string / std::wstring special case
    // -----------------------------------------------------------------------

    fn emit_std_string(&mut self, ctx: &mut Context, typedef_qual: &str) -> Result<()> {
        let Some(typedef) = self.src.lookup_typedef(typedef_qual) else {
            return Ok(());
        };
        let Some(class_qual) = peel_to_class(&typedef.ty, self.src) else {
            debug!(typedef = typedef_qual, "string typedef does not resolve to a class");
            return Ok(());
        };
        let Some(class) = self.src.lookup_class(&class_qual) else {
            debug!(class = %class_qual, "string class not visible; skipping special case");
            return Ok(());
        };

        let (wide, ptr_name) = ctx.add_std_string(&typedef, &class);
        debug!(typedef = typedef_qual, wide, "registered string special case");
        if !self.opts.compact_string {
            // Full mode: only the substitutions are registered; the class is
            // emitted recursively once something references it.
            return Ok(());
        }

        self.emit_class_handle(ctx, &class.qual_name, Some(ptr_name.as_str()));

        if let Some(default_ctor) = class.default_ctor() {
            let default_ctor = default_ctor.clone();
            let result = self.emit_func(ctx, &default_ctor, false, false);
            self.handle_unsupported(result)?;
            let result = self.emit_func(ctx, &default_ctor, true, false);
            self.handle_unsupported(result)?;
        }

        // The `const char*` (or wchar_t) ctor at minimum arity only — the
        // allocator argument is dropped.
        let element = if wide { "wchar_t" } else { "char" };
        if let Some(ctor) = class.ctors.iter().find(|c| {
            let required = c.required_params();
            required.len() == 1 && is_const_elem_ptr(&required[0].ty, element)
        }) {
            let result = self.emit_func(ctx, ctor, false, true);
            self.handle_unsupported(result)?;
        }

        if class.has_public_dtor
            && let Some(dtor) = &class.dtor
        {
            let result = self.emit_func(ctx, dtor, false, false);
            self.handle_unsupported(result)?;
            let result = self.emit_func(ctx, dtor, true, false);
            self.handle_unsupported(result)?;
        }

        if let Some(c_str) = class.methods.iter().find(|m| m.name == "c_str") {
            let result = self.emit_func(ctx, c_str, false, false);
            self.handle_unsupported(result)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Thunks
    // -----------------------------------------------------------------------

    fn emit_func(
        &mut self,
        ctx: &mut Context,
        func: &FuncDef,
        array_version: bool,
        min_args_only: bool,
    ) -> LowerResult<()> {
        let info = FuncInfo::lower(func, self.src, ctx, self.opts.error_arg, min_args_only)?;
        let strategy = self.return_strategy(&info)?;

        let mut stem = info.c_name.clone();
        if array_version {
            stem.push_str("_array");
        }

        // One thunk per arity, full down to required-only, each with a fresh
        // unique name.
        for used_defaults in 0..=info.optional_args {
            let n_args = info.args.len() - used_defaults;
            let mut decls = info.c_arg_decls(n_args);
            if array_version && info.kind == DeclKind::Ctor {
                decls.push(format!("size_t {ARRAY_SIZE_VAR_NAME}"));
            }

            let mut unique = ctx.unique_token(&stem, false);
            if self.opts.camel_case {
                unique = mangle::camel_case(&unique);
            }
            self.write_def_line(&format!("\t{unique}"));

            let prototype = format!("{} {}({})", info.ret.c_type, unique, decls.join(", "));
            let comment = self.verbose_comment(&format!("func {}", func_decl_str(&info, func)));
            self.h.write_tail(&format!("{prototype};{comment}"));

            self.cpp.write_tail(&format!("{prototype} {{"));
            let body = self.thunk_body(&info, strategy, array_version, n_args);
            for line in body {
                self.cpp.write_tail(&line);
            }
            self.cpp.write_tail("}");
        }
        Ok(())
    }

    /// Pick the return strategy up front so a lowering failure never leaves
    /// a half-emitted thunk behind.
    fn return_strategy(&self, info: &FuncInfo) -> LowerResult<RetStrategy> {
        if matches!(info.kind, DeclKind::Ctor | DeclKind::Dtor) {
            return Ok(RetStrategy::Direct);
        }
        // Only a class returned by value must be heap-placed to stay
        // addressable across the C boundary; reference returns are pointers.
        if !(info.ret.is_class && info.ret.is_redirected && !info.ret.is_ref) {
            return Ok(RetStrategy::Direct);
        }
        if info.ret.can_copy.unwrap_or(self.opts.assume_copy) {
            Ok(RetStrategy::HeapCopy)
        } else if info.ret.can_default_assign.unwrap_or(self.opts.assume_assign) {
            Ok(RetStrategy::DefaultAssign)
        } else {
            Err(Unsupported(format!(
                "cannot handle a class return value without a public copy ctor \
                 or a public default ctor and assignment operator in {}",
                info.full_name
            )))
        }
    }

    /// Build the body lines of one thunk at one arity.
    fn thunk_body(
        &self,
        info: &FuncInfo,
        strategy: RetStrategy,
        array_version: bool,
        n_args: usize,
    ) -> Vec<String> {
        let impl_args: Vec<String> = info.args[..n_args]
            .iter()
            .map(|arg| {
                let redirection = if arg.is_redirected { "*" } else { "" };
                let cast = if arg.cast.is_empty() {
                    String::new()
                } else {
                    format!("({})", arg.cast)
                };
                format!("{redirection}{cast}{}", arg.name)
            })
            .collect();
        let impl_args = impl_args.join(", ");

        let nothrow = if self.opts.exceptions {
            ""
        } else {
            "(std::nothrow) "
        };

        let mut lines: Vec<String> = Vec::new();
        let ret_expr = match info.kind {
            DeclKind::Ctor => {
                let ctor_args = if info.is_default_ctor {
                    String::new()
                } else {
                    format!("({impl_args})")
                };
                let array_suffix = if array_version {
                    format!("[{ARRAY_SIZE_VAR_NAME}]")
                } else {
                    String::new()
                };
                format!("new {nothrow}{}{ctor_args}{array_suffix}", info.ret.class_name)
            }
            DeclKind::Dtor => {
                let array_suffix = if array_version { "[]" } else { "" };
                format!(
                    "delete {array_suffix}(({}*){THIS_VAR_NAME})",
                    info.class_name
                )
            }
            _ => {
                let call_name = match info.kind {
                    DeclKind::MemberFunc | DeclKind::MemberOp if !info.is_static => {
                        &info.member_name
                    }
                    _ => &info.full_name,
                };
                let call = format!("{}{}({})", info.class_redirection, call_name, impl_args);
                match strategy {
                    RetStrategy::Direct => call,
                    RetStrategy::HeapCopy => {
                        format!("new {nothrow}{}({call})", info.ret.class_name)
                    }
                    RetStrategy::DefaultAssign => {
                        let class = &info.ret.class_name;
                        lines.push(format!(
                            "{class} *{RET_VAL_CLASS_NAME} = new {nothrow}{class};"
                        ));
                        let null_check = if self.opts.exceptions {
                            ""
                        } else {
                            // new(std::nothrow) may have returned NULL.
                            "if((void*)ptr_ret_val_class != NULL) "
                        };
                        lines.push(format!("{null_check}*{RET_VAL_CLASS_NAME} = {call};"));
                        RET_VAL_CLASS_NAME.to_string()
                    }
                }
            }
        };

        let return_kw = if info.ret.is_void() { "" } else { "return " };
        let cast = if info.ret.cast.is_empty() {
            String::new()
        } else {
            format!("({})", info.ret.c_type)
        };
        // Reference returns convert to pointers by taking the address.
        let addr_of = if info.ret.is_ref { "&" } else { "" };
        lines.push(format!("{return_kw}{cast}{addr_of}{ret_expr};"));

        if !self.opts.exceptions {
            return lines.iter().map(|l| format!("    {l}")).collect();
        }

        let (true_val, false_val) = if self.opts.c99 {
            ("true", "false")
        } else {
            (C_TRUE_VAL, C_FALSE_VAL)
        };
        let mut wrapped = Vec::new();
        wrapped.push("    try {".to_string());
        if self.opts.error_arg {
            wrapped.push(format!(
                "        if((void *){WAS_EXCEPTION_ARG_NAME} != NULL) (*{WAS_EXCEPTION_ARG_NAME}) = {false_val};"
            ));
        }
        for line in &lines {
            wrapped.push(format!("        {line}"));
        }
        wrapped.push("    }".to_string());
        wrapped.push("    catch(...) {".to_string());
        if self.opts.error_arg {
            wrapped.push(format!(
                "        if((void *){WAS_EXCEPTION_ARG_NAME} != NULL) (*{WAS_EXCEPTION_ARG_NAME}) = {true_val};"
            ));
        }
        if !info.ret.is_void() {
            wrapped.push(format!(
                "        return ({}) {RET_VAL_ON_EXCEPTION};",
                info.ret.c_type
            ));
        }
        wrapped.push("    }".to_string());
        wrapped
    }

    // -----------------------------------------------------------------------
    // Worklist drain
    // -----------------------------------------------------------------------

    /// Emit transitively discovered declarations until the fixpoint. Enums
    /// and typedefs are referenced by class signatures and by each other, so
    /// each iteration prefers enum, then typedef, then class.
    fn drain(&mut self, ctx: &mut Context) -> Result<()> {
        while !ctx.pending_empty() {
            if let Some(qual) = ctx.pending_enums.pop_front() {
                match self.src.lookup_enum(&qual) {
                    Some(en) => self.emit_enum(ctx, &en),
                    None => warn!(name = %qual, "referenced enum not found in translation unit"),
                }
            } else if let Some(qual) = ctx.pending_typedefs.pop_front() {
                match self.src.lookup_typedef(&qual) {
                    Some(typedef) => {
                        let result = self.emit_typedef(ctx, &typedef);
                        self.handle_unsupported(result)?;
                    }
                    None => {
                        warn!(name = %qual, "referenced typedef not found in translation unit")
                    }
                }
            } else if let Some(qual) = ctx.pending_classes.pop_front() {
                match self.src.lookup_class(&qual) {
                    Some(class) => {
                        let ptr_name = ctx.class_ptr(&class.qual_name).cloned();
                        self.emit_class_handle(ctx, &class.qual_name, ptr_name.as_deref());
                        self.emit_class_body(ctx, &class)?;
                    }
                    None => {
                        warn!(name = %qual, "referenced class not found in translation unit")
                    }
                }
            }
        }
        Ok(())
    }
}

/// C++ declaration string used in the per-function source comments.
fn func_decl_str(info: &FuncInfo, func: &FuncDef) -> String {
    let args: Vec<String> = func.params.iter().map(|p| p.ty.cpp_spelling()).collect();
    format!("{}({})", info.full_name, args.join(", "))
}

/// Follow typedef chains until a class leaf; `None` for anything else.
fn peel_to_class(ty: &TypeExpr, src: &dyn DeclSource) -> Option<String> {
    let mut cur = ty.clone();
    loop {
        match cur {
            TypeExpr::Named {
                name,
                kind: NamedKind::Class,
            } => return Some(name),
            TypeExpr::Named {
                name,
                kind: NamedKind::Typedef,
            } => {
                cur = src.lookup_typedef(&name)?.ty;
            }
            TypeExpr::Const(inner) | TypeExpr::Volatile(inner) => cur = *inner,
            _ => return None,
        }
    }
}

/// Follow typedef chains and pointer/array layers until an enum leaf;
/// `None` for anything else.
fn peel_to_enum(ty: &TypeExpr, src: &dyn DeclSource) -> Option<String> {
    let mut cur = ty.clone();
    loop {
        match cur {
            TypeExpr::Named {
                name,
                kind: NamedKind::Enum,
            } => return Some(name),
            TypeExpr::Named {
                name,
                kind: NamedKind::Typedef,
            } => {
                cur = src.lookup_typedef(&name)?.ty;
            }
            TypeExpr::Const(inner)
            | TypeExpr::Volatile(inner)
            | TypeExpr::Pointer(inner)
            | TypeExpr::Array(inner) => cur = *inner,
            _ => return None,
        }
    }
}

/// Matches `const char *` / `const wchar_t *` structurally.
fn is_const_elem_ptr(ty: &TypeExpr, element: &str) -> bool {
    match ty {
        TypeExpr::Pointer(inner) => match &**inner {
            TypeExpr::Const(leaf) => {
                matches!(&**leaf, TypeExpr::Fundamental(s) if s == element)
            }
            _ => false,
        },
        _ => false,
    }
}
