//! Parser adapter — clang `Entity`/`Type` → declaration model.
//!
//! The only module that knows about libclang. It eagerly extracts the
//! declarations located in the input header (the direct emission list) and
//! keeps a name index over the whole translation unit so the engine can
//! resolve transitively referenced classes, typedefs and enums on demand.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clang::{Accessibility, Entity, EntityKind, Index, TranslationUnit, Type, TypeKind};
use tracing::{debug, trace, warn};

use crate::config::Options;
use crate::model::*;

/// Parse the input header as C++.
pub fn parse_header<'c>(
    index: &'c Index<'c>,
    opts: &Options,
) -> Result<TranslationUnit<'c>> {
    let header = opts.header_file_path.as_path();
    let mut args: Vec<String> = vec!["-x".to_string(), "c++".to_string()];
    if let Some(compiler) = &opts.compiler_type {
        // Forwarded verbatim, e.g. `-std=c++17`.
        args.push(compiler.clone());
    }
    for inc in &opts.include_paths {
        args.push(format!("-I{inc}"));
    }
    debug!(header = %header.display(), args = ?args, "parsing header");

    let tu = index
        .parser(header.to_str().context("header path is not valid UTF-8")?)
        .arguments(&args.iter().map(String::as_str).collect::<Vec<_>>())
        .parse()
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {:?}", header.display(), e))?;

    let errors: Vec<String> = tu
        .get_diagnostics()
        .iter()
        .filter(|d| {
            matches!(
                d.get_severity(),
                clang::diagnostic::Severity::Error | clang::diagnostic::Severity::Fatal
            )
        })
        .map(|d| d.get_text())
        .collect();
    if !errors.is_empty() {
        anyhow::bail!(
            "header {} is unparseable: {}",
            header.display(),
            errors.join("; ")
        );
    }
    Ok(tu)
}

/// [`DeclSource`] backed by a parsed translation unit.
pub struct ClangSource<'tu> {
    unit: Unit,
    class_index: HashMap<String, Entity<'tu>>,
    enum_index: HashMap<String, Entity<'tu>>,
    typedef_index: HashMap<String, Entity<'tu>>,
}

impl<'tu> ClangSource<'tu> {
    /// Walk the whole translation unit once: direct declarations of the
    /// input header are extracted eagerly, everything else is only indexed
    /// by qualified name for later lookups.
    pub fn extract(tu: &'tu TranslationUnit<'tu>, header_path: &Path) -> Result<ClangSource<'tu>> {
        let header_path = std::fs::canonicalize(header_path)
            .unwrap_or_else(|_| header_path.to_path_buf());
        let mut source = ClangSource {
            unit: Unit::default(),
            class_index: HashMap::new(),
            enum_index: HashMap::new(),
            typedef_index: HashMap::new(),
        };
        source.collect(tu.get_entity(), &header_path);
        tracing::info!(
            classes = source.unit.classes.len(),
            typedefs = source.unit.typedefs.len(),
            enums = source.unit.enums.len(),
            functions = source.unit.free_functions.len(),
            operators = source.unit.free_operators.len(),
            "header extraction complete"
        );
        Ok(source)
    }

    fn collect(&mut self, entity: Entity<'tu>, header_path: &PathBuf) {
        for child in entity.get_children() {
            let in_header = in_file(&child, header_path);
            match child.get_kind() {
                EntityKind::Namespace | EntityKind::LinkageSpec | EntityKind::UnexposedDecl => {
                    self.collect(child, header_path);
                }
                EntityKind::ClassDecl | EntityKind::StructDecl => {
                    if let Some(key) = index_key(&child) {
                        self.index_class(key, child);
                        if in_header && child.is_definition() {
                            let class = self.extract_class(&child);
                            debug!(name = %class.qual_name, "extracted class");
                            self.unit.classes.push(class);
                        }
                    }
                    // Nested classes/enums/typedefs still need indexing.
                    self.collect(child, header_path);
                }
                EntityKind::EnumDecl => {
                    if let Some(key) = index_key(&child) {
                        self.enum_index.entry(key).or_insert(child);
                        if in_header && child.is_definition() {
                            let en = self.extract_enum(&child);
                            debug!(name = %en.qual_name, variants = en.values.len(), "extracted enum");
                            self.unit.enums.push(en);
                        }
                    }
                }
                EntityKind::TypedefDecl | EntityKind::TypeAliasDecl => {
                    if let Some(key) = index_key(&child) {
                        self.typedef_index.entry(key).or_insert(child);
                        if in_header {
                            let typedef = self.extract_typedef(&child);
                            debug!(name = %typedef.qual_name, "extracted typedef");
                            self.unit.typedefs.push(typedef);
                        }
                    }
                }
                EntityKind::FunctionDecl => {
                    if !in_header {
                        continue;
                    }
                    let name = child.get_name().unwrap_or_default();
                    if is_operator_name(&name) {
                        let func = self.extract_function(&child, DeclKind::FreeOp, None);
                        debug!(name = %func.qual_name, "extracted free operator");
                        self.unit.free_operators.push(func);
                    } else {
                        let func = self.extract_function(&child, DeclKind::FreeFunc, None);
                        debug!(name = %func.qual_name, params = func.params.len(), "extracted free function");
                        self.unit.free_functions.push(func);
                    }
                }
                _ => {}
            }
        }
    }

    fn index_class(&mut self, key: String, entity: Entity<'tu>) {
        // Definitions beat forward declarations.
        match self.class_index.get(&key) {
            Some(existing) if existing.is_definition() => {}
            _ => {
                self.class_index.insert(key, entity);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Declaration extraction
    // -----------------------------------------------------------------------

    fn extract_class(&self, entity: &Entity<'tu>) -> ClassDef {
        let name = entity.get_name().unwrap_or_default();
        let qual_name = index_key(entity).unwrap_or_else(|| name.clone());
        let definition = entity.get_definition();
        let is_complete = entity.is_definition() || definition.is_some();
        let def_entity = definition.unwrap_or(*entity);

        let mut ctors = Vec::new();
        let mut dtor = None;
        let mut dtor_public = None;
        let mut methods = Vec::new();
        let mut operators = Vec::new();
        let mut declared_any_ctor = false;
        let mut copy_ctor = None;
        let mut assign_op = None;
        let mut is_abstract = false;

        if is_complete {
            for child in def_entity.get_children() {
                let public = matches!(
                    child.get_accessibility(),
                    Some(Accessibility::Public) | None
                );
                match child.get_kind() {
                    EntityKind::Constructor => {
                        declared_any_ctor = true;
                        if child.is_copy_constructor() {
                            copy_ctor = Some(public);
                        }
                        if public {
                            ctors.push(self.extract_function(&child, DeclKind::Ctor, Some(&qual_name)));
                        }
                    }
                    EntityKind::Destructor => {
                        dtor_public = Some(public);
                        dtor = Some(self.extract_function(&child, DeclKind::Dtor, Some(&qual_name)));
                    }
                    EntityKind::Method => {
                        let method_name = child.get_name().unwrap_or_default();
                        if method_name == "operator=" {
                            assign_op = Some(public);
                        }
                        if child.is_pure_virtual_method() {
                            is_abstract = true;
                            continue;
                        }
                        if !public {
                            continue;
                        }
                        if is_operator_name(&method_name) {
                            operators.push(self.extract_function(
                                &child,
                                DeclKind::MemberOp,
                                Some(&qual_name),
                            ));
                        } else {
                            methods.push(self.extract_function(
                                &child,
                                DeclKind::MemberFunc,
                                Some(&qual_name),
                            ));
                        }
                    }
                    _ => {}
                }
            }

            // Compiler-provided members the AST does not spell out.
            if !declared_any_ctor && !is_abstract {
                ctors.push(implicit_member(DeclKind::Ctor, &qual_name, &name));
            }
            if dtor.is_none() {
                dtor = Some(implicit_member(DeclKind::Dtor, &qual_name, &format!("~{name}")));
                dtor_public = Some(true);
            }
        }

        let has_default_ctor = ctors.iter().any(|c| c.params.is_empty());
        ClassDef {
            qual_name,
            name,
            is_complete,
            ctors,
            dtor,
            has_public_dtor: dtor_public.unwrap_or(false),
            methods,
            operators,
            // Undeclared special members exist implicitly and are public.
            has_copy_ctor: is_complete.then(|| copy_ctor.unwrap_or(true)),
            has_default_ctor_and_assign: is_complete
                .then(|| has_default_ctor && assign_op.unwrap_or(true)),
        }
    }

    fn extract_enum(&self, entity: &Entity<'tu>) -> EnumDef {
        let name = entity.get_name().unwrap_or_default();
        let qual_name = index_key(entity).unwrap_or_else(|| name.clone());
        let mut values = Vec::new();
        for child in entity.get_children() {
            if child.get_kind() != EntityKind::EnumConstantDecl {
                continue;
            }
            let constant_name = child.get_name().unwrap_or_default();
            let (signed, _unsigned) = child.get_enum_constant_value().unwrap_or((0, 0));
            values.push((constant_name, signed));
        }
        EnumDef {
            qual_name,
            name,
            values,
        }
    }

    fn extract_typedef(&self, entity: &Entity<'tu>) -> TypedefDef {
        let name = entity.get_name().unwrap_or_default();
        let qual_name = index_key(entity).unwrap_or_else(|| name.clone());
        let ty = match entity.get_typedef_underlying_type() {
            Some(underlying) => self.map_type(&underlying),
            None => TypeExpr::Unknown(name.clone()),
        };
        trace!(name = %qual_name, ty = ?ty, "typedef underlying type");
        TypedefDef {
            qual_name,
            name,
            ty,
        }
    }

    fn extract_function(
        &self,
        entity: &Entity<'tu>,
        kind: DeclKind,
        parent: Option<&str>,
    ) -> FuncDef {
        let name = entity.get_name().unwrap_or_default();
        let qual_name = match parent {
            Some(parent) => format!("{parent}::{name}"),
            None => qualified_name(entity),
        };
        let ret = entity
            .get_result_type()
            .map(|t| self.map_type(&t))
            .unwrap_or_else(|| TypeExpr::fundamental("void"));

        let mut params = Vec::new();
        for (i, arg) in entity
            .get_arguments()
            .unwrap_or_default()
            .iter()
            .enumerate()
        {
            let param_name = match arg.get_name() {
                Some(n) if !n.is_empty() => n,
                _ => format!("arg{i}"),
            };
            let ty = arg
                .get_type()
                .map(|t| self.map_type(&t))
                .unwrap_or_else(|| TypeExpr::Unknown(param_name.clone()));
            params.push(ParamDef {
                name: param_name,
                ty,
                has_default: has_default_argument(arg),
            });
        }

        FuncDef {
            kind,
            qual_name,
            name,
            parent: parent.map(str::to_string),
            ret,
            params,
            is_static: entity.is_static_method(),
            is_const: entity.is_const_method(),
            is_variadic: entity.is_variadic(),
        }
    }

    // -----------------------------------------------------------------------
    // Type mapping: clang TypeKind → TypeExpr
    // -----------------------------------------------------------------------

    fn map_type(&self, ty: &Type<'tu>) -> TypeExpr {
        let base = match ty.get_kind() {
            TypeKind::Void => TypeExpr::fundamental("void"),
            TypeKind::Bool => TypeExpr::fundamental("bool"),
            TypeKind::CharS | TypeKind::CharU => TypeExpr::fundamental("char"),
            TypeKind::SChar => TypeExpr::fundamental("signed char"),
            TypeKind::UChar => TypeExpr::fundamental("unsigned char"),
            TypeKind::Short => TypeExpr::fundamental("short"),
            TypeKind::UShort => TypeExpr::fundamental("unsigned short"),
            TypeKind::Int => TypeExpr::fundamental("int"),
            TypeKind::UInt => TypeExpr::fundamental("unsigned int"),
            TypeKind::Long => TypeExpr::fundamental("long"),
            TypeKind::ULong => TypeExpr::fundamental("unsigned long"),
            TypeKind::LongLong => TypeExpr::fundamental("long long"),
            TypeKind::ULongLong => TypeExpr::fundamental("unsigned long long"),
            TypeKind::Float => TypeExpr::fundamental("float"),
            TypeKind::Double => TypeExpr::fundamental("double"),
            TypeKind::LongDouble => TypeExpr::fundamental("long double"),
            TypeKind::WChar => TypeExpr::fundamental("wchar_t"),
            TypeKind::Char16 => TypeExpr::fundamental("char16_t"),
            TypeKind::Char32 => TypeExpr::fundamental("char32_t"),

            TypeKind::Pointer => match ty.get_pointee_type() {
                Some(pointee) => TypeExpr::ptr(self.map_type(&pointee)),
                None => TypeExpr::Unknown(ty.get_display_name()),
            },
            TypeKind::LValueReference | TypeKind::RValueReference => {
                match ty.get_pointee_type() {
                    Some(pointee) => TypeExpr::reference(self.map_type(&pointee)),
                    None => TypeExpr::Unknown(ty.get_display_name()),
                }
            }
            TypeKind::ConstantArray | TypeKind::IncompleteArray | TypeKind::VariableArray => {
                match ty.get_element_type() {
                    Some(element) => TypeExpr::Array(Box::new(self.map_type(&element))),
                    None => TypeExpr::Unknown(ty.get_display_name()),
                }
            }
            TypeKind::Elaborated => match ty.get_elaborated_type() {
                Some(inner) => self.map_type(&inner),
                None => TypeExpr::Unknown(ty.get_display_name()),
            },

            TypeKind::Typedef => match ty.get_declaration() {
                Some(decl) => {
                    let name = decl.get_name().unwrap_or_default();
                    // va_list is a compiler built-in with no portable
                    // canonical type.
                    if matches!(
                        name.as_str(),
                        "va_list" | "__builtin_va_list" | "__gnuc_va_list"
                    ) {
                        TypeExpr::ptr(TypeExpr::fundamental("void"))
                    } else {
                        TypeExpr::named(
                            &index_key(&decl).unwrap_or(name),
                            NamedKind::Typedef,
                        )
                    }
                }
                None => self.map_type(&ty.get_canonical_type()),
            },
            TypeKind::Record => match ty.get_declaration().and_then(|d| index_key(&d)) {
                Some(key) => TypeExpr::named(&key, NamedKind::Class),
                None => TypeExpr::Unknown(ty.get_display_name()),
            },
            TypeKind::Enum => match ty.get_declaration().and_then(|d| index_key(&d)) {
                Some(key) => TypeExpr::named(&key, NamedKind::Enum),
                None => TypeExpr::Unknown(ty.get_display_name()),
            },

            TypeKind::FunctionPrototype => {
                let ret = ty
                    .get_result_type()
                    .map(|t| self.map_type(&t))
                    .unwrap_or_else(|| TypeExpr::fundamental("void"));
                let params = ty
                    .get_argument_types()
                    .unwrap_or_default()
                    .iter()
                    .map(|t| self.map_type(t))
                    .collect();
                TypeExpr::Function {
                    ret: Box::new(ret),
                    params,
                    variadic: ty.is_variadic(),
                }
            }
            TypeKind::FunctionNoPrototype => TypeExpr::Function {
                ret: Box::new(
                    ty.get_result_type()
                        .map(|t| self.map_type(&t))
                        .unwrap_or_else(|| TypeExpr::fundamental("void")),
                ),
                params: Vec::new(),
                variadic: false,
            },
            TypeKind::MemberPointer => TypeExpr::MemberPointer,

            TypeKind::Auto | TypeKind::Unexposed => {
                let canonical = ty.get_canonical_type();
                if canonical.get_kind() == ty.get_kind() {
                    TypeExpr::Unknown(ty.get_display_name())
                } else {
                    self.map_type(&canonical)
                }
            }
            other => {
                warn!(kind = ?other, spelling = %ty.get_display_name(), "unmapped clang type kind");
                TypeExpr::Unknown(ty.get_display_name())
            }
        };

        let base = if ty.is_volatile_qualified() {
            TypeExpr::Volatile(Box::new(base))
        } else {
            base
        };
        if ty.is_const_qualified() {
            TypeExpr::konst(base)
        } else {
            base
        }
    }
}

impl DeclSource for ClangSource<'_> {
    fn classes(&self) -> &[ClassDef] {
        &self.unit.classes
    }

    fn typedefs(&self) -> &[TypedefDef] {
        &self.unit.typedefs
    }

    fn enums(&self) -> &[EnumDef] {
        &self.unit.enums
    }

    fn free_functions(&self) -> &[FuncDef] {
        &self.unit.free_functions
    }

    fn free_operators(&self) -> &[FuncDef] {
        &self.unit.free_operators
    }

    fn lookup_class(&self, qual_name: &str) -> Option<ClassDef> {
        self.class_index
            .get(qual_name)
            .map(|entity| self.extract_class(entity))
    }

    fn lookup_typedef(&self, qual_name: &str) -> Option<TypedefDef> {
        self.typedef_index
            .get(qual_name)
            .map(|entity| self.extract_typedef(entity))
    }

    fn lookup_enum(&self, qual_name: &str) -> Option<EnumDef> {
        self.enum_index
            .get(qual_name)
            .map(|entity| self.extract_enum(entity))
    }
}

// ---------------------------------------------------------------------------
// Entity helpers
// ---------------------------------------------------------------------------

/// Qualified name from the semantic parent chain.
fn qualified_name(entity: &Entity) -> String {
    let mut parts = Vec::new();
    let mut cursor = Some(*entity);
    while let Some(e) = cursor {
        if e.get_kind() == EntityKind::TranslationUnit {
            break;
        }
        if let Some(name) = e.get_name() {
            parts.push(name);
        }
        cursor = e.get_semantic_parent();
    }
    parts.reverse();
    parts.join("::")
}

/// Name a type declaration is indexed and referenced under. The entity's own
/// type spelling keeps template arguments, so distinct instantiations stay
/// distinct; unnamed declarations are not indexable.
fn index_key(entity: &Entity) -> Option<String> {
    entity.get_name().filter(|n| !n.is_empty())?;
    match entity.get_type() {
        Some(ty) => Some(ty.get_display_name().trim_start_matches(':').to_string()),
        None => Some(qualified_name(entity)),
    }
}

fn in_file(entity: &Entity, path: &PathBuf) -> bool {
    entity
        .get_location()
        .and_then(|loc| loc.get_file_location().file)
        .map(|file| {
            let file_path = file.get_path();
            file_path == *path || file_path.ends_with(path)
        })
        .unwrap_or(false)
}

/// `operator+`, `operator()`, `operator new []` — but not `operatorize()`.
fn is_operator_name(name: &str) -> bool {
    match name.strip_prefix("operator").and_then(|rest| rest.chars().next()) {
        Some(c) => !(c.is_alphanumeric() || c == '_'),
        None => false,
    }
}

/// True when the parameter declaration carries a default argument — clang
/// attaches the default expression as a non-reference child.
fn has_default_argument(param: &Entity) -> bool {
    param.get_children().iter().any(|child| {
        !matches!(
            child.get_kind(),
            EntityKind::TypeRef | EntityKind::NamespaceRef | EntityKind::TemplateRef
        )
    })
}

/// A compiler-generated special member the AST does not list.
fn implicit_member(kind: DeclKind, class_qual: &str, name: &str) -> FuncDef {
    FuncDef {
        kind,
        qual_name: format!("{class_qual}::{name}"),
        name: name.to_string(),
        parent: Some(class_qual.to_string()),
        ret: TypeExpr::fundamental("void"),
        params: Vec::new(),
        is_static: false,
        is_const: false,
        is_variadic: false,
    }
}
