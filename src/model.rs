//! Declaration model — the bridge between the C++ parser and the C emitter.
//!
//! These types are parser-independent: the libclang adapter in
//! [`parse`](crate::parse) produces them, and tests build them directly,
//! which keeps the whole translation engine testable without libclang.

/// Kind of a callable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    FreeFunc,
    FreeOp,
    MemberFunc,
    MemberOp,
    Ctor,
    Dtor,
}

/// What a [`TypeExpr::Named`] leaf refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKind {
    Class,
    Enum,
    Typedef,
}

/// A C++ type expression, one layer per node.
///
/// Qualified names carry no leading `::`; template arguments appear verbatim
/// in the name (`std::basic_string<char, ...>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A fundamental type, stored as its C spelling (`int`, `unsigned long`,
    /// `bool`, `void`, `wchar_t`, ...).
    Fundamental(String),
    /// A reference to a user-defined declaration.
    Named { name: String, kind: NamedKind },
    Const(Box<TypeExpr>),
    Volatile(Box<TypeExpr>),
    Pointer(Box<TypeExpr>),
    Reference(Box<TypeExpr>),
    /// Arrays decay to pointers at the C surface.
    Array(Box<TypeExpr>),
    /// A function signature (only meaningful behind a `Pointer`).
    Function {
        ret: Box<TypeExpr>,
        params: Vec<TypeExpr>,
        variadic: bool,
    },
    /// A pointer to a class member — never translatable.
    MemberPointer,
    /// `...` in type position.
    Ellipsis,
    /// Anything the parser could not resolve, kept for diagnostics.
    Unknown(String),
}

impl TypeExpr {
    pub fn fundamental(spelling: &str) -> TypeExpr {
        TypeExpr::Fundamental(spelling.to_string())
    }

    pub fn named(name: &str, kind: NamedKind) -> TypeExpr {
        TypeExpr::Named {
            name: name.to_string(),
            kind,
        }
    }

    pub fn ptr(inner: TypeExpr) -> TypeExpr {
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn konst(inner: TypeExpr) -> TypeExpr {
        TypeExpr::Const(Box::new(inner))
    }

    pub fn reference(inner: TypeExpr) -> TypeExpr {
        TypeExpr::Reference(Box::new(inner))
    }

    /// The C++ spelling of this type, suitable for a cast in generated C++
    /// code. Qualifiers render east-const (`int const *`), matching how the
    /// spelling is later searched for qualified names.
    pub fn cpp_spelling(&self) -> String {
        match self {
            TypeExpr::Fundamental(s) | TypeExpr::Unknown(s) => s.clone(),
            TypeExpr::Named { name, .. } => name.clone(),
            TypeExpr::Const(inner) => format!("{} const", inner.cpp_spelling()),
            TypeExpr::Volatile(inner) => format!("{} volatile", inner.cpp_spelling()),
            TypeExpr::Pointer(inner) => match &**inner {
                TypeExpr::Function { ret, params, .. } => {
                    let args: Vec<String> = params.iter().map(|p| p.cpp_spelling()).collect();
                    format!("{} (*)({})", ret.cpp_spelling(), args.join(", "))
                }
                _ => format!("{} *", inner.cpp_spelling()),
            },
            TypeExpr::Reference(inner) => format!("{} &", inner.cpp_spelling()),
            TypeExpr::Array(inner) => format!("{} *", inner.cpp_spelling()),
            TypeExpr::Function { ret, params, .. } => {
                let args: Vec<String> = params.iter().map(|p| p.cpp_spelling()).collect();
                format!("{} ({})", ret.cpp_spelling(), args.join(", "))
            }
            TypeExpr::MemberPointer => "<member pointer>".to_string(),
            TypeExpr::Ellipsis => "...".to_string(),
        }
    }

    /// True if this is `void` (possibly cv-qualified).
    pub fn is_void(&self) -> bool {
        match self {
            TypeExpr::Fundamental(s) => s == "void",
            TypeExpr::Const(inner) | TypeExpr::Volatile(inner) => inner.is_void(),
            _ => false,
        }
    }
}

/// One function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeExpr,
    /// True when the C++ declaration carries a default argument.
    pub has_default: bool,
}

impl ParamDef {
    pub fn new(name: &str, ty: TypeExpr) -> ParamDef {
        ParamDef {
            name: name.to_string(),
            ty,
            has_default: false,
        }
    }

    pub fn with_default(name: &str, ty: TypeExpr) -> ParamDef {
        ParamDef {
            name: name.to_string(),
            ty,
            has_default: true,
        }
    }
}

/// A callable declaration — free function, operator, method, ctor or dtor.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub kind: DeclKind,
    /// Qualified name, e.g. `ns::Widget::resize` or `ns::operator+`.
    pub qual_name: String,
    /// Unqualified name, e.g. `resize`, `operator+`, `~Widget`.
    pub name: String,
    /// Qualified name of the owning class for members.
    pub parent: Option<String>,
    pub ret: TypeExpr,
    pub params: Vec<ParamDef>,
    pub is_static: bool,
    pub is_const: bool,
    pub is_variadic: bool,
}

impl FuncDef {
    /// Parameters without default arguments (the required prefix).
    pub fn required_params(&self) -> Vec<ParamDef> {
        self.params
            .iter()
            .filter(|p| !p.has_default)
            .cloned()
            .collect()
    }
}

/// A C++ class or struct, reduced to what the wrapper needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub qual_name: String,
    pub name: String,
    /// False when only a declaration is visible anywhere in the translation
    /// unit; such classes get a handle but no thunks, and their by-value
    /// returns need `--copy`/`--assign`.
    pub is_complete: bool,
    /// Public constructors.
    pub ctors: Vec<FuncDef>,
    pub dtor: Option<FuncDef>,
    pub has_public_dtor: bool,
    /// Public, non-pure member functions.
    pub methods: Vec<FuncDef>,
    /// Public, non-pure member operators.
    pub operators: Vec<FuncDef>,
    /// `None` when unknowable (declaration-only class).
    pub has_copy_ctor: Option<bool>,
    /// Public default ctor *and* public assignment operator.
    pub has_default_ctor_and_assign: Option<bool>,
}

impl ClassDef {
    /// The public default constructor, if the class has one.
    pub fn default_ctor(&self) -> Option<&FuncDef> {
        self.ctors.iter().find(|c| c.params.is_empty())
    }
}

/// A C++ enum with its enumerators.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub qual_name: String,
    pub name: String,
    pub values: Vec<(String, i64)>,
}

/// A C++ typedef (or alias declaration).
#[derive(Debug, Clone, PartialEq)]
pub struct TypedefDef {
    pub qual_name: String,
    pub name: String,
    pub ty: TypeExpr,
}

/// Facade over the parsed translation unit — the only parser surface the
/// translation engine sees.
///
/// The slice accessors return declarations located in the input header, in
/// source order; the `lookup_*` accessors search the whole translation unit
/// and serve the worklist drain, declaration-only class resolution and the
/// `std::string` special case.
pub trait DeclSource {
    fn classes(&self) -> &[ClassDef];
    fn typedefs(&self) -> &[TypedefDef];
    fn enums(&self) -> &[EnumDef];
    fn free_functions(&self) -> &[FuncDef];
    fn free_operators(&self) -> &[FuncDef];

    fn lookup_class(&self, qual_name: &str) -> Option<ClassDef>;
    fn lookup_typedef(&self, qual_name: &str) -> Option<TypedefDef>;
    fn lookup_enum(&self, qual_name: &str) -> Option<EnumDef>;
}

/// Plain-data [`DeclSource`] — what the clang adapter produces and what
/// tests build by hand.
///
/// `extra_*` holds declarations visible in the translation unit but located
/// outside the input header; they are only reachable through lookups.
#[derive(Debug, Default)]
pub struct Unit {
    pub classes: Vec<ClassDef>,
    pub typedefs: Vec<TypedefDef>,
    pub enums: Vec<EnumDef>,
    pub free_functions: Vec<FuncDef>,
    pub free_operators: Vec<FuncDef>,
    pub extra_classes: Vec<ClassDef>,
    pub extra_typedefs: Vec<TypedefDef>,
    pub extra_enums: Vec<EnumDef>,
}

impl DeclSource for Unit {
    fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    fn typedefs(&self) -> &[TypedefDef] {
        &self.typedefs
    }

    fn enums(&self) -> &[EnumDef] {
        &self.enums
    }

    fn free_functions(&self) -> &[FuncDef] {
        &self.free_functions
    }

    fn free_operators(&self) -> &[FuncDef] {
        &self.free_operators
    }

    fn lookup_class(&self, qual_name: &str) -> Option<ClassDef> {
        self.classes
            .iter()
            .chain(self.extra_classes.iter())
            .find(|c| c.qual_name == qual_name)
            .cloned()
    }

    fn lookup_typedef(&self, qual_name: &str) -> Option<TypedefDef> {
        self.typedefs
            .iter()
            .chain(self.extra_typedefs.iter())
            .find(|t| t.qual_name == qual_name)
            .cloned()
    }

    fn lookup_enum(&self, qual_name: &str) -> Option<EnumDef> {
        self.enums
            .iter()
            .chain(self.extra_enums.iter())
            .find(|e| e.qual_name == qual_name)
            .cloned()
    }
}
