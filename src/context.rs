//! Translation context — all mutable state of one generator run.
//!
//! Owns the C++-name → C-name maps, the uniqueness ledger, the FIFO
//! worklists of transitively discovered declarations, and the
//! `std::string`/`std::wstring` records with their substitution sequences.
//! Everything is mutated through an exclusive reference; there is no global
//! state.

use std::collections::{HashMap, VecDeque};

use crate::mangle;
use crate::model::{ClassDef, TypedefDef};

/// Record for one of the two string specials (`std::string`, `std::wstring`).
#[derive(Debug, Clone)]
pub struct StringRecord {
    pub wide: bool,
    /// Mangled C name of the underlying class template instantiation.
    pub class_c_name: String,
    /// Mangled C name of the typedef (`std_string`).
    pub typedef_c_name: String,
    /// Qualified C++ name of the underlying class.
    pub class_full_name: String,
    /// Qualified C++ name of the typedef (`std::string`).
    pub typedef_full_name: String,
    /// Unqualified ctor name of the underlying class (`basic_string`).
    pub ctor_name: String,
    /// Unqualified typedef name (`string` / `wstring`).
    pub name: String,
}

/// Shared state of one translation run.
pub struct Context {
    pub is_c99: bool,
    /// Substituted C++ class name → opaque handle type name.
    class_ptrs: HashMap<String, String>,
    /// C++ typedef name → C alias.
    typedefs: HashMap<String, String>,
    /// C++ enum name → C tag.
    enums: HashMap<String, String>,
    /// Uniqueness ledger: identifier stem → times requested.
    counts: HashMap<String, u32>,
    /// Worklists of discovered-but-unemitted declarations (raw C++ names).
    pub pending_classes: VecDeque<String>,
    pub pending_typedefs: VecDeque<String>,
    pub pending_enums: VecDeque<String>,
    pub string_record: Option<StringRecord>,
    pub wstring_record: Option<StringRecord>,
    /// Operator token table sorted longest-first, fixed at construction.
    operator_table: Vec<(&'static str, &'static str)>,
}

impl Context {
    pub fn new(is_c99: bool) -> Context {
        Context {
            is_c99,
            class_ptrs: HashMap::new(),
            typedefs: HashMap::new(),
            enums: HashMap::new(),
            counts: HashMap::new(),
            pending_classes: VecDeque::new(),
            pending_typedefs: VecDeque::new(),
            pending_enums: VecDeque::new(),
            string_record: None,
            wstring_record: None,
            operator_table: mangle::operators_longest_first(),
        }
    }

    /// Translate an operator token through the longest-first table.
    pub fn operator_word(&self, token: &str) -> Option<&'static str> {
        mangle::operator_word(&self.operator_table, token)
    }

    /// Hand out a unique C identifier for `stem`.
    ///
    /// The first unforced request returns the stem unchanged; the n-th
    /// duplicate returns `stem<n>`. With `force_suffix` (enumerators) every
    /// request is numbered, starting at `stem1`.
    pub fn unique_token(&mut self, stem: &str, force_suffix: bool) -> String {
        let count = self.counts.entry(stem.to_string()).or_insert(0);
        *count += 1;
        if force_suffix {
            format!("{stem}{count}")
        } else if *count == 1 {
            stem.to_string()
        } else {
            format!("{stem}{}", *count - 1)
        }
    }

    /// Qualified C++ name with the string-typedef substitutions applied
    /// (`std::basic_string<char, ...>` reads as `std::string`).
    pub fn full_name(&self, qual_name: &str) -> String {
        let mut name = qual_name.to_string();
        for record in [&self.string_record, &self.wstring_record].into_iter().flatten() {
            name = name.replace(&record.class_full_name, &record.typedef_full_name);
        }
        name
    }

    /// Mangled C name with the C-side substitutions applied.
    pub fn c_name(&self, qual_name: &str) -> String {
        let mut name = mangle::c_name(qual_name);
        for record in [&self.string_record, &self.wstring_record].into_iter().flatten() {
            name = name.replace(&record.class_c_name, &record.typedef_c_name);
            name = name.replace(&record.ctor_name, &record.name);
        }
        name
    }

    /// Register a class, returning `(class_c_name, handle_type_name)`.
    pub fn add_class(&mut self, qual_name: &str, alternate_ptr_name: Option<&str>) -> (String, String) {
        let class_c_name = self.c_name(qual_name);
        let ptr_name = match alternate_ptr_name {
            Some(name) => name.to_string(),
            None => mangle::class_ptr_name(&class_c_name),
        };
        let key = self.full_name(qual_name);
        self.class_ptrs.insert(key, ptr_name.clone());
        (class_c_name, ptr_name)
    }

    /// Look up a class's `(substituted full name, handle type name)`,
    /// registering it and queueing it for emission on first reference.
    pub fn class_data(&mut self, qual_name: &str) -> (String, String) {
        let key = self.full_name(qual_name);
        if !self.class_ptrs.contains_key(&key) {
            self.add_class(qual_name, None);
            self.pending_classes.push_back(qual_name.to_string());
        }
        (key.clone(), self.class_ptrs[&key].clone())
    }

    /// Handle type name for an already-registered class.
    pub fn class_ptr(&self, qual_name: &str) -> Option<&String> {
        self.class_ptrs.get(&self.full_name(qual_name))
    }

    pub fn add_typedef(&mut self, qual_name: &str) -> String {
        let c_name = self.c_name(qual_name);
        self.typedefs.insert(qual_name.to_string(), c_name.clone());
        c_name
    }

    /// Look up a typedef's `(qualified name, C alias)`, registering and
    /// queueing on first reference.
    pub fn typedef_data(&mut self, qual_name: &str) -> (String, String) {
        if !self.typedefs.contains_key(qual_name) {
            self.add_typedef(qual_name);
            self.pending_typedefs.push_back(qual_name.to_string());
        }
        (qual_name.to_string(), self.typedefs[qual_name].clone())
    }

    pub fn add_enum(&mut self, qual_name: &str) -> String {
        let tag = mangle::enum_tag(qual_name, mangle::last_segment(qual_name));
        self.enums.insert(qual_name.to_string(), tag.clone());
        tag
    }

    /// Look up an enum's `(qualified name, C tag)`, registering and queueing
    /// on first reference.
    pub fn enum_data(&mut self, qual_name: &str) -> (String, String) {
        if !self.enums.contains_key(qual_name) {
            self.add_enum(qual_name);
            self.pending_enums.push_back(qual_name.to_string());
        }
        (qual_name.to_string(), self.enums[qual_name].clone())
    }

    /// Register one of the string specials and return the handle type name
    /// derived from the *typedef* (`PTR_std_string`), which reads better
    /// than the mangled template instantiation.
    pub fn add_std_string(&mut self, typedef: &TypedefDef, class: &ClassDef) -> (bool, String) {
        let wide = typedef.name.contains("wstring");
        let record = StringRecord {
            wide,
            class_c_name: mangle::c_name(&class.qual_name),
            typedef_c_name: mangle::c_name(&typedef.qual_name),
            class_full_name: class.qual_name.clone(),
            typedef_full_name: typedef.qual_name.clone(),
            ctor_name: class.name.clone(),
            name: typedef.name.clone(),
        };
        let ptr_name = mangle::class_ptr_name(&record.typedef_c_name);
        if wide {
            self.wstring_record = Some(record);
        } else {
            self.string_record = Some(record);
        }
        self.add_typedef(&typedef.qual_name);
        (wide, ptr_name)
    }

    /// True when all three worklists are drained.
    pub fn pending_empty(&self) -> bool {
        self.pending_classes.is_empty()
            && self.pending_typedefs.is_empty()
            && self.pending_enums.is_empty()
    }
}
