//! Definition model: the multi-level symbol table.
//!
//! Ownership is strictly hierarchical: [`GlobalScope`] owns packages,
//! packages own files, files own their class tree. Classes never point at
//! each other; cross references go through name lookups.

use crate::ir::GoType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolution state of a definition's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// No declared type: `void` methods.
    #[default]
    None,
    /// Not resolved yet, or could not be resolved. Holds the best-effort
    /// literal spelling.
    Unresolved(String),
    Resolved(GoType),
}

impl TypeRef {
    /// The Go type to use, falling back to the literal spelling.
    pub fn go_type(&self) -> Option<GoType> {
        match self {
            Self::None => None,
            Self::Unresolved(literal) => Some(GoType::named(literal.clone())),
            Self::Resolved(ty) => Some(ty.clone()),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

/// Source range (byte offsets) in which a local variable can be named:
/// from its declarator to the end of the enclosing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub from: usize,
    pub to: usize,
}

impl Visibility {
    pub fn contains(&self, at: usize) -> bool {
        self.from <= at && at < self.to
    }
}

/// One named entity: class, field, method, parameter or local variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    original_name: String,
    /// Java spelling of the type, empty when there is none (void, classes).
    original_type: String,
    /// Display name after the export rule and class flattening.
    /// Collision renaming always restarts from here.
    base_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub is_constructor: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    /// Carries an excluded annotation and must not be emitted.
    pub is_excluded: bool,
    /// Constructor synthesized for a class that declares none.
    pub is_implicit: bool,
    pub parameters: Vec<Definition>,
    pub children: Vec<Definition>,
    /// Set on locals only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<Visibility>,
}

impl Definition {
    /// A definition named by the export rule.
    pub fn new(original_name: &str, original_type: &str, public: bool) -> Self {
        Self::with_name(original_name, original_type, export_name(original_name, public))
    }

    /// A definition whose display name is decided by the caller
    /// (flattened classes, constructors).
    pub fn with_name(original_name: &str, original_type: &str, name: String) -> Self {
        let ty = if original_type.is_empty() {
            TypeRef::None
        } else {
            TypeRef::Unresolved(original_type.to_string())
        };
        Self {
            original_name: original_name.to_string(),
            original_type: original_type.to_string(),
            base_name: name.clone(),
            name,
            ty,
            is_constructor: false,
            is_static: false,
            is_abstract: false,
            is_excluded: false,
            is_implicit: false,
            parameters: Vec::new(),
            children: Vec::new(),
            visible: None,
        }
    }

    /// Local variable or parameter. These keep their Java spelling; only
    /// collision renaming may change them.
    pub fn local(original_name: &str, original_type: &str) -> Self {
        Self::with_name(original_name, original_type, original_name.to_string())
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn original_type(&self) -> &str {
        &self.original_type
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Parameter types as written (whitespace ignored), used to tell
    /// overloads apart.
    pub fn signature(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|p| p.original_type().split_whitespace().collect())
            .collect()
    }

    /// `static void main(String[] args)`
    pub fn is_main_shaped(&self) -> bool {
        self.original_name == "main"
            && self.is_static
            && !self.is_constructor
            && self.original_type.is_empty()
            && self.signature() == ["String[]"]
    }

    pub fn same_signature(&self, other: &Definition) -> bool {
        self.signature() == other.signature()
    }

    /// Look up a parameter or local variable by its Java name, as seen
    /// from byte offset `at`. Of the locals visible there the innermost
    /// (latest declared) wins; parameters come last.
    pub fn lookup_local(&self, original_name: &str, at: usize) -> Option<&Definition> {
        self.children
            .iter()
            .filter(|c| c.original_name == original_name)
            .filter(|c| c.visible.is_none_or(|v| v.contains(at)))
            .max_by_key(|c| c.visible.map_or(0, |v| v.from))
            .or_else(|| {
                self.parameters
                    .iter()
                    .find(|p| p.original_name == original_name)
            })
    }
}

/// Export rule: public names start uppercase, everything else lowercase.
pub fn export_name(name: &str, public: bool) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if public => first.to_uppercase().chain(chars).collect(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

/// One declared class, interface or enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassScope {
    pub class: Definition,
    pub kind: ClassKind,
    /// Java spelling of the `extends` clause of a class.
    pub superclass: Option<String>,
    /// Generic parameters declared by the class, erased during resolution.
    pub type_parameters: Vec<String>,
    pub subclasses: Vec<ClassScope>,
    pub fields: Vec<Definition>,
    pub methods: Vec<Definition>,
}

impl ClassScope {
    pub fn new(class: Definition, kind: ClassKind) -> Self {
        Self {
            class,
            kind,
            superclass: None,
            type_parameters: Vec::new(),
            subclasses: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// This class followed by all nested classes, depth first.
    pub fn flattened(&self) -> Vec<&ClassScope> {
        let mut out = vec![self];
        for sub in &self.subclasses {
            out.extend(sub.flattened());
        }
        out
    }

    /// Visit this class and every nested class, parents first.
    pub fn visit_mut<F: FnMut(&mut ClassScope)>(&mut self, f: &mut F) {
        f(self);
        for sub in &mut self.subclasses {
            sub.visit_mut(f);
        }
    }

    pub fn field(&self, original_name: &str) -> Option<&Definition> {
        self.fields.iter().find(|f| f.original_name() == original_name)
    }

    /// Methods (not constructors) with the given Java name.
    pub fn methods_named<'a>(
        &'a self,
        original_name: &'a str,
    ) -> impl Iterator<Item = &'a Definition> + 'a {
        self.methods
            .iter()
            .filter(move |m| !m.is_constructor && m.original_name() == original_name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &Definition> {
        self.methods.iter().filter(|m| m.is_constructor)
    }

    /// Is `original_name` a generic parameter of this class?
    pub fn is_type_parameter(&self, original_name: &str) -> bool {
        self.type_parameters.iter().any(|t| t == original_name)
    }
}

/// One source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileScope {
    /// Dotted Java package path, empty for the default package.
    pub package: String,
    /// Imported simple type name to the package it comes from.
    pub imports: BTreeMap<String, String>,
    /// Packages imported with `.*`.
    pub wildcard_imports: Vec<String>,
    pub base_class: Option<ClassScope>,
    /// Further non-public top-level types declared in the same file.
    pub other_classes: Vec<ClassScope>,
}

impl FileScope {
    /// All classes of the file, nested ones included, in declaration order.
    pub fn classes(&self) -> Vec<&ClassScope> {
        self.top_level().flat_map(ClassScope::flattened).collect()
    }

    /// The base class followed by any other top-level types.
    pub fn top_level(&self) -> impl Iterator<Item = &ClassScope> {
        self.base_class.iter().chain(self.other_classes.iter())
    }

    pub fn top_level_mut(&mut self) -> impl Iterator<Item = &mut ClassScope> {
        self.base_class.iter_mut().chain(self.other_classes.iter_mut())
    }

    /// Find a class of this file by its Java name. Nested classes are
    /// found by simple name or by `Outer.Inner`.
    pub fn class(&self, original_name: &str) -> Option<&ClassScope> {
        self.top_level()
            .find_map(|top| find_class(top, original_name, ""))
    }

    /// Find a class of this file by its Go display name.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassScope> {
        self.classes().into_iter().find(|c| c.class.name == name)
    }
}

fn find_class<'a>(class: &'a ClassScope, wanted: &str, prefix: &str) -> Option<&'a ClassScope> {
    let path = if prefix.is_empty() {
        class.class.original_name().to_string()
    } else {
        format!("{prefix}.{}", class.class.original_name())
    };
    if class.class.original_name() == wanted || path == wanted {
        return Some(class);
    }
    class
        .subclasses
        .iter()
        .find_map(|sub| find_class(sub, wanted, &path))
}

/// All files sharing one package path, keyed by file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PackageScope {
    pub files: BTreeMap<String, FileScope>,
}

impl PackageScope {
    /// Find a class anywhere in the package by its Java name.
    pub fn class(&self, original_name: &str) -> Option<&ClassScope> {
        self.files.values().find_map(|f| f.class(original_name))
    }
}

/// Process-wide lookup root for one translation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GlobalScope {
    pub packages: BTreeMap<String, PackageScope>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extracted file under its package.
    pub fn insert(&mut self, file_id: impl Into<String>, file: FileScope) {
        self.packages
            .entry(file.package.clone())
            .or_default()
            .files
            .insert(file_id.into(), file);
    }

    pub fn package(&self, path: &str) -> Option<&PackageScope> {
        self.packages.get(path)
    }

    pub fn file(&self, file_id: &str) -> Option<&FileScope> {
        self.packages.values().find_map(|p| p.files.get(file_id))
    }

    /// Pretty JSON dump of the whole table.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_name() {
        assert_eq!(export_name("getValue", true), "GetValue");
        assert_eq!(export_name("Value", false), "value");
        assert_eq!(export_name("x", true), "X");
        assert_eq!(export_name("", true), "");
    }

    #[test]
    fn test_export_changes_only_first_char() {
        for name in ["getValue", "URLParser", "a_b_c", "Ünïcode"] {
            let public = export_name(name, true);
            let private = export_name(name, false);
            assert_eq!(public.chars().skip(1).collect::<String>(), name.chars().skip(1).collect::<String>());
            assert_eq!(private.chars().skip(1).collect::<String>(), name.chars().skip(1).collect::<String>());
        }
    }

    #[test]
    fn test_definition_types() {
        let void = Definition::new("run", "", true);
        assert_eq!(void.ty, TypeRef::None);
        let field = Definition::new("value", "int", false);
        assert_eq!(field.ty, TypeRef::Unresolved("int".into()));
        assert_eq!(field.name, "value");
    }

    #[test]
    fn test_lookup_local_respects_visibility() {
        let local = |name: &str, ty: &str, from: usize, to: usize| {
            let mut def = Definition::local(name, ty);
            def.visible = Some(Visibility { from, to });
            def
        };
        let mut method = Definition::new("f", "", true);
        method.parameters.push(Definition::local("x", "int"));
        // { String y @10 ... } { long y @40 ... }, and an outer z from 5.
        method.children.push(local("y", "String", 10, 30));
        method.children.push(local("y", "long", 40, 60));
        method.children.push(local("z", "int", 5, 100));
        method.children.push(local("w", "int", 50, 100));
        method.children.push(local("x", "long", 70, 90));

        let ty = |name: &str, at: usize| method.lookup_local(name, at).map(|d| d.original_type());
        assert_eq!(ty("y", 20), Some("String"));
        assert_eq!(ty("y", 45), Some("long"));
        assert_eq!(ty("y", 35), None);
        assert_eq!(ty("w", 45), None);
        assert_eq!(ty("x", 20), Some("int"));
        assert_eq!(ty("x", 80), Some("long"));
        assert_eq!(ty("z", 99), Some("int"));
    }

    #[test]
    fn test_nested_class_lookup() {
        let mut outer = ClassScope::new(Definition::new("Outer", "", true), ClassKind::Class);
        outer.subclasses.push(ClassScope::new(
            Definition::with_name("Inner", "", "OuterInner".into()),
            ClassKind::Class,
        ));
        let file = FileScope {
            base_class: Some(outer),
            ..Default::default()
        };
        assert_eq!(file.class("Inner").unwrap().class.name, "OuterInner");
        assert_eq!(file.class("Outer.Inner").unwrap().class.name, "OuterInner");
        assert_eq!(file.classes().len(), 2);
        assert!(file.class_by_name("OuterInner").is_some());
    }
}
