//! Resolution: Java type references to Go types, then collision renaming.
//!
//! Both steps derive their output only from `original_name`,
//! `original_type` and the extraction-time base name, so running the
//! resolver again over an already resolved [`GlobalScope`] changes nothing.

use crate::diagnostics::Diagnostic;
use crate::ir::GoType;
use crate::scope::{ClassKind, ClassScope, Definition, GlobalScope, PackageScope, TypeRef};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, trace, warn};

/// Go keywords and the predeclared identifiers generated code depends on.
const GO_RESERVED: &[&str] = &[
    // keywords
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
    // predeclared
    "any", "append", "bool", "byte", "cap", "close", "copy", "delete", "error", "false",
    "float32", "float64", "init", "int", "int8", "int16", "int32", "int64", "iota", "len",
    "main", "make", "new", "nil", "panic", "print", "println", "recover", "rune", "string",
    "true", "uint8",
    // packages imported by lowered code
    "fmt", "math", "os",
];

/// Name of the injected conditional helper unless configured otherwise.
pub const DEFAULT_TERNARY_HELPER: &str = "ternary";

/// The Go package name for a Java package path.
pub fn go_package_name(java_package: &str) -> &str {
    match java_package.rsplit('.').next() {
        Some(last) if !last.is_empty() => last,
        _ => "main",
    }
}

/// Spelling for a name introduced during lowering (lambda parameters),
/// which the resolver never sees.
pub fn safe_local_name(name: &str) -> String {
    if !GO_RESERVED.contains(&name) && name != DEFAULT_TERNARY_HELPER {
        return name.to_string();
    }
    (0u64..)
        .map(|i| format!("{name}{i}"))
        .find(|candidate| !GO_RESERVED.contains(&candidate.as_str()))
        .unwrap_or_else(|| name.to_string())
}

/// Builtin Java types with a fixed Go spelling.
fn builtin_type(name: &str) -> Option<GoType> {
    let simple = match name.strip_prefix("java.") {
        Some(rest) => rest.rsplit('.').next().unwrap_or(rest),
        None => name,
    };
    let go = match simple {
        "int" | "Integer" => "int",
        "long" | "Long" => "int64",
        "short" | "Short" => "int16",
        "byte" | "Byte" => "int8",
        "char" | "Character" => "rune",
        "float" | "Float" => "float32",
        "double" | "Double" | "Number" => "float64",
        "boolean" | "Boolean" => "bool",
        "String" | "CharSequence" => "string",
        "Object" => return Some(GoType::Any),
        _ => return None,
    };
    Some(GoType::named(go))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Sequence,
    Map,
    Set,
}

fn collection(name: &str) -> Option<Collection> {
    let simple = name.rsplit('.').next().unwrap_or(name);
    match simple {
        "List" | "ArrayList" | "LinkedList" | "Collection" | "Iterable" | "Deque"
        | "ArrayDeque" | "Queue" | "Stack" | "Vector" => Some(Collection::Sequence),
        "Map" | "HashMap" | "TreeMap" | "LinkedHashMap" => Some(Collection::Map),
        "Set" | "HashSet" | "TreeSet" | "LinkedHashSet" => Some(Collection::Set),
        _ => None,
    }
}

/// A declared class as seen from other files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub package: String,
    pub file_id: String,
    /// Go display name.
    pub name: String,
    pub kind: ClassKind,
}

/// Snapshot of every declared class, keyed by Java name. Built after class
/// names are settled so type resolution can run while definitions are
/// being mutated.
#[derive(Debug, Default)]
pub struct TypeIndex {
    /// file id -> Java name (`Inner` or `Outer.Inner`) -> class
    files: HashMap<String, HashMap<String, ClassEntry>>,
    /// package -> Java name (top-level or `Outer.Inner`) -> class
    packages: HashMap<String, HashMap<String, ClassEntry>>,
}

impl TypeIndex {
    pub fn build(global: &GlobalScope) -> Self {
        let mut index = Self::default();
        for (package_path, package) in &global.packages {
            let in_package = index.packages.entry(package_path.clone()).or_default();
            for (file_id, file) in &package.files {
                let in_file = index.files.entry(file_id.clone()).or_default();
                for top in file.top_level() {
                    register(top, "", package_path, file_id, in_file, in_package);
                }
            }
        }
        index
    }

    pub fn in_file(&self, file_id: &str, name: &str) -> Option<&ClassEntry> {
        self.files.get(file_id)?.get(name)
    }

    pub fn in_package(&self, package: &str, name: &str) -> Option<&ClassEntry> {
        self.packages.get(package)?.get(name)
    }

    /// The Java package behind a Go package qualifier. Packages sharing a
    /// last segment resolve to the lexicographically first.
    pub fn java_package(&self, go_name: &str) -> Option<&str> {
        self.packages
            .keys()
            .filter(|path| go_package_name(path) == go_name)
            .min()
            .map(String::as_str)
    }

    /// Find a class by Go display name within a package.
    pub fn by_go_name(&self, package: &str, go_name: &str) -> Option<&ClassEntry> {
        self.packages
            .get(package)?
            .values()
            .find(|entry| entry.name == go_name)
    }
}

fn register(
    class: &ClassScope,
    prefix: &str,
    package: &str,
    file_id: &str,
    in_file: &mut HashMap<String, ClassEntry>,
    in_package: &mut HashMap<String, ClassEntry>,
) {
    let original = class.class.original_name();
    let path = if prefix.is_empty() {
        original.to_string()
    } else {
        format!("{prefix}.{original}")
    };
    let entry = ClassEntry {
        package: package.to_string(),
        file_id: file_id.to_string(),
        name: class.class.name.clone(),
        kind: class.kind,
    };
    in_file.entry(original.to_string()).or_insert_with(|| entry.clone());
    in_file.entry(path.clone()).or_insert_with(|| entry.clone());
    in_package.entry(path.clone()).or_insert(entry);
    for sub in &class.subclasses {
        register(sub, &path, package, file_id, in_file, in_package);
    }
}

/// Result of resolving one type spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub ty: GoType,
    /// Class names that could not be found, best-effort spelled in `ty`.
    pub unresolved: Vec<String>,
}

/// What a file can see: its own classes, its package, its imports.
#[derive(Debug, Clone)]
pub struct TypeEnv<'a> {
    pub index: &'a TypeIndex,
    pub file_id: &'a str,
    pub package: &'a str,
    pub imports: &'a BTreeMap<String, String>,
    pub wildcard_imports: &'a [String],
    /// Generic parameters in scope, erased to `any`.
    pub type_params: Vec<String>,
}

impl<'a> TypeEnv<'a> {
    /// Resolve a Java type spelling such as `Map<String, List<Node>>[]`.
    pub fn resolve(&self, spelling: &str) -> Resolution {
        let compact: String = spelling
            .split_whitespace()
            .filter(|token| !token.starts_with('@'))
            .collect();
        let mut unresolved = Vec::new();
        let ty = self.resolve_compact(&compact, &mut unresolved);
        Resolution { ty, unresolved }
    }

    /// Resolve to a [`TypeRef`]. A wholly unknown name keeps its literal spelling.
    pub fn type_ref(&self, spelling: &str) -> (TypeRef, Vec<String>) {
        let spelling = spelling.trim();
        if spelling.is_empty() || spelling == "var" {
            return (TypeRef::None, Vec::new());
        }
        let resolution = self.resolve(spelling);
        let whole: String = spelling.split_whitespace().collect();
        if resolution.unresolved.len() == 1 && resolution.unresolved[0] == whole {
            (TypeRef::Unresolved(whole), resolution.unresolved)
        } else {
            (TypeRef::Resolved(resolution.ty), resolution.unresolved)
        }
    }

    fn resolve_compact(&self, spelling: &str, unresolved: &mut Vec<String>) -> GoType {
        if let Some(elem) = spelling
            .strip_suffix("[]")
            .or_else(|| spelling.strip_suffix("..."))
        {
            return GoType::slice(self.resolve_compact(elem, unresolved));
        }
        if spelling == "?" || spelling.starts_with("?extends") || spelling.starts_with("?super") {
            return GoType::Any;
        }

        let (base, args) = split_generic(spelling);
        if let Some(kind) = collection(base) {
            let mut arg = |i: usize| {
                args.get(i)
                    .map(|a| self.resolve_compact(a, unresolved))
                    .unwrap_or(GoType::Any)
            };
            return match kind {
                Collection::Sequence => GoType::slice(arg(0)),
                Collection::Map => {
                    let key = arg(0);
                    GoType::map(key, arg(1))
                }
                Collection::Set => GoType::map(arg(0), GoType::named("bool")),
            };
        }

        if let Some(ty) = builtin_type(base) {
            return ty;
        }
        if self.type_params.iter().any(|t| t == base) {
            return GoType::Any;
        }
        if let Some(ty) = self.lookup_class(base) {
            return ty;
        }

        trace!(spelling = base, file = self.file_id, "type not found");
        unresolved.push(spelling.to_string());
        GoType::named(spelling)
    }

    /// Local file, then same package, then explicit imports, then wildcards.
    fn lookup_class(&self, name: &str) -> Option<GoType> {
        if let Some(entry) = self.index.in_file(self.file_id, name) {
            return Some(self.entry_type(entry));
        }
        if let Some(entry) = self.index.in_package(self.package, name) {
            return Some(self.entry_type(entry));
        }

        // Qualified spelling: `com.example.Node` or `Outer.Inner` of an import.
        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        if let Some(package) = self.imports.get(head) {
            let path = match rest {
                Some(rest) => format!("{head}.{rest}"),
                None => head.to_string(),
            };
            if let Some(entry) = self.find_imported(package, &path) {
                return Some(self.entry_type(entry));
            }
        }
        for package in self.wildcard_imports {
            if let Some(entry) = self.index.in_package(package, name) {
                return Some(self.entry_type(entry));
            }
        }
        if let Some((package, simple)) = name.rsplit_once('.')
            && let Some(entry) = self.index.in_package(package, simple)
        {
            return Some(self.entry_type(entry));
        }
        None
    }

    /// Imports may name a nested class: `a.b.Outer.Inner` is stored as
    /// package `a.b.Outer`, class `Inner`.
    fn find_imported(&self, package: &str, path: &str) -> Option<&'a ClassEntry> {
        if let Some(entry) = self.index.in_package(package, path) {
            return Some(entry);
        }
        let (outer_package, outer) = package.rsplit_once('.')?;
        self.index
            .in_package(outer_package, &format!("{outer}.{path}"))
    }

    /// Classes are passed by reference, interfaces and enums by value.
    pub fn entry_type(&self, entry: &ClassEntry) -> GoType {
        let named = if entry.package == self.package {
            GoType::named(entry.name.clone())
        } else {
            GoType::qualified(go_package_name(&entry.package), entry.name.clone())
        };
        match entry.kind {
            ClassKind::Class => GoType::pointer(named),
            ClassKind::Interface | ClassKind::Enum => named,
        }
    }

    /// Find the class a Java name refers to, for static member access.
    pub fn class_entry(&self, name: &str) -> Option<&'a ClassEntry> {
        self.index
            .in_file(self.file_id, name)
            .or_else(|| self.index.in_package(self.package, name))
            .or_else(|| {
                self.imports
                    .get(name)
                    .and_then(|package| self.find_imported(package, name))
            })
            .or_else(|| {
                self.wildcard_imports
                    .iter()
                    .find_map(|package| self.index.in_package(package, name))
            })
    }
}

/// `Map<K,List<V>>` -> (`Map`, [`K`, `List<V>`])
fn split_generic(spelling: &str) -> (&str, Vec<&str>) {
    let Some(open) = spelling.find('<') else {
        return (spelling, Vec::new());
    };
    let Some(inner) = spelling[open + 1..].strip_suffix('>') else {
        return (spelling, Vec::new());
    };

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if !inner[start..].is_empty() {
        args.push(&inner[start..]);
    }
    (&spelling[..open], args)
}

/// Identity of a package-level name's owner. Two definitions with the same
/// key are the same entity and never collide with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Owner {
    class: String,
    member: String,
    signature: Vec<String>,
}

impl Owner {
    fn of(class: &str, def: &Definition) -> Self {
        Self {
            class: class.to_string(),
            member: def.original_name().to_string(),
            signature: def.signature(),
        }
    }
}

/// Resolves types and settles names over a whole [`GlobalScope`].
#[derive(Debug, Clone)]
pub struct Resolver {
    reserved: HashSet<String>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        let mut reserved: HashSet<String> = GO_RESERVED.iter().map(|s| s.to_string()).collect();
        reserved.insert(DEFAULT_TERNARY_HELPER.to_string());
        Self { reserved }
    }

    /// Reserve an extra identifier, e.g. a configured helper name.
    pub fn with_reserved(mut self, name: impl Into<String>) -> Self {
        self.reserved.insert(name.into());
        self
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Resolve every definition reachable from `global`.
    pub fn resolve(&self, global: &mut GlobalScope) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for package in global.packages.values_mut() {
            self.settle_class_names(package);
        }

        let index = TypeIndex::build(global);
        for (package_path, package) in global.packages.iter_mut() {
            debug!(package = %package_path, files = package.files.len(), "resolving types");
            for (file_id, file) in package.files.iter_mut() {
                let crate::scope::FileScope {
                    imports,
                    wildcard_imports,
                    base_class,
                    other_classes,
                    ..
                } = file;
                let env = TypeEnv {
                    index: &index,
                    file_id,
                    package: package_path,
                    imports,
                    wildcard_imports,
                    type_params: Vec::new(),
                };
                for class in base_class.iter_mut().chain(other_classes.iter_mut()) {
                    resolve_class_types(class, &env, &mut diagnostics);
                }
            }
            self.rename_package(package);
        }

        diagnostics
    }

    /// Classes only need to avoid reserved words and each other.
    fn settle_class_names(&self, package: &mut PackageScope) {
        let mut claimed = HashSet::new();
        for file in package.files.values_mut() {
            for top in file.top_level_mut() {
                top.visit_mut(&mut |class: &mut ClassScope| {
                    let name = self.settle(class.class.base_name(), |n| claimed.contains(n));
                    claimed.insert(name.clone());
                    class.class.name = name;
                });
            }
        }
    }

    fn rename_package(&self, package: &mut PackageScope) {
        // Package-level Go names: types, constructors, static fields and
        // static methods.
        let mut claimed: HashMap<String, Owner> = HashMap::new();
        // Static field names, with the class that declares them.
        let mut static_fields: HashMap<String, String> = HashMap::new();

        for file in package.files.values() {
            for class in file.classes() {
                claimed.insert(
                    class.class.name.clone(),
                    Owner::of(&class.class.name, &class.class),
                );
            }
        }

        for file in package.files.values_mut() {
            for top in file.top_level_mut() {
                top.visit_mut(&mut |class: &mut ClassScope| {
                    self.rename_class(class, &mut claimed, &mut static_fields);
                });
            }
        }
    }

    fn rename_class(
        &self,
        class: &mut ClassScope,
        claimed: &mut HashMap<String, Owner>,
        static_fields: &mut HashMap<String, String>,
    ) {
        let class_name = class.class.name.clone();

        for field in &mut class.fields {
            let owner = Owner::of(&class_name, field);
            let name = if field.is_static {
                self.settle(field.base_name(), |n| {
                    claimed.get(n).is_some_and(|o| *o != owner)
                })
            } else {
                self.settle(field.base_name(), |n| {
                    static_fields.get(n).is_some_and(|c| *c != class_name)
                })
            };
            if name != field.base_name() {
                trace!(from = field.base_name(), to = %name, "renamed field");
            }
            if field.is_static {
                claimed.insert(name.clone(), owner);
                static_fields.insert(name.clone(), class_name.clone());
            }
            field.name = name;
            self.rename_locals(field);
        }

        let instance_fields: HashSet<String> = class
            .fields
            .iter()
            .filter(|f| !f.is_static)
            .map(|f| f.name.clone())
            .collect();

        // (Go name, Java name, signature) of every method named so far.
        let mut settled: Vec<(String, String, Vec<String>)> = Vec::new();
        for method in &mut class.methods {
            let owner = Owner::of(&class_name, method);
            let original = method.original_name().to_string();
            let signature = method.signature();
            let package_level = method.is_static || method.is_constructor;
            let main = method.is_main_shaped();
            let base = if main { "main" } else { method.base_name() };

            // Only a redeclaration of the same method may share a name.
            let overloaded = |n: &str| {
                settled
                    .iter()
                    .any(|(name, java, sig)| name == n && (*java != original || *sig != signature))
            };
            let name = self.settle_with(base, main, |n| {
                overloaded(n)
                    || (package_level && claimed.get(n).is_some_and(|o| *o != owner))
                    || (!package_level && instance_fields.contains(n))
            });
            if name != base {
                trace!(from = base, to = %name, "renamed method");
            }
            if package_level {
                claimed.insert(name.clone(), owner);
            }
            settled.push((name.clone(), original, signature));
            method.name = name;
            self.rename_locals(method);
        }
    }

    /// Parameters and locals only have to avoid reserved words.
    fn rename_locals(&self, def: &mut Definition) {
        for local in def.parameters.iter_mut().chain(def.children.iter_mut()) {
            local.name = self.settle(local.base_name(), |_| false);
            self.rename_locals(local);
        }
    }

    fn settle(&self, base: &str, collides: impl Fn(&str) -> bool) -> String {
        self.settle_with(base, false, collides)
    }

    /// Append `0, 1, 2, ...` to `base` until nothing collides. `allow_base`
    /// lets a reserved base through unsuffixed (Go's `main`).
    fn settle_with(&self, base: &str, allow_base: bool, collides: impl Fn(&str) -> bool) -> String {
        let taken = |n: &str| (self.is_reserved(n) && !(allow_base && n == base)) || collides(n);
        if !taken(base) {
            return base.to_string();
        }
        (0u64..)
            .map(|i| format!("{base}{i}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

fn resolve_class_types(class: &mut ClassScope, env: &TypeEnv, diagnostics: &mut Vec<Diagnostic>) {
    let mut env = env.clone();
    env.type_params.extend(class.type_parameters.iter().cloned());
    let class_name = class.class.original_name().to_string();

    for field in &mut class.fields {
        resolve_definition(field, &env, &class_name, diagnostics);
    }
    for method in &mut class.methods {
        resolve_definition(method, &env, &class_name, diagnostics);
    }
    for sub in &mut class.subclasses {
        resolve_class_types(sub, &env, diagnostics);
    }
}

fn resolve_definition(
    def: &mut Definition,
    env: &TypeEnv,
    class_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (ty, unresolved) = env.type_ref(def.original_type());
    for name in unresolved {
        warn!(file = env.file_id, ty = %name, member = def.original_name(), "unresolved type");
        diagnostics.push(Diagnostic::unresolved(
            env.file_id,
            &name,
            &format!("`{}` of class `{class_name}`", def.original_name()),
        ));
    }
    def.ty = ty;
    for child in def.parameters.iter_mut().chain(def.children.iter_mut()) {
        resolve_definition(child, env, class_name, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::syntax::parse_java;

    fn global_of(files: &[(&str, &str)]) -> GlobalScope {
        let mut global = GlobalScope::new();
        for (id, source) in files {
            let tree = parse_java(source).unwrap();
            let file = extract(tree.root_node(), source, &[]).unwrap();
            global.insert(*id, file);
        }
        global
    }

    fn class<'g>(global: &'g GlobalScope, file: &str) -> &'g ClassScope {
        global.file(file).unwrap().base_class.as_ref().unwrap()
    }

    #[test]
    fn test_split_generic() {
        assert_eq!(split_generic("Map<K,List<V>>"), ("Map", vec!["K", "List<V>"]));
        assert_eq!(split_generic("String"), ("String", vec![]));
    }

    #[test]
    fn test_builtin_and_collection_types() {
        let mut global = global_of(&[(
            "A.java",
            "class A { int a; long b; String c; List<Integer> d; Map<String, int[]> e; Set<Long> f; Object g; java.lang.String h; }",
        )]);
        let diagnostics = Resolver::new().resolve(&mut global);
        assert!(diagnostics.is_empty());
        let a = class(&global, "A.java");
        let ty = |n: &str| a.field(n).unwrap().ty.go_type().unwrap().to_string();
        assert_eq!(ty("a"), "int");
        assert_eq!(ty("b"), "int64");
        assert_eq!(ty("c"), "string");
        assert_eq!(ty("d"), "[]int");
        assert_eq!(ty("e"), "map[string][]int");
        assert_eq!(ty("f"), "map[int64]bool");
        assert_eq!(ty("g"), "any");
        assert_eq!(ty("h"), "string");
    }

    #[test]
    fn test_local_and_nested_classes_are_pointers() {
        let mut global = global_of(&[(
            "List.java",
            "public class LinkedIntList { private Node head; private static class Node { int value; Node next; } Runnable r; }",
        )]);
        Resolver::new().resolve(&mut global);
        let list = class(&global, "List.java");
        assert_eq!(
            list.field("head").unwrap().ty,
            TypeRef::Resolved(GoType::pointer(GoType::named("LinkedIntListnode")))
        );
        let node = &list.subclasses[0];
        assert_eq!(
            node.field("next").unwrap().ty.go_type().unwrap().to_string(),
            "*LinkedIntListnode"
        );
    }

    #[test]
    fn test_cross_package_import() {
        let mut global = global_of(&[
            (
                "app/App.java",
                "package com.app; import com.model.Item; import com.shape.*; public class App { Item item; Shape shape; }",
            ),
            ("model/Item.java", "package com.model; public class Item {}"),
            ("shape/Shape.java", "package com.shape; public interface Shape { double area(); }"),
        ]);
        let diagnostics = Resolver::new().resolve(&mut global);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let app = class(&global, "app/App.java");
        assert_eq!(app.field("item").unwrap().ty.go_type().unwrap().to_string(), "*model.Item");
        assert_eq!(app.field("shape").unwrap().ty.go_type().unwrap().to_string(), "shape.Shape");
    }

    #[test]
    fn test_same_package_lookup() {
        let mut global = global_of(&[
            ("a/A.java", "package p; public class A { B other; }"),
            ("a/B.java", "package p; public class B {}"),
        ]);
        Resolver::new().resolve(&mut global);
        let a = class(&global, "a/A.java");
        assert_eq!(a.field("other").unwrap().ty.go_type().unwrap().to_string(), "*B");
    }

    #[test]
    fn test_unresolved_import_keeps_spelling() {
        let mut global = global_of(&[(
            "A.java",
            "import org.missing.Widget; public class A { Widget w; int ok; }",
        )]);
        let diagnostics = Resolver::new().resolve(&mut global);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, crate::diagnostics::DiagnosticKind::UnresolvedType);
        let a = class(&global, "A.java");
        assert_eq!(a.field("w").unwrap().ty, TypeRef::Unresolved("Widget".into()));
        assert_eq!(a.field("ok").unwrap().ty, TypeRef::Resolved(GoType::named("int")));
    }

    #[test]
    fn test_generic_parameters_erase_to_any() {
        let mut global = global_of(&[("Box.java", "public class Box<T> { T item; List<T> items; }")]);
        let diagnostics = Resolver::new().resolve(&mut global);
        assert!(diagnostics.is_empty());
        let b = class(&global, "Box.java");
        assert_eq!(b.field("item").unwrap().ty, TypeRef::Resolved(GoType::Any));
        assert_eq!(b.field("items").unwrap().ty.go_type().unwrap().to_string(), "[]any");
    }

    #[test]
    fn test_reserved_words_renamed() {
        let mut global = global_of(&[(
            "A.java",
            "class A { int type; void range(int func, int len) { int map = 0; } }",
        )]);
        Resolver::new().resolve(&mut global);
        let a = class(&global, "A.java");
        assert_eq!(a.field("type").unwrap().name, "type0");
        let range = a.methods_named("range").next().unwrap();
        assert_eq!(range.name, "range0");
        assert_eq!(range.parameters[0].name, "func0");
        assert_eq!(range.parameters[1].name, "len0");
        assert_eq!(range.children[0].name, "map0");
    }

    #[test]
    fn test_overloads_get_distinct_names() {
        let mut global = global_of(&[(
            "A.java",
            "public class A { public void add(int x) {} public void add(String s) {} public void add(int x, int y) {} }",
        )]);
        Resolver::new().resolve(&mut global);
        let names: Vec<String> = class(&global, "A.java")
            .methods_named("add")
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["Add", "Add0", "Add1"]);
    }

    #[test]
    fn test_same_signature_is_same_entity() {
        let mut global = global_of(&[(
            "A.java",
            "interface A { void run(int x); void run(int  x); }",
        )]);
        Resolver::new().resolve(&mut global);
        let names: Vec<String> = class(&global, "A.java")
            .methods_named("run")
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["Run", "Run"]);
    }

    #[test]
    fn test_suffixed_overload_does_not_capture_other_method() {
        let mut global = global_of(&[(
            "A.java",
            "public class A { public void add(int x) {} public void add(String s) {} public void add0(String s) {} }",
        )]);
        Resolver::new().resolve(&mut global);
        let a = class(&global, "A.java");
        let names: Vec<&str> = a.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Add", "Add0", "Add00"]);
    }

    #[test]
    fn test_constructor_overloads() {
        let mut global = global_of(&[(
            "P.java",
            "public class P { public P() {} public P(int x) {} }",
        )]);
        Resolver::new().resolve(&mut global);
        let names: Vec<String> = class(&global, "P.java")
            .constructors()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["NewP", "NewP0"]);
    }

    #[test]
    fn test_static_names_across_files() {
        let mut global = global_of(&[
            ("a/A.java", "package p; class A { static int count; static void helper() {} }"),
            ("a/B.java", "package p; class B { static int count; static void helper() {} int count2; }"),
        ]);
        Resolver::new().resolve(&mut global);
        let a = class(&global, "a/A.java");
        let b = class(&global, "a/B.java");
        assert_eq!(a.field("count").unwrap().name, "count");
        assert_eq!(b.field("count").unwrap().name, "count0");
        assert_eq!(a.methods_named("helper").next().unwrap().name, "helper");
        assert_eq!(b.methods_named("helper").next().unwrap().name, "helper0");
    }

    #[test]
    fn test_method_and_field_do_not_share_names() {
        let mut global = global_of(&[("A.java", "class A { int size; int size() { return size; } }")]);
        Resolver::new().resolve(&mut global);
        let a = class(&global, "A.java");
        assert_eq!(a.field("size").unwrap().name, "size");
        assert_eq!(a.methods_named("size").next().unwrap().name, "size0");
    }

    #[test]
    fn test_main_shaped_method() {
        let mut global = global_of(&[(
            "Main.java",
            "public class Main { public static void main(String[] args) {} }",
        )]);
        Resolver::new().resolve(&mut global);
        let main = class(&global, "Main.java").methods_named("main").next().unwrap();
        assert_eq!(main.name, "main");
        assert_eq!(main.parameters[0].ty.go_type().unwrap().to_string(), "[]string");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut global = global_of(&[
            (
                "a/A.java",
                "package p; import q.Missing; public class A { int len; Missing m; static int count; public void add(int x) {} public void add(long x) {} B b; }",
            ),
            ("a/B.java", "package p; class B { static int count; int type; }"),
        ]);
        let resolver = Resolver::new();
        resolver.resolve(&mut global);
        let once = global.clone();
        resolver.resolve(&mut global);
        assert_eq!(once, global);
    }

    #[test]
    fn test_no_reserved_names_survive() {
        let mut global = global_of(&[(
            "A.java",
            "class A { int go; int chan; int select; void defer(int fallthrough) { int goto0 = 1; int iota = 2; } }",
        )]);
        let resolver = Resolver::new();
        resolver.resolve(&mut global);
        let a = class(&global, "A.java");
        let mut names = vec![a.class.name.clone()];
        for def in a.fields.iter().chain(a.methods.iter()) {
            names.push(def.name.clone());
            for local in def.parameters.iter().chain(def.children.iter()) {
                names.push(local.name.clone());
            }
        }
        assert!(names.iter().all(|n| !resolver.is_reserved(n)), "{names:?}");
    }
}
