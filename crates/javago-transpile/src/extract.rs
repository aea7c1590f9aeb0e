//! Symbol extraction: one walk over a file's syntax tree that builds its
//! unresolved [`FileScope`].
//!
//! Only the export rule and class flattening name things here. Types are
//! captured as written and left for the resolver.

use crate::error::Error;
use crate::scope::{ClassKind, ClassScope, Definition, FileScope, Visibility, export_name};
use crate::syntax::{JavaKind, Modifiers, declaration_name, named_children, required_field, text};
use tree_sitter::Node;

/// Build the scope tree of one file.
pub fn extract(root: Node, source: &str, excluded: &[String]) -> Result<FileScope, Error> {
    Extractor { source, excluded }.extract_file(root)
}

struct Extractor<'a> {
    source: &'a str,
    excluded: &'a [String],
}

impl<'a> Extractor<'a> {
    fn text(&self, node: Node) -> &'a str {
        text(node, self.source)
    }

    fn extract_file(&self, root: Node) -> Result<FileScope, Error> {
        if JavaKind::of(root) != JavaKind::Program {
            return Err(Error::assertion(root, "root node is not a program"));
        }

        let mut file = FileScope::default();
        for child in named_children(root) {
            match JavaKind::of(child) {
                JavaKind::PackageDeclaration => {
                    file.package = self.qualified_name(child)?.to_string();
                }
                JavaKind::ImportDeclaration => self.read_import(child, &mut file)?,
                JavaKind::ClassDeclaration
                | JavaKind::InterfaceDeclaration
                | JavaKind::EnumDeclaration => {
                    let class = self.build_class(child, None)?;
                    if file.base_class.is_none() {
                        file.base_class = Some(class);
                    } else {
                        file.other_classes.push(class);
                    }
                }
                _ => {}
            }
        }
        Ok(file)
    }

    /// The dotted name inside a package or import declaration.
    fn qualified_name(&self, node: Node) -> Result<&'a str, Error> {
        named_children(node)
            .into_iter()
            .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
            .map(|c| self.text(c))
            .ok_or_else(|| Error::assertion(node, "declaration without a name"))
    }

    fn read_import(&self, node: Node, file: &mut FileScope) -> Result<(), Error> {
        let mut cursor = node.walk();
        let is_static = node.children(&mut cursor).any(|c| c.kind() == "static");
        if is_static {
            return Ok(());
        }

        let path = self.qualified_name(node)?;
        let wildcard = named_children(node).iter().any(|c| c.kind() == "asterisk");
        if wildcard {
            file.wildcard_imports.push(path.to_string());
        } else if let Some((package, simple)) = path.rsplit_once('.') {
            file.imports.insert(simple.to_string(), package.to_string());
        }
        Ok(())
    }

    fn build_class(&self, node: Node, parent: Option<&str>) -> Result<ClassScope, Error> {
        let mods = Modifiers::of(node, self.source);
        let original = declaration_name(node, self.source)?;
        let kind = match JavaKind::of(node) {
            JavaKind::InterfaceDeclaration => ClassKind::Interface,
            JavaKind::EnumDeclaration => ClassKind::Enum,
            _ => ClassKind::Class,
        };

        let own = export_name(original, mods.is_public());
        let display = match parent {
            Some(parent) => format!("{parent}{own}"),
            None => own,
        };

        let mut class_def = Definition::with_name(original, "", display.clone());
        class_def.is_static = mods.is_static();
        class_def.is_abstract = mods.is_abstract();
        class_def.is_excluded = mods.is_excluded(self.excluded);

        let mut class = ClassScope::new(class_def, kind);
        if let Some(superclass) = node.child_by_field_name("superclass") {
            class.superclass = named_children(superclass)
                .first()
                .map(|t| self.text(*t).to_string());
        }
        if let Some(params) = node.child_by_field_name("type_parameters") {
            for param in named_children(params) {
                if let Some(name) = named_children(param)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                {
                    class.type_parameters.push(self.text(name).to_string());
                }
            }
        }

        let body = required_field(node, "body")?;
        // Enum constants and bodies are not translated.
        if kind != ClassKind::Enum {
            for member in named_children(body) {
                self.read_member(member, kind, &display, &mut class)?;
            }
        }

        if kind == ClassKind::Class && class.constructors().next().is_none() {
            let mut implicit =
                Definition::with_name(original, original, constructor_name(&display));
            implicit.is_constructor = true;
            implicit.is_implicit = true;
            class.methods.push(implicit);
        }

        Ok(class)
    }

    fn read_member(
        &self,
        member: Node,
        kind: ClassKind,
        display: &str,
        class: &mut ClassScope,
    ) -> Result<(), Error> {
        match JavaKind::of(member) {
            JavaKind::FieldDeclaration | JavaKind::ConstantDeclaration => {
                let mods = Modifiers::of(member, self.source);
                let ty = self.text(required_field(member, "type")?);
                let mut cursor = member.walk();
                let declarators: Vec<Node> = member
                    .children_by_field_name("declarator", &mut cursor)
                    .collect();
                for declarator in declarators {
                    let name = declaration_name(declarator, self.source)?;
                    let ty = self.with_dimensions(ty, declarator);
                    // Interface fields are implicitly public static.
                    let interface = kind == ClassKind::Interface;
                    let mut field = Definition::new(name, &ty, mods.is_public() || interface);
                    field.is_static = mods.is_static() || interface;
                    field.is_excluded = mods.is_excluded(self.excluded);
                    class.fields.push(field);
                }
            }
            JavaKind::MethodDeclaration => {
                let mods = Modifiers::of(member, self.source);
                let name = declaration_name(member, self.source)?;
                let ty_node = required_field(member, "type")?;
                let ty = match JavaKind::of(ty_node) {
                    JavaKind::VoidType => String::new(),
                    _ => self.with_dimensions(self.text(ty_node), member),
                };
                let public = mods.is_public() || kind == ClassKind::Interface;
                let mut method = Definition::new(name, &ty, public);
                method.is_static = mods.is_static();
                method.is_excluded = mods.is_excluded(self.excluded);
                method.parameters = self.read_parameters(required_field(member, "parameters")?)?;
                match member.child_by_field_name("body") {
                    Some(body) => self.collect_locals(body, body.end_byte(), &mut method.children)?,
                    None => method.is_abstract = true,
                }
                class.methods.push(method);
            }
            JavaKind::ConstructorDeclaration => {
                let mods = Modifiers::of(member, self.source);
                let original = class.class.original_name().to_string();
                let mut ctor =
                    Definition::with_name(&original, &original, constructor_name(display));
                ctor.is_constructor = true;
                ctor.is_excluded = mods.is_excluded(self.excluded);
                ctor.parameters = self.read_parameters(required_field(member, "parameters")?)?;
                let body = required_field(member, "body")?;
                self.collect_locals(body, body.end_byte(), &mut ctor.children)?;
                class.methods.push(ctor);
            }
            JavaKind::ClassDeclaration
            | JavaKind::InterfaceDeclaration
            | JavaKind::EnumDeclaration => {
                let nested = self.build_class(member, Some(display))?;
                class.subclasses.push(nested);
            }
            _ => {}
        }
        Ok(())
    }

    /// `int a[]` style declarators carry part of the type on the name.
    fn with_dimensions(&self, ty: &str, declarator: Node) -> String {
        match declarator.child_by_field_name("dimensions") {
            Some(dims) => {
                let dims: String = self.text(dims).split_whitespace().collect();
                format!("{ty}{dims}")
            }
            None => ty.to_string(),
        }
    }

    fn read_parameters(&self, node: Node) -> Result<Vec<Definition>, Error> {
        let mut params = Vec::new();
        for param in named_children(node) {
            match param.kind() {
                "formal_parameter" => {
                    let name = declaration_name(param, self.source)?;
                    let ty = self.with_dimensions(self.text(required_field(param, "type")?), param);
                    params.push(Definition::local(name, &ty));
                }
                // `String... args` is taken as an array parameter.
                "spread_parameter" => {
                    let children = named_children(param);
                    let ty = children
                        .iter()
                        .find(|c| c.kind() != "modifiers" && c.kind() != "variable_declarator")
                        .ok_or_else(|| Error::assertion(param, "spread parameter without type"))?;
                    let declarator = children
                        .iter()
                        .find(|c| c.kind() == "variable_declarator")
                        .ok_or_else(|| Error::assertion(param, "spread parameter without name"))?;
                    let name = declaration_name(*declarator, self.source)?;
                    params.push(Definition::local(name, &format!("{}[]", self.text(*ty))));
                }
                _ => {}
            }
        }
        Ok(params)
    }

    /// Register locals declared in a method body, each visible from its
    /// declarator up to `until` (the end of the enclosing block). Only
    /// statement bodies are entered; expressions (and so lambda bodies)
    /// are not.
    fn collect_locals(
        &self,
        node: Node,
        until: usize,
        out: &mut Vec<Definition>,
    ) -> Result<(), Error> {
        let local = |name: &str, ty: &str, at: Node| {
            let mut def = Definition::local(name, ty);
            def.visible = Some(Visibility {
                from: at.start_byte(),
                to: until,
            });
            def
        };
        match JavaKind::of(node) {
            JavaKind::Block | JavaKind::ConstructorBody => {
                for stmt in named_children(node) {
                    self.collect_locals(stmt, node.end_byte(), out)?;
                }
            }
            JavaKind::LocalVariableDeclaration => {
                let ty = self.text(required_field(node, "type")?);
                let mut cursor = node.walk();
                let declarators: Vec<Node> =
                    node.children_by_field_name("declarator", &mut cursor).collect();
                for declarator in declarators {
                    let name = declaration_name(declarator, self.source)?;
                    out.push(local(name, &self.with_dimensions(ty, declarator), declarator));
                    if let Some(value) = declarator
                        .child_by_field_name("value")
                        .filter(|v| JavaKind::of(*v) == JavaKind::SwitchExpression)
                    {
                        self.collect_locals(value, until, out)?;
                    }
                }
            }
            JavaKind::ForStatement => {
                let mut cursor = node.walk();
                let inits: Vec<Node> = node.children_by_field_name("init", &mut cursor).collect();
                for init in inits {
                    if JavaKind::of(init) == JavaKind::LocalVariableDeclaration {
                        self.collect_locals(init, node.end_byte(), out)?;
                    }
                }
                self.collect_locals(required_field(node, "body")?, node.end_byte(), out)?;
            }
            JavaKind::EnhancedForStatement => {
                let name = declaration_name(node, self.source)?;
                let ty = self.text(required_field(node, "type")?);
                let mut def = Definition::local(name, &self.with_dimensions(ty, node));
                def.visible = Some(Visibility {
                    from: node.start_byte(),
                    to: node.end_byte(),
                });
                out.push(def);
                self.collect_locals(required_field(node, "body")?, node.end_byte(), out)?;
            }
            JavaKind::WhileStatement | JavaKind::DoStatement => {
                self.collect_locals(required_field(node, "body")?, node.end_byte(), out)?;
            }
            JavaKind::IfStatement => {
                let consequence = required_field(node, "consequence")?;
                self.collect_locals(consequence, consequence.end_byte(), out)?;
                if let Some(alt) = node.child_by_field_name("alternative") {
                    self.collect_locals(alt, alt.end_byte(), out)?;
                }
            }
            JavaKind::TryStatement
            | JavaKind::TryWithResourcesStatement
            | JavaKind::SynchronizedStatement => {
                if let Some(resources) = node.child_by_field_name("resources") {
                    for resource in named_children(resources) {
                        if let (Some(ty), Some(name)) = (
                            resource.child_by_field_name("type"),
                            resource.child_by_field_name("name"),
                        ) {
                            let mut def = Definition::local(self.text(name), self.text(ty));
                            def.visible = Some(Visibility {
                                from: resource.start_byte(),
                                to: node.end_byte(),
                            });
                            out.push(def);
                        }
                    }
                }
                self.collect_locals(required_field(node, "body")?, node.end_byte(), out)?;
                for clause in named_children(node) {
                    if clause.kind() == "finally_clause" {
                        for body in named_children(clause) {
                            self.collect_locals(body, body.end_byte(), out)?;
                        }
                    }
                }
            }
            // A local in a statement group stays visible to the rest of the
            // switch block; an arrow rule scopes its own body.
            JavaKind::SwitchExpression => {
                let body = required_field(node, "body")?;
                for group in named_children(body) {
                    let until = match group.kind() {
                        "switch_block_statement_group" => body.end_byte(),
                        "switch_rule" => group.end_byte(),
                        _ => continue,
                    };
                    for stmt in named_children(group) {
                        self.collect_locals(stmt, until, out)?;
                    }
                }
            }
            // A switch used as a value still has statement bodies.
            JavaKind::ExpressionStatement
            | JavaKind::ReturnStatement
            | JavaKind::YieldStatement => {
                for child in named_children(node) {
                    let value = match JavaKind::of(child) {
                        JavaKind::AssignmentExpression => child.child_by_field_name("right"),
                        _ => Some(child),
                    };
                    if let Some(value) =
                        value.filter(|v| JavaKind::of(*v) == JavaKind::SwitchExpression)
                    {
                        self.collect_locals(value, until, out)?;
                    }
                }
            }
            JavaKind::LabeledStatement => {
                for stmt in named_children(node) {
                    self.collect_locals(stmt, until, out)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Go name of a constructor function for a class display name.
pub fn constructor_name(class_display: &str) -> String {
    if class_display.starts_with(|c: char| c.is_uppercase()) {
        format!("New{class_display}")
    } else {
        format!("new{}", export_name(class_display, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::TypeRef;
    use crate::syntax::parse_java;

    fn extract_source(source: &str) -> FileScope {
        let tree = parse_java(source).expect("parse failed");
        extract(tree.root_node(), source, &["Ignore".to_string()]).expect("extract failed")
    }

    #[test]
    fn test_package_and_imports() {
        let file = extract_source(
            "package com.example.app;\n\
             import java.util.List;\n\
             import com.example.model.*;\n\
             import static java.lang.Math.max;\n\
             public class App {}",
        );
        assert_eq!(file.package, "com.example.app");
        assert_eq!(file.imports.get("List").map(String::as_str), Some("java.util"));
        assert_eq!(file.wildcard_imports, vec!["com.example.model".to_string()]);
        assert_eq!(file.imports.len(), 1);
    }

    #[test]
    fn test_fields_and_methods() {
        let file = extract_source(
            "public class Test {\n\
               private int value;\n\
               public static String NAME = \"t\";\n\
               public Test(int val) { this.value = val; }\n\
               public int getValue() { return value; }\n\
               void reset() {}\n\
             }",
        );
        let class = file.base_class.unwrap();
        assert_eq!(class.class.name, "Test");

        let value = class.field("value").unwrap();
        assert_eq!(value.name, "value");
        assert_eq!(value.ty, TypeRef::Unresolved("int".into()));
        assert!(!value.is_static);

        let name = class.field("NAME").unwrap();
        assert!(name.is_static);
        assert_eq!(name.name, "NAME");

        let ctor = class.constructors().next().unwrap();
        assert_eq!(ctor.name, "NewTest");
        assert_eq!(ctor.original_type(), "Test");
        assert_eq!(ctor.parameters[0].original_name(), "val");
        assert_eq!(ctor.parameters[0].original_type(), "int");

        let get = class.methods_named("getValue").next().unwrap();
        assert_eq!(get.name, "GetValue");
        assert_eq!(get.original_type(), "int");

        let reset = class.methods_named("reset").next().unwrap();
        assert_eq!(reset.name, "reset");
        assert_eq!(reset.ty, TypeRef::None);
    }

    #[test]
    fn test_nested_class_flattening() {
        let file = extract_source(
            "public class Outer {\n\
               public static class Inner { int x; }\n\
               private class helper {}\n\
             }",
        );
        let outer = file.base_class.unwrap();
        assert_eq!(outer.subclasses[0].class.name, "OuterInner");
        assert_eq!(outer.subclasses[1].class.name, "Outerhelper");
        assert_eq!(outer.subclasses[0].constructors().next().unwrap().name, "NewOuterInner");
    }

    #[test]
    fn test_implicit_constructor() {
        let file = extract_source("class box { int size; }");
        let class = file.base_class.unwrap();
        let ctor = class.constructors().next().unwrap();
        assert!(ctor.is_implicit);
        assert_eq!(ctor.name, "newBox");
    }

    #[test]
    fn test_locals_are_registered_shallowly() {
        let file = extract_source(
            "class A {\n\
               void f(int n) {\n\
                 int total = 0;\n\
                 for (int i = 0; i < n; i++) { long sq = i * i; }\n\
                 for (String s : names) {}\n\
                 Runnable r = () -> { int hidden = 1; };\n\
                 if (n > 0) { double d = 1.0; } else { char c = 'x'; }\n\
               }\n\
             }",
        );
        let class = file.base_class.unwrap();
        let f = class.methods_named("f").next().unwrap();
        let names: Vec<&str> = f.children.iter().map(|c| c.original_name()).collect();
        assert_eq!(names, vec!["total", "i", "sq", "s", "r", "d", "c"]);
        let s = f.children.iter().find(|c| c.original_name() == "s").unwrap();
        let visible = s.visible.unwrap();
        assert_eq!(f.lookup_local("s", visible.from).unwrap().original_type(), "String");
        assert!(f.lookup_local("s", visible.to).is_none());
        assert!(f.lookup_local("s", visible.from - 1).is_none());
    }

    #[test]
    fn test_excluded_and_abstract() {
        let file = extract_source(
            "abstract class Shape {\n\
               abstract double area();\n\
               @Ignore void debug() {}\n\
             }",
        );
        let class = file.base_class.unwrap();
        assert!(class.methods_named("area").next().unwrap().is_abstract);
        assert!(class.methods_named("debug").next().unwrap().is_excluded);
    }

    #[test]
    fn test_generics_and_superclass() {
        let file = extract_source("public class Box<T> extends Base { T item; int[] counts; int grid[][]; }");
        let class = file.base_class.unwrap();
        assert_eq!(class.type_parameters, vec!["T".to_string()]);
        assert_eq!(class.superclass.as_deref(), Some("Base"));
        assert_eq!(class.field("counts").unwrap().original_type(), "int[]");
        assert_eq!(class.field("grid").unwrap().original_type(), "int[][]");
    }

    #[test]
    fn test_varargs_parameter() {
        let file = extract_source("class A { static int sum(int... xs) { return 0; } }");
        let class = file.base_class.unwrap();
        let sum = class.methods_named("sum").next().unwrap();
        assert_eq!(sum.parameters[0].original_type(), "int[]");
        assert!(sum.is_static);
    }

    #[test]
    fn test_enum_has_no_members() {
        let file = extract_source("public enum Color { RED, GREEN; void f() {} }");
        let class = file.base_class.unwrap();
        assert_eq!(class.kind, ClassKind::Enum);
        assert!(class.methods.is_empty());
    }
}
