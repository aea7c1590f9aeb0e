//! Name and type queries against the resolved scope tree.
//!
//! Lowering needs to know what a Java name refers to (local, field of some
//! class up the hierarchy, a class) and roughly what type an expression
//! has. Both are answered here by name lookups; classes never hold
//! references to each other.

use super::Lowerer;
use super::context::Context;
use crate::ir::GoType;
use crate::resolve::{ClassEntry, TypeEnv};
use crate::scope::{ClassKind, ClassScope, Definition};
use crate::syntax::{JavaKind, named_children};
use tree_sitter::Node;

/// Inheritance chains longer than this are treated as cyclic.
const MAX_HIERARCHY_DEPTH: usize = 32;

/// A class together with where it is declared.
#[derive(Debug, Clone, Copy)]
pub struct ClassRef<'a> {
    pub package: &'a str,
    pub file_id: &'a str,
    pub scope: &'a ClassScope,
}

/// What a bare Java identifier names.
#[derive(Debug, Clone)]
pub enum Variable<'a> {
    Local { name: String, ty: Option<GoType> },
    Field { owner: ClassRef<'a>, def: &'a Definition },
}

impl<'a> Variable<'a> {
    pub fn ty(&self) -> Option<GoType> {
        match self {
            Self::Local { ty, .. } => ty.clone(),
            Self::Field { def, .. } => def.ty.go_type(),
        }
    }
}

/// Arguments of a call or object creation, comments skipped.
pub fn argument_nodes(node: Node) -> Vec<Node> {
    node.child_by_field_name("arguments")
        .map(|args| {
            named_children(args)
                .into_iter()
                .filter(|a| JavaKind::of(*a) != JavaKind::Comment)
                .collect()
        })
        .unwrap_or_default()
}

/// Choose among same-named methods: matching arity first, then the most
/// parameters whose type equals the argument's.
pub fn pick_overload<'d>(
    candidates: &[&'d Definition],
    arg_types: &[Option<GoType>],
) -> Option<&'d Definition> {
    let mut best: Option<(&'d Definition, usize)> = None;
    for candidate in candidates.iter().filter(|d| d.parameters.len() == arg_types.len()) {
        let score = candidate
            .parameters
            .iter()
            .zip(arg_types)
            .filter(|(param, arg)| arg.is_some() && param.ty.go_type() == **arg)
            .count();
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((*candidate, score));
        }
    }
    best.map(|(d, _)| d).or_else(|| candidates.first().copied())
}

impl<'a> Lowerer<'a> {
    pub(super) fn current_class(&self, ctx: &Context<'a>) -> ClassRef<'a> {
        ClassRef {
            package: &self.file.package,
            file_id: self.file_id,
            scope: ctx.class,
        }
    }

    fn enclosing_class(&self, scope: &'a ClassScope) -> ClassRef<'a> {
        ClassRef {
            package: &self.file.package,
            file_id: self.file_id,
            scope,
        }
    }

    fn class_of_entry(&self, entry: &'a ClassEntry) -> Option<ClassRef<'a>> {
        let scope = self
            .global
            .packages
            .get(&entry.package)?
            .files
            .get(&entry.file_id)?
            .class_by_name(&entry.name)?;
        Some(ClassRef {
            package: &entry.package,
            file_id: &entry.file_id,
            scope,
        })
    }

    /// The class behind a (pointer to a) named Go type, seen from `package`.
    pub(super) fn class_of_type(&self, ty: &GoType, package: &str) -> Option<ClassRef<'a>> {
        let index = self.index;
        let (qualifier, name) = ty.declared_name()?;
        let entry = match qualifier {
            Some(q) => index.by_go_name(index.java_package(q)?, name)?,
            None => index.by_go_name(package, name)?,
        };
        self.class_of_entry(entry)
    }

    /// A class named in source, e.g. the `Util` of `Util.helper()`.
    pub(super) fn class_named(&self, name: &str, ctx: &Context<'a>) -> Option<ClassRef<'a>> {
        let entry = ctx.type_env(self.index).class_entry(name)?;
        self.class_of_entry(entry)
    }

    /// Type environment of the file a class is declared in.
    fn env_of(&self, class: ClassRef<'a>) -> Option<TypeEnv<'a>> {
        let file = self.global.packages.get(class.package)?.files.get(class.file_id)?;
        Some(TypeEnv {
            index: self.index,
            file_id: class.file_id,
            package: class.package,
            imports: &file.imports,
            wildcard_imports: &file.wildcard_imports,
            type_params: class.scope.type_parameters.clone(),
        })
    }

    /// The Go type a class embeds for its `extends` clause.
    pub(super) fn superclass_type(&self, class: ClassRef<'a>) -> Option<GoType> {
        let spelling = class.scope.superclass.as_deref()?;
        let ty = self.env_of(class)?.resolve(spelling).ty;
        Some(match ty {
            GoType::Pointer(inner) => *inner,
            other => other,
        })
    }

    pub(super) fn superclass(&self, class: ClassRef<'a>) -> Option<ClassRef<'a>> {
        let ty = self.superclass_type(class)?;
        self.class_of_type(&ty, class.package)
    }

    /// The class followed by its ancestors.
    fn hierarchy(&self, class: ClassRef<'a>) -> Vec<ClassRef<'a>> {
        let mut chain = vec![class];
        while chain.len() < MAX_HIERARCHY_DEPTH {
            let Some(parent) = chain.last().and_then(|c| self.superclass(*c)) else {
                break;
            };
            if chain.iter().any(|c| std::ptr::eq(c.scope, parent.scope)) {
                break;
            }
            chain.push(parent);
        }
        chain
    }

    pub(super) fn field_of(
        &self,
        class: ClassRef<'a>,
        name: &str,
    ) -> Option<(ClassRef<'a>, &'a Definition)> {
        self.hierarchy(class)
            .into_iter()
            .find_map(|c| c.scope.field(name).map(|f| (c, f)))
    }

    /// Methods named `name` on the nearest class of the hierarchy declaring any.
    fn methods_of(
        &self,
        class: ClassRef<'a>,
        name: &str,
    ) -> Option<(ClassRef<'a>, Vec<&'a Definition>)> {
        self.hierarchy(class).into_iter().find_map(|c| {
            let scope: &'a ClassScope = c.scope;
            let methods: Vec<&'a Definition> = scope
                .methods
                .iter()
                .filter(|m| !m.is_constructor && m.original_name() == name)
                .collect();
            (!methods.is_empty()).then_some((c, methods))
        })
    }

    /// The method a call with these arguments resolves to.
    pub(super) fn user_method(
        &self,
        class: ClassRef<'a>,
        name: &str,
        args: &[Node],
        ctx: &Context<'a>,
    ) -> Option<(ClassRef<'a>, &'a Definition)> {
        let (owner, candidates) = self.methods_of(class, name)?;
        let arg_types: Vec<Option<GoType>> = args.iter().map(|a| self.type_of(*a, ctx)).collect();
        pick_overload(&candidates, &arg_types).map(|def| (owner, def))
    }

    /// Same lookup for a bare call, also trying static methods of the
    /// enclosing classes.
    pub(super) fn bare_method(
        &self,
        name: &str,
        args: &[Node],
        ctx: &Context<'a>,
    ) -> Option<(ClassRef<'a>, &'a Definition)> {
        self.user_method(self.current_class(ctx), name, args, ctx)
            .or_else(|| {
                ctx.enclosing.iter().rev().find_map(|outer| {
                    self.user_method(self.enclosing_class(*outer), name, args, ctx)
                        .filter(|(_, def)| def.is_static)
                })
            })
    }

    /// Resolve a bare identifier: locals first, then fields up the class
    /// hierarchy, then static fields of enclosing classes. `at` is the byte
    /// offset of the use, so a local declared later in the body is skipped.
    pub(super) fn variable(
        &self,
        name: &str,
        at: usize,
        ctx: &Context<'a>,
    ) -> Option<Variable<'a>> {
        if let Some((local, ty)) = ctx.local(name, at) {
            return Some(Variable::Local { name: local, ty });
        }
        self.field_of(self.current_class(ctx), name)
            .or_else(|| {
                ctx.enclosing.iter().rev().find_map(|outer| {
                    self.field_of(self.enclosing_class(*outer), name)
                        .filter(|(_, def)| def.is_static)
                })
            })
            .map(|(owner, def)| Variable::Field { owner, def })
    }

    pub(super) fn is_interface(&self, ty: &GoType, package: &str) -> bool {
        self.class_of_type(ty, package)
            .is_some_and(|c| c.scope.kind == ClassKind::Interface)
    }

    /// Resolve a type written in a body.
    pub(super) fn lookup_type(&self, spelling: &str, ctx: &Context<'a>) -> GoType {
        ctx.type_env(self.index).resolve(spelling).ty
    }

    /// Best-effort static type of a Java expression. `None` when unknown or
    /// `void`.
    pub(super) fn type_of(&self, node: Node, ctx: &Context<'a>) -> Option<GoType> {
        let text = self.text(node);
        match JavaKind::of(node) {
            JavaKind::StringLiteral | JavaKind::TextBlock => Some(GoType::named("string")),
            JavaKind::IntegerLiteral if text.ends_with(['l', 'L']) => Some(GoType::named("int64")),
            JavaKind::IntegerLiteral => Some(GoType::named("int")),
            JavaKind::FloatLiteral if text.ends_with(['f', 'F']) => Some(GoType::named("float32")),
            JavaKind::FloatLiteral => Some(GoType::named("float64")),
            JavaKind::CharacterLiteral => Some(GoType::named("rune")),
            JavaKind::True | JavaKind::False | JavaKind::InstanceofExpression => {
                Some(GoType::named("bool"))
            }
            JavaKind::This => Some(GoType::pointer(GoType::named(ctx.class.class.name.clone()))),
            JavaKind::Identifier => self
                .variable(text, node.start_byte(), ctx)
                .and_then(|v| v.ty()),
            JavaKind::ParenthesizedExpression => named_children(node)
                .first()
                .and_then(|inner| self.type_of(*inner, ctx)),
            JavaKind::CastExpression | JavaKind::ObjectCreationExpression => node
                .child_by_field_name("type")
                .map(|ty| self.lookup_type(self.text(ty), ctx)),
            JavaKind::ArrayCreationExpression => {
                let elem = self.lookup_type(self.text(node.child_by_field_name("type")?), ctx);
                let depth = array_depth(node, self.source);
                Some((0..depth).fold(elem, |ty, _| GoType::slice(ty)))
            }
            JavaKind::ArrayAccess => match self.type_of(node.child_by_field_name("array")?, ctx)? {
                GoType::Slice(elem) => Some(*elem),
                _ => None,
            },
            JavaKind::FieldAccess => self.field_access_type(node, ctx),
            JavaKind::MethodInvocation => self.invocation_type(node, ctx),
            JavaKind::BinaryExpression => {
                let op = self.text(node.child_by_field_name("operator")?);
                let left = self.type_of(node.child_by_field_name("left")?, ctx);
                match op {
                    "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||" => {
                        Some(GoType::named("bool"))
                    }
                    "+" => {
                        let right = self.type_of(node.child_by_field_name("right")?, ctx);
                        if left.as_ref().is_some_and(GoType::is_string)
                            || right.as_ref().is_some_and(GoType::is_string)
                        {
                            Some(GoType::named("string"))
                        } else {
                            left.or(right)
                        }
                    }
                    _ => left,
                }
            }
            JavaKind::UnaryExpression | JavaKind::UpdateExpression => {
                let operand = node
                    .child_by_field_name("operand")
                    .or_else(|| named_children(node).first().copied())?;
                self.type_of(operand, ctx)
            }
            JavaKind::AssignmentExpression => self.type_of(node.child_by_field_name("left")?, ctx),
            JavaKind::TernaryExpression => self
                .type_of(node.child_by_field_name("consequence")?, ctx)
                .or_else(|| self.type_of(node.child_by_field_name("alternative")?, ctx)),
            _ => None,
        }
    }

    fn field_access_type(&self, node: Node, ctx: &Context<'a>) -> Option<GoType> {
        let object = node.child_by_field_name("object")?;
        let field = self.text(node.child_by_field_name("field")?);
        if JavaKind::of(object) == JavaKind::Identifier
            && self.variable(self.text(object), object.start_byte(), ctx).is_none()
        {
            let class = self.class_named(self.text(object), ctx)?;
            return self.field_of(class, field).and_then(|(_, def)| def.ty.go_type());
        }
        let object_ty = self.type_of(object, ctx)?;
        if field == "length" && matches!(object_ty, GoType::Slice(_)) {
            return Some(GoType::named("int"));
        }
        let class = self.class_of_type(&object_ty, ctx.package())?;
        self.field_of(class, field).and_then(|(_, def)| def.ty.go_type())
    }

    fn invocation_type(&self, node: Node, ctx: &Context<'a>) -> Option<GoType> {
        let name = self.text(node.child_by_field_name("name")?);
        let args = argument_nodes(node);
        let Some(object) = node.child_by_field_name("object") else {
            return self
                .bare_method(name, &args, ctx)
                .and_then(|(_, def)| def.ty.go_type());
        };

        match name {
            "equals" | "isEmpty" | "contains" | "containsKey" | "startsWith" | "endsWith" => {
                return Some(GoType::named("bool"));
            }
            "toString" => return Some(GoType::named("string")),
            "hashCode" | "size" => return Some(GoType::named("int")),
            _ => {}
        }

        let object_text = self.text(object);
        if JavaKind::of(object) == JavaKind::Identifier
            && self.variable(object_text, object.start_byte(), ctx).is_none()
        {
            match (object_text, name) {
                ("String", "format" | "valueOf" | "join") => return Some(GoType::named("string")),
                ("Math", "max" | "min" | "abs") => {
                    return args.first().and_then(|a| self.type_of(*a, ctx));
                }
                ("Math", _) => return Some(GoType::named("float64")),
                _ => {}
            }
            let class = self.class_named(object_text, ctx)?;
            return self
                .user_method(class, name, &args, ctx)
                .and_then(|(_, def)| def.ty.go_type());
        }

        let object_ty = match JavaKind::of(object) {
            JavaKind::Super => {
                let parent = self.superclass(self.current_class(ctx))?;
                return self
                    .user_method(parent, name, &args, ctx)
                    .and_then(|(_, def)| def.ty.go_type());
            }
            _ => self.type_of(object, ctx)?,
        };
        match (&object_ty, name) {
            (GoType::Slice(elem), "get" | "remove") => Some(elem.as_ref().clone()),
            (GoType::Map(_, value), "get" | "getOrDefault" | "remove") => {
                Some(value.as_ref().clone())
            }
            (ty, "length" | "indexOf" | "compareTo") if ty.is_string() => {
                Some(GoType::named("int"))
            }
            (ty, "charAt") if ty.is_string() => Some(GoType::named("rune")),
            (ty, _) if ty.is_string() => Some(GoType::named("string")),
            _ => {
                let class = self.class_of_type(&object_ty, ctx.package())?;
                self.user_method(class, name, &args, ctx)
                    .and_then(|(_, def)| def.ty.go_type())
            }
        }
    }
}

/// Number of `[]` levels an array creation produces.
pub fn array_depth(node: Node, source: &str) -> usize {
    let mut cursor = node.walk();
    node.children_by_field_name("dimensions", &mut cursor)
        .map(|dims| match dims.kind() {
            "dimensions" => crate::syntax::text(dims, source).matches('[').count(),
            _ => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(params: &[&str]) -> Definition {
        let mut def = Definition::new("f", "", true);
        for (i, ty) in params.iter().enumerate() {
            let mut param = Definition::local(&format!("p{i}"), ty);
            param.ty = crate::scope::TypeRef::Resolved(GoType::named(*ty));
            def.parameters.push(param);
        }
        def
    }

    #[test]
    fn test_pick_overload_by_arity_then_type() {
        let one_int = method(&["int"]);
        let one_string = method(&["string"]);
        let two = method(&["int", "int"]);
        let candidates = [&one_int, &one_string, &two];

        let picked = pick_overload(&candidates, &[Some(GoType::named("string"))]).unwrap();
        assert!(std::ptr::eq(picked, &one_string));

        let picked = pick_overload(&candidates, &[None, None]).unwrap();
        assert!(std::ptr::eq(picked, &two));

        // Unknown argument type: first of the matching arity.
        let picked = pick_overload(&candidates, &[None]).unwrap();
        assert!(std::ptr::eq(picked, &one_int));
    }

    #[test]
    fn test_pick_overload_falls_back_to_first() {
        let one = method(&["int"]);
        let candidates = [&one];
        let picked = pick_overload(&candidates, &[]).unwrap();
        assert!(std::ptr::eq(picked, &one));
        assert!(pick_overload(&[], &[]).is_none());
    }
}
