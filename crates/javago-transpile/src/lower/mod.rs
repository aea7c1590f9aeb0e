//! Lowering engine: Java syntax tree plus resolved scope tree to Go IR.
//!
//! Lowering is a structural mapping keyed on [`JavaKind`]. It walks the
//! tree of one file and pairs every declaration node with the
//! [`Definition`] the extractor built for it, so names and types always
//! come from the resolved scope tree and never from the source text.
//!
//! A construct without a lowering rule abandons the enclosing declaration
//! (struct, function or var group) with a diagnostic. Everything else in
//! the file is still emitted.

mod context;
mod expr;
mod lookup;
mod stmt;

pub use context::{Binding, Context};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::Error;
use crate::ir::{
    Decl, Expr, FuncDecl, GoFile, GoType, InterfaceDecl, MethodSpec, Param, Stmt, StructDecl,
    VarSpec,
};
use crate::resolve::{DEFAULT_TERNARY_HELPER, TypeIndex, go_package_name};
use crate::scope::{ClassKind, Definition, FileScope, GlobalScope};
use crate::syntax::{JavaKind, line, named_children, required_field, text};
use lookup::ClassRef;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};
use tree_sitter::Node;

/// Knobs of the lowering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerOptions {
    /// Name of the injected conditional helper.
    pub ternary_helper: String,
    /// Go module path that prefixes cross-package imports.
    pub module: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            ternary_helper: DEFAULT_TERNARY_HELPER.to_string(),
            module: String::new(),
        }
    }
}

/// Result of lowering one file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredFile {
    pub go: GoFile,
    pub diagnostics: Vec<Diagnostic>,
    /// The file calls the conditional helper.
    pub uses_ternary: bool,
    /// The file declares `func main()`.
    pub has_main: bool,
}

/// Lower one parsed and resolved file.
pub fn lower_file<'a>(
    root: Node<'a>,
    source: &'a str,
    file_id: &'a str,
    global: &'a GlobalScope,
    index: &'a TypeIndex,
    options: &'a LowerOptions,
) -> Result<LoweredFile, Error> {
    let file = global
        .file(file_id)
        .ok_or_else(|| Error::assertion(root, format!("`{file_id}` is not in the scope table")))?;
    debug!(file = file_id, "lowering");

    let mut lowerer = Lowerer {
        source,
        file_id,
        file,
        global,
        index,
        options,
        imports: BTreeSet::new(),
        diagnostics: Vec::new(),
        uses_ternary: false,
        has_main: false,
        yields: Vec::new(),
    };
    let decls = lowerer.lower_root(root)?;
    Ok(LoweredFile {
        go: GoFile {
            package: go_package_name(&file.package).to_string(),
            imports: lowerer.imports.into_iter().collect(),
            decls,
        },
        diagnostics: lowerer.diagnostics,
        uses_ternary: lowerer.uses_ternary,
        has_main: lowerer.has_main,
    })
}

/// `func ternary[T any](cond bool, a T, b T) T`. Both branches are
/// evaluated before the call.
pub fn ternary_helper(name: &str) -> Decl {
    let t = GoType::named("T");
    Decl::Func(FuncDecl {
        name: name.to_string(),
        type_params: vec!["T".into()],
        receiver: None,
        params: vec![
            Param::new("cond", GoType::named("bool")),
            Param::new("a", t.clone()),
            Param::new("b", t.clone()),
        ],
        result: Some(t),
        body: vec![
            Stmt::if_stmt(
                Expr::ident("cond"),
                vec![Stmt::return_stmt(Some(Expr::ident("a")))],
                None,
            ),
            Stmt::return_stmt(Some(Expr::ident("b"))),
        ],
    })
}

pub struct Lowerer<'a> {
    source: &'a str,
    file_id: &'a str,
    file: &'a FileScope,
    global: &'a GlobalScope,
    index: &'a TypeIndex,
    options: &'a LowerOptions,
    imports: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
    uses_ternary: bool,
    has_main: bool,
    /// Result types of the switch values being lowered, innermost last.
    yields: Vec<GoType>,
}

impl<'a> Lowerer<'a> {
    fn text(&self, node: Node) -> &'a str {
        text(node, self.source)
    }

    fn use_import(&mut self, path: &str) {
        self.imports.insert(path.to_string());
    }

    /// Go import path of a Java package.
    fn import_path(&self, java_package: &str) -> String {
        let path = java_package.replace('.', "/");
        match self.options.module.trim_end_matches('/') {
            "" => path,
            module => format!("{module}/{path}"),
        }
    }

    /// Import whatever packages a type mentions.
    fn use_type(&mut self, ty: &GoType) {
        match ty {
            GoType::Named {
                package: Some(qualifier),
                ..
            } => {
                if let Some(java) = self.index.java_package(qualifier) {
                    let path = self.import_path(java);
                    self.imports.insert(path);
                }
            }
            GoType::Named { .. } | GoType::Any => {}
            GoType::Pointer(inner) | GoType::Slice(inner) => self.use_type(inner),
            GoType::Map(key, value) => {
                self.use_type(key);
                self.use_type(value);
            }
        }
    }

    /// A package-level function or variable of `owner`, qualified when it
    /// lives in another package.
    fn package_member(&mut self, owner: ClassRef<'a>, name: &str) -> Expr {
        if owner.package == self.file.package {
            return Expr::ident(name);
        }
        let path = self.import_path(owner.package);
        self.imports.insert(path);
        Expr::selector(Expr::ident(go_package_name(owner.package)), name)
    }

    /// A type written inside a body (`new T()`, casts), imported as needed.
    fn body_type(&mut self, node: Node, ctx: &Context<'a>) -> GoType {
        let ty = self.lookup_type(self.text(node), ctx);
        self.use_type(&ty);
        ty
    }

    fn drop_construct(&mut self, what: impl fmt::Display) {
        debug!(file = self.file_id, "dropped {what}");
        self.diagnostics.push(Diagnostic::dropped(self.file_id, what));
    }

    /// Turn an unhandled construct into a diagnostic. Anything else stops
    /// the file.
    fn recover<T>(&mut self, what: &str, result: Result<T, Error>) -> Result<Option<T>, Error> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                warn!(file = self.file_id, "{err}; skipping {what}");
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnhandledNodeKind,
                    self.file_id,
                    format!("{err}; skipped {what}"),
                ));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn params(&mut self, def: &Definition) -> Vec<Param> {
        def.parameters
            .iter()
            .map(|p| {
                let ty = p.ty.go_type().unwrap_or(GoType::Any);
                self.use_type(&ty);
                Param::new(p.name.clone(), ty)
            })
            .collect()
    }

    fn result(&mut self, def: &Definition) -> Option<GoType> {
        let ty = def.ty.go_type();
        if let Some(ty) = &ty {
            self.use_type(ty);
        }
        ty
    }

    fn lower_root(&mut self, root: Node<'a>) -> Result<Vec<Decl>, Error> {
        if JavaKind::of(root) != JavaKind::Program {
            return Err(Error::assertion(root, "root node is not a program"));
        }
        let mut top_level = self.file.top_level();
        let mut decls = Vec::new();
        for child in named_children(root) {
            match JavaKind::of(child) {
                JavaKind::ClassDeclaration
                | JavaKind::InterfaceDeclaration
                | JavaKind::EnumDeclaration => {
                    let class = top_level
                        .next()
                        .ok_or_else(|| Error::assertion(child, "type missing from scope table"))?;
                    let ctx = Context::new(self.file_id, self.file, class);
                    decls.extend(self.type_declaration(child, &ctx)?);
                }
                JavaKind::RecordDeclaration | JavaKind::AnnotationTypeDeclaration => {
                    let name = self.text(child).split('{').next().unwrap_or_default().trim();
                    self.recover::<()>(name, Err(Error::unhandled(child)))?;
                }
                _ => {}
            }
        }
        Ok(decls)
    }

    fn type_declaration(&mut self, node: Node<'a>, ctx: &Context<'a>) -> Result<Vec<Decl>, Error> {
        let scope = ctx.class;
        let original = scope.class.original_name();
        if scope.class.is_excluded {
            self.drop_construct(format_args!("excluded type `{original}`"));
            return Ok(Vec::new());
        }
        match scope.kind {
            ClassKind::Enum => {
                self.drop_construct(format_args!("enum `{original}`"));
                Ok(Vec::new())
            }
            ClassKind::Interface => self.interface(node, ctx),
            ClassKind::Class => self.class(node, ctx),
        }
    }

    /// Nested types of a class or interface body, paired in order with the
    /// extracted subclasses.
    fn nested_types(&mut self, members: &[Node<'a>], ctx: &Context<'a>) -> Result<Vec<Decl>, Error> {
        let mut subclasses = ctx.class.subclasses.iter();
        let mut decls = Vec::new();
        for member in members {
            match JavaKind::of(*member) {
                JavaKind::ClassDeclaration
                | JavaKind::InterfaceDeclaration
                | JavaKind::EnumDeclaration => {
                    let sub = subclasses
                        .next()
                        .ok_or_else(|| Error::assertion(*member, "nested type missing from scope table"))?;
                    decls.extend(self.type_declaration(*member, &ctx.nested(sub))?);
                }
                JavaKind::RecordDeclaration | JavaKind::AnnotationTypeDeclaration => {
                    self.recover::<()>("nested type", Err(Error::unhandled(*member)))?;
                }
                _ => {}
            }
        }
        Ok(decls)
    }

    /// Static fields become one package-level `var` group. Instance field
    /// initializers are returned for the constructors to run.
    fn fields(
        &mut self,
        members: &[Node<'a>],
        ctx: &Context<'a>,
    ) -> Result<(Option<Decl>, Vec<(&'a Definition, Node<'a>)>), Error> {
        let scope = ctx.class;
        let mut defs = scope.fields.iter();
        let mut statics = Vec::new();
        let mut initializers = Vec::new();
        let mut failed = None;

        for member in members {
            if !matches!(
                JavaKind::of(*member),
                JavaKind::FieldDeclaration | JavaKind::ConstantDeclaration
            ) {
                continue;
            }
            let mut cursor = member.walk();
            let declarators: Vec<Node> = member
                .children_by_field_name("declarator", &mut cursor)
                .collect();
            for declarator in declarators {
                let def = defs
                    .next()
                    .ok_or_else(|| Error::assertion(*member, "field missing from scope table"))?;
                if def.is_excluded {
                    self.drop_construct(format_args!(
                        "excluded field `{}.{}`",
                        scope.class.original_name(),
                        def.original_name()
                    ));
                    continue;
                }
                let value = declarator.child_by_field_name("value");
                if !def.is_static {
                    if let Some(value) = value {
                        initializers.push((def, value));
                    }
                    continue;
                }
                let ty = self.result(def);
                let value = match value {
                    Some(value) => match self.expr(value, &ctx.in_static(), ty.as_ref()) {
                        Ok(value) => Some(value),
                        Err(err) => {
                            failed = Some(err);
                            continue;
                        }
                    },
                    None => None,
                };
                statics.push(VarSpec {
                    name: def.name.clone(),
                    ty,
                    value,
                });
            }
        }

        let group = match failed {
            Some(err) => {
                let what = format!("static fields of `{}`", scope.class.original_name());
                self.recover::<()>(&what, Err(err))?;
                None
            }
            None if statics.is_empty() => None,
            None => Some(Decl::Var(statics)),
        };
        Ok((group, initializers))
    }

    fn class(&mut self, node: Node<'a>, ctx: &Context<'a>) -> Result<Vec<Decl>, Error> {
        let scope = ctx.class;
        let me = self.current_class(ctx);
        let members = named_children(required_field(node, "body")?);

        let mut embeds = Vec::new();
        if let Some(spelling) = scope.superclass.as_deref() {
            match (self.superclass(me), self.superclass_type(me)) {
                (Some(_), Some(parent)) => {
                    self.use_type(&parent);
                    embeds.push(parent);
                }
                _ => self.drop_construct(format_args!(
                    "superclass `{spelling}` of `{}`",
                    scope.class.original_name()
                )),
            }
        }
        let mut fields = Vec::new();
        for def in scope.fields.iter().filter(|f| !f.is_static && !f.is_excluded) {
            let ty = def.ty.go_type().unwrap_or(GoType::Any);
            self.use_type(&ty);
            fields.push(Param::new(def.name.clone(), ty));
        }

        let mut decls = vec![Decl::Struct(StructDecl {
            name: scope.class.name.clone(),
            embeds,
            fields,
        })];
        let (statics, initializers) = self.fields(&members, ctx)?;
        decls.extend(statics);

        let mut methods = scope.methods.iter();
        for member in &members {
            let kind = JavaKind::of(*member);
            match kind {
                JavaKind::MethodDeclaration | JavaKind::ConstructorDeclaration => {
                    let def = methods
                        .next()
                        .ok_or_else(|| Error::assertion(*member, "method missing from scope table"))?;
                    let what = format!("`{}.{}`", scope.class.original_name(), def.original_name());
                    if def.is_excluded {
                        self.drop_construct(format_args!("excluded method {what}"));
                        continue;
                    }
                    let lowered = if kind == JavaKind::ConstructorDeclaration {
                        self.constructor(Some(*member), def, ctx, &initializers)
                    } else {
                        self.method(*member, def, ctx)
                    };
                    decls.extend(self.recover(&what, lowered)?.flatten());
                }
                JavaKind::StaticInitializer => {
                    let body = named_children(*member)
                        .into_iter()
                        .find(|c| JavaKind::of(*c) == JavaKind::Block)
                        .ok_or_else(|| Error::assertion(*member, "static initializer without a body"))?;
                    let lowered = self.block(body, &ctx.in_static()).map(|body| {
                        Decl::Func(FuncDecl {
                            name: "init".into(),
                            type_params: Vec::new(),
                            receiver: None,
                            params: Vec::new(),
                            result: None,
                            body,
                        })
                    });
                    let what = format!("static initializer of `{}`", scope.class.original_name());
                    decls.extend(self.recover(&what, lowered)?);
                }
                JavaKind::Block => {
                    let what = format!("instance initializer of `{}`", scope.class.original_name());
                    self.recover::<()>(&what, Err(Error::unhandled(*member)))?;
                }
                _ => {}
            }
        }
        for def in methods.filter(|m| m.is_implicit) {
            let what = format!("implicit constructor of `{}`", scope.class.original_name());
            let lowered = self.constructor(None, def, ctx, &initializers);
            decls.extend(self.recover(&what, lowered)?.flatten());
        }

        decls.extend(self.nested_types(&members, ctx)?);
        Ok(decls)
    }

    fn interface(&mut self, node: Node<'a>, ctx: &Context<'a>) -> Result<Vec<Decl>, Error> {
        let scope = ctx.class;
        let members = named_children(required_field(node, "body")?);
        let mut methods = Vec::new();
        for def in &scope.methods {
            let what = format!("`{}.{}`", scope.class.original_name(), def.original_name());
            if def.is_excluded {
                self.drop_construct(format_args!("excluded method {what}"));
                continue;
            }
            if def.is_static {
                self.drop_construct(format_args!("static interface method {what}"));
                continue;
            }
            if !def.is_abstract {
                self.drop_construct(format_args!("default method body of {what}"));
            }
            methods.push(MethodSpec {
                name: def.name.clone(),
                params: self.params(def),
                result: self.result(def),
            });
        }

        let mut decls = vec![Decl::Interface(InterfaceDecl {
            name: scope.class.name.clone(),
            methods,
        })];
        let (constants, _) = self.fields(&members, ctx)?;
        decls.extend(constants);
        decls.extend(self.nested_types(&members, ctx)?);
        Ok(decls)
    }

    fn method(
        &mut self,
        node: Node,
        def: &'a Definition,
        ctx: &Context<'a>,
    ) -> Result<Option<Decl>, Error> {
        let class = &ctx.class.class;
        if def.is_abstract {
            self.drop_construct(format_args!(
                "abstract method `{}.{}`",
                class.original_name(),
                def.original_name()
            ));
            return Ok(None);
        }
        let inner = ctx.in_method(def);
        let body_node = required_field(node, "body")?;

        if def.is_main_shaped() && def.name == "main" {
            self.has_main = true;
            self.use_import("os");
            let args = def.parameters.first().map_or("args", |p| p.name.as_str());
            let mut body = vec![Stmt::define(
                args,
                Expr::SliceFrom {
                    expr: Box::new(Expr::selector(Expr::ident("os"), "Args")),
                    low: Box::new(Expr::int("1")),
                },
            )];
            let original = def.parameters.first().map_or("args", |p| p.original_name());
            if !mentions(body_node, original, self.source) {
                body.push(Stmt::assign(Expr::ident("_"), Expr::ident(args)));
            }
            body.extend(self.block(body_node, &inner)?);
            return Ok(Some(Decl::Func(FuncDecl {
                name: "main".into(),
                type_params: Vec::new(),
                receiver: None,
                params: Vec::new(),
                result: None,
                body,
            })));
        }

        let receiver = (!def.is_static)
            .then(|| Param::new("this", GoType::pointer(GoType::named(class.name.clone()))));
        let params = self.params(def);
        let result = self.result(def);
        let body = self.block(body_node, &inner)?;
        Ok(Some(Decl::Func(FuncDecl {
            name: def.name.clone(),
            type_params: Vec::new(),
            receiver,
            params,
            result,
            body,
        })))
    }

    /// `this := &T{}`, parent and field initialization, the body, then
    /// `return this`. A leading `this(...)` call replaces allocation and
    /// field initialization.
    fn constructor(
        &mut self,
        node: Option<Node>,
        def: &'a Definition,
        ctx: &Context<'a>,
        initializers: &[(&'a Definition, Node)],
    ) -> Result<Option<Decl>, Error> {
        let scope = ctx.class;
        let me = self.current_class(ctx);
        let inner = ctx.in_method(def);
        let class_ty = GoType::named(scope.class.name.clone());

        let statements = match node {
            Some(node) => named_children(required_field(node, "body")?),
            None => Vec::new(),
        };
        let (explicit, rest) = match statements.split_first() {
            Some((first, rest))
                if JavaKind::of(*first) == JavaKind::ExplicitConstructorInvocation =>
            {
                (Some(*first), rest)
            }
            _ => (None, statements.as_slice()),
        };
        let delegates = explicit.is_some_and(|call| {
            call.child_by_field_name("constructor")
                .is_some_and(|c| JavaKind::of(c) == JavaKind::This)
        });

        let mut body = Vec::new();
        if let (Some(call), true) = (explicit, delegates) {
            let ctors: Vec<&'a Definition> = scope.constructors().collect();
            let func = self.chained_constructor(call, me, &ctors, &inner)?;
            body.push(Stmt::define("this", func));
        } else {
            body.push(Stmt::define(
                "this",
                Expr::address_of(Expr::composite(class_ty.clone(), Vec::new())),
            ));
            if let (Some(parent), Some(parent_ty)) = (self.superclass(me), self.superclass_type(me)) {
                let ctors: Vec<&'a Definition> = parent.scope.constructors().collect();
                let init = match explicit {
                    Some(call) => Some(self.chained_constructor(call, parent, &ctors, &inner)?),
                    None => ctors
                        .iter()
                        .find(|c| c.parameters.is_empty())
                        .map(|c| Expr::call(self.package_member(parent, &c.name), Vec::new())),
                };
                if let (Some(init), Some((_, embedded))) = (init, parent_ty.declared_name()) {
                    body.push(Stmt::assign(
                        Expr::selector(Expr::ident("this"), embedded),
                        Expr::deref(init),
                    ));
                }
            } else if let Some(call) = explicit {
                self.drop_construct(format_args!(
                    "call to a parent constructor at line {}",
                    line(call)
                ));
            }
            let field_ctx = Context {
                method: None,
                in_constructor: true,
                ..ctx.clone()
            };
            for (field, value) in initializers {
                let expected = field.ty.go_type();
                let value = self.expr(*value, &field_ctx, expected.as_ref())?;
                body.push(Stmt::assign(
                    Expr::selector(Expr::ident("this"), field.name.clone()),
                    value,
                ));
            }
        }

        for stmt in rest {
            body.extend(self.stmt(*stmt, &inner)?);
        }
        if !body.last().is_some_and(Stmt::is_terminating) {
            body.push(Stmt::return_stmt(Some(Expr::ident("this"))));
        }

        Ok(Some(Decl::Func(FuncDecl {
            name: def.name.clone(),
            type_params: Vec::new(),
            receiver: None,
            params: self.params(def),
            result: Some(GoType::pointer(class_ty)),
            body,
        })))
    }

    /// The call behind `this(...)` or `super(...)`.
    fn chained_constructor(
        &mut self,
        call: Node,
        owner: ClassRef<'a>,
        ctors: &[&'a Definition],
        ctx: &Context<'a>,
    ) -> Result<Expr, Error> {
        let arg_nodes = lookup::argument_nodes(call);
        let arg_types: Vec<Option<GoType>> =
            arg_nodes.iter().map(|a| self.type_of(*a, ctx)).collect();
        let ctor = lookup::pick_overload(ctors, &arg_types)
            .ok_or_else(|| Error::unhandled_as(call, "constructor call without a target"))?;
        let args = self.arguments(&arg_nodes, ctx, Some(&ctor.parameters))?;
        let func = self.package_member(owner, &ctor.name);
        Ok(Expr::call(func, args))
    }
}

/// Does an identifier spelled `name` occur anywhere under `node`?
fn mentions(node: Node, name: &str, source: &str) -> bool {
    if JavaKind::of(node) == JavaKind::Identifier && text(node, source) == name {
        return true;
    }
    named_children(node)
        .into_iter()
        .any(|child| mentions(child, name, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Stmt;

    #[test]
    fn test_ternary_helper_shape() {
        let Decl::Func(helper) = ternary_helper("pick") else {
            panic!("helper is not a function");
        };
        assert_eq!(helper.name, "pick");
        assert_eq!(helper.type_params, vec!["T".to_string()]);
        assert_eq!(helper.params.len(), 3);
        assert!(matches!(helper.body.last(), Some(Stmt::Return(Some(_)))));
    }

    #[test]
    fn test_default_options() {
        let options = LowerOptions::default();
        assert_eq!(options.ternary_helper, "ternary");
        assert!(options.module.is_empty());
    }
}
