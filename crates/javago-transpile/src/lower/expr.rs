//! Expression lowering.

use super::Lowerer;
use super::context::{Binding, Context};
use super::lookup::{ClassRef, Variable, argument_nodes, array_depth, pick_overload};
use crate::diagnostics::Diagnostic;
use crate::error::Error;
use crate::extract::constructor_name;
use crate::ir::{BinaryOp, Expr, GoType, Literal, Param, Stmt, UnaryOp};
use crate::resolve::safe_local_name;
use crate::scope::{Definition, export_name};
use crate::syntax::{JavaKind, named_children, required_field};
use tree_sitter::Node;

fn int_type() -> GoType {
    GoType::named("int")
}

/// `len(x)`
pub(super) fn len(expr: Expr) -> Expr {
    Expr::call(Expr::ident("len"), vec![expr])
}

/// Allocate a (possibly nested) slice. More than one size builds the
/// inner levels in an immediately invoked closure.
pub(super) fn allocate(ty: GoType, sizes: &[Expr]) -> Expr {
    match sizes {
        [] => Expr::composite(ty, Vec::new()),
        [size] => Expr::make(ty, vec![size.clone()]),
        [size, rest @ ..] => {
            let elem = ty.elem().cloned().unwrap_or(GoType::Any);
            let out = Expr::ident("out");
            let body = vec![
                Stmt::define("out", Expr::make(ty.clone(), vec![size.clone()])),
                Stmt::Range {
                    key: Some("i".into()),
                    value: None,
                    iterable: out.clone(),
                    body: vec![Stmt::assign(
                        Expr::index(out.clone(), Expr::ident("i")),
                        allocate(elem, rest),
                    )],
                },
                Stmt::Return(Some(out)),
            ];
            Expr::call(
                Expr::FuncLit {
                    params: Vec::new(),
                    result: Some(ty),
                    body,
                },
                Vec::new(),
            )
        }
    }
}

/// `x >>> n` shifts the unsigned view of `x`: `int(uint32(x) >> n)`.
/// Narrow operands are promoted to `int` first, as Java does.
pub(super) fn unsigned_shift(
    node: Node,
    value: Expr,
    ty: Option<&GoType>,
    amount: Expr,
) -> Result<Expr, Error> {
    let (unsigned, signed) = match ty {
        Some(t) if t.is_named("int64") => ("uint64", "int64"),
        Some(t) if ["int", "int32", "int16", "int8", "rune"].iter().any(|n| t.is_named(n)) => {
            ("uint32", "int")
        }
        _ => return Err(Error::unhandled_as(node, "`>>>` on an operand of unknown width")),
    };
    Ok(Expr::convert(
        GoType::named(signed),
        Expr::binary(
            Expr::convert(GoType::named(unsigned), value),
            BinaryOp::Shr,
            amount,
        ),
    ))
}

/// Java integer literal to Go: the `L` suffix goes, everything else
/// (underscores, `0x`, `0b`, leading-zero octal) means the same.
fn integer_literal(text: &str) -> String {
    text.trim_end_matches(['l', 'L']).to_string()
}

fn float_literal(text: &str) -> String {
    text.trim_end_matches(['f', 'F', 'd', 'D']).to_string()
}

/// Rewrite the Java escapes Go spells differently in a quoted literal.
/// Go octal escapes take exactly three digits and are bytes inside
/// strings, so string escapes above `\177` become `\u`. Go has no `\s`.
fn go_escapes(literal: &str, quote: char) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(first) if first.is_digit(8) => {
                // `\0`..`\377`: three digits only when the first is 0-3.
                let max = if first <= '3' { 3 } else { 2 };
                let mut digits = String::new();
                while digits.len() < max && chars.peek().is_some_and(|d| d.is_digit(8)) {
                    digits.extend(chars.next());
                }
                let value = u32::from_str_radix(&digits, 8).unwrap_or_default();
                if quote == '"' && value > 0o177 {
                    out.push_str(&format!("\\u{value:04x}"));
                } else {
                    out.push_str(&format!("\\{value:03o}"));
                }
            }
            Some('s') => {
                chars.next();
                out.push(' ');
            }
            Some(other @ ('"' | '\'')) if other != quote => {
                chars.next();
                out.push(other);
            }
            Some(other) => {
                chars.next();
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// A text block becomes a raw string unless it contains a backquote.
fn text_block(text: &str) -> Literal {
    let inner = text
        .strip_prefix("\"\"\"")
        .and_then(|t| t.strip_suffix("\"\"\""))
        .unwrap_or(text);
    let inner = inner.strip_prefix('\n').unwrap_or(inner);
    let indent = inner
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let dedented: Vec<&str> = inner
        .lines()
        .map(|l| l.get(indent..).unwrap_or(l.trim_start()))
        .collect();
    let mut value = dedented.join("\n");
    if inner.ends_with('\n') {
        value.push('\n');
    }
    if value.contains('`') {
        Literal::Str(format!("{value:?}"))
    } else {
        Literal::RawStr(value)
    }
}

/// Java library constants with a Go counterpart in `math`.
fn library_constant(class: &str, field: &str) -> Option<&'static str> {
    Some(match (class, field) {
        ("Integer", "MAX_VALUE") => "MaxInt32",
        ("Integer", "MIN_VALUE") => "MinInt32",
        ("Long", "MAX_VALUE") => "MaxInt64",
        ("Long", "MIN_VALUE") => "MinInt64",
        ("Double", "MAX_VALUE") => "MaxFloat64",
        ("Math", "PI") => "Pi",
        ("Math", "E") => "E",
        _ => return None,
    })
}

impl<'a> Lowerer<'a> {
    /// Lower an expression. `expected` is the type the surrounding
    /// declaration wants, used for array initializers and empty collections.
    pub(super) fn expr(
        &mut self,
        node: Node,
        ctx: &Context<'a>,
        expected: Option<&GoType>,
    ) -> Result<Expr, Error> {
        let text = self.text(node);
        match JavaKind::of(node) {
            JavaKind::Identifier => Ok(self.identifier(text, node.start_byte(), ctx)),
            JavaKind::This => Ok(Expr::ident("this")),
            JavaKind::IntegerLiteral => Ok(Expr::int(integer_literal(text))),
            JavaKind::FloatLiteral => Ok(Expr::Literal(Literal::Float(float_literal(text)))),
            JavaKind::CharacterLiteral => Ok(Expr::Literal(Literal::Rune(go_escapes(text, '\'')))),
            JavaKind::StringLiteral => Ok(Expr::Literal(Literal::Str(go_escapes(text, '"')))),
            JavaKind::TextBlock => Ok(Expr::Literal(text_block(text))),
            JavaKind::True => Ok(Expr::bool(true)),
            JavaKind::False => Ok(Expr::bool(false)),
            JavaKind::NullLiteral => Ok(Expr::nil()),
            JavaKind::ParenthesizedExpression => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::assertion(node, "empty parentheses"))?;
                Ok(Expr::paren(self.expr(inner, ctx, expected)?))
            }
            JavaKind::BinaryExpression => self.binary(node, ctx),
            JavaKind::UnaryExpression => {
                let op_text = self.text(required_field(node, "operator")?);
                let op = UnaryOp::from_java(op_text)
                    .ok_or_else(|| Error::unhandled_as(node, format!("operator `{op_text}`")))?;
                let operand = self.expr(required_field(node, "operand")?, ctx, expected)?;
                Ok(Expr::unary(op, operand))
            }
            JavaKind::UpdateExpression => {
                Err(Error::unhandled_as(node, "update_expression used as a value"))
            }
            JavaKind::AssignmentExpression => {
                Err(Error::unhandled_as(node, "assignment_expression used as a value"))
            }
            JavaKind::SwitchExpression => self.switch_value(node, ctx, expected),
            JavaKind::TernaryExpression => {
                let cond = self.expr(required_field(node, "condition")?, ctx, None)?;
                let then = self.expr(required_field(node, "consequence")?, ctx, expected)?;
                let otherwise = self.expr(required_field(node, "alternative")?, ctx, expected)?;
                self.uses_ternary = true;
                Ok(Expr::call(
                    Expr::ident(self.options.ternary_helper.clone()),
                    vec![cond, then, otherwise],
                ))
            }
            JavaKind::InstanceofExpression => self.instanceof(node, ctx),
            JavaKind::CastExpression => self.cast(node, ctx),
            JavaKind::LambdaExpression => self.lambda(node, ctx),
            JavaKind::ObjectCreationExpression => self.object_creation(node, ctx, expected),
            JavaKind::ArrayCreationExpression => self.array_creation(node, ctx),
            JavaKind::ArrayInitializer => match expected {
                Some(ty) => self.array_literal(node, ctx, ty),
                None => Err(Error::unhandled_as(
                    node,
                    "array_initializer without a declared type",
                )),
            },
            JavaKind::FieldAccess => self.field_access(node, ctx),
            JavaKind::ArrayAccess => {
                let array = self.expr(required_field(node, "array")?, ctx, None)?;
                let index = self.expr(required_field(node, "index")?, ctx, Some(&int_type()))?;
                Ok(Expr::index(array, index))
            }
            JavaKind::MethodInvocation => self.invocation(node, ctx),
            _ => Err(Error::unhandled(node)),
        }
    }

    fn identifier(&mut self, name: &str, at: usize, ctx: &Context<'a>) -> Expr {
        match self.variable(name, at, ctx) {
            Some(Variable::Local { name, .. }) => Expr::ident(name),
            Some(Variable::Field { owner, def }) if def.is_static => {
                self.package_member(owner, &def.name)
            }
            Some(Variable::Field { def, .. }) => Expr::selector(Expr::ident("this"), &def.name),
            None => Expr::ident(name),
        }
    }

    /// Lower call arguments against the parameters of the chosen method.
    pub(super) fn arguments(
        &mut self,
        args: &[Node],
        ctx: &Context<'a>,
        params: Option<&[Definition]>,
    ) -> Result<Vec<Expr>, Error> {
        args.iter()
            .enumerate()
            .map(|(i, arg)| {
                let expected = params
                    .and_then(|p| p.get(i))
                    .and_then(|p| p.ty.go_type());
                self.expr(*arg, ctx, expected.as_ref())
            })
            .collect()
    }

    /// Wrap a non-string operand of a string concatenation.
    pub(super) fn stringify(&mut self, expr: Expr, ty: Option<&GoType>) -> Expr {
        if ty.is_some_and(|t| t.is_named("rune")) {
            return Expr::convert(GoType::named("string"), expr);
        }
        self.use_import("fmt");
        Expr::pkg_call("fmt", "Sprint", vec![expr])
    }

    fn binary(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        let left_node = required_field(node, "left")?;
        let right_node = required_field(node, "right")?;
        let op_text = self.text(required_field(node, "operator")?);
        if op_text == ">>>" {
            let value = self.expr(left_node, ctx, None)?;
            let amount = self.expr(right_node, ctx, None)?;
            let ty = self.type_of(left_node, ctx);
            return unsigned_shift(node, value, ty.as_ref(), amount);
        }
        let op = BinaryOp::from_java(op_text)
            .ok_or_else(|| Error::unhandled_as(node, format!("operator `{op_text}`")))?;

        let mut left = self.expr(left_node, ctx, None)?;
        let mut right = self.expr(right_node, ctx, None)?;
        if op == BinaryOp::Add {
            let left_ty = self.type_of(left_node, ctx);
            let right_ty = self.type_of(right_node, ctx);
            let left_str = left_ty.as_ref().is_some_and(GoType::is_string);
            let right_str = right_ty.as_ref().is_some_and(GoType::is_string);
            if left_str && !right_str {
                right = self.stringify(right, right_ty.as_ref());
            } else if right_str && !left_str {
                left = self.stringify(left, left_ty.as_ref());
            }
        }
        Ok(Expr::binary(left, op, right))
    }

    /// `x instanceof T` as `func() bool { _, ok := any(x).(T); return ok }()`
    fn instanceof(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        if node.child_by_field_name("name").is_some() || node.child_by_field_name("pattern").is_some()
        {
            return Err(Error::unhandled_as(node, "instanceof pattern"));
        }
        let value = self.expr(required_field(node, "left")?, ctx, None)?;
        let ty = self.body_type(required_field(node, "right")?, ctx);
        let body = vec![
            Stmt::Define {
                names: vec!["_".into(), "ok".into()],
                values: vec![Expr::type_assert(Expr::convert(GoType::Any, value), ty)],
            },
            Stmt::Return(Some(Expr::ident("ok"))),
        ];
        Ok(Expr::call(
            Expr::FuncLit {
                params: Vec::new(),
                result: Some(GoType::named("bool")),
                body,
            },
            Vec::new(),
        ))
    }

    /// Numeric casts convert; casts out of an interface or `Object` assert.
    fn cast(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        let ty = self.body_type(required_field(node, "type")?, ctx);
        let value_node = required_field(node, "value")?;
        let value = self.expr(value_node, ctx, Some(&ty))?;
        let assert = match self.type_of(value_node, ctx) {
            Some(GoType::Any) => true,
            Some(source) => self.is_interface(&source, ctx.package()),
            None => !ty.is_basic(),
        };
        Ok(if assert {
            Expr::type_assert(value, ty)
        } else {
            Expr::convert(ty, value)
        })
    }

    fn lambda(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        let params_node = required_field(node, "parameters")?;
        let mut bindings = Vec::new();
        let mut declare = |original: &str, ty: GoType| {
            bindings.push(Binding {
                original_name: original.to_string(),
                name: safe_local_name(original),
                ty: Some(ty),
            });
        };
        match params_node.kind() {
            "identifier" => declare(self.text(params_node), GoType::Any),
            "formal_parameters" => {
                for param in named_children(params_node) {
                    if param.kind() != "formal_parameter" {
                        continue;
                    }
                    let name = self.text(required_field(param, "name")?);
                    let ty = self.lookup_type(self.text(required_field(param, "type")?), ctx);
                    declare(name, ty);
                }
            }
            "inferred_parameters" => {
                for param in named_children(params_node) {
                    declare(self.text(param), GoType::Any);
                }
            }
            _ => return Err(Error::unhandled(params_node)),
        }

        let params: Vec<Param> = bindings
            .iter()
            .map(|b| Param::new(b.name.clone(), b.ty.clone().unwrap_or(GoType::Any)))
            .collect();
        for param in &params {
            self.use_type(&param.ty);
        }
        let mut inner = ctx.with_bindings(bindings);
        inner.in_constructor = false;
        let body_node = required_field(node, "body")?;

        let (result, body) = if JavaKind::of(body_node) == JavaKind::Block {
            let result = returns_value(body_node).then_some(GoType::Any);
            (result, self.block(body_node, &inner)?)
        } else {
            let ty = self.type_of(body_node, &inner);
            let is_statement = matches!(
                JavaKind::of(body_node),
                JavaKind::MethodInvocation
                    | JavaKind::AssignmentExpression
                    | JavaKind::UpdateExpression
            );
            if ty.is_none() && is_statement {
                (None, self.statement_expression(body_node, &inner)?)
            } else {
                let value = self.expr(body_node, &inner, None)?;
                (Some(ty.unwrap_or(GoType::Any)), vec![Stmt::Return(Some(value))])
            }
        };
        Ok(Expr::FuncLit {
            params,
            result,
            body,
        })
    }

    fn object_creation(
        &mut self,
        node: Node,
        ctx: &Context<'a>,
        expected: Option<&GoType>,
    ) -> Result<Expr, Error> {
        if named_children(node).iter().any(|c| c.kind() == "class_body") {
            return Err(Error::unhandled_as(node, "anonymous class"));
        }
        let ty_node = required_field(node, "type")?;
        let ty = self.body_type(ty_node, ctx);
        let arg_nodes = argument_nodes(node);

        // Collections: element types come from the declaration when the
        // creation uses the diamond.
        let same_shape = |e: &&GoType| {
            matches!(
                (e, &ty),
                (GoType::Slice(_), GoType::Slice(_)) | (GoType::Map(..), GoType::Map(..))
            )
        };
        let collection = expected.filter(same_shape).cloned().unwrap_or_else(|| ty.clone());
        match collection {
            GoType::Slice(_) => return Ok(Expr::composite(collection, Vec::new())),
            GoType::Map(..) => return Ok(Expr::make(collection, Vec::new())),
            _ => {}
        }

        if let Some(class) = self.class_of_type(&ty, ctx.package()) {
            let scope = class.scope;
            let constructors: Vec<&'a Definition> = scope.constructors().collect();
            let arg_types: Vec<Option<GoType>> =
                arg_nodes.iter().map(|a| self.type_of(*a, ctx)).collect();
            if let Some(ctor) = pick_overload(&constructors, &arg_types) {
                let args = self.arguments(&arg_nodes, ctx, Some(&ctor.parameters))?;
                let func = self.package_member(class, &ctor.name);
                return Ok(Expr::call(func, args));
            }
        }

        let args = self.arguments(&arg_nodes, ctx, None)?;
        if ty.is_basic() && args.len() == 1 {
            return Ok(Expr::convert(ty, args.into_iter().next().unwrap_or_else(Expr::nil)));
        }

        // Unknown class: guess the constructor it would get.
        let spelling = self.text(ty_node);
        let simple = spelling.split('<').next().unwrap_or(spelling).trim();
        self.diagnostics.push(Diagnostic::unresolved(
            self.file_id,
            simple,
            &format!("`new {simple}` in class `{}`", ctx.class.class.original_name()),
        ));
        let simple = simple.rsplit('.').next().unwrap_or(simple);
        Ok(Expr::call(
            Expr::ident(constructor_name(&export_name(simple, true))),
            args,
        ))
    }

    fn array_creation(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        let elem = self.body_type(required_field(node, "type")?, ctx);
        let depth = array_depth(node, self.source);
        let ty = (0..depth).fold(elem, |ty, _| GoType::slice(ty));

        if let Some(init) = node.child_by_field_name("value") {
            return self.array_literal(init, ctx, &ty);
        }

        let mut cursor = node.walk();
        let size_nodes: Vec<Node> = node
            .children_by_field_name("dimensions", &mut cursor)
            .filter(|d| d.kind() == "dimensions_expr")
            .filter_map(|d| named_children(d).into_iter().next())
            .collect();
        if size_nodes.is_empty() {
            return Err(Error::assertion(node, "array creation without sizes"));
        }
        let int = int_type();
        let sizes = size_nodes
            .into_iter()
            .map(|s| self.expr(s, ctx, Some(&int)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(allocate(ty, &sizes))
    }

    pub(super) fn array_literal(
        &mut self,
        node: Node,
        ctx: &Context<'a>,
        ty: &GoType,
    ) -> Result<Expr, Error> {
        let elem = ty.elem().cloned();
        let elems = named_children(node)
            .into_iter()
            .filter(|c| JavaKind::of(*c) != JavaKind::Comment)
            .map(|c| self.expr(c, ctx, elem.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::composite(ty.clone(), elems))
    }

    /// An identifier that names a class rather than a variable.
    fn names_class(&self, node: Node, ctx: &Context<'a>) -> bool {
        JavaKind::of(node) == JavaKind::Identifier
            && self
                .variable(self.text(node), node.start_byte(), ctx)
                .is_none()
    }

    fn field_access(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        let object = required_field(node, "object")?;
        let field = self.text(required_field(node, "field")?);

        match JavaKind::of(object) {
            // Inherited fields are promoted through the embedded parent.
            JavaKind::This | JavaKind::Super => {
                let name = self
                    .field_of(self.current_class(ctx), field)
                    .map_or(field, |(_, def)| def.name.as_str());
                return Ok(Expr::selector(Expr::ident("this"), name));
            }
            _ if self.names_class(object, ctx) => {
                let class_name = self.text(object);
                if let Some(constant) = library_constant(class_name, field) {
                    self.use_import("math");
                    return Ok(Expr::selector(Expr::ident("math"), constant));
                }
                if let Some(class) = self.class_named(class_name, ctx)
                    && let Some((owner, def)) = self.field_of(class, field)
                {
                    return Ok(self.package_member(owner, &def.name));
                }
            }
            _ => {}
        }

        let object_ty = self.type_of(object, ctx);
        let receiver = self.expr(object, ctx, None)?;
        if field == "length" && matches!(object_ty, Some(GoType::Slice(_))) {
            return Ok(len(receiver));
        }
        let class = object_ty.and_then(|ty| self.class_of_type(&ty, ctx.package()));
        match class.and_then(|c| self.field_of(c, field)) {
            Some((owner, def)) if def.is_static => Ok(self.package_member(owner, &def.name)),
            Some((_, def)) => Ok(Expr::selector(receiver, &def.name)),
            None => Ok(Expr::selector(receiver, field)),
        }
    }

    fn invocation(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        let name = self.text(required_field(node, "name")?);
        let arg_nodes = argument_nodes(node);

        let Some(object) = node.child_by_field_name("object") else {
            return match self.bare_method(name, &arg_nodes, ctx) {
                Some((owner, def)) => self.call_method(Expr::ident("this"), owner, def, &arg_nodes, ctx),
                None => {
                    let args = self.arguments(&arg_nodes, ctx, None)?;
                    Ok(Expr::call(Expr::ident(name), args))
                }
            };
        };

        if let Some(call) = self.library_call(object, name, &arg_nodes, ctx)? {
            return Ok(call);
        }

        match JavaKind::of(object) {
            JavaKind::This => {
                let class = self.current_class(ctx);
                return self.method_on(Expr::ident("this"), class, name, &arg_nodes, ctx);
            }
            JavaKind::Super => {
                if let Some(parent) = self.superclass(self.current_class(ctx)) {
                    let embedded = Expr::selector(Expr::ident("this"), &parent.scope.class.name);
                    return self.method_on(embedded, parent, name, &arg_nodes, ctx);
                }
            }
            _ if self.names_class(object, ctx) => {
                if let Some(class) = self.class_named(self.text(object), ctx)
                    && let Some((owner, def)) = self.user_method(class, name, &arg_nodes, ctx)
                {
                    let args = self.arguments(&arg_nodes, ctx, Some(&def.parameters))?;
                    let func = self.package_member(owner, &def.name);
                    return Ok(Expr::call(func, args));
                }
            }
            _ => {}
        }

        let object_ty = self.type_of(object, ctx);
        let receiver = self.expr(object, ctx, None)?;
        if let Some(call) =
            self.collection_call(receiver.clone(), object_ty.as_ref(), name, &arg_nodes, ctx)?
        {
            return Ok(call);
        }
        if name == "equals" && arg_nodes.len() == 1 {
            let other = self.expr(arg_nodes[0], ctx, None)?;
            return Ok(Expr::binary(receiver, BinaryOp::Eq, other));
        }
        match object_ty.and_then(|ty| self.class_of_type(&ty, ctx.package())) {
            Some(class) => self.method_on(receiver, class, name, &arg_nodes, ctx),
            None => {
                let args = self.arguments(&arg_nodes, ctx, None)?;
                Ok(Expr::call(Expr::selector(receiver, name), args))
            }
        }
    }

    /// Call `name` on an object of a known class.
    fn method_on(
        &mut self,
        receiver: Expr,
        class: ClassRef<'a>,
        name: &str,
        arg_nodes: &[Node],
        ctx: &Context<'a>,
    ) -> Result<Expr, Error> {
        match self.user_method(class, name, arg_nodes, ctx) {
            Some((owner, def)) => self.call_method(receiver, owner, def, arg_nodes, ctx),
            None => {
                let args = self.arguments(arg_nodes, ctx, None)?;
                Ok(Expr::call(Expr::selector(receiver, name), args))
            }
        }
    }

    fn call_method(
        &mut self,
        receiver: Expr,
        owner: ClassRef<'a>,
        def: &'a Definition,
        arg_nodes: &[Node],
        ctx: &Context<'a>,
    ) -> Result<Expr, Error> {
        let args = self.arguments(arg_nodes, ctx, Some(&def.parameters))?;
        let func = if def.is_static {
            self.package_member(owner, &def.name)
        } else {
            Expr::selector(receiver, &def.name)
        };
        Ok(Expr::call(func, args))
    }

    /// `System.out.println`, `String.format`, `Math.*`.
    fn library_call(
        &mut self,
        object: Node,
        name: &str,
        arg_nodes: &[Node],
        ctx: &Context<'a>,
    ) -> Result<Option<Expr>, Error> {
        let object_text: String = self.text(object).split_whitespace().collect();
        let head = object_text.split('.').next().unwrap_or_default();
        if self.variable(head, object.start_byte(), ctx).is_some() {
            return Ok(None);
        }

        let stream = match object_text.as_str() {
            "System.out" => Some(false),
            "System.err" => Some(true),
            _ => None,
        };
        if let Some(stderr) = stream {
            let func = match (name, stderr) {
                ("println", false) => "Println",
                ("print", false) => "Print",
                ("printf" | "format", false) => "Printf",
                ("println", true) => "Fprintln",
                ("print", true) => "Fprint",
                ("printf" | "format", true) => "Fprintf",
                _ => return Ok(None),
            };
            let mut args = self.arguments(arg_nodes, ctx, None)?;
            if stderr {
                self.use_import("os");
                args.insert(0, Expr::selector(Expr::ident("os"), "Stderr"));
            }
            self.use_import("fmt");
            return Ok(Some(Expr::pkg_call("fmt", func, args)));
        }

        let (package, func) = match (object_text.as_str(), name) {
            ("String", "format") => ("fmt", "Sprintf"),
            ("String", "valueOf") => ("fmt", "Sprint"),
            ("Math", "max") => ("", "max"),
            ("Math", "min") => ("", "min"),
            ("Math", "abs") => ("math", "Abs"),
            ("Math", "sqrt") => ("math", "Sqrt"),
            ("Math", "pow") => ("math", "Pow"),
            ("Math", "floor") => ("math", "Floor"),
            ("Math", "ceil") => ("math", "Ceil"),
            _ => return Ok(None),
        };
        let args = self.arguments(arg_nodes, ctx, None)?;
        if package.is_empty() {
            return Ok(Some(Expr::call(Expr::ident(func), args)));
        }
        self.use_import(package);
        Ok(Some(Expr::pkg_call(package, func, args)))
    }

    /// Slice, map and string methods that map to Go operators or builtins.
    fn collection_call(
        &mut self,
        receiver: Expr,
        object_ty: Option<&GoType>,
        name: &str,
        arg_nodes: &[Node],
        ctx: &Context<'a>,
    ) -> Result<Option<Expr>, Error> {
        let Some(ty) = object_ty else {
            return Ok(None);
        };
        let is_slice = matches!(ty, GoType::Slice(_));
        let is_map = matches!(ty, GoType::Map(..));
        let is_string = ty.is_string();
        if !(is_slice || is_map || is_string) {
            return Ok(None);
        }

        let element = match ty {
            GoType::Slice(elem) => Some(elem.as_ref().clone()),
            _ => None,
        };
        let args = self.arguments(arg_nodes, ctx, None)?;
        Ok(Some(match (name, args.as_slice()) {
            ("size" | "length", []) => len(receiver),
            ("isEmpty", []) => Expr::binary(len(receiver), BinaryOp::Eq, Expr::int("0")),
            ("equals", [other]) => Expr::binary(receiver, BinaryOp::Eq, other.clone()),
            ("get", [key]) if !is_string => Expr::index(receiver, key.clone()),
            ("charAt", [i]) if is_string => {
                Expr::convert(GoType::named("rune"), Expr::index(receiver, i.clone()))
            }
            ("add", [value]) if is_slice => {
                let value = match &element {
                    Some(elem) => self.expr(arg_nodes[0], ctx, Some(elem))?,
                    None => value.clone(),
                };
                Expr::call(Expr::ident("append"), vec![receiver, value])
            }
            _ => Expr::call(Expr::selector(receiver, name), args),
        }))
    }
}

/// Whether a lambda block returns a value. Nested lambdas and classes
/// are not entered.
fn returns_value(node: Node) -> bool {
    match JavaKind::of(node) {
        JavaKind::ReturnStatement => !named_children(node).is_empty(),
        JavaKind::LambdaExpression | JavaKind::ClassBody => false,
        _ => named_children(node).into_iter().any(returns_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(integer_literal("100L"), "100");
        assert_eq!(integer_literal("0xFF"), "0xFF");
        assert_eq!(float_literal("1.5f"), "1.5");
        assert_eq!(float_literal("2e10"), "2e10");
    }

    #[test]
    fn test_octal_escapes_take_three_digits() {
        assert_eq!(go_escapes(r#""\0""#, '"'), r#""\000""#);
        assert_eq!(go_escapes(r#""a\12b""#, '"'), r#""a\012b""#);
        assert_eq!(go_escapes(r#""\101\7""#, '"'), r#""\101\007""#);
        // `\477` is `\47` followed by a literal 7.
        assert_eq!(go_escapes(r#""\477""#, '"'), r#""\0477""#);
        assert_eq!(go_escapes(r"'\0'", '\''), r"'\000'");
        assert_eq!(go_escapes(r"'\377'", '\''), r"'\377'");
        assert_eq!(go_escapes(r#""\377""#, '"'), r#""\u00ff""#);
    }

    #[test]
    fn test_escapes_go_lacks() {
        assert_eq!(go_escapes(r#""it\'s\sok""#, '"'), r#""it's ok""#);
        assert_eq!(go_escapes(r#"'\"'"#, '\''), r#"'"'"#);
        assert_eq!(go_escapes(r"'\''", '\''), r"'\''");
        assert_eq!(go_escapes(r#""tab\t\\ \u0041""#, '"'), r#""tab\t\\ \u0041""#);
    }

    #[test]
    fn test_text_block_dedents() {
        let literal = text_block("\"\"\"\n    hello\n      world\n    \"\"\"");
        assert_eq!(literal, Literal::RawStr("hello\n  world\n".into()));
    }

    #[test]
    fn test_allocate_nested() {
        let ty = GoType::slice(GoType::slice(GoType::named("int")));
        let alloc = allocate(ty.clone(), &[Expr::int("2"), Expr::int("3")]);
        let Expr::Call { func, args } = alloc else {
            panic!("expected an invoked closure");
        };
        assert!(args.is_empty());
        let Expr::FuncLit { result, body, .. } = *func else {
            panic!("expected a closure");
        };
        assert_eq!(result, Some(ty));
        assert_eq!(body.len(), 3);

        let flat = allocate(GoType::slice(GoType::named("int")), &[Expr::int("4")]);
        assert_eq!(
            flat,
            Expr::make(GoType::slice(GoType::named("int")), vec![Expr::int("4")])
        );
    }
}
