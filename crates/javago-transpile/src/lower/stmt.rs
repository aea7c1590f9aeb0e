//! Statement lowering. Every statement lowers to zero or more Go
//! statements so unwrapped constructs (try, synchronized, resources) can
//! splice their bodies into the surrounding block.

use super::Lowerer;
use super::context::Context;
use super::expr::unsigned_shift;
use super::lookup::argument_nodes;
use crate::diagnostics::Diagnostic;
use crate::error::Error;
use crate::ir::{AssignOp, BinaryOp, CaseClause, Expr, GoType, Stmt};
use crate::syntax::{JavaKind, declaration_name, line, named_children, required_field};
use tree_sitter::Node;

/// Splice statements into the surrounding block unless they declare
/// locals, which stay in a block of their own.
fn scoped(stmts: Vec<Stmt>) -> Vec<Stmt> {
    if stmts.iter().any(Stmt::declares) {
        vec![Stmt::Block(stmts)]
    } else {
        stmts
    }
}

impl<'a> Lowerer<'a> {
    /// The statements of a body. Blocks are spliced, a single statement
    /// body is lowered on its own.
    pub(super) fn block(&mut self, node: Node, ctx: &Context<'a>) -> Result<Vec<Stmt>, Error> {
        match JavaKind::of(node) {
            JavaKind::Block | JavaKind::ConstructorBody => {
                let mut out = Vec::new();
                for child in named_children(node) {
                    out.extend(self.stmt(child, ctx)?);
                }
                Ok(out)
            }
            _ => self.stmt(node, ctx),
        }
    }

    pub(super) fn stmt(&mut self, node: Node, ctx: &Context<'a>) -> Result<Vec<Stmt>, Error> {
        match JavaKind::of(node) {
            JavaKind::Comment | JavaKind::EmptyStatement => Ok(Vec::new()),
            JavaKind::Block => Ok(vec![Stmt::Block(self.block(node, ctx)?)]),
            JavaKind::LocalVariableDeclaration => self.local_declaration(node, ctx),
            JavaKind::ExpressionStatement => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::assertion(node, "empty expression statement"))?;
                self.statement_expression(inner, ctx)
            }
            JavaKind::IfStatement => Ok(vec![self.if_stmt(node, ctx)?]),
            JavaKind::WhileStatement => {
                let cond = self.condition(required_field(node, "condition")?, ctx)?;
                let body = self.block(required_field(node, "body")?, ctx)?;
                Ok(vec![Stmt::For {
                    init: None,
                    cond: Some(cond),
                    post: None,
                    body,
                }])
            }
            JavaKind::ForStatement => self.for_stmt(node, ctx),
            JavaKind::EnhancedForStatement => {
                let original = declaration_name(node, self.source)?;
                let name = self.local_name(original, node.start_byte(), ctx);
                let iterable = self.expr(required_field(node, "value")?, ctx, None)?;
                let body = self.block(required_field(node, "body")?, ctx)?;
                Ok(vec![Stmt::Range {
                    key: Some("_".into()),
                    value: Some(name),
                    iterable,
                    body,
                }])
            }
            // do { body } while (cond) => for { body; if !(cond) { break } }
            JavaKind::DoStatement => {
                let mut body = self.block(required_field(node, "body")?, ctx)?;
                let cond = self.condition(required_field(node, "condition")?, ctx)?;
                body.push(Stmt::if_stmt(Expr::not(cond), vec![Stmt::Break(None)], None));
                Ok(vec![Stmt::loop_forever(body)])
            }
            JavaKind::SwitchExpression => Ok(vec![self.switch(node, ctx, false)?]),
            JavaKind::ReturnStatement => {
                if ctx.in_constructor {
                    return Ok(vec![Stmt::Return(Some(Expr::ident("this")))]);
                }
                let expected = ctx.method.and_then(|m| m.ty.go_type());
                let value = named_children(node)
                    .into_iter()
                    .find(|c| JavaKind::of(*c) != JavaKind::Comment)
                    .map(|v| self.expr(v, ctx, expected.as_ref()))
                    .transpose()?;
                Ok(vec![Stmt::Return(value)])
            }
            JavaKind::YieldStatement => {
                let Some(result) = self.yields.last().cloned() else {
                    return Err(Error::unhandled_as(node, "yield outside a switch value"));
                };
                let value = named_children(node)
                    .into_iter()
                    .find(|c| JavaKind::of(*c) != JavaKind::Comment)
                    .ok_or_else(|| Error::assertion(node, "yield without a value"))?;
                let expected = (result != GoType::Any).then_some(&result);
                Ok(vec![Stmt::Return(Some(self.expr(value, ctx, expected)?))])
            }
            JavaKind::BreakStatement => Ok(vec![Stmt::Break(self.jump_label(node))]),
            JavaKind::ContinueStatement => Ok(vec![Stmt::Continue(self.jump_label(node))]),
            JavaKind::ThrowStatement => Ok(vec![self.throw(node, ctx)?]),
            JavaKind::TryStatement | JavaKind::TryWithResourcesStatement => self.try_stmt(node, ctx),
            JavaKind::SynchronizedStatement => {
                Ok(scoped(self.block(required_field(node, "body")?, ctx)?))
            }
            JavaKind::LabeledStatement => {
                let children = named_children(node);
                let (Some(label), Some(inner)) = (children.first(), children.last()) else {
                    return Err(Error::assertion(node, "labeled statement without a body"));
                };
                let label = self.text(*label).to_string();
                let mut lowered = self.stmt(*inner, ctx)?;
                let body = match lowered.len() {
                    1 => lowered.remove(0),
                    _ => Stmt::Block(lowered),
                };
                Ok(vec![Stmt::Labeled {
                    label,
                    body: Box::new(body),
                }])
            }
            JavaKind::AssertStatement => {
                let parts: Vec<Node> = named_children(node)
                    .into_iter()
                    .filter(|c| JavaKind::of(*c) != JavaKind::Comment)
                    .collect();
                let cond = parts
                    .first()
                    .ok_or_else(|| Error::assertion(node, "assert without a condition"))?;
                let cond = self.expr(*cond, ctx, None)?;
                let message = match parts.get(1) {
                    Some(message) => self.expr(*message, ctx, None)?,
                    None => Expr::string("assertion failed"),
                };
                Ok(vec![Stmt::if_stmt(
                    Expr::not(cond),
                    vec![Stmt::panic(message)],
                    None,
                )])
            }
            JavaKind::ExplicitConstructorInvocation => Err(Error::unhandled_as(
                node,
                "explicit_constructor_invocation after the first statement",
            )),
            _ => Err(Error::unhandled(node)),
        }
    }

    /// `if`/`while`/`do` conditions come wrapped in parentheses Go does not need.
    fn condition(&mut self, node: Node, ctx: &Context<'a>) -> Result<Expr, Error> {
        let inner = match JavaKind::of(node) {
            JavaKind::ParenthesizedExpression => named_children(node)
                .into_iter()
                .next()
                .ok_or_else(|| Error::assertion(node, "empty condition"))?,
            _ => node,
        };
        self.expr(inner, ctx, None)
    }

    fn jump_label(&self, node: Node) -> Option<String> {
        named_children(node)
            .into_iter()
            .find(|c| JavaKind::of(*c) == JavaKind::Identifier)
            .map(|label| self.text(label).to_string())
    }

    /// The type written for one declarator, including `int a[]` dimensions.
    fn declarator_type(&self, declared: &str, declarator: Node) -> String {
        match declarator.child_by_field_name("dimensions") {
            Some(dims) => format!("{declared}{}", self.text(dims)),
            None => declared.to_string(),
        }
    }

    /// Go name of the local declared at byte offset `at`.
    fn local_name(&self, original: &str, at: usize, ctx: &Context<'a>) -> String {
        ctx.local(original, at)
            .map_or_else(|| original.to_string(), |(name, _)| name)
    }

    fn local_declaration(&mut self, node: Node, ctx: &Context<'a>) -> Result<Vec<Stmt>, Error> {
        let declared = self.text(required_field(node, "type")?);
        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        let mut out = Vec::new();
        for declarator in declarators {
            let original = declaration_name(declarator, self.source)?;
            let name = self.local_name(original, declarator.start_byte(), ctx);
            let ty = (declared != "var")
                .then(|| self.lookup_type(&self.declarator_type(declared, declarator), ctx));
            if let Some(ty) = &ty {
                self.use_type(ty);
            }
            let value = declarator
                .child_by_field_name("value")
                .map(|v| self.expr(v, ctx, ty.as_ref()))
                .transpose()?;
            out.push(match (ty, value) {
                (None, Some(value)) => Stmt::define(name, value),
                (ty, value) => Stmt::var(name, ty, value),
            });
        }
        Ok(out)
    }

    /// An expression in statement position.
    pub(super) fn statement_expression(
        &mut self,
        node: Node,
        ctx: &Context<'a>,
    ) -> Result<Vec<Stmt>, Error> {
        let stmt = match JavaKind::of(node) {
            JavaKind::AssignmentExpression => self.assignment(node, ctx)?,
            JavaKind::UpdateExpression => self.update(node, ctx)?,
            JavaKind::MethodInvocation => match self.collection_update(node, ctx)? {
                Some(stmt) => stmt,
                None => Stmt::expr(self.expr(node, ctx, None)?),
            },
            _ => Stmt::expr(self.expr(node, ctx, None)?),
        };
        Ok(vec![stmt])
    }

    fn assignment(&mut self, node: Node, ctx: &Context<'a>) -> Result<Stmt, Error> {
        let left = required_field(node, "left")?;
        let right = required_field(node, "right")?;
        let op_text = self.text(required_field(node, "operator")?);
        let target_ty = self.type_of(left, ctx);
        let target = self.expr(left, ctx, None)?;
        if op_text == ">>>=" {
            let amount = self.expr(right, ctx, None)?;
            let value = unsigned_shift(node, target.clone(), target_ty.as_ref(), amount)?;
            // Compound assignment narrows back to the target type.
            let value = match target_ty {
                Some(ty) if !ty.is_named("int") && !ty.is_named("int64") => {
                    Expr::convert(ty, value)
                }
                _ => value,
            };
            return Ok(Stmt::assign(target, value));
        }
        let op = AssignOp::from_java(op_text)
            .ok_or_else(|| Error::unhandled_as(node, format!("operator `{op_text}`")))?;

        let mut value = self.expr(right, ctx, target_ty.as_ref())?;
        if op == AssignOp::Add && target_ty.as_ref().is_some_and(GoType::is_string) {
            let value_ty = self.type_of(right, ctx);
            if !value_ty.as_ref().is_some_and(GoType::is_string) {
                value = self.stringify(value, value_ty.as_ref());
            }
        }
        Ok(Stmt::Assign {
            targets: vec![target],
            op,
            values: vec![value],
        })
    }

    fn update(&mut self, node: Node, ctx: &Context<'a>) -> Result<Stmt, Error> {
        let operand = named_children(node)
            .into_iter()
            .next()
            .ok_or_else(|| Error::assertion(node, "update without operand"))?;
        let mut cursor = node.walk();
        let increment = node.children(&mut cursor).any(|c| c.kind() == "++");
        Ok(Stmt::IncDec {
            target: self.expr(operand, ctx, None)?,
            increment,
        })
    }

    /// `list.add(x)`, `list.set(i, x)`, `map.put(k, v)` and `map.remove(k)`
    /// as statements.
    fn collection_update(&mut self, node: Node, ctx: &Context<'a>) -> Result<Option<Stmt>, Error> {
        let Some(object) = node.child_by_field_name("object") else {
            return Ok(None);
        };
        let name = self.text(required_field(node, "name")?);
        let args = argument_nodes(node);
        let Some(ty) = self.type_of(object, ctx) else {
            return Ok(None);
        };

        let stmt = match (&ty, name, args.as_slice()) {
            (GoType::Slice(elem), "add", [value]) => {
                let target = self.expr(object, ctx, None)?;
                let value = self.expr(*value, ctx, Some(elem))?;
                Stmt::assign(
                    target.clone(),
                    Expr::call(Expr::ident("append"), vec![target, value]),
                )
            }
            (GoType::Slice(elem), "set", [index, value]) => {
                let target = self.expr(object, ctx, None)?;
                let index = self.expr(*index, ctx, None)?;
                let value = self.expr(*value, ctx, Some(elem))?;
                Stmt::assign(Expr::index(target, index), value)
            }
            (GoType::Map(key, value_ty), "put", [k, v]) => {
                let target = self.expr(object, ctx, None)?;
                let k = self.expr(*k, ctx, Some(key))?;
                let v = self.expr(*v, ctx, Some(value_ty))?;
                Stmt::assign(Expr::index(target, k), v)
            }
            (GoType::Map(key, _), "remove", [k]) => {
                let target = self.expr(object, ctx, None)?;
                let k = self.expr(*k, ctx, Some(key))?;
                Stmt::expr(Expr::call(Expr::ident("delete"), vec![target, k]))
            }
            _ => return Ok(None),
        };
        Ok(Some(stmt))
    }

    fn if_stmt(&mut self, node: Node, ctx: &Context<'a>) -> Result<Stmt, Error> {
        let cond = self.condition(required_field(node, "condition")?, ctx)?;
        let then = self.block(required_field(node, "consequence")?, ctx)?;
        let otherwise = match node.child_by_field_name("alternative") {
            Some(alt) if JavaKind::of(alt) == JavaKind::IfStatement => Some(self.if_stmt(alt, ctx)?),
            Some(alt) => Some(Stmt::Block(self.block(alt, ctx)?)),
            None => None,
        };
        Ok(Stmt::if_stmt(cond, then, otherwise))
    }

    fn for_stmt(&mut self, node: Node, ctx: &Context<'a>) -> Result<Vec<Stmt>, Error> {
        let mut cursor = node.walk();
        let inits: Vec<Node> = node.children_by_field_name("init", &mut cursor).collect();
        let mut cursor = node.walk();
        let updates: Vec<Node> = node.children_by_field_name("update", &mut cursor).collect();

        let init = self.for_init(node, &inits, ctx)?;
        let cond = node
            .child_by_field_name("condition")
            .map(|c| self.expr(c, ctx, None))
            .transpose()?;
        let post = self.for_update(node, &updates, ctx)?;
        let body = self.block(required_field(node, "body")?, ctx)?;
        Ok(vec![Stmt::For {
            init: init.map(Box::new),
            cond,
            post: post.map(Box::new),
            body,
        }])
    }

    /// Go only allows `:=` or an assignment here. A declared type other
    /// than the value's own becomes a conversion.
    fn for_init(
        &mut self,
        node: Node,
        inits: &[Node],
        ctx: &Context<'a>,
    ) -> Result<Option<Stmt>, Error> {
        match inits {
            [] => Ok(None),
            [decl] if JavaKind::of(*decl) == JavaKind::LocalVariableDeclaration => {
                let declared = self.text(required_field(*decl, "type")?);
                let mut cursor = decl.walk();
                let declarators: Vec<Node> = decl
                    .children_by_field_name("declarator", &mut cursor)
                    .collect();
                let mut names = Vec::new();
                let mut values = Vec::new();
                for declarator in declarators {
                    let original = declaration_name(declarator, self.source)?;
                    let value_node = declarator.child_by_field_name("value").ok_or_else(|| {
                        Error::unhandled_as(node, "for loop variable without initializer")
                    })?;
                    let ty = (declared != "var")
                        .then(|| self.lookup_type(&self.declarator_type(declared, declarator), ctx));
                    let value = self.expr(value_node, ctx, ty.as_ref())?;
                    let value = match ty {
                        Some(ty) if self.type_of(value_node, ctx).as_ref() != Some(&ty) => {
                            self.use_type(&ty);
                            Expr::convert(ty, value)
                        }
                        _ => value,
                    };
                    names.push(self.local_name(original, declarator.start_byte(), ctx));
                    values.push(value);
                }
                Ok(Some(Stmt::Define { names, values }))
            }
            exprs => {
                let mut targets = Vec::new();
                let mut values = Vec::new();
                for init in exprs {
                    let simple = JavaKind::of(*init) == JavaKind::AssignmentExpression
                        && init
                            .child_by_field_name("operator")
                            .is_some_and(|op| self.text(op) == "=");
                    if !simple {
                        return Err(Error::unhandled_as(*init, "for loop initializer"));
                    }
                    targets.push(self.expr(required_field(*init, "left")?, ctx, None)?);
                    values.push(self.expr(required_field(*init, "right")?, ctx, None)?);
                }
                Ok(Some(Stmt::Assign {
                    targets,
                    op: AssignOp::Assign,
                    values,
                }))
            }
        }
    }

    /// A single update is a plain statement. Several (`i++, j--`) become
    /// one parallel assignment.
    fn for_update(
        &mut self,
        node: Node,
        updates: &[Node],
        ctx: &Context<'a>,
    ) -> Result<Option<Stmt>, Error> {
        match updates {
            [] => Ok(None),
            [single] => {
                let mut stmts = self.statement_expression(*single, ctx)?;
                match stmts.len() {
                    1 => Ok(stmts.pop()),
                    _ => Err(Error::unhandled_as(node, "for loop update")),
                }
            }
            several => {
                let mut targets = Vec::new();
                let mut values = Vec::new();
                for update in several {
                    match self.statement_expression(*update, ctx)?.pop() {
                        Some(Stmt::IncDec { target, increment }) => {
                            let op = if increment { BinaryOp::Add } else { BinaryOp::Sub };
                            values.push(Expr::binary(target.clone(), op, Expr::int("1")));
                            targets.push(target);
                        }
                        Some(Stmt::Assign {
                            targets: t,
                            op: AssignOp::Assign,
                            values: v,
                        }) => {
                            targets.extend(t);
                            values.extend(v);
                        }
                        _ => return Err(Error::unhandled_as(*update, "for loop update")),
                    }
                }
                Ok(Some(Stmt::Assign {
                    targets,
                    op: AssignOp::Assign,
                    values,
                }))
            }
        }
    }

    /// `throw new X("msg")` panics with the message when `X` is not one of
    /// ours, otherwise with the lowered value.
    fn throw(&mut self, node: Node, ctx: &Context<'a>) -> Result<Stmt, Error> {
        let value = named_children(node)
            .into_iter()
            .find(|c| JavaKind::of(*c) != JavaKind::Comment)
            .ok_or_else(|| Error::assertion(node, "throw without a value"))?;

        if JavaKind::of(value) == JavaKind::ObjectCreationExpression {
            let ty_node = required_field(value, "type")?;
            let ty = self.lookup_type(self.text(ty_node), ctx);
            if self.class_of_type(&ty, ctx.package()).is_none() {
                let message = match argument_nodes(value).first() {
                    Some(arg) => self.expr(*arg, ctx, None)?,
                    None => Expr::string(self.text(ty_node)),
                };
                return Ok(Stmt::panic(message));
            }
        }
        Ok(Stmt::panic(self.expr(value, ctx, None)?))
    }

    /// The try body is kept. Resources become plain declarations. Catch
    /// clauses are dropped. A finally block runs after the body. Either
    /// part keeps its own block when it declares locals.
    fn try_stmt(&mut self, node: Node, ctx: &Context<'a>) -> Result<Vec<Stmt>, Error> {
        let mut out = Vec::new();
        if let Some(resources) = node.child_by_field_name("resources") {
            for resource in named_children(resources) {
                if resource.kind() != "resource" {
                    continue;
                }
                let (Some(ty), Some(name), Some(value)) = (
                    resource.child_by_field_name("type"),
                    resource.child_by_field_name("name"),
                    resource.child_by_field_name("value"),
                ) else {
                    continue;
                };
                let ty = self.lookup_type(self.text(ty), ctx);
                self.use_type(&ty);
                let value = self.expr(value, ctx, Some(&ty))?;
                let name = self.local_name(self.text(name), resource.start_byte(), ctx);
                out.push(Stmt::var(name, Some(ty), Some(value)));
            }
        }
        out.extend(self.block(required_field(node, "body")?, ctx)?);
        let mut out = scoped(out);

        for clause in named_children(node) {
            match clause.kind() {
                "catch_clause" => self.diagnostics.push(Diagnostic::dropped(
                    self.file_id,
                    format_args!("catch clause at line {}", line(clause)),
                )),
                "finally_clause" => {
                    if let Some(body) = named_children(clause)
                        .into_iter()
                        .find(|c| JavaKind::of(*c) == JavaKind::Block)
                    {
                        out.extend(scoped(self.block(body, ctx)?));
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// A switch used as a value becomes an immediately invoked closure
    /// whose arms return. `yield` returns from the closure too.
    pub(super) fn switch_value(
        &mut self,
        node: Node,
        ctx: &Context<'a>,
        expected: Option<&GoType>,
    ) -> Result<Expr, Error> {
        let result = match expected {
            Some(ty) => ty.clone(),
            None => self.arm_type(node, ctx).unwrap_or(GoType::Any),
        };
        self.use_type(&result);
        self.yields.push(result.clone());
        let switch = self.switch(node, ctx, true);
        self.yields.pop();
        let switch = switch?;

        let has_default = match &switch {
            Stmt::Switch { cases, .. } => cases.iter().any(|c| c.values.is_empty()),
            _ => false,
        };
        let mut body = vec![switch];
        if !has_default {
            body.push(Stmt::panic(Expr::string("unreachable")));
        }
        Ok(Expr::call(
            Expr::FuncLit {
                params: Vec::new(),
                result: Some(result),
                body,
            },
            Vec::new(),
        ))
    }

    /// Static type of the first arrow rule that gives its value directly.
    fn arm_type(&self, node: Node, ctx: &Context<'a>) -> Option<GoType> {
        let body = node.child_by_field_name("body")?;
        named_children(body)
            .into_iter()
            .filter(|group| group.kind() == "switch_rule")
            .flat_map(named_children)
            .filter(|c| JavaKind::of(*c) == JavaKind::ExpressionStatement)
            .find_map(|stmt| {
                named_children(stmt)
                    .first()
                    .and_then(|value| self.type_of(*value, ctx))
            })
    }

    /// `value` lowers arrow rules with an expression body to a return.
    fn switch(&mut self, node: Node, ctx: &Context<'a>, value: bool) -> Result<Stmt, Error> {
        let tag = self.condition(required_field(node, "condition")?, ctx)?;
        let body = required_field(node, "body")?;
        let groups: Vec<Node> = named_children(body)
            .into_iter()
            .filter(|c| matches!(c.kind(), "switch_block_statement_group" | "switch_rule"))
            .collect();

        let mut cases = Vec::new();
        let count = groups.len();
        for (i, group) in groups.into_iter().enumerate() {
            let children = named_children(group);
            let labels: Vec<Node> = children
                .iter()
                .copied()
                .filter(|c| c.kind() == "switch_label")
                .collect();

            let mut statements = Vec::new();
            for child in children.iter().filter(|c| c.kind() != "switch_label") {
                if value
                    && group.kind() == "switch_rule"
                    && JavaKind::of(*child) == JavaKind::ExpressionStatement
                {
                    let inner = named_children(*child)
                        .into_iter()
                        .next()
                        .ok_or_else(|| Error::assertion(*child, "empty switch arm"))?;
                    let expected = self.yields.last().cloned().filter(|t| *t != GoType::Any);
                    statements.push(Stmt::Return(Some(self.expr(inner, ctx, expected.as_ref())?)));
                } else {
                    statements.extend(self.block(*child, ctx)?);
                }
            }
            // Arrow rules never fall through. Statement groups drop their
            // trailing break, or fall through explicitly.
            if group.kind() == "switch_block_statement_group" {
                if matches!(statements.last(), Some(Stmt::Break(None))) {
                    statements.pop();
                } else if i + 1 < count && !statements.last().is_some_and(Stmt::is_terminating) {
                    statements.push(Stmt::Fallthrough);
                }
            }

            let label_count = labels.len();
            for (j, label) in labels.into_iter().enumerate() {
                let values = self.case_values(label, ctx)?;
                let body = if j + 1 == label_count {
                    std::mem::take(&mut statements)
                } else {
                    vec![Stmt::Fallthrough]
                };
                cases.push(CaseClause { values, body });
            }
        }
        Ok(Stmt::Switch {
            tag: Some(tag),
            cases,
        })
    }

    /// Values of one `case` label, empty for `default`.
    fn case_values(&mut self, label: Node, ctx: &Context<'a>) -> Result<Vec<Expr>, Error> {
        if self.text(label).trim_start().starts_with("default") {
            return Ok(Vec::new());
        }
        named_children(label)
            .into_iter()
            .filter(|c| JavaKind::of(*c) != JavaKind::Comment)
            .map(|value| self.expr(value, ctx, None))
            .collect()
    }
}
