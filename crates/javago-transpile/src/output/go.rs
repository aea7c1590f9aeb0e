//! Go writer for the lowered declaration tree.
//!
//! Output follows gofmt layout (tabs, one declaration per paragraph) so
//! that running gofmt over it changes little. Parentheses are inserted from
//! operator precedence; explicit `Paren` nodes are kept.

use crate::ir::*;
use crate::traits::Writer;

/// Static instance of the Go writer for registry.
pub static GO_WRITER: GoWriterImpl = GoWriterImpl;

/// Go writer implementing the Writer trait.
pub struct GoWriterImpl;

impl Writer for GoWriterImpl {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extension(&self) -> &'static str {
        "go"
    }

    fn write(&self, file: &GoFile) -> String {
        GoWriter::emit(file)
    }
}

/// Binding strength of unary operators, above every binary operator.
const UNARY_PRECEDENCE: u8 = 6;

/// Emits a [`GoFile`] as Go source code.
pub struct GoWriter {
    output: String,
    indent: usize,
}

impl GoWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    /// Emit a file to Go source.
    pub fn emit(file: &GoFile) -> String {
        let mut writer = Self::new();
        writer.write_file(file);
        writer.output
    }

    /// Emit a single declaration, without package clause or imports.
    pub fn emit_decl(decl: &Decl) -> String {
        let mut writer = Self::new();
        writer.write_decl(decl);
        writer.output
    }

    fn write_file(&mut self, file: &GoFile) {
        self.output.push_str("package ");
        self.output.push_str(&file.package);
        self.output.push('\n');

        match file.imports.as_slice() {
            [] => {}
            [single] => {
                self.output.push_str("\nimport \"");
                self.output.push_str(single);
                self.output.push_str("\"\n");
            }
            several => {
                self.output.push_str("\nimport (\n");
                for path in several {
                    self.output.push_str("\t\"");
                    self.output.push_str(path);
                    self.output.push_str("\"\n");
                }
                self.output.push_str(")\n");
            }
        }

        for decl in &file.decls {
            self.output.push('\n');
            self.write_decl(decl);
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push('\t');
        }
    }

    fn write_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(specs) => match specs.as_slice() {
                [spec] => {
                    self.output.push_str("var ");
                    self.write_var_spec(spec);
                    self.output.push('\n');
                }
                _ => {
                    self.output.push_str("var (\n");
                    self.indent += 1;
                    for spec in specs {
                        self.write_indent();
                        self.write_var_spec(spec);
                        self.output.push('\n');
                    }
                    self.indent -= 1;
                    self.output.push_str(")\n");
                }
            },

            Decl::Struct(decl) => {
                self.output.push_str("type ");
                self.output.push_str(&decl.name);
                if decl.embeds.is_empty() && decl.fields.is_empty() {
                    self.output.push_str(" struct{}\n");
                    return;
                }
                self.output.push_str(" struct {\n");
                for embed in &decl.embeds {
                    self.output.push('\t');
                    self.write_type(embed);
                    self.output.push('\n');
                }
                for field in &decl.fields {
                    self.output.push('\t');
                    self.write_param(field);
                    self.output.push('\n');
                }
                self.output.push_str("}\n");
            }

            Decl::Interface(decl) => {
                self.output.push_str("type ");
                self.output.push_str(&decl.name);
                if decl.methods.is_empty() {
                    self.output.push_str(" interface{}\n");
                    return;
                }
                self.output.push_str(" interface {\n");
                for method in &decl.methods {
                    self.output.push('\t');
                    self.output.push_str(&method.name);
                    self.write_signature(&method.params, method.result.as_ref());
                    self.output.push('\n');
                }
                self.output.push_str("}\n");
            }

            Decl::Func(func) => {
                self.output.push_str("func ");
                if let Some(receiver) = &func.receiver {
                    self.output.push('(');
                    self.write_param(receiver);
                    self.output.push_str(") ");
                }
                self.output.push_str(&func.name);
                if !func.type_params.is_empty() {
                    self.output.push('[');
                    self.output.push_str(&func.type_params.join(", "));
                    self.output.push_str(" any]");
                }
                self.write_signature(&func.params, func.result.as_ref());
                self.output.push(' ');
                self.write_body(&func.body);
                self.output.push('\n');
            }
        }
    }

    fn write_var_spec(&mut self, spec: &VarSpec) {
        self.output.push_str(&spec.name);
        if let Some(ty) = &spec.ty {
            self.output.push(' ');
            self.write_type(ty);
        }
        if let Some(value) = &spec.value {
            self.output.push_str(" = ");
            self.write_expr(value);
        }
    }

    fn write_param(&mut self, param: &Param) {
        self.output.push_str(&param.name);
        self.output.push(' ');
        self.write_type(&param.ty);
    }

    fn write_signature(&mut self, params: &[Param], result: Option<&GoType>) {
        self.output.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.write_param(param);
        }
        self.output.push(')');
        if let Some(result) = result {
            self.output.push(' ');
            self.write_type(result);
        }
    }

    fn write_type(&mut self, ty: &GoType) {
        self.output.push_str(&ty.to_string());
    }

    /// `{`, the statements one level deeper, then `}` at the current level.
    fn write_body(&mut self, body: &[Stmt]) {
        self.output.push_str("{\n");
        self.indent += 1;
        for stmt in body {
            self.write_stmt(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.output.push('}');
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Labeled { label, body } = stmt {
            // gofmt outdents labels by one level.
            for _ in 0..self.indent.saturating_sub(1) {
                self.output.push('\t');
            }
            self.output.push_str(label);
            self.output.push_str(":\n");
            self.write_stmt(body);
            return;
        }
        self.write_indent();
        self.write_simple_or_compound(stmt);
        self.output.push('\n');
    }

    fn write_simple_or_compound(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.write_expr(expr),

            Stmt::Var { name, ty, value } => {
                self.output.push_str("var ");
                self.write_var_spec(&VarSpec {
                    name: name.clone(),
                    ty: ty.clone(),
                    value: value.clone(),
                });
            }

            Stmt::Define { names, values } => {
                self.output.push_str(&names.join(", "));
                self.output.push_str(" := ");
                self.write_list(values);
            }

            Stmt::Assign {
                targets,
                op,
                values,
            } => {
                self.write_list(targets);
                self.output.push(' ');
                self.output.push_str(op.as_str());
                self.output.push(' ');
                self.write_list(values);
            }

            Stmt::IncDec { target, increment } => {
                self.write_expr(target);
                self.output.push_str(if *increment { "++" } else { "--" });
            }

            Stmt::Block(stmts) => self.write_body(stmts),

            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.output.push_str("if ");
                self.write_expr(cond);
                self.output.push(' ');
                self.write_body(then);
                match otherwise.as_deref() {
                    None => {}
                    Some(nested @ Stmt::If { .. }) => {
                        self.output.push_str(" else ");
                        self.write_simple_or_compound(nested);
                    }
                    Some(Stmt::Block(stmts)) => {
                        self.output.push_str(" else ");
                        self.write_body(stmts);
                    }
                    Some(other) => {
                        self.output.push_str(" else ");
                        self.write_body(std::slice::from_ref(other));
                    }
                }
            }

            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                self.output.push_str("for ");
                match (init, cond, post) {
                    (None, None, None) => {}
                    (None, Some(cond), None) => {
                        self.write_expr(cond);
                        self.output.push(' ');
                    }
                    _ => {
                        if let Some(init) = init {
                            self.write_simple_or_compound(init);
                        }
                        self.output.push_str("; ");
                        if let Some(cond) = cond {
                            self.write_expr(cond);
                        }
                        self.output.push_str("; ");
                        if let Some(post) = post {
                            self.write_simple_or_compound(post);
                        }
                        self.output.push(' ');
                    }
                }
                self.write_body(body);
            }

            Stmt::Range {
                key,
                value,
                iterable,
                body,
            } => {
                self.output.push_str("for ");
                match (key, value) {
                    (None, None) => {}
                    (Some(key), None) => {
                        self.output.push_str(key);
                        self.output.push_str(" := ");
                    }
                    (key, Some(value)) => {
                        self.output.push_str(key.as_deref().unwrap_or("_"));
                        self.output.push_str(", ");
                        self.output.push_str(value);
                        self.output.push_str(" := ");
                    }
                }
                self.output.push_str("range ");
                self.write_expr(iterable);
                self.output.push(' ');
                self.write_body(body);
            }

            Stmt::Switch { tag, cases } => {
                self.output.push_str("switch ");
                if let Some(tag) = tag {
                    self.write_expr(tag);
                    self.output.push(' ');
                }
                self.output.push_str("{\n");
                for case in cases {
                    self.write_indent();
                    if case.values.is_empty() {
                        self.output.push_str("default:\n");
                    } else {
                        self.output.push_str("case ");
                        self.write_list(&case.values);
                        self.output.push_str(":\n");
                    }
                    self.indent += 1;
                    for stmt in &case.body {
                        self.write_stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.write_indent();
                self.output.push('}');
            }

            Stmt::Return(value) => {
                self.output.push_str("return");
                if let Some(value) = value {
                    self.output.push(' ');
                    self.write_expr(value);
                }
            }

            Stmt::Break(label) => self.write_jump("break", label.as_deref()),
            Stmt::Continue(label) => self.write_jump("continue", label.as_deref()),
            Stmt::Fallthrough => self.output.push_str("fallthrough"),

            Stmt::Labeled { label, body } => {
                self.output.push_str(label);
                self.output.push_str(": ");
                self.write_simple_or_compound(body);
            }
        }
    }

    fn write_jump(&mut self, keyword: &str, label: Option<&str>) {
        self.output.push_str(keyword);
        if let Some(label) = label {
            self.output.push(' ');
            self.output.push_str(label);
        }
    }

    fn write_list(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.write_expr(expr);
        }
    }

    fn write_expr(&mut self, expr: &Expr) {
        self.write_expr_prec(expr, 0);
    }

    /// Write `expr`, parenthesized when it binds looser than `min`.
    fn write_expr_prec(&mut self, expr: &Expr, min: u8) {
        match expr {
            Expr::Binary { left, op, right } => {
                let prec = op.precedence();
                let wrap = prec < min;
                if wrap {
                    self.output.push('(');
                }
                self.write_expr_prec(left, prec);
                self.output.push(' ');
                self.output.push_str(op.as_str());
                self.output.push(' ');
                self.write_expr_prec(right, prec + 1);
                if wrap {
                    self.output.push(')');
                }
            }

            Expr::Unary { op, operand } => {
                self.output.push_str(op.as_str());
                // `- -x` must not print as `--x`.
                if matches!(operand.as_ref(), Expr::Unary { .. }) {
                    self.output.push('(');
                    self.write_expr(operand);
                    self.output.push(')');
                } else {
                    self.write_expr_prec(operand, UNARY_PRECEDENCE);
                }
            }

            Expr::AddressOf(inner) => {
                self.output.push('&');
                self.write_expr_prec(inner, UNARY_PRECEDENCE);
            }

            _ => self.write_primary(expr),
        }
    }

    /// Operand of a selector, index, call or assertion.
    fn write_operand(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary { .. } | Expr::Unary { .. } | Expr::AddressOf(_) => {
                self.output.push('(');
                self.write_expr(expr);
                self.output.push(')');
            }
            _ => self.write_primary(expr),
        }
    }

    fn write_primary(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(name) => self.output.push_str(name),
            Expr::Literal(literal) => self.write_literal(literal),

            Expr::Paren(inner) => {
                self.output.push('(');
                self.write_expr(inner);
                self.output.push(')');
            }

            Expr::Call { func, args } => {
                self.write_operand(func);
                self.output.push('(');
                self.write_list(args);
                self.output.push(')');
            }

            Expr::Selector { expr, name } => {
                self.write_operand(expr);
                self.output.push('.');
                self.output.push_str(name);
            }

            Expr::Index { expr, index } => {
                self.write_operand(expr);
                self.output.push('[');
                self.write_expr(index);
                self.output.push(']');
            }

            Expr::SliceFrom { expr, low } => {
                self.write_operand(expr);
                self.output.push('[');
                self.write_expr(low);
                self.output.push_str(":]");
            }

            Expr::Composite { ty, elems } => {
                self.write_type(ty);
                self.output.push('{');
                self.write_list(elems);
                self.output.push('}');
            }

            Expr::TypeAssert { expr, ty } => {
                self.write_operand(expr);
                self.output.push_str(".(");
                self.write_type(ty);
                self.output.push(')');
            }

            Expr::Convert { ty, expr } => {
                // `*T(x)` would dereference the conversion.
                if matches!(ty, GoType::Pointer(_)) {
                    self.output.push('(');
                    self.write_type(ty);
                    self.output.push(')');
                } else {
                    self.write_type(ty);
                }
                self.output.push('(');
                self.write_expr(expr);
                self.output.push(')');
            }

            Expr::Type(ty) => self.write_type(ty),

            Expr::FuncLit {
                params,
                result,
                body,
            } => {
                self.output.push_str("func");
                self.write_signature(params, result.as_ref());
                self.output.push(' ');
                self.write_body(body);
            }

            Expr::Binary { .. } | Expr::Unary { .. } | Expr::AddressOf(_) => {
                self.write_operand(expr)
            }
        }
    }

    fn write_literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Int(text) | Literal::Float(text) | Literal::Rune(text) | Literal::Str(text) => {
                self.output.push_str(text)
            }
            Literal::RawStr(text) => {
                self.output.push('`');
                self.output.push_str(text);
                self.output.push('`');
            }
            Literal::Bool(true) => self.output.push_str("true"),
            Literal::Bool(false) => self.output.push_str("false"),
            Literal::Nil => self.output.push_str("nil"),
        }
    }
}

impl Default for GoWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(name: &str, body: Vec<Stmt>) -> Decl {
        Decl::Func(FuncDecl {
            name: name.into(),
            type_params: Vec::new(),
            receiver: None,
            params: Vec::new(),
            result: None,
            body,
        })
    }

    #[test]
    fn test_file_layout() {
        let file = GoFile {
            package: "main".into(),
            imports: vec!["fmt".into(), "os".into()],
            decls: vec![
                Decl::Struct(StructDecl {
                    name: "Test".into(),
                    embeds: Vec::new(),
                    fields: vec![Param::new("value", GoType::named("int"))],
                }),
                func(
                    "main",
                    vec![Stmt::expr(Expr::pkg_call("fmt", "Println", vec![Expr::int("1")]))],
                ),
            ],
        };
        assert_eq!(
            GoWriter::emit(&file),
            "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\n\
             type Test struct {\n\tvalue int\n}\n\n\
             func main() {\n\tfmt.Println(1)\n}\n"
        );
    }

    #[test]
    fn test_precedence_parentheses() {
        let sum = Expr::binary(Expr::ident("a"), BinaryOp::Add, Expr::ident("b"));
        let product = Expr::binary(sum.clone(), BinaryOp::Mul, Expr::ident("c"));
        let right = Expr::binary(Expr::ident("c"), BinaryOp::Sub, sum);
        let decl = func(
            "f",
            vec![Stmt::expr(Expr::call(Expr::ident("g"), vec![product, right]))],
        );
        assert_eq!(
            GoWriter::emit_decl(&decl),
            "func f() {\n\tg((a + b) * c, c - (a + b))\n}\n"
        );
    }

    #[test]
    fn test_pointer_conversion_and_deref() {
        let stmt = Stmt::assign(
            Expr::selector(Expr::ident("this"), "Base"),
            Expr::deref(Expr::call(Expr::ident("NewBase"), Vec::new())),
        );
        let convert = Stmt::expr(Expr::call(
            Expr::ident("use"),
            vec![Expr::convert(
                GoType::pointer(GoType::named("T")),
                Expr::ident("x"),
            )],
        ));
        let out = GoWriter::emit_decl(&func("f", vec![stmt, convert]));
        assert!(out.contains("this.Base = *NewBase()"));
        assert!(out.contains("use((*T)(x))"));
    }

    #[test]
    fn test_control_flow() {
        let body = vec![
            Stmt::For {
                init: Some(Box::new(Stmt::define("i", Expr::int("0")))),
                cond: Some(Expr::binary(Expr::ident("i"), BinaryOp::Lt, Expr::int("3"))),
                post: Some(Box::new(Stmt::IncDec {
                    target: Expr::ident("i"),
                    increment: true,
                })),
                body: vec![Stmt::Switch {
                    tag: Some(Expr::ident("i")),
                    cases: vec![
                        CaseClause {
                            values: vec![Expr::int("1")],
                            body: vec![Stmt::Fallthrough],
                        },
                        CaseClause {
                            values: Vec::new(),
                            body: vec![Stmt::Break(None)],
                        },
                    ],
                }],
            },
            Stmt::loop_forever(vec![Stmt::if_stmt(
                Expr::not(Expr::ident("done")),
                vec![Stmt::Break(None)],
                None,
            )]),
        ];
        assert_eq!(
            GoWriter::emit_decl(&func("f", body)),
            "func f() {\n\
             \tfor i := 0; i < 3; i++ {\n\
             \t\tswitch i {\n\
             \t\tcase 1:\n\
             \t\t\tfallthrough\n\
             \t\tdefault:\n\
             \t\t\tbreak\n\
             \t\t}\n\
             \t}\n\
             \tfor {\n\
             \t\tif !(done) {\n\
             \t\t\tbreak\n\
             \t\t}\n\
             \t}\n\
             }\n"
        );
    }

    #[test]
    fn test_labels_are_outdented() {
        let body = vec![Stmt::Labeled {
            label: "outer".into(),
            body: Box::new(Stmt::loop_forever(vec![Stmt::Break(Some("outer".into()))])),
        }];
        assert_eq!(
            GoWriter::emit_decl(&func("f", body)),
            "func f() {\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}\n"
        );
    }

    #[test]
    fn test_generic_helper_signature() {
        let out = GoWriter::emit_decl(&crate::lower::ternary_helper("ternary"));
        assert!(out.starts_with("func ternary[T any](cond bool, a T, b T) T {\n"));
    }

    #[test]
    fn test_writer_trait() {
        assert_eq!(GO_WRITER.language(), "go");
        assert_eq!(GO_WRITER.extension(), "go");
    }
}
