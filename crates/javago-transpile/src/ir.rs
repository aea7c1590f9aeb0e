//! Go declaration tree produced by lowering.
//!
//! One [`GoFile`] is produced per Java source file. The tree is purely
//! structural: names are already resolved and renamed, types are already
//! Go types. Rendering to text is the writer's job (see `output`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Go type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoType {
    /// `int`, `Test`, `util.Node`. `package` is the Go package qualifier
    /// for types declared in another package.
    Named {
        package: Option<String>,
        name: String,
    },
    Pointer(Box<GoType>),
    Slice(Box<GoType>),
    Map(Box<GoType>, Box<GoType>),
    /// Erased generics and `Object`.
    Any,
}

impl GoType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            package: None,
            name: name.into(),
        }
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named {
            package: Some(package.into()),
            name: name.into(),
        }
    }

    pub fn pointer(inner: GoType) -> Self {
        Self::Pointer(Box::new(inner))
    }

    pub fn slice(elem: GoType) -> Self {
        Self::Slice(Box::new(elem))
    }

    pub fn map(key: GoType, value: GoType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn is_named(&self, expected: &str) -> bool {
        matches!(self, Self::Named { package: None, name } if name == expected)
    }

    pub fn is_string(&self) -> bool {
        self.is_named("string")
    }

    /// Element type of a slice.
    pub fn elem(&self) -> Option<&GoType> {
        match self {
            Self::Slice(elem) => Some(elem),
            _ => None,
        }
    }

    /// Whether values of this type are numbers, booleans or strings.
    pub fn is_basic(&self) -> bool {
        match self {
            Self::Named {
                package: None,
                name,
            } => BASIC_TYPES.contains(&name.as_str()),
            _ => false,
        }
    }

    /// The struct or interface name behind a (possibly pointer) named type.
    pub fn declared_name(&self) -> Option<(Option<&str>, &str)> {
        match self {
            Self::Pointer(inner) => inner.declared_name(),
            Self::Named { package, name } if !self.is_basic() => {
                Some((package.as_deref(), name.as_str()))
            }
            _ => None,
        }
    }
}

const BASIC_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint8", "byte", "rune",
    "float32", "float64",
];

impl fmt::Display for GoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named {
                package: Some(pkg),
                name,
            } => write!(f, "{pkg}.{name}"),
            Self::Named {
                package: None,
                name,
            } => f.write_str(name),
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Map(key, value) => write!(f, "map[{key}]{value}"),
            Self::Any => f.write_str("any"),
        }
    }
}

/// One output unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoFile {
    pub package: String,
    /// Import paths, sorted.
    pub imports: Vec<String>,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decl {
    /// `var ( ... )` group of package-level variables.
    Var(Vec<VarSpec>),
    Struct(StructDecl),
    Interface(InterfaceDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    pub name: String,
    pub ty: Option<GoType>,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    /// Embedded types (the lowered superclass).
    pub embeds: Vec<GoType>,
    pub fields: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub methods: Vec<MethodSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<Param>,
    pub result: Option<GoType>,
}

/// A name/type pair: parameters, receivers, struct fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: GoType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: GoType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: String,
    /// Generic type parameters, each constrained by `any`.
    pub type_params: Vec<String>,
    pub receiver: Option<Param>,
    pub params: Vec<Param>,
    pub result: Option<GoType>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Expr(Expr),
    /// `var name T = value`
    Var {
        name: String,
        ty: Option<GoType>,
        value: Option<Expr>,
    },
    /// `a, b := x, y`
    Define {
        names: Vec<String>,
        values: Vec<Expr>,
    },
    /// `a, b = x, y` or `a += x`
    Assign {
        targets: Vec<Expr>,
        op: AssignOp,
        values: Vec<Expr>,
    },
    IncDec {
        target: Expr,
        increment: bool,
    },
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        /// Either another `If` or a `Block`.
        otherwise: Option<Box<Stmt>>,
    },
    /// Three-clause, condition-only, or unconditional loop.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Range {
        key: Option<String>,
        value: Option<String>,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Switch {
        tag: Option<Expr>,
        cases: Vec<CaseClause>,
    },
    Return(Option<Expr>),
    Break(Option<String>),
    Continue(Option<String>),
    Fallthrough,
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    /// Empty for `default`.
    pub values: Vec<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Ident(String),
    Literal(Literal),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Paren(Box<Expr>),
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Selector {
        expr: Box<Expr>,
        name: String,
    },
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
    },
    /// `expr[low:]`
    SliceFrom {
        expr: Box<Expr>,
        low: Box<Expr>,
    },
    /// `T{a, b}`
    Composite {
        ty: GoType,
        elems: Vec<Expr>,
    },
    AddressOf(Box<Expr>),
    /// `expr.(T)`
    TypeAssert {
        expr: Box<Expr>,
        ty: GoType,
    },
    /// `T(expr)`
    Convert {
        ty: GoType,
        expr: Box<Expr>,
    },
    /// A type in expression position, e.g. the first argument of `make`.
    Type(GoType),
    FuncLit {
        params: Vec<Param>,
        result: Option<GoType>,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(String),
    Float(String),
    Rune(String),
    /// Interpreted string, stored with its quotes.
    Str(String),
    /// Raw string, stored without the backquotes.
    RawStr(String),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::And => "&&",
            Self::Or => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Go operator precedence, 5 binds tightest.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Mul | Self::Div | Self::Rem | Self::Shl | Self::Shr | Self::BitAnd => 5,
            Self::Add | Self::Sub | Self::BitOr | Self::BitXor => 4,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 3,
            Self::And => 2,
            Self::Or => 1,
        }
    }

    /// Java spelling to Go operator. `>>>` has no Go counterpart; the
    /// lowerer shifts an unsigned conversion instead.
    pub fn from_java(op: &str) -> Option<Self> {
        Some(match op {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            "&&" => Self::And,
            "||" => Self::Or,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    /// Pointer dereference, never produced from Java operators.
    Deref,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Plus => "+",
            Self::Not => "!",
            Self::BitNot => "^",
            Self::Deref => "*",
        }
    }

    pub fn from_java(op: &str) -> Option<Self> {
        Some(match op {
            "-" => Self::Neg,
            "+" => Self::Plus,
            "!" => Self::Not,
            "~" => Self::BitNot,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Rem => "%=",
            Self::BitAnd => "&=",
            Self::BitOr => "|=",
            Self::BitXor => "^=",
            Self::Shl => "<<=",
            Self::Shr => ">>=",
        }
    }

    pub fn from_java(op: &str) -> Option<Self> {
        Some(match op {
            "=" => Self::Assign,
            "+=" => Self::Add,
            "-=" => Self::Sub,
            "*=" => Self::Mul,
            "/=" => Self::Div,
            "%=" => Self::Rem,
            "&=" => Self::BitAnd,
            "|=" => Self::BitOr,
            "^=" => Self::BitXor,
            "<<=" => Self::Shl,
            ">>=" => Self::Shr,
            _ => return None,
        })
    }
}

// Builder helpers

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn int(value: impl Into<String>) -> Self {
        Self::Literal(Literal::Int(value.into()))
    }

    /// Interpreted string literal from unquoted text.
    pub fn string(value: &str) -> Self {
        Self::Literal(Literal::Str(format!("{value:?}")))
    }

    pub fn bool(value: bool) -> Self {
        Self::Literal(Literal::Bool(value))
    }

    pub fn nil() -> Self {
        Self::Literal(Literal::Nil)
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Self::unary(UnaryOp::Not, Self::paren(operand))
    }

    pub fn paren(inner: Expr) -> Self {
        match inner {
            already @ Self::Paren(_) => already,
            other => Self::Paren(Box::new(other)),
        }
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Self {
        Self::Call {
            func: Box::new(func),
            args,
        }
    }

    /// Call of a package function, e.g. `fmt.Println(args)`.
    pub fn pkg_call(package: &str, func: &str, args: Vec<Expr>) -> Self {
        Self::call(Self::selector(Self::ident(package), func), args)
    }

    pub fn selector(expr: Expr, name: impl Into<String>) -> Self {
        Self::Selector {
            expr: Box::new(expr),
            name: name.into(),
        }
    }

    pub fn index(expr: Expr, index: Expr) -> Self {
        Self::Index {
            expr: Box::new(expr),
            index: Box::new(index),
        }
    }

    pub fn composite(ty: GoType, elems: Vec<Expr>) -> Self {
        Self::Composite { ty, elems }
    }

    pub fn deref(expr: Expr) -> Self {
        Self::unary(UnaryOp::Deref, expr)
    }

    pub fn address_of(expr: Expr) -> Self {
        Self::AddressOf(Box::new(expr))
    }

    pub fn type_assert(expr: Expr, ty: GoType) -> Self {
        Self::TypeAssert {
            expr: Box::new(expr),
            ty,
        }
    }

    pub fn convert(ty: GoType, expr: Expr) -> Self {
        Self::Convert {
            ty,
            expr: Box::new(expr),
        }
    }

    /// `make(T, args...)`
    pub fn make(ty: GoType, args: Vec<Expr>) -> Self {
        let mut all = vec![Self::Type(ty)];
        all.extend(args);
        Self::call(Self::ident("make"), all)
    }
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr(expr)
    }

    pub fn var(name: impl Into<String>, ty: Option<GoType>, value: Option<Expr>) -> Self {
        Self::Var {
            name: name.into(),
            ty,
            value,
        }
    }

    pub fn define(name: impl Into<String>, value: Expr) -> Self {
        Self::Define {
            names: vec![name.into()],
            values: vec![value],
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign {
            targets: vec![target],
            op: AssignOp::Assign,
            values: vec![value],
        }
    }

    pub fn if_stmt(cond: Expr, then: Vec<Stmt>, otherwise: Option<Stmt>) -> Self {
        Self::If {
            cond,
            then,
            otherwise: otherwise.map(Box::new),
        }
    }

    pub fn loop_forever(body: Vec<Stmt>) -> Self {
        Self::For {
            init: None,
            cond: None,
            post: None,
            body,
        }
    }

    pub fn return_stmt(value: Option<Expr>) -> Self {
        Self::Return(value)
    }

    /// `panic(value)`
    pub fn panic(value: Expr) -> Self {
        Self::Expr(Expr::call(Expr::ident("panic"), vec![value]))
    }

    /// `var` and `:=` introduce a name into the enclosing block.
    pub fn declares(&self) -> bool {
        matches!(self, Self::Var { .. } | Self::Define { .. })
    }

    /// Whether control cannot fall off the end of this statement.
    pub fn is_terminating(&self) -> bool {
        match self {
            Self::Return(_) | Self::Break(_) | Self::Continue(_) | Self::Fallthrough => true,
            Self::Expr(Expr::Call { func, .. }) => matches!(func.as_ref(), Expr::Ident(n) if n == "panic"),
            Self::Block(stmts) => stmts.last().is_some_and(Stmt::is_terminating),
            Self::If {
                then,
                otherwise: Some(otherwise),
                ..
            } => then.last().is_some_and(Stmt::is_terminating) && otherwise.is_terminating(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(GoType::pointer(GoType::named("Test")).to_string(), "*Test");
        assert_eq!(
            GoType::map(GoType::named("string"), GoType::slice(GoType::named("int"))).to_string(),
            "map[string][]int"
        );
        assert_eq!(GoType::qualified("util", "Node").to_string(), "util.Node");
        assert_eq!(GoType::slice(GoType::Any).to_string(), "[]any");
    }

    #[test]
    fn test_declared_name() {
        let ty = GoType::pointer(GoType::qualified("util", "Node"));
        assert_eq!(ty.declared_name(), Some((Some("util"), "Node")));
        assert_eq!(GoType::named("int").declared_name(), None);
    }

    #[test]
    fn test_operator_mapping() {
        assert_eq!(BinaryOp::from_java(">>"), Some(BinaryOp::Shr));
        assert!(BinaryOp::from_java(">>>").is_none());
        assert!(AssignOp::from_java(">>>=").is_none());
        assert_eq!(UnaryOp::from_java("~").map(UnaryOp::as_str), Some("^"));
        assert_eq!(AssignOp::from_java("+=").map(AssignOp::as_str), Some("+="));
        assert!(BinaryOp::from_java("instanceof").is_none());
    }

    #[test]
    fn test_terminating() {
        assert!(Stmt::Return(None).is_terminating());
        assert!(Stmt::panic(Expr::string("x")).is_terminating());
        assert!(!Stmt::expr(Expr::ident("x")).is_terminating());
    }
}
