//! Java syntax access on top of tree-sitter.
//!
//! The extractor and the lowering engine never match on raw kind strings.
//! Every node is first classified into a [`JavaKind`], so the set of
//! constructs we understand is a closed enum and anything else lands in
//! [`JavaKind::Unsupported`].

use crate::error::Error;
use tree_sitter::{Node, Parser, Tree};

/// Parse Java source with the arborium tree-sitter grammar.
pub fn parse_java(source: &str) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_java::language().into())
        .map_err(|err| Error::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::Parse("failed to parse".into()))?;

    if tree.root_node().has_error() {
        return Err(Error::Parse("syntax error in source".into()));
    }
    Ok(tree)
}

/// Closed set of Java node kinds the translator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaKind {
    // Top level
    Program,
    PackageDeclaration,
    ImportDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    RecordDeclaration,
    AnnotationTypeDeclaration,

    // Members
    ClassBody,
    InterfaceBody,
    EnumBody,
    FieldDeclaration,
    ConstantDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    StaticInitializer,
    Modifiers,

    // Statements
    Block,
    ConstructorBody,
    LocalVariableDeclaration,
    LocalClassDeclaration,
    ExpressionStatement,
    IfStatement,
    WhileStatement,
    ForStatement,
    EnhancedForStatement,
    DoStatement,
    SwitchExpression,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    ThrowStatement,
    TryStatement,
    TryWithResourcesStatement,
    SynchronizedStatement,
    LabeledStatement,
    AssertStatement,
    YieldStatement,
    ExplicitConstructorInvocation,
    EmptyStatement,

    // Expressions
    AssignmentExpression,
    BinaryExpression,
    UnaryExpression,
    UpdateExpression,
    TernaryExpression,
    InstanceofExpression,
    CastExpression,
    LambdaExpression,
    MethodReference,
    ParenthesizedExpression,
    ObjectCreationExpression,
    ArrayCreationExpression,
    ArrayInitializer,
    FieldAccess,
    ArrayAccess,
    MethodInvocation,
    ClassLiteral,
    This,
    Super,
    Identifier,

    // Literals
    IntegerLiteral,
    FloatLiteral,
    CharacterLiteral,
    StringLiteral,
    TextBlock,
    True,
    False,
    NullLiteral,

    // Types
    IntegralType,
    FloatingPointType,
    BooleanType,
    VoidType,
    TypeIdentifier,
    ScopedTypeIdentifier,
    GenericType,
    ArrayType,

    Comment,

    /// Anything else. Carries the raw tree-sitter kind for diagnostics.
    Unsupported(&'static str),
}

impl JavaKind {
    pub fn of(node: Node) -> Self {
        match node.kind() {
            "program" => Self::Program,
            "package_declaration" => Self::PackageDeclaration,
            "import_declaration" => Self::ImportDeclaration,
            "class_declaration" => Self::ClassDeclaration,
            "interface_declaration" => Self::InterfaceDeclaration,
            "enum_declaration" => Self::EnumDeclaration,
            "record_declaration" => Self::RecordDeclaration,
            "annotation_type_declaration" => Self::AnnotationTypeDeclaration,

            "class_body" => Self::ClassBody,
            "interface_body" => Self::InterfaceBody,
            "enum_body" => Self::EnumBody,
            "field_declaration" => Self::FieldDeclaration,
            "constant_declaration" => Self::ConstantDeclaration,
            "method_declaration" => Self::MethodDeclaration,
            "constructor_declaration" => Self::ConstructorDeclaration,
            "static_initializer" => Self::StaticInitializer,
            "modifiers" => Self::Modifiers,

            "block" => Self::Block,
            "constructor_body" => Self::ConstructorBody,
            "local_variable_declaration" => Self::LocalVariableDeclaration,
            "local_class_declaration" => Self::LocalClassDeclaration,
            "expression_statement" => Self::ExpressionStatement,
            "if_statement" => Self::IfStatement,
            "while_statement" => Self::WhileStatement,
            "for_statement" => Self::ForStatement,
            "enhanced_for_statement" => Self::EnhancedForStatement,
            "do_statement" => Self::DoStatement,
            "switch_expression" | "switch_statement" => Self::SwitchExpression,
            "return_statement" => Self::ReturnStatement,
            "break_statement" => Self::BreakStatement,
            "continue_statement" => Self::ContinueStatement,
            "throw_statement" => Self::ThrowStatement,
            "try_statement" => Self::TryStatement,
            "try_with_resources_statement" => Self::TryWithResourcesStatement,
            "synchronized_statement" => Self::SynchronizedStatement,
            "labeled_statement" => Self::LabeledStatement,
            "assert_statement" => Self::AssertStatement,
            "yield_statement" => Self::YieldStatement,
            "explicit_constructor_invocation" => Self::ExplicitConstructorInvocation,
            ";" => Self::EmptyStatement,

            "assignment_expression" => Self::AssignmentExpression,
            "binary_expression" => Self::BinaryExpression,
            "unary_expression" => Self::UnaryExpression,
            "update_expression" => Self::UpdateExpression,
            "ternary_expression" => Self::TernaryExpression,
            "instanceof_expression" => Self::InstanceofExpression,
            "cast_expression" => Self::CastExpression,
            "lambda_expression" => Self::LambdaExpression,
            "method_reference" => Self::MethodReference,
            "parenthesized_expression" => Self::ParenthesizedExpression,
            "object_creation_expression" => Self::ObjectCreationExpression,
            "array_creation_expression" => Self::ArrayCreationExpression,
            "array_initializer" => Self::ArrayInitializer,
            "field_access" => Self::FieldAccess,
            "array_access" => Self::ArrayAccess,
            "method_invocation" => Self::MethodInvocation,
            "class_literal" => Self::ClassLiteral,
            "this" => Self::This,
            "super" => Self::Super,
            "identifier" => Self::Identifier,

            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => Self::IntegerLiteral,
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                Self::FloatLiteral
            }
            "character_literal" => Self::CharacterLiteral,
            "string_literal" => Self::StringLiteral,
            "text_block" => Self::TextBlock,
            "true" => Self::True,
            "false" => Self::False,
            "null_literal" => Self::NullLiteral,

            "integral_type" => Self::IntegralType,
            "floating_point_type" => Self::FloatingPointType,
            "boolean_type" => Self::BooleanType,
            "void_type" => Self::VoidType,
            "type_identifier" => Self::TypeIdentifier,
            "scoped_type_identifier" => Self::ScopedTypeIdentifier,
            "generic_type" => Self::GenericType,
            "array_type" => Self::ArrayType,

            "line_comment" | "block_comment" => Self::Comment,

            other => Self::Unsupported(other),
        }
    }

    /// Whether this kind declares a type (class, interface, enum, ...).
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            Self::ClassDeclaration
                | Self::InterfaceDeclaration
                | Self::EnumDeclaration
                | Self::RecordDeclaration
                | Self::AnnotationTypeDeclaration
        )
    }
}

/// Text of a node. Tree-sitter only hands out valid byte ranges of the
/// source we parsed, so the slice cannot fail for `&str` input.
pub fn text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// 1-based line of a node, for diagnostics.
pub fn line(node: Node) -> usize {
    node.start_position().row + 1
}

/// A field the grammar guarantees. Its absence is a grammar mismatch.
pub fn required_field<'t>(node: Node<'t>, field: &str) -> Result<Node<'t>, Error> {
    node.child_by_field_name(field)
        .ok_or_else(|| Error::assertion(node, format!("missing field `{field}`")))
}

/// Name of a declaration, which must be a simple identifier.
pub fn declaration_name<'s>(node: Node, source: &'s str) -> Result<&'s str, Error> {
    let name = required_field(node, "name")?;
    if name.kind() != "identifier" {
        return Err(Error::assertion(
            node,
            format!("declaration name is a `{}`, not an identifier", name.kind()),
        ));
    }
    Ok(text(name, source))
}

/// Named children of a node, collected so callers can keep the borrow short.
pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Modifier list of a declaration: keywords plus annotation names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub keywords: Vec<String>,
    pub annotations: Vec<String>,
}

impl Modifiers {
    /// Read the `modifiers` child of a declaration, if there is one.
    pub fn of(node: Node, source: &str) -> Self {
        let mut mods = Self::default();
        let mut cursor = node.walk();
        let Some(list) = node
            .children(&mut cursor)
            .find(|c| JavaKind::of(*c) == JavaKind::Modifiers)
        else {
            return mods;
        };

        let mut cursor = list.walk();
        for child in list.children(&mut cursor) {
            match child.kind() {
                "marker_annotation" | "annotation" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        let name = text(name, source);
                        // `@org.example.Ignore` matches on its simple name too
                        let simple = name.rsplit('.').next().unwrap_or(name);
                        mods.annotations.push(simple.to_string());
                    }
                }
                _ if !child.is_named() => mods.keywords.push(text(child, source).to_string()),
                _ => {}
            }
        }
        mods
    }

    pub fn has(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    pub fn is_public(&self) -> bool {
        self.has("public")
    }

    pub fn is_static(&self) -> bool {
        self.has("static")
    }

    pub fn is_abstract(&self) -> bool {
        self.has("abstract")
    }

    /// Whether any annotation is in the excluded set.
    pub fn is_excluded(&self, excluded: &[String]) -> bool {
        self.annotations.iter().any(|a| excluded.contains(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_program() {
        let tree = parse_java("class A { int x; }").unwrap();
        let root = tree.root_node();
        assert_eq!(JavaKind::of(root), JavaKind::Program);
        let class = named_children(root)[0];
        assert_eq!(JavaKind::of(class), JavaKind::ClassDeclaration);
        assert!(JavaKind::of(class).is_type_declaration());
    }

    #[test]
    fn test_unknown_kind_is_unsupported() {
        let tree = parse_java("class A { Runnable r = String::valueOf; }").unwrap();
        let source = "class A { Runnable r = String::valueOf; }";
        let class = named_children(tree.root_node())[0];
        let body = required_field(class, "body").unwrap();
        let field = named_children(body)[0];
        let decl = required_field(field, "declarator").unwrap();
        let value = required_field(decl, "value").unwrap();
        assert_eq!(JavaKind::of(value), JavaKind::MethodReference);
        assert_eq!(text(value, source), "String::valueOf");
    }

    #[test]
    fn test_modifiers() {
        let source = "class A { @Ignore public static final int X = 1; }";
        let tree = parse_java(source).unwrap();
        let class = named_children(tree.root_node())[0];
        let body = required_field(class, "body").unwrap();
        let field = named_children(body)[0];
        let mods = Modifiers::of(field, source);
        assert!(mods.is_public());
        assert!(mods.is_static());
        assert!(mods.has("final"));
        assert!(mods.is_excluded(&["Ignore".to_string()]));
        assert!(!mods.is_excluded(&["Deprecated".to_string()]));
    }

    #[test]
    fn test_syntax_error_rejected() {
        assert!(matches!(parse_java("class {"), Err(Error::Parse(_))));
    }
}
