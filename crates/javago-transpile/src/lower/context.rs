//! The value threaded through every lowering call.

use crate::ir::GoType;
use crate::resolve::{TypeEnv, TypeIndex};
use crate::scope::{ClassScope, Definition, FileScope};

/// A name bound inside a body that the scope tree does not know about
/// (lambda parameters).
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub original_name: String,
    pub name: String,
    pub ty: Option<GoType>,
}

/// Where lowering currently is. Cloned for every nested declaration so
/// that a change made while lowering one branch never leaks into its
/// siblings.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    pub file_id: &'a str,
    pub file: &'a FileScope,
    pub class: &'a ClassScope,
    /// Classes enclosing `class`, outermost first.
    pub enclosing: Vec<&'a ClassScope>,
    /// Nearest enclosing method or constructor, `None` in field initializers.
    pub method: Option<&'a Definition>,
    pub in_constructor: bool,
    /// Inside a static method, static initializer or static field.
    pub is_static: bool,
    pub bindings: Vec<Binding>,
}

impl<'a> Context<'a> {
    pub fn new(file_id: &'a str, file: &'a FileScope, class: &'a ClassScope) -> Self {
        Self {
            file_id,
            file,
            class,
            enclosing: Vec::new(),
            method: None,
            in_constructor: false,
            is_static: false,
            bindings: Vec::new(),
        }
    }

    /// Descend into a nested class.
    pub fn nested(&self, class: &'a ClassScope) -> Self {
        let mut enclosing = self.enclosing.clone();
        enclosing.push(self.class);
        Self {
            enclosing,
            ..Self::new(self.file_id, self.file, class)
        }
    }

    /// Enter a method or constructor body.
    pub fn in_method(&self, method: &'a Definition) -> Self {
        Self {
            method: Some(method),
            in_constructor: method.is_constructor,
            is_static: method.is_static,
            bindings: Vec::new(),
            ..self.clone()
        }
    }

    pub fn in_static(&self) -> Self {
        Self {
            is_static: true,
            ..self.clone()
        }
    }

    pub fn with_bindings(&self, bindings: impl IntoIterator<Item = Binding>) -> Self {
        let mut ctx = self.clone();
        ctx.bindings.extend(bindings);
        ctx
    }

    pub fn package(&self) -> &'a str {
        &self.file.package
    }

    /// Type environment of the current file, with every enclosing class's
    /// generic parameters in scope.
    pub fn type_env<'i>(&self, index: &'i TypeIndex) -> TypeEnv<'i>
    where
        'a: 'i,
    {
        let type_params = self
            .enclosing
            .iter()
            .chain(std::iter::once(&self.class))
            .flat_map(|c| c.type_parameters.iter().cloned())
            .collect();
        TypeEnv {
            index,
            file_id: self.file_id,
            package: &self.file.package,
            imports: &self.file.imports,
            wildcard_imports: &self.file.wildcard_imports,
            type_params,
        }
    }

    /// A lambda parameter or local variable by its Java name, as seen from
    /// byte offset `at` in the source.
    pub fn local(&self, original_name: &str, at: usize) -> Option<(String, Option<GoType>)> {
        if let Some(binding) = self
            .bindings
            .iter()
            .rev()
            .find(|b| b.original_name == original_name)
        {
            return Some((binding.name.clone(), binding.ty.clone()));
        }
        self.method
            .and_then(|m| m.lookup_local(original_name, at))
            .map(|def| (def.name.clone(), def.ty.go_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ClassKind, Definition};

    #[test]
    fn test_bindings_shadow_locals_and_do_not_leak() {
        let class = ClassScope::new(Definition::new("A", "", true), ClassKind::Class);
        let file = FileScope::default();
        let mut method = Definition::new("f", "", true);
        method.children.push(Definition::local("x", "int"));

        let ctx = Context::new("A.java", &file, &class);
        let body = ctx.in_method(&method);
        assert_eq!(body.local("x", 0).map(|(n, _)| n), Some("x".to_string()));

        let lambda = body.with_bindings([Binding {
            original_name: "x".into(),
            name: "x".into(),
            ty: Some(GoType::Any),
        }]);
        assert_eq!(lambda.local("x", 0), Some(("x".to_string(), Some(GoType::Any))));
        assert_eq!(body.bindings.len(), 0);
        assert!(ctx.local("x", 0).is_none());
    }

    #[test]
    fn test_nested_keeps_enclosing_chain() {
        let outer = ClassScope::new(Definition::new("Outer", "", true), ClassKind::Class);
        let inner = ClassScope::new(
            Definition::with_name("Inner", "", "OuterInner".into()),
            ClassKind::Class,
        );
        let file = FileScope::default();
        let ctx = Context::new("Outer.java", &file, &outer);
        let nested = ctx.nested(&inner);
        assert_eq!(nested.class.class.name, "OuterInner");
        assert_eq!(nested.enclosing.len(), 1);
        assert!(ctx.enclosing.is_empty());
    }
}
