//! Component Discovery
//!
//! Finds the identifier the factory returns from a component source.
//!
//! Priority, over top-level statements only:
//! 1. the `export default` target, when it is a named uppercase declaration
//! 2. the first uppercase function-like declaration
//!    (`function X`, `class X`, `const X = () => ...`, `const X = memo(...)`)
//! 3. the first uppercase declaration of any kind
//!
//! Sources the parser rejects fall back to a line-anchored scan so the
//! transformer still gets to report the real syntax error.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Declaration, ExportDefaultDeclarationKind, Expression, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;

fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Returns the top-level component identifier, if any.
pub fn discover_component_name(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return discover_by_scan(source);
    }

    let mut function_like: Option<String> = None;
    let mut any: Option<String> = None;
    let mut remember = |name: &str, callable: bool| {
        if !is_component_name(name) {
            return;
        }
        if callable && function_like.is_none() {
            function_like = Some(name.to_string());
        }
        if any.is_none() {
            any = Some(name.to_string());
        }
    };

    for stmt in &ret.program.body {
        match stmt {
            Statement::ExportDefaultDeclaration(export) => {
                let name = match &export.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        func.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        class.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::Identifier(ident) => Some(ident.name.to_string()),
                    _ => None,
                };
                if let Some(name) = name.filter(|n| is_component_name(n)) {
                    return Some(name);
                }
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(decl) = &export.declaration {
                    visit_declaration(decl, &mut remember);
                }
            }
            _ => {
                if let Some(decl) = stmt.as_declaration() {
                    visit_declaration(decl, &mut remember);
                }
            }
        }
    }

    function_like.or(any)
}

fn visit_declaration(decl: &Declaration<'_>, remember: &mut impl FnMut(&str, bool)) {
    match decl {
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                remember(&id.name, true);
            }
        }
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                let Some(id) = declarator.id.get_binding_identifier() else {
                    continue;
                };
                let callable = matches!(
                    declarator.init.as_ref().map(Expression::get_inner_expression),
                    Some(
                        Expression::ArrowFunctionExpression(_)
                            | Expression::FunctionExpression(_)
                            | Expression::CallExpression(_)
                    )
                );
                remember(&id.name, callable);
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                remember(&id.name, true);
            }
        }
        _ => {}
    }
}

fn discover_by_scan(source: &str) -> Option<String> {
    lazy_static! {
        static ref DECL_RE: Regex = Regex::new(
            r"(?m)^[ \t]*(?:export[ \t]+(?:default[ \t]+)?)?(?:async[ \t]+)?(?:function[ \t]*\*?|const|let|var|class)[ \t]+([A-Z][A-Za-z0-9_$]*)"
        )
        .unwrap();
    }
    DECL_RE
        .captures(source)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_declaration() {
        assert_eq!(
            discover_component_name("function Foo() { return <div/> }").as_deref(),
            Some("Foo")
        );
    }

    #[test]
    fn test_export_default_wins() {
        let source = r#"
const Helper = () => null;
export default function Page() { return <Helper/> }
"#;
        assert_eq!(discover_component_name(source).as_deref(), Some("Page"));
    }

    #[test]
    fn test_export_default_identifier() {
        let source = "const Theme = { dark: true };\nconst Card = () => <div/>;\nexport default Card;";
        assert_eq!(discover_component_name(source).as_deref(), Some("Card"));
    }

    #[test]
    fn test_function_like_preferred_over_constants() {
        let source = "const COLORS = ['red'];\nconst Badge = memo(() => <span/>);";
        assert_eq!(discover_component_name(source).as_deref(), Some("Badge"));
    }

    #[test]
    fn test_class_components() {
        let source = "const LABELS = {};\nclass Banner extends React.Component { render() { return <p/> } }";
        assert_eq!(discover_component_name(source).as_deref(), Some("Banner"));
        let source = "const Helper = () => null;\nexport default class Page extends React.Component {}";
        assert_eq!(discover_component_name(source).as_deref(), Some("Page"));
    }

    #[test]
    fn test_typescript_annotations() {
        let source = "interface Props { title: string }\nconst Hero: React.FC<Props> = ({ title }) => <h1>{title}</h1>;";
        assert_eq!(discover_component_name(source).as_deref(), Some("Hero"));
    }

    #[test]
    fn test_lowercase_only_is_none() {
        assert_eq!(discover_component_name("function helper() { return 1 }"), None);
        assert_eq!(discover_component_name(""), None);
    }

    #[test]
    fn test_nested_declarations_ignored() {
        let source = "function helper() { function Inner() {} return Inner }";
        assert_eq!(discover_component_name(source), None);
    }

    #[test]
    fn test_syntax_error_falls_back_to_scan() {
        let source = "function Broken() { return <div> }";
        assert_eq!(discover_component_name(source).as_deref(), Some("Broken"));
    }
}
