//! Source Transformer
//!
//! Turns stored component source (TypeScript + JSX, module syntax) into a
//! plain function body the factory can evaluate:
//!
//! 1. `strip_module_syntax` removes imports, directives and `export` keywords
//! 2. oxc parses the rest as TSX, erases types and lowers JSX to
//!    `React.createElement(...)` calls (classic runtime)
//! 3. codegen prints plain JavaScript
//!
//! Transform failures are values, not errors: `TransformOutput { code: "", error: Some(..) }`.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOutput {
    pub code: String,
    pub error: Option<String>,
}

impl TransformOutput {
    pub fn ok(code: String) -> Self {
        TransformOutput { code, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        TransformOutput {
            code: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Compiles component source into an evaluable function body.
pub trait SourceTransformer: Send + Sync {
    fn transform(&self, source: &str) -> TransformOutput;
}

/// The oxc-backed transformer used in production.
#[derive(Debug, Clone, Default)]
pub struct OxcTransformer;

impl SourceTransformer for OxcTransformer {
    fn transform(&self, source: &str) -> TransformOutput {
        transform_source(source)
    }
}

lazy_static! {
    static ref IMPORT_STMT_RE: Regex = Regex::new(
        r#"(?m)(^|;)[ \t]*import[ \t]+(?:type[ \t]+)?[^'";]*?[ \t\r\n]*from[ \t]*['"][^'"\r\n]+['"]"#
    )
    .unwrap();
    // The terminating `;` stays behind as the anchor for a following import.
    static ref SIDE_EFFECT_IMPORT_RE: Regex =
        Regex::new(r#"(?m)(^|;)[ \t]*import[ \t]*['"][^'"\r\n]+['"]"#).unwrap();
    static ref DIRECTIVE_RE: Regex =
        Regex::new(r#"(?m)^[ \t]*['"]use [a-z ]+['"][ \t]*;?[ \t]*$"#).unwrap();
    static ref EXPORT_RE: Regex =
        Regex::new(r"(?m)(^[ \t]*|;[ \t]*)export[ \t]+(?:default[ \t]+)?").unwrap();
    static ref HELPER_IMPORT_RE: Regex = Regex::new(
        r#"(?m)^[ \t]*import[ \t]+([A-Za-z_$][\w$]*)[ \t]+from[ \t]*['"](?:@oxc-project|@babel)/runtime/helpers/(?:esm/)?([\w$]+)(?:\.js)?['"];?[ \t]*$"#
    )
    .unwrap();
    static ref EMPTY_EXPORT_RE: Regex = Regex::new(r"(?m)^[ \t]*export[ \t]*\{[ \t]*\};?[ \t]*$").unwrap();
}

/// Removes import statements, module directives and `export` keywords.
/// Declarations behind `export` are kept.
pub fn strip_module_syntax(source: &str) -> String {
    let code = IMPORT_STMT_RE.replace_all(source, "$1");
    let code = SIDE_EFFECT_IMPORT_RE.replace_all(&code, "$1");
    let code = DIRECTIVE_RE.replace_all(&code, "");
    EXPORT_RE.replace_all(&code, "$1").into_owned()
}

fn transform_options() -> TransformOptions {
    TransformOptions {
        jsx: JsxOptions {
            runtime: JsxRuntime::Classic,
            pragma: Some("React.createElement".to_string()),
            pragma_frag: Some("React.Fragment".to_string()),
            ..JsxOptions::default()
        },
        ..TransformOptions::default()
    }
}

/// Strips module syntax and compiles TypeScript + JSX to plain JavaScript.
pub fn transform_source(source: &str) -> TransformOutput {
    let stripped = strip_module_syntax(source);

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, &stripped, SourceType::tsx()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        debug!(errors = ret.errors.len(), "component source failed to parse");
        return TransformOutput::failed(if message.is_empty() {
            "Failed to parse component source".to_string()
        } else {
            message
        });
    }

    let mut program = ret.program;
    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let transformed = Transformer::new(&allocator, Path::new("component.tsx"), &transform_options())
        .build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        let message = transformed
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return TransformOutput::failed(message);
    }

    let code = Codegen::new().build(&program).code;
    match inline_helpers(&code) {
        Ok(code) => TransformOutput::ok(code),
        Err(message) => TransformOutput::failed(message),
    }
}

/// Replaces runtime helper imports the JSX transform may emit with sandbox
/// equivalents. Only `extends` is available.
fn inline_helpers(code: &str) -> Result<String, String> {
    if let Some(cap) = HELPER_IMPORT_RE
        .captures_iter(code)
        .find(|cap| &cap[2] != "extends")
    {
        return Err(format!("Unsupported runtime helper: {}", &cap[2]));
    }
    let code = HELPER_IMPORT_RE.replace_all(code, "var $1 = Object.assign;");
    Ok(EMPTY_EXPORT_RE.replace_all(&code, "").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_imports_on_shared_line() {
        let source = "import { Calendar } from '@/components/ui/calendar'; function Foo(){ return <Calendar/> }";
        let stripped = strip_module_syntax(source);
        assert!(!stripped.contains("import"));
        assert!(stripped.contains("function Foo()"));
    }

    #[test]
    fn test_strip_consecutive_imports_on_one_line() {
        let source = "import {A} from 'a';import {B} from 'b';import 'c';function Foo(){ return <A><B/></A> }";
        let stripped = strip_module_syntax(source);
        assert!(!stripped.contains("import"), "{}", stripped);
        assert!(!stripped.contains("from"), "{}", stripped);
        assert!(stripped.contains("function Foo()"));

        let out = transform_source(source);
        assert!(out.is_ok(), "{:?}", out.error);
    }

    #[test]
    fn test_strip_directives_and_exports() {
        let source = "'use client';\nimport './styles.css';\nexport default function Foo() { return <p>export default</p> }\nexport const X = 1;";
        let stripped = strip_module_syntax(source);
        assert!(!stripped.contains("use client"));
        assert!(!stripped.contains("styles.css"));
        assert!(stripped.contains("function Foo()"));
        assert!(stripped.contains("<p>export default</p>"));
        assert!(stripped.contains("const X = 1;"));
    }

    #[test]
    fn test_strip_multiline_import() {
        let source = "import {\n  Card,\n  CardTitle,\n} from '@/components/ui/card';\nconst A = 1;";
        let stripped = strip_module_syntax(source);
        assert!(!stripped.contains("Card"));
        assert!(stripped.contains("const A = 1;"));
    }

    #[test]
    fn test_jsx_becomes_create_element() {
        let out = transform_source("function Foo() { return <div className=\"x\">hi</div> }");
        assert!(out.is_ok(), "{:?}", out.error);
        assert!(out.code.contains("React.createElement(\"div\""));
        assert!(!out.code.contains("<div"));
    }

    #[test]
    fn test_fragments_use_react_fragment() {
        let out = transform_source("const Foo = () => <><b/></>;");
        assert!(out.is_ok(), "{:?}", out.error);
        assert!(out.code.contains("React.Fragment"));
    }

    #[test]
    fn test_typescript_is_erased() {
        let out = transform_source(
            "interface Props { title: string }\nexport default function Foo({ title }: Props): JSX.Element { const n: number = 1; return <h1>{title}{n}</h1> }",
        );
        assert!(out.is_ok(), "{:?}", out.error);
        assert!(!out.code.contains("interface"));
        assert!(!out.code.contains(": number"));
        assert!(!out.code.contains("export"));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let out = transform_source("function Foo(){ return <div><span></div> }");
        assert_eq!(out.code, "");
        assert!(out.error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn test_extends_helper_is_inlined() {
        let code = "import _extends from \"@oxc-project/runtime/helpers/extends\";\nReact.createElement(\"a\", _extends({}, props));\n";
        let inlined = inline_helpers(code).unwrap();
        assert!(inlined.starts_with("var _extends = Object.assign;"));
        assert!(inline_helpers("import _x from \"@babel/runtime/helpers/objectSpread2\";").is_err());
    }
}
