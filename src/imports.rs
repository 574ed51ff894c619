//! Import Classifier
//!
//! Splits the `import ... from '...'` statements of a component source into
//! allow-listed and unsupported modules. Pure function of source and
//! allow-list: no caching, no state between calls.

use lazy_static::lazy_static;
use oxc_syntax::identifier::is_identifier_name;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::allowlist::AllowList;

/// Module name of the runtime library. Always available, never classified.
pub const RUNTIME_MODULE: &str = "react";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ImportBinding {
    Default { local: String },
    Namespace { local: String },
    Named { export: String, local: String },
}

impl ImportBinding {
    pub fn local(&self) -> &str {
        match self {
            ImportBinding::Default { local }
            | ImportBinding::Namespace { local }
            | ImportBinding::Named { local, .. } => local,
        }
    }

    /// Alias-stripped requested name; namespaces are marked `* as X`.
    pub fn requested_name(&self) -> String {
        match self {
            ImportBinding::Default { local } => local.clone(),
            ImportBinding::Namespace { local } => format!("* as {}", local),
            ImportBinding::Named { export, .. } => export.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedImport {
    pub path: String,
    pub names: Vec<String>,
    pub bindings: Vec<ImportBinding>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAnalysis {
    pub supported_imports: Vec<SupportedImport>,
    pub unsupported_imports: Vec<String>,
}

impl ImportAnalysis {
    pub fn has_unsupported(&self) -> bool {
        !self.unsupported_imports.is_empty()
    }
}

lazy_static! {
    static ref IMPORT_RE: Regex = Regex::new(
        r#"(?m)(?:^|;)[ \t]*import[ \t]+(type[ \t]+)?([^'";]*?)[ \t\r\n]*from[ \t]*['"]([^'"\r\n]+)['"]"#
    )
    .unwrap();
}

fn is_runtime_module(path: &str) -> bool {
    path == RUNTIME_MODULE
        || path
            .strip_prefix(RUNTIME_MODULE)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Classifies every `import <clause> from '<path>'` in `source`.
///
/// Imports of the same path are reported once per statement, in source order.
pub fn classify_imports(source: &str, allowlist: &AllowList) -> ImportAnalysis {
    let mut analysis = ImportAnalysis::default();

    for cap in IMPORT_RE.captures_iter(source) {
        let path = &cap[3];
        if cap.get(1).is_some() || is_runtime_module(path) {
            continue;
        }
        if !allowlist.contains(path) {
            analysis.unsupported_imports.push(path.to_string());
            continue;
        }

        let bindings = parse_clause(&cap[2]);
        analysis.supported_imports.push(SupportedImport {
            path: path.to_string(),
            names: bindings.iter().map(ImportBinding::requested_name).collect(),
            bindings,
        });
    }

    analysis
}

/// `Default`, `* as Ns`, `{ A, B as C }` and `Default, { ... }` / `Default, * as Ns`.
fn parse_clause(clause: &str) -> Vec<ImportBinding> {
    let clause = clause.trim();
    let mut bindings = Vec::new();

    let (head, rest) = match clause.find(['{', '*']) {
        Some(index) => (&clause[..index], &clause[index..]),
        None => (clause, ""),
    };

    let default = head.trim().trim_end_matches(',').trim();
    if is_identifier_name(default) {
        bindings.push(ImportBinding::Default {
            local: default.to_string(),
        });
    }

    let rest = rest.trim();
    if let Some(ns) = rest.strip_prefix('*') {
        let local = ns.trim().trim_start_matches("as").trim();
        if is_identifier_name(local) {
            bindings.push(ImportBinding::Namespace {
                local: local.to_string(),
            });
        }
    } else if let Some(list) = rest.strip_prefix('{') {
        let list = list.split('}').next().unwrap_or_default();
        for specifier in list.split(',') {
            let specifier = specifier.trim();
            if specifier.is_empty() || specifier.starts_with("type ") {
                continue;
            }
            let mut parts = specifier.split_whitespace();
            let export = parts.next().unwrap_or_default();
            let local = match (parts.next(), parts.next()) {
                (Some("as"), Some(alias)) => alias,
                _ => export,
            };
            if is_identifier_name(export) && is_identifier_name(local) {
                bindings.push(ImportBinding::Named {
                    export: export.to_string(),
                    local: local.to_string(),
                });
            }
        }
    }

    bindings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(source: &str) -> ImportAnalysis {
        classify_imports(source, &AllowList::builtin())
    }

    #[test]
    fn test_no_imports() {
        let analysis = classify("function Foo() { return null }");
        assert!(analysis.supported_imports.is_empty());
        assert!(analysis.unsupported_imports.is_empty());
    }

    #[test]
    fn test_named_imports_strip_aliases() {
        let analysis = classify(
            "import { Card, CardTitle as Title } from '@/components/ui/card';\nfunction Foo() {}",
        );
        let import = &analysis.supported_imports[0];
        assert_eq!(import.path, "@/components/ui/card");
        assert_eq!(import.names, vec!["Card", "CardTitle"]);
        assert_eq!(
            import.bindings[1],
            ImportBinding::Named {
                export: "CardTitle".into(),
                local: "Title".into()
            }
        );
    }

    #[test]
    fn test_namespace_and_default_forms() {
        let analysis = classify(
            "import * as Icons from 'lucide-react'\nimport clsx, { clsx as cx } from 'clsx'",
        );
        assert_eq!(analysis.supported_imports[0].names, vec!["* as Icons"]);
        assert_eq!(analysis.supported_imports[1].names, vec!["clsx", "clsx"]);
        assert!(matches!(
            &analysis.supported_imports[1].bindings[0],
            ImportBinding::Default { local } if local == "clsx"
        ));
    }

    #[test]
    fn test_runtime_module_is_skipped() {
        let analysis = classify(
            "import React, { useState } from 'react'\nimport { createRoot } from 'react-dom/client'\nimport { jsx } from 'react/jsx-runtime'",
        );
        assert!(analysis.supported_imports.is_empty());
        assert_eq!(analysis.unsupported_imports, vec!["react-dom/client"]);
    }

    #[test]
    fn test_type_imports_are_skipped() {
        let analysis = classify(
            "import type { Props } from './types'\nimport { type ButtonProps, Button } from '@/components/ui/button'",
        );
        assert!(analysis.unsupported_imports.is_empty());
        assert_eq!(analysis.supported_imports[0].names, vec!["Button"]);
    }

    #[test]
    fn test_duplicate_paths_are_not_merged() {
        let analysis = classify(
            "import { Tabs } from '@/components/ui/tabs'\nimport { TabsList } from '@/components/ui/tabs'",
        );
        assert_eq!(analysis.supported_imports.len(), 2);
        assert_eq!(analysis.supported_imports[1].names, vec!["TabsList"]);
    }

    #[test]
    fn test_multiline_clause() {
        let analysis = classify(
            "import {\n  Table,\n  TableRow,\n} from \"@/components/ui/table\";\nimport axios from 'axios';",
        );
        assert_eq!(analysis.supported_imports[0].names, vec!["Table", "TableRow"]);
        assert_eq!(analysis.unsupported_imports, vec!["axios"]);
    }

    #[test]
    fn test_camel_case_json() {
        let json = serde_json::to_value(classify("import Chart from 'chart.js'")).unwrap();
        assert_eq!(json["unsupportedImports"], serde_json::json!(["chart.js"]));
        assert_eq!(json["supportedImports"], serde_json::json!([]));
    }
}
