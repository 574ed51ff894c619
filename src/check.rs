//! Pre-save diagnostics for the code editor.
//!
//! Runs the full pipeline once without rendering and reports every stage,
//! so the editor can explain why a component will not mount.

use serde::{Deserialize, Serialize};

use crate::allowlist::AllowList;
use crate::config::ExecutionLimits;
use crate::discovery::discover_component_name;
use crate::error::COMPONENT_NOT_FOUND_MESSAGE;
use crate::factory::create_component;
use crate::imports::{classify_imports, ImportAnalysis};
use crate::transform::transform_source;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub component_name: Option<String>,
    pub imports: ImportAnalysis,
    pub transform_error: Option<String>,
    pub construction_error: Option<String>,
    pub ok: bool,
}

pub fn check_source(source: &str, allowlist: &AllowList, limits: ExecutionLimits) -> SourceReport {
    let imports = classify_imports(source, allowlist);
    let component_name = discover_component_name(source);
    let transformed = transform_source(source);

    let construction_error = match (&component_name, &transformed.error) {
        _ if imports.has_unsupported() => None,
        (None, _) => Some(COMPONENT_NOT_FOUND_MESSAGE.to_string()),
        (Some(_), Some(_)) => None,
        (Some(name), None) => create_component(
            &transformed.code,
            name,
            &imports.supported_imports,
            allowlist,
            limits,
        )
        .err()
        .map(|e| e.to_string()),
    };

    let ok = !imports.has_unsupported()
        && component_name.is_some()
        && transformed.error.is_none()
        && construction_error.is_none();

    SourceReport {
        component_name,
        imports,
        transform_error: transformed.error,
        construction_error,
        ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str) -> SourceReport {
        check_source(source, &AllowList::builtin(), ExecutionLimits::default())
    }

    #[test]
    fn test_valid_source() {
        let report = check("import { Badge } from '@/components/ui/badge';\nexport default function Tag() { return <Badge>new</Badge> }");
        assert!(report.ok);
        assert_eq!(report.component_name.as_deref(), Some("Tag"));
    }

    #[test]
    fn test_reports_every_stage() {
        let report = check("import axios from 'axios';\nconst x = <div>;");
        assert!(!report.ok);
        assert_eq!(report.component_name, None);
        assert_eq!(report.imports.unsupported_imports, vec!["axios"]);
        assert!(report.transform_error.is_some());
    }

    #[test]
    fn test_construction_error_surfaces() {
        let report = check("function Foo() { return null }\nundefinedHelper();");
        assert!(!report.ok);
        assert!(report
            .construction_error
            .as_deref()
            .is_some_and(|e| e.contains("undefinedHelper") && e.contains("not defined")));
    }
}
