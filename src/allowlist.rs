//! Dependency Allow-List
//!
//! The fixed set of modules runtime-compiled components may import. This is
//! the entire safety boundary of the pipeline: anything not listed here is
//! reported as an unsupported dependency and never compiled.
//!
//! The list is immutable once built and shared through `Arc`. Exports are
//! descriptors, materialised inside each component's own sandbox, so no
//! script state leaks between blocks.

use indexmap::IndexMap;

/// A design-system component rendered as `<tag data-slot=".." class="..">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryComponent {
    pub name: String,
    pub tag: String,
    pub class: String,
}

impl LibraryComponent {
    /// `data-slot` marker: the kebab-cased component name.
    pub fn slot(&self) -> String {
        kebab_case(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// Design-system component rendered as a host element.
    Component(LibraryComponent),
    /// Pure helper, given as a JavaScript function expression evaluated
    /// inside the component's sandbox.
    Function { name: String, source: String },
}

#[derive(Debug, Clone, Default)]
pub struct DependencyModule {
    exports: IndexMap<String, Export>,
    default_export: Option<String>,
}

impl DependencyModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component export rendered as `<tag class="...">`.
    pub fn component(mut self, name: &str, tag: &str, class: &str) -> Self {
        self.exports.insert(
            name.to_string(),
            Export::Component(LibraryComponent {
                name: name.to_string(),
                tag: tag.to_string(),
                class: class.to_string(),
            }),
        );
        self
    }

    pub fn function(mut self, name: &str, source: &str) -> Self {
        self.exports.insert(
            name.to_string(),
            Export::Function {
                name: name.to_string(),
                source: source.to_string(),
            },
        );
        self
    }

    /// Marks an existing export as the module's default export.
    pub fn with_default(mut self, name: &str) -> Self {
        self.default_export = Some(name.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    pub fn default_export(&self) -> Option<&Export> {
        self.default_export
            .as_deref()
            .and_then(|name| self.exports.get(name))
    }

    /// Name of the export bound to `default`, if it exists.
    pub fn default_export_name(&self) -> Option<&str> {
        self.default_export
            .as_deref()
            .filter(|name| self.exports.contains_key(*name))
    }

    pub fn exports(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(name, export)| (name.as_str(), export))
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AllowList {
    modules: IndexMap<String, DependencyModule>,
}

#[derive(Debug, Default)]
pub struct AllowListBuilder {
    modules: IndexMap<String, DependencyModule>,
}

impl AllowListBuilder {
    pub fn module(mut self, path: &str, module: DependencyModule) -> Self {
        self.modules.insert(path.to_string(), module);
        self
    }

    pub fn build(self) -> AllowList {
        AllowList {
            modules: self.modules,
        }
    }
}

impl AllowList {
    pub fn builder() -> AllowListBuilder {
        AllowListBuilder::default()
    }

    pub fn get(&self, path: &str) -> Option<&DependencyModule> {
        self.modules.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// The design-system modules available to custom components.
    pub fn builtin() -> AllowList {
        let ui = |file: &str, module: DependencyModule| (format!("@/components/ui/{}", file), module);

        let modules = vec![
            ui("button", DependencyModule::new().component("Button", "button", "btn")),
            ui(
                "card",
                DependencyModule::new()
                    .component("Card", "div", "card")
                    .component("CardHeader", "div", "card-header")
                    .component("CardTitle", "h3", "card-title")
                    .component("CardDescription", "p", "card-description")
                    .component("CardContent", "div", "card-content")
                    .component("CardFooter", "div", "card-footer"),
            ),
            ui("badge", DependencyModule::new().component("Badge", "span", "badge")),
            ui("input", DependencyModule::new().component("Input", "input", "input")),
            ui("textarea", DependencyModule::new().component("Textarea", "textarea", "textarea")),
            ui("label", DependencyModule::new().component("Label", "label", "label")),
            ui("separator", DependencyModule::new().component("Separator", "hr", "separator")),
            ui("calendar", DependencyModule::new().component("Calendar", "div", "calendar")),
            ui(
                "accordion",
                DependencyModule::new()
                    .component("Accordion", "div", "accordion")
                    .component("AccordionItem", "div", "accordion-item")
                    .component("AccordionTrigger", "button", "accordion-trigger")
                    .component("AccordionContent", "div", "accordion-content"),
            ),
            ui(
                "tabs",
                DependencyModule::new()
                    .component("Tabs", "div", "tabs")
                    .component("TabsList", "div", "tabs-list")
                    .component("TabsTrigger", "button", "tabs-trigger")
                    .component("TabsContent", "div", "tabs-content"),
            ),
            ui(
                "avatar",
                DependencyModule::new()
                    .component("Avatar", "span", "avatar")
                    .component("AvatarImage", "img", "avatar-image")
                    .component("AvatarFallback", "span", "avatar-fallback"),
            ),
            ui(
                "alert",
                DependencyModule::new()
                    .component("Alert", "div", "alert")
                    .component("AlertTitle", "h5", "alert-title")
                    .component("AlertDescription", "div", "alert-description"),
            ),
            ui(
                "table",
                DependencyModule::new()
                    .component("Table", "table", "table")
                    .component("TableCaption", "caption", "table-caption")
                    .component("TableHeader", "thead", "table-header")
                    .component("TableBody", "tbody", "table-body")
                    .component("TableFooter", "tfoot", "table-footer")
                    .component("TableRow", "tr", "table-row")
                    .component("TableHead", "th", "table-head")
                    .component("TableCell", "td", "table-cell"),
            ),
            ui("skeleton", DependencyModule::new().component("Skeleton", "div", "skeleton")),
            ("@/lib/utils".to_string(), DependencyModule::new().function("cn", CLASS_NAMES_JS)),
            (
                "clsx".to_string(),
                DependencyModule::new()
                    .function("clsx", CLASS_NAMES_JS)
                    .with_default("clsx"),
            ),
            ("lucide-react".to_string(), icons()),
        ];

        let mut builder = AllowList::builder();
        for (path, module) in modules {
            builder = builder.module(&path, module);
        }
        builder.build()
    }
}

const ICONS: &[&str] = &[
    "ArrowRight",
    "Award",
    "BookOpen",
    "Calendar",
    "Check",
    "ChevronDown",
    "ChevronRight",
    "Clock",
    "Download",
    "ExternalLink",
    "Globe",
    "GraduationCap",
    "Info",
    "Mail",
    "MapPin",
    "Menu",
    "Phone",
    "Search",
    "Star",
    "User",
    "Users",
    "X",
];

fn icons() -> DependencyModule {
    ICONS.iter().fold(DependencyModule::new(), |module, name| {
        let class = format!("lucide lucide-{}", kebab_case(name));
        module.component(name, "svg", &class)
    })
}

pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `cn(...)` / `clsx(...)`: joins truthy class values, flattening arrays and
/// taking the truthy keys of objects.
const CLASS_NAMES_JS: &str = r#"function classNames() {
  const out = [];
  const walk = (value) => {
    if (!value) return;
    if (typeof value === "string" || typeof value === "number") {
      out.push(String(value));
    } else if (Array.isArray(value)) {
      value.forEach(walk);
    } else if (typeof value === "object") {
      for (const key of Object.keys(value)) if (value[key]) out.push(key);
    }
  };
  for (let i = 0; i < arguments.length; i++) walk(arguments[i]);
  return out.join(" ");
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_paths() {
        let allowlist = AllowList::builtin();
        assert!(allowlist.contains("@/components/ui/calendar"));
        assert!(allowlist.contains("lucide-react"));
        assert!(!allowlist.contains("chart.js"));
        assert!(!allowlist.contains("react"));
    }

    #[test]
    fn test_default_export_resolution() {
        let allowlist = AllowList::builtin();
        let clsx = allowlist.get("clsx").unwrap();
        assert!(matches!(clsx.default_export(), Some(Export::Function { name, .. }) if name == "clsx"));
        assert_eq!(clsx.default_export_name(), Some("clsx"));
        assert!(allowlist.get("@/lib/utils").unwrap().default_export().is_none());
    }

    #[test]
    fn test_dangling_default_is_ignored() {
        let module = DependencyModule::new()
            .component("Hero", "header", "hero")
            .with_default("Missing");
        assert_eq!(module.default_export_name(), None);
    }

    #[test]
    fn test_slots_and_icon_classes() {
        let allowlist = AllowList::builtin();
        let card = allowlist.get("@/components/ui/card").unwrap();
        let Some(Export::Component(title)) = card.get("CardTitle") else {
            panic!("CardTitle should be a component");
        };
        assert_eq!(title.slot(), "card-title");
        assert_eq!(title.tag, "h3");

        let icons = allowlist.get("lucide-react").unwrap();
        assert!(matches!(
            icons.get("GraduationCap"),
            Some(Export::Component(icon)) if icon.class == "lucide lucide-graduation-cap" && icon.tag == "svg"
        ));
    }

    #[test]
    fn test_allowlist_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AllowList>();
    }
}
