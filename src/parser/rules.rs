use std::sync::OnceLock;

use regex::Regex;

use crate::language::FileClass;

/// The family an extraction rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    /// `import X from './a'`, `import { X } from './a'`, `import * as X from './a'`
    StaticImport,
    /// `import './a'`
    SideEffectImport,
    /// `export { X } from './a'`, `export * from './a'`
    ReExport,
    /// `import('./a')`, including `lazy(() => import('./a'))` wrappers
    DynamicImport,
    /// `require('./a')`
    Require,
    /// `src={'./a.png'}`, `component={require('./a')}`
    JsxAttribute,
    /// A quoted stylesheet path inside script code
    StyleReference,
    /// `@import './a.css'`, `@use './a'`
    AtImport,
    /// `url(./a.png)`
    CssUrl,
    /// `<link href="./a.css">`
    HtmlLink,
    /// `<script src="./a.js">`
    HtmlScript,
    /// `<img src="./a.png">`
    HtmlImage,
}

/// Which file classes a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Script,
    Stylesheet,
    Markup,
}

impl RuleScope {
    pub fn applies_to(&self, class: FileClass) -> bool {
        match self {
            RuleScope::Script => class.has_script(),
            RuleScope::Stylesheet => class == FileClass::Stylesheet,
            RuleScope::Markup => class.has_markup(),
        }
    }
}

/// A named extraction rule. The first non-empty group among `groups` is the specifier.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub name: &'static str,
    pub category: RuleCategory,
    pub scope: RuleScope,
    pub pattern: &'static str,
    pub groups: &'static [usize],
}

/// A rule with its compiled pattern.
#[derive(Debug)]
pub struct ImportRule {
    pub spec: RuleSpec,
    pub regex: Regex,
}

/// The rule registry. Rules overlap on purpose; results are collected into a set.
pub const RULE_SPECS: &[RuleSpec] = &[
    RuleSpec {
        name: "default-import",
        category: RuleCategory::StaticImport,
        scope: RuleScope::Script,
        pattern: r#"\bimport\s+(?:type\s+)?[\w$]+\s+from\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "named-import",
        category: RuleCategory::StaticImport,
        scope: RuleScope::Script,
        pattern: r#"\bimport\s*(?:type\s*)?\{[^}]*\}\s*from\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "namespace-import",
        category: RuleCategory::StaticImport,
        scope: RuleScope::Script,
        pattern: r#"\bimport\s*\*\s*as\s+[\w$]+\s+from\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "mixed-import",
        category: RuleCategory::StaticImport,
        scope: RuleScope::Script,
        pattern: r#"\bimport\s+[\w$]+\s*,\s*(?:\{[^}]*\}|\*\s*as\s+[\w$]+)\s*from\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "from-clause",
        category: RuleCategory::StaticImport,
        scope: RuleScope::Script,
        pattern: r#"\bfrom\s+['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "side-effect-import",
        category: RuleCategory::SideEffectImport,
        scope: RuleScope::Script,
        pattern: r#"\bimport\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "re-export",
        category: RuleCategory::ReExport,
        scope: RuleScope::Script,
        pattern: r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "dynamic-import",
        category: RuleCategory::DynamicImport,
        scope: RuleScope::Script,
        pattern: r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        groups: &[1],
    },
    RuleSpec {
        name: "require",
        category: RuleCategory::Require,
        scope: RuleScope::Script,
        pattern: r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#,
        groups: &[1],
    },
    RuleSpec {
        name: "jsx-attribute",
        category: RuleCategory::JsxAttribute,
        scope: RuleScope::Script,
        pattern: r#"\b(?:src|href|path|component)=\{\s*(?:['"]([^'"]+)['"]|require\(\s*['"]([^'"]+)['"]\s*\))\s*\}"#,
        groups: &[1, 2],
    },
    RuleSpec {
        name: "style-reference",
        category: RuleCategory::StyleReference,
        scope: RuleScope::Script,
        pattern: r#"['"]([^'"\s]+\.(?:css|scss|sass|less))['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "at-import",
        category: RuleCategory::AtImport,
        scope: RuleScope::Stylesheet,
        pattern: r#"@(?:import|use|forward)\s+['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "css-url",
        category: RuleCategory::CssUrl,
        scope: RuleScope::Stylesheet,
        pattern: r#"\burl\s*\(\s*['"]?([^'")\s]+)['"]?\s*\)"#,
        groups: &[1],
    },
    RuleSpec {
        name: "html-link",
        category: RuleCategory::HtmlLink,
        scope: RuleScope::Markup,
        pattern: r#"<link\b[^>]*?\bhref\s*=\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "html-script",
        category: RuleCategory::HtmlScript,
        scope: RuleScope::Markup,
        pattern: r#"<script\b[^>]*?\bsrc\s*=\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
    RuleSpec {
        name: "html-image",
        category: RuleCategory::HtmlImage,
        scope: RuleScope::Markup,
        pattern: r#"<img\b[^>]*?\bsrc\s*=\s*['"]([^'"]+)['"]"#,
        groups: &[1],
    },
];

static RULES: OnceLock<Vec<ImportRule>> = OnceLock::new();

/// The compiled registry. A pattern that fails to compile is logged and left out.
pub fn rules() -> &'static [ImportRule] {
    RULES.get_or_init(|| {
        RULE_SPECS
            .iter()
            .filter_map(|spec| match Regex::new(spec.pattern) {
                Ok(regex) => Some(ImportRule { spec: *spec, regex }),
                Err(err) => {
                    tracing::error!("extraction rule '{}' failed to compile: {err}", spec.name);
                    None
                }
            })
            .collect()
    })
}

/// The compiled rules that apply to `class`.
pub fn rules_for(class: FileClass) -> impl Iterator<Item = &'static ImportRule> {
    rules().iter().filter(move |r| r.spec.scope.applies_to(class))
}

impl ImportRule {
    /// Every specifier this rule captures in `content`, unfiltered.
    pub fn captures<'a>(&'a self, content: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.regex.captures_iter(content).filter_map(|caps| {
            self.spec
                .groups
                .iter()
                .find_map(|&g| caps.get(g).map(|m| m.as_str()))
                .filter(|s| !s.is_empty())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(rules().len(), RULE_SPECS.len());
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<&str> = RULE_SPECS.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULE_SPECS.len());
    }

    #[test]
    fn test_scope_selection() {
        let css: Vec<_> = rules_for(FileClass::Stylesheet).map(|r| r.spec.name).collect();
        assert_eq!(css, vec!["at-import", "css-url"]);

        let html: Vec<_> = rules_for(FileClass::Markup).map(|r| r.spec.category).collect();
        assert!(html.iter().all(|c| matches!(
            c,
            RuleCategory::HtmlLink | RuleCategory::HtmlScript | RuleCategory::HtmlImage
        )));

        assert_eq!(rules_for(FileClass::Other).count(), 0);
        assert!(rules_for(FileClass::Component).count() > rules_for(FileClass::Script).count());
    }

    #[test]
    fn test_jsx_attribute_alternate_group() {
        let rule = rules()
            .iter()
            .find(|r| r.spec.name == "jsx-attribute")
            .unwrap();
        let found: Vec<_> = rule
            .captures(r#"<img src={require('./logo.png')} /><Route path={"./pages/home"} />"#)
            .collect();
        assert_eq!(found, vec!["./logo.png", "./pages/home"]);
    }
}
