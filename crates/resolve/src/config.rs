use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ResolveError;
use crate::grammar::{BuiltinGrammar, Grammar};
use crate::sanitize::{Case, RulePreset, SanitizeRule, Sanitizer};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WatchConfig {
    pub name: String,
    pub catalogs: IndexMap<String, CatalogConfig>,
    pub sources: IndexMap<String, SourceConfig>,
    #[serde(default)]
    pub merge: IndexMap<String, MergeConfig>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub kind: CatalogKind,
    pub file: String,
    #[serde(default)]
    pub columns: CatalogColumns,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
    #[serde(default)]
    pub grammar: Option<GrammarConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Lens,
    Camera,
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lens => write!(f, "lens"),
            Self::Camera => write!(f, "camera"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogColumns {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            id: "id".into(),
            name: "name".into(),
            image_url: "image_url".into(),
        }
    }
}

impl CatalogConfig {
    /// Grammar for catalog names; lens catalogs default to the catalog dialect.
    pub fn build_grammar(&self) -> Result<Grammar, ResolveError> {
        match &self.grammar {
            Some(g) => g.build(),
            None => Ok(Grammar::catalog()),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Name shown on every deal from this source.
    pub label: String,
    pub kind: DealKind,
    /// Catalog the titles are resolved against.
    pub target: String,
    pub file: String,
    pub columns: ListingColumns,
    #[serde(default)]
    pub filter: Option<RowFilter>,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
    /// Clean-up for the title shown on the deal (defaults to the raw title).
    #[serde(default)]
    pub title: Option<SanitizeConfig>,
    #[serde(default)]
    pub grammar: Option<GrammarConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealKind {
    New,
    SecondHand,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingColumns {
    pub title: String,
    pub price: String,
    pub url: String,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub mode: FilterMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Keep only rows whose column value is listed.
    #[default]
    Keep,
    /// Drop rows whose column value is listed (e.g. sold ads).
    Drop,
}

impl RowFilter {
    pub fn admits(&self, value: &str) -> bool {
        let listed = self.values.iter().any(|v| v == value);
        match self.mode {
            FilterMode::Keep => listed,
            FilterMode::Drop => !listed,
        }
    }
}

impl SourceConfig {
    /// Grammar for listing titles; defaults to the marketplace dialect.
    pub fn build_grammar(&self) -> Result<Grammar, ResolveError> {
        match &self.grammar {
            Some(g) => g.build(),
            None => Ok(Grammar::marketplace()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sanitize + Grammar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SanitizeConfig {
    /// Case folding before the rules. Defaults to the preset's case, else keep.
    #[serde(default)]
    pub case: Option<Case>,
    #[serde(default)]
    pub preset: Option<RulePreset>,
    /// Applied after the preset's rules, in order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub replace: String,
}

impl SanitizeConfig {
    pub fn build(&self) -> Result<Sanitizer, ResolveError> {
        let case = self
            .case
            .or(self.preset.map(RulePreset::case))
            .unwrap_or_default();
        let preset_rules = self.preset.map(RulePreset::rules).unwrap_or_default();
        let custom = self
            .rules
            .iter()
            .map(|r| SanitizeRule::template(&r.pattern, r.replace.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Sanitizer::new(preset_rules).extend(custom).with_case(case))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrammarConfig {
    #[serde(default)]
    pub builtin: Option<BuiltinGrammar>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub shapes: Option<Vec<String>>,
}

impl GrammarConfig {
    pub fn build(&self) -> Result<Grammar, ResolveError> {
        let mut grammar = match (&self.builtin, &self.pattern) {
            (Some(b), None) => Grammar::builtin(*b),
            (None, Some(p)) => Grammar::new(p)?,
            _ => {
                return Err(ResolveError::ConfigValidation(
                    "grammar must set exactly one of 'builtin' or 'pattern'".into(),
                ))
            }
        };
        if let Some(colors) = &self.colors {
            grammar = grammar.with_colors(colors.clone());
        }
        if let Some(shapes) = &self.shapes {
            grammar = grammar.with_shapes(shapes.clone());
        }
        Ok(grammar)
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    /// Sources whose deal maps are unioned, in this order.
    pub sources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl WatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, ResolveError> {
        let config: WatchConfig =
            toml::from_str(input).map_err(|e| ResolveError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.catalogs.is_empty() {
            return Err(ResolveError::ConfigValidation(
                "at least one catalog is required".into(),
            ));
        }
        if self.sources.is_empty() {
            return Err(ResolveError::ConfigValidation(
                "at least one source is required".into(),
            ));
        }

        for (name, catalog) in &self.catalogs {
            catalog.sanitize.build()?;
            match catalog.kind {
                CatalogKind::Lens => {
                    catalog.build_grammar()?;
                }
                CatalogKind::Camera if catalog.grammar.is_some() => {
                    return Err(ResolveError::ConfigValidation(format!(
                        "catalog '{name}': grammar only applies to lens catalogs"
                    )));
                }
                CatalogKind::Camera => {}
            }
        }

        for (name, source) in &self.sources {
            if source.label.trim().is_empty() {
                return Err(ResolveError::ConfigValidation(format!(
                    "source '{name}': label must not be empty"
                )));
            }
            let target = self.catalogs.get(&source.target).ok_or_else(|| {
                ResolveError::UnknownCatalog(format!(
                    "source '{name}': target catalog '{}' not found",
                    source.target
                ))
            })?;
            if source.kind == DealKind::SecondHand && source.columns.image_url.is_none() {
                return Err(ResolveError::ConfigValidation(format!(
                    "source '{name}': second_hand sources must map an image_url column"
                )));
            }
            source.sanitize.build()?;
            if let Some(title) = &source.title {
                title.build()?;
            }
            match target.kind {
                CatalogKind::Lens => {
                    source.build_grammar()?;
                }
                CatalogKind::Camera if source.grammar.is_some() => {
                    return Err(ResolveError::ConfigValidation(format!(
                        "source '{name}': grammar only applies to lens targets"
                    )));
                }
                CatalogKind::Camera => {}
            }
        }

        for (group, merge) in &self.merge {
            if merge.sources.is_empty() {
                return Err(ResolveError::ConfigValidation(format!(
                    "merge '{group}': at least one source is required"
                )));
            }
            for source in &merge.sources {
                if !self.sources.contains_key(source) {
                    return Err(ResolveError::UnknownSource(format!(
                        "merge '{group}': source '{source}' not found"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
