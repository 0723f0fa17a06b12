//! Ordered, regex-driven title clean-up.
//!
//! A [`Sanitizer`] is a table of `(pattern, replacement)` rules applied one
//! after the other: each rule sees the output of the previous one, so the
//! order of a table is part of its meaning.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::ResolveError;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\n\r]+").unwrap());

type ReplaceFn = dyn Fn(&Captures<'_>) -> String + Send + Sync;

/// What a rule substitutes for each match.
#[derive(Clone)]
pub enum Replacement {
    /// `regex` template syntax: `$1`, `${name}`, `$$` for a literal dollar.
    Template(String),
    /// Pure function of the match.
    Func(Arc<ReplaceFn>),
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(t) => f.debug_tuple("Template").field(t).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SanitizeRule {
    pattern: Regex,
    replacement: Replacement,
}

impl SanitizeRule {
    pub fn template(pattern: &str, template: impl Into<String>) -> Result<Self, ResolveError> {
        Ok(Self {
            pattern: compile(pattern)?,
            replacement: Replacement::Template(template.into()),
        })
    }

    pub fn func<F>(pattern: &str, f: F) -> Result<Self, ResolveError>
    where
        F: Fn(&Captures<'_>) -> String + Send + Sync + 'static,
    {
        Ok(Self {
            pattern: compile(pattern)?,
            replacement: Replacement::Func(Arc::new(f)),
        })
    }

    /// Remove every match.
    pub fn strip(pattern: &str) -> Result<Self, ResolveError> {
        Self::template(pattern, "")
    }

    fn apply(&self, input: &str) -> String {
        match &self.replacement {
            Replacement::Template(t) => self.pattern.replace_all(input, t.as_str()).into_owned(),
            Replacement::Func(f) => self
                .pattern
                .replace_all(input, |caps: &Captures<'_>| f(caps))
                .into_owned(),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ResolveError> {
    Regex::new(pattern).map_err(|e| ResolveError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn collapse_whitespace(input: &str) -> String {
    WHITESPACE.replace_all(input, " ").into_owned()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    #[default]
    Keep,
    Upper,
    Lower,
}

impl Case {
    pub fn apply(self, input: &str) -> String {
        match self {
            Self::Keep => input.to_string(),
            Self::Upper => input.to_uppercase(),
            Self::Lower => input.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    case: Case,
    rules: Vec<SanitizeRule>,
}

impl Sanitizer {
    pub fn new(rules: Vec<SanitizeRule>) -> Self {
        Self { case: Case::Keep, rules }
    }

    pub fn with_case(mut self, case: Case) -> Self {
        self.case = case;
        self
    }

    /// Append rules after the existing ones.
    pub fn extend(mut self, rules: impl IntoIterator<Item = SanitizeRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn sanitize(&self, input: &str) -> String {
        let cased = self.case.apply(input);
        let out = self
            .rules
            .iter()
            .fold(collapse_whitespace(&cased), |acc, rule| {
                collapse_whitespace(&rule.apply(&acc))
            });
        out.trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Rule tables shipped with the engine, one per kind of marketplace text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulePreset {
    /// Drop manufacturer brand names from a display title.
    Brand,
    /// Drop a leading `FUJIFILM ` (shop product names, catalog camera names).
    BrandPrefix,
    /// Upper-cased second-hand lens titles.
    LensAds,
    /// Lower-cased camera titles, reduced to the body name.
    CameraNames,
}

static BRAND: LazyLock<Vec<SanitizeRule>> =
    LazyLock::new(|| brand_rules().expect("brand preset patterns compile"));
static BRAND_PREFIX: LazyLock<Vec<SanitizeRule>> =
    LazyLock::new(|| brand_prefix_rules().expect("brand_prefix preset patterns compile"));
static LENS_ADS: LazyLock<Vec<SanitizeRule>> =
    LazyLock::new(|| lens_ad_rules().expect("lens_ads preset patterns compile"));
static CAMERA_NAMES: LazyLock<Vec<SanitizeRule>> =
    LazyLock::new(|| camera_name_rules().expect("camera_names preset patterns compile"));

impl RulePreset {
    pub fn rules(self) -> Vec<SanitizeRule> {
        let table: &[SanitizeRule] = match self {
            Self::Brand => &BRAND,
            Self::BrandPrefix => &BRAND_PREFIX,
            Self::LensAds => &LENS_ADS,
            Self::CameraNames => &CAMERA_NAMES,
        };
        table.to_vec()
    }

    /// Case folding the preset's patterns are written for.
    pub fn case(self) -> Case {
        match self {
            Self::Brand => Case::Keep,
            Self::BrandPrefix | Self::LensAds => Case::Upper,
            Self::CameraNames => Case::Lower,
        }
    }
}

fn brand_rules() -> Result<Vec<SanitizeRule>, ResolveError> {
    Ok(vec![
        SanitizeRule::strip("(fujifilm|Fujifilm|FUJIFILM)")?,
        SanitizeRule::strip("(fuji|Fuji|FUJI)")?,
    ])
}

fn brand_prefix_rules() -> Result<Vec<SanitizeRule>, ResolveError> {
    Ok(vec![SanitizeRule::strip("^FUJIFILM ")?])
}

fn lens_ad_rules() -> Result<Vec<SanitizeRule>, ResolveError> {
    Ok(vec![
        SanitizeRule::strip("FUJIFILM|FUJI")?,
        SanitizeRule::strip("SUPER|EBC|OBJECTIF|ZOOM")?,
        // Series code first, wherever the seller put it.
        SanitizeRule::template("(.*)XF(.*)", "XF ${1}${2}")?,
    ])
}

fn camera_name_rules() -> Result<Vec<SanitizeRule>, ResolveError> {
    Ok(vec![
        SanitizeRule::strip("fujifilm")?,
        SanitizeRule::strip("fuji")?,
        SanitizeRule::func("x[- ]*([a-zA-Z]+)[- ]*([0-9]+)", |c| {
            format!("x-{}{}", &c[1], &c[2])
        })?,
        SanitizeRule::func("x(f|p)?[- ]*([0-9]+)[- ]*(v|f)?", |c| {
            format!("x{}{}{}", group(c, 1), &c[2], group(c, 3))
        })?,
        SanitizeRule::func("gfx[- ]*([0-9]+)[- ]*(s|r)?", |c| {
            format!("gfx {}{}", &c[1], group(c, 2))
        })?,
        // Keep only the body name.
        SanitizeRule::template("(x[^ +,]*|gfx [^ +,]*).*", "${1}")?,
    ])
}

fn group<'c>(caps: &'c Captures<'_>, i: usize) -> &'c str {
    caps.get(i).map_or("", |m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn collapses_and_trims_whitespace() {
        let s = Sanitizer::default();
        assert_eq!(s.sanitize("  XF\t16-55mm \n\r F2.8  "), "XF 16-55mm F2.8");
    }

    #[test]
    fn rules_apply_in_order() {
        // Second rule only matches the output of the first.
        let s = Sanitizer::new(vec![
            SanitizeRule::template("a", "b").unwrap(),
            SanitizeRule::template("b", "c").unwrap(),
        ]);
        assert_eq!(s.sanitize("a"), "c");

        let reversed = Sanitizer::new(vec![
            SanitizeRule::template("b", "c").unwrap(),
            SanitizeRule::template("a", "b").unwrap(),
        ]);
        assert_eq!(reversed.sanitize("a"), "b");
    }

    #[test]
    fn no_match_is_noop() {
        let s = Sanitizer::new(vec![SanitizeRule::strip("ZZZ").unwrap()]);
        assert_eq!(s.sanitize("XF 35MM F1.4 R"), "XF 35MM F1.4 R");
    }

    #[test]
    fn whitespace_recollapsed_after_each_rule() {
        let s = Sanitizer::new(vec![SanitizeRule::strip("FUJI").unwrap()]);
        assert_eq!(s.sanitize("XF FUJI 35MM"), "XF 35MM");
    }

    #[test]
    fn invalid_pattern_rejected_at_build() {
        let err = SanitizeRule::strip("(unclosed").unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn lens_ads_preset() {
        let p = RulePreset::LensAds;
        let s = Sanitizer::new(p.rules()).with_case(p.case());
        assert_eq!(
            s.sanitize("Objectif Fujifilm XF 35mm f/1.4 R"),
            "XF 35MM F/1.4 R"
        );
        assert_eq!(
            s.sanitize("Fuji Super EBC XF 18-55mm F2.8-4 R LM OIS"),
            "XF 18-55MM F2.8-4 R LM OIS"
        );
        // Series code moved to the front
        assert_eq!(s.sanitize("16-55mm XF f2.8 WR"), "XF 16-55MM F2.8 WR");
    }

    #[test]
    fn camera_names_preset() {
        let p = RulePreset::CameraNames;
        let s = Sanitizer::new(p.rules()).with_case(p.case());
        assert_eq!(s.sanitize("Fujifilm X-T 3 boitier nu"), "x-t3");
        assert_eq!(s.sanitize("FUJI XT4 + grip"), "x-t4");
        assert_eq!(s.sanitize("Fujifilm X100 V argent"), "x100v");
        assert_eq!(s.sanitize("Fujifilm GFX 50 S"), "gfx 50s");
    }

    #[test]
    fn brand_preset_keeps_case() {
        let p = RulePreset::Brand;
        let s = Sanitizer::new(p.rules()).with_case(p.case());
        assert_eq!(s.sanitize("Fujifilm XF 35mm f/1.4 R"), "XF 35mm f/1.4 R");
        assert_eq!(s.sanitize("FUJI X-T2"), "X-T2");
    }

    #[test]
    fn presets_build() {
        for p in [
            RulePreset::Brand,
            RulePreset::BrandPrefix,
            RulePreset::LensAds,
            RulePreset::CameraNames,
        ] {
            assert!(!p.rules().is_empty(), "{p:?} has no rules");
        }
    }

    #[test]
    fn func_rule_sees_groups() {
        let s = Sanitizer::new(vec![SanitizeRule::func(r"(\d+)mm", |c| {
            format!("{}MM", &c[1])
        })
        .unwrap()]);
        assert_eq!(s.sanitize("XF 23mm F2"), "XF 23MM F2");
    }

    proptest! {
        #[test]
        fn brand_strip_idempotent(input in "[a-eg-zA-EG-Z0-9 ./-]{0,40}") {
            let s = Sanitizer::new(RulePreset::Brand.rules());
            let once = s.sanitize(&input);
            prop_assert_eq!(s.sanitize(&once), once.clone());
            prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
        }
    }
}
