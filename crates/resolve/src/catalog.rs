use std::collections::HashSet;

use crate::config::{CatalogConfig, CatalogKind};
use crate::error::ResolveError;
use crate::grammar::{Grammar, ParseFailure};
use crate::identity::{display_name, identity};
use crate::model::{CatalogRecord, CatalogSummary, LensCharacteristics, Product};
use crate::sanitize::Sanitizer;

/// Canonical products of one family, fully built before any listing is
/// resolved against it. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    kind: CatalogKind,
    products: Vec<Product>,
    lenses: Vec<LensCharacteristics>,
    unparsed: Vec<String>,
}

impl Catalog {
    pub fn from_config(config: &CatalogConfig, records: &[CatalogRecord]) -> Result<Self, ResolveError> {
        let sanitizer = config.sanitize.build()?;
        let grammar = config.build_grammar()?;
        Ok(Self::build(config.kind, records, &sanitizer, &grammar))
    }

    pub fn build(
        kind: CatalogKind,
        records: &[CatalogRecord],
        sanitizer: &Sanitizer,
        grammar: &Grammar,
    ) -> Self {
        match kind {
            CatalogKind::Lens => Self::lenses(records, sanitizer, grammar),
            CatalogKind::Camera => Self::cameras(records, sanitizer),
        }
    }

    /// Lens catalog: parseable names get a canonical id and a normalized
    /// name, the others keep the scraped id and name.
    pub fn lenses(records: &[CatalogRecord], sanitizer: &Sanitizer, grammar: &Grammar) -> Self {
        let mut products = Vec::new();
        let mut unparsed = Vec::new();

        for record in records {
            let name = sanitizer.sanitize(&record.raw_name);
            let characteristics = match grammar.parse(&name) {
                Ok(c) => Some(c),
                Err(failure) => {
                    if let ParseFailure::MalformedNumber { .. } = failure {
                        log::warn!("catalog '{}': {failure}", record.raw_name);
                    } else {
                        log::debug!("catalog '{}' kept unparsed", record.raw_name);
                    }
                    unparsed.push(record.raw_name.clone());
                    None
                }
            };
            let product = match characteristics {
                Some(c) => Product::Lens {
                    id: identity(&c),
                    name: display_name(&c),
                    image_url: record.image_url.clone(),
                    characteristics: Some(c),
                },
                None => Product::Lens {
                    id: record.raw_id.clone(),
                    name: record.raw_name.clone(),
                    image_url: record.image_url.clone(),
                    characteristics: None,
                },
            };
            products.push(product);
        }

        Self::finish(CatalogKind::Lens, products, unparsed)
    }

    /// Camera catalog: scraped ids are already the join key.
    pub fn cameras(records: &[CatalogRecord], sanitizer: &Sanitizer) -> Self {
        let products = records
            .iter()
            .map(|r| Product::Camera {
                id: r.raw_id.clone(),
                name: sanitizer.sanitize(&r.raw_name),
                image_url: r.image_url.clone(),
            })
            .collect();
        Self::finish(CatalogKind::Camera, products, Vec::new())
    }

    fn finish(kind: CatalogKind, products: Vec<Product>, unparsed: Vec<String>) -> Self {
        // The same product can be linked from several series pages.
        let mut seen = HashSet::new();
        let products: Vec<Product> = products
            .into_iter()
            .filter(|p| seen.insert(p.product_page_path()))
            .collect();
        let lenses = products
            .iter()
            .filter_map(|p| p.characteristics().cloned())
            .collect();
        Self { kind, products, lenses, unparsed }
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Candidate set for the matcher.
    pub fn lens_characteristics(&self) -> &[LensCharacteristics] {
        &self.lenses
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            products: self.products.len(),
            parsed: self.lenses.len(),
            unparsed_names: self.unparsed.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::RulePreset;

    fn rec(id: &str, name: &str) -> CatalogRecord {
        CatalogRecord {
            raw_id: id.into(),
            raw_name: name.into(),
            image_url: format!("https://img/{id}.png"),
        }
    }

    #[test]
    fn lens_ids_from_characteristics() {
        let records = vec![
            rec("xf16-55mmf28-r-lm-wr", "XF16-55mmF2.8 R LM WR"),
            rec("xf35mmf14-r", "XF35mmF1.4 R"),
            rec("xf1-4x-tc-wr", "XF1.4X TC WR"),
        ];
        let cat = Catalog::lenses(&records, &Sanitizer::default(), &Grammar::catalog());

        let ids: Vec<&str> = cat.products().iter().map(Product::id).collect();
        assert_eq!(ids, ["XF 16-55mm F2.8 LM R WR", "XF 35mm F1.4 R", "xf1-4x-tc-wr"]);
        assert_eq!(cat.products()[0].name(), "XF 16-55mm F2.8 R LM WR");
        assert_eq!(cat.products()[2].name(), "XF1.4X TC WR");
        assert_eq!(cat.lens_characteristics().len(), 2);

        let summary = cat.summary();
        assert_eq!(summary.products, 3);
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.unparsed_names, vec!["XF1.4X TC WR"]);
    }

    #[test]
    fn duplicate_pages_collapse() {
        let records = vec![
            rec("a", "XF35mmF1.4 R"),
            rec("b", "XF35mmF1.4 R"),
            rec("c", "XF23mmF2 R WR"),
        ];
        let cat = Catalog::lenses(&records, &Sanitizer::default(), &Grammar::catalog());
        assert_eq!(cat.products().len(), 2);
        assert_eq!(cat.products()[0].image_url(), "https://img/a.png");
        assert!(cat.products().iter().any(|p| p.id() == "XF 23mm F2.0 R WR"));
    }

    #[test]
    fn cameras_strip_brand_prefix() {
        let sanitizer = Sanitizer::new(RulePreset::BrandPrefix.rules());
        let cat = Catalog::cameras(&[rec("x-t4", "FUJIFILM X-T4")], &sanitizer);
        assert_eq!(cat.kind(), CatalogKind::Camera);
        assert_eq!(cat.products()[0].id(), "x-t4");
        assert_eq!(cat.products()[0].name(), "X-T4");
        assert!(cat.lens_characteristics().is_empty());
    }
}
