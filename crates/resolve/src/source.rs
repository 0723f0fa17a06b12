use crate::catalog::Catalog;
use crate::config::{CatalogKind, DealKind, RowFilter, SourceConfig};
use crate::error::ResolveError;
use crate::grammar::{Grammar, ParseFailure};
use crate::identity::identity;
use crate::matcher;
use crate::model::{
    Deal, Listing, NewDeal, Resolution, SecondHandDeal, UnresolvedReason, UnresolvedTitle,
};
use crate::sanitize::Sanitizer;

/// A source config compiled against the kind of catalog it targets.
///
/// Immutable once built; one resolver can serve several threads sharing
/// the same catalog.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    label: String,
    kind: DealKind,
    target: CatalogKind,
    filter: Option<RowFilter>,
    sanitizer: Sanitizer,
    title: Option<Sanitizer>,
    grammar: Grammar,
}

/// Outcome of resolving one batch of listings.
#[derive(Debug, Clone, Default)]
pub struct ResolvedBatch {
    /// One entry per admitted, complete listing, in listing order.
    pub entries: Vec<(Option<String>, Deal)>,
    /// Listings dropped by the row filter.
    pub filtered: usize,
    pub unresolved: Vec<UnresolvedTitle>,
}

impl ResolvedBatch {
    pub fn resolved(&self) -> usize {
        self.entries.iter().filter(|(id, _)| id.is_some()).count()
    }
}

impl SourceResolver {
    pub fn new(config: &SourceConfig, target: CatalogKind) -> Result<Self, ResolveError> {
        Ok(Self {
            label: config.label.clone(),
            kind: config.kind,
            target,
            filter: config.filter.clone(),
            sanitizer: config.sanitize.build()?,
            title: config.title.as_ref().map(|t| t.build()).transpose()?,
            grammar: config.build_grammar()?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the row filter lets `listing` through. A listing without the
    /// filter column value is checked as an empty string.
    pub fn admits(&self, listing: &Listing) -> bool {
        match &self.filter {
            Some(filter) => filter.admits(listing.filter_value.as_deref().unwrap_or("")),
            None => true,
        }
    }

    /// Sanitize `raw` and map it to a canonical id of `catalog`.
    ///
    /// Returns the sanitized title alongside the outcome so callers can
    /// report what the grammar actually saw.
    pub fn resolve_title(&self, catalog: &Catalog, raw: &str) -> (String, Resolution) {
        let sanitized = self.sanitizer.sanitize(raw);
        let resolution = match self.target {
            CatalogKind::Lens => self.resolve_lens(catalog, raw, &sanitized),
            CatalogKind::Camera if sanitized.is_empty() => {
                Resolution::Unresolved(UnresolvedReason::EmptyKey)
            }
            CatalogKind::Camera => Resolution::Resolved(sanitized.clone()),
        };
        (sanitized, resolution)
    }

    fn resolve_lens(&self, catalog: &Catalog, raw: &str, sanitized: &str) -> Resolution {
        let parsed = match self.grammar.parse(sanitized) {
            Ok(parsed) => parsed,
            Err(ParseFailure::NoMatch) => {
                return Resolution::Unresolved(UnresolvedReason::NoGrammarMatch)
            }
            Err(failure @ ParseFailure::MalformedNumber { .. }) => {
                log::warn!("{}: '{raw}': {failure}", self.label);
                return Resolution::Unresolved(UnresolvedReason::MalformedNumber);
            }
        };
        match matcher::resolve(&parsed, catalog.lens_characteristics()) {
            Some(found) => Resolution::Resolved(identity(found)),
            None => Resolution::Unresolved(UnresolvedReason::NoCandidate),
        }
    }

    /// Build the deal a listing offers. Second-hand deals need an image.
    pub fn deal(&self, listing: &Listing) -> Option<Deal> {
        let shown = listing.title.as_deref().unwrap_or(&listing.raw_title);
        let shown = match &self.title {
            Some(sanitizer) => sanitizer.sanitize(shown),
            None => shown.to_string(),
        };

        match self.kind {
            DealKind::New => Some(Deal::New(NewDeal {
                source: self.label.clone(),
                price: listing.price,
                url: listing.url.clone(),
                title: (listing.title.is_some() || self.title.is_some()).then_some(shown),
            })),
            DealKind::SecondHand => Some(Deal::SecondHand(SecondHandDeal {
                source: self.label.clone(),
                price: listing.price,
                url: listing.url.clone(),
                title: shown,
                image_url: listing.image_url.clone().filter(|u| !u.is_empty())?,
                location: listing.location.clone(),
                publication_date: listing.publication_date.clone(),
            })),
        }
    }

    /// Resolve every admitted listing. A listing that fails to resolve is
    /// recorded and skipped; it never stops the batch.
    pub fn resolve_batch(&self, catalog: &Catalog, listings: &[Listing]) -> ResolvedBatch {
        let mut batch = ResolvedBatch::default();

        for listing in listings {
            if !self.admits(listing) {
                batch.filtered += 1;
                continue;
            }

            let Some(deal) = self.deal(listing) else {
                batch.unresolved.push(UnresolvedTitle {
                    title: listing.raw_title.clone(),
                    sanitized: String::new(),
                    reason: UnresolvedReason::IncompleteListing,
                });
                continue;
            };

            let (sanitized, resolution) = self.resolve_title(catalog, &listing.raw_title);
            if let Resolution::Unresolved(reason) = &resolution {
                batch.unresolved.push(UnresolvedTitle {
                    title: listing.raw_title.clone(),
                    sanitized,
                    reason: reason.clone(),
                });
            }
            batch.entries.push((resolution.into_id(), deal));
        }

        batch
    }
}
