use indexmap::IndexMap;

use crate::aggregate::{aggregate, merge_all};
use crate::catalog::Catalog;
use crate::config::{SourceConfig, WatchConfig};
use crate::error::ResolveError;
use crate::ingest::ListingBatch;
use crate::model::{
    CatalogRecord, DealMap, RunMeta, RunResult, RunSummary, TitleResolution,
};
use crate::report::source_summary;
use crate::source::SourceResolver;

/// Pre-loaded records, keyed by the catalog and source names of the config.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub catalogs: IndexMap<String, Vec<CatalogRecord>>,
    pub sources: IndexMap<String, ListingBatch>,
}

/// Build every catalog, resolve every source against its target, then
/// union the merge groups.
pub fn run(config: &WatchConfig, input: &RunInput) -> Result<RunResult, ResolveError> {
    let catalogs = build_catalogs(config, input)?;

    let mut summary = RunSummary::default();
    let mut products = IndexMap::new();
    for (name, catalog) in &catalogs {
        summary.catalogs.insert(name.clone(), catalog.summary());
        products.insert(name.clone(), catalog.products().to_vec());
    }

    let mut deals: IndexMap<String, DealMap> = IndexMap::new();
    for (name, source) in &config.sources {
        let batch = input.sources.get(name).ok_or_else(|| {
            ResolveError::UnknownSource(format!("source '{name}' has no data"))
        })?;
        let catalog = target_catalog(&catalogs, name, source)?;
        let resolver = SourceResolver::new(source, catalog.kind())?;

        let resolved = resolver.resolve_batch(catalog, &batch.listings);
        let map = aggregate(resolved.entries.iter().cloned());
        let s = source_summary(batch.listings.len(), batch.rejected, &resolved, &map);
        log::debug!(
            "{name}: {}/{} resolved, {} filtered, {} rejected rows",
            s.resolved,
            s.listings,
            s.filtered,
            s.rejected_rows
        );

        summary.sources.insert(name.clone(), s);
        deals.insert(name.clone(), map);
    }

    let mut merged = IndexMap::new();
    for (name, group) in &config.merge {
        let maps = group
            .sources
            .iter()
            .map(|s| {
                deals
                    .get(s)
                    .cloned()
                    .ok_or_else(|| ResolveError::UnknownSource(format!("merge '{name}': {s}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        merged.insert(name.clone(), merge_all(maps));
    }

    Ok(RunResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        products,
        deals,
        merged,
    })
}

/// Resolve ad-hoc titles as if they came from `source`.
pub fn resolve_titles(
    config: &WatchConfig,
    catalogs: &IndexMap<String, Vec<CatalogRecord>>,
    source: &str,
    titles: &[String],
) -> Result<Vec<TitleResolution>, ResolveError> {
    let source_config = config
        .sources
        .get(source)
        .ok_or_else(|| ResolveError::UnknownSource(source.to_string()))?;
    let target = &source_config.target;
    let catalog_config = config
        .catalogs
        .get(target)
        .ok_or_else(|| ResolveError::UnknownCatalog(target.clone()))?;
    let records = catalogs.get(target).ok_or_else(|| {
        ResolveError::UnknownCatalog(format!("catalog '{target}' has no data"))
    })?;

    let catalog = Catalog::from_config(catalog_config, records)?;
    let resolver = SourceResolver::new(source_config, catalog.kind())?;

    Ok(titles
        .iter()
        .map(|t| {
            let (sanitized, resolution) = resolver.resolve_title(&catalog, t);
            TitleResolution::new(t.as_str(), sanitized, resolution)
        })
        .collect())
}

fn build_catalogs(
    config: &WatchConfig,
    input: &RunInput,
) -> Result<IndexMap<String, Catalog>, ResolveError> {
    let mut catalogs = IndexMap::new();
    for (name, catalog_config) in &config.catalogs {
        let records = input.catalogs.get(name).ok_or_else(|| {
            ResolveError::UnknownCatalog(format!("catalog '{name}' has no data"))
        })?;
        catalogs.insert(name.clone(), Catalog::from_config(catalog_config, records)?);
    }
    Ok(catalogs)
}

fn target_catalog<'a>(
    catalogs: &'a IndexMap<String, Catalog>,
    source_name: &str,
    source: &SourceConfig,
) -> Result<&'a Catalog, ResolveError> {
    catalogs.get(&source.target).ok_or_else(|| {
        ResolveError::UnknownCatalog(format!(
            "source '{source_name}': target catalog '{}' not found",
            source.target
        ))
    })
}
