//! `lenswatch run | validate | resolve`: config-driven deal resolution.

use std::path::{Path, PathBuf};

use lenswatch_resolve::ingest::{load_catalog_csv, load_listing_csv};
use lenswatch_resolve::model::TitleResolution;
use lenswatch_resolve::{report, resolve_titles, ResolveError, RunInput, WatchConfig};

use crate::exit_codes::EXIT_UNRESOLVED;
use crate::CliError;

fn read_config(config_path: &Path) -> Result<WatchConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::runtime(format!("cannot read config: {e}")))?;
    WatchConfig::from_toml(&config_str).map_err(|e| {
        CliError::config(e.to_string())
            .with_hint(format!("check {}", config_path.display()))
    })
}

/// Data files are resolved relative to the config file's directory.
fn base_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

fn read_data(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", path.display())))
}

fn load_catalogs(config: &WatchConfig, base: &Path) -> Result<RunInput, CliError> {
    let mut input = RunInput::default();
    for (name, catalog) in &config.catalogs {
        let path = base.join(&catalog.file);
        let data = read_data(&path)?;
        let records = load_catalog_csv(&catalog.file, &data, &catalog.columns)
            .map_err(|e| CliError::runtime(e.to_string()))?;
        log::debug!("catalog {name}: {} records from {}", records.len(), path.display());
        input.catalogs.insert(name.clone(), records);
    }
    Ok(input)
}

fn load_sources(config: &WatchConfig, base: &Path, input: &mut RunInput) -> Result<(), CliError> {
    for (name, source) in &config.sources {
        let path = base.join(&source.file);
        let data = read_data(&path)?;
        let filter_column = source.filter.as_ref().map(|f| f.column.as_str());
        let batch = load_listing_csv(&source.file, &data, &source.columns, filter_column)
            .map_err(|e| CliError::runtime(e.to_string()))?;
        log::debug!(
            "source {name}: {} listings, {} rejected rows from {}",
            batch.listings.len(),
            batch.rejected,
            path.display()
        );
        input.sources.insert(name.clone(), batch);
    }
    Ok(())
}

pub fn cmd_run(config_path: PathBuf, json_output: bool, output_file: Option<PathBuf>) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let base = base_dir(&config_path);

    let mut input = load_catalogs(&config, base)?;
    load_sources(&config, base, &mut input)?;

    let result = lenswatch_resolve::run(&config, &input)
        .map_err(|e| CliError::runtime(e.to_string()))?;
    report::log_summary(&result);

    // Output
    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    // Human summary to stderr
    let s = &result.summary;
    let products: usize = result.products.values().map(Vec::len).sum();
    eprintln!(
        "'{}': {} catalog product(s), {} source(s), {} merge group(s)",
        result.meta.config_name,
        products,
        s.sources.len(),
        result.merged.len(),
    );
    for (name, src) in &s.sources {
        eprintln!(
            "  {name}: {} listing(s), {} resolved to {} product(s), {} unresolved, {} filtered, {} rejected",
            src.listings, src.resolved, src.distinct_ids, src.unresolved, src.filtered, src.rejected_rows,
        );
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: '{}' with {} catalog(s), {} source(s), {} merge group(s)",
        config.name,
        config.catalogs.len(),
        config.sources.len(),
        config.merge.len(),
    );
    Ok(())
}

pub fn cmd_resolve(
    config_path: PathBuf,
    source: &str,
    titles: &[String],
    json_output: bool,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    if !config.sources.contains_key(source) {
        let known: Vec<&str> = config.sources.keys().map(String::as_str).collect();
        return Err(CliError::usage(format!("unknown source: \"{source}\""))
            .with_hint(format!("configured sources: {}", known.join(", "))));
    }

    let input = load_catalogs(&config, base_dir(&config_path))?;
    let resolved = resolve_titles(&config, &input.catalogs, source, titles).map_err(|e| match e {
        ResolveError::UnknownSource(_) => CliError::usage(e.to_string()),
        e => CliError::runtime(e.to_string()),
    })?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&resolved)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for r in &resolved {
            println!("{}", describe(r));
        }
    }

    let unresolved = resolved.iter().filter(|r| !r.is_resolved()).count();
    if unresolved > 0 {
        return Err(CliError {
            code: EXIT_UNRESOLVED,
            message: format!("{unresolved} of {} title(s) unresolved", resolved.len()),
            hint: Some("run with -vv to trace the matcher".into()),
        });
    }
    Ok(())
}

fn describe(r: &TitleResolution) -> String {
    match (&r.id, &r.reason) {
        (Some(id), _) => format!("{} => {id}", r.title),
        (None, Some(reason)) => format!("{} => unresolved ({reason}, saw \"{}\")", r.title, r.sanitized),
        (None, None) => format!("{} => unresolved", r.title),
    }
}
