use csv::StringRecord;

use crate::config::{CatalogColumns, ListingColumns};
use crate::error::ResolveError;
use crate::model::{CatalogRecord, Listing};

/// Listings read from one source file.
#[derive(Debug, Clone, Default)]
pub struct ListingBatch {
    pub listings: Vec<Listing>,
    /// Rows skipped because their price did not parse.
    pub rejected: usize,
}

/// Parse a shop price: `1 299 €`, `1 299,00 € TTC`, `849,90 €`, `1299.5`.
///
/// Everything but digits, separators and sign is dropped, then a decimal
/// comma becomes a dot.
pub fn parse_price(text: &str) -> Option<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if kept.is_empty() {
        return None;
    }
    kept.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Header lookup for one CSV file.
struct Columns {
    file: String,
    headers: Vec<String>,
}

impl Columns {
    fn read(file: &str, reader: &mut csv::Reader<&[u8]>) -> Result<Self, ResolveError> {
        let headers = reader
            .headers()
            .map_err(|e| csv_error(file, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self {
            file: file.to_string(),
            headers,
        })
    }

    fn index(&self, name: &str) -> Result<usize, ResolveError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ResolveError::MissingColumn {
                file: self.file.clone(),
                column: name.into(),
            })
    }

    fn optional(&self, name: Option<&String>) -> Result<Option<usize>, ResolveError> {
        name.map(|n| self.index(n)).transpose()
    }
}

fn csv_error(file: &str, e: csv::Error) -> ResolveError {
    ResolveError::Csv {
        file: file.to_string(),
        reason: e.to_string(),
    }
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

fn optional_field(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.map(|i| field(record, i))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes())
}

/// Load catalog triples. `file` only names the data in errors.
pub fn load_catalog_csv(
    file: &str,
    csv_data: &str,
    columns: &CatalogColumns,
) -> Result<Vec<CatalogRecord>, ResolveError> {
    let mut reader = reader(csv_data);
    let cols = Columns::read(file, &mut reader)?;

    let id_idx = cols.index(&columns.id)?;
    let name_idx = cols.index(&columns.name)?;
    let image_idx = cols.index(&columns.image_url)?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(file, e))?;
        records.push(CatalogRecord {
            raw_id: field(&record, id_idx).to_string(),
            raw_name: field(&record, name_idx).to_string(),
            image_url: field(&record, image_idx).to_string(),
        });
    }
    Ok(records)
}

/// Load marketplace listings. Rows with an unparsable price are counted in
/// [`ListingBatch::rejected`] and skipped.
pub fn load_listing_csv(
    file: &str,
    csv_data: &str,
    columns: &ListingColumns,
    filter_column: Option<&str>,
) -> Result<ListingBatch, ResolveError> {
    let mut reader = reader(csv_data);
    let cols = Columns::read(file, &mut reader)?;

    let title_idx = cols.index(&columns.title)?;
    let price_idx = cols.index(&columns.price)?;
    let url_idx = cols.index(&columns.url)?;
    let display_idx = cols.optional(columns.display_title.as_ref())?;
    let image_idx = cols.optional(columns.image_url.as_ref())?;
    let location_idx = cols.optional(columns.location.as_ref())?;
    let date_idx = cols.optional(columns.publication_date.as_ref())?;
    let filter_idx = filter_column.map(|c| cols.index(c)).transpose()?;

    let mut batch = ListingBatch::default();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(file, e))?;

        let price_text = field(&record, price_idx);
        let Some(price) = parse_price(price_text) else {
            log::warn!("{file}: row {}: rejected price '{price_text}'", line + 2);
            batch.rejected += 1;
            continue;
        };

        let mut listing = Listing::new(field(&record, title_idx), price, field(&record, url_idx));
        listing.title = optional_field(&record, display_idx);
        listing.image_url = optional_field(&record, image_idx);
        listing.location = optional_field(&record, location_idx);
        listing.publication_date = optional_field(&record, date_idx);
        listing.filter_value = filter_idx.map(|i| field(&record, i).to_string());
        batch.listings.push(listing);
    }

    Ok(batch)
}
