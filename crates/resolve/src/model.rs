use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lens characteristics
// ---------------------------------------------------------------------------

/// Structured description of a lens, as parsed from a catalog or listing title.
///
/// Equality compares `features` as a set: insertion order is kept for
/// iteration (the matcher walks features in title order) but never affects
/// `==`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LensCharacteristics {
    pub series: String,
    pub focal_length: FocalLength,
    pub stops: Stops,
    pub features: IndexSet<String>,
}

/// Focal length in millimetres. `max: None` is a prime, `Some` a zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FocalLength {
    pub min: u32,
    pub max: Option<u32>,
}

impl FocalLength {
    pub fn prime(mm: u32) -> Self {
        Self { min: mm, max: None }
    }

    pub fn zoom(min: u32, max: u32) -> Self {
        Self { min, max: Some(max) }
    }
}

impl fmt::Display for FocalLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}", self.min, max),
            None => write!(f, "{}", self.min),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopKind {
    /// Photographic f-number.
    F,
    /// Transmission stop (cine lenses).
    T,
}

impl StopKind {
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "" | "F" | "f" => Some(Self::F),
            "T" | "t" => Some(Self::T),
            _ => None,
        }
    }
}

impl fmt::Display for StopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F => write!(f, "F"),
            Self::T => write!(f, "T"),
        }
    }
}

/// Aperture rating. Values are rounded to one decimal place at parse time,
/// so exact float comparison is safe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stops {
    pub kind: StopKind,
    pub min: f32,
    pub max: Option<f32>,
}

impl Stops {
    pub fn fixed(kind: StopKind, value: f32) -> Self {
        Self { kind, min: value, max: None }
    }

    pub fn range(kind: StopKind, min: f32, max: f32) -> Self {
        Self { kind, min, max: Some(max) }
    }
}

impl fmt::Display for Stops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}{:.1}-{:.1}", self.kind, self.min, max),
            None => write!(f, "{}{:.1}", self.kind, self.min),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog products
// ---------------------------------------------------------------------------

pub const PRODUCT_PAGE_BASE: &str = "https://fujifilm-x.com/fr-fr/products";

/// A canonical catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category")]
pub enum Product {
    #[serde(rename = "cameras")]
    Camera {
        id: String,
        name: String,
        image_url: String,
    },
    #[serde(rename = "lenses")]
    Lens {
        id: String,
        name: String,
        image_url: String,
        characteristics: Option<LensCharacteristics>,
    },
}

impl Product {
    pub fn id(&self) -> &str {
        match self {
            Self::Camera { id, .. } | Self::Lens { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Camera { name, .. } | Self::Lens { name, .. } => name,
        }
    }

    pub fn image_url(&self) -> &str {
        match self {
            Self::Camera { image_url, .. } | Self::Lens { image_url, .. } => image_url,
        }
    }

    /// URL path segment of the product family on the manufacturer site.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Camera { .. } => "cameras",
            Self::Lens { .. } => "lenses",
        }
    }

    pub fn characteristics(&self) -> Option<&LensCharacteristics> {
        match self {
            Self::Camera { .. } => None,
            Self::Lens { characteristics, .. } => characteristics.as_ref(),
        }
    }

    pub fn product_page_path(&self) -> String {
        format!("{PRODUCT_PAGE_BASE}/{}/{}", self.category(), self.id())
    }
}

// ---------------------------------------------------------------------------
// Deals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeal {
    pub source: String,
    pub price: f64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondHandDeal {
    pub source: String,
    pub price: f64,
    pub url: String,
    pub title: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

/// A priced offer for one product, from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deal {
    New(NewDeal),
    SecondHand(SecondHandDeal),
}

impl Deal {
    pub fn source(&self) -> &str {
        match self {
            Self::New(d) => &d.source,
            Self::SecondHand(d) => &d.source,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            Self::New(d) => d.price,
            Self::SecondHand(d) => d.price,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::New(d) => &d.url,
            Self::SecondHand(d) => &d.url,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::New(d) => d.title.as_deref(),
            Self::SecondHand(d) => Some(&d.title),
        }
    }
}

/// Canonical id → deals, in first-seen id order.
pub type DealMap = IndexMap<String, Vec<Deal>>;

// ---------------------------------------------------------------------------
// Input tuples
// ---------------------------------------------------------------------------

/// One entry of the manufacturer catalog, as scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub raw_id: String,
    pub raw_name: String,
    pub image_url: String,
}

/// One marketplace listing, as scraped.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub raw_title: String,
    pub price: f64,
    pub url: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub publication_date: Option<String>,
    /// Value of the configured filter column, when one is configured.
    pub filter_value: Option<String>,
}

impl Listing {
    pub fn new(raw_title: impl Into<String>, price: f64, url: impl Into<String>) -> Self {
        Self {
            raw_title: raw_title.into(),
            price,
            url: url.into(),
            title: None,
            image_url: None,
            location: None,
            publication_date: None,
            filter_value: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// The grammar did not match the sanitized title.
    NoGrammarMatch,
    /// The grammar matched but a numeric group did not parse.
    MalformedNumber,
    /// Parsed fine, but no catalog entry survived narrowing.
    NoCandidate,
    /// Key-only resolution produced an empty key.
    EmptyKey,
    /// The row could not become a deal (e.g. second-hand without an image).
    IncompleteListing,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGrammarMatch => write!(f, "no_grammar_match"),
            Self::MalformedNumber => write!(f, "malformed_number"),
            Self::NoCandidate => write!(f, "no_candidate"),
            Self::EmptyKey => write!(f, "empty_key"),
            Self::IncompleteListing => write!(f, "incomplete_listing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn into_id(self) -> Option<String> {
        match self {
            Self::Resolved(id) => Some(id),
            Self::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedTitle {
    pub title: String,
    pub sanitized: String,
    pub reason: UnresolvedReason,
}

/// Outcome of resolving a single title, as reported to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleResolution {
    pub title: String,
    pub sanitized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnresolvedReason>,
}

impl TitleResolution {
    pub fn new(title: impl Into<String>, sanitized: String, resolution: Resolution) -> Self {
        let (id, reason) = match resolution {
            Resolution::Resolved(id) => (Some(id), None),
            Resolution::Unresolved(reason) => (None, Some(reason)),
        };
        Self {
            title: title.into(),
            sanitized,
            id,
            reason,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceSummary {
    pub listings: usize,
    pub filtered: usize,
    pub rejected_rows: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub distinct_ids: usize,
    pub reason_counts: IndexMap<String, usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_titles: Vec<UnresolvedTitle>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogSummary {
    pub products: usize,
    pub parsed: usize,
    pub unparsed_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub catalogs: IndexMap<String, CatalogSummary>,
    pub sources: IndexMap<String, SourceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub products: IndexMap<String, Vec<Product>>,
    pub deals: IndexMap<String, DealMap>,
    pub merged: IndexMap<String, DealMap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_set_equality_ignores_order() {
        let a = LensCharacteristics {
            series: "XF".into(),
            focal_length: FocalLength::zoom(16, 55),
            stops: Stops::fixed(StopKind::F, 2.8),
            features: ["R", "LM", "WR"].into_iter().map(String::from).collect(),
        };
        let mut b = a.clone();
        b.features = ["WR", "R", "LM"].into_iter().map(String::from).collect();
        assert_eq!(a, b);

        b.features.shift_remove("WR");
        assert_ne!(a, b);
    }

    #[test]
    fn prime_differs_from_zoom_with_same_min() {
        assert_ne!(FocalLength::prime(16), FocalLength::zoom(16, 16));
    }

    #[test]
    fn display_formats() {
        assert_eq!(FocalLength::zoom(16, 55).to_string(), "16-55");
        assert_eq!(FocalLength::prime(35).to_string(), "35");
        assert_eq!(Stops::fixed(StopKind::F, 2.0).to_string(), "F2.0");
        assert_eq!(Stops::range(StopKind::F, 3.5, 5.6).to_string(), "F3.5-5.6");
        assert_eq!(Stops::fixed(StopKind::T, 2.9).to_string(), "T2.9");
    }

    #[test]
    fn deal_serializes_with_kind_tag() {
        let deal = Deal::New(NewDeal {
            source: "Camara".into(),
            price: 899.0,
            url: "https://shop/x".into(),
            title: None,
        });
        let json = serde_json::to_value(&deal).unwrap();
        assert_eq!(json["kind"], "new");
        assert_eq!(json["price"], 899.0);
        assert!(json.get("title").is_none());

        let deal = Deal::SecondHand(SecondHandDeal {
            source: "Images Photo".into(),
            price: 450.0,
            url: "https://ads/1".into(),
            title: "XF 35mm f/1.4".into(),
            image_url: "https://ads/1.jpg".into(),
            location: Some("Paris".into()),
            publication_date: None,
        });
        let json = serde_json::to_value(&deal).unwrap();
        assert_eq!(json["kind"], "second_hand");
        assert_eq!(json["location"], "Paris");
        assert_eq!(deal.title(), Some("XF 35mm f/1.4"));
    }

    #[test]
    fn product_page_path_uses_category() {
        let lens = Product::Lens {
            id: "XF 35mm F1.4 R".into(),
            name: "XF 35mm F1.4 R".into(),
            image_url: String::new(),
            characteristics: None,
        };
        assert_eq!(
            lens.product_page_path(),
            "https://fujifilm-x.com/fr-fr/products/lenses/XF 35mm F1.4 R"
        );
        let camera = Product::Camera {
            id: "x-t4".into(),
            name: "X-T4".into(),
            image_url: String::new(),
        };
        assert_eq!(camera.category(), "cameras");

        // The serialized tag is the same segment the page path is built from.
        assert_eq!(serde_json::to_value(&lens).unwrap()["category"], lens.category());
        assert_eq!(serde_json::to_value(&camera).unwrap()["category"], "cameras");
    }
}
