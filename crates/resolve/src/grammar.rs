//! Title grammars: one whole-string pattern per title dialect.
//!
//! Catalog titles (`XF16-55mmF2.8 R LM WR`) and marketplace titles
//! (`XF 16-55MM F/2,8 R LM WR + pare-soleil`) are written differently but
//! both reduce to a [`LensCharacteristics`]. A grammar names its fields with
//! capture groups, so supporting a new marketplace dialect is a new pattern,
//! not new parsing code.

use std::fmt;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::ResolveError;
use crate::model::{FocalLength, LensCharacteristics, StopKind, Stops};

pub const GROUP_SERIES: &str = "series";
pub const GROUP_FOCAL: &str = "focal";
pub const GROUP_STOP_TYPE: &str = "stop_type";
pub const GROUP_STOPS: &str = "stops";
pub const GROUP_FEATURES: &str = "features";

const REQUIRED_GROUPS: [&str; 5] = [
    GROUP_SERIES,
    GROUP_FOCAL,
    GROUP_STOP_TYPE,
    GROUP_STOPS,
    GROUP_FEATURES,
];

const CATALOG_PATTERN: &str = r"(?P<series>[A-Z]*)(?P<focal>[0-9.-]*)(?i:mm)(?P<stop_type>[FT])(?P<stops>[0-9.-]*) ?(?P<features>[a-zA-Z ]*)";

const MARKETPLACE_PATTERN: &str = r"(?P<series>[A-Z]*) ?(?P<focal>[0-9-]*) ?(?:MM)? ?(?P<stop_type>[FT])?/?(?P<stops>[0-9,.-]*) ?(?P<features>[A-Z ]*)(?:\+.*)?";

const DEFAULT_COLORS: [&str; 2] = ["argent", "noir"];
const DEFAULT_SHAPES: [&str; 1] = ["pancake"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinGrammar {
    /// Manufacturer product names, no spaces between fields.
    Catalog,
    /// Upper-cased shop and classified-ad titles.
    Marketplace,
}

impl BuiltinGrammar {
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Catalog => CATALOG_PATTERN,
            Self::Marketplace => MARKETPLACE_PATTERN,
        }
    }
}

/// Why a title did not yield characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    NoMatch,
    MalformedNumber { field: &'static str, token: String },
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => write!(f, "title does not match grammar"),
            Self::MalformedNumber { field, token } => {
                write!(f, "malformed {field} '{token}'")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    pattern: Regex,
    colors: Vec<String>,
    shapes: Vec<String>,
}

impl Grammar {
    /// Compile `pattern` as a whole-string grammar. All five named groups
    /// must be present (they may be optional within the pattern).
    pub fn new(pattern: &str) -> Result<Self, ResolveError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|e| ResolveError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for group in REQUIRED_GROUPS {
            if !names.contains(&group) {
                return Err(ResolveError::MissingGroup { group });
            }
        }

        Ok(Self {
            pattern: regex,
            colors: DEFAULT_COLORS.iter().map(|s| s.to_string()).collect(),
            shapes: DEFAULT_SHAPES.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn builtin(which: BuiltinGrammar) -> Self {
        Self::new(which.pattern()).expect("builtin grammar carries every group")
    }

    pub fn catalog() -> Self {
        Self::builtin(BuiltinGrammar::Catalog)
    }

    pub fn marketplace() -> Self {
        Self::builtin(BuiltinGrammar::Marketplace)
    }

    /// Replace the colour descriptors dropped from the feature blob.
    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = colors;
        self
    }

    /// Replace the shape descriptors dropped from the feature blob.
    pub fn with_shapes(mut self, shapes: Vec<String>) -> Self {
        self.shapes = shapes;
        self
    }

    pub fn parse(&self, title: &str) -> Result<LensCharacteristics, ParseFailure> {
        let caps = self.pattern.captures(title).ok_or(ParseFailure::NoMatch)?;

        let focal = group(&caps, GROUP_FOCAL);
        let stops = group(&caps, GROUP_STOPS);
        // A title with no numbers at all was never a lens name.
        if focal.is_empty() || stops.is_empty() {
            return Err(ParseFailure::NoMatch);
        }

        let series = group(&caps, GROUP_SERIES).to_string();
        let focal_length = parse_focal(focal)?;

        let marker = group(&caps, GROUP_STOP_TYPE);
        let kind = StopKind::from_marker(marker).ok_or_else(|| ParseFailure::MalformedNumber {
            field: GROUP_STOP_TYPE,
            token: marker.to_string(),
        })?;
        let stops = parse_stops(kind, stops)?;

        let features = group(&caps, GROUP_FEATURES)
            .split_whitespace()
            .filter(|t| !self.is_descriptor(t))
            .map(|t| t.to_uppercase())
            .collect();

        Ok(LensCharacteristics {
            series,
            focal_length,
            stops,
            features,
        })
    }

    fn is_descriptor(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        self.colors.iter().chain(&self.shapes).any(|d| d.to_lowercase() == lower)
    }
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map_or("", |m| m.as_str())
}

fn parse_focal(text: &str) -> Result<FocalLength, ParseFailure> {
    let malformed = || ParseFailure::MalformedNumber {
        field: GROUP_FOCAL,
        token: text.to_string(),
    };
    let parts = text
        .split('-')
        .map(|p| p.parse::<u32>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [mm] => Ok(FocalLength::prime(*mm)),
        [min, max] if min <= max => Ok(FocalLength::zoom(*min, *max)),
        _ => Err(malformed()),
    }
}

fn parse_stops(kind: StopKind, text: &str) -> Result<Stops, ParseFailure> {
    let malformed = || ParseFailure::MalformedNumber {
        field: GROUP_STOPS,
        token: text.to_string(),
    };
    let parts = text
        .split('-')
        .map(|p| {
            p.replace(',', ".")
                .parse::<f32>()
                .map(round_tenth)
                .map_err(|_| malformed())
        })
        .collect::<Result<Vec<_>, _>>()?;

    match parts.as_slice() {
        [v] => Ok(Stops::fixed(kind, *v)),
        [min, max] if min <= max => Ok(Stops::range(kind, *min, *max)),
        _ => Err(malformed()),
    }
}

/// Snap to one decimal so `2.8`, `2.80` and `2,8` compare equal.
fn round_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}
