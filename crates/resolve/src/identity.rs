use crate::model::LensCharacteristics;

/// Canonical join key for a lens: `"{series} {focal}mm {stops} {features}"`.
///
/// Features are sorted so the key does not depend on the order a title
/// listed them in. With no features the key still ends with the separating
/// space. The key is never parsed back.
pub fn identity(c: &LensCharacteristics) -> String {
    let mut features: Vec<&str> = c.features.iter().map(String::as_str).collect();
    features.sort_unstable();
    format!(
        "{} {}mm {} {}",
        c.series,
        c.focal_length,
        c.stops,
        features.join(" ")
    )
}

/// Human-readable name: same shape as [`identity`], features in title order.
pub fn display_name(c: &LensCharacteristics) -> String {
    let base = format!("{} {}mm {}", c.series, c.focal_length, c.stops);
    if c.features.is_empty() {
        base
    } else {
        let features: Vec<&str> = c.features.iter().map(String::as_str).collect();
        format!("{base} {}", features.join(" "))
    }
}
