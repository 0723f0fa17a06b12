use crate::model::LensCharacteristics;

/// Narrow `candidates` to the single catalog entry `parsed` describes.
///
/// Series, focal length and stops must match exactly. Remaining duplicates
/// are separated by the parsed feature tokens, in title order, stopping as
/// soon as one candidate is left. If features run out first, the candidate
/// with the fewest features wins (first in catalog order on equal counts).
/// An empty candidate set at any step is a miss; there is no looser retry.
pub fn resolve<'c>(
    parsed: &LensCharacteristics,
    candidates: &'c [LensCharacteristics],
) -> Option<&'c LensCharacteristics> {
    let mut remaining: Vec<&LensCharacteristics> = candidates
        .iter()
        .filter(|c| c.series == parsed.series)
        .filter(|c| c.focal_length == parsed.focal_length)
        .filter(|c| c.stops == parsed.stops)
        .collect();

    log::trace!(
        "{} {}mm {}: {} of {} candidates after exact narrowing",
        parsed.series,
        parsed.focal_length,
        parsed.stops,
        remaining.len(),
        candidates.len()
    );

    if remaining.len() == 1 {
        return remaining.pop();
    }

    for feature in &parsed.features {
        remaining.retain(|c| c.features.contains(feature));
        log::trace!("feature {feature}: {} candidates left", remaining.len());
        match remaining.len() {
            0 => return None,
            1 => return remaining.pop(),
            _ => {}
        }
    }

    remaining.into_iter().min_by_key(|c| c.features.len())
}
