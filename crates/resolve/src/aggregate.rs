use crate::model::{Deal, DealMap};

/// Group resolved deals by canonical id. Entries without an id are dropped.
///
/// Ids keep first-seen order; deals keep production order within their id.
pub fn aggregate<I>(entries: I) -> DealMap
where
    I: IntoIterator<Item = (Option<String>, Deal)>,
{
    let mut groups = DealMap::new();
    for (id, deal) in entries {
        if let Some(id) = id {
            groups.entry(id).or_default().push(deal);
        }
    }
    groups
}

/// Union of two sources' mappings: `left`'s ids first, then ids only `right`
/// has. Lists are concatenated left-then-right; duplicates are kept.
pub fn merge(mut left: DealMap, right: DealMap) -> DealMap {
    for (id, deals) in right {
        left.entry(id).or_default().extend(deals);
    }
    left
}

/// Fold [`merge`] over several sources, in the order given.
pub fn merge_all<I>(maps: I) -> DealMap
where
    I: IntoIterator<Item = DealMap>,
{
    maps.into_iter().fold(DealMap::new(), merge)
}
