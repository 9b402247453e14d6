use grocer_core::ResultItem;
use std::collections::HashSet;

/// Concatenates literal results (already priority-then-normal) with semantic
/// results and keeps the first `limit` items.
///
/// With `dedupe`, an item whose catalog id was already emitted is dropped, so
/// the earliest bucket wins. Items without an id are always kept.
pub fn merge(
    literal: Vec<ResultItem>,
    semantic: Vec<ResultItem>,
    limit: usize,
    dedupe: bool,
) -> Vec<ResultItem> {
    let combined = literal.into_iter().chain(semantic);

    if !dedupe {
        return combined.take(limit).collect();
    }

    let mut seen: HashSet<String> = HashSet::new();
    combined
        .filter(|item| match &item.id {
            Some(id) => seen.insert(id.clone()),
            None => true,
        })
        .take(limit)
        .collect()
}
