use puzlog_puzzle_model::CrosswordMetadata;

/// Field-wise `existing || incoming`. Empty strings count as missing.
///
/// Repeating the merge with the same `incoming` changes nothing, and a field
/// that `existing` already knows is never dropped.
pub fn enrich_metadata(
    existing: &CrosswordMetadata,
    incoming: &CrosswordMetadata,
) -> CrosswordMetadata {
    existing.enrich(incoming)
}
