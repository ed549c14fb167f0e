use serde_json::Value;

/// Split a flat array into consecutive slices of at most `chunk_size`
/// elements. The last slice may be shorter; an empty array yields none.
///
/// A `chunk_size` of zero is treated as one.
pub fn split_chunks(items: &[Value], chunk_size: usize) -> std::slice::Chunks<'_, Value> {
    items.chunks(chunk_size.max(1))
}
