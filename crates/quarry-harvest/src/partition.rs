//! Even division of a work list across accounts.

/// Split `items` into `n` contiguous partitions.
///
/// Concatenating the partitions in order gives back `items`. Lengths differ
/// by at most one; the first `items.len() % n` partitions get the extra item.
/// With more partitions than items the trailing ones are empty, and `n == 0`
/// yields no partitions.
pub fn divide<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    if n == 0 {
        return Vec::new();
    }

    let base = items.len() / n;
    let extra = items.len() % n;
    let mut rest = items.into_iter();

    (0..n)
        .map(|index| {
            let len = base + usize::from(index < extra);
            rest.by_ref().take(len).collect()
        })
        .collect()
}
