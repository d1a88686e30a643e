/// Split `items` into ordered groups of at most `size`.
///
/// Only the last group may be shorter; an empty input yields no groups.
/// A zero `size` is treated as one.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}
