/// Sorts newest first by `key`. Items whose key is `None` go last.
///
/// Ties keep no particular order.
pub fn sort_newest_first<T, K, F>(items: &mut [T], key: F)
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    items.sort_unstable_by(|a, b| key(b).cmp(&key(a)));
}
