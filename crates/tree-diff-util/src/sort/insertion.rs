/// Stable insertion sort with a key extraction function.
///
/// Faster than the standard sort for the handful of entries it is used
/// on, and never reorders equal elements.
///
/// # Examples
///
/// ```
/// use tree_diff_util::sort::insertion_sort_by_key;
///
/// let mut arr = vec!["aaa", "b", "cc"];
/// insertion_sort_by_key(&mut arr, |s| s.len());
/// assert_eq!(arr, vec!["b", "cc", "aaa"]);
/// ```
pub fn insertion_sort_by_key<T, K, F>(arr: &mut [T], mut key: F)
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    let len = arr.len();
    for i in 1..len {
        let mut j = i;
        while j > 0 && key(&arr[j - 1]) > key(&arr[j]) {
            arr.swap(j - 1, j);
            j -= 1;
        }
    }
}
