use std::collections::BTreeMap;

/// Ordered key/value map used for fragments and resolved configurations.
pub type ConfigMap = BTreeMap<String, String>;

/// Fold fragments left to right; a later fragment's value for a key
/// replaces any earlier one. Scalar overwrite only, no deep merge.
pub fn merge_fragments<I>(fragments: I) -> ConfigMap
where
    I: IntoIterator<Item = ConfigMap>,
{
    fragments
        .into_iter()
        .fold(ConfigMap::new(), |mut merged, fragment| {
            merged.extend(fragment);
            merged
        })
}
