//! Free-form database metadata.

use crate::config::SaveOrderConfig;
use crate::model::groups::GroupTreeNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Prefix marking a comment block as metadata.
pub const META_FLAG: &str = "jabref-meta: ";
/// Key holding the stored save order.
pub const SAVE_ORDER_CONFIG: &str = "saveOrderConfig";
/// Key holding the configured save actions.
pub const SAVE_ACTIONS: &str = "saveActions";
/// Key of the group tree version block.
pub const GROUPS_VERSION_KEY: &str = "groupsversion";
/// Key of the group tree block.
pub const GROUPS_TREE_KEY: &str = "groupstree";
/// Version of the group tree serialization.
pub const GROUPS_VERSION: u32 = 3;

/// Backslash-escapes `;` and `\` in `text`.
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ';' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Ordered key to value-list metadata plus the group tree.
///
/// The group keys ([`GROUPS_VERSION_KEY`], [`GROUPS_TREE_KEY`]) are reserved:
/// the tree is held in [`MetaData::groups`] and written from there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    #[serde(default)]
    data: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    groups: Option<GroupTreeNode>,
}

impl MetaData {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the values stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Stores `values` under `key`, replacing previous values.
    pub fn put(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.data.insert(key.into(), values);
    }

    /// Removes `key`.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.data.remove(key)
    }

    /// Iterates non-group entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.data
            .iter()
            .filter(|(key, _)| !is_group_key(key))
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Returns the group tree root.
    #[must_use]
    pub fn groups(&self) -> Option<&GroupTreeNode> {
        self.groups.as_ref()
    }

    /// Replaces the group tree.
    pub fn set_groups(&mut self, root: GroupTreeNode) {
        self.groups = Some(root);
    }

    /// Returns the stored save order.
    ///
    /// Malformed data is logged and treated as absent.
    #[must_use]
    pub fn save_order_config(&self) -> Option<SaveOrderConfig> {
        let values = self.get(SAVE_ORDER_CONFIG)?;
        match SaveOrderConfig::parse(values) {
            Ok(config) => Some(config),
            Err(reason) => {
                warn!(%reason, "ignoring malformed stored save order");
                None
            }
        }
    }

    /// Stores `config` as the save order.
    pub fn set_save_order_config(&mut self, config: &SaveOrderConfig) {
        self.put(SAVE_ORDER_CONFIG, config.to_values());
    }
}

fn is_group_key(key: &str) -> bool {
    key == GROUPS_VERSION_KEY || key == GROUPS_TREE_KEY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortCriterion;

    #[test]
    fn quote_escapes_separator_and_escape() {
        assert_eq!(quote("a;b"), "a\\;b");
        assert_eq!(quote("c:\\dir"), "c:\\\\dir");
        assert_eq!(quote("plain"), "plain");
    }

    #[test]
    fn iter_skips_group_keys() {
        let mut meta = MetaData::new();
        meta.put("fileDirectory", vec!["/pdfs".into()]);
        meta.put(GROUPS_VERSION_KEY, vec!["3".into()]);
        meta.put(GROUPS_TREE_KEY, vec!["0 AllEntriesGroup:".into()]);
        meta.put("databaseType", vec!["bibtex".into()]);

        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["databaseType", "fileDirectory"]);
    }

    #[test]
    fn save_order_round_trip() {
        let mut meta = MetaData::new();
        let config = SaveOrderConfig::specified([
            SortCriterion::ascending("year"),
            SortCriterion::descending("author"),
            SortCriterion::none(),
        ]);
        meta.set_save_order_config(&config);
        assert_eq!(meta.save_order_config(), Some(config));
    }

    #[test]
    fn malformed_save_order_is_absent() {
        let mut meta = MetaData::new();
        meta.put(SAVE_ORDER_CONFIG, vec!["sideways".into()]);
        assert_eq!(meta.save_order_config(), None);
    }
}
