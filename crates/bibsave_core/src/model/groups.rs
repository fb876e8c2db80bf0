//! Group tree stored in database metadata.

use crate::model::metadata::quote;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// How a group combines with its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupContext {
    /// Membership independent of the parent.
    #[default]
    Independent,
    /// Intersection with the parent.
    Refining,
    /// Union with all subgroups.
    Including,
}

impl GroupContext {
    /// Numeric code used in the serialized tree.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Independent => 0,
            Self::Refining => 1,
            Self::Including => 2,
        }
    }
}

/// A group definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Group {
    /// The implicit root containing every record.
    AllEntries,
    /// Records listed by citation key.
    Explicit {
        /// Display name.
        name: String,
        /// Combination with the parent.
        #[serde(default)]
        context: GroupContext,
        /// Member citation keys.
        #[serde(default)]
        keys: Vec<String>,
    },
    /// Records whose field contains a keyword.
    Keyword {
        /// Display name.
        name: String,
        /// Combination with the parent.
        #[serde(default)]
        context: GroupContext,
        /// Field searched.
        field: String,
        /// Keyword or pattern.
        expression: String,
        /// Case-sensitive matching.
        #[serde(default)]
        case_sensitive: bool,
        /// Treat the expression as a regular expression.
        #[serde(default)]
        regex: bool,
    },
    /// Records matching a free-text search.
    Search {
        /// Display name.
        name: String,
        /// Combination with the parent.
        #[serde(default)]
        context: GroupContext,
        /// Search expression.
        expression: String,
        /// Case-sensitive matching.
        #[serde(default)]
        case_sensitive: bool,
        /// Treat the expression as a regular expression.
        #[serde(default)]
        regex: bool,
    },
}

fn flag(value: bool) -> char {
    if value {
        '1'
    } else {
        '0'
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllEntries => f.write_str("AllEntriesGroup:"),
            Self::Explicit { name, context, keys } => {
                write!(f, "ExplicitGroup:{};{};", quote(name), context.code())?;
                for key in keys {
                    write!(f, "{};", quote(key))?;
                }
                Ok(())
            }
            Self::Keyword {
                name,
                context,
                field,
                expression,
                case_sensitive,
                regex,
            } => write!(
                f,
                "KeywordGroup:{};{};{};{};{};{};",
                quote(name),
                context.code(),
                quote(field),
                quote(expression),
                flag(*case_sensitive),
                flag(*regex)
            ),
            Self::Search {
                name,
                context,
                expression,
                case_sensitive,
                regex,
            } => write!(
                f,
                "SearchGroup:{};{};{};{};{};",
                quote(name),
                context.code(),
                quote(expression),
                flag(*case_sensitive),
                flag(*regex)
            ),
        }
    }
}

/// A node in the group hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTreeNode {
    group: Group,
    #[serde(default)]
    children: Vec<GroupTreeNode>,
}

impl GroupTreeNode {
    /// Creates a leaf node.
    #[must_use]
    pub fn new(group: Group) -> Self {
        Self {
            group,
            children: Vec::new(),
        }
    }

    /// Creates the implicit root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new(Group::AllEntries)
    }

    /// Appends a child and returns the node.
    #[must_use]
    pub fn with_child(mut self, child: GroupTreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a child.
    pub fn add_child(&mut self, child: GroupTreeNode) {
        self.children.push(child);
    }

    /// Returns the group at this node.
    #[must_use]
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Returns the direct children.
    #[must_use]
    pub fn children(&self) -> &[GroupTreeNode] {
        &self.children
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Flattens the tree in pre-order, one `"<level> <group>"` line per node.
    #[must_use]
    pub fn tree_as_string(&self) -> String {
        let mut out = String::new();
        self.append_lines(0, &mut out);
        out
    }

    fn append_lines(&self, level: usize, out: &mut String) {
        let _ = writeln!(out, "{level} {}", self.group);
        for child in &self.children {
            child.append_lines(level + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explicit(name: &str, keys: &[&str]) -> Group {
        Group::Explicit {
            name: name.to_string(),
            context: GroupContext::Independent,
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn group_serialization() {
        assert_eq!(Group::AllEntries.to_string(), "AllEntriesGroup:");
        assert_eq!(
            explicit("Read; later", &["a", "b"]).to_string(),
            "ExplicitGroup:Read\\; later;0;a;b;"
        );

        let keyword = Group::Keyword {
            name: "ML".into(),
            context: GroupContext::Refining,
            field: "keywords".into(),
            expression: "learning".into(),
            case_sensitive: false,
            regex: true,
        };
        assert_eq!(keyword.to_string(), "KeywordGroup:ML;1;keywords;learning;0;1;");

        let search = Group::Search {
            name: "Recent".into(),
            context: GroupContext::Including,
            expression: "year>2020".into(),
            case_sensitive: true,
            regex: false,
        };
        assert_eq!(search.to_string(), "SearchGroup:Recent;2;year>2020;1;0;");
    }

    #[test]
    fn tree_lines_are_preorder() {
        let tree = GroupTreeNode::root()
            .with_child(GroupTreeNode::new(explicit("A", &[])).with_child(GroupTreeNode::new(explicit("A1", &["k"]))))
            .with_child(GroupTreeNode::new(explicit("B", &[])));

        assert_eq!(tree.child_count(), 2);
        assert_eq!(
            tree.tree_as_string(),
            "0 AllEntriesGroup:\n1 ExplicitGroup:A;0;\n2 ExplicitGroup:A1;0;k;\n1 ExplicitGroup:B;0;\n"
        );
    }
}
