//! Metadata comment blocks.

use crate::error::SaveResult;
use crate::model::{quote, MetaData, GROUPS_TREE_KEY, GROUPS_VERSION, GROUPS_VERSION_KEY, META_FLAG};
use bibsave_storage::TextSink;
use std::fmt::Write as _;

/// Writes every metadata entry, then the group tree if it has children.
///
/// Returns the number of blocks written.
pub(crate) fn write_metadata<S: TextSink + ?Sized>(metadata: &MetaData, sink: &mut S) -> SaveResult<usize> {
    let mut blocks = 0;

    for (key, values) in metadata.iter() {
        let mut block = format!("\n\n@Comment{{{META_FLAG}{key}:");
        for value in values {
            block.push_str(&quote(value));
            block.push(';');
        }
        block.push('}');
        sink.write_str(&block)?;
        blocks += 1;
    }

    let Some(root) = metadata.groups().filter(|root| root.child_count() > 0) else {
        return Ok(blocks);
    };

    sink.write_str(&format!(
        "\n\n@Comment{{{META_FLAG}{GROUPS_VERSION_KEY}:{GROUPS_VERSION};}}"
    ))?;

    let mut block = format!("\n\n@Comment{{{META_FLAG}{GROUPS_TREE_KEY}:\n");
    for line in root.tree_as_string().lines().filter(|l| !l.is_empty()) {
        let _ = writeln!(block, "{};", quote(line));
    }
    block.push('}');
    sink.write_str(&block)?;

    Ok(blocks + 2)
}
