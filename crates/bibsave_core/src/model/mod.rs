//! Database model consumed by the writer.
//!
//! The writer only reads these types. Transformations produce copies.

mod database;
mod entry_types;
mod groups;
pub(crate) mod metadata;
mod record;
mod string_macro;

pub use database::{Database, DatabaseContext};
pub use entry_types::{is_standard_type, DatabaseMode, EntryTypeSpec, TypeDefinition, TypeRegistry};
pub use groups::{Group, GroupContext, GroupTreeNode};
pub use metadata::{
    quote, MetaData, GROUPS_TREE_KEY, GROUPS_VERSION, GROUPS_VERSION_KEY, META_FLAG, SAVE_ACTIONS,
    SAVE_ORDER_CONFIG,
};
pub use record::{Record, RecordId, CROSSREF_FIELD, KEY_FIELD, TYPE_FIELD};
pub use string_macro::{MacroCategory, StringMacro};
