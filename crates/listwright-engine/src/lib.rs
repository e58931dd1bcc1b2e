pub mod dom;
pub mod editing;
pub mod error;
pub mod label;
pub mod lists;
pub mod options;
pub mod ordinal;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use dom::{Direction, Document, NodeId, Tree};
pub use editing::{Cmd, ListEditor, ListKind, ListPatch, LineKind, OutlineLine, SplitPoint};
pub use error::ListError;
pub use label::LabelParts;
pub use lists::{ItemRange, LabelReport, ListArray, ListChange, ListRecord};
pub use options::{EnterMode, ListOptions};
pub use ordinal::{OrdinalError, OrdinalType};
