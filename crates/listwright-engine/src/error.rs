use crate::dom::NodeId;
use crate::ordinal::OrdinalError;

/// Failures of a structural list operation. Any of these means the live
/// tree was left as it was.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("Invalid indent transition at record {index}: indent {indent} under level {level}")]
    InvalidIndent { index: usize, indent: i32, level: i32 },
    #[error("Start index {start} is outside a list array of {len} records")]
    StartOutOfRange { start: usize, len: usize },
    #[error("Node {0:?} is not a list container")]
    NotAList(NodeId),
    #[error("List item {0:?} has no owning container")]
    MissingContainer(NodeId),
    #[error(transparent)]
    Ordinal(#[from] OrdinalError),
}
