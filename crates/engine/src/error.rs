use erd_core::{CoreError, ElementId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("element already present: {0}")]
    DuplicateElement(ElementId),

    #[error("no property at index {index} on {type_name}")]
    UnknownPropertyIndex {
        type_name: &'static str,
        index: usize,
    },
}
