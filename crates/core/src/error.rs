use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("property {type_name}.{property} cannot be read")]
    UnreadableProperty {
        type_name: &'static str,
        property: &'static str,
    },

    #[error("unknown property {type_name}.{property}")]
    UnknownProperty {
        type_name: &'static str,
        property: String,
    },

    #[error("type mismatch for {property}: expected {expected}, found {found}")]
    TypeMismatch {
        property: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid value for {property}: {reason}")]
    InvalidValue {
        property: &'static str,
        reason: String,
    },
}
