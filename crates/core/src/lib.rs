pub mod config;
pub mod error;
pub mod ids;
pub mod schema;
pub mod value;

pub use config::{EditorConfig, PropertyOrder};
pub use error::CoreError;
pub use ids::*;
pub use schema::{Element, PropertyDescriptor, PropertySchema};
pub use value::{MultiLineString, PropertyValue, Snapshot};
