//! Path-addressed access to parsed JSON documents.

mod lookup;
mod path;

pub use lookup::{JsonError, JsonLookup};
pub use path::JsonPath;
