//! Client-side views of server resources

pub mod page;
pub mod resource;

pub use page::Page;
pub use resource::{strip_internal_fields, Resource, INTERNAL_FIELDS};
