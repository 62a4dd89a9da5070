#![forbid(unsafe_code)]

mod annotate;
mod mutation;
mod objects;

pub use annotate::annotate_immutable;
pub use mutation::Mutations;
pub use objects::{ObjectInfo, ObjectKey, ObjectRecord};
