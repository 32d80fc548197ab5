#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod model;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use model::{License, Project};
pub use traits::{IndexedEntity, ObjectIndexer};
pub use types::{Document, FieldDef, FieldSpec, FailurePolicy, IndexKind, SearchHit};
