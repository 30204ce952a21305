mod error;
mod name;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use name::{extension_of, generate_name, validate_name};
pub use traits::{BoxReader, PublicStore};
