pub mod error;

pub use error::{FileIOError, NonUtf8PathError};
