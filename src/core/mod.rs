pub mod error;
pub mod value;

pub use error::{DaoError, Result};
pub use value::{FieldValues, Value};
