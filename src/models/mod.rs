pub mod enums;
pub mod incident;
pub mod notification;
pub mod patient;
pub mod user;

pub use enums::*;
pub use incident::*;
pub use notification::*;
pub use patient::*;
pub use user::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
