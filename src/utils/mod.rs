//! Utility modules

pub mod error;
pub mod resp;

pub use error::{ManagerError, Result, StoreError};
pub use resp::{RespDecoder, RespEncoder, RespValue};
