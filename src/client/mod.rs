//! Client connection layer

pub mod raw_connection;
pub mod resp_store;
pub mod store;

pub use raw_connection::RawConnection;
pub use resp_store::{RespConnection, RespConnector};
pub use store::{StoreConnection, StoreConnector};
