//! RESP implementation of the store client boundary
//!
//! Builds raw TCP/TLS connections from [`ManagerConfig`] coordinates,
//! authenticates them, and exposes the command set the manager needs. This is
//! the single place where io errors and server `-ERR` replies become
//! [`StoreError`] values.

use super::raw_connection::RawConnection;
use super::store::{StoreConnection, StoreConnector};
use crate::config::ManagerConfig;
use crate::utils::{RespEncoder, RespValue, StoreError};

/// Connector bound to one endpoint's coordinates
#[derive(Clone)]
pub struct RespConnector {
    config: ManagerConfig,
}

impl RespConnector {
    pub fn new(config: ManagerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }
}

impl StoreConnector for RespConnector {
    type Conn = RespConnection;

    fn connect(&self, secret: &str) -> Result<RespConnection, StoreError> {
        let mut raw = RawConnection::open(
            &self.config.hostname,
            self.config.port,
            self.config.connect_timeout,
            self.config.tls.as_ref(),
        )?;

        raw.set_read_timeout(Some(self.config.socket_timeout))
            .map_err(StoreError::from_io)?;
        raw.set_write_timeout(Some(self.config.socket_timeout))
            .map_err(StoreError::from_io)?;

        let mut conn = RespConnection {
            raw: Some(raw),
            encoder: RespEncoder::with_capacity(256),
        };

        conn.authenticate(secret)?;

        // SELECT is rejected by cluster endpoints, which only expose db 0
        if !self.config.cluster_mode {
            conn.select_db(self.config.dbnum)?;
        }

        Ok(conn)
    }
}

/// One authenticated RESP connection
pub struct RespConnection {
    raw: Option<RawConnection>,
    encoder: RespEncoder,
}

impl RespConnection {
    /// Issue one command and classify the reply
    fn request(&mut self, args: &[&str]) -> Result<RespValue, StoreError> {
        let raw = self
            .raw
            .as_mut()
            .ok_or_else(|| StoreError::Connection("connection already closed".to_string()))?;

        self.encoder.clear();
        self.encoder.encode_command_str(args);

        let reply = raw.execute(&self.encoder).map_err(StoreError::from_io)?;

        if let Some(msg) = reply.error_message() {
            return Err(StoreError::from_server_error(msg));
        }
        Ok(reply)
    }

    fn authenticate(&mut self, secret: &str) -> Result<(), StoreError> {
        let reply = self.request(&["AUTH", secret])?;
        if reply.is_ok() {
            Ok(())
        } else {
            Err(StoreError::Protocol(format!(
                "unexpected AUTH reply: {:?}",
                reply
            )))
        }
    }

    fn select_db(&mut self, db: u32) -> Result<(), StoreError> {
        let db_str = db.to_string();
        let reply = self.request(&["SELECT", &db_str])?;
        if reply.is_ok() {
            Ok(())
        } else {
            Err(StoreError::Protocol(format!(
                "unexpected SELECT reply: {:?}",
                reply
            )))
        }
    }
}

impl StoreConnection for RespConnection {
    fn ping(&mut self) -> Result<(), StoreError> {
        match self.request(&["PING"])? {
            RespValue::SimpleString(s) if s == "PONG" => Ok(()),
            other => Err(StoreError::Protocol(format!(
                "unexpected PING reply: {:?}",
                other
            ))),
        }
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        match self.request(&["GET", key])? {
            RespValue::Null => Ok(None),
            RespValue::BulkString(data) => String::from_utf8(data)
                .map(Some)
                .map_err(|e| StoreError::Protocol(format!("non-UTF-8 value: {}", e))),
            other => Err(StoreError::Protocol(format!(
                "unexpected GET reply: {:?}",
                other
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let reply = self.request(&["SET", key, value])?;
        if reply.is_ok() {
            Ok(())
        } else {
            Err(StoreError::Protocol(format!(
                "unexpected SET reply: {:?}",
                reply
            )))
        }
    }

    fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        let secs = seconds.to_string();
        match self.request(&["EXPIRE", key, &secs])? {
            RespValue::Integer(n) => Ok(n == 1),
            other => Err(StoreError::Protocol(format!(
                "unexpected EXPIRE reply: {:?}",
                other
            ))),
        }
    }

    fn del(&mut self, key: &str) -> Result<bool, StoreError> {
        match self.request(&["DEL", key])? {
            RespValue::Integer(n) => Ok(n > 0),
            other => Err(StoreError::Protocol(format!(
                "unexpected DEL reply: {:?}",
                other
            ))),
        }
    }

    fn close(&mut self) -> Result<(), StoreError> {
        if let Some(mut raw) = self.raw.take() {
            raw.shutdown().map_err(StoreError::from_io)?;
        }
        Ok(())
    }
}
