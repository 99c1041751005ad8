//! Raw TCP/TLS transport to a single store endpoint
//!
//! One connection, one request/response in flight at a time. All failures at
//! this layer are io-level or TLS-level; RESP error replies are classified by
//! the layer above.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::TlsConfig;
use crate::utils::{RespDecoder, RespEncoder, RespValue, StoreError};

/// Raw connection wrapper (TCP or TLS)
///
/// TCP splits into separate buffered reader/writer halves. TLS keeps a single
/// stream since native-tls streams cannot be cloned.
pub enum RawConnection {
    Tcp {
        writer: BufWriter<TcpStream>,
        reader: BufReader<TcpStream>,
    },
    #[cfg(feature = "native-tls-backend")]
    NativeTls {
        stream: Box<native_tls::TlsStream<TcpStream>>,
    },
}

impl RawConnection {
    /// Open a connection, plain TCP or TLS depending on `tls`
    pub fn open(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        tls: Option<&TlsConfig>,
    ) -> Result<Self, StoreError> {
        match tls {
            #[cfg(feature = "native-tls-backend")]
            Some(tls_config) => Self::open_tls(host, port, connect_timeout, tls_config),
            #[cfg(not(feature = "native-tls-backend"))]
            Some(_) => Err(StoreError::Connection(
                "TLS requested but support not compiled in".to_string(),
            )),
            None => Self::open_tcp(host, port, connect_timeout),
        }
    }

    fn connect_stream(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<TcpStream, StoreError> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| StoreError::Connection(format!("resolve {}:{}: {}", host, port, e)))?
            .next()
            .ok_or_else(|| {
                StoreError::Connection(format!("no addresses found for {}:{}", host, port))
            })?;

        let stream = TcpStream::connect_timeout(&addr, connect_timeout)
            .map_err(|e| StoreError::Connection(format!("connect {}:{}: {}", host, port, e)))?;

        stream.set_nodelay(true).ok();
        Ok(stream)
    }

    fn open_tcp(host: &str, port: u16, connect_timeout: Duration) -> Result<Self, StoreError> {
        let stream = Self::connect_stream(host, port, connect_timeout)?;

        let writer = BufWriter::with_capacity(
            8192,
            stream
                .try_clone()
                .map_err(|e| StoreError::Connection(format!("clone stream: {}", e)))?,
        );
        let reader = BufReader::with_capacity(8192, stream);

        Ok(RawConnection::Tcp { writer, reader })
    }

    #[cfg(feature = "native-tls-backend")]
    fn open_tls(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        tls_config: &TlsConfig,
    ) -> Result<Self, StoreError> {
        use native_tls::{Certificate, Identity, TlsConnector};

        let mut builder = TlsConnector::builder();

        if tls_config.skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }

        if let Some(ref ca_path) = tls_config.ca_cert {
            let ca_data = std::fs::read(ca_path)
                .map_err(|e| StoreError::Connection(format!("read CA cert: {}", e)))?;
            let cert = Certificate::from_pem(&ca_data)
                .map_err(|e| StoreError::Connection(format!("invalid CA cert: {}", e)))?;
            builder.add_root_certificate(cert);
        }

        if let (Some(ref cert_path), Some(ref key_path)) =
            (&tls_config.client_cert, &tls_config.client_key)
        {
            let cert_data = std::fs::read(cert_path)
                .map_err(|e| StoreError::Connection(format!("read client cert: {}", e)))?;
            let key_data = std::fs::read(key_path)
                .map_err(|e| StoreError::Connection(format!("read client key: {}", e)))?;

            // native-tls wants the pair as PKCS8
            let identity = Identity::from_pkcs8(&cert_data, &key_data)
                .map_err(|e| StoreError::Connection(format!("invalid client identity: {}", e)))?;
            builder.identity(identity);
        }

        let connector = builder
            .build()
            .map_err(|e| StoreError::Connection(format!("build TLS connector: {}", e)))?;

        let tcp_stream = Self::connect_stream(host, port, connect_timeout)?;

        let sni_host = tls_config.sni.as_deref().unwrap_or(host);
        let tls_stream = connector
            .connect(sni_host, tcp_stream)
            .map_err(|e| StoreError::Connection(format!("TLS handshake: {}", e)))?;

        Ok(RawConnection::NativeTls {
            stream: Box::new(tls_stream),
        })
    }

    /// Send one encoded command and read one response
    pub fn execute(&mut self, encoder: &RespEncoder) -> io::Result<RespValue> {
        self.write_all(encoder.as_bytes())?;
        self.flush()?;
        self.read_response()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            RawConnection::Tcp { writer, .. } => writer.write_all(buf),
            #[cfg(feature = "native-tls-backend")]
            RawConnection::NativeTls { stream } => stream.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            RawConnection::Tcp { writer, .. } => writer.flush(),
            #[cfg(feature = "native-tls-backend")]
            RawConnection::NativeTls { stream } => stream.flush(),
        }
    }

    fn read_response(&mut self) -> io::Result<RespValue> {
        match self {
            RawConnection::Tcp { reader, .. } => {
                let mut decoder = RespDecoder::new(reader);
                decoder.decode()
            }
            #[cfg(feature = "native-tls-backend")]
            RawConnection::NativeTls { stream } => {
                // Single request in flight, so a per-call BufReader never
                // strands buffered bytes
                let mut buf_reader = BufReader::new(stream);
                let mut decoder = RespDecoder::new(&mut buf_reader);
                decoder.decode()
            }
        }
    }

    /// Set socket read timeout
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            RawConnection::Tcp { reader, .. } => reader.get_ref().set_read_timeout(timeout),
            #[cfg(feature = "native-tls-backend")]
            RawConnection::NativeTls { stream } => stream.get_ref().set_read_timeout(timeout),
        }
    }

    /// Set socket write timeout
    pub fn set_write_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            RawConnection::Tcp { writer, .. } => writer.get_ref().set_write_timeout(timeout),
            #[cfg(feature = "native-tls-backend")]
            RawConnection::NativeTls { stream } => stream.get_ref().set_write_timeout(timeout),
        }
    }

    /// Shut down the underlying socket. Errors are reported so the caller can
    /// log them; the connection is unusable either way.
    pub fn shutdown(&mut self) -> io::Result<()> {
        match self {
            RawConnection::Tcp { reader, .. } => {
                reader.get_ref().shutdown(std::net::Shutdown::Both)
            }
            #[cfg(feature = "native-tls-backend")]
            RawConnection::NativeTls { stream } => stream.shutdown(),
        }
    }
}
