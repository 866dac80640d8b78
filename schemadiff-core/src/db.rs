//! Database connections, TLS support, and identifier quoting.

use rusqlite::Connection;
use tokio_postgres::Client;

use crate::error::{Result, SchemaDiffError};

/// Default timeout for opening a PostgreSQL connection.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Quote a SQL identifier for emitted DDL.
///
/// Doubles any embedded double-quotes and wraps in double-quotes. Names
/// coming out of the catalog are treated as opaque, so emitted statements
/// always quote them even when the original DDL did not.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// TLS behavior for PostgreSQL connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Never use TLS.
    Disable,
    /// Try TLS first, fall back to plaintext.
    #[default]
    Prefer,
    /// Require TLS — fail if the handshake fails.
    Require,
}

/// Build a rustls ClientConfig using the Mozilla CA bundle and ring crypto provider.
fn make_rustls_config() -> rustls::ClientConfig {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    rustls::ClientConfig::builder_with_provider(std::sync::Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_root_certificates(root_store)
    .with_no_client_auth()
}

/// Spawn the background connection driver task.
///
/// Both TLS and non-TLS connections produce a future that resolves when the
/// connection terminates. This helper runs it on the tokio runtime, logging
/// errors.
fn spawn_connection_task<F>(connection: F)
where
    F: std::future::Future<Output = std::result::Result<(), tokio_postgres::Error>>
        + Send
        + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("Database connection error: {}", e);
        }
    });
}

async fn connect_once(
    conn_string: &str,
    ssl_mode: SslMode,
) -> std::result::Result<Client, tokio_postgres::Error> {
    match ssl_mode {
        SslMode::Disable => {
            let (client, connection) =
                tokio_postgres::connect(conn_string, tokio_postgres::NoTls).await?;
            spawn_connection_task(connection);
            Ok(client)
        }
        SslMode::Require => {
            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_rustls_config());
            let (client, connection) = tokio_postgres::connect(conn_string, tls).await?;
            spawn_connection_task(connection);
            Ok(client)
        }
        SslMode::Prefer => {
            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_rustls_config());
            match tokio_postgres::connect(conn_string, tls).await {
                Ok((client, connection)) => {
                    spawn_connection_task(connection);
                    Ok(client)
                }
                Err(_) => {
                    log::debug!("TLS connection failed, falling back to plaintext");
                    let (client, connection) =
                        tokio_postgres::connect(conn_string, tokio_postgres::NoTls).await?;
                    spawn_connection_task(connection);
                    Ok(client)
                }
            }
        }
    }
}

/// Open a PostgreSQL connection for catalog introspection.
///
/// Spawns the connection task on the tokio runtime. Passing
/// `connect_timeout_secs = 0` disables the timeout.
pub async fn connect_postgres(
    conn_string: &str,
    ssl_mode: SslMode,
    connect_timeout_secs: u64,
) -> Result<Client> {
    let connect_fut = connect_once(conn_string, ssl_mode);
    if connect_timeout_secs == 0 {
        return Ok(connect_fut.await?);
    }
    match tokio::time::timeout(
        std::time::Duration::from_secs(connect_timeout_secs),
        connect_fut,
    )
    .await
    {
        Ok(result) => Ok(result?),
        Err(_) => Err(SchemaDiffError::ConnectionFailed {
            descriptor: conn_string.to_string(),
            reason: format!("connect timed out after {}s", connect_timeout_secs),
        }),
    }
}

/// Open a SQLite database file.
pub fn open_sqlite(path: &str) -> Result<Connection> {
    Connection::open(path).map_err(|e| SchemaDiffError::ConnectionFailed {
        descriptor: path.to_string(),
        reason: e.to_string(),
    })
}
