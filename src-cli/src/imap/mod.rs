//! IMAP transport layer: connection negotiation, the live session handle,
//! and the search/fetch/statistics pipelines built on top of it.

pub mod backend;
pub mod fetch;
pub mod folders;
pub mod search;
pub mod stats;

use async_native_tls::{Protocol, TlsConnector, TlsStream};
use async_std::io::prelude::*;
use async_std::net::TcpStream;
use futures::future::BoxFuture;
use tracing::{info, warn};

use mailscope_core::{ConnectFailure, MailError, StrategyFailure};

use crate::config;

pub type ImapSession = async_imap::Session<TlsStream<TcpStream>>;

pub const STANDARD_TLS_PORT: u16 = 993;
pub const STARTTLS_PORT: u16 = 143;

// ── Session handle ──────────────────────────────────────────────────────────

/// An authenticated connection to one mailbox account.
///
/// Owned exclusively by the caller; all operations run sequentially against
/// the single underlying connection.
pub struct Session {
    inner: Option<ImapSession>,
    pub host: String,
    pub port: u16,
    pub email: String,
    /// Name of the strategy that won the negotiation, for diagnostics.
    pub strategy: String,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.inner.is_some()
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut ImapSession, MailError> {
        self.inner
            .as_mut()
            .ok_or_else(|| MailError::Transport("session is disconnected".to_string()))
    }

    /// Log out and drop the connection. Safe to call repeatedly; never fails.
    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.inner.take() {
            match session.logout().await {
                Ok(_) => info!("Disconnected from {}", self.host),
                Err(e) => warn!("Logout from {} failed (dropping anyway): {}", self.host, e),
            }
        }
    }
}

// ── Connection negotiation ──────────────────────────────────────────────────

/// Connect and authenticate, trying each transport strategy once, in order:
/// direct TLS on `port`, direct TLS with relaxed protocol versions, then
/// plaintext on port 143 upgraded via STARTTLS.
///
/// When `server` is absent it is derived from the address's domain through
/// the provider table. On total failure the returned [`ConnectFailure`]
/// carries one entry per strategy, in attempted order.
pub async fn connect(
    email: &str,
    secret: &str,
    server: Option<&str>,
    port: u16,
) -> Result<Session, ConnectFailure> {
    let host = match server {
        Some(s) => s.to_string(),
        None => config::detect_imap_server(email),
    };

    info!("Connecting to {}:{} as {}", host, port, email);

    let strategies: Vec<(String, BoxFuture<'_, Result<ImapSession, MailError>>)> = vec![
        (
            format!("Direct TLS (port {})", port),
            Box::pin(connect_tls(&host, port, email, secret, TlsConnector::new())),
        ),
        (
            "Direct TLS, relaxed protocol versions".to_string(),
            Box::pin(connect_tls(&host, port, email, secret, relaxed_connector())),
        ),
        (
            format!("Port {} with STARTTLS", STARTTLS_PORT),
            Box::pin(connect_starttls(&host, STARTTLS_PORT, email, secret)),
        ),
    ];

    let (inner, strategy) = negotiate(strategies).await?;
    info!("Session established for {} via {}", email, strategy);

    Ok(Session {
        inner: Some(inner),
        host,
        port,
        email: email.to_string(),
        strategy,
    })
}

/// Try each named attempt once, stopping at the first success. Failures are
/// collected in attempted order; nothing is retried.
async fn negotiate<S>(
    strategies: Vec<(String, BoxFuture<'_, Result<S, MailError>>)>,
) -> Result<(S, String), ConnectFailure> {
    let mut attempts = Vec::new();
    for (name, attempt) in strategies {
        info!("Trying strategy: {}", name);
        match attempt.await {
            Ok(session) => return Ok((session, name)),
            Err(error) => {
                warn!("Strategy {} failed: {}", name, error);
                attempts.push(StrategyFailure {
                    strategy: name,
                    error,
                });
            }
        }
    }
    Err(ConnectFailure { attempts })
}

fn relaxed_connector() -> TlsConnector {
    // Some older servers only speak pre-1.2 TLS; the default context
    // rejects them.
    TlsConnector::new().min_protocol_version(Some(Protocol::Tlsv10))
}

async fn open_tcp(host: &str, port: u16) -> Result<TcpStream, MailError> {
    // Resolve to IPv4 only — avoids IPv6 hangs on providers that publish
    // unreachable AAAA records.
    use async_std::net::ToSocketAddrs;
    let addr = format!("{}:{}", host, port);
    let addrs: Vec<std::net::SocketAddr> = addr
        .to_socket_addrs()
        .await
        .map_err(|e| MailError::Transport(format!("DNS resolve failed for {}: {}", addr, e)))?
        .filter(|a| a.is_ipv4())
        .collect();

    if addrs.is_empty() {
        return Err(MailError::Transport(format!(
            "no IPv4 address found for {}",
            host
        )));
    }

    TcpStream::connect(&addrs[..])
        .await
        .map_err(|e| MailError::Transport(format!("TCP connect to {} failed: {}", addr, e)))
}

async fn connect_tls(
    host: &str,
    port: u16,
    email: &str,
    secret: &str,
    tls: TlsConnector,
) -> Result<ImapSession, MailError> {
    let tcp = open_tcp(host, port).await?;

    let tls_stream = tls
        .connect(host, tcp)
        .await
        .map_err(|e| MailError::Transport(format!("TLS handshake with {} failed: {}", host, e)))?;

    login(async_imap::Client::new(tls_stream), email, secret, true).await
}

/// Plaintext connect on the unencrypted port, upgraded in place. The
/// greeting and the STARTTLS exchange happen on the raw stream; credentials
/// only ever cross the encrypted one.
async fn connect_starttls(
    host: &str,
    port: u16,
    email: &str,
    secret: &str,
) -> Result<ImapSession, MailError> {
    let mut tcp = open_tcp(host, port).await?;

    let greeting = read_line(&mut tcp).await?;
    if !greeting.starts_with("* OK") && !greeting.starts_with("* PREAUTH") {
        return Err(MailError::Transport(format!(
            "unexpected greeting from {}: {}",
            host, greeting
        )));
    }

    tcp.write_all(b"a1 STARTTLS\r\n")
        .await
        .map_err(|e| MailError::Transport(format!("STARTTLS request failed: {}", e)))?;
    wait_for_tagged_ok(&mut tcp, "a1").await?;

    let tls_stream = TlsConnector::new()
        .connect(host, tcp)
        .await
        .map_err(|e| MailError::Transport(format!("STARTTLS upgrade with {} failed: {}", host, e)))?;

    // The greeting was consumed before the upgrade; go straight to LOGIN.
    login(async_imap::Client::new(tls_stream), email, secret, false).await
}

async fn login(
    mut client: async_imap::Client<TlsStream<TcpStream>>,
    email: &str,
    secret: &str,
    expect_greeting: bool,
) -> Result<ImapSession, MailError> {
    if expect_greeting {
        // Consume the server greeting (e.g. "* OK ready") before LOGIN.
        let _greeting = client
            .read_response()
            .await
            .map_err(|e| MailError::Transport(format!("failed to read server greeting: {}", e)))?;
    }

    client
        .login(email, secret)
        .await
        .map_err(|(e, _)| MailError::Auth(format!("login failed for {}: {}", email, e)))
}

async fn read_line(stream: &mut TcpStream) -> Result<String, MailError> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = stream
            .read(&mut byte)
            .await
            .map_err(|e| MailError::Transport(format!("read failed: {}", e)))?;
        if n == 0 {
            return Err(MailError::Transport(
                "connection closed during STARTTLS negotiation".to_string(),
            ));
        }
        line.push(byte[0]);
        if byte[0] == b'\n' {
            break;
        }
        if line.len() > 8192 {
            return Err(MailError::Transport(
                "oversized response line during STARTTLS negotiation".to_string(),
            ));
        }
    }
    Ok(String::from_utf8_lossy(&line).trim_end().to_string())
}

async fn wait_for_tagged_ok(stream: &mut TcpStream, tag: &str) -> Result<(), MailError> {
    loop {
        let line = read_line(stream).await?;
        if let Some(rest) = line.strip_prefix(tag) {
            if rest.trim_start().starts_with("OK") {
                return Ok(());
            }
            return Err(MailError::Transport(format!("STARTTLS refused: {}", line)));
        }
        // Untagged lines (capabilities etc.) are skipped.
    }
}
