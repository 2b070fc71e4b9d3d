//! # HMS Mocks
//!
//! Intercepting mock of the transactional email API, for tests and local runs.
//!
//! The server records every email it accepts and answers with a generated id. Requests it has
//! no handler for are logged with `warn!` and answered `404`.
//!
//! Lifecycle mirrors the other servers in the workspace: bind, spawn the serve loop in a
//! background task, return a handle holding the shutdown channel.

mod resend;
mod signal;

pub use resend::RecordedEmail;
pub use signal::shutdown_signal;

use axum::Router;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("failed to bind mock server: {0}")]
    Bind(std::io::Error),
    #[error("failed to read mock server address: {0}")]
    LocalAddr(std::io::Error),
}

pub type MockResult<T> = Result<T, MockError>;

/// Shared record of intercepted emails.
pub(crate) type Outbox = Arc<Mutex<Vec<RecordedEmail>>>;

/// Handle to a running mock server.
///
/// Dropping the handle also stops the server.
#[derive(Debug)]
pub struct MockServer {
    addr: SocketAddr,
    outbox: Outbox,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL to point an API client at, e.g. `http://127.0.0.1:41234`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Emails accepted so far, oldest first.
    pub fn sent_emails(&self) -> Vec<RecordedEmail> {
        match self.outbox.lock() {
            Ok(outbox) => outbox.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stop the server gracefully.
    pub fn shutdown(mut self) {
        self.signal_shutdown();
    }

    /// Keep the server running until SIGINT or SIGTERM, then stop it.
    pub fn shutdown_on_signal(mut self) {
        let tx = self.shutdown_tx.take();
        tokio::spawn(async move {
            shutdown_signal().await;
            if let Some(tx) = tx {
                let _ = tx.send(());
            }
        });
    }

    fn signal_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!(addr = %self.addr, "mock server shutdown signal sent");
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.signal_shutdown();
    }
}

/// Start the Resend mock on `addr`. Port `0` picks a free port.
pub async fn start_resend_mock(addr: SocketAddr) -> MockResult<MockServer> {
    let outbox: Outbox = Arc::default();
    serve(addr, resend::router(outbox.clone()), outbox).await
}

async fn serve(addr: SocketAddr, app: Router, outbox: Outbox) -> MockResult<MockServer> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(MockError::Bind)?;
    let addr = listener.local_addr().map_err(MockError::LocalAddr)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        tracing::debug!(%addr, "mock server started");
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!("mock server error: {e}");
        }
        tracing::debug!(%addr, "mock server stopped");
    });

    Ok(MockServer {
        addr,
        outbox,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn start() -> MockServer {
        start_resend_mock(([127, 0, 0, 1], 0).into())
            .await
            .expect("mock server should start")
    }

    #[tokio::test]
    async fn records_accepted_emails() {
        let server = start().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/emails", server.base_url()))
            .json(&json!({
                "from": "hello@hms.local",
                "to": ["a@example.com", "b@example.com"],
                "subject": "Hi",
                "html": "<p>Hi</p>",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();

        let sent = server.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(body["id"], sent[0].id.as_str());
        assert_eq!(sent[0].to, "a@example.com, b@example.com");
        assert_eq!(sent[0].text, None);
        server.shutdown();
    }

    #[tokio::test]
    async fn rejects_emails_without_recipient() {
        let server = start().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/emails", server.base_url()))
            .json(&json!({"from": "x@hms.local", "to": "", "subject": "s", "html": "h"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
        assert!(server.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn unhandled_requests_get_not_found() {
        let server = start().await;
        let resp = reqwest::get(format!("{}/domains", server.base_url()))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn shutdown_stops_accepting_connections() {
        let server = start().await;
        let url = format!("{}/emails", server.base_url());
        server.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(reqwest::Client::new().post(url).send().await.is_err());
    }
}
