//! Session manager wrapper for rmcp's streamable HTTP transport.
//!
//! Sessions are handled by rmcp's `LocalSessionManager`; this wrapper only logs session
//! lifecycle and keeps an open-session count for `/status`.

use futures::Stream;
use rmcp::model::{ClientJsonRpcMessage, ServerJsonRpcMessage};
use rmcp::transport::common::server_side_http::ServerSseMessage;
use rmcp::transport::streamable_http_server::session::SessionId;
use rmcp::transport::streamable_http_server::session::SessionManager;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct AnimalRescueSessionManager {
    inner: LocalSessionManager,
    open: AtomicUsize,
}

impl AnimalRescueSessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions created and not yet closed through this manager.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::Relaxed)
    }

    async fn create_session_impl(
        &self,
    ) -> Result<
        (SessionId, <LocalSessionManager as SessionManager>::Transport),
        <LocalSessionManager as SessionManager>::Error,
    > {
        let (id, transport) = self.inner.create_session().await?;
        let open = self.open.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(mcp_session_id = %id, open_sessions = open, "MCP session opened");
        Ok((id, transport))
    }

    async fn close_session_impl(
        &self,
        id: &SessionId,
    ) -> Result<(), <LocalSessionManager as SessionManager>::Error> {
        let known = self.inner.has_session(id).await.unwrap_or(false);
        let result = self.inner.close_session(id).await;

        if known {
            let open = self
                .open
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                .map_or(0, |prev| prev - 1);
            tracing::info!(mcp_session_id = %id, open_sessions = open, "MCP session closed");
        }

        result
    }
}

impl SessionManager for AnimalRescueSessionManager {
    type Error = <LocalSessionManager as SessionManager>::Error;
    type Transport = <LocalSessionManager as SessionManager>::Transport;

    fn create_session(
        &self,
    ) -> impl Future<Output = Result<(SessionId, Self::Transport), Self::Error>> + Send {
        self.create_session_impl()
    }

    fn initialize_session(
        &self,
        id: &SessionId,
        message: ClientJsonRpcMessage,
    ) -> impl Future<Output = Result<ServerJsonRpcMessage, Self::Error>> + Send {
        self.inner.initialize_session(id, message)
    }

    fn has_session(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        self.inner.has_session(id)
    }

    fn close_session(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.close_session_impl(id)
    }

    fn create_stream(
        &self,
        id: &SessionId,
        message: ClientJsonRpcMessage,
    ) -> impl Future<
        Output = Result<impl Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error>,
    > + Send {
        self.inner.create_stream(id, message)
    }

    fn accept_message(
        &self,
        id: &SessionId,
        message: ClientJsonRpcMessage,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.inner.accept_message(id, message)
    }

    fn create_standalone_stream(
        &self,
        id: &SessionId,
    ) -> impl Future<
        Output = Result<impl Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error>,
    > + Send {
        self.inner.create_standalone_stream(id)
    }

    fn resume(
        &self,
        id: &SessionId,
        last_event_id: String,
    ) -> impl Future<
        Output = Result<impl Stream<Item = ServerSseMessage> + Send + Sync + 'static, Self::Error>,
    > + Send {
        self.inner.resume(id, last_event_id)
    }
}
