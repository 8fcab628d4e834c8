//! HTTP server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;

use students::domain::ports::StudentRepository;
use students::inbound::http::auth::TokenAuthority;

/// Everything `create_server` needs to build the application.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) repository: Arc<dyn StudentRepository>,
    pub(crate) tokens: TokenAuthority,
}

impl ServerConfig {
    /// Construct a server configuration over a connected repository.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        repository: Arc<dyn StudentRepository>,
        tokens: TokenAuthority,
    ) -> Self {
        Self {
            bind_addr,
            repository,
            tokens,
        }
    }
}
