//! Mock listener.

use super::handler::handle_mock_request;
use super::MockEngine;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Serves `/{code}/{path...}` for every project
pub struct MockServer {
    listener: TcpListener,
    engine: Arc<MockEngine>,
}

impl MockServer {
    /// Bind the listener without accepting connections yet
    pub async fn bind(addr: SocketAddr, engine: Arc<MockEngine>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, engine })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) -> Result<(), anyhow::Error> {
        info!("Crudbox mock listener on http://{}", self.local_addr()?);

        loop {
            let (stream, _) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Mock listener accept error: {}", e);
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let engine = Arc::clone(&self.engine);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let engine = Arc::clone(&engine);
                    async move { handle_mock_request(req, engine).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Mock connection error: {}", e);
                }
            });
        }
    }
}
