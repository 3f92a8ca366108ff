//! Connection serving module
//!
//! The accept loop: one spawned task per connection, HTTP/1.1 protocol
//! handling via hyper, graceful shutdown on ctrl-c.

use crate::config::AppState;
use crate::handler;
use crate::logger;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Run the accept loop until a shutdown signal arrives.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _peer)) => serve_connection(stream, Arc::clone(&state)),
                    Err(err) => {
                        logger::log_error(&format!("Failed to accept connection: {err}"));
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                logger::log_shutdown();
                return Ok(());
            }
        }
    }
}

/// Serve one connection on its own task. In-flight requests and their body
/// streams end when the client goes away; dropping the connection releases
/// any file handle still held by a body.
fn serve_connection(stream: TcpStream, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let service = service_fn(move |req| handler::handle_request(req, Arc::clone(&state)));

        if let Err(err) = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(io, service)
            .await
        {
            logger::log_error(&format!("Failed to serve connection: {err:?}"));
        }
    });
}
