use {
    std::{net::SocketAddr, sync::Arc},
    tokio::net::TcpListener,
    hyper::server::conn::http1,
    hyper_util::{rt::{TokioIo, TokioTimer}, server::graceful::GracefulShutdown},
    tracing::{info, warn, error},
    crate::{
        function::Function,
        http::HttpHandler,
        error::ServerError,
    },
};

pub struct CounterServer {
    listener: TcpListener,
    handler: HttpHandler,
}

impl CounterServer {
    pub async fn bind(addr: SocketAddr, function: Arc<dyn Function + Send + Sync>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await
            .map_err(|err| ServerError::Bind { reason: format!("failed to bind {addr}: {err}") })?;

        Ok(Self {
            listener,
            handler: HttpHandler::new(function),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr()
            .map_err(|err| ServerError::LocalAddr { reason: err.to_string() })
    }

    /// Accepts connections until `shutdown` resolves. Requests already in flight are answered
    /// before this returns, and idle keep-alive connections are closed.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let graceful = GracefulShutdown::new();

        match self.listener.local_addr() {
            Ok(addr) => info!("started http server on {addr:?}"),
            Err(err) => warn!("started http server on unknown address: {err:?}"),
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("stopping http server");
                    break;
                },
                connection = self.listener.accept() => {
                    let (tcp, _) = match connection {
                        Ok(v) => v,
                        Err(err) => {
                            error!("failed to accept http connection: {err:?}");
                            continue;
                        }
                    };

                    let io = TokioIo::new(tcp);
                    let connection = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(io, self.handler.clone());
                    let connection = graceful.watch(connection);
                    tokio::task::spawn(async move {
                        if let Err(err) = connection.await {
                            if !err.is_incomplete_message() {
                                warn!("error while serving http connection: {err:?}");
                            }
                        }
                    });
                }
            }
        }

        drop(self.listener);
        graceful.shutdown().await;
        info!("stopped http server");
    }
}
