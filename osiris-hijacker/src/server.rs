//! The TLS webhook server and its shutdown coordination.
use std::{fs, future::Future, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::config::Config;
use crate::handler;
use crate::planner::PatchPlanner;

/// How the server came to a stop.
#[derive(Debug, PartialEq, Eq)]
pub enum Exit {
    /// Shutdown was requested and every in-flight request completed in time.
    Graceful,
    /// Shutdown was requested and in-flight requests were abandoned after the grace period.
    GraceExpired,
    /// The server stopped without being asked to.
    Terminated,
}

/// `POST /mutate` for admission requests and `GET /healthz` for liveness probes.
pub fn routes(
    planner: Arc<dyn PatchPlanner>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let mutate = warp::path("mutate")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::bytes())
        .map(move |content_type: Option<String>, body: Bytes| {
            handler::mutate(&body, content_type.as_deref(), planner.as_ref())
        });

    let healthz = warp::path("healthz")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| StatusCode::OK.into_response());

    mutate.or(healthz).unify().with(warp::trace::request())
}

/// Serves admission requests for Services over TLS.
pub struct Hijacker {
    config: Config,
    cert: Vec<u8>,
    key: Vec<u8>,
    planner: Arc<dyn PatchPlanner>,
}

impl Hijacker {
    /// Reads the TLS material up front, so a bad path fails at startup instead of in the
    /// middle of serving.
    pub fn new(config: Config, planner: Arc<dyn PatchPlanner>) -> anyhow::Result<Self> {
        let cert = fs::read(&config.tls_cert_file).with_context(|| {
            format!(
                "Failed to read TLS certificate {}",
                config.tls_cert_file.display()
            )
        })?;
        let key = fs::read(&config.tls_key_file).with_context(|| {
            format!("Failed to read TLS key {}", config.tls_key_file.display())
        })?;

        Ok(Self {
            config,
            cert,
            key,
            planner,
        })
    }

    /// Serves until `shutdown` is cancelled, then waits for in-flight requests for at most
    /// the configured grace period.
    ///
    /// Fails when the TLS material is not usable or the port cannot be bound.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<Exit> {
        let [dual_stack, ipv4] = self.config.socket_addrs();
        let (addr, server) = match self.bind(dual_stack, &shutdown) {
            Ok(bound) => bound,
            Err(err) => {
                tracing::warn!("{:#}, retrying on {}", err, ipv4);
                self.bind(ipv4, &shutdown)?
            }
        };

        tracing::info!(
            "Endpoints hijacker is listening on {}, patching Osiris-enabled services",
            addr
        );

        Ok(supervise(server, shutdown, self.config.shutdown_grace()).await)
    }

    fn bind(
        &self,
        addr: SocketAddr,
        shutdown: &CancellationToken,
    ) -> anyhow::Result<(SocketAddr, impl Future<Output = ()> + Send + 'static)> {
        let signal = shutdown.clone();
        warp::serve(routes(self.planner.clone()))
            .tls()
            .cert(self.cert.clone())
            .key(self.key.clone())
            .try_bind_with_graceful_shutdown(addr, async move { signal.cancelled().await })
            .with_context(|| format!("Failed to bind {}", addr))
    }
}

/// Drives a server future that stops accepting connections once `shutdown` is cancelled.
///
/// After cancellation the server gets `grace` to finish in-flight requests. Past that the
/// server task is aborted and this returns, but connections hyper spawned as their own tasks
/// stay open until the runtime is dropped, which the binary does by returning from `main`.
/// A server that stops on its own is logged as an error and not restarted.
pub async fn supervise<F>(server: F, shutdown: CancellationToken, grace: Duration) -> Exit
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut server = tokio::spawn(server);

    tokio::select! {
        result = &mut server => {
            if shutdown.is_cancelled() {
                return Exit::Graceful;
            }
            match result {
                Ok(()) => tracing::error!("Endpoints hijacker stopped unexpectedly"),
                Err(err) => tracing::error!("Endpoints hijacker error: {}", err),
            }
            Exit::Terminated
        }
        _ = shutdown.cancelled() => {
            tracing::info!("Endpoints hijacker is shutting down");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(_) => Exit::Graceful,
                Err(_) => {
                    tracing::warn!(
                        "Requests still in progress after {:?}, abandoning them",
                        grace
                    );
                    server.abort();
                    Exit::GraceExpired
                }
            }
        }
    }
}
