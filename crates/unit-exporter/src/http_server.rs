use crate::error::BindError;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, error, info};

/// Registers the `{namespace}_exporter_build_info` gauge.
pub fn register_build_info(registry: &Registry, namespace: &str) -> prometheus::Result<()> {
    let build_info = Gauge::with_opts(
        Opts::new("exporter_build_info", "Exporter build information")
            .namespace(namespace)
            .const_label("version", env!("CARGO_PKG_VERSION")),
    )?;
    build_info.set(1.0);
    registry.register(Box::new(build_info))
}

/// Serves the registry's text exposition plus a landing page.
pub struct MetricsServer {
    server: Arc<Server>,
    telemetry_path: String,
    registry: Registry,
}

impl MetricsServer {
    pub fn bind(
        addr: &str,
        telemetry_path: impl Into<String>,
        registry: Registry,
    ) -> Result<Self, BindError> {
        let server = Server::http(addr).map_err(|e| BindError {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            server: Arc::new(server),
            telemetry_path: telemetry_path.into(),
            registry,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Starts `workers` request threads sharing the listener. Overlapping
    /// scrapes land on different workers and queue on the collector lock.
    pub fn spawn(self, workers: usize) -> std::io::Result<Vec<JoinHandle<()>>> {
        if let Some(addr) = self.local_addr() {
            info!(%addr, path = %self.telemetry_path, "Metrics server listening");
        }

        let shared = Arc::new(self);
        (0..workers.max(1))
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("unit-exporter-http-{i}"))
                    .spawn(move || {
                        for request in shared.server.incoming_requests() {
                            shared.handle_request(request);
                        }
                    })
            })
            .collect()
    }

    fn handle_request(&self, request: Request) {
        let path = request.url().split('?').next().unwrap_or("/").to_string();
        debug!(%path, method = %request.method(), "Handling request");

        if path == self.telemetry_path {
            self.respond_metrics(request);
        } else if path == "/" {
            respond_landing_page(request, &self.telemetry_path);
        } else {
            respond_error(request, 404, "Not found");
        }
    }

    fn respond_metrics(&self, request: Request) {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut body = Vec::new();

        match encoder.encode(&families, &mut body) {
            Ok(()) => respond_with(request, body, encoder.format_type()),
            Err(e) => respond_internal_error(request, e),
        }
    }
}

fn respond_landing_page(request: Request, telemetry_path: &str) {
    let body = format!(
        "<html>\n<head><title>NGINX Unit Exporter</title></head>\n<body>\n\
         <h1>NGINX Unit Exporter</h1>\n<p><a href=\"{telemetry_path}\">Metrics</a></p>\n\
         </body>\n</html>\n"
    );
    respond_with(request, body.into_bytes(), "text/html; charset=utf-8");
}

fn respond_with(request: Request, body: Vec<u8>, content_type: &str) {
    let mut response = Response::from_data(body);
    if let Ok(header) = Header::from_bytes(b"Content-Type".as_slice(), content_type.as_bytes()) {
        response.add_header(header);
    }
    let _ = request.respond(response);
}

fn respond_error(request: Request, code: u16, msg: &str) {
    let _ = request.respond(Response::from_string(msg).with_status_code(code));
}

fn respond_internal_error(request: Request, e: impl Display) {
    error!(error = %e, "Internal server error");
    let _ = request.respond(
        Response::from_string(format!("Internal server error: {}", e)).with_status_code(500),
    );
}
