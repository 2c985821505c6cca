use std::thread;
use tiny_http::{Header, Response, Server};

pub const STATUS_BODY: &str = r#"{"connections":{"accepted":10,"active":2,"idle":1,"closed":3},"requests":{"total":100},"applications":{"app1":{"processes":{"running":1,"starting":0,"idle":2},"requests":{"active":5}}}}"#;

/// Serves `body` with `status` to every request on an ephemeral port and returns
/// the status URL.
pub fn serve_status(status: u16, body: &'static str) -> String {
    let server = Server::http("127.0.0.1:0").expect("Failed to bind fake status endpoint");
    let port = server
        .server_addr()
        .to_ip()
        .expect("Fake status endpoint is not on TCP")
        .port();

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let header =
                Header::from_bytes(b"Content-Type".as_slice(), b"application/json".as_slice())
                    .unwrap();
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(header);
            let _ = request.respond(response);
        }
    });

    format!("http://127.0.0.1:{port}/status")
}

/// An address nothing listens on.
pub fn closed_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/status")
}
