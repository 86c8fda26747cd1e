use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::domain::server::ServerConfig;

/// Canned route: the first route whose path prefix matches answers the request.
#[derive(Debug, Clone)]
pub struct Route {
    pub path_prefix: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn json(path_prefix: &'static str, body: serde_json::Value) -> Self {
        Self {
            path_prefix,
            status: 200,
            body: body.to_string(),
        }
    }
}

/// Plain-HTTP responder on 127.0.0.1 serving a fixed number of requests.
pub struct HttpResponder {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl HttpResponder {
    pub fn spawn(routes: Vec<Route>, expected_requests: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("responder should bind");
        let port = listener
            .local_addr()
            .expect("addr should be available")
            .port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for _ in 0..expected_requests {
                let Ok((mut stream, _)) = listener.accept() else {
                    break;
                };
                let mut reader = BufReader::new(stream.try_clone().expect("stream clones"));
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                loop {
                    let mut header = String::new();
                    match reader.read_line(&mut header) {
                        Ok(0) => break,
                        Ok(_) if header == "\r\n" || header == "\n" => break,
                        Ok(_) => {}
                        Err(_) => break,
                    }
                }

                let target = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or_default()
                    .to_string();
                seen.lock().expect("requests lock").push(target.clone());

                let (status, body) = routes
                    .iter()
                    .find(|route| target.starts_with(route.path_prefix))
                    .map(|route| (route.status, route.body.clone()))
                    .unwrap_or((404, "{}".to_string()));
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        Self {
            port,
            requests,
            handle: Some(handle),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            server_url: format!("http://127.0.0.1:{}", self.port),
            ..ServerConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn join(mut self) -> Vec<String> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("responder thread should finish");
        }
        self.requests()
    }
}
