//! Minimal HTTP/1.1 stand-in for the hosted identity service.
//!
//! `GET /auth/v1/user` answers 200 with a user document when the bearer token
//! is known and the `apikey` header matches, 401 otherwise. `POST
//! /auth/v1/logout` forgets the token and answers 204.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub const ANON_KEY: &str = "test-anon-key";

#[derive(Clone, Default)]
pub struct IdentityServer {
    tokens: Arc<Mutex<HashMap<String, (String, String)>>>,
    /// Request lines seen so far, e.g. "GET /auth/v1/user".
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl IdentityServer {
    pub fn with_user(self, token: &str, id: &str, email: &str) -> Self {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), (id.to_string(), email.to_string()));
        self
    }

    /// Starts the server in a background thread and returns its base URL
    /// (e.g. "http://127.0.0.1:12345"). Runs until the process exits.
    pub fn start(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let server = self.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let server = server.clone();
                thread::spawn(move || server.handle(stream));
            }
        });
        format!("http://127.0.0.1:{}", port)
    }

    fn handle(&self, mut stream: std::net::TcpStream) {
        let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
        let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
        let mut buf = [0u8; 8192];
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let Ok(request) = std::str::from_utf8(&buf[..n]) else {
            return;
        };
        let req = parse_request(request);
        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", req.method, req.path));

        let key_ok = req.apikey.as_deref() == Some(ANON_KEY);
        let response = match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/auth/v1/user") => {
                let user = req
                    .bearer
                    .as_deref()
                    .and_then(|t| self.tokens.lock().unwrap().get(t).cloned());
                match user {
                    Some((id, email)) if key_ok => {
                        let body = format!(r#"{{"id":"{}","email":"{}","aud":"authenticated"}}"#, id, email);
                        format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                            body.len(),
                            body
                        )
                    }
                    _ => unauthorized(),
                }
            }
            ("POST", "/auth/v1/logout") if key_ok => {
                if let Some(t) = req.bearer.as_deref() {
                    self.tokens.lock().unwrap().remove(t);
                }
                "HTTP/1.1 204 No Content\r\nContent-Length: 0\r\n\r\n".to_string()
            }
            ("POST", "/auth/v1/logout") => unauthorized(),
            _ => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_string(),
        };
        let _ = stream.write_all(response.as_bytes());
    }
}

fn unauthorized() -> String {
    let body = r#"{"msg":"invalid JWT"}"#;
    format!(
        "HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}

struct Request {
    method: String,
    path: String,
    apikey: Option<String>,
    bearer: Option<String>,
}

fn parse_request(request: &str) -> Request {
    let mut req = Request {
        method: String::new(),
        path: String::new(),
        apikey: None,
        bearer: None,
    };
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if req.method.is_empty() {
            let mut parts = line.split_whitespace();
            req.method = parts.next().unwrap_or("").to_string();
            let target = parts.next().unwrap_or("");
            req.path = target.split('?').next().unwrap_or("").to_string();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("apikey") {
                req.apikey = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("authorization") {
                req.bearer = value.strip_prefix("Bearer ").map(|t| t.trim().to_string());
            }
        }
    }
    req
}
