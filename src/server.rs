//! HTTP surface.
//!
//! Built on `tiny_http`: requests are handled one at a time on the main
//! thread until Ctrl+C unblocks the server.
//!
//! Routing is a pure function, [`route`], from an [`Incoming`] request to a
//! [`Reply`], so every route can be exercised without a socket. [`serve`]
//! only adapts between tiny_http and that function.
//!
//! ```text
//! GET /                         landing page
//! GET /dashboard?path=          lesson tree + rendered file + prev/next
//! GET /fullscreen?path=         rendered file alone
//! GET /api/file-content?path=   {content, gistId, prevNext}
//! GET /api/tree                 ordered tree as JSON
//! GET /quiz?type=               quiz picker / questions (signed-in only)
//! GET /auth/github              start GitHub login
//! GET /auth/github/callback     finish GitHub login
//! GET /auth/logout              end the session
//! GET /style.css                stylesheet
//! ```
//!
//! Successful responses carry a SHA-256 `ETag`; a matching `If-None-Match`
//! gets an empty 304.

use crate::auth::{Auth, AuthError, Gatekeeper, RequestContext};
use crate::config::{ServerConfig, SiteConfig};
use crate::pages::{self, Chrome};
use crate::quiz::{QuizError, QuizLoader};
use crate::site::Site;
use maud::Markup;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Invalid interface address {0:?}: {1}")]
    Interface(String, std::net::AddrParseError),
    #[error("Failed to bind after {attempts} attempts (ports {first}-{last}): {message}")]
    Bind {
        attempts: u16,
        first: u16,
        last: u16,
        message: String,
    },
    #[error("Failed to set Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Message sent when a quiz directory can't be read.
pub const QUIZ_READ_ERROR: &str = "Error reading quiz files.";

/// Everything a request handler needs.
#[derive(Debug)]
pub struct App {
    pub site: Site,
    pub quizzes: QuizLoader,
    pub auth: Auth,
}

impl App {
    pub fn new(site: Site, quizzes: QuizLoader, auth: Auth) -> Self {
        Self {
            site,
            quizzes,
            auth,
        }
    }

    /// Wire up the site, quizzes and GitHub login for a content root.
    pub fn from_config(root: impl Into<PathBuf>, config: &SiteConfig) -> Result<Self, AuthError> {
        let root = root.into();
        let auth = Auth::from_config(&config.auth, &root)?;
        Ok(Self::new(
            Site::new(&root, config),
            QuizLoader::new(root.join(&config.quiz.dir)),
            auth,
        ))
    }
}

/// The parts of an HTTP request routing looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub method: String,
    /// Path and query, as sent (`/dashboard?path=Arrays%2Ftheory.md`).
    pub url: String,
    pub cookie: Option<String>,
    pub if_none_match: Option<String>,
}

impl Incoming {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            cookie: None,
            if_none_match: None,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_if_none_match(mut self, etag: impl Into<String>) -> Self {
        self.if_none_match = Some(etag.into());
        self
    }

    fn from_request(request: &Request) -> Self {
        let header = |name: &'static str| {
            request
                .headers()
                .iter()
                .find(|h| h.field.equiv(name))
                .map(|h| h.value.as_str().to_string())
        };
        Self {
            method: request.method().to_string(),
            url: request.url().to_string(),
            cookie: header("Cookie"),
            if_none_match: header("If-None-Match"),
        }
    }
}

/// A response, before it is handed to tiny_http.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, String)>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some(content_type),
            body: body.into(),
            headers: Vec::new(),
        }
    }

    fn html(markup: Markup) -> Self {
        Self::new(200, "text/html; charset=utf-8", markup.into_string())
    }

    fn html_status(status: u16, markup: Markup) -> Self {
        Self::new(status, "text/html; charset=utf-8", markup.into_string())
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, "application/json; charset=utf-8", body),
            Err(err) => {
                warn!(error = %err, "failed to serialize response");
                Self::text(500, "Internal Server Error")
            }
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body)
    }

    fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            content_type: None,
            body: Vec::new(),
            headers: vec![("Location", location.into())],
        }
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// First value of a header (case-insensitive name match).
    pub fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("Content-Type") {
            return self.content_type;
        }
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Route one request.
pub fn route(app: &App, request: &Incoming) -> Reply {
    if request.method != "GET" && request.method != "HEAD" {
        return Reply::text(405, "Method Not Allowed").with_header("Allow", "GET, HEAD");
    }

    let url = request.url.as_str();
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let param = |key: &str| query_param(query, key);
    let context = RequestContext::from_cookie_header(request.cookie.as_deref(), app.auth.cookie_name());
    let user = context
        .session_token
        .as_deref()
        .and_then(|t| app.auth.user_for(t));
    let chrome = Chrome {
        site_title: app.site.title(),
        user: user.as_ref(),
        login_enabled: app.auth.is_enabled(),
    };

    let reply = match path {
        "/" => Reply::html(pages::landing(&chrome)),
        "/dashboard" => match app.site.lookup(param("path").as_deref()) {
            Ok(lookup) => Reply::html(pages::dashboard(&chrome, &lookup)),
            Err(err) => {
                warn!(error = %err, "dashboard lookup failed");
                Reply::text(500, "Failed to load content")
            }
        },
        "/fullscreen" => Reply::html(pages::fullscreen(
            &app.site.fullscreen(param("path").as_deref()),
        )),
        "/api/file-content" => match app.site.lookup(param("path").as_deref()) {
            Ok(lookup) => Reply::json(200, &lookup),
            Err(err) => {
                warn!(error = %err, "file content lookup failed");
                Reply::json(500, &serde_json::json!({ "error": "Failed to load content" }))
            }
        },
        "/api/tree" => Reply::json(200, &app.site.tree()),
        "/quiz" => quiz(app, &context, &chrome, param("type").as_deref()),
        "/auth/github" => match app.auth.begin_login() {
            Ok(url) => Reply::redirect(url),
            Err(err) => {
                warn!(error = %err, "cannot start login");
                Reply::redirect("/")
            }
        },
        "/auth/github/callback" => callback(app, param("code"), param("state")),
        "/auth/logout" => {
            if app.auth.logout(context.session_token.as_deref()) {
                info!("signed out");
            }
            Reply::redirect("/").with_header("Set-Cookie", app.auth.clear_cookie())
        }
        "/style.css" => Reply::new(200, "text/css; charset=utf-8", pages::STYLESHEET),
        _ => Reply::html_status(404, pages::not_found(&chrome)),
    };

    with_etag(reply, request.if_none_match.as_deref())
}

fn quiz(
    app: &App,
    context: &RequestContext,
    chrome: &Chrome,
    quiz_type: Option<&str>,
) -> Reply {
    if !app.auth.is_authenticated(context) {
        debug!("quiz requested without a session");
        return Reply::redirect("/");
    }
    let Some(quiz_type) = quiz_type.filter(|t| !t.is_empty()) else {
        return Reply::html(pages::quiz_picker(chrome, &app.quizzes.types()));
    };
    match app.quizzes.load(quiz_type) {
        Ok(questions) => Reply::html(pages::quiz_page(chrome, quiz_type, &questions)),
        Err(err @ QuizError::InvalidType(_)) => {
            warn!(error = %err, "rejected quiz type");
            Reply::text(400, "Invalid quiz type.")
        }
        Err(err) => {
            warn!(error = %err, "could not list quiz directory");
            Reply::text(500, QUIZ_READ_ERROR)
        }
    }
}

fn callback(app: &App, code: Option<String>, state: Option<String>) -> Reply {
    let (Some(code), Some(state)) = (code, state) else {
        warn!("login callback without code or state");
        return Reply::redirect("/");
    };
    match app.auth.complete_login(&code, &state) {
        Ok(token) => {
            Reply::redirect("/dashboard").with_header("Set-Cookie", app.auth.session_cookie(&token))
        }
        Err(err) => {
            warn!(error = %err, "login failed");
            Reply::redirect("/")
        }
    }
}

/// Decoded value of `key` in a query string. `+` decodes to a space.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k) == key).then(|| decode_component(v))
        })
        .next()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Strong ETag over the body.
pub fn etag(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

fn etag_matches(if_none_match: &str, tag: &str) -> bool {
    if_none_match
        .split(',')
        .map(|t| t.trim().trim_start_matches("W/"))
        .any(|t| t == "*" || t == tag)
}

fn with_etag(reply: Reply, if_none_match: Option<&str>) -> Reply {
    if reply.status != 200 {
        return reply;
    }
    let tag = etag(&reply.body);
    if if_none_match.is_some_and(|inm| etag_matches(inm, &tag)) {
        return Reply {
            status: 304,
            content_type: None,
            body: Vec::new(),
            headers: vec![("ETag", tag)],
        };
    }
    reply
        .with_header("ETag", tag)
        .with_header("Cache-Control", "no-cache")
}

// ============================================================================
// Server loop
// ============================================================================

/// Bind and serve until Ctrl+C.
pub fn serve(app: App, config: &ServerConfig) -> Result<(), ServeError> {
    let interface: IpAddr = config
        .interface
        .parse()
        .map_err(|e| ServeError::Interface(config.interface.clone(), e))?;
    let (server, addr) = try_bind_port(interface, config.port, config.max_port_retries)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        info!("shutting down");
        server_for_signal.unblock();
    })?;

    info!(%addr, "serving http://{addr}");

    for request in server.incoming_requests() {
        let started = Instant::now();
        let incoming = Incoming::from_request(&request);
        let reply = route(&app, &incoming);
        info!(
            method = %incoming.method,
            url = %incoming.url,
            status = reply.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );
        if let Err(err) = respond(request, reply) {
            warn!(error = %err, "failed to send response");
        }
    }

    Ok(())
}

/// Try to bind to a port, moving up one port at a time while it is taken.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr), ServeError> {
    let mut last_error = String::new();
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    info!(base_port, port, "port in use, using another");
                }
                return Ok((server, addr));
            }
            Err(err) => {
                debug!(port, error = %err, "bind failed");
                last_error = err.to_string();
            }
        }
    }
    Err(ServeError::Bind {
        attempts: max_retries,
        first: base_port,
        last: base_port.saturating_add(max_retries.saturating_sub(1)),
        message: last_error,
    })
}

fn respond(request: Request, reply: Reply) -> std::io::Result<()> {
    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Some(content_type) = reply.content_type {
        add_header(&mut response, "Content-Type", content_type);
    }
    for (name, value) in &reply.headers {
        add_header(&mut response, name, value);
    }
    request.respond(response)
}

fn add_header<R: std::io::Read>(response: &mut Response<R>, name: &str, value: &str) {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.add_header(header),
        Err(()) => warn!(header = name, "dropping invalid header"),
    }
}
