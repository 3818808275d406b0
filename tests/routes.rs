//! Route-level tests: drive `server::route` against the fixture repository
//! with a fake identity provider. No sockets, no network.
//!
//! Run with: cargo test --test routes

use lectern::auth::{Auth, AuthError, IdentityProvider, Profile, UserRegistry};
use lectern::config::SiteConfig;
use lectern::quiz::QuizLoader;
use lectern::render::ERROR_PAYLOAD;
use lectern::server::{App, Incoming, QUIZ_READ_ERROR, Reply, route};
use lectern::site::Site;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content")
}

struct FakeGitHub;

impl IdentityProvider for FakeGitHub {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://github.test/login/oauth/authorize?scope=user%3Aemail&state={state}")
    }

    fn exchange(&self, code: &str) -> Result<Profile, AuthError> {
        if code != "good-code" {
            return Err(AuthError::Provider("bad_verification_code".into()));
        }
        Ok(Profile {
            id: 583231,
            username: "octocat".into(),
            avatar: String::new(),
            email: "octocat@github.com".into(),
        })
    }
}

fn app_at(root: &Path, provider: Option<Box<dyn IdentityProvider>>) -> App {
    let config = SiteConfig::default();
    App::new(
        Site::new(root, &config),
        QuizLoader::new(root.join(&config.quiz.dir)),
        Auth::new(provider, &config.auth, UserRegistry::in_memory()),
    )
}

fn app() -> App {
    app_at(&fixtures(), Some(Box::new(FakeGitHub)))
}

fn get(app: &App, url: &str) -> Reply {
    route(app, &Incoming::get(url))
}

fn get_with_cookie(app: &App, url: &str, cookie: &str) -> Reply {
    route(app, &Incoming::get(url).with_cookie(cookie))
}

fn json(reply: &Reply) -> serde_json::Value {
    serde_json::from_slice(&reply.body).unwrap()
}

/// Run the login flow and return the `Cookie` header value for the session.
fn login(app: &App) -> String {
    let start = get(app, "/auth/github");
    assert_eq!(start.status, 302);
    let location = start.header("Location").unwrap();
    let state = location.rsplit("state=").next().unwrap();

    let done = get(
        app,
        &format!("/auth/github/callback?code=good-code&state={state}"),
    );
    assert_eq!(done.status, 302);
    assert_eq!(done.header("Location"), Some("/dashboard"));
    let set_cookie = done.header("Set-Cookie").unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Content routes
// ---------------------------------------------------------------------------

#[test]
fn landing_page() {
    let reply = get(&app(), "/");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/html; charset=utf-8"));
    let body = reply.body_text();
    assert!(body.contains("<title>Lectern</title>"));
    assert!(body.contains("/auth/github"));
}

#[test]
fn dashboard_defaults_to_readme() {
    let body = get(&app(), "/dashboard").body_text();
    assert!(body.contains("DSA with Dart"));
    assert!(body.contains(r#"href="/dashboard?path=Arrays%2Ftheory.md""#));
    assert!(!body.contains("prev-next\"><a"));
}

#[test]
fn dashboard_shows_selected_file_with_gist() {
    let body = get(&app(), "/dashboard?path=Arrays%2Ftwo_sum_easy.dart").body_text();
    assert!(body.contains(r#"<code class="language-dart">"#));
    assert!(body.contains("https://gist.github.com/abc123.js"));
    assert!(body.contains("theory.md"));
    assert!(body.contains("three_sum_medium.dart →"));
}

#[test]
fn file_content_api_shape() {
    let reply = get(&app(), "/api/file-content?path=Arrays/notes.md");
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.header("Content-Type"),
        Some("application/json; charset=utf-8")
    );
    let value = json(&reply);
    assert!(value["content"].as_str().unwrap().contains("<h1>Notes</h1>"));
    assert!(value["gistId"].is_null());
    assert_eq!(
        value["prevNext"]["prev"]["path"],
        "Arrays/trapping_rain_water_hard.dart"
    );
    assert_eq!(value["prevNext"]["next"]["path"], "Sorting/introduction.md");
    assert_eq!(value["prevNext"]["next"]["type"], "markdown");
}

#[test]
fn file_content_api_without_path_has_no_navigation() {
    let value = json(&get(&app(), "/api/file-content"));
    assert!(value["content"].as_str().unwrap().contains("DSA with Dart"));
    assert!(value["prevNext"]["prev"].is_null());
    assert!(value["prevNext"]["next"].is_null());
}

#[test]
fn file_content_api_degrades_for_missing_file() {
    let reply = get(&app(), "/api/file-content?path=Arrays/missing.md");
    assert_eq!(reply.status, 200);
    let value = json(&reply);
    assert_eq!(value["content"], ERROR_PAYLOAD);
    assert!(value["gistId"].is_null());
}

#[test]
fn file_content_api_refuses_escaping_paths() {
    let value = json(&get(&app(), "/api/file-content?path=..%2FCargo.toml"));
    assert_eq!(value["content"], ERROR_PAYLOAD);
}

#[test]
fn file_content_api_fails_without_content_root() {
    let missing = fixtures().join("does-not-exist");
    let app = app_at(&missing, None);
    let reply = get(&app, "/api/file-content?path=README.md");
    assert_eq!(reply.status, 500);
    assert_eq!(json(&reply)["error"], "Failed to load content");
}

#[test]
fn tree_api_is_ordered_and_filtered() {
    let value = json(&get(&app(), "/api/tree"));
    let names: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Arrays", "Quiz", "Sorting"]);
    assert_eq!(value[0]["type"], "directory");
    assert_eq!(value[0]["children"][0]["name"], "README.md");
    assert_eq!(value[0]["children"][2]["gistId"], "abc123");
}

#[test]
fn fullscreen_title_is_file_name() {
    let body = get(&app(), "/fullscreen?path=Sorting/overview.md").body_text();
    assert!(body.contains("<title>overview.md</title>"));
    assert!(body.contains("<h1>Overview</h1>"));
}

#[test]
fn stylesheet_is_served() {
    let reply = get(&app(), "/style.css");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type"), Some("text/css; charset=utf-8"));
    assert!(reply.body_text().contains(".text-red-500"));
}

#[test]
fn unknown_route_is_404() {
    let reply = get(&app(), "/nope");
    assert_eq!(reply.status, 404);
    assert!(reply.header("ETag").is_none());
}

#[test]
fn non_get_is_rejected() {
    let mut request = Incoming::get("/");
    request.method = "POST".into();
    let reply = route(&app(), &request);
    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow"), Some("GET, HEAD"));
}

#[test]
fn etag_revalidation() {
    let app = app();
    let first = get(&app, "/api/tree");
    let tag = first.header("ETag").unwrap().to_string();

    let cached = route(&app, &Incoming::get("/api/tree").with_if_none_match(&tag));
    assert_eq!(cached.status, 304);
    assert!(cached.body.is_empty());

    let stale = route(
        &app,
        &Incoming::get("/api/tree").with_if_none_match("\"stale\""),
    );
    assert_eq!(stale.status, 200);
}

// ---------------------------------------------------------------------------
// Authentication and quizzes
// ---------------------------------------------------------------------------

#[test]
fn quiz_redirects_without_session() {
    let reply = get(&app(), "/quiz?type=arrays");
    assert_eq!(reply.status, 302);
    assert_eq!(reply.header("Location"), Some("/"));
}

#[test]
fn quiz_redirects_with_unknown_session() {
    let reply = get_with_cookie(&app(), "/quiz", "lectern_session=forged");
    assert_eq!(reply.status, 302);
}

#[test]
fn login_then_quiz_then_logout() {
    let app = app();
    let cookie = login(&app);

    let picker = get_with_cookie(&app, "/quiz", &cookie);
    assert_eq!(picker.status, 200);
    let body = picker.body_text();
    assert!(body.contains(r#"href="/quiz?type=arrays""#));
    assert!(body.contains("octocat"));

    let quiz = get_with_cookie(&app, "/quiz?type=arrays", &cookie).body_text();
    assert!(quiz.contains("What is the time complexity of indexing an array?"));
    assert!(quiz.contains("Hash map of seen values"));

    let logout = get_with_cookie(&app, "/auth/logout", &cookie);
    assert_eq!(logout.status, 302);
    assert_eq!(logout.header("Location"), Some("/"));
    assert!(logout.header("Set-Cookie").unwrap().contains("Max-Age=0"));

    assert_eq!(get_with_cookie(&app, "/quiz", &cookie).status, 302);
}

#[test]
fn missing_quiz_type_is_server_error() {
    let app = app();
    let cookie = login(&app);
    let reply = get_with_cookie(&app, "/quiz?type=graphs", &cookie);
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body_text(), QUIZ_READ_ERROR);
}

#[test]
fn traversing_quiz_type_is_rejected() {
    let app = app();
    let cookie = login(&app);
    let reply = get_with_cookie(&app, "/quiz?type=..%2FArrays", &cookie);
    assert_eq!(reply.status, 400);
}

#[test]
fn callback_with_forged_state_redirects_home() {
    let reply = get(&app(), "/auth/github/callback?code=good-code&state=forged");
    assert_eq!(reply.status, 302);
    assert_eq!(reply.header("Location"), Some("/"));
    assert!(reply.header("Set-Cookie").is_none());
}

#[test]
fn callback_with_bad_code_redirects_home() {
    let app = app();
    let location = get(&app, "/auth/github").header("Location").unwrap().to_string();
    let state = location.rsplit("state=").next().unwrap();
    let reply = get(&app, &format!("/auth/github/callback?code=bad&state={state}"));
    assert_eq!(reply.header("Location"), Some("/"));
    assert!(app.auth.users().is_empty());
}

#[test]
fn callback_records_user() {
    let app = app();
    login(&app);
    let user = app.auth.users().get(583231).unwrap();
    assert_eq!(user.username, "octocat");
    assert_eq!(user.email, "octocat@github.com");
}

#[test]
fn login_without_provider_redirects_home() {
    let app = app_at(&fixtures(), None);
    let reply = get(&app, "/auth/github");
    assert_eq!(reply.status, 302);
    assert_eq!(reply.header("Location"), Some("/"));
    assert!(!get(&app, "/").body_text().contains("/auth/github"));
}
