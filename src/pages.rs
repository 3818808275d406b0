//! HTML pages.
//!
//! Every page is a maud template assembled from a few shared components:
//!
//! - **Base document**: doctype, viewport, and the stylesheet served at
//!   `/style.css`
//! - **Site header**: site title, section links, and the login state
//! - **Lesson tree**: nested `<details>` lists linking into the dashboard,
//!   with the branch holding the current lesson expanded
//!
//! ## Pages
//!
//! | Page | Route |
//! |------|-------|
//! | landing | `/` |
//! | dashboard | `/dashboard?path=` |
//! | fullscreen | `/fullscreen?path=` |
//! | quiz picker | `/quiz` |
//! | quiz | `/quiz?type=` |
//! | not found | anything unknown |
//!
//! Rendered file content is inserted pre-escaped: the renderer already
//! escaped source text and produced the markdown HTML. Everything else goes
//! through maud's auto-escaping.

use crate::auth::User;
use crate::quiz::Question;
use crate::site::{Fullscreen, Lookup};
use crate::tree::ContentNode;
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Stylesheet served at `/style.css`.
pub const STYLESHEET: &str = include_str!("../static/style.css");

/// Per-request page chrome.
#[derive(Debug, Clone, Copy)]
pub struct Chrome<'a> {
    pub site_title: &'a str,
    pub user: Option<&'a User>,
    pub login_enabled: bool,
}

/// Dashboard link for a content path.
pub fn dashboard_href(path: &str) -> String {
    format!("/dashboard?path={}", urlencoding::encode(path))
}

/// Fullscreen link for a content path.
pub fn fullscreen_href(path: &str) -> String {
    format!("/fullscreen?path={}", urlencoding::encode(path))
}

fn quiz_href(quiz_type: &str) -> String {
    format!("/quiz?type={}", urlencoding::encode(quiz_type))
}

// ============================================================================
// Components
// ============================================================================

fn base_document(title: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href="/style.css";
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

fn site_header(chrome: &Chrome) -> Markup {
    html! {
        header.site-header {
            a.brand href="/" { (chrome.site_title) }
            nav.site-nav {
                a href="/dashboard" { "Lessons" }
                a href="/quiz" { "Quiz" }
                @if let Some(user) = chrome.user {
                    span.user {
                        @if !user.avatar.is_empty() {
                            img.avatar src=(user.avatar) alt="";
                        }
                        (user.username)
                    }
                    a href="/auth/logout" { "Log out" }
                } @else if chrome.login_enabled {
                    a.login href="/auth/github" { "Log in with GitHub" }
                }
            }
        }
    }
}

/// Nested lesson list. The branch containing `current` starts expanded and
/// the current leaf is marked.
pub fn render_tree(nodes: &[ContentNode], current: &str) -> Markup {
    html! {
        ul.tree {
            @for node in nodes {
                (render_tree_node(node, current))
            }
        }
    }
}

fn render_tree_node(node: &ContentNode, current: &str) -> Markup {
    let is_current = node.path == current;
    let contains_current = current.starts_with(&format!("{}/", node.path));

    html! {
        li class=[is_current.then_some("current")] {
            @if node.is_leaf() {
                a href=(dashboard_href(&node.path)) { (node.name) }
                @if node.external_ref_id().is_some() {
                    span.gist-marker title="Has a gist" { "◆" }
                }
            } @else {
                details open[contains_current] {
                    summary { (node.name) }
                    (render_tree(node.children(), current))
                }
            }
        }
    }
}

fn prev_next(lookup: &Lookup) -> Markup {
    html! {
        nav.prev-next {
            @if let Some(prev) = &lookup.navigation.previous {
                a.prev href=(dashboard_href(&prev.path)) { "← " (prev.name) }
            }
            @if let Some(next) = &lookup.navigation.next {
                a.next href=(dashboard_href(&next.path)) { (next.name) " →" }
            }
        }
    }
}

fn gist_embed(id: &str) -> Markup {
    html! {
        section.gist {
            script src={ "https://gist.github.com/" (id) ".js" } {}
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

pub fn landing(chrome: &Chrome) -> Markup {
    let content = html! {
        (site_header(chrome))
        main.landing {
            h1 { (chrome.site_title) }
            p { "Lessons, worked solutions and quizzes, straight from the repository." }
            div.actions {
                a.button href="/dashboard" { "Browse lessons" }
                @if chrome.user.is_none() && chrome.login_enabled {
                    a.button.secondary href="/auth/github" { "Log in with GitHub for quizzes" }
                } @else {
                    a.button.secondary href="/quiz" { "Take a quiz" }
                }
            }
        }
    };
    base_document(chrome.site_title, Some("landing-view"), content)
}

pub fn dashboard(chrome: &Chrome, lookup: &Lookup) -> Markup {
    let content = html! {
        (site_header(chrome))
        div.dashboard {
            aside.sidebar {
                (render_tree(&lookup.tree, &lookup.selected_path))
            }
            main.lesson {
                div.toolbar {
                    span.current-path { (lookup.selected_path) }
                    a href=(fullscreen_href(&lookup.selected_path)) target="_blank" { "Fullscreen" }
                }
                article.content {
                    (PreEscaped(&lookup.rendered.html))
                }
                @if let Some(id) = &lookup.rendered.external_ref_id {
                    (gist_embed(id))
                }
                (prev_next(lookup))
            }
        }
    };
    base_document(chrome.site_title, Some("dashboard-view"), content)
}

pub fn fullscreen(full: &Fullscreen) -> Markup {
    let content = html! {
        main.fullscreen {
            article.content {
                (PreEscaped(&full.rendered.html))
            }
            @if let Some(id) = &full.rendered.external_ref_id {
                (gist_embed(id))
            }
        }
    };
    base_document(&full.title, Some("fullscreen-view"), content)
}

pub fn quiz_picker(chrome: &Chrome, types: &[String]) -> Markup {
    let content = html! {
        (site_header(chrome))
        main.quiz {
            h1 { "Quizzes" }
            @if types.is_empty() {
                p.empty { "No quizzes yet." }
            } @else {
                ul.quiz-types {
                    @for quiz_type in types {
                        li { a href=(quiz_href(quiz_type)) { (quiz_type) } }
                    }
                }
            }
        }
    };
    base_document(&format!("Quiz - {}", chrome.site_title), Some("quiz-view"), content)
}

pub fn quiz_page(chrome: &Chrome, quiz_type: &str, questions: &[Question]) -> Markup {
    let content = html! {
        (site_header(chrome))
        main.quiz {
            h1 { "Quiz: " (quiz_type) }
            @if questions.is_empty() {
                p.empty { "This quiz has no questions." }
            }
            ol.questions {
                @for (n, q) in questions.iter().enumerate() {
                    li.question {
                        p.prompt { (q.question) }
                        ul.options {
                            @for (i, option) in q.options.iter().enumerate() {
                                li {
                                    label {
                                        input type="radio" name={ "q" (n) } value=(i);
                                        " " (option)
                                    }
                                }
                            }
                        }
                        @if let Some(answer) = q.answer_index().and_then(|i| q.options.get(i)) {
                            details.answer {
                                summary { "Show answer" }
                                p { strong { (answer) } }
                                @if let Some(explanation) = &q.explanation {
                                    p.explanation { (explanation) }
                                }
                            }
                        }
                    }
                }
            }
            a href="/quiz" { "← All quizzes" }
        }
    };
    base_document(&format!("{quiz_type} - Quiz"), Some("quiz-view"), content)
}

pub fn not_found(chrome: &Chrome) -> Markup {
    let content = html! {
        (site_header(chrome))
        main.not-found {
            h1 { "Not found" }
            p { a href="/" { "Back to the start page" } }
        }
    };
    base_document("Not found", None, content)
}

// ============================================================================
// Tests
// ============================================================================
