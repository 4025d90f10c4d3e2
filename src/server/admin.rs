use std::collections::BTreeMap;
use std::sync::LazyLock;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use chrono::Utc;
use maud::{html, Markup, DOCTYPE};
use serde::Deserialize;
use url::Url;

use crate::{
    generator::sections::{Section, SECTIONS},
    i18n::{self, find_language},
    store::ListedPost,
    webhook::article::ArticlePayload,
};

use super::{
    activity::ActivityEntry,
    error::ApiError,
    webhooks::{publish, ENDPOINTS},
    AppState,
};

const POSTS_PAGE: &str = "/admin/posts";
const RECENT_ACTIVITY: usize = 10;

static SITE_ROOT: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("constant url"));

/// Absolute path built from raw segments, each percent-encoded.
fn encoded_path(segments: &[&str]) -> String {
    let mut url = SITE_ROOT.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_string()
}

fn page(state: &AppState, title: &str, body: Markup) -> Html<String> {
    let site_name = &state.ctx.config.site_name;
    let markup = html! {
        (DOCTYPE)
        html lang=(state.ctx.config.language) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | " (site_name) " admin" }
                link rel="stylesheet" href="/css/site.css";
            }
            body.admin {
                header.site-header {
                    a.brand href="/admin" { (site_name) " admin" }
                    nav {
                        a href="/admin" { "Dashboard" }
                        a href=(POSTS_PAGE) { "Posts" }
                        a href="/admin/posts/new" { "New post" }
                        a href="/admin/webhooks" { "Webhooks" }
                        a href="/" { "View site" }
                    }
                }
                main { (body) }
            }
        }
    };
    Html(markup.into_string())
}

pub(crate) async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let posts = state.with_store(|store| store.list_all()).await?;
    let deleted = posts.iter().filter(|p| p.deleted).count();
    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    for listed in posts.iter().filter(|p| !p.deleted) {
        *categories.entry(listed.post.category.as_str()).or_default() += 1;
    }
    let summary = state.activity.summary();
    let activity = state.activity.snapshot();
    let language = find_language(&state.ctx.config.language);

    let body = html! {
        h1 { "Dashboard" }
        section.stats {
            div.stat { strong { (posts.len()) } " posts" }
            div.stat { strong { (posts.len() - deleted) } " published" }
            div.stat { strong { (deleted) } " deleted" }
            div.stat {
                @match language {
                    Some(language) => { (language.flag) " " (language.native_name) }
                    None => { (state.ctx.config.language) }
                }
            }
        }
        h2 { "Categories" }
        @if categories.is_empty() {
            p { "No published posts yet." }
        } @else {
            ul.categories {
                @for (category, count) in &categories {
                    li { (category) ": " (count) }
                }
            }
        }
        h2 { "Webhook activity" }
        p {
            (summary.total) " calls, " (summary.succeeded) " succeeded, "
            (summary.client_errors) " rejected, " (summary.server_errors) " failed"
        }
        (activity_table(&activity[..activity.len().min(RECENT_ACTIVITY)]))
        @if activity.len() > RECENT_ACTIVITY {
            p { a href="/admin/webhooks" { "Full log" } }
        }
    };
    Ok(page(&state, "Dashboard", body))
}

fn activity_table(entries: &[ActivityEntry]) -> Markup {
    html! {
        @if !entries.is_empty() {
            table.activity {
                thead { tr { th { "Time" } th { "Endpoint" } th { "Status" } th { "Result" } } }
                tbody {
                    @for entry in entries {
                        tr class=(if entry.succeeded() { "ok" } else { "failed" }) {
                            td { (entry.at.format("%Y-%m-%d %H:%M:%S").to_string()) }
                            td { code { (entry.endpoint) } }
                            td { (entry.status) }
                            td {
                                @if let Some(created) = &entry.created {
                                    "created " code { (created) }
                                } @else if let Some(error) = &entry.error {
                                    (error)
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Endpoint reference for whoever wires up the automations, followed by the
/// full call log.
pub(crate) async fn webhooks(State(state): State<AppState>) -> Html<String> {
    let activity = state.activity.snapshot();
    let site_url = state.ctx.config.site_url.trim_end_matches('/');
    let body = html! {
        h1 { "Webhooks" }
        p {
            "POST JSON with " code { "Authorization: Bearer <secret>" } ". "
            "A GET on any endpoint returns the description shown here."
        }
        @for (path, describe) in ENDPOINTS {
            @let calls = activity.iter().filter(|e| e.endpoint == *path).count();
            section.endpoint {
                h2 { code { (site_url) (path) } }
                p { (calls) " calls in the log" }
                pre {
                    (serde_json::to_string_pretty(&describe()).unwrap_or_default())
                }
            }
        }
        h2 { "Call log" }
        @if activity.is_empty() {
            p { "No webhook calls yet." }
        }
        (activity_table(&activity))
    };
    page(&state, "Webhooks", body)
}

fn post_row(listed: &ListedPost) -> Markup {
    let post = &listed.post;
    let action = |verb: &str| encoded_path(&["admin", "posts", &post.filename, verb]);
    let article = encoded_path(&["posts", &format!("{}.html", post.id)]);
    html! {
        tr class=(if listed.deleted { "deleted" } else { "published" }) {
            td {
                @if listed.deleted {
                    (post.title)
                } @else {
                    a href=(article) { (post.title) }
                }
            }
            td { (post.category) }
            td {
                @if let Some(date) = post.date {
                    (date.format("%Y-%m-%d").to_string())
                }
            }
            td { (post.author) }
            td.actions {
                @if listed.deleted {
                    form method="post" action=(action("restore")) {
                        button type="submit" { "Restore" }
                    }
                } @else {
                    form method="post" action=(action("soft-delete")) {
                        button type="submit" { "Hide" }
                    }
                }
                form method="post" action=(action("delete")) {
                    button.danger type="submit" { "Delete permanently" }
                }
            }
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct PostsFilter {
    section: Option<String>,
}

fn section_nav(labels: &BTreeMap<&str, &str>, current: Option<&Section>) -> Markup {
    let label = |key: &str| labels.get(key).copied().unwrap_or(key).to_string();
    html! {
        nav.sections {
            @if current.is_none() { strong { "All" } } @else { a href=(POSTS_PAGE) { "All" } }
            @for section in SECTIONS {
                @if current.is_some_and(|c| c.slug == section.slug) {
                    strong { (label(section.label)) }
                } @else {
                    a href={ (POSTS_PAGE) "?section=" (section.slug) } { (label(section.label)) }
                }
            }
        }
    }
}

pub(crate) async fn posts(
    State(state): State<AppState>,
    Query(filter): Query<PostsFilter>,
) -> Result<Html<String>, ApiError> {
    let section = match filter.section.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => Some(
            SECTIONS
                .iter()
                .find(|s| s.slug == slug)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown section: {slug}")))?,
        ),
        None => None,
    };
    let mut posts = state.with_store(|store| store.list_all()).await?;
    if let Some(section) = section {
        posts.retain(|listed| (section.member)(&listed.post));
    }
    let labels = i18n::labels(&state.ctx.config.language);
    let label = |key: &str| labels.get(key).copied().unwrap_or(key).to_string();
    let title = section.map_or_else(|| "Posts".to_string(), |s| label(s.label));

    let body = html! {
        h1 { (title) }
        (section_nav(&labels, section))
        @if let Some(section) = section {
            @if !section.groups.is_empty() {
                ul.groups {
                    @for group in section.groups {
                        li {
                            (label(group.label)) ": "
                            (posts.iter().filter(|l| !l.deleted && (group.member)(&l.post)).count())
                        }
                    }
                }
            }
        }
        @if posts.is_empty() {
            p { "No posts yet." }
        } @else {
            table.posts {
                thead { tr { th { "Title" } th { "Category" } th { "Date" } th { "Author" } th {} } }
                tbody {
                    @for listed in &posts {
                        (post_row(listed))
                    }
                }
            }
        }
    };
    Ok(page(&state, &title, body))
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct NewPostForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    category: String,
    /// Comma separated.
    #[serde(default)]
    tags: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    featured_image: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl NewPostForm {
    fn to_payload(&self) -> ArticlePayload {
        ArticlePayload {
            title: non_empty(&self.title),
            content: non_empty(&self.content),
            excerpt: non_empty(&self.excerpt),
            category: non_empty(&self.category),
            tags: self.tags.split(',').filter_map(non_empty).collect(),
            author: non_empty(&self.author),
            featured_image: non_empty(&self.featured_image),
        }
    }
}

fn new_post_page(state: &AppState, form: &NewPostForm, error: Option<&str>) -> Html<String> {
    let body = html! {
        h1 { "New post" }
        @if let Some(error) = error {
            p.error { (error) }
        }
        form.new-post method="post" action="/admin/posts/new" {
            label { "Title" input type="text" name="title" value=(form.title) required; }
            label { "Category" input type="text" name="category" value=(form.category) required; }
            label { "Excerpt" input type="text" name="excerpt" value=(form.excerpt); }
            label { "Tags (comma separated)" input type="text" name="tags" value=(form.tags); }
            label { "Author" input type="text" name="author" value=(form.author); }
            label { "Featured image" input type="text" name="featured_image" value=(form.featured_image); }
            label { "Content (markdown)" textarea name="content" rows="16" required { (form.content) } }
            button type="submit" { "Publish" }
        }
    };
    page(state, "New post", body)
}

pub(crate) async fn new_post_form(State(state): State<AppState>) -> Html<String> {
    new_post_page(&state, &NewPostForm::default(), None)
}

pub(crate) async fn create_post(
    State(state): State<AppState>,
    form: Result<Form<NewPostForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form?;
    let prepared = match form.to_payload().prepare(Utc::now()) {
        Ok(prepared) => prepared,
        Err(rejected) => {
            let html = new_post_page(&state, &form, Some(&rejected.0));
            return Ok((StatusCode::BAD_REQUEST, html).into_response());
        }
    };
    publish(&state, prepared).await?;
    Ok(Redirect::to(POSTS_PAGE).into_response())
}

pub(crate) async fn soft_delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Redirect, ApiError> {
    state
        .with_store(move |store| store.soft_delete(&filename))
        .await?;
    state.rebuild.request();
    Ok(Redirect::to(POSTS_PAGE))
}

pub(crate) async fn restore(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Redirect, ApiError> {
    state
        .with_store(move |store| store.restore(&filename))
        .await?;
    state.rebuild.request();
    Ok(Redirect::to(POSTS_PAGE))
}

pub(crate) async fn hard_delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Redirect, ApiError> {
    state
        .with_store(move |store| store.hard_delete(&filename))
        .await?;
    state.rebuild.request();
    Ok(Redirect::to(POSTS_PAGE))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    use crate::server::testing::*;

    fn admin_request(method: &str, uri: &str, auth: Option<&str>, form: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(form.to_string())).unwrap()
    }

    #[tokio::test]
    async fn dashboard_requires_basic_auth() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);

        let response = send(&state, admin_request("GET", "/admin", None, "")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

        let response = send(&state, admin_request("GET", "/admin", Some(&bearer()), "")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&state, admin_request("GET", "/admin", Some(&basic()), "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Dashboard"));
        assert!(html.contains("0 calls"));
    }

    #[tokio::test]
    async fn form_creates_and_manages_posts() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);

        let form = "title=Kit+launch&category=news&content=New+shirts&tags=kit%2C+launch";
        let response = send(
            &state,
            admin_request("POST", "/admin/posts/new", Some(&basic()), form),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin/posts");

        let posts = state.ctx.store.list_visible().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].tags, vec!["kit", "launch"]);
        let filename = posts[0].filename.clone();

        let uri = format!("/admin/posts/{filename}/soft-delete");
        let response = send(&state, admin_request("POST", &uri, Some(&basic()), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.ctx.store.list_visible().unwrap().is_empty());

        let response = send(&state, admin_request("GET", "/admin/posts", Some(&basic()), "")).await;
        let html = body_text(response).await;
        assert!(html.contains("Restore"));

        let uri = format!("/admin/posts/{filename}/delete");
        send(&state, admin_request("POST", &uri, Some(&basic()), "")).await;
        assert!(state.ctx.store.list_all().unwrap().is_empty());
        assert!(state.ctx.store.deleted().unwrap().is_empty());
    }

    #[test]
    fn odd_filenames_are_encoded_in_links() {
        assert_eq!(
            super::encoded_path(&["admin", "posts", "what?#100%.md", "delete"]),
            "/admin/posts/what%3F%23100%25.md/delete"
        );
    }

    #[tokio::test]
    async fn odd_filename_round_trips_through_admin_routes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let posts_dir = state.ctx.store.posts_dir().to_path_buf();
        std::fs::create_dir_all(&posts_dir).unwrap();
        std::fs::write(posts_dir.join("why?.md"), "---\ntitle: Why\n---\nbody\n").unwrap();

        let response = send(&state, admin_request("GET", "/admin/posts", Some(&basic()), "")).await;
        let html = body_text(response).await;
        assert!(html.contains("/admin/posts/why%3F.md/soft-delete"));

        let uri = "/admin/posts/why%3F.md/soft-delete";
        let response = send(&state, admin_request("POST", uri, Some(&basic()), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.ctx.store.deleted().unwrap(), vec!["why?.md".to_string()]);
    }

    #[tokio::test]
    async fn cross_origin_form_post_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let posts_dir = state.ctx.store.posts_dir().to_path_buf();
        std::fs::create_dir_all(&posts_dir).unwrap();
        std::fs::write(posts_dir.join("derby.md"), "---\ntitle: Derby\n---\nbody\n").unwrap();
        let created = "derby.md";

        let mut request = admin_request(
            "POST",
            &format!("/admin/posts/{created}/delete"),
            Some(&basic()),
            "",
        );
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://evil.test".parse().unwrap());
        request
            .headers_mut()
            .insert(header::HOST, "localhost:3000".parse().unwrap());
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(state.ctx.store.list_all().unwrap().len(), 1);

        let mut request = admin_request(
            "POST",
            &format!("/admin/posts/{created}/delete"),
            Some(&basic()),
            "",
        );
        request
            .headers_mut()
            .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());
        request
            .headers_mut()
            .insert(header::HOST, "localhost:3000".parse().unwrap());
        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.ctx.store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn posts_filter_by_section() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let posts_dir = state.ctx.store.posts_dir().to_path_buf();
        std::fs::create_dir_all(&posts_dir).unwrap();
        std::fs::write(
            posts_dir.join("saka-rumor.md"),
            "---\ntitle: Saka linked\ncategory: transfer\ntags: [transfer, rumor]\n---\nx\n",
        )
        .unwrap();
        std::fs::write(
            posts_dir.join("derby-preview.md"),
            "---\ntitle: Derby preview\ncategory: match\ntags: [match, preview]\n---\nx\n",
        )
        .unwrap();

        let response = send(
            &state,
            admin_request("GET", "/admin/posts?section=transfers", Some(&basic()), ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Saka linked"));
        assert!(!html.contains("Derby preview"));
        assert!(html.contains("Rumors: 1"));

        let response = send(&state, admin_request("GET", "/admin/posts", Some(&basic()), "")).await;
        let html = body_text(response).await;
        assert!(html.contains("Saka linked") && html.contains("Derby preview"));

        let response = send(
            &state,
            admin_request("GET", "/admin/posts?section=gossip", Some(&basic()), ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhooks_page_lists_endpoints_and_calls() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let body = serde_json::json!({ "title": "Only a title" });
        send(&state, json_request("POST", "/api/webhook", Some(&bearer()), body)).await;

        let response = send(&state, admin_request("GET", "/admin/webhooks", Some(&basic()), "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        for path in ["/api/webhook", "/api/matches", "/api/transfers", "/api/viral"] {
            assert!(html.contains(path), "{path}");
        }
        assert!(html.contains("Transfer News Webhook Endpoint"));
        assert!(html.contains("1 calls in the log"));
        assert!(html.contains("<td>400</td>"));

        let response = send(&state, admin_request("GET", "/admin/webhooks", None, "")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_form_is_shown_again() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        let response = send(
            &state,
            admin_request("POST", "/admin/posts/new", Some(&basic()), "title=Only+a+title"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Missing required fields"));
        assert!(html.contains("Only a title"));
    }
}
