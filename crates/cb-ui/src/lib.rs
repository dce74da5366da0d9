//! # cb-ui
//!
//! Askama templates and the view models they render.

use askama::Template;
use cb_core::clock::format_timestamp;
use cb_core::models::{Club, Response, SearchHit, Thread, ThreadPage, ThreadSummary};

/// Escapes HTML and turns newlines into line breaks.
pub fn render_text(raw: &str) -> String {
    html_escape::encode_text(raw)
        .lines()
        .collect::<Vec<_>>()
        .join("<br>")
}

// ── View models ──────────────────────────────────────────────────────────────

pub struct ThreadRow {
    pub id: i64,
    pub title: String,
    pub created_at: String,
    pub response_count: i64,
}

impl From<&ThreadSummary> for ThreadRow {
    fn from(t: &ThreadSummary) -> Self {
        Self {
            id: t.id,
            title: t.title.clone(),
            created_at: format_timestamp(&t.created_at),
            response_count: t.response_count,
        }
    }
}

pub struct PageLink {
    pub number: u32,
    pub current: bool,
}

pub struct ResponseView {
    /// 1-based position inside the thread
    pub number: usize,
    pub id: i64,
    pub name: String,
    pub anon_id: String,
    pub created_at: String,
    pub text_html: String,
    /// Empty when the response has no image
    pub image_url: String,
    /// No delete form for the opening response (it goes with the thread) or
    /// for legacy responses without a password
    pub deletable: bool,
}

impl ResponseView {
    pub fn new(number: usize, response: &Response, image_url: Option<String>) -> Self {
        Self {
            number,
            id: response.id,
            name: response.name.clone(),
            anon_id: response.anon_id.clone(),
            created_at: format_timestamp(&response.created_at),
            text_html: render_text(&response.text),
            image_url: image_url.unwrap_or_default(),
            deletable: number > 1
                && response
                    .delete_password
                    .as_deref()
                    .is_some_and(|pw| !pw.is_empty()),
        }
    }
}

/// Fixed banner text for the `?success=` key on the thread page. Unknown keys
/// show nothing, so the query string cannot inject text.
pub fn success_notice(key: &str) -> Option<&'static str> {
    match key {
        "posted" => Some("Your reply was posted."),
        "deleted" => Some("The response was deleted."),
        _ => None,
    }
}

pub struct HitRow {
    pub thread_id: i64,
    pub club_id: i64,
    pub club_name: String,
    pub title: String,
    pub created_at: String,
}

impl From<&SearchHit> for HitRow {
    fn from(hit: &SearchHit) -> Self {
        Self {
            thread_id: hit.thread_id,
            club_id: hit.club_id,
            club_name: hit.club_name.clone(),
            title: hit.title.clone(),
            created_at: format_timestamp(&hit.created_at),
        }
    }
}

// ── Templates ────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "clubs.html")]
pub struct ClubsTemplate<'a> {
    pub title: &'a str,
    pub clubs: &'a [Club],
}

#[derive(Template)]
#[template(path = "club_form.html")]
pub struct NewClubTemplate<'a> {
    pub title: &'a str,
}

#[derive(Template)]
#[template(path = "club.html")]
pub struct ClubTemplate<'a> {
    pub title: String,
    pub club: &'a Club,
    pub threads: Vec<ThreadRow>,
    pub popular: bool,
    /// Length of the popular window, shown on the sort link
    pub popular_hours: i64,
    pub sort: &'a str,
    pub pages: Vec<PageLink>,
}

impl<'a> ClubTemplate<'a> {
    pub fn new(club: &'a Club, page: &ThreadPage, popular_hours: i64) -> Self {
        Self {
            title: club.name.clone(),
            club,
            threads: page.threads.iter().map(ThreadRow::from).collect(),
            popular: page.sort == cb_core::models::SortMode::Popular,
            popular_hours,
            sort: page.sort.as_str(),
            pages: (1..=page.total_pages)
                .map(|number| PageLink {
                    number,
                    current: number == page.page,
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "thread_form.html")]
pub struct NewThreadTemplate<'a> {
    pub title: String,
    pub club: &'a Club,
}

#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadTemplate<'a> {
    pub title: &'a str,
    pub thread: &'a Thread,
    pub created_at: String,
    pub responses: Vec<ResponseView>,
    pub notice: Option<&'static str>,
}

/// Preview of a new thread. The hidden fields re-post the validated text to
/// the real create endpoint; the image is attached on this page.
#[derive(Template)]
#[template(path = "thread_confirm.html")]
pub struct ThreadConfirmTemplate<'a> {
    pub title: &'a str,
    pub club: &'a Club,
    pub thread_title: &'a str,
    pub description: &'a str,
    pub description_html: String,
    pub delete_password: &'a str,
}

#[derive(Template)]
#[template(path = "response_confirm.html")]
pub struct ResponseConfirmTemplate<'a> {
    pub title: &'a str,
    pub thread: &'a Thread,
    /// Name shown in the preview, the default name when left blank
    pub display_name: &'a str,
    /// Name re-posted as typed; blank keeps the default
    pub name: &'a str,
    pub content: &'a str,
    pub content_html: String,
    pub delete_password: &'a str,
}

#[derive(Template)]
#[template(path = "thread_created.html")]
pub struct ThreadCreatedTemplate<'a> {
    pub title: &'a str,
    pub thread_id: i64,
    pub club_id: i64,
}

#[derive(Template)]
#[template(path = "response_posted.html")]
pub struct ResponsePostedTemplate<'a> {
    pub title: &'a str,
    pub thread_id: i64,
}

#[derive(Template)]
#[template(path = "deleted.html")]
pub struct DeletedTemplate<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub back_href: String,
    pub back_label: &'a str,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate<'a> {
    pub title: &'a str,
    pub keyword: &'a str,
    pub hits: Vec<HitRow>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub title: &'a str,
    pub status: u16,
    pub message: &'a str,
}
