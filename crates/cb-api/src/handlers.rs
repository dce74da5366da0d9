//! # cb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the
//! [`BoardService`] workflows.

use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentType};
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use cb_core::models::{parse_page, NewClub, ReplyDraft, SortMode, ThreadDraft};
use cb_core::{AppError, BoardService};
use cb_ui::{
    render_text, success_notice, ClubTemplate, ClubsTemplate, DeletedTemplate, HitRow,
    NewClubTemplate, NewThreadTemplate, ResponseConfirmTemplate, ResponsePostedTemplate,
    ResponseView, SearchTemplate, ThreadConfirmTemplate, ThreadCreatedTemplate, ThreadTemplate,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::multipart::{read_form, FormLimits};

type HandlerResult = Result<HttpResponse, ApiError>;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub service: BoardService,
    /// Take the client address from `X-Forwarded-For` when set
    pub trust_proxy: bool,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    pub success: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub delete_password: String,
}

/// Text half of the new-thread form, posted to the preview step.
#[derive(Debug, Deserialize)]
pub struct ThreadPreviewForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub delete_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyPreviewForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub delete_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ClubForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub admin_password: String,
}

/// Address used for the anon id: the first `X-Forwarded-For` entry behind a
/// trusted proxy, otherwise the socket peer.
pub fn client_ip(req: &HttpRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').map(str::trim).find(|ip| !ip.is_empty()));
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    req.peer_addr().map(|a| a.ip().to_string()).unwrap_or_default()
}

fn html<T: Template>(page: &T) -> HandlerResult {
    let body = page
        .render()
        .map_err(|e| AppError::Internal(format!("template rendering failed: {e}")))?;
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(body))
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

// ── Clubs ────────────────────────────────────────────────────────────────────

/// Club index, served at both `/` and `/clubs`.
pub async fn list_clubs(data: web::Data<AppState>) -> HandlerResult {
    let clubs = data.service.list_clubs().await?;
    html(&ClubsTemplate {
        title: "Clubs",
        clubs: &clubs,
    })
}

pub async fn new_club_form() -> HandlerResult {
    html(&NewClubTemplate { title: "New club" })
}

pub async fn create_club(data: web::Data<AppState>, form: web::Form<ClubForm>) -> HandlerResult {
    let form = form.into_inner();
    let club = NewClub::new(&form.name, &form.description)?;
    let club_id = data.service.create_club(club, &form.admin_password).await?;
    Ok(see_other(format!("/clubs/{club_id}")))
}

pub async fn club_threads(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ListQuery>,
) -> HandlerResult {
    let sort = SortMode::from_query(query.sort.as_deref());
    let page = parse_page(query.page.as_deref());
    let (club, listing) = data.service.list_threads(path.into_inner(), sort, page).await?;
    let popular_hours = data.service.settings().popular_window.num_hours();
    html(&ClubTemplate::new(&club, &listing, popular_hours))
}

// ── Threads ──────────────────────────────────────────────────────────────────

pub async fn new_thread_form(data: web::Data<AppState>, path: web::Path<i64>) -> HandlerResult {
    let club = data.service.get_club(path.into_inner()).await?;
    html(&NewThreadTemplate {
        title: format!("New thread in {}", club.name),
        club: &club,
    })
}

/// Validates the text fields and shows them back before anything is stored.
pub async fn confirm_thread(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<ThreadPreviewForm>,
) -> HandlerResult {
    let club = data.service.get_club(path.into_inner()).await?;
    let draft = ThreadDraft::new(&form.title, &form.description, &form.delete_password, None)?;
    html(&ThreadConfirmTemplate {
        title: "Confirm new thread",
        club: &club,
        thread_title: draft.title(),
        description: draft.description(),
        description_html: render_text(draft.description()),
        delete_password: draft.delete_password(),
    })
}

pub async fn create_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> HandlerResult {
    let club_id = path.into_inner();
    let mut form = read_form(payload, FormLimits::for_upload(data.max_upload_bytes)).await?;
    let image = form.take_image();
    let draft = ThreadDraft::new(
        form.text("title"),
        form.text("description"),
        form.text("delete_password"),
        image,
    )?;

    let ip = client_ip(&req, data.trust_proxy);
    let thread_id = data.service.create_thread(club_id, draft, &ip).await?;
    Ok(see_other(format!("/threads/{thread_id}/created")))
}

pub async fn view_thread(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<ThreadQuery>,
) -> HandlerResult {
    let detail = data.service.thread_detail(path.into_inner()).await?;
    let media = data.service.media();
    let responses = detail
        .responses
        .iter()
        .enumerate()
        .map(|(i, response)| {
            let image_url = response.image_filename.as_deref().map(|r| media.public_url(r));
            ResponseView::new(i + 1, response, image_url)
        })
        .collect();

    html(&ThreadTemplate {
        title: &detail.thread.title,
        thread: &detail.thread,
        created_at: cb_core::format_timestamp(&detail.thread.created_at),
        responses,
        notice: query.success.as_deref().and_then(success_notice),
    })
}

pub async fn thread_created(data: web::Data<AppState>, path: web::Path<i64>) -> HandlerResult {
    let thread = data.service.find_thread(path.into_inner()).await?;
    html(&ThreadCreatedTemplate {
        title: "Thread created",
        thread_id: thread.id,
        club_id: thread.club_id,
    })
}

pub async fn delete_thread(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<DeleteForm>,
) -> HandlerResult {
    let deleted = data
        .service
        .delete_thread(path.into_inner(), &form.delete_password)
        .await?;
    html(&DeletedTemplate {
        title: "Thread deleted",
        message: "The thread and all of its responses were deleted.",
        back_href: format!("/clubs/{}", deleted.club_id),
        back_label: "Back to the club",
    })
}

// ── Responses ────────────────────────────────────────────────────────────────

pub async fn confirm_response(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<ReplyPreviewForm>,
) -> HandlerResult {
    let thread = data.service.find_thread(path.into_inner()).await?;
    let draft = ReplyDraft::new(Some(&form.name), &form.content, &form.delete_password, None)?;
    html(&ResponseConfirmTemplate {
        title: "Confirm reply",
        thread: &thread,
        display_name: draft.name().unwrap_or(data.service.settings().default_name.as_str()),
        name: draft.name().unwrap_or_default(),
        content: draft.content(),
        content_html: render_text(draft.content()),
        delete_password: draft.delete_password(),
    })
}

pub async fn post_response(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> HandlerResult {
    let thread_id = path.into_inner();
    let mut form = read_form(payload, FormLimits::for_upload(data.max_upload_bytes)).await?;
    let image = form.take_image();
    let draft = ReplyDraft::new(
        form.optional_text("name"),
        form.text("content"),
        form.text("delete_password"),
        image,
    )?;

    let ip = client_ip(&req, data.trust_proxy);
    data.service.post_response(thread_id, draft, &ip).await?;
    Ok(see_other(format!("/threads/{thread_id}/success")))
}

pub async fn response_posted(data: web::Data<AppState>, path: web::Path<i64>) -> HandlerResult {
    let thread = data.service.find_thread(path.into_inner()).await?;
    html(&ResponsePostedTemplate {
        title: "Reply posted",
        thread_id: thread.id,
    })
}

pub async fn delete_response(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    form: web::Form<DeleteForm>,
) -> HandlerResult {
    let removed = data
        .service
        .delete_response(path.into_inner(), &form.delete_password)
        .await?;
    html(&DeletedTemplate {
        title: "Response deleted",
        message: "The response was deleted.",
        back_href: format!("/threads/{}?success=deleted", removed.thread_id),
        back_label: "Back to the thread",
    })
}

// ── Search ───────────────────────────────────────────────────────────────────

pub async fn search(data: web::Data<AppState>, query: web::Query<SearchQuery>) -> HandlerResult {
    let keyword = query.keyword.as_deref().map(str::trim).unwrap_or_default();
    let hits = data.service.search(keyword).await?;
    html(&SearchTemplate {
        title: "Search",
        keyword,
        hits: hits.iter().map(HitRow::from).collect(),
    })
}
