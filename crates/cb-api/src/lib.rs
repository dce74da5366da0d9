//! # cb-api
//!
//! The web routing and orchestration layer for the club board.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;

pub use error::ApiError;
pub use handlers::AppState;

use actix_web::web;

use crate::multipart::MAX_TEXT_BYTES;

/// Registers every board page and form endpoint.
///
/// Routes are added directly rather than under an empty scope so that other
/// services (e.g. the uploads directory) mounted by the binary stay reachable.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(4 * MAX_TEXT_BYTES))
        .route("/", web::get().to(handlers::list_clubs))
        .route("/clubs", web::get().to(handlers::list_clubs))
        .route("/clubs", web::post().to(handlers::create_club))
        // must precede /clubs/{club_id}
        .route("/clubs/new", web::get().to(handlers::new_club_form))
        .route("/clubs/{club_id}", web::get().to(handlers::club_threads))
        .route("/clubs/{club_id}/threads/new", web::get().to(handlers::new_thread_form))
        .route("/clubs/{club_id}/threads/confirm", web::post().to(handlers::confirm_thread))
        .route("/clubs/{club_id}/threads", web::post().to(handlers::create_thread))
        .route("/threads/{thread_id}", web::get().to(handlers::view_thread))
        .route("/threads/{thread_id}/created", web::get().to(handlers::thread_created))
        .route("/threads/{thread_id}/responses/confirm", web::post().to(handlers::confirm_response))
        .route("/threads/{thread_id}/responses", web::post().to(handlers::post_response))
        .route("/threads/{thread_id}/success", web::get().to(handlers::response_posted))
        .route("/threads/{thread_id}/delete", web::post().to(handlers::delete_thread))
        .route("/responses/{response_id}/delete", web::post().to(handlers::delete_response))
        .route("/search", web::get().to(handlers::search));
}
