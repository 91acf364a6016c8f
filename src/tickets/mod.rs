pub mod handlers;
pub mod models;
pub mod service;
pub mod share;
pub mod ui;
pub mod videos;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::config::MediaConfig;
use crate::shared::state::AppState;

/// Batch uploads need room for several files plus multipart framing on top
/// of the per-file cap.
fn upload_body_limit(max_video_bytes: i64) -> usize {
    (max_video_bytes as usize).saturating_mul(4)
}

pub fn configure_ticket_routes(media: &MediaConfig) -> Router<Arc<AppState>> {
    let upload_limit = upload_body_limit(media.max_video_bytes);

    Router::new()
        .route("/chamados", get(handlers::ticket_list))
        .route(
            "/chamados/novo",
            get(handlers::ticket_create_page).post(handlers::ticket_create_submit),
        )
        .route(
            "/chamados/compartilhado/:slug",
            get(handlers::shared_view).post(handlers::shared_password_submit),
        )
        .route(
            "/chamados/compartilhado/:slug/comentario",
            post(handlers::shared_comment_submit),
        )
        .route("/chamados/video/:id/excluir", post(handlers::video_delete))
        .route("/chamados/:id", get(handlers::ticket_detail))
        .route(
            "/chamados/:id/editar",
            get(handlers::ticket_edit_page).post(handlers::ticket_edit_submit),
        )
        .route("/chamados/:id/excluir", post(handlers::ticket_delete))
        .route(
            "/chamados/:id/upload",
            post(handlers::ticket_upload_videos).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/chamados/:id/status", post(handlers::ticket_change_status))
        .route(
            "/chamados/:id/comentario",
            post(handlers::ticket_add_comment),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_scales_with_the_configured_file_cap() {
        assert_eq!(upload_body_limit(1024), 4096);
        let raised = 2 * 1024 * 1024 * 1024_i64;
        assert_eq!(upload_body_limit(raised), (raised as usize) * 4);
    }
}
