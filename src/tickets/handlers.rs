//! Ticket handlers, both the authenticated pages and the public share page.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::error;
use uuid::Uuid;

use crate::auth::{ensure_session, CurrentUser};
use crate::customers::CustomerService;
use crate::session::FlashKind;
use crate::shared::state::AppState;

use super::models::{TicketSearch, TicketStatus};
use super::service::{TicketForm, TicketService};
use super::share::{self, ShareAccess};
use super::videos::{self, UploadedFile};
use super::ui;

fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Não encontrado")
}

pub async fn ticket_list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(filters): Query<TicketSearch>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let tickets = match service.search(user.id, &filters) {
        Ok(tickets) => tickets,
        Err(e) => {
            error!("Ticket search failed: {e}");
            Vec::new()
        }
    };
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_list(&tickets, &filters, &flashes))
}

pub async fn ticket_create_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> impl IntoResponse {
    let customers = CustomerService::new(state.conn.clone())
        .list_active()
        .unwrap_or_default();
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_form(
        None,
        &customers,
        &TicketForm::default(),
        &[],
        &flashes,
    ))
}

pub async fn ticket_create_submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<TicketForm>,
) -> impl IntoResponse {
    let customers = CustomerService::new(state.conn.clone())
        .list_active()
        .unwrap_or_default();

    let data = match form.validate(false) {
        Ok(data) => data,
        Err(errors) => {
            return Html(ui::render_form(None, &customers, &form, &errors, &[]))
                .into_response()
        }
    };

    let service = TicketService::new(state.conn.clone());
    match service.create(user.id, data) {
        Ok(ticket) => {
            state
                .flash(
                    user.session_id,
                    FlashKind::Success,
                    format!("Chamado \"{}\" criado com sucesso!", ticket.title),
                )
                .await;
            Redirect::to(&format!("/chamados/{}", ticket.id)).into_response()
        }
        Err(e) => {
            error!("Ticket insert failed: {e}");
            Html(ui::render_form(
                None,
                &customers,
                &form,
                &[("__all__", "Erro interno. Tente novamente.".to_string())],
                &[],
            ))
            .into_response()
        }
    }
}

pub async fn ticket_detail(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_owned(id, user.id) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };

    let customer_name = CustomerService::new(state.conn.clone())
        .find(ticket.customer_id)
        .map(|c| c.name)
        .unwrap_or_default();
    let videos = service.list_videos(ticket.id).unwrap_or_default();
    let comments = service.list_comments(ticket.id).unwrap_or_default();
    let flashes = state.take_flashes(user.session_id).await;

    Html(ui::render_detail(&ticket, &customer_name, &videos, &comments, &flashes))
        .into_response()
}

pub async fn ticket_edit_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_owned(id, user.id) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };
    let customers = CustomerService::new(state.conn.clone())
        .list_active()
        .unwrap_or_default();

    let form = TicketForm {
        titulo: ticket.title.clone(),
        descricao: ticket.description.clone(),
        cliente: ticket.customer_id.to_string(),
        status: ticket.status.clone(),
        prioridade: ticket.priority.clone(),
        tipo_compartilhamento: ticket.share_mode.clone(),
        senha_compartilhamento: String::new(),
        expira_em: ticket
            .expires_at
            .map(|dt| dt.format("%Y-%m-%dT%H:%M").to_string())
            .unwrap_or_default(),
    };
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_form(Some(&ticket), &customers, &form, &[], &flashes)).into_response()
}

pub async fn ticket_edit_submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<TicketForm>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_owned(id, user.id) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };
    let customers = CustomerService::new(state.conn.clone())
        .list_active()
        .unwrap_or_default();

    let data = match form.validate(ticket.share_password_hash.is_some()) {
        Ok(data) => data,
        Err(errors) => {
            return Html(ui::render_form(Some(&ticket), &customers, &form, &errors, &[]))
                .into_response()
        }
    };

    match service.update(&ticket, data) {
        Ok(updated) => {
            state
                .flash(user.session_id, FlashKind::Success, "Chamado atualizado com sucesso!")
                .await;
            Redirect::to(&format!("/chamados/{}", updated.id)).into_response()
        }
        Err(e) => {
            error!("Ticket update failed: {e}");
            Html(ui::render_form(
                Some(&ticket),
                &customers,
                &form,
                &[("__all__", "Erro interno. Tente novamente.".to_string())],
                &[],
            ))
            .into_response()
        }
    }
}

pub async fn ticket_delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_owned(id, user.id) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };

    // Files first; once the row is gone there is no record of their paths.
    let videos = service.list_videos(ticket.id).unwrap_or_default();
    videos::delete_ticket_files(&state.config.media.storage_path, ticket.id, &videos);

    match service.delete(&ticket) {
        Ok(()) => {
            state
                .flash(user.session_id, FlashKind::Success, "Chamado excluído com sucesso!")
                .await;
        }
        Err(e) => {
            error!("Ticket delete failed: {e}");
            state
                .flash(user.session_id, FlashKind::Error, "Erro ao excluir chamado.")
                .await;
        }
    }
    Redirect::to("/chamados").into_response()
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

pub async fn ticket_change_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_owned(id, user.id) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };

    match TicketStatus::parse(form.status.trim()) {
        Some(status) => match service.change_status(&ticket, status) {
            Ok(()) => {
                state
                    .flash(
                        user.session_id,
                        FlashKind::Success,
                        format!("Status atualizado para {}!", status.label()),
                    )
                    .await;
            }
            Err(e) => {
                error!("Status change failed: {e}");
                state
                    .flash(user.session_id, FlashKind::Error, "Erro ao atualizar status.")
                    .await;
            }
        },
        None => {
            state
                .flash(user.session_id, FlashKind::Error, "Status inválido.")
                .await;
        }
    }
    Redirect::to(&format!("/chamados/{id}")).into_response()
}

/// Accepts a batch of `arquivos` parts plus an optional shared `descricao`.
/// Valid files are stored even when siblings are rejected.
pub async fn ticket_upload_videos(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_owned(id, user.id) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };
    let detail = format!("/chamados/{}", ticket.id);

    let mut files: Vec<UploadedFile> = Vec::new();
    let mut description = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!("Multipart read failed: {e}");
                state
                    .flash(user.session_id, FlashKind::Error, "Falha ao receber os arquivos.")
                    .await;
                return Redirect::to(&detail).into_response();
            }
        };

        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("arquivos") => {
                let name = field.file_name().unwrap_or_default().to_string();
                if name.is_empty() {
                    continue;
                }
                match field.bytes().await {
                    Ok(data) => files.push(UploadedFile {
                        name,
                        data: data.to_vec(),
                    }),
                    Err(e) => {
                        error!("Multipart read failed: {e}");
                        state
                            .flash(
                                user.session_id,
                                FlashKind::Error,
                                "Falha ao receber os arquivos.",
                            )
                            .await;
                        return Redirect::to(&detail).into_response();
                    }
                }
            }
            Some("descricao") => {
                description = field.text().await.unwrap_or_default().trim().to_string();
            }
            _ => {}
        }
    }

    if files.is_empty() {
        state
            .flash(
                user.session_id,
                FlashKind::Error,
                "Selecione ao menos um arquivo de vídeo.",
            )
            .await;
        return Redirect::to(&detail).into_response();
    }

    let (valid, rejections) = videos::split_batch(files, &state.config.media);
    let mut stored = 0;
    for file in &valid {
        let video = match videos::store_video(
            &state.config.media.storage_path,
            ticket.id,
            Some(user.id),
            &description,
            file,
        ) {
            Ok(video) => video,
            Err(e) => {
                error!("Video write failed for {}: {e}", file.name);
                state
                    .flash(
                        user.session_id,
                        FlashKind::Error,
                        format!("Erro ao salvar \"{}\".", file.name),
                    )
                    .await;
                continue;
            }
        };
        match service.insert_video(&video) {
            Ok(()) => stored += 1,
            Err(e) => {
                error!("Video insert failed for {}: {e}", file.name);
                videos::delete_video_file(&state.config.media.storage_path, &video);
                state
                    .flash(
                        user.session_id,
                        FlashKind::Error,
                        format!("Erro ao salvar \"{}\".", file.name),
                    )
                    .await;
            }
        }
    }

    if stored > 0 {
        state
            .flash(
                user.session_id,
                FlashKind::Success,
                format!("{stored} vídeo(s) enviado(s) com sucesso!"),
            )
            .await;
    }
    for message in rejections {
        state.flash(user.session_id, FlashKind::Error, message).await;
    }

    Redirect::to(&detail).into_response()
}

pub async fn video_delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(video_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let video = match service.find_owned_video(video_id, user.id) {
        Ok(video) => video,
        Err(_) => return not_found().into_response(),
    };

    videos::delete_video_file(&state.config.media.storage_path, &video);
    match service.delete_video(video.id) {
        Ok(()) => {
            state
                .flash(user.session_id, FlashKind::Success, "Vídeo excluído com sucesso!")
                .await;
        }
        Err(e) => {
            error!("Video delete failed: {e}");
            state
                .flash(user.session_id, FlashKind::Error, "Erro ao excluir vídeo.")
                .await;
        }
    }
    Redirect::to(&format!("/chamados/{}", video.ticket_id)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub texto: String,
}

pub async fn ticket_add_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<CommentForm>,
) -> impl IntoResponse {
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_owned(id, user.id) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };

    let body = form.texto.trim();
    if body.is_empty() {
        state
            .flash(user.session_id, FlashKind::Error, "Escreva um comentário.")
            .await;
    } else {
        match service.add_comment(ticket.id, body, Some(user.id), &user.display_name) {
            Ok(_) => {
                state
                    .flash(user.session_id, FlashKind::Success, "Comentário adicionado!")
                    .await;
            }
            Err(e) => {
                error!("Comment insert failed: {e}");
                state
                    .flash(user.session_id, FlashKind::Error, "Erro ao adicionar comentário.")
                    .await;
            }
        }
    }
    Redirect::to(&format!("/chamados/{id}")).into_response()
}

// ===== Public share page =====

pub async fn shared_view(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let session_id = ensure_session(&state, &cookies).await;
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_by_slug(&slug) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };

    let unlocked = {
        let sessions = state.sessions.lock().await;
        sessions.is_ticket_unlocked(session_id, ticket.id)
    };

    match share::evaluate_for(&ticket, Utc::now(), unlocked) {
        ShareAccess::Expired => Html(ui::render_shared_expired(&ticket)).into_response(),
        ShareAccess::Locked => {
            Html(ui::render_shared_password(&ticket, None)).into_response()
        }
        ShareAccess::Granted => {
            let customer_name = CustomerService::new(state.conn.clone())
                .find(ticket.customer_id)
                .map(|c| c.name)
                .unwrap_or_default();
            let videos = service.list_videos(ticket.id).unwrap_or_default();
            let comments = service.list_comments(ticket.id).unwrap_or_default();
            let flashes = state.take_flashes(session_id).await;
            Html(ui::render_shared(&ticket, &customer_name, &videos, &comments, &flashes))
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SharePasswordForm {
    #[serde(default)]
    pub senha: String,
}

pub async fn shared_password_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(slug): Path<String>,
    Form(form): Form<SharePasswordForm>,
) -> impl IntoResponse {
    let session_id = ensure_session(&state, &cookies).await;
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_by_slug(&slug) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };

    // Expiry is re-checked on submit; a correct password cannot reopen an
    // expired link.
    if share::evaluate_for(&ticket, Utc::now(), false) == ShareAccess::Expired {
        return Html(ui::render_shared_expired(&ticket)).into_response();
    }

    let verified = ticket
        .share_password_hash
        .as_deref()
        .map(|hash| share::verify_share_password(hash, &form.senha))
        .unwrap_or(false);

    if verified {
        let mut sessions = state.sessions.lock().await;
        sessions.unlock_ticket(session_id, ticket.id);
        Redirect::to(&ticket.share_path()).into_response()
    } else {
        Html(ui::render_shared_password(&ticket, Some("Senha incorreta."))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SharedCommentForm {
    pub texto: String,
    #[serde(default)]
    pub autor_nome: String,
}

pub async fn shared_comment_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(slug): Path<String>,
    Form(form): Form<SharedCommentForm>,
) -> impl IntoResponse {
    let session_id = ensure_session(&state, &cookies).await;
    let service = TicketService::new(state.conn.clone());
    let ticket = match service.find_by_slug(&slug) {
        Ok(ticket) => ticket,
        Err(_) => return not_found().into_response(),
    };

    let unlocked = {
        let sessions = state.sessions.lock().await;
        sessions.is_ticket_unlocked(session_id, ticket.id)
    };
    if share::evaluate_for(&ticket, Utc::now(), unlocked) != ShareAccess::Granted {
        return Redirect::to(&ticket.share_path()).into_response();
    }

    let body = form.texto.trim();
    if body.is_empty() {
        state
            .flash(session_id, FlashKind::Error, "Escreva um comentário.")
            .await;
    } else {
        let author = form.autor_nome.trim();
        let author = if author.is_empty() { "Visitante" } else { author };
        match service.add_comment(ticket.id, body, None, author) {
            Ok(_) => {
                state
                    .flash(session_id, FlashKind::Success, "Comentário adicionado!")
                    .await;
            }
            Err(e) => {
                error!("Shared comment insert failed: {e}");
                state
                    .flash(session_id, FlashKind::Error, "Erro ao adicionar comentário.")
                    .await;
            }
        }
    }
    Redirect::to(&ticket.share_path()).into_response()
}
