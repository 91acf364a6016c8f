//! HTML rendering for ticket pages, including the public share views.

use crate::customers::Customer;
use crate::dashboard::format_bytes;
use crate::session::Flash;
use crate::shared::utils::html_escape;
use crate::ui::{page, public_page, render_empty_state, render_field_errors, render_form_errors};

use super::models::{
    ShareMode, Ticket, TicketComment, TicketPriority, TicketSearch, TicketStatus, TicketVideo,
};
use super::service::TicketForm;

pub fn status_badge(status: TicketStatus) -> String {
    format!(
        "<span class=\"badge\" style=\"background:{}\">{}</span>",
        status.color(),
        status.label()
    )
}

pub fn priority_badge(priority: TicketPriority) -> String {
    format!(
        "<span class=\"badge\" style=\"background:{}\">{}</span>",
        priority.color(),
        priority.label()
    )
}

fn status_options(selected: Option<TicketStatus>, blank_label: &str) -> String {
    let mut options = format!("<option value=\"\">{blank_label}</option>");
    for status in TicketStatus::ALL {
        let marker = if selected == Some(status) { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            status.as_str(),
            marker,
            status.label()
        ));
    }
    options
}

fn priority_options(selected: Option<TicketPriority>, blank_label: &str) -> String {
    let mut options = format!("<option value=\"\">{blank_label}</option>");
    for priority in TicketPriority::ALL {
        let marker = if selected == Some(priority) { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            priority.as_str(),
            marker,
            priority.label()
        ));
    }
    options
}

fn render_row((ticket, customer_name): &(Ticket, String)) -> String {
    format!(
        "<tr>\
            <td><a href=\"/chamados/{}\">{}</a></td>\
            <td>{}</td>\
            <td>{}</td>\
            <td>{}</td>\
            <td>{}</td>\
            <td><a class=\"btn btn-sm\" href=\"/chamados/{}/editar\">Editar</a></td>\
        </tr>",
        ticket.id,
        html_escape(&ticket.title),
        html_escape(customer_name),
        status_badge(ticket.status()),
        priority_badge(ticket.priority()),
        ticket.created_at.format("%d/%m/%Y %H:%M"),
        ticket.id,
    )
}

pub fn render_list(
    tickets: &[(Ticket, String)],
    filters: &TicketSearch,
    flashes: &[Flash],
) -> String {
    let q = filters.q.as_deref().unwrap_or("");
    let status_filter = filters.status.as_deref().and_then(TicketStatus::parse);
    let priority_filter = filters.prioridade.as_deref().and_then(TicketPriority::parse);

    let table = if tickets.is_empty() {
        render_empty_state(
            "Nenhum chamado encontrado",
            "Ajuste os filtros ou abra um novo chamado.",
        )
    } else {
        let rows: String = tickets.iter().map(render_row).collect();
        format!(
            "<table class=\"table\">\
                <thead><tr>\
                    <th>Título</th><th>Cliente</th><th>Status</th>\
                    <th>Prioridade</th><th>Criado em</th><th></th>\
                </tr></thead>\
                <tbody>{}</tbody>\
            </table>",
            rows
        )
    };

    let body = format!(
        "<h1>Chamados</h1>\
        <form method=\"get\" action=\"/chamados\" class=\"search-bar\">\
            <input class=\"form-control\" type=\"text\" name=\"q\" value=\"{}\" \
                placeholder=\"Buscar por título, cliente ou código\">\
            <select class=\"form-select\" name=\"status\">{}</select>\
            <select class=\"form-select\" name=\"prioridade\">{}</select>\
            <button type=\"submit\" class=\"btn\">Buscar</button>\
            <a class=\"btn btn-primary\" href=\"/chamados/novo\">Novo Chamado</a>\
        </form>\
        {}",
        html_escape(q),
        status_options(status_filter, "Todos os status"),
        priority_options(priority_filter, "Todas as prioridades"),
        table
    );
    page("Chamados", flashes, &body)
}

pub fn render_form(
    target: Option<&Ticket>,
    customers: &[Customer],
    form: &TicketForm,
    errors: &[(&'static str, String)],
    flashes: &[Flash],
) -> String {
    let (title, action) = match target {
        Some(ticket) => ("Editar Chamado", format!("/chamados/{}/editar", ticket.id)),
        None => ("Novo Chamado", "/chamados/novo".to_string()),
    };

    let mut customer_options = String::from("<option value=\"\">Selecione um cliente</option>");
    for customer in customers {
        let id = customer.id.to_string();
        let selected = if form.cliente == id { " selected" } else { "" };
        customer_options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            id,
            selected,
            html_escape(&customer.name)
        ));
    }

    let mut share_options = String::new();
    for mode in ShareMode::ALL {
        let selected = if form.tipo_compartilhamento == mode.as_str() {
            " selected"
        } else {
            ""
        };
        share_options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            mode.as_str(),
            selected,
            mode.label()
        ));
    }

    let password_placeholder = if target.is_some() {
        "Deixe em branco para manter a senha atual"
    } else {
        "Senha para acesso ao link"
    };

    let body = format!(
        "<h1>{}</h1>\
        {}\
        <form method=\"post\" action=\"{}\" class=\"form-card\">\
            <label for=\"id_titulo\">Título</label>\
            <input class=\"form-control\" type=\"text\" name=\"titulo\" id=\"id_titulo\" \
                value=\"{}\" placeholder=\"Resumo do chamado\" required>\
            {}\
            <label for=\"id_descricao\">Descrição</label>\
            <textarea class=\"form-control\" name=\"descricao\" id=\"id_descricao\" rows=\"5\" \
                placeholder=\"Detalhe a ocorrência\">{}</textarea>\
            <label for=\"id_cliente\">Cliente</label>\
            <select class=\"form-select\" name=\"cliente\" id=\"id_cliente\" required>{}</select>\
            {}\
            <label for=\"id_status\">Status</label>\
            <select class=\"form-select\" name=\"status\" id=\"id_status\">{}</select>\
            {}\
            <label for=\"id_prioridade\">Prioridade</label>\
            <select class=\"form-select\" name=\"prioridade\" id=\"id_prioridade\">{}</select>\
            {}\
            <label for=\"id_tipo_compartilhamento\">Compartilhamento</label>\
            <select class=\"form-select\" name=\"tipo_compartilhamento\" \
                id=\"id_tipo_compartilhamento\">{}</select>\
            {}\
            <label for=\"id_senha_compartilhamento\">Senha do link</label>\
            <input class=\"form-control\" type=\"password\" name=\"senha_compartilhamento\" \
                id=\"id_senha_compartilhamento\" placeholder=\"{}\">\
            {}\
            <label for=\"id_expira_em\">Expira em</label>\
            <input class=\"form-control\" type=\"datetime-local\" name=\"expira_em\" \
                id=\"id_expira_em\" value=\"{}\">\
            {}\
            <button type=\"submit\" class=\"btn btn-primary\">Salvar</button>\
            <a class=\"btn\" href=\"/chamados\">Cancelar</a>\
        </form>",
        title,
        render_form_errors(errors),
        action,
        html_escape(&form.titulo),
        render_field_errors(errors, "titulo"),
        html_escape(&form.descricao),
        customer_options,
        render_field_errors(errors, "cliente"),
        status_options(TicketStatus::parse(&form.status), "Selecione"),
        render_field_errors(errors, "status"),
        priority_options(TicketPriority::parse(&form.prioridade), "Selecione"),
        render_field_errors(errors, "prioridade"),
        share_options,
        render_field_errors(errors, "tipo_compartilhamento"),
        password_placeholder,
        render_field_errors(errors, "senha_compartilhamento"),
        html_escape(&form.expira_em),
        render_field_errors(errors, "expira_em"),
    );
    page(title, flashes, &body)
}

fn render_video(video: &TicketVideo, deletable: bool) -> String {
    let description = if video.description.is_empty() {
        String::new()
    } else {
        format!("<p class=\"muted\">{}</p>", html_escape(&video.description))
    };
    let delete = if deletable {
        format!(
            "<form method=\"post\" action=\"/chamados/video/{}/excluir\" class=\"inline\" \
                onsubmit=\"return confirm('Excluir este vídeo?');\">\
                <button type=\"submit\" class=\"btn btn-sm btn-danger\">Excluir</button>\
            </form>",
            video.id
        )
    } else {
        String::new()
    };
    format!(
        "<div class=\"video-card\">\
            <video controls preload=\"metadata\" src=\"/media/{}\"></video>\
            <p>{} <span class=\"muted\">({})</span></p>\
            {}\
            {}\
        </div>",
        html_escape(&video.file_path),
        html_escape(&video.original_name),
        format_bytes(video.size_bytes),
        description,
        delete,
    )
}

fn render_videos(videos: &[TicketVideo], deletable: bool) -> String {
    if videos.is_empty() {
        return render_empty_state("Nenhum vídeo", "Este chamado ainda não possui vídeos.");
    }
    let cards: String = videos
        .iter()
        .map(|video| render_video(video, deletable))
        .collect();
    format!("<div class=\"video-grid\">{}</div>", cards)
}

fn render_comments(comments: &[TicketComment]) -> String {
    if comments.is_empty() {
        return render_empty_state("Nenhum comentário", "Seja o primeiro a comentar.");
    }
    comments
        .iter()
        .map(|comment| {
            format!(
                "<div class=\"comment\">\
                    <p class=\"comment-meta\"><strong>{}</strong> \
                        <span class=\"muted\">{}</span></p>\
                    <p>{}</p>\
                </div>",
                html_escape(&comment.author_name),
                comment.created_at.format("%d/%m/%Y %H:%M"),
                html_escape(&comment.body),
            )
        })
        .collect()
}

fn share_summary(ticket: &Ticket) -> String {
    let expiry = match (ticket.share_mode(), ticket.expires_at) {
        (ShareMode::TimeLimited, Some(expires_at)) => format!(
            "<p class=\"muted\">Expira em {}</p>",
            expires_at.format("%d/%m/%Y %H:%M")
        ),
        _ => String::new(),
    };
    format!(
        "<div class=\"share-box\">\
            <h2>Compartilhamento</h2>\
            <p>{}</p>\
            <input class=\"form-control\" type=\"text\" readonly value=\"{}\" \
                onclick=\"this.select()\">\
            {}\
        </div>",
        ticket.share_mode().label(),
        ticket.share_path(),
        expiry,
    )
}

pub fn render_detail(
    ticket: &Ticket,
    customer_name: &str,
    videos: &[TicketVideo],
    comments: &[TicketComment],
    flashes: &[Flash],
) -> String {
    let description = if ticket.description.is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>", html_escape(&ticket.description))
    };

    let body = format!(
        "<h1>{}</h1>\
        <p>{} {} <span class=\"muted\">Código: {}</span></p>\
        <p>Cliente: <a href=\"/clientes/{}\">{}</a> &middot; Criado em {}</p>\
        {}\
        <form method=\"post\" action=\"/chamados/{}/status\" class=\"inline-form\">\
            <select class=\"form-select\" name=\"status\">{}</select>\
            <button type=\"submit\" class=\"btn btn-sm\">Atualizar Status</button>\
        </form>\
        <p>\
            <a class=\"btn\" href=\"/chamados/{}/editar\">Editar</a>\
            <form method=\"post\" action=\"/chamados/{}/excluir\" class=\"inline\" \
                onsubmit=\"return confirm('Excluir este chamado e todos os vídeos?');\">\
                <button type=\"submit\" class=\"btn btn-danger\">Excluir</button>\
            </form>\
        </p>\
        {}\
        <h2>Vídeos</h2>\
        <p class=\"muted\">{} vídeo(s) &middot; {}</p>\
        {}\
        <form method=\"post\" action=\"/chamados/{}/upload\" enctype=\"multipart/form-data\" \
            class=\"form-card\">\
            <label for=\"id_arquivos\">Enviar vídeos</label>\
            <input class=\"form-control\" type=\"file\" name=\"arquivos\" id=\"id_arquivos\" \
                accept=\"video/*\" multiple required>\
            <label for=\"id_descricao_video\">Descrição</label>\
            <input class=\"form-control\" type=\"text\" name=\"descricao\" \
                id=\"id_descricao_video\" placeholder=\"Descrição (opcional)\">\
            <button type=\"submit\" class=\"btn btn-primary\">Enviar</button>\
        </form>\
        <h2>Comentários</h2>\
        {}\
        <form method=\"post\" action=\"/chamados/{}/comentario\" class=\"form-card\">\
            <textarea class=\"form-control\" name=\"texto\" rows=\"3\" \
                placeholder=\"Escreva um comentário\" required></textarea>\
            <button type=\"submit\" class=\"btn btn-primary\">Comentar</button>\
        </form>",
        html_escape(&ticket.title),
        status_badge(ticket.status()),
        priority_badge(ticket.priority()),
        html_escape(&ticket.slug),
        ticket.customer_id,
        html_escape(customer_name),
        ticket.created_at.format("%d/%m/%Y %H:%M"),
        description,
        ticket.id,
        status_options(Some(ticket.status()), "Selecione"),
        ticket.id,
        ticket.id,
        share_summary(ticket),
        videos.len(),
        format_bytes(videos.iter().map(|v| v.size_bytes).sum()),
        render_videos(videos, true),
        ticket.id,
        render_comments(comments),
        ticket.id,
    );
    page(&ticket.title, flashes, &body)
}

// ===== Public share views =====

pub fn render_shared(
    ticket: &Ticket,
    customer_name: &str,
    videos: &[TicketVideo],
    comments: &[TicketComment],
    flashes: &[Flash],
) -> String {
    let description = if ticket.description.is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>", html_escape(&ticket.description))
    };

    let body = format!(
        "<h1>{}</h1>\
        <p>{} {} <span class=\"muted\">Cliente: {}</span></p>\
        <p class=\"muted\">Aberto em {}</p>\
        {}\
        <h2>Vídeos</h2>\
        {}\
        <h2>Comentários</h2>\
        {}\
        <form method=\"post\" action=\"{}/comentario\" class=\"form-card\">\
            <label for=\"id_autor_nome\">Seu nome</label>\
            <input class=\"form-control\" type=\"text\" name=\"autor_nome\" id=\"id_autor_nome\" \
                placeholder=\"Visitante\">\
            <textarea class=\"form-control\" name=\"texto\" rows=\"3\" \
                placeholder=\"Escreva um comentário\" required></textarea>\
            <button type=\"submit\" class=\"btn btn-primary\">Comentar</button>\
        </form>",
        html_escape(&ticket.title),
        status_badge(ticket.status()),
        priority_badge(ticket.priority()),
        html_escape(customer_name),
        ticket.created_at.format("%d/%m/%Y %H:%M"),
        description,
        render_videos(videos, false),
        render_comments(comments),
        ticket.share_path(),
    );
    public_page(&ticket.title, flashes, &body)
}

pub fn render_shared_password(ticket: &Ticket, error: Option<&str>) -> String {
    let error_html = match error {
        Some(message) => format!(
            "<div class=\"alert alert-danger\">{}</div>",
            html_escape(message)
        ),
        None => String::new(),
    };
    let body = format!(
        "<div class=\"auth-card\">\
            <h1>Chamado Protegido</h1>\
            <p>Este chamado requer uma senha de acesso.</p>\
            {}\
            <form method=\"post\" action=\"{}\">\
                <label for=\"id_senha\">Senha</label>\
                <input class=\"form-control\" type=\"password\" name=\"senha\" id=\"id_senha\" \
                    placeholder=\"Digite a senha\" autofocus required>\
                <button type=\"submit\" class=\"btn btn-primary\">Acessar</button>\
            </form>\
        </div>",
        error_html,
        ticket.share_path(),
    );
    public_page("Chamado Protegido", &[], &body)
}

pub fn render_shared_expired(ticket: &Ticket) -> String {
    let body = format!(
        "<div class=\"auth-card\">\
            <h1>Link Expirado</h1>\
            <p>O link de acesso ao chamado \"{}\" expirou.</p>\
        </div>",
        html_escape(&ticket.title)
    );
    public_page("Link Expirado", &[], &body)
}
