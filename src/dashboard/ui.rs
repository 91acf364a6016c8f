use crate::auth::CurrentUser;
use crate::session::Flash;
use crate::shared::utils::html_escape;
use crate::tickets::ui::{priority_badge, status_badge};
use crate::ui::{page, render_empty_state};

use super::{format_bytes, DashboardMetrics};

pub fn render_index(user: &CurrentUser, metrics: &DashboardMetrics, flashes: &[Flash]) -> String {
    let status_cards: String = metrics
        .by_status
        .iter()
        .map(|(status, count)| {
            format!(
                "<div class=\"stat-card\" style=\"border-color:{}\">\
                    <span class=\"stat-value\">{}</span>\
                    <span class=\"stat-label\">{}</span>\
                </div>",
                status.color(),
                count,
                status.label()
            )
        })
        .collect();

    let priority_rows: String = metrics
        .by_priority
        .iter()
        .map(|(priority, count)| {
            format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                priority_badge(*priority),
                count
            )
        })
        .collect();

    let recent = if metrics.recent_tickets.is_empty() {
        render_empty_state("Nenhum chamado", "Abra o primeiro chamado para começar.")
    } else {
        let rows: String = metrics
            .recent_tickets
            .iter()
            .map(|(ticket, customer_name)| {
                format!(
                    "<tr>\
                        <td><a href=\"/chamados/{}\">{}</a></td>\
                        <td>{}</td>\
                        <td>{}</td>\
                        <td>{}</td>\
                    </tr>",
                    ticket.id,
                    html_escape(&ticket.title),
                    html_escape(customer_name),
                    status_badge(ticket.status()),
                    ticket.created_at.format("%d/%m/%Y %H:%M"),
                )
            })
            .collect();
        format!(
            "<table class=\"table\">\
                <thead><tr><th>Título</th><th>Cliente</th><th>Status</th><th>Criado em</th></tr></thead>\
                <tbody>{}</tbody>\
            </table>",
            rows
        )
    };

    let body = format!(
        "<h1>Olá, {}</h1>\
        <p class=\"stats\">{} chamados &middot; {} vídeos &middot; {} em armazenamento</p>\
        <div class=\"stat-grid\">{}</div>\
        <h2>Por prioridade</h2>\
        <table class=\"table table-compact\"><tbody>{}</tbody></table>\
        <h2>Chamados recentes</h2>\
        {}\
        <p><a class=\"btn btn-primary\" href=\"/chamados/novo\">Novo Chamado</a></p>",
        html_escape(&user.display_name),
        metrics.total_tickets,
        metrics.total_videos,
        format_bytes(metrics.bytes_used),
        status_cards,
        priority_rows,
        recent,
    );
    page("Painel", flashes, &body)
}
