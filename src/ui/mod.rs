//! Shared HTML chrome for the server-rendered pages.

use crate::session::{Flash, FlashKind};
use crate::shared::utils::html_escape;

/// Wraps page content in the common layout with navigation and flashes.
pub fn page(title: &str, flashes: &[Flash], body: &str) -> String {
    format!(
        "<!DOCTYPE html>\
        <html lang=\"pt-br\">\
        <head>\
            <meta charset=\"utf-8\">\
            <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
            <title>{} — Vision Hub</title>\
            <link rel=\"stylesheet\" href=\"/static/app.css\">\
        </head>\
        <body>\
            <nav class=\"navbar\">\
                <a class=\"brand\" href=\"/\">Vision Hub</a>\
                <a href=\"/chamados\">Chamados</a>\
                <a href=\"/clientes\">Clientes</a>\
                <a href=\"/accounts/usuarios\">Usuários</a>\
                <form method=\"post\" action=\"/accounts/logout\" class=\"inline\">\
                    <button type=\"submit\" class=\"link\">Sair</button>\
                </form>\
            </nav>\
            <main class=\"container\">{}{}</main>\
        </body>\
        </html>",
        html_escape(title),
        render_flashes(flashes),
        body
    )
}

/// Layout without the authenticated navigation, for login and shared pages.
pub fn public_page(title: &str, flashes: &[Flash], body: &str) -> String {
    format!(
        "<!DOCTYPE html>\
        <html lang=\"pt-br\">\
        <head>\
            <meta charset=\"utf-8\">\
            <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
            <title>{} — Vision Hub</title>\
            <link rel=\"stylesheet\" href=\"/static/app.css\">\
        </head>\
        <body>\
            <main class=\"container\">{}{}</main>\
        </body>\
        </html>",
        html_escape(title),
        render_flashes(flashes),
        body
    )
}

pub fn render_flashes(flashes: &[Flash]) -> String {
    let mut out = String::new();
    for flash in flashes {
        let class = match flash.kind {
            FlashKind::Success => "alert alert-success",
            FlashKind::Error => "alert alert-danger",
        };
        out.push_str(&format!(
            "<div class=\"{}\">{}</div>",
            class,
            html_escape(&flash.message)
        ));
    }
    out
}

pub fn render_field_errors(errors: &[(&'static str, String)], field: &str) -> String {
    let mut out = String::new();
    for (name, message) in errors {
        if *name == field {
            out.push_str(&format!(
                "<div class=\"field-error\">{}</div>",
                html_escape(message)
            ));
        }
    }
    out
}

pub fn render_form_errors(errors: &[(&'static str, String)]) -> String {
    let mut out = String::new();
    for (name, message) in errors {
        if *name == "__all__" {
            out.push_str(&format!(
                "<div class=\"alert alert-danger\">{}</div>",
                html_escape(message)
            ));
        }
    }
    out
}

pub fn render_empty_state(title: &str, description: &str) -> String {
    format!(
        "<div class=\"empty-state\">\
            <h3>{}</h3>\
            <p>{}</p>\
        </div>",
        html_escape(title),
        html_escape(description)
    )
}
