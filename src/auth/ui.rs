//! HTML rendering for login, registration and user management.

use crate::session::Flash;
use crate::shared::utils::html_escape;
use crate::ui::{page, public_page, render_field_errors, render_form_errors};

use super::{RegisterForm, User, UserForm};

pub fn render_login(error: Option<&str>) -> String {
    let error_html = match error {
        Some(message) => format!(
            "<div class=\"alert alert-danger\">{}</div>",
            html_escape(message)
        ),
        None => String::new(),
    };
    let body = format!(
        "<div class=\"auth-card\">\
            <h1>Entrar</h1>\
            {}\
            <form method=\"post\" action=\"/accounts/login\">\
                <label for=\"id_username\">Usuário</label>\
                <input class=\"form-control\" type=\"text\" name=\"username\" id=\"id_username\" \
                    placeholder=\"Digite seu usuário\" autofocus required>\
                <label for=\"id_password\">Senha</label>\
                <input class=\"form-control\" type=\"password\" name=\"password\" id=\"id_password\" \
                    placeholder=\"Digite sua senha\" required>\
                <button type=\"submit\" class=\"btn btn-primary\">Entrar</button>\
            </form>\
            <p><a href=\"/accounts/registro\">Criar uma conta</a></p>\
        </div>",
        error_html
    );
    public_page("Entrar", &[], &body)
}

pub fn render_register(form: &RegisterForm, errors: &[(&'static str, String)]) -> String {
    let body = format!(
        "<div class=\"auth-card\">\
            <h1>Criar Conta</h1>\
            {}\
            <form method=\"post\" action=\"/accounts/registro\">\
                <label for=\"id_username\">Usuário</label>\
                <input class=\"form-control\" type=\"text\" name=\"username\" id=\"id_username\" \
                    value=\"{}\" placeholder=\"Escolha um nome de usuário\" required>\
                {}\
                <label for=\"id_email\">E-mail</label>\
                <input class=\"form-control\" type=\"email\" name=\"email\" id=\"id_email\" \
                    value=\"{}\" placeholder=\"seu@email.com\" required>\
                {}\
                <label for=\"id_password1\">Senha</label>\
                <input class=\"form-control\" type=\"password\" name=\"password1\" id=\"id_password1\" \
                    placeholder=\"Digite uma senha\" required>\
                {}\
                <label for=\"id_password2\">Confirme a senha</label>\
                <input class=\"form-control\" type=\"password\" name=\"password2\" id=\"id_password2\" \
                    placeholder=\"Confirme a senha\" required>\
                {}\
                <button type=\"submit\" class=\"btn btn-primary\">Registrar</button>\
            </form>\
            <p><a href=\"/accounts/login\">Já tenho uma conta</a></p>\
        </div>",
        render_form_errors(errors),
        html_escape(&form.username),
        render_field_errors(errors, "username"),
        html_escape(&form.email),
        render_field_errors(errors, "email"),
        render_field_errors(errors, "password1"),
        render_field_errors(errors, "password2"),
    );
    public_page("Criar Conta", &[], &body)
}

pub fn render_change_password(flashes: &[Flash], errors: &[(&'static str, String)]) -> String {
    let body = format!(
        "<h1>Mudar Senha</h1>\
        {}\
        <form method=\"post\" action=\"/accounts/mudar-senha\" class=\"form-card\">\
            <label for=\"id_old_password\">Senha atual</label>\
            <input class=\"form-control\" type=\"password\" name=\"old_password\" \
                id=\"id_old_password\" required>\
            {}\
            <label for=\"id_new_password1\">Nova senha</label>\
            <input class=\"form-control\" type=\"password\" name=\"new_password1\" \
                id=\"id_new_password1\" required>\
            {}\
            <label for=\"id_new_password2\">Confirme a nova senha</label>\
            <input class=\"form-control\" type=\"password\" name=\"new_password2\" \
                id=\"id_new_password2\" required>\
            {}\
            <button type=\"submit\" class=\"btn btn-primary\">Alterar</button>\
        </form>",
        render_form_errors(errors),
        render_field_errors(errors, "old_password"),
        render_field_errors(errors, "new_password1"),
        render_field_errors(errors, "new_password2"),
    );
    page("Mudar Senha", flashes, &body)
}

fn render_user_row(user: &User) -> String {
    let status = if user.is_active {
        "<span class=\"badge badge-success\">Ativo</span>"
    } else {
        "<span class=\"badge badge-secondary\">Inativo</span>"
    };
    let staff = if user.is_staff {
        "<span class=\"badge badge-info\">Staff</span>"
    } else {
        ""
    };
    format!(
        "<tr>\
            <td><a href=\"/accounts/usuarios/{}/editar\">{}</a></td>\
            <td>{}</td>\
            <td>{}</td>\
            <td>{} {}</td>\
            <td>{}</td>\
            <td>\
                <form method=\"post\" action=\"/accounts/usuarios/{}/deletar\" class=\"inline\" \
                    onsubmit=\"return confirm('Excluir este usuário?');\">\
                    <button type=\"submit\" class=\"btn btn-sm btn-danger\">Excluir</button>\
                </form>\
            </td>\
        </tr>",
        user.id,
        html_escape(&user.username),
        html_escape(&user.display_name()),
        html_escape(&user.email),
        status,
        staff,
        user.date_joined.format("%d/%m/%Y"),
        user.id,
    )
}

pub fn render_user_list(
    users: &[User],
    query: &str,
    counts: (i64, i64, i64),
    flashes: &[Flash],
) -> String {
    let (total, active, staff) = counts;
    let rows: String = users.iter().map(render_user_row).collect();
    let table = if users.is_empty() {
        crate::ui::render_empty_state("Nenhum usuário encontrado", "Ajuste a busca ou crie um novo usuário.")
    } else {
        format!(
            "<table class=\"table\">\
                <thead><tr>\
                    <th>Usuário</th><th>Nome</th><th>E-mail</th><th>Status</th>\
                    <th>Cadastro</th><th></th>\
                </tr></thead>\
                <tbody>{}</tbody>\
            </table>",
            rows
        )
    };
    let body = format!(
        "<h1>Usuários</h1>\
        <p class=\"stats\">{} usuários &middot; {} ativos &middot; {} staff</p>\
        <form method=\"get\" action=\"/accounts/usuarios\" class=\"search-bar\">\
            <input class=\"form-control\" type=\"text\" name=\"q\" value=\"{}\" \
                placeholder=\"Buscar por usuário, nome ou e-mail\">\
            <button type=\"submit\" class=\"btn\">Buscar</button>\
            <a class=\"btn btn-primary\" href=\"/accounts/usuarios/criar\">Novo Usuário</a>\
        </form>\
        {}",
        total,
        active,
        staff,
        html_escape(query),
        table
    );
    page("Usuários", flashes, &body)
}

pub fn render_user_form(
    target: Option<&User>,
    form: &UserForm,
    errors: &[(&'static str, String)],
    flashes: &[Flash],
) -> String {
    let (title, action) = match target {
        Some(user) => (
            "Editar Usuário",
            format!("/accounts/usuarios/{}/editar", user.id),
        ),
        None => ("Novo Usuário", "/accounts/usuarios/criar".to_string()),
    };
    let password_placeholder = if target.is_some() {
        "Deixe em branco para manter a atual"
    } else {
        "Digite uma senha"
    };
    let active_checked = if form.is_active.is_some() { " checked" } else { "" };
    let staff_checked = if form.is_staff.is_some() { " checked" } else { "" };

    let body = format!(
        "<h1>{}</h1>\
        {}\
        <form method=\"post\" action=\"{}\" class=\"form-card\">\
            <label for=\"id_username\">Usuário</label>\
            <input class=\"form-control\" type=\"text\" name=\"username\" id=\"id_username\" \
                value=\"{}\" placeholder=\"Nome de usuário\" required>\
            {}\
            <label for=\"id_first_name\">Nome</label>\
            <input class=\"form-control\" type=\"text\" name=\"first_name\" id=\"id_first_name\" \
                value=\"{}\" placeholder=\"Nome\">\
            <label for=\"id_last_name\">Sobrenome</label>\
            <input class=\"form-control\" type=\"text\" name=\"last_name\" id=\"id_last_name\" \
                value=\"{}\" placeholder=\"Sobrenome\">\
            <label for=\"id_email\">E-mail</label>\
            <input class=\"form-control\" type=\"email\" name=\"email\" id=\"id_email\" \
                value=\"{}\" placeholder=\"email@exemplo.com\">\
            <label class=\"check\">\
                <input type=\"checkbox\" name=\"is_active\"{}> Ativo\
            </label>\
            <label class=\"check\">\
                <input type=\"checkbox\" name=\"is_staff\"{}> Staff\
            </label>\
            <label for=\"id_password1\">Senha</label>\
            <input class=\"form-control\" type=\"password\" name=\"password1\" id=\"id_password1\" \
                placeholder=\"{}\">\
            {}\
            <label for=\"id_password2\">Confirmar senha</label>\
            <input class=\"form-control\" type=\"password\" name=\"password2\" id=\"id_password2\" \
                placeholder=\"Repita a senha\">\
            {}\
            <button type=\"submit\" class=\"btn btn-primary\">Salvar</button>\
            <a class=\"btn\" href=\"/accounts/usuarios\">Cancelar</a>\
        </form>",
        title,
        render_form_errors(errors),
        action,
        html_escape(&form.username),
        render_field_errors(errors, "username"),
        html_escape(&form.first_name),
        html_escape(&form.last_name),
        html_escape(&form.email),
        active_checked,
        staff_checked,
        password_placeholder,
        render_field_errors(errors, "password1"),
        render_field_errors(errors, "password2"),
    );
    page(title, flashes, &body)
}
