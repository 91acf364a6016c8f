//! HTML rendering for the customer pages.

use crate::session::Flash;
use crate::shared::utils::html_escape;
use crate::tickets::models::Ticket;
use crate::ui::{page, render_empty_state, render_field_errors, render_form_errors};

use super::{Customer, CustomerForm, CustomerKind};

fn kind_badge(kind: CustomerKind) -> &'static str {
    match kind {
        CustomerKind::Individual => "<span class=\"badge badge-info\">Pessoa Física</span>",
        CustomerKind::Company => "<span class=\"badge badge-primary\">Pessoa Jurídica</span>",
    }
}

fn render_row(customer: &Customer) -> String {
    format!(
        "<tr>\
            <td><a href=\"/clientes/{}\">{}</a></td>\
            <td>{}</td>\
            <td>{}</td>\
            <td>{}</td>\
            <td>{}</td>\
            <td>\
                <a class=\"btn btn-sm\" href=\"/clientes/{}/editar\">Editar</a>\
                <form method=\"post\" action=\"/clientes/{}/excluir\" class=\"inline\" \
                    onsubmit=\"return confirm('Desativar este cliente?');\">\
                    <button type=\"submit\" class=\"btn btn-sm btn-danger\">Desativar</button>\
                </form>\
            </td>\
        </tr>",
        customer.id,
        html_escape(&customer.name),
        kind_badge(customer.kind()),
        html_escape(customer.document()),
        html_escape(&customer.phone),
        html_escape(&customer.email),
        customer.id,
        customer.id,
    )
}

pub fn render_list(
    customers: &[Customer],
    query: &str,
    kind_filter: Option<CustomerKind>,
    counts: (i64, i64, i64),
    flashes: &[Flash],
) -> String {
    let (total, individuals, companies) = counts;

    let mut kind_options = String::from("<option value=\"\">Todos os tipos</option>");
    for kind in CustomerKind::ALL {
        let selected = if kind_filter == Some(kind) { " selected" } else { "" };
        kind_options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            kind.as_str(),
            selected,
            kind.label()
        ));
    }

    let table = if customers.is_empty() {
        render_empty_state(
            "Nenhum cliente encontrado",
            "Ajuste a busca ou cadastre um novo cliente.",
        )
    } else {
        let rows: String = customers.iter().map(render_row).collect();
        format!(
            "<table class=\"table\">\
                <thead><tr>\
                    <th>Nome</th><th>Tipo</th><th>Documento</th><th>Telefone</th>\
                    <th>E-mail</th><th></th>\
                </tr></thead>\
                <tbody>{}</tbody>\
            </table>",
            rows
        )
    };

    let body = format!(
        "<h1>Clientes</h1>\
        <p class=\"stats\">{} ativos &middot; {} PF &middot; {} PJ</p>\
        <form method=\"get\" action=\"/clientes\" class=\"search-bar\">\
            <input class=\"form-control\" type=\"text\" name=\"q\" value=\"{}\" \
                placeholder=\"Buscar por nome, documento ou contato\">\
            <select class=\"form-select\" name=\"tipo\">{}</select>\
            <button type=\"submit\" class=\"btn\">Buscar</button>\
            <a class=\"btn btn-primary\" href=\"/clientes/novo\">Novo Cliente</a>\
        </form>\
        {}",
        total,
        individuals,
        companies,
        html_escape(query),
        kind_options,
        table
    );
    page("Clientes", flashes, &body)
}

pub fn render_detail(customer: &Customer, tickets: &[Ticket], flashes: &[Flash]) -> String {
    let ticket_rows: String = tickets
        .iter()
        .map(|ticket| {
            format!(
                "<tr>\
                    <td><a href=\"/chamados/{}\">{}</a></td>\
                    <td><span class=\"badge\" style=\"background:{}\">{}</span></td>\
                    <td><span class=\"badge\" style=\"background:{}\">{}</span></td>\
                    <td>{}</td>\
                </tr>",
                ticket.id,
                html_escape(&ticket.title),
                ticket.status().color(),
                ticket.status().label(),
                ticket.priority().color(),
                ticket.priority().label(),
                ticket.created_at.format("%d/%m/%Y %H:%M"),
            )
        })
        .collect();
    let tickets_html = if tickets.is_empty() {
        render_empty_state("Nenhum chamado", "Este cliente ainda não possui chamados.")
    } else {
        format!(
            "<table class=\"table\">\
                <thead><tr><th>Título</th><th>Status</th><th>Prioridade</th><th>Criado em</th></tr></thead>\
                <tbody>{}</tbody>\
            </table>",
            ticket_rows
        )
    };

    let trade_name = if customer.trade_name.is_empty() {
        String::new()
    } else {
        format!("<p class=\"muted\">{}</p>", html_escape(&customer.trade_name))
    };

    let body = format!(
        "<h1>{}</h1>\
        {}\
        <p>{} &middot; {}</p>\
        <dl class=\"detail-grid\">\
            <dt>Endereço</dt><dd>{}</dd>\
            <dt>Telefone</dt><dd>{}</dd>\
            <dt>E-mail</dt><dd>{}</dd>\
            <dt>Cadastrado em</dt><dd>{}</dd>\
        </dl>\
        <p>\
            <a class=\"btn\" href=\"/clientes/{}/editar\">Editar</a>\
            <a class=\"btn\" href=\"/clientes\">Voltar</a>\
        </p>\
        <h2>Chamados recentes</h2>\
        {}",
        html_escape(&customer.name),
        trade_name,
        kind_badge(customer.kind()),
        html_escape(customer.document()),
        html_escape(&customer.full_address()),
        html_escape(&customer.phone),
        html_escape(&customer.email),
        customer.created_at.format("%d/%m/%Y"),
        customer.id,
        tickets_html
    );
    page(&customer.name, flashes, &body)
}

pub fn render_form(
    target: Option<&Customer>,
    form: &CustomerForm,
    errors: &[(&'static str, String)],
    flashes: &[Flash],
) -> String {
    let (title, action) = match target {
        Some(customer) => ("Editar Cliente", format!("/clientes/{}/editar", customer.id)),
        None => ("Novo Cliente", "/clientes/novo".to_string()),
    };

    let mut kind_options = String::new();
    for kind in CustomerKind::ALL {
        let selected = if form.tipo_pessoa == kind.as_str() { " selected" } else { "" };
        kind_options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            kind.as_str(),
            selected,
            kind.label()
        ));
    }

    let body = format!(
        "<h1>{}</h1>\
        {}\
        <form method=\"post\" action=\"{}\" class=\"form-card\">\
            <label for=\"id_tipo_pessoa\">Tipo de Pessoa</label>\
            <select class=\"form-select\" name=\"tipo_pessoa\" id=\"id_tipo_pessoa\">{}</select>\
            {}\
            <label for=\"id_cpf\">CPF</label>\
            <input class=\"form-control\" type=\"text\" name=\"cpf\" id=\"id_cpf\" value=\"{}\" \
                placeholder=\"000.000.000-00\" maxlength=\"14\">\
            {}\
            <label for=\"id_cnpj\">CNPJ</label>\
            <input class=\"form-control\" type=\"text\" name=\"cnpj\" id=\"id_cnpj\" value=\"{}\" \
                placeholder=\"00.000.000/0000-00\" maxlength=\"18\">\
            {}\
            <label for=\"id_nome\">Nome / Razão Social</label>\
            <input class=\"form-control\" type=\"text\" name=\"nome\" id=\"id_nome\" value=\"{}\" \
                placeholder=\"Nome completo ou Razão Social\" required>\
            {}\
            <label for=\"id_nome_fantasia\">Nome Fantasia</label>\
            <input class=\"form-control\" type=\"text\" name=\"nome_fantasia\" id=\"id_nome_fantasia\" \
                value=\"{}\" placeholder=\"Nome Fantasia (opcional)\">\
            <label for=\"id_cep\">CEP</label>\
            <input class=\"form-control\" type=\"text\" name=\"cep\" id=\"id_cep\" value=\"{}\" \
                placeholder=\"00000-000\" maxlength=\"9\">\
            <label for=\"id_estado\">Estado</label>\
            <input class=\"form-control\" type=\"text\" name=\"estado\" id=\"id_estado\" value=\"{}\" \
                maxlength=\"2\">\
            <label for=\"id_cidade\">Cidade</label>\
            <input class=\"form-control\" type=\"text\" name=\"cidade\" id=\"id_cidade\" value=\"{}\">\
            <label for=\"id_bairro\">Bairro</label>\
            <input class=\"form-control\" type=\"text\" name=\"bairro\" id=\"id_bairro\" value=\"{}\">\
            <label for=\"id_logradouro\">Logradouro</label>\
            <input class=\"form-control\" type=\"text\" name=\"logradouro\" id=\"id_logradouro\" \
                value=\"{}\">\
            <label for=\"id_numero\">Número</label>\
            <input class=\"form-control\" type=\"text\" name=\"numero\" id=\"id_numero\" value=\"{}\" \
                placeholder=\"Nº\">\
            <label for=\"id_complemento\">Complemento</label>\
            <input class=\"form-control\" type=\"text\" name=\"complemento\" id=\"id_complemento\" \
                value=\"{}\" placeholder=\"Bloco, Apto, sala...\">\
            <label for=\"id_telefone\">Telefone</label>\
            <input class=\"form-control\" type=\"text\" name=\"telefone\" id=\"id_telefone\" \
                value=\"{}\" placeholder=\"(00) 00000-0000\">\
            <label for=\"id_email\">E-mail</label>\
            <input class=\"form-control\" type=\"email\" name=\"email\" id=\"id_email\" value=\"{}\" \
                placeholder=\"email@exemplo.com\">\
            <button type=\"submit\" class=\"btn btn-primary\">Salvar</button>\
            <a class=\"btn\" href=\"/clientes\">Cancelar</a>\
        </form>",
        title,
        render_form_errors(errors),
        action,
        kind_options,
        render_field_errors(errors, "tipo_pessoa"),
        html_escape(&form.cpf),
        render_field_errors(errors, "cpf"),
        html_escape(&form.cnpj),
        render_field_errors(errors, "cnpj"),
        html_escape(&form.nome),
        render_field_errors(errors, "nome"),
        html_escape(&form.nome_fantasia),
        html_escape(&form.cep),
        html_escape(&form.estado),
        html_escape(&form.cidade),
        html_escape(&form.bairro),
        html_escape(&form.logradouro),
        html_escape(&form.numero),
        html_escape(&form.complemento),
        html_escape(&form.telefone),
        html_escape(&form.email),
    );
    page(title, flashes, &body)
}
