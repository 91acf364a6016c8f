//! Customer registry: individuals (CPF) and organizations (CNPJ).

pub mod ui;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::session::FlashKind;
use crate::shared::schema::{customers, tickets};
use crate::shared::state::AppState;
use crate::shared::utils::DbPool;
use crate::tickets::models::Ticket;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerKind {
    Individual,
    Company,
}

impl CustomerKind {
    pub const ALL: [CustomerKind; 2] = [CustomerKind::Individual, CustomerKind::Company];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerKind::Individual => "pf",
            CustomerKind::Company => "pj",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pf" => Some(CustomerKind::Individual),
            "pj" => Some(CustomerKind::Company),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CustomerKind::Individual => "Pessoa Física",
            CustomerKind::Company => "Pessoa Jurídica",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = customers)]
pub struct Customer {
    pub id: Uuid,
    pub kind: String,
    pub cpf: String,
    pub cnpj: String,
    pub name: String,
    pub trade_name: String,
    pub postal_code: String,
    pub state: String,
    pub city: String,
    pub district: String,
    pub street: String,
    pub number: String,
    pub complement: String,
    pub phone: String,
    pub email: String,
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn kind(&self) -> CustomerKind {
        CustomerKind::parse(&self.kind).unwrap_or(CustomerKind::Individual)
    }

    /// The tax id matching the declared kind.
    pub fn document(&self) -> &str {
        match self.kind() {
            CustomerKind::Company => &self.cnpj,
            CustomerKind::Individual => &self.cpf,
        }
    }

    pub fn full_address(&self) -> String {
        let city_state = if !self.city.is_empty() && !self.state.is_empty() {
            format!("{}/{}", self.city, self.state)
        } else {
            String::new()
        };
        let postal = if self.postal_code.is_empty() {
            String::new()
        } else {
            format!("CEP: {}", self.postal_code)
        };
        [
            self.street.as_str(),
            self.number.as_str(),
            self.complement.as_str(),
            self.district.as_str(),
            city_state.as_str(),
            postal.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerForm {
    pub tipo_pessoa: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub cnpj: String,
    pub nome: String,
    #[serde(default)]
    pub nome_fantasia: String,
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub cidade: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub logradouro: String,
    #[serde(default)]
    pub numero: String,
    #[serde(default)]
    pub complemento: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub email: String,
}

pub type FieldErrors = Vec<(&'static str, String)>;

impl CustomerForm {
    /// Tax-id rules: at least one of CPF/CNPJ, and the one matching the
    /// declared kind is mandatory.
    pub fn validate(&self) -> Result<CustomerKind, FieldErrors> {
        let mut errors: FieldErrors = Vec::new();

        let kind = match CustomerKind::parse(self.tipo_pessoa.trim()) {
            Some(kind) => Some(kind),
            None => {
                errors.push(("tipo_pessoa", "Tipo de pessoa inválido.".to_string()));
                None
            }
        };

        if self.nome.trim().is_empty() {
            errors.push(("nome", "Informe o nome ou razão social.".to_string()));
        }

        let cpf = self.cpf.trim();
        let cnpj = self.cnpj.trim();
        if cpf.is_empty() && cnpj.is_empty() {
            errors.push(("__all__", "Informe pelo menos CPF ou CNPJ.".to_string()));
        }
        match kind {
            Some(CustomerKind::Individual) if cpf.is_empty() => {
                errors.push(("cpf", "CPF é obrigatório para Pessoa Física.".to_string()));
            }
            Some(CustomerKind::Company) if cnpj.is_empty() => {
                errors.push(("cnpj", "CNPJ é obrigatório para Pessoa Jurídica.".to_string()));
            }
            _ => {}
        }

        match kind {
            Some(kind) if errors.is_empty() => Ok(kind),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub q: Option<String>,
    pub tipo: Option<String>,
}

// ===== Service =====

pub struct CustomerService {
    pub db: DbPool,
}

impl CustomerService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    fn get_conn(
        &self,
    ) -> Result<
        diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<diesel::PgConnection>>,
        diesel::result::Error,
    > {
        self.db.get().map_err(|e| {
            error!("DB connection error: {e}");
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::Unknown,
                Box::new(e.to_string()),
            )
        })
    }

    /// Active customers only, free text across names, tax ids and contact
    /// fields, optional kind filter.
    pub fn search(
        &self,
        q: &str,
        kind: Option<CustomerKind>,
    ) -> Result<Vec<Customer>, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        let mut query = customers::table
            .filter(customers::is_active.eq(true))
            .into_boxed();

        let q = q.trim();
        if !q.is_empty() {
            let pattern = format!("%{q}%");
            query = query.filter(
                customers::name
                    .ilike(pattern.clone())
                    .or(customers::trade_name.ilike(pattern.clone()))
                    .or(customers::cpf.ilike(pattern.clone()))
                    .or(customers::cnpj.ilike(pattern.clone()))
                    .or(customers::email.ilike(pattern.clone()))
                    .or(customers::phone.ilike(pattern)),
            );
        }
        if let Some(kind) = kind {
            query = query.filter(customers::kind.eq(kind.as_str()));
        }

        query.order(customers::name.asc()).load(&mut conn)
    }

    /// (active, individuals, companies) for the list header.
    pub fn counts(&self) -> Result<(i64, i64, i64), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        let active = customers::table
            .filter(customers::is_active.eq(true))
            .count()
            .get_result(&mut conn)?;
        let individuals = customers::table
            .filter(customers::is_active.eq(true))
            .filter(customers::kind.eq(CustomerKind::Individual.as_str()))
            .count()
            .get_result(&mut conn)?;
        let companies = customers::table
            .filter(customers::is_active.eq(true))
            .filter(customers::kind.eq(CustomerKind::Company.as_str()))
            .count()
            .get_result(&mut conn)?;
        Ok((active, individuals, companies))
    }

    pub fn find(&self, id: Uuid) -> Result<Customer, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        customers::table.find(id).first(&mut conn)
    }

    /// Active customers for the ticket form select box.
    pub fn list_active(&self) -> Result<Vec<Customer>, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        customers::table
            .filter(customers::is_active.eq(true))
            .order(customers::name.asc())
            .load(&mut conn)
    }

    pub fn create(&self, customer: &Customer) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(customers::table)
            .values(customer)
            .execute(&mut conn)?;
        info!("Created customer {} ({})", customer.name, customer.id);
        Ok(())
    }

    pub fn update(&self, id: Uuid, form: &CustomerForm) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::update(customers::table.find(id))
            .set((
                customers::kind.eq(form.tipo_pessoa.trim()),
                customers::cpf.eq(form.cpf.trim()),
                customers::cnpj.eq(form.cnpj.trim()),
                customers::name.eq(form.nome.trim()),
                customers::trade_name.eq(form.nome_fantasia.trim()),
                customers::postal_code.eq(form.cep.trim()),
                customers::state.eq(form.estado.trim()),
                customers::city.eq(form.cidade.trim()),
                customers::district.eq(form.bairro.trim()),
                customers::street.eq(form.logradouro.trim()),
                customers::number.eq(form.numero.trim()),
                customers::complement.eq(form.complemento.trim()),
                customers::phone.eq(form.telefone.trim()),
                customers::email.eq(form.email.trim()),
                customers::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    /// Customers are never removed, only flagged inactive: tickets keep
    /// pointing at them.
    pub fn deactivate(&self, id: Uuid) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::update(customers::table.find(id))
            .set((
                customers::is_active.eq(false),
                customers::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        info!("Deactivated customer {id}");
        Ok(())
    }

    /// The customer's most recent tickets for the detail page.
    pub fn recent_tickets(
        &self,
        customer_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Ticket>, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        tickets::table
            .filter(tickets::customer_id.eq(customer_id))
            .order(tickets::created_at.desc())
            .limit(limit)
            .load(&mut conn)
    }
}

fn customer_from_form(form: &CustomerForm, created_by: Uuid) -> Customer {
    let now = Utc::now();
    Customer {
        id: Uuid::new_v4(),
        kind: form.tipo_pessoa.trim().to_string(),
        cpf: form.cpf.trim().to_string(),
        cnpj: form.cnpj.trim().to_string(),
        name: form.nome.trim().to_string(),
        trade_name: form.nome_fantasia.trim().to_string(),
        postal_code: form.cep.trim().to_string(),
        state: form.estado.trim().to_string(),
        city: form.cidade.trim().to_string(),
        district: form.bairro.trim().to_string(),
        street: form.logradouro.trim().to_string(),
        number: form.numero.trim().to_string(),
        complement: form.complemento.trim().to_string(),
        phone: form.telefone.trim().to_string(),
        email: form.email.trim().to_string(),
        created_by: Some(created_by),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

// ===== Handlers =====

pub async fn customer_list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<CustomerListQuery>,
) -> impl IntoResponse {
    let service = CustomerService::new(state.conn.clone());
    let q = query.q.unwrap_or_default();
    let kind_filter = query.tipo.as_deref().and_then(CustomerKind::parse);

    let customers = match service.search(&q, kind_filter) {
        Ok(customers) => customers,
        Err(e) => {
            error!("Customer search failed: {e}");
            Vec::new()
        }
    };
    let counts = service.counts().unwrap_or((0, 0, 0));
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_list(&customers, &q, kind_filter, counts, &flashes))
}

pub async fn customer_create_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> impl IntoResponse {
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_form(None, &CustomerForm::default(), &[], &flashes))
}

pub async fn customer_create_submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<CustomerForm>,
) -> impl IntoResponse {
    if let Err(errors) = form.validate() {
        return Html(ui::render_form(None, &form, &errors, &[])).into_response();
    }

    let service = CustomerService::new(state.conn.clone());
    let customer = customer_from_form(&form, user.id);
    if let Err(e) = service.create(&customer) {
        error!("Customer insert failed: {e}");
        return Html(ui::render_form(
            None,
            &form,
            &[("__all__", "Erro interno. Tente novamente.".to_string())],
            &[],
        ))
        .into_response();
    }

    state
        .flash(
            user.session_id,
            FlashKind::Success,
            format!("Cliente \"{}\" cadastrado com sucesso!", customer.name),
        )
        .await;
    Redirect::to(&format!("/clientes/{}", customer.id)).into_response()
}

pub async fn customer_detail(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let service = CustomerService::new(state.conn.clone());
    let customer = match service.find(id) {
        Ok(customer) => customer,
        Err(_) => return not_found().into_response(),
    };
    let tickets = service.recent_tickets(id, 10).unwrap_or_default();
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_detail(&customer, &tickets, &flashes)).into_response()
}

pub async fn customer_edit_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let service = CustomerService::new(state.conn.clone());
    let customer = match service.find(id) {
        Ok(customer) => customer,
        Err(_) => return not_found().into_response(),
    };
    let form = CustomerForm {
        tipo_pessoa: customer.kind.clone(),
        cpf: customer.cpf.clone(),
        cnpj: customer.cnpj.clone(),
        nome: customer.name.clone(),
        nome_fantasia: customer.trade_name.clone(),
        cep: customer.postal_code.clone(),
        estado: customer.state.clone(),
        cidade: customer.city.clone(),
        bairro: customer.district.clone(),
        logradouro: customer.street.clone(),
        numero: customer.number.clone(),
        complemento: customer.complement.clone(),
        telefone: customer.phone.clone(),
        email: customer.email.clone(),
    };
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_form(Some(&customer), &form, &[], &flashes)).into_response()
}

pub async fn customer_edit_submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<CustomerForm>,
) -> impl IntoResponse {
    let service = CustomerService::new(state.conn.clone());
    let customer = match service.find(id) {
        Ok(customer) => customer,
        Err(_) => return not_found().into_response(),
    };

    if let Err(errors) = form.validate() {
        return Html(ui::render_form(Some(&customer), &form, &errors, &[])).into_response();
    }
    if let Err(e) = service.update(id, &form) {
        error!("Customer update failed: {e}");
        return Html(ui::render_form(
            Some(&customer),
            &form,
            &[("__all__", "Erro interno. Tente novamente.".to_string())],
            &[],
        ))
        .into_response();
    }

    state
        .flash(user.session_id, FlashKind::Success, "Cliente atualizado com sucesso!")
        .await;
    Redirect::to(&format!("/clientes/{id}")).into_response()
}

pub async fn customer_delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let service = CustomerService::new(state.conn.clone());
    match service.deactivate(id) {
        Ok(()) => {
            state
                .flash(user.session_id, FlashKind::Success, "Cliente desativado com sucesso!")
                .await;
        }
        Err(e) => {
            error!("Customer deactivation failed: {e}");
            state
                .flash(user.session_id, FlashKind::Error, "Erro ao desativar cliente.")
                .await;
        }
    }
    Redirect::to("/clientes")
}

fn not_found() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::NOT_FOUND, "Não encontrado")
}

pub fn configure_customer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clientes", get(customer_list))
        .route(
            "/clientes/novo",
            get(customer_create_page).post(customer_create_submit),
        )
        .route("/clientes/:id", get(customer_detail))
        .route(
            "/clientes/:id/editar",
            get(customer_edit_page).post(customer_edit_submit),
        )
        .route("/clientes/:id/excluir", post(customer_delete))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> CustomerForm {
        CustomerForm {
            tipo_pessoa: "pf".into(),
            cpf: "123.456.789-00".into(),
            nome: "Maria Souza".into(),
            ..CustomerForm::default()
        }
    }

    #[test]
    fn individual_with_cpf_passes() {
        assert_eq!(base_form().validate().unwrap(), CustomerKind::Individual);
    }

    #[test]
    fn missing_both_tax_ids_is_a_form_level_error() {
        let mut form = base_form();
        form.cpf = String::new();
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|(f, _)| *f == "__all__"));
        assert!(errors.iter().any(|(f, _)| *f == "cpf"));
    }

    #[test]
    fn company_requires_cnpj_even_with_cpf_present() {
        let mut form = base_form();
        form.tipo_pessoa = "pj".into();
        let errors = form.validate().unwrap_err();
        assert!(errors.iter().any(|(f, _)| *f == "cnpj"));
        // The "at least one" rule is satisfied by the CPF, so no form-level
        // error here.
        assert!(!errors.iter().any(|(f, _)| *f == "__all__"));
    }

    #[test]
    fn company_with_cnpj_passes() {
        let mut form = base_form();
        form.tipo_pessoa = "pj".into();
        form.cpf = String::new();
        form.cnpj = "12.345.678/0001-90".into();
        assert_eq!(form.validate().unwrap(), CustomerKind::Company);
    }

    #[test]
    fn document_follows_declared_kind() {
        let now = Utc::now();
        let mut customer = Customer {
            id: Uuid::new_v4(),
            kind: "pf".into(),
            cpf: "111".into(),
            cnpj: "222".into(),
            name: "X".into(),
            trade_name: String::new(),
            postal_code: String::new(),
            state: String::new(),
            city: String::new(),
            district: String::new(),
            street: String::new(),
            number: String::new(),
            complement: String::new(),
            phone: String::new(),
            email: String::new(),
            created_by: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(customer.document(), "111");
        customer.kind = "pj".into();
        assert_eq!(customer.document(), "222");
    }

    #[test]
    fn full_address_skips_blank_parts() {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            kind: "pf".into(),
            cpf: "111".into(),
            cnpj: String::new(),
            name: "X".into(),
            trade_name: String::new(),
            postal_code: "01000-000".into(),
            state: "SP".into(),
            city: "São Paulo".into(),
            district: String::new(),
            street: "Rua A".into(),
            number: "10".into(),
            complement: String::new(),
            phone: String::new(),
            email: String::new(),
            created_by: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            customer.full_address(),
            "Rua A, 10, São Paulo/SP, CEP: 01000-000"
        );
    }
}
