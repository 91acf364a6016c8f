//! Session-cookie authentication and user management.

pub mod passwords;
pub mod ui;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::request::Parts,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_cookies::{Cookie, Cookies};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::session::{FlashKind, SESSION_COOKIE};
use crate::shared::schema::users;
use crate::shared::state::AppState;
use crate::shared::utils::DbPool;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

// ===== Forms =====

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserForm {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_active: Option<String>,
    #[serde(default)]
    pub is_staff: Option<String>,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

pub type FieldErrors = Vec<(&'static str, String)>;

impl UserForm {
    /// Password is mandatory on create; on edit a blank pair keeps the
    /// current one.
    pub fn validate(&self, creating: bool) -> Result<(), FieldErrors> {
        let mut errors: FieldErrors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(("username", "Informe o nome de usuário.".to_string()));
        }
        if creating && self.password1.is_empty() {
            errors.push(("password1", "Informe uma senha.".to_string()));
        }
        if (!self.password1.is_empty() || !self.password2.is_empty())
            && self.password1 != self.password2
        {
            errors.push(("password2", "As senhas não conferem.".to_string()));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors: FieldErrors = Vec::new();
        if self.username.trim().is_empty() {
            errors.push(("username", "Informe um nome de usuário.".to_string()));
        }
        if self.email.trim().is_empty() {
            errors.push(("email", "Informe um e-mail.".to_string()));
        }
        if self.password1.len() < 8 {
            errors.push((
                "password1",
                "A senha deve ter pelo menos 8 caracteres.".to_string(),
            ));
        }
        if self.password1 != self.password2 {
            errors.push(("password2", "As senhas não conferem.".to_string()));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ===== Service =====

pub struct UserService {
    pub db: DbPool,
}

impl UserService {
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

    pub fn find(&self, id: Uuid) -> Result<User, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        users::table.find(id).first(&mut conn)
    }

    pub fn find_active(&self, id: Uuid) -> Result<User, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        users::table
            .filter(users::id.eq(id))
            .filter(users::is_active.eq(true))
            .first(&mut conn)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        users::table
            .filter(users::username.eq(username))
            .first(&mut conn)
            .optional()
    }

    /// Newest accounts first; free-text matches username, names and e-mail.
    pub fn search(&self, q: &str) -> Result<Vec<User>, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        let mut query = users::table.into_boxed();
        let q = q.trim();
        if !q.is_empty() {
            let pattern = format!("%{q}%");
            query = query.filter(
                users::username
                    .ilike(pattern.clone())
                    .or(users::first_name.ilike(pattern.clone()))
                    .or(users::last_name.ilike(pattern.clone()))
                    .or(users::email.ilike(pattern)),
            );
        }
        query.order(users::date_joined.desc()).load(&mut conn)
    }

    /// (total, active, staff) for the user list header.
    pub fn counts(&self) -> Result<(i64, i64, i64), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        let total = users::table.count().get_result(&mut conn)?;
        let active = users::table
            .filter(users::is_active.eq(true))
            .count()
            .get_result(&mut conn)?;
        let staff = users::table
            .filter(users::is_staff.eq(true))
            .count()
            .get_result(&mut conn)?;
        Ok((total, active, staff))
    }

    pub fn create(&self, user: &User) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(users::table)
            .values(user)
            .execute(&mut conn)?;
        info!("Created user {}", user.username);
        Ok(())
    }

    pub fn update(
        &self,
        id: Uuid,
        form: &UserForm,
        password_hash: Option<String>,
    ) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::update(users::table.find(id))
            .set((
                users::username.eq(form.username.trim()),
                users::first_name.eq(form.first_name.trim()),
                users::last_name.eq(form.last_name.trim()),
                users::email.eq(form.email.trim()),
                users::is_active.eq(form.is_active.is_some()),
                users::is_staff.eq(form.is_staff.is_some()),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        if let Some(hash) = password_hash {
            diesel::update(users::table.find(id))
                .set(users::password_hash.eq(hash))
                .execute(&mut conn)?;
        }
        Ok(())
    }

    pub fn set_password(&self, id: Uuid, hash: &str) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::update(users::table.find(id))
            .set((
                users::password_hash.eq(hash),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn delete(&self, id: Uuid) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::delete(users::table.find(id)).execute(&mut conn)?;
        Ok(())
    }
}

// ===== Session plumbing =====

/// Reads the session cookie, resurrecting or creating the session as
/// needed, and keeps the cookie in sync.
pub async fn ensure_session(state: &Arc<AppState>, cookies: &Cookies) -> Uuid {
    let existing = cookies
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let mut sessions = state.sessions.lock().await;
    let session_id = sessions.get_or_create(existing);
    if existing != Some(session_id) {
        let mut cookie = Cookie::new(SESSION_COOKIE, session_id.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookies.add(cookie);
    }
    session_id
}

/// The logged-in principal, extracted from the session cookie. Rejection is
/// a redirect to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_staff: bool,
    pub session_id: Uuid,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        use axum::RequestPartsExt;

        let login = || Redirect::to("/accounts/login");

        let cookies = parts.extract::<Cookies>().await.map_err(|_| login())?;
        let session_id = cookies
            .get(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok())
            .ok_or_else(login)?;

        let user_id = {
            let sessions = state.sessions.lock().await;
            sessions.user_id(session_id)
        }
        .ok_or_else(login)?;

        let user = UserService::new(state.conn.clone())
            .find_active(user_id)
            .map_err(|_| login())?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name(),
            is_staff: user.is_staff,
            session_id,
        })
    }
}

// ===== Handlers =====

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> impl IntoResponse {
    let session_id = ensure_session(&state, &cookies).await;
    let logged_in = state.sessions.lock().await.user_id(session_id).is_some();
    if logged_in {
        return Redirect::to("/").into_response();
    }
    Html(ui::render_login(None)).into_response()
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    let session_id = ensure_session(&state, &cookies).await;

    let service = UserService::new(state.conn.clone());
    let user = match service.find_by_username(form.username.trim()) {
        Ok(Some(user)) if user.is_active => user,
        Ok(_) => {
            return Html(ui::render_login(Some("Usuário ou senha inválidos."))).into_response();
        }
        Err(e) => {
            error!("Login lookup failed: {e}");
            return Html(ui::render_login(Some("Erro interno. Tente novamente."))).into_response();
        }
    };

    if !passwords::verify_password(&user.password_hash, &form.password) {
        warn!("Failed login attempt for {}", user.username);
        return Html(ui::render_login(Some("Usuário ou senha inválidos."))).into_response();
    }

    state.sessions.lock().await.login(session_id, user.id);
    state
        .flash(
            session_id,
            FlashKind::Success,
            format!("Bem-vindo, {}!", user.username),
        )
        .await;
    Redirect::to("/").into_response()
}

pub async fn logout(State(state): State<Arc<AppState>>, cookies: Cookies) -> impl IntoResponse {
    if let Some(session_id) = cookies
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        state.sessions.lock().await.logout(session_id);
    }
    cookies.remove(Cookie::new(SESSION_COOKIE, ""));
    Redirect::to("/accounts/login")
}

pub async fn register_page(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> impl IntoResponse {
    let session_id = ensure_session(&state, &cookies).await;
    let logged_in = state.sessions.lock().await.user_id(session_id).is_some();
    if logged_in {
        return Redirect::to("/").into_response();
    }
    Html(ui::render_register(&RegisterForm::default(), &[])).into_response()
}

pub async fn register_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<RegisterForm>,
) -> impl IntoResponse {
    let session_id = ensure_session(&state, &cookies).await;
    let service = UserService::new(state.conn.clone());

    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };
    if errors.is_empty() {
        match service.find_by_username(form.username.trim()) {
            Ok(Some(_)) => {
                errors.push(("username", "Este nome de usuário já existe.".to_string()));
            }
            Ok(None) => {}
            Err(e) => {
                error!("Registration lookup failed: {e}");
                errors.push(("__all__", "Erro interno. Tente novamente.".to_string()));
            }
        }
    }
    if !errors.is_empty() {
        return Html(ui::render_register(&form, &errors)).into_response();
    }

    let hash = match passwords::hash_password(&form.password1) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {e}");
            return Html(ui::render_register(
                &form,
                &[("__all__", "Erro interno. Tente novamente.".to_string())],
            ))
            .into_response();
        }
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username: form.username.trim().to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: form.email.trim().to_string(),
        password_hash: hash,
        is_active: true,
        is_staff: false,
        date_joined: now,
        updated_at: now,
    };
    if let Err(e) = service.create(&user) {
        error!("Registration insert failed: {e}");
        return Html(ui::render_register(
            &form,
            &[("__all__", "Erro interno. Tente novamente.".to_string())],
        ))
        .into_response();
    }

    state.sessions.lock().await.login(session_id, user.id);
    state
        .flash(
            session_id,
            FlashKind::Success,
            format!("Bem-vindo, {}!", user.username),
        )
        .await;
    Redirect::to("/").into_response()
}

pub async fn change_password_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> impl IntoResponse {
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_change_password(&flashes, &[]))
}

pub async fn change_password_submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<ChangePasswordForm>,
) -> impl IntoResponse {
    let service = UserService::new(state.conn.clone());
    let stored = match service.find(user.id) {
        Ok(u) => u,
        Err(e) => {
            error!("Password change lookup failed: {e}");
            return Redirect::to("/").into_response();
        }
    };

    let mut errors: FieldErrors = Vec::new();
    if !passwords::verify_password(&stored.password_hash, &form.old_password) {
        errors.push(("old_password", "Senha atual incorreta.".to_string()));
    }
    if form.new_password1.len() < 8 {
        errors.push((
            "new_password1",
            "A senha deve ter pelo menos 8 caracteres.".to_string(),
        ));
    }
    if form.new_password1 != form.new_password2 {
        errors.push(("new_password2", "As senhas não conferem.".to_string()));
    }
    if !errors.is_empty() {
        return Html(ui::render_change_password(&[], &errors)).into_response();
    }

    match passwords::hash_password(&form.new_password1) {
        Ok(hash) => {
            if let Err(e) = service.set_password(user.id, &hash) {
                error!("Password update failed: {e}");
                return Redirect::to("/").into_response();
            }
        }
        Err(e) => {
            error!("Password hashing failed: {e}");
            return Redirect::to("/").into_response();
        }
    }

    state
        .flash(user.session_id, FlashKind::Success, "Senha alterada com sucesso!")
        .await;
    Redirect::to("/").into_response()
}

pub async fn user_list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<UserListQuery>,
) -> impl IntoResponse {
    let service = UserService::new(state.conn.clone());
    let q = query.q.unwrap_or_default();
    let users = match service.search(&q) {
        Ok(users) => users,
        Err(e) => {
            error!("User search failed: {e}");
            Vec::new()
        }
    };
    let counts = service.counts().unwrap_or((0, 0, 0));
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_user_list(&users, &q, counts, &flashes))
}

pub async fn user_create_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> impl IntoResponse {
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_user_form(None, &UserForm::default(), &[], &flashes))
}

pub async fn user_create_submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Form(form): Form<UserForm>,
) -> impl IntoResponse {
    let service = UserService::new(state.conn.clone());

    let mut errors = match form.validate(true) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };
    if errors.is_empty() {
        if let Ok(Some(_)) = service.find_by_username(form.username.trim()) {
            errors.push(("username", "Este nome de usuário já existe.".to_string()));
        }
    }
    if !errors.is_empty() {
        return Html(ui::render_user_form(None, &form, &errors, &[])).into_response();
    }

    let hash = match passwords::hash_password(&form.password1) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Password hashing failed: {e}");
            return Html(ui::render_user_form(
                None,
                &form,
                &[("__all__", "Erro interno. Tente novamente.".to_string())],
                &[],
            ))
            .into_response();
        }
    };

    let now = Utc::now();
    let new_user = User {
        id: Uuid::new_v4(),
        username: form.username.trim().to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_string(),
        password_hash: hash,
        is_active: form.is_active.is_some(),
        is_staff: form.is_staff.is_some(),
        date_joined: now,
        updated_at: now,
    };
    if let Err(e) = service.create(&new_user) {
        error!("User insert failed: {e}");
        return Html(ui::render_user_form(
            None,
            &form,
            &[("__all__", "Erro interno. Tente novamente.".to_string())],
            &[],
        ))
        .into_response();
    }

    state
        .flash(user.session_id, FlashKind::Success, "Usuário criado com sucesso!")
        .await;
    Redirect::to("/accounts/usuarios").into_response()
}

pub async fn user_edit_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let service = UserService::new(state.conn.clone());
    let target = match service.find(id) {
        Ok(target) => target,
        Err(_) => return not_found().into_response(),
    };
    let form = UserForm {
        username: target.username.clone(),
        first_name: target.first_name.clone(),
        last_name: target.last_name.clone(),
        email: target.email.clone(),
        is_active: target.is_active.then(|| "on".to_string()),
        is_staff: target.is_staff.then(|| "on".to_string()),
        password1: String::new(),
        password2: String::new(),
    };
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_user_form(Some(&target), &form, &[], &flashes)).into_response()
}

pub async fn user_edit_submit(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Form(form): Form<UserForm>,
) -> impl IntoResponse {
    let service = UserService::new(state.conn.clone());
    let target = match service.find(id) {
        Ok(target) => target,
        Err(_) => return not_found().into_response(),
    };

    if let Err(errors) = form.validate(false) {
        return Html(ui::render_user_form(Some(&target), &form, &errors, &[])).into_response();
    }

    let password_hash = if form.password1.is_empty() {
        None
    } else {
        match passwords::hash_password(&form.password1) {
            Ok(hash) => Some(hash),
            Err(e) => {
                error!("Password hashing failed: {e}");
                None
            }
        }
    };

    if let Err(e) = service.update(id, &form, password_hash) {
        error!("User update failed: {e}");
        return Html(ui::render_user_form(
            Some(&target),
            &form,
            &[("__all__", "Erro interno. Tente novamente.".to_string())],
            &[],
        ))
        .into_response();
    }

    state
        .flash(user.session_id, FlashKind::Success, "Usuário atualizado com sucesso!")
        .await;
    Redirect::to("/accounts/usuarios").into_response()
}

pub async fn user_delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    // A user may never remove their own account.
    if id == user.id {
        state
            .flash(
                user.session_id,
                FlashKind::Error,
                "Você não pode excluir seu próprio usuário.",
            )
            .await;
        return Redirect::to("/accounts/usuarios");
    }

    let service = UserService::new(state.conn.clone());
    match service.find(id) {
        Ok(target) => match service.delete(id) {
            Ok(()) => {
                state
                    .flash(
                        user.session_id,
                        FlashKind::Success,
                        format!("Usuário \"{}\" excluído.", target.username),
                    )
                    .await;
            }
            Err(e) => {
                error!("User delete failed: {e}");
                state
                    .flash(user.session_id, FlashKind::Error, "Erro ao excluir usuário.")
                    .await;
            }
        },
        Err(_) => {
            state
                .flash(user.session_id, FlashKind::Error, "Usuário não encontrado.")
                .await;
        }
    }
    Redirect::to("/accounts/usuarios")
}

fn not_found() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::NOT_FOUND, "Não encontrado")
}

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounts/login", get(login_page).post(login_submit))
        .route("/accounts/logout", post(logout))
        .route("/accounts/registro", get(register_page).post(register_submit))
        .route(
            "/accounts/mudar-senha",
            get(change_password_page).post(change_password_submit),
        )
        .route("/accounts/usuarios", get(user_list))
        .route(
            "/accounts/usuarios/criar",
            get(user_create_page).post(user_create_submit),
        )
        .route(
            "/accounts/usuarios/:id/editar",
            get(user_edit_page).post(user_edit_submit),
        )
        .route("/accounts/usuarios/:id/deletar", post(user_delete))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_form_requires_password_only_on_create() {
        let form = UserForm {
            username: "ana".into(),
            ..UserForm::default()
        };
        assert!(form.validate(true).is_err());
        assert!(form.validate(false).is_ok());
    }

    #[test]
    fn user_form_rejects_mismatched_passwords() {
        let form = UserForm {
            username: "ana".into(),
            password1: "segredo123".into(),
            password2: "segredo124".into(),
            ..UserForm::default()
        };
        let errors = form.validate(false).unwrap_err();
        assert!(errors.iter().any(|(f, _)| *f == "password2"));
    }

    #[test]
    fn register_form_collects_all_violations() {
        let form = RegisterForm {
            username: " ".into(),
            email: String::new(),
            password1: "curta".into(),
            password2: "outra".into(),
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|(f, _)| *f).collect();
        assert!(fields.contains(&"username"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password1"));
        assert!(fields.contains(&"password2"));
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4(),
            username: "carlos".into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            is_active: true,
            is_staff: false,
            date_joined: now,
            updated_at: now,
        };
        assert_eq!(user.display_name(), "carlos");

        user.first_name = "Carlos".into();
        user.last_name = "Silva".into();
        assert_eq!(user.display_name(), "Carlos Silva");
    }
}
