use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::shared::schema::{customers, ticket_comments, ticket_videos, tickets};
use crate::shared::utils::DbPool;

use super::models::{
    ShareMode, Ticket, TicketChanges, TicketComment, TicketPriority, TicketSearch, TicketStatus,
    TicketVideo,
};
use super::share;

/// Raw form submission for creating or editing a ticket.
#[derive(Debug, Default, Deserialize)]
pub struct TicketForm {
    pub titulo: String,
    #[serde(default)]
    pub descricao: String,
    pub cliente: String,
    #[serde(default)]
    pub status: String,
    pub prioridade: String,
    pub tipo_compartilhamento: String,
    #[serde(default)]
    pub senha_compartilhamento: String,
    #[serde(default)]
    pub expira_em: String,
}

/// Form data that passed validation.
#[derive(Debug, Clone)]
pub struct TicketData {
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub share_mode: ShareMode,
    pub share_password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

pub type FieldErrors = Vec<(&'static str, String)>;

impl TicketForm {
    /// Per-field validation mirroring the edit form: share password required
    /// for protected links, expiry required for temporary links.
    /// `has_share_password` marks a ticket that already stores a hash; a
    /// blank password then means "keep the current one" instead of an error.
    pub fn validate(&self, has_share_password: bool) -> Result<TicketData, FieldErrors> {
        let mut errors: FieldErrors = Vec::new();

        let title = self.titulo.trim().to_string();
        if title.is_empty() {
            errors.push(("titulo", "Informe o título do chamado.".to_string()));
        }

        let customer_id = match Uuid::parse_str(self.cliente.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(("cliente", "Selecione um cliente.".to_string()));
                None
            }
        };

        let status = if self.status.trim().is_empty() {
            Some(TicketStatus::Open)
        } else {
            let parsed = TicketStatus::parse(self.status.trim());
            if parsed.is_none() {
                errors.push(("status", "Status inválido.".to_string()));
            }
            parsed
        };

        let priority = match TicketPriority::parse(self.prioridade.trim()) {
            Some(p) => Some(p),
            None => {
                errors.push(("prioridade", "Prioridade inválida.".to_string()));
                None
            }
        };

        let share_mode = match ShareMode::parse(self.tipo_compartilhamento.trim()) {
            Some(m) => Some(m),
            None => {
                errors.push((
                    "tipo_compartilhamento",
                    "Tipo de compartilhamento inválido.".to_string(),
                ));
                None
            }
        };

        let share_password = {
            let senha = self.senha_compartilhamento.clone();
            if share_mode == Some(ShareMode::PasswordProtected)
                && senha.is_empty()
                && !has_share_password
            {
                errors.push((
                    "senha_compartilhamento",
                    "Informe uma senha para compartilhamento protegido.".to_string(),
                ));
            }
            if senha.is_empty() {
                None
            } else {
                Some(senha)
            }
        };

        let expires_at = {
            let raw = self.expira_em.trim();
            if raw.is_empty() {
                if share_mode == Some(ShareMode::TimeLimited) {
                    errors.push((
                        "expira_em",
                        "Informe a data de expiração para link temporário.".to_string(),
                    ));
                }
                None
            } else {
                match parse_datetime_local(raw) {
                    Some(dt) => Some(dt),
                    None => {
                        errors.push(("expira_em", "Data de expiração inválida.".to_string()));
                        None
                    }
                }
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TicketData {
            title,
            description: self.descricao.trim().to_string(),
            customer_id: customer_id.expect("validated"),
            status: status.expect("validated"),
            priority: priority.expect("validated"),
            share_mode: share_mode.expect("validated"),
            share_password,
            expires_at,
        })
    }
}

/// Accepts the `datetime-local` input format, with or without seconds.
fn parse_datetime_local(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    Some(naive.and_utc())
}

/// Opaque token used in public share URLs.
pub fn generate_slug() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub struct TicketService {
    pub db: DbPool,
}

impl TicketService {
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

    /// Persists a new ticket with a freshly generated slug. The slug is
    /// assigned here and never rewritten by any later operation.
    pub fn create(&self, owner: Uuid, data: TicketData) -> Result<Ticket, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        let now = Utc::now();

        let share_password_hash = match &data.share_password {
            Some(password) => Some(share::hash_share_password(password).map_err(|e| {
                error!("Share password hashing failed: {e}");
                diesel::result::Error::RollbackTransaction
            })?),
            None => None,
        };

        let ticket = Ticket {
            id: Uuid::new_v4(),
            slug: generate_slug(),
            title: data.title,
            description: data.description,
            customer_id: data.customer_id,
            status: data.status.as_str().to_string(),
            priority: data.priority.as_str().to_string(),
            share_mode: data.share_mode.as_str().to_string(),
            share_password_hash,
            expires_at: data.expires_at,
            created_by: owner,
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(tickets::table)
            .values(&ticket)
            .execute(&mut conn)?;

        info!("Created ticket {} ({})", ticket.slug, ticket.id);
        Ok(ticket)
    }

    /// Applies edit-form changes to an owned ticket. An empty password on a
    /// protected ticket keeps the stored hash.
    pub fn update(
        &self,
        ticket: &Ticket,
        data: TicketData,
    ) -> Result<Ticket, diesel::result::Error> {
        let mut conn = self.get_conn()?;

        let share_password_hash = match &data.share_password {
            Some(password) => {
                let hash = share::hash_share_password(password).map_err(|e| {
                    error!("Share password hashing failed: {e}");
                    diesel::result::Error::RollbackTransaction
                })?;
                Some(Some(hash))
            }
            None if data.share_mode != ShareMode::PasswordProtected => Some(None),
            None => None,
        };

        let changes = TicketChanges {
            title: data.title,
            description: data.description,
            customer_id: data.customer_id,
            status: data.status.as_str().to_string(),
            priority: data.priority.as_str().to_string(),
            share_mode: data.share_mode.as_str().to_string(),
            share_password_hash,
            expires_at: Some(data.expires_at),
            updated_at: Utc::now(),
        };

        diesel::update(tickets::table.find(ticket.id))
            .set(&changes)
            .execute(&mut conn)?;

        tickets::table.find(ticket.id).first(&mut conn)
    }

    /// Owner-scoped lookup; a wrong owner is indistinguishable from a
    /// missing id.
    pub fn find_owned(&self, id: Uuid, owner: Uuid) -> Result<Ticket, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        tickets::table
            .filter(tickets::id.eq(id))
            .filter(tickets::created_by.eq(owner))
            .first(&mut conn)
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Ticket, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        tickets::table.filter(tickets::slug.eq(slug)).first(&mut conn)
    }

    /// Case-insensitive substring search across title, description, customer
    /// name and slug, intersected with exact status/priority filters. Always
    /// restricted to the owner's tickets.
    pub fn search(
        &self,
        owner: Uuid,
        filters: &TicketSearch,
    ) -> Result<Vec<(Ticket, String)>, diesel::result::Error> {
        let mut conn = self.get_conn()?;

        let mut query = tickets::table
            .inner_join(customers::table)
            .filter(tickets::created_by.eq(owner))
            .into_boxed();

        if let Some(q) = filters.q.as_deref().filter(|q| !q.trim().is_empty()) {
            let pattern = format!("%{}%", q.trim());
            query = query.filter(
                tickets::title
                    .ilike(pattern.clone())
                    .or(tickets::description.ilike(pattern.clone()))
                    .or(customers::name.ilike(pattern.clone()))
                    .or(tickets::slug.ilike(pattern)),
            );
        }
        if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(tickets::status.eq(status.to_string()));
        }
        if let Some(priority) = filters.prioridade.as_deref().filter(|p| !p.is_empty()) {
            query = query.filter(tickets::priority.eq(priority.to_string()));
        }

        query
            .order(tickets::created_at.desc())
            .select((tickets::all_columns, customers::name))
            .load(&mut conn)
    }

    pub fn change_status(
        &self,
        ticket: &Ticket,
        status: TicketStatus,
    ) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::update(tickets::table.find(ticket.id))
            .set((
                tickets::status.eq(status.as_str()),
                tickets::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    /// Deletes the ticket row; comments and video rows go with it through
    /// the schema's cascade. Video files on disk are the caller's problem
    /// and must be removed first (see `videos::delete_ticket_files`).
    pub fn delete(&self, ticket: &Ticket) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::delete(tickets::table.find(ticket.id)).execute(&mut conn)?;
        info!("Deleted ticket {} ({})", ticket.slug, ticket.id);
        Ok(())
    }

    pub fn list_videos(&self, ticket_id: Uuid) -> Result<Vec<TicketVideo>, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        ticket_videos::table
            .filter(ticket_videos::ticket_id.eq(ticket_id))
            .order(ticket_videos::uploaded_at.desc())
            .load(&mut conn)
    }

    /// Owner-scoped through the owning ticket.
    pub fn find_owned_video(
        &self,
        video_id: Uuid,
        owner: Uuid,
    ) -> Result<TicketVideo, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        ticket_videos::table
            .inner_join(tickets::table)
            .filter(ticket_videos::id.eq(video_id))
            .filter(tickets::created_by.eq(owner))
            .select(ticket_videos::all_columns)
            .first(&mut conn)
    }

    pub fn insert_video(&self, video: &TicketVideo) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::insert_into(ticket_videos::table)
            .values(video)
            .execute(&mut conn)?;
        Ok(())
    }

    pub fn delete_video(&self, video_id: Uuid) -> Result<(), diesel::result::Error> {
        let mut conn = self.get_conn()?;
        diesel::delete(ticket_videos::table.find(video_id)).execute(&mut conn)?;
        Ok(())
    }

    /// Oldest first, the order they are displayed in.
    pub fn list_comments(
        &self,
        ticket_id: Uuid,
    ) -> Result<Vec<TicketComment>, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        ticket_comments::table
            .filter(ticket_comments::ticket_id.eq(ticket_id))
            .order(ticket_comments::created_at.asc())
            .load(&mut conn)
    }

    pub fn add_comment(
        &self,
        ticket_id: Uuid,
        body: &str,
        author_id: Option<Uuid>,
        author_name: &str,
    ) -> Result<TicketComment, diesel::result::Error> {
        let mut conn = self.get_conn()?;
        let comment = TicketComment {
            id: Uuid::new_v4(),
            ticket_id,
            body: body.to_string(),
            author_id,
            author_name: author_name.to_string(),
            created_at: Utc::now(),
        };
        diesel::insert_into(ticket_comments::table)
            .values(&comment)
            .execute(&mut conn)?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> TicketForm {
        TicketForm {
            titulo: "Ocorrência no Condomínio Solar".into(),
            descricao: "Portão travado".into(),
            cliente: Uuid::new_v4().to_string(),
            status: "open".into(),
            prioridade: "medium".into(),
            tipo_compartilhamento: "public".into(),
            senha_compartilhamento: String::new(),
            expira_em: String::new(),
        }
    }

    #[test]
    fn slug_is_twelve_lowercase_hex_chars() {
        let slug = generate_slug();
        assert_eq!(slug.len(), 12);
        assert!(slug.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn slugs_do_not_repeat() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate_slug()));
        }
    }

    #[test]
    fn changeset_never_carries_a_slug() {
        // The slug column is absent from TicketChanges, so an update can
        // never rewrite it. This pins the field list.
        let data = base_form().validate(false).unwrap();
        let changes = TicketChanges {
            title: data.title,
            description: data.description,
            customer_id: data.customer_id,
            status: data.status.as_str().to_string(),
            priority: data.priority.as_str().to_string(),
            share_mode: data.share_mode.as_str().to_string(),
            share_password_hash: None,
            expires_at: Some(data.expires_at),
            updated_at: Utc::now(),
        };
        let debug = format!("{:?}", changes);
        assert!(!debug.contains("slug"));
    }

    #[test]
    fn valid_form_passes() {
        let data = base_form().validate(false).unwrap();
        assert_eq!(data.status, TicketStatus::Open);
        assert_eq!(data.priority, TicketPriority::Medium);
        assert_eq!(data.share_mode, ShareMode::Public);
        assert!(data.share_password.is_none());
        assert!(data.expires_at.is_none());
    }

    #[test]
    fn empty_status_defaults_to_open() {
        let mut form = base_form();
        form.status = String::new();
        assert_eq!(form.validate(false).unwrap().status, TicketStatus::Open);
    }

    #[test]
    fn protected_mode_requires_password() {
        let mut form = base_form();
        form.tipo_compartilhamento = "password_protected".into();
        let errors = form.validate(false).unwrap_err();
        assert!(errors.iter().any(|(f, _)| *f == "senha_compartilhamento"));

        form.senha_compartilhamento = "s3nha".into();
        let data = form.validate(false).unwrap();
        assert_eq!(data.share_password.as_deref(), Some("s3nha"));
    }

    #[test]
    fn blank_password_is_accepted_when_a_hash_is_already_stored() {
        // The edit form never pre-fills the password field; leaving it blank
        // on a protected ticket keeps the stored hash.
        let mut form = base_form();
        form.tipo_compartilhamento = "password_protected".into();

        let data = form.validate(true).unwrap();
        assert_eq!(data.share_mode, ShareMode::PasswordProtected);
        assert!(data.share_password.is_none());

        // Creating from scratch still demands a password.
        assert!(form.validate(false).is_err());
    }

    #[test]
    fn time_limited_mode_requires_expiry() {
        let mut form = base_form();
        form.tipo_compartilhamento = "time_limited".into();
        let errors = form.validate(false).unwrap_err();
        assert!(errors.iter().any(|(f, _)| *f == "expira_em"));

        form.expira_em = "2026-09-01T12:30".into();
        let data = form.validate(false).unwrap();
        assert!(data.expires_at.is_some());
    }

    #[test]
    fn blank_title_and_bad_customer_are_reported_together() {
        let mut form = base_form();
        form.titulo = "   ".into();
        form.cliente = "not-a-uuid".into();
        let errors = form.validate(false).unwrap_err();
        assert!(errors.iter().any(|(f, _)| *f == "titulo"));
        assert!(errors.iter().any(|(f, _)| *f == "cliente"));
    }

    #[test]
    fn datetime_local_parses_with_and_without_seconds() {
        assert!(parse_datetime_local("2026-08-28T09:15").is_some());
        assert!(parse_datetime_local("2026-08-28T09:15:30").is_some());
        assert!(parse_datetime_local("28/08/2026").is_none());
    }
}
