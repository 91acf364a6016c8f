use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::schema::{ticket_comments, ticket_videos, tickets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Aberto",
            TicketStatus::InProgress => "Em Andamento",
            TicketStatus::Resolved => "Resolvido",
            TicketStatus::Closed => "Fechado",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TicketStatus::Open => "#7c3aed",
            TicketStatus::InProgress => "#2563eb",
            TicketStatus::Resolved => "#16a34a",
            TicketStatus::Closed => "#6b7280",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TicketPriority::Low),
            "medium" => Some(TicketPriority::Medium),
            "high" => Some(TicketPriority::High),
            "critical" => Some(TicketPriority::Critical),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Baixa",
            TicketPriority::Medium => "Média",
            TicketPriority::High => "Alta",
            TicketPriority::Critical => "Crítica",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TicketPriority::Low => "#22c55e",
            TicketPriority::Medium => "#f59e0b",
            TicketPriority::High => "#f97316",
            TicketPriority::Critical => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    Public,
    TimeLimited,
    PasswordProtected,
}

impl ShareMode {
    pub const ALL: [ShareMode; 3] = [
        ShareMode::Public,
        ShareMode::TimeLimited,
        ShareMode::PasswordProtected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShareMode::Public => "public",
            ShareMode::TimeLimited => "time_limited",
            ShareMode::PasswordProtected => "password_protected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(ShareMode::Public),
            "time_limited" => Some(ShareMode::TimeLimited),
            "password_protected" => Some(ShareMode::PasswordProtected),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShareMode::Public => "Link Público",
            ShareMode::TimeLimited => "Link Temporário",
            ShareMode::PasswordProtected => "Protegido por Senha",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = tickets)]
pub struct Ticket {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
    pub status: String,
    pub priority: String,
    pub share_mode: String,
    pub share_password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn share_mode(&self) -> ShareMode {
        ShareMode::parse(&self.share_mode).unwrap_or(ShareMode::Public)
    }

    pub fn status(&self) -> TicketStatus {
        TicketStatus::parse(&self.status).unwrap_or(TicketStatus::Open)
    }

    pub fn priority(&self) -> TicketPriority {
        TicketPriority::parse(&self.priority).unwrap_or(TicketPriority::Medium)
    }

    pub fn share_path(&self) -> String {
        format!("/chamados/compartilhado/{}", self.slug)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = ticket_videos)]
pub struct TicketVideo {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub file_path: String,
    pub original_name: String,
    pub size_bytes: i64,
    pub description: String,
    pub uploaded_by: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
}

impl TicketVideo {
    pub fn extension(&self) -> String {
        match self.original_name.rfind('.') {
            Some(idx) => self.original_name[idx..].to_lowercase(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Identifiable, Insertable)]
#[diesel(table_name = ticket_comments)]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub body: String,
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

/// Validated field changes applied on create and edit. The slug never
/// appears here: it is assigned once at creation and left alone afterwards.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tickets)]
pub struct TicketChanges {
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
    pub status: String,
    pub priority: String,
    pub share_mode: String,
    pub share_password_hash: Option<Option<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketSearch {
    pub q: Option<String>,
    pub status: Option<String>,
    pub prioridade: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in TicketStatus::ALL {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("aberto"), None);
    }

    #[test]
    fn priority_round_trip() {
        for priority in TicketPriority::ALL {
            assert_eq!(TicketPriority::parse(priority.as_str()), Some(priority));
        }
        assert_eq!(TicketPriority::parse(""), None);
    }

    #[test]
    fn share_mode_round_trip() {
        for mode in ShareMode::ALL {
            assert_eq!(ShareMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(ShareMode::parse("open"), None);
    }

    #[test]
    fn video_extension_is_lowercased_suffix() {
        let video = TicketVideo {
            id: Uuid::new_v4(),
            ticket_id: Uuid::new_v4(),
            file_path: "videos/ticket_x/demo.MP4".into(),
            original_name: "Demo.MP4".into(),
            size_bytes: 10,
            description: String::new(),
            uploaded_by: None,
            uploaded_at: Utc::now(),
        };
        assert_eq!(video.extension(), ".mp4");

        let bare = TicketVideo {
            original_name: "noext".into(),
            ..video
        };
        assert_eq!(bare.extension(), "");
    }
}
