//! Read-side rollup of the requesting user's tickets and videos.

pub mod ui;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use bigdecimal::{BigDecimal, ToPrimitive};
use diesel::dsl::sum;
use diesel::prelude::*;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::shared::schema::{customers, ticket_videos, tickets};
use crate::shared::state::AppState;
use crate::shared::utils::DbPool;
use crate::tickets::models::{Ticket, TicketPriority, TicketStatus};

#[derive(Debug, Default)]
pub struct DashboardMetrics {
    pub total_tickets: i64,
    pub by_status: Vec<(TicketStatus, i64)>,
    pub by_priority: Vec<(TicketPriority, i64)>,
    pub total_videos: i64,
    pub bytes_used: i64,
    pub recent_tickets: Vec<(Ticket, String)>,
}

pub struct DashboardService {
    pub db: DbPool,
}

impl DashboardService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn metrics(&self, owner: Uuid) -> Result<DashboardMetrics, diesel::result::Error> {
        let mut conn = self.db.get().map_err(|e| {
            error!("DB connection error: {e}");
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::Unknown,
                Box::new(e.to_string()),
            )
        })?;

        let owned = || tickets::table.filter(tickets::created_by.eq(owner));

        let total_tickets: i64 = owned().count().get_result(&mut conn)?;

        let mut by_status = Vec::with_capacity(TicketStatus::ALL.len());
        for status in TicketStatus::ALL {
            let count: i64 = owned()
                .filter(tickets::status.eq(status.as_str()))
                .count()
                .get_result(&mut conn)?;
            by_status.push((status, count));
        }

        let mut by_priority = Vec::with_capacity(TicketPriority::ALL.len());
        for priority in TicketPriority::ALL {
            let count: i64 = owned()
                .filter(tickets::priority.eq(priority.as_str()))
                .count()
                .get_result(&mut conn)?;
            by_priority.push((priority, count));
        }

        let owned_videos = || {
            ticket_videos::table
                .inner_join(tickets::table)
                .filter(tickets::created_by.eq(owner))
        };
        let total_videos: i64 = owned_videos().count().get_result(&mut conn)?;
        // Postgres widens SUM(int8) to numeric.
        let bytes_used: Option<BigDecimal> = owned_videos()
            .select(sum(ticket_videos::size_bytes))
            .get_result(&mut conn)?;

        let recent_tickets = tickets::table
            .inner_join(customers::table)
            .filter(tickets::created_by.eq(owner))
            .order(tickets::created_at.desc())
            .limit(5)
            .select((tickets::all_columns, customers::name))
            .load(&mut conn)?;

        Ok(DashboardMetrics {
            total_tickets,
            by_status,
            by_priority,
            total_videos,
            bytes_used: sum_to_bytes(bytes_used),
            recent_tickets,
        })
    }
}

/// An empty table sums to NULL; anything a video table can hold fits in i64.
fn sum_to_bytes(total: Option<BigDecimal>) -> i64 {
    total.and_then(|v| v.to_i64()).unwrap_or(0)
}

/// Human-readable size: repeated division by 1024, one decimal place.
pub fn format_bytes(size: i64) -> String {
    if size == 0 {
        return "0 B".to_string();
    }
    let mut value = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} TB")
}

pub async fn index(State(state): State<Arc<AppState>>, user: CurrentUser) -> impl IntoResponse {
    let service = DashboardService::new(state.conn.clone());
    let metrics = match service.metrics(user.id) {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("Dashboard metrics failed: {e}");
            DashboardMetrics::default()
        }
    };
    let flashes = state.take_flashes(user.session_id).await;
    Html(ui::render_index(&user, &metrics, &flashes))
}

pub fn configure_dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_sum_converts_to_bytes() {
        assert_eq!(sum_to_bytes(None), 0);
        assert_eq!(sum_to_bytes(Some(BigDecimal::from(1536))), 1536);
        assert_eq!(
            sum_to_bytes(Some(BigDecimal::from(5 * 1024_i64.pow(4)))),
            5 * 1024_i64.pow(4)
        );
    }

    #[test]
    fn format_bytes_matches_expected_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512.0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_073_741_824), "1.0 GB");
        assert_eq!(format_bytes(5 * 1024_i64.pow(4)), "5.0 TB");
    }
}
