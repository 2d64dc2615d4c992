use crate::entities::sea_orm_active_enums::ServiceStatus;
use crate::entities::*;
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::*;

pub mod web;

/// Chance that a service is touched on a simulated poll.
pub const CHANGE_PROBABILITY: f64 = 0.3;
/// Chance that a touched service reports a problem.
pub const ISSUE_PROBABILITY: f64 = 0.1;
/// Bounds of a simulated response time, in milliseconds.
pub const RESPONSE_TIME_RANGE: std::ops::RangeInclusive<i32> = 50..=500;

#[derive(Debug, PartialEq, Clone)]
pub struct SystemStatus {
    id: i32,
    service_name: String,
    status: ServiceStatus,
    response_time_ms: i32,
    uptime_percentage: f64,
    last_check: DateTime<Utc>,
    message: String,
}

impl SystemStatus {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    pub fn response_time_ms(&self) -> i32 {
        self.response_time_ms
    }

    pub fn uptime_percentage(&self) -> f64 {
        self.uptime_percentage
    }

    /// Uptime with two decimals, e.g. `"99.95"`.
    pub fn uptime_display(&self) -> String {
        format!("{:.2}", self.uptime_percentage)
    }

    pub fn last_check(&self) -> DateTime<Utc> {
        self.last_check
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<system_status::Model> for SystemStatus {
    fn from(model: system_status::Model) -> Self {
        Self {
            id: model.id,
            service_name: model.service_name,
            status: model.status,
            response_time_ms: model.response_time_ms,
            uptime_percentage: model.uptime_percentage,
            last_check: model.last_check,
            message: model.message,
        }
    }
}

/// Draws a simulated change for one service.
///
/// # Returns
///
/// `None` when the service is left alone, otherwise its new status and
/// response time.
pub fn draw_change<R: Rng + ?Sized>(rng: &mut R) -> Option<(ServiceStatus, i32)> {
    if !rng.gen_bool(CHANGE_PROBABILITY) {
        return None;
    }
    let response_time_ms = rng.gen_range(RESPONSE_TIME_RANGE);
    let status = if !rng.gen_bool(ISSUE_PROBABILITY) {
        ServiceStatus::Operational
    } else if rng.gen_bool(0.5) {
        ServiceStatus::Degraded
    } else {
        ServiceStatus::PartialOutage
    };
    Some((status, response_time_ms))
}

/// Error type for StatusService operations.
#[derive(Debug, thiserror::Error)]
pub enum StatusServiceError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct StatusService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl StatusService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> StatusService<'_> {
        StatusService { db }
    }

    /// Reads every service status, ordered by service name.
    ///
    /// # Arguments
    ///
    /// * `simulate` - Whether to randomly perturb statuses before reading.
    /// * `rng` - Random source used for the perturbation.
    #[tracing::instrument(skip(self, rng))]
    pub async fn poll_statuses<R: Rng + Send>(
        &self,
        simulate: bool,
        rng: &mut R,
    ) -> Result<Vec<SystemStatus>, StatusServiceError> {
        let models = system_status::Entity::find()
            .order_by_asc(system_status::Column::ServiceName)
            .all(self.db)
            .await?;
        if !simulate {
            return Ok(models.into_iter().map(SystemStatus::from).collect());
        }

        let mut statuses = Vec::with_capacity(models.len());
        for model in models {
            let Some((status, response_time_ms)) = draw_change(rng) else {
                statuses.push(SystemStatus::from(model));
                continue;
            };
            tracing::debug!(
                "Simulating {} as {:?} ({} ms)",
                model.service_name,
                status,
                response_time_ms
            );
            let mut active_model: system_status::ActiveModel = model.into();
            active_model.status = ActiveValue::Set(status);
            active_model.response_time_ms = ActiveValue::Set(response_time_ms);
            active_model.last_check = ActiveValue::Set(Utc::now());
            let updated_model = active_model.update(self.db).await?;
            statuses.push(SystemStatus::from(updated_model));
        }
        Ok(statuses)
    }
}
