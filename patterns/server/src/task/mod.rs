use crate::entities::*;
use chrono::{DateTime, Utc};
use sea_orm::*;

pub mod web;

/// Source of the current time for completion timestamps.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: i32,
    title: String,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the task is completed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task was completed; `None` while pending.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            completed: model.completed,
            created_at: model.created_at,
            completed_at: model.completed_at,
        }
    }
}

/// The completion fields a toggle writes together.
///
/// Pending tasks become completed at `now`; completed tasks become pending and
/// lose their completion time.
pub fn toggled(completed: bool, now: DateTime<Utc>) -> (bool, Option<DateTime<Utc>>) {
    if completed {
        (false, None)
    } else {
        (true, Some(now))
    }
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// The title was missing or blank.
    #[error("Title is required")]
    TitleRequired,
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
    clock: &'a dyn Clock,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a sea_orm::DatabaseConnection) -> TaskService<'a> {
        Self::with_clock(db, &SystemClock)
    }

    pub fn with_clock(db: &'a sea_orm::DatabaseConnection, clock: &'a dyn Clock) -> TaskService<'a> {
        TaskService { db, clock }
    }

    /// Retrieves all tasks, pending first and newest first within each group.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = task::Entity::find()
            .order_by_asc(task::Column::Completed)
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Creates a new pending task.
    ///
    /// # Arguments
    ///
    /// * `title` - The title; surrounding whitespace is removed.
    /// * `description` - An optional free-text description.
    ///
    /// # Returns
    ///
    /// The created `Task`, or `TitleRequired` when the title is blank.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Task, TaskServiceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TaskServiceError::TitleRequired);
        }
        let description = description
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_string);

        let active_model = task::ActiveModel {
            title: ActiveValue::Set(title.to_string()),
            description: ActiveValue::Set(description),
            completed: ActiveValue::Set(false),
            created_at: ActiveValue::Set(self.clock.now()),
            completed_at: ActiveValue::Set(None),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Task::from(created_model))
    }

    /// Flips a task between pending and completed.
    ///
    /// The completed flag and the completion timestamp are written by the same
    /// update so they never disagree.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_task(&self, id: i32) -> Result<Task, TaskServiceError> {
        let task_to_toggle = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let (completed, completed_at) = toggled(task_to_toggle.completed, self.clock.now());
        let mut active_model: task::ActiveModel = task_to_toggle.into();
        active_model.completed = ActiveValue::Set(completed);
        active_model.completed_at = ActiveValue::Set(completed_at);
        let updated_model = active_model.update(self.db).await?;

        Ok(Task::from(updated_model))
    }

    /// Deletes a task by its ID.
    ///
    /// # Returns
    ///
    /// The deleted `Task`, or `TaskNotFound` for an unknown ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: i32) -> Result<Task, TaskServiceError> {
        let task_to_delete = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let task_copy = Task::from(task_to_delete);
        task::Entity::delete_by_id(id).exec(self.db).await?;
        Ok(task_copy)
    }
}
