use askama::Template;
use axum::{
    Router,
    extract::State,
    response::Response,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::render::{Deleted, DualRender, FormInput, PathParam, ResponseMode, SuccessResponse};
use crate::task::{Task, TaskService, TaskServiceError};
use crate::web::{AppState, ErrorResponse, WebError};

impl From<TaskServiceError> for WebError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::TitleRequired => WebError::Invalid(err.to_string()),
            TaskServiceError::TaskNotFound(_) => WebError::NotFound("Task not found".to_string()),
            TaskServiceError::Database(err) => WebError::Database(err),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
}

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    id: i32,
    /// Short title
    title: String,
    /// Whether the task is completed
    completed: bool,
}

impl From<&Task> for TaskJson {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            completed: task.completed(),
        }
    }
}

/// API response wrapping a single created or toggled task.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskResponse {
    success: bool,
    task: TaskJson,
}

/// API response for listing all tasks.
#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    tasks: Vec<TaskJson>,
    count: usize,
}

#[derive(Template)]
#[template(path = "partials/task_item.html")]
struct TaskItemTemplate<'a> {
    task: &'a Task,
}

#[derive(Template)]
#[template(path = "partials/task_list.html")]
struct TaskListTemplate<'a> {
    tasks: &'a [Task],
}

/// A single task after a create or toggle.
#[derive(Debug)]
pub struct TaskRow(pub Task);

impl DualRender for TaskRow {
    fn payload(&self) -> impl Serialize + '_ {
        TaskResponse {
            success: true,
            task: TaskJson::from(&self.0),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        TaskItemTemplate { task: &self.0 }.render()
    }
}

/// The whole task list.
#[derive(Debug)]
pub struct TaskList(pub Vec<Task>);

impl DualRender for TaskList {
    fn payload(&self) -> impl Serialize + '_ {
        TasksResponse {
            tasks: self.0.iter().map(TaskJson::from).collect(),
            count: self.0.len(),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        TaskListTemplate { tasks: &self.0 }.render()
    }
}

/// Handler for GET /tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "Pending tasks first, newest first", body = TasksResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(mode: ResponseMode, State(state): State<Arc<AppState>>) -> Response {
    let service = TaskService::new(&state.db);
    mode.respond(service.list_tasks().await.map(TaskList))
}

/// Handler for POST /tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body(content = CreateTaskForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Task created", body = TaskResponse),
        (status = 400, description = "Title missing", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    FormInput(form): FormInput<CreateTaskForm>,
) -> Response {
    let service = TaskService::new(&state.db);
    let result = service
        .create_task(&form.title, form.description.as_deref())
        .await;
    if let Ok(task) = &result {
        state
            .notifier
            .notify(&format!("Task \"{}\" added", task.title()));
    }
    mode.respond(result.map(TaskRow))
}

/// Handler for POST /tasks/{id}/toggle.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/toggle",
    params(("id" = i32, Path, description = "Task to toggle")),
    responses(
        (status = 200, description = "Task toggled", body = TaskResponse),
        (status = 404, description = "Unknown task", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn toggle_task_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let service = TaskService::new(&state.db);
    let result = service.toggle_task(id).await;
    if let Ok(task) = &result {
        let verb = if task.completed() { "completed" } else { "reopened" };
        state
            .notifier
            .notify(&format!("Task \"{}\" {}", task.title(), verb));
    }
    mode.respond(result.map(TaskRow))
}

/// Handler for DELETE /tasks/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = i32, Path, description = "Task to delete")),
    responses(
        (status = 200, description = "Task deleted", body = SuccessResponse),
        (status = 404, description = "Unknown task", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let service = TaskService::new(&state.db);
    let result = service.delete_task(id).await;
    if let Ok(task) = &result {
        state
            .notifier
            .notify(&format!("Task \"{}\" deleted", task.title()));
    }
    mode.respond(result.map(|_| Deleted))
}

/// Creates and returns the task router.
pub fn create_task_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route("/tasks/{id}", axum::routing::delete(delete_task_handler))
        .route("/tasks/{id}/toggle", post(toggle_task_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_render_completed_task_row() {
        let task = Task {
            id: 7,
            title: "Ship it".to_string(),
            description: None,
            completed: true,
            created_at: chrono::Utc::now(),
            completed_at: Some(chrono::Utc::now()),
        };
        let html = TaskRow(task).fragment().unwrap();
        assert!(html.contains(r#"id="task-7""#));
        assert!(html.contains("task-item completed"));
        assert!(html.contains(" checked>"));
        assert!(html.contains("Ship it"));
    }

    #[test]
    fn can_render_task_payload() {
        let task = Task {
            id: 3,
            title: "Review".to_string(),
            description: Some("PRs".to_string()),
            completed: false,
            created_at: chrono::Utc::now(),
            completed_at: None,
        };
        let payload = serde_json::to_value(TaskRow(task).payload()).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "success": true,
                "task": {"id": 3, "title": "Review", "completed": false}
            })
        );
    }
}
