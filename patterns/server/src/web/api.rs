use axum::Json;
use utoipa::OpenApi;

use crate::{cascade, contact, location, product, status, task};

/// OpenAPI description of the structured (`/api`) routes.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "HTMX patterns",
        description = "Structured renditions of the pattern endpoints. The same routes under /htmx return HTML fragments."
    ),
    paths(
        cascade::web::countries_handler,
        cascade::web::states_handler,
        cascade::web::cities_handler,
        cascade::web::delete_country_handler,
        cascade::web::delete_state_handler,
        task::web::list_tasks_handler,
        task::web::create_task_handler,
        task::web::toggle_task_handler,
        task::web::delete_task_handler,
        contact::web::submit_contact_handler,
        contact::web::search_contacts_handler,
        product::web::list_products_handler,
        product::web::product_detail_handler,
        status::web::system_status_handler,
        location::web::search_locations_handler,
    ),
    tags(
        (name = "Dependent dropdowns", description = "Country, state and city cascade"),
        (name = "Tasks", description = "Dynamic task list"),
        (name = "Contacts", description = "Contact form and live search"),
        (name = "Products", description = "Infinite scroll and product detail"),
        (name = "System status", description = "Polled service health"),
        (name = "Locations", description = "Map search")
    )
)]
pub struct ApiDoc;

/// Handler for GET /api-docs/openapi.json.
#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
