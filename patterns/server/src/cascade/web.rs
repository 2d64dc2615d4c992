use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::cascade::{CascadeDeletion, CascadeService, CascadeServiceError, Choice, ParentKind};
use crate::render::{DualRender, PathParam, ResponseMode};
use crate::web::{AppState, ErrorResponse, WebError};

impl From<CascadeServiceError> for WebError {
    fn from(err: CascadeServiceError) -> Self {
        match err {
            CascadeServiceError::Database(err) => WebError::Database(err),
            CascadeServiceError::CountryNotFound(_) => {
                WebError::NotFound("Country not found".to_string())
            }
            CascadeServiceError::StateNotFound(_) => {
                WebError::NotFound("State not found".to_string())
            }
        }
    }
}

/// JSON representation of a dropdown option.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChoiceJson {
    /// Unique identifier of the option
    id: i32,
    /// Display name
    name: String,
    /// Short code; absent for cities
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl From<&Choice> for ChoiceJson {
    fn from(choice: &Choice) -> Self {
        Self {
            id: choice.id(),
            name: choice.name().to_string(),
            code: choice.code().map(str::to_string),
        }
    }
}

/// API response listing every country.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountriesResponse {
    countries: Vec<ChoiceJson>,
}

/// API response listing the states of a country.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatesResponse {
    states: Vec<ChoiceJson>,
}

/// API response listing the cities of a state.
#[derive(Debug, Serialize, ToSchema)]
pub struct CitiesResponse {
    cities: Vec<ChoiceJson>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OptionsPayload {
    Countries(CountriesResponse),
    States(StatesResponse),
    Cities(CitiesResponse),
}

/// Which level of the cascade a list of options belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Countries,
    Children(ParentKind),
}

/// One step of the cascade, rendered either as JSON or as `<option>` elements.
#[derive(Debug)]
pub struct Options {
    level: Level,
    choices: Vec<Choice>,
}

impl Options {
    pub fn countries(choices: Vec<Choice>) -> Self {
        Self {
            level: Level::Countries,
            choices,
        }
    }

    pub fn children(kind: ParentKind, choices: Vec<Choice>) -> Self {
        Self {
            level: Level::Children(kind),
            choices,
        }
    }

    fn noun(&self) -> &'static str {
        match self.level {
            Level::Countries => "country",
            Level::Children(kind) => kind.child_noun(),
        }
    }
}

#[derive(Template)]
#[template(path = "partials/options.html")]
struct OptionsTemplate<'a> {
    noun: &'static str,
    choices: &'a [Choice],
}

impl DualRender for Options {
    fn payload(&self) -> impl Serialize + '_ {
        let choices: Vec<ChoiceJson> = self.choices.iter().map(ChoiceJson::from).collect();
        match self.level {
            Level::Countries => OptionsPayload::Countries(CountriesResponse { countries: choices }),
            Level::Children(ParentKind::Country) => {
                OptionsPayload::States(StatesResponse { states: choices })
            }
            Level::Children(ParentKind::State) => {
                OptionsPayload::Cities(CitiesResponse { cities: choices })
            }
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        OptionsTemplate {
            noun: self.noun(),
            choices: &self.choices,
        }
        .render()
    }
}

/// Row counts removed by a cascading delete.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedCounts {
    states: u64,
    cities: u64,
}

/// API response for a cascading delete.
#[derive(Debug, Serialize, ToSchema)]
pub struct CascadeDeleteResponse {
    success: bool,
    deleted: DeletedCounts,
}

impl DualRender for CascadeDeletion {
    fn payload(&self) -> impl Serialize + '_ {
        CascadeDeleteResponse {
            success: true,
            deleted: DeletedCounts {
                states: self.states,
                cities: self.cities,
            },
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        Ok(String::new())
    }
}

/// Query parameters for the states step.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatesQuery {
    /// Selected country; absent or empty means none selected
    #[serde(default)]
    country_id: Option<String>,
}

/// Query parameters for the cities step.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CitiesQuery {
    /// Selected state; absent or empty means none selected
    #[serde(default)]
    state_id: Option<String>,
}

/// Handler for GET /countries.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/countries",
    responses(
        (status = 200, description = "All countries ordered by name", body = CountriesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Dependent dropdowns"
)]
pub async fn countries_handler(mode: ResponseMode, State(state): State<Arc<AppState>>) -> Response {
    let service = CascadeService::new(&state.db);
    mode.respond(service.list_countries().await.map(Options::countries))
}

/// Handler for GET /states - the states of the selected country.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/states",
    params(StatesQuery),
    responses(
        (status = 200, description = "States of the country ordered by name", body = StatesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Dependent dropdowns"
)]
pub async fn states_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatesQuery>,
) -> Response {
    let service = CascadeService::new(&state.db);
    let kind = ParentKind::Country;
    let result = service
        .resolve_children(kind, query.country_id.as_deref())
        .await
        .map(|choices| Options::children(kind, choices));
    mode.respond(result)
}

/// Handler for GET /cities - the cities of the selected state.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/cities",
    params(CitiesQuery),
    responses(
        (status = 200, description = "Cities of the state ordered by name", body = CitiesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Dependent dropdowns"
)]
pub async fn cities_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    Query(query): Query<CitiesQuery>,
) -> Response {
    let service = CascadeService::new(&state.db);
    let kind = ParentKind::State;
    let result = service
        .resolve_children(kind, query.state_id.as_deref())
        .await
        .map(|choices| Options::children(kind, choices));
    mode.respond(result)
}

/// Handler for DELETE /countries/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/countries/{id}",
    params(("id" = i32, Path, description = "Country to delete")),
    responses(
        (status = 200, description = "Country and its descendants deleted", body = CascadeDeleteResponse),
        (status = 404, description = "Unknown country", body = ErrorResponse)
    ),
    tag = "Dependent dropdowns"
)]
pub async fn delete_country_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let service = CascadeService::new(&state.db);
    mode.respond(service.delete_country(id).await)
}

/// Handler for DELETE /states/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/states/{id}",
    params(("id" = i32, Path, description = "State to delete")),
    responses(
        (status = 200, description = "State and its cities deleted", body = CascadeDeleteResponse),
        (status = 404, description = "Unknown state", body = ErrorResponse)
    ),
    tag = "Dependent dropdowns"
)]
pub async fn delete_state_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i32>,
) -> Response {
    let service = CascadeService::new(&state.db);
    mode.respond(service.delete_state(id).await)
}

/// Creates and returns the dependent-dropdown router.
pub fn create_cascade_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/countries", get(countries_handler))
        .route("/countries/{id}", delete(delete_country_handler))
        .route("/states", get(states_handler))
        .route("/states/{id}", delete(delete_state_handler))
        .route("/cities", get(cities_handler))
        .with_state(state)
}
