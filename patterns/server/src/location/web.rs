use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::location::{Location, LocationFilters, LocationService, LocationServiceError};
use crate::render::{DualRender, ResponseMode};
use crate::web::{AppState, ErrorResponse, WebError};

impl From<LocationServiceError> for WebError {
    fn from(err: LocationServiceError) -> Self {
        match err {
            LocationServiceError::InvalidRating(_) => {
                WebError::Invalid("min_rating must be a number".to_string())
            }
            LocationServiceError::Database(err) => WebError::Database(err),
        }
    }
}

/// JSON representation of a map location.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationJson {
    id: i32,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    category: String,
    description: String,
    rating: f64,
    price_range: String,
}

impl From<&Location> for LocationJson {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id(),
            name: location.name().to_string(),
            address: location.address().to_string(),
            latitude: location.latitude(),
            longitude: location.longitude(),
            category: location.category().to_value(),
            description: location.description().to_string(),
            rating: location.rating(),
            price_range: location.price_range().to_value(),
        }
    }
}

/// API response for a location search.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationsResponse {
    locations: Vec<LocationJson>,
    count: usize,
}

#[derive(Template)]
#[template(path = "partials/location_markers.html")]
struct LocationMarkersTemplate<'a> {
    locations: &'a [Location],
}

/// Locations matching a map search.
#[derive(Debug)]
pub struct LocationMatches(pub Vec<Location>);

impl DualRender for LocationMatches {
    fn payload(&self) -> impl Serialize + '_ {
        LocationsResponse {
            locations: self.0.iter().map(LocationJson::from).collect(),
            count: self.0.len(),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        LocationMarkersTemplate { locations: &self.0 }.render()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// restaurant, hotel, museum, park, shopping or office
    category: Option<String>,
    /// Lowest acceptable rating, 0.0 to 5.0
    min_rating: Option<String>,
    /// $, $$, $$$ or $$$$
    price_range: Option<String>,
}

/// Handler for GET /locations.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/locations",
    params(LocationQuery),
    responses(
        (status = 200, description = "Matching locations, by name", body = LocationsResponse),
        (status = 400, description = "min_rating is not a number", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn search_locations_handler(
    mode: ResponseMode,
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Response {
    let filters = match LocationFilters::parse(
        query.category.as_deref(),
        query.min_rating.as_deref(),
        query.price_range.as_deref(),
    ) {
        Ok(filters) => filters,
        Err(err) => return mode.respond::<LocationMatches, _>(Err(err)),
    };
    let service = LocationService::new(&state.db);
    mode.respond(service.search_locations(&filters).await.map(LocationMatches))
}

/// Creates and returns the location router.
pub fn create_location_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/locations", get(search_locations_handler))
        .with_state(state)
}
