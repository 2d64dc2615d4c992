use crate::entities::sea_orm_active_enums::{LocationCategory, PriceRange};
use crate::entities::*;
use sea_orm::*;

pub mod web;

#[derive(Debug, PartialEq, Clone)]
pub struct Location {
    id: i32,
    name: String,
    address: String,
    latitude: f64,
    longitude: f64,
    category: LocationCategory,
    description: String,
    rating: f64,
    price_range: PriceRange,
}

impl Location {
    /// Returns the ID of the location.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn category(&self) -> LocationCategory {
        self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn price_range(&self) -> PriceRange {
        self.price_range
    }
}

impl From<location::Model> for Location {
    fn from(model: location::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            latitude: model.latitude,
            longitude: model.longitude,
            category: model.category,
            description: model.description,
            rating: model.rating,
            price_range: model.price_range,
        }
    }
}

/// A filter value as received: absent, a known value, or a value no row can
/// carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter<T> {
    Any,
    Only(T),
    Unmatched,
}

impl<T: ActiveEnum<Value = String>> Filter<T> {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Filter::Any,
            Some(raw) => T::try_from_value(&raw.to_string())
                .map(Filter::Only)
                .unwrap_or(Filter::Unmatched),
        }
    }
}

/// Parsed location search filters. All present filters must match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFilters {
    category: Filter<LocationCategory>,
    min_rating: Option<f64>,
    price_range: Filter<PriceRange>,
}

impl LocationFilters {
    /// Parses raw query values. Empty strings mean "no filter".
    ///
    /// # Returns
    ///
    /// `InvalidRating` when `min_rating` is present but not a number.
    pub fn parse(
        category: Option<&str>,
        min_rating: Option<&str>,
        price_range: Option<&str>,
    ) -> Result<Self, LocationServiceError> {
        let min_rating = match min_rating.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|rating| rating.is_finite())
                    .ok_or_else(|| LocationServiceError::InvalidRating(raw.to_string()))?,
            ),
        };
        Ok(Self {
            category: Filter::parse(category),
            min_rating,
            price_range: Filter::parse(price_range),
        })
    }

    /// Returns true when some filter names a value no location can have.
    pub fn matches_nothing(&self) -> bool {
        self.category == Filter::Unmatched || self.price_range == Filter::Unmatched
    }
}

/// Error type for LocationService operations.
#[derive(Debug, thiserror::Error)]
pub enum LocationServiceError {
    /// The minimum rating was not a number.
    #[error("Invalid min_rating: {0}")]
    InvalidRating(String),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct LocationService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl LocationService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> LocationService<'_> {
        LocationService { db }
    }

    /// Finds locations matching every given filter, ordered by name.
    #[tracing::instrument(skip(self))]
    pub async fn search_locations(
        &self,
        filters: &LocationFilters,
    ) -> Result<Vec<Location>, LocationServiceError> {
        if filters.matches_nothing() {
            return Ok(Vec::new());
        }

        let mut select = location::Entity::find();
        if let Filter::Only(category) = filters.category {
            select = select.filter(location::Column::Category.eq(category));
        }
        if let Some(min_rating) = filters.min_rating {
            select = select.filter(location::Column::Rating.gte(min_rating));
        }
        if let Filter::Only(price_range) = filters.price_range {
            select = select.filter(location::Column::PriceRange.eq(price_range));
        }

        let locations = select
            .order_by_asc(location::Column::Name)
            .all(self.db)
            .await?
            .into_iter()
            .map(Location::from)
            .collect();
        Ok(locations)
    }
}
