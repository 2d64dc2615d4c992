use crate::entities::*;
use sea_orm::*;

pub mod web;

/// The parent level of a dependent-dropdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    /// Children are the states of a country.
    Country,
    /// Children are the cities of a state.
    State,
}

impl ParentKind {
    /// Singular noun of the children, used in placeholders.
    pub fn child_noun(&self) -> &'static str {
        match self {
            ParentKind::Country => "state",
            ParentKind::State => "city",
        }
    }
}

/// A selectable option in a cascade: a country, state or city.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Choice {
    id: i32,
    name: String,
    code: Option<String>,
}

impl Choice {
    pub fn new(id: i32, name: String, code: Option<String>) -> Self {
        Self { id, name, code }
    }

    /// Returns the ID of the option.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the display name of the option.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the short code, when the level has one.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl From<country::Model> for Choice {
    fn from(model: country::Model) -> Self {
        Choice::new(model.id, model.name, Some(model.code))
    }
}

impl From<state::Model> for Choice {
    fn from(model: state::Model) -> Self {
        Choice::new(model.id, model.name, Some(model.code))
    }
}

impl From<city::Model> for Choice {
    fn from(model: city::Model) -> Self {
        Choice::new(model.id, model.name, None)
    }
}

/// Row counts removed by a cascading delete, the parent itself excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeDeletion {
    pub states: u64,
    pub cities: u64,
}

/// Error type for CascadeService operations.
#[derive(Debug, thiserror::Error)]
pub enum CascadeServiceError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// The country to delete does not exist.
    #[error("Country with ID {0} not found")]
    CountryNotFound(i32),
    /// The state to delete does not exist.
    #[error("State with ID {0} not found")]
    StateNotFound(i32),
}

pub struct CascadeService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

/// Parses a raw parent identifier. Absent, blank and non-numeric values all
/// mean "no parent selected".
fn parse_parent_id(raw: Option<&str>) -> Option<i32> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}

impl CascadeService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> CascadeService<'_> {
        CascadeService { db }
    }

    /// Retrieves every country, ordered by name.
    #[tracing::instrument(skip(self))]
    pub async fn list_countries(&self) -> Result<Vec<Choice>, CascadeServiceError> {
        let countries = country::Entity::find()
            .order_by_asc(country::Column::Name)
            .order_by_asc(country::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Choice::from)
            .collect();
        Ok(countries)
    }

    /// Resolves the valid children of a selected parent.
    ///
    /// # Arguments
    ///
    /// * `parent_kind` - Whether the parent is a country or a state.
    /// * `parent_id` - The raw identifier of the selected parent, if any.
    ///
    /// # Returns
    ///
    /// The children ordered by name. An absent, empty or unknown parent yields
    /// an empty list rather than an error.
    #[tracing::instrument(skip(self))]
    pub async fn resolve_children(
        &self,
        parent_kind: ParentKind,
        parent_id: Option<&str>,
    ) -> Result<Vec<Choice>, CascadeServiceError> {
        let Some(parent_id) = parse_parent_id(parent_id) else {
            return Ok(Vec::new());
        };

        let children = match parent_kind {
            ParentKind::Country => state::Entity::find()
                .filter(state::Column::CountryId.eq(parent_id))
                .order_by_asc(state::Column::Name)
                .order_by_asc(state::Column::Id)
                .all(self.db)
                .await?
                .into_iter()
                .map(Choice::from)
                .collect(),
            ParentKind::State => city::Entity::find()
                .filter(city::Column::StateId.eq(parent_id))
                .order_by_asc(city::Column::Name)
                .order_by_asc(city::Column::Id)
                .all(self.db)
                .await?
                .into_iter()
                .map(Choice::from)
                .collect(),
        };
        Ok(children)
    }

    /// Deletes a country together with all of its states and their cities.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the country to delete.
    ///
    /// # Returns
    ///
    /// The number of states and cities removed alongside the country.
    #[tracing::instrument(skip(self))]
    pub async fn delete_country(&self, id: i32) -> Result<CascadeDeletion, CascadeServiceError> {
        let txn = self.db.begin().await?;

        country::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(CascadeServiceError::CountryNotFound(id))?;

        let state_ids: Vec<i32> = state::Entity::find()
            .filter(state::Column::CountryId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();

        let cities = delete_cities_of(&txn, &state_ids).await?;
        let states = state::Entity::delete_many()
            .filter(state::Column::CountryId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        country::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            "Deleted country {} with {} states and {} cities",
            id,
            states,
            cities
        );
        Ok(CascadeDeletion { states, cities })
    }

    /// Deletes a state together with all of its cities.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the state to delete.
    ///
    /// # Returns
    ///
    /// The number of rows removed, the state itself included.
    #[tracing::instrument(skip(self))]
    pub async fn delete_state(&self, id: i32) -> Result<CascadeDeletion, CascadeServiceError> {
        let txn = self.db.begin().await?;

        state::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(CascadeServiceError::StateNotFound(id))?;

        let cities = delete_cities_of(&txn, &[id]).await?;
        let states = state::Entity::delete_by_id(id)
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;
        tracing::info!("Deleted state {} with {} cities", id, cities);
        Ok(CascadeDeletion { states, cities })
    }
}

async fn delete_cities_of(
    txn: &DatabaseTransaction,
    state_ids: &[i32],
) -> Result<u64, CascadeServiceError> {
    if state_ids.is_empty() {
        return Ok(0);
    }
    let result = city::Entity::delete_many()
        .filter(city::Column::StateId.is_in(state_ids.iter().copied()))
        .exec(txn)
        .await?;
    Ok(result.rows_affected)
}
