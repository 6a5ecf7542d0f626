use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, services::meals::MealFilter, AppState};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// Creates the router for the public meal catalog
pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meals))
        .route("/featured", get(featured_meals))
        .route("/:id", get(get_meal))
}

/// Catalog listing. Defaults to non-featured meals; `?featured=` selects one
/// side, `?all=true` returns everything.
async fn list_meals(
    State(state): State<AppState>,
    Query(query): Query<ListMealsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = if query.all.unwrap_or(false) {
        MealFilter::All
    } else {
        match query.featured {
            Some(true) => MealFilter::Featured,
            Some(false) | None => MealFilter::NonFeatured,
        }
    };

    let meals = state
        .services
        .meals
        .list(filter)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(meals))
}

async fn featured_meals(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let meals = state
        .services
        .meals
        .list(MealFilter::Featured)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(meals))
}

async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let meal = state
        .services
        .meals
        .get(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(meal))
}

#[derive(Debug, Deserialize)]
pub struct ListMealsQuery {
    pub featured: Option<bool>,
    pub all: Option<bool>,
}
