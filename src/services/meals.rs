//! Meal catalog reads.

use crate::{
    entities::{meal, Meal},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use uuid::Uuid;

/// Which slice of the catalog a listing wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealFilter {
    /// Featured meals only (home page)
    Featured,
    /// Non-featured meals only (default catalog page)
    NonFeatured,
    /// Everything
    All,
}

#[derive(Clone)]
pub struct MealService {
    db: Arc<DatabaseConnection>,
}

impl MealService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: MealFilter) -> Result<Vec<meal::Model>, ServiceError> {
        let mut query = Meal::find();
        query = match filter {
            MealFilter::Featured => query.filter(meal::Column::IsFeatured.eq(true)),
            MealFilter::NonFeatured => query.filter(meal::Column::IsFeatured.eq(false)),
            MealFilter::All => query,
        };
        let meals = query
            .order_by_desc(meal::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(meals)
    }

    pub async fn get(&self, id: Uuid) -> Result<meal::Model, ServiceError> {
        Meal::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Meal not found".to_string()))
    }
}
