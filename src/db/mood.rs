use sea_orm::*;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::mood_updates::{self, CreateMoodUpdate};

pub const MOOD_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// Oldest first, for charting.
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<mood_updates::Model>, DbErr> {
    mood_updates::Entity::find()
        .filter(mood_updates::Column::UserId.eq(user_id))
        .order_by_asc(mood_updates::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: CreateMoodUpdate,
) -> Result<mood_updates::Model, ApiError> {
    if !MOOD_RANGE.contains(&input.mood_score) {
        return Err(ApiError::bad_request("mood_score must be between 1 and 5"));
    }

    let note = input.note.filter(|n| !n.trim().is_empty());
    let update = mood_updates::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        mood_score: Set(input.mood_score),
        note: Set(note),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;

    Ok(update)
}
