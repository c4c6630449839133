//! Demo budget profiles

use axum::{extract::Path, Json};

use crate::AppError;
use mealwise_core::{all_profiles, find_profile, Profile};

/// GET /api/profiles
pub async fn list_profiles() -> Json<Vec<Profile>> {
    Json(all_profiles())
}

/// GET /api/profiles/:key
pub async fn get_profile(Path(key): Path<String>) -> Result<Json<Profile>, AppError> {
    find_profile(&key)
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Unknown profile: {}", key)))
}
