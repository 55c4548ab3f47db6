use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::booking::GeoPoint;

/// A platform user as read from the User collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub location: Option<GeoPoint>,
}
