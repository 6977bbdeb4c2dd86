use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity resolved from the request's session, attached by the session middleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}
