use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Клуб, в котором пользователь является администратором
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ClubMembership {
    pub id: String,
    pub name: String,
}
