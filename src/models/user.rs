use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub college: Option<String>,
}

/// Header fields with defaults substituted for missing profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileHeader {
    pub name: String,
    pub college: String,
}

impl UserProfile {
    pub const DEFAULT_NAME: &'static str = "Student";
    pub const DEFAULT_COLLEGE: &'static str = "Your College";

    pub fn header(&self) -> ProfileHeader {
        ProfileHeader {
            name: non_blank(&self.full_name).unwrap_or(Self::DEFAULT_NAME).to_string(),
            college: non_blank(&self.college).unwrap_or(Self::DEFAULT_COLLEGE).to_string(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
