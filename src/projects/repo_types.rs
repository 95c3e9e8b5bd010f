use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_key: Option<String>, // object storage key, never sent to clients
    pub image_content_type: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// Partial update; `None` leaves the column untouched, `Some(None)` clears
/// an optional column.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub link: Option<Option<String>>,
}

/// Result of replacing a project's image.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectImageSwap {
    #[sqlx(flatten)]
    pub project: Project,
    pub previous_image_key: Option<String>,
}
