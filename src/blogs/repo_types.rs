use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub image_key: Option<String>, // object storage key, never sent to clients
    pub image_content_type: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub content: Option<String>,
    pub link: Option<String>,
}

/// Partial update; `None` leaves the column untouched, `Some(None)` clears
/// an optional column.
#[derive(Debug, Clone, Default)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub link: Option<Option<String>>,
}

/// Result of replacing a blog's image.
#[derive(Debug, Clone, FromRow)]
pub struct BlogImageSwap {
    #[sqlx(flatten)]
    pub blog: Blog,
    pub previous_image_key: Option<String>,
}
