use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::blogs::repo_types::Blog;

#[derive(Debug, Default, Deserialize)]
pub struct CreateBlogRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBlogRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub link: Option<String>,
    pub has_image: bool,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Blog> for BlogResponse {
    fn from(b: Blog) -> Self {
        let has_image = b.image_key.is_some();
        Self {
            image_url: has_image.then(|| format!("/blogs/{}/image", b.id)),
            id: b.id,
            title: b.title,
            content: b.content,
            link: b.link,
            has_image,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}
