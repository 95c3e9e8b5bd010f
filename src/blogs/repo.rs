use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::blogs::repo_types::{Blog, BlogImageSwap, BlogPatch, NewBlog};

#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Blog>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Blog>, StoreError>;
    async fn create(&self, blog: NewBlog) -> Result<Blog, StoreError>;
    async fn update(&self, id: Uuid, patch: BlogPatch) -> Result<Option<Blog>, StoreError>;
    /// Returns the deleted row so its image can be cleaned up.
    async fn delete(&self, id: Uuid) -> Result<Option<Blog>, StoreError>;
    async fn set_image(
        &self,
        id: Uuid,
        key: &str,
        content_type: &str,
    ) -> Result<Option<BlogImageSwap>, StoreError>;
}

#[derive(Clone)]
pub struct PgBlogStore {
    db: PgPool,
}

impl PgBlogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlogStore for PgBlogStore {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Blog>, StoreError> {
        let rows = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, title, content, link, image_key, image_content_type,
                   created_at, updated_at
            FROM blogs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Blog>, StoreError> {
        let row = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, title, content, link, image_key, image_content_type,
                   created_at, updated_at
            FROM blogs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, blog: NewBlog) -> Result<Blog, StoreError> {
        let row = sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (title, content, link)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, link, image_key, image_content_type,
                      created_at, updated_at
            "#,
        )
        .bind(&blog.title)
        .bind(&blog.content)
        .bind(&blog.link)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: BlogPatch) -> Result<Option<Blog>, StoreError> {
        let row = sqlx::query_as::<_, Blog>(
            r#"
            UPDATE blogs
               SET title       = COALESCE($2, title),
                   content     = CASE WHEN $3 THEN $4 ELSE content END,
                   link        = CASE WHEN $5 THEN $6 ELSE link END,
                   updated_at  = now()
             WHERE id = $1
            RETURNING id, title, content, link, image_key, image_content_type,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(patch.content.is_some())
        .bind(patch.content.as_ref().and_then(Option::as_deref))
        .bind(patch.link.is_some())
        .bind(patch.link.as_ref().and_then(Option::as_deref))
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Blog>, StoreError> {
        let row = sqlx::query_as::<_, Blog>(
            r#"
            DELETE FROM blogs
             WHERE id = $1
            RETURNING id, title, content, link, image_key, image_content_type,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn set_image(
        &self,
        id: Uuid,
        key: &str,
        content_type: &str,
    ) -> Result<Option<BlogImageSwap>, StoreError> {
        // Row lock so two uploads can't both see the same previous key.
        let row = sqlx::query_as::<_, BlogImageSwap>(
            r#"
            WITH old AS (
                SELECT id, image_key FROM blogs WHERE id = $1 FOR UPDATE
            )
            UPDATE blogs p
               SET image_key = $2,
                   image_content_type = $3,
                   updated_at = now()
              FROM old
             WHERE p.id = old.id
            RETURNING p.id, p.title, p.content, p.link, p.image_key,
                      p.image_content_type, p.created_at, p.updated_at,
                      old.image_key AS previous_image_key
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(content_type)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }
}
