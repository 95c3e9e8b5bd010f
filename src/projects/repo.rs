use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::projects::repo_types::{NewProject, Project, ProjectImageSwap, ProjectPatch};

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Project>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Project>, StoreError>;
    async fn create(&self, project: NewProject) -> Result<Project, StoreError>;
    async fn update(&self, id: Uuid, patch: ProjectPatch) -> Result<Option<Project>, StoreError>;
    /// Returns the deleted row so its image can be cleaned up.
    async fn delete(&self, id: Uuid) -> Result<Option<Project>, StoreError>;
    async fn set_image(
        &self,
        id: Uuid,
        key: &str,
        content_type: &str,
    ) -> Result<Option<ProjectImageSwap>, StoreError>;
}

#[derive(Clone)]
pub struct PgProjectStore {
    db: PgPool,
}

impl PgProjectStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, link, image_key, image_content_type,
                   created_at, updated_at
            FROM projects
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

    async fn get(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, link, image_key, image_content_type,
                   created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, project: NewProject) -> Result<Project, StoreError> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, link)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, link, image_key, image_content_type,
                      created_at, updated_at
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.link)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: ProjectPatch) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
               SET name        = COALESCE($2, name),
                   description = CASE WHEN $3 THEN $4 ELSE description END,
                   link        = CASE WHEN $5 THEN $6 ELSE link END,
                   updated_at  = now()
             WHERE id = $1
            RETURNING id, name, description, link, image_key, image_content_type,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.description.is_some())
        .bind(patch.description.as_ref().and_then(Option::as_deref))
        .bind(patch.link.is_some())
        .bind(patch.link.as_ref().and_then(Option::as_deref))
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            DELETE FROM projects
             WHERE id = $1
            RETURNING id, name, description, link, image_key, image_content_type,
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
    ) -> Result<Option<ProjectImageSwap>, StoreError> {
        // Row lock so two uploads can't both see the same previous key.
        let row = sqlx::query_as::<_, ProjectImageSwap>(
            r#"
            WITH old AS (
                SELECT id, image_key FROM projects WHERE id = $1 FOR UPDATE
            )
            UPDATE projects p
               SET image_key = $2,
                   image_content_type = $3,
                   updated_at = now()
              FROM old
             WHERE p.id = old.id
            RETURNING p.id, p.name, p.description, p.link, p.image_key,
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
