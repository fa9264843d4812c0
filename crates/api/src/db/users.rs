//! User queries.

use async_trait::async_trait;

use stepup_core::{Email, UserId};

use super::{PgStore, RepositoryError, UserStore, conflict_on_unique};
use crate::models::User;

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, role, name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.name)
        .bind(user.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, password_hash, role, name, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, password_hash, role, name, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, password_hash, role, name, created_at
            FROM users
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(users)
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
