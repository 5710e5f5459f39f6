use crate::db::Database;
use crate::error::Result;
use crate::models::{NewUser, UserRecord};

/// Record persistence for submissions
pub struct UserService;

impl UserService {
    /// Insert a submission row and return its id
    pub async fn insert(db: &Database, user: &NewUser) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, phone, city, image_path, pdf_path) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.city)
        .bind(&user.image_path)
        .bind(&user.pdf_path)
        .execute(db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a submission by id
    pub async fn find(db: &Database, id: i64) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?;

        Ok(record)
    }

    /// Number of submission rows
    pub async fn count(db: &Database) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db.pool())
            .await?;

        Ok(count)
    }
}
