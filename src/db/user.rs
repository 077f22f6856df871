use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// A stored user. `password` always holds a bcrypt hash.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub level: i64,
    pub status: bool,
}

/// Fields for a new user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub level: i64,
    pub status: bool,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges<'a> {
    pub email: Option<&'a str>,
    pub name: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub level: Option<i64>,
    pub status: Option<bool>,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user with a fresh UUID. Fails on a duplicate email.
    pub async fn create(&self, user: &NewUser<'_>) -> Result<User, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query_as(
            "INSERT INTO users (id, email, name, password, level, status) VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, email, name, password, level, status",
        )
        .bind(&id)
        .bind(user.email)
        .bind(user.name)
        .bind(user.password_hash)
        .bind(user.level)
        .bind(user.status)
        .fetch_one(&self.pool)
        .await
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, email, name, password, level, status FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, email, name, password, level, status FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List all users in creation order.
    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, email, name, password, level, status FROM users ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Apply a partial update. Returns the updated user, or None if the ID is unknown.
    pub async fn update(
        &self,
        id: &str,
        changes: &UserChanges<'_>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE users SET
                email = COALESCE(?, email),
                name = COALESCE(?, name),
                password = COALESCE(?, password),
                level = COALESCE(?, level),
                status = COALESCE(?, status)
             WHERE id = ?
             RETURNING id, email, name, password, level, status",
        )
        .bind(changes.email)
        .bind(changes.name)
        .bind(changes.password_hash)
        .bind(changes.level)
        .bind(changes.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a user by ID. Returns true if a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
