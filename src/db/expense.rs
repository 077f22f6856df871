//! Expense storage.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ExpenseStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Expense {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub status: bool,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpense<'a> {
    pub name: &'a str,
    pub price: f64,
    pub status: bool,
    pub due_date: DateTime<Utc>,
}

/// Partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ExpenseChanges<'a> {
    pub name: Option<&'a str>,
    pub price: Option<f64>,
    pub status: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
}

impl ExpenseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an expense with a fresh UUID.
    pub async fn create(&self, expense: &NewExpense<'_>) -> Result<Expense, sqlx::Error> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query_as(
            "INSERT INTO expenses (id, name, price, status, due_date) VALUES (?, ?, ?, ?, ?)
             RETURNING id, name, price, status, due_date",
        )
        .bind(&id)
        .bind(expense.name)
        .bind(expense.price)
        .bind(expense.status)
        .bind(expense.due_date)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Expense>, sqlx::Error> {
        sqlx::query_as("SELECT id, name, price, status, due_date FROM expenses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List all expenses in creation order.
    pub async fn list(&self) -> Result<Vec<Expense>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, name, price, status, due_date FROM expenses ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Apply a partial update. Returns the updated expense, or None if the ID is unknown.
    pub async fn update(
        &self,
        id: &str,
        changes: &ExpenseChanges<'_>,
    ) -> Result<Option<Expense>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE expenses SET
                name = COALESCE(?, name),
                price = COALESCE(?, price),
                status = COALESCE(?, status),
                due_date = COALESCE(?, due_date)
             WHERE id = ?
             RETURNING id, name, price, status, due_date",
        )
        .bind(changes.name)
        .bind(changes.price)
        .bind(changes.status)
        .bind(changes.due_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete an expense by ID. Returns true if a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::TimeZone;

    fn rent() -> NewExpense<'static> {
        NewExpense {
            name: "Rent",
            price: 1200.5,
            status: false,
            due_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_expense() {
        let db = Database::open(":memory:").await.unwrap();

        let expense = db.expenses().create(&rent()).await.unwrap();
        assert_eq!(expense.name, "Rent");
        assert_eq!(expense.price, 1200.5);
        assert!(!expense.status);
        assert_eq!(expense.due_date, rent().due_date);

        let fetched = db.expenses().get_by_id(&expense.id).await.unwrap().unwrap();
        assert_eq!(fetched, expense);
    }

    #[tokio::test]
    async fn test_list_expenses() {
        let db = Database::open(":memory:").await.unwrap();
        assert!(db.expenses().list().await.unwrap().is_empty());

        db.expenses().create(&rent()).await.unwrap();
        db.expenses()
            .create(&NewExpense {
                name: "Power",
                price: 80.0,
                ..rent()
            })
            .await
            .unwrap();

        let names: Vec<String> = db
            .expenses()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Rent", "Power"]);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = Database::open(":memory:").await.unwrap();
        let expense = db.expenses().create(&rent()).await.unwrap();
        let new_due = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();

        let updated = db
            .expenses()
            .update(
                &expense.id,
                &ExpenseChanges {
                    status: Some(true),
                    due_date: Some(new_due),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(updated.status);
        assert_eq!(updated.due_date, new_due);
        assert_eq!(updated.name, "Rent");
        assert_eq!(updated.price, 1200.5);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let db = Database::open(":memory:").await.unwrap();

        assert!(
            db.expenses()
                .update("missing", &ExpenseChanges::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(!db.expenses().delete("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expense() {
        let db = Database::open(":memory:").await.unwrap();
        let expense = db.expenses().create(&rent()).await.unwrap();

        assert!(db.expenses().delete(&expense.id).await.unwrap());
        assert!(db.expenses().get_by_id(&expense.id).await.unwrap().is_none());
    }
}
