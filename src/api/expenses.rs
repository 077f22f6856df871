//! Expenses API.
//!
//! All endpoints require a bearer token.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::DeletedResponse;
use super::error::{ApiError, JsonBody, ResultExt, require_non_empty};
use crate::auth::Auth;
use crate::db::{Database, Expense, ExpenseChanges, NewExpense};

#[derive(Clone)]
pub struct ExpensesState {
    pub db: Database,
}

pub fn router(state: ExpensesState) -> Router {
    Router::new()
        .route("/add", post(create_expense))
        .route("/list", get(list_expenses))
        .route("/update/{id}", put(update_expense))
        .route("/delete/{id}", delete(delete_expense))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateExpenseRequest {
    name: String,
    price: f64,
    status: bool,
    due_date: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct UpdateExpenseRequest {
    name: Option<String>,
    price: Option<f64>,
    status: Option<bool>,
    due_date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseResponse {
    id: String,
    name: String,
    price: f64,
    status: bool,
    due_date: String,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            name: expense.name,
            price: expense.price,
            status: expense.status,
            due_date: format_due_date(&expense.due_date),
        }
    }
}

// --- Helpers ---

/// Parse a due date given either as an RFC 3339 timestamp or as a bare
/// `YYYY-MM-DD` date, which is taken as midnight UTC.
fn parse_due_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::bad_request("Invalid dueDate"))
}

fn format_due_date(due_date: &DateTime<Utc>) -> String {
    due_date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// --- Handlers ---

async fn create_expense(
    State(state): State<ExpensesState>,
    Auth(caller): Auth,
    JsonBody(payload): JsonBody<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = require_non_empty(&payload.name, "Name")?;
    let due_date = parse_due_date(&payload.due_date)?;

    let expense = state
        .db
        .expenses()
        .create(&NewExpense {
            name,
            price: payload.price,
            status: payload.status,
            due_date,
        })
        .await
        .persist_err("Failed to create expense")?;

    info!(expense = %expense.id, caller = %caller.user_id(), "Expense created");

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(expense))))
}

async fn list_expenses(
    State(state): State<ExpensesState>,
    Auth(caller): Auth,
) -> Result<impl IntoResponse, ApiError> {
    debug!(caller = %caller.user_id(), "Listing expenses");

    let expenses = state
        .db
        .expenses()
        .list()
        .await
        .db_err("Failed to list expenses")?;

    Ok(Json(
        expenses
            .into_iter()
            .map(ExpenseResponse::from)
            .collect::<Vec<_>>(),
    ))
}

async fn update_expense(
    State(state): State<ExpensesState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(|name| require_non_empty(name, "Name"))
        .transpose()?;
    let due_date = payload.due_date.as_deref().map(parse_due_date).transpose()?;

    let expense = state
        .db
        .expenses()
        .update(
            &id,
            &ExpenseChanges {
                name,
                price: payload.price,
                status: payload.status,
                due_date,
            },
        )
        .await
        .persist_err("Failed to update expense")?
        .ok_or_else(|| ApiError::bad_request("Expense not found"))?;

    info!(expense = %expense.id, "Expense updated");

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(expense))))
}

async fn delete_expense(
    State(state): State<ExpensesState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .expenses()
        .delete(&id)
        .await
        .persist_err("Failed to delete expense")?;

    if !deleted {
        return Err(ApiError::bad_request("Expense not found"));
    }

    info!(expense = %id, "Expense deleted");

    Ok((StatusCode::CREATED, Json(DeletedResponse::new())))
}
