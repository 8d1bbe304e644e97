//! Sample resources, one per permission.

use axum::Json;
use serde_json::{json, Value};

use crate::web::middleware::Authorized;
use crate::web::permissions::{
    ReportsFinance, ReportsOperations, SupportTicketsCreate, SupportTicketsView,
};

/// GET /api/dummy/reports/finance
pub async fn finance_report(_caller: Authorized<ReportsFinance>) -> Json<Value> {
    Json(json!({ "report": "Finance numbers for the month", "status": "ok" }))
}

/// GET /api/dummy/reports/operations
pub async fn operations_report(_caller: Authorized<ReportsOperations>) -> Json<Value> {
    Json(json!({ "report": "Operations metrics", "status": "ok" }))
}

/// GET /api/dummy/support/tickets
pub async fn list_tickets(_caller: Authorized<SupportTicketsView>) -> Json<Value> {
    Json(json!({ "tickets": [{ "id": 1, "subject": "Printer down" }] }))
}

/// POST /api/dummy/support/tickets
pub async fn create_ticket(caller: Authorized<SupportTicketsCreate>) -> Json<Value> {
    tracing::info!(user_id = caller.user().id(), "Support ticket opened");
    Json(json!({ "message": "Ticket created", "ticket_id": 42 }))
}
