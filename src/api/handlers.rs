use crate::{
    api::models::*,
    core::{
        errors::DivvyError,
        models::{
            audit::{AppLog, GroupAudit},
            expense::Expense,
            group::Group,
            payment::Payment,
            user::User,
        },
        services::{DivvyService, GroupSummary},
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use std::sync::Arc;

pub type SharedService = Arc<DivvyService<InMemoryLogging, InMemoryStorage>>;

async fn require_user(service: &SharedService, user_id: &str) -> Result<User, DivvyError> {
    service
        .get_user(user_id)
        .await?
        .ok_or_else(|| DivvyError::UserNotFound(user_id.to_string()))
}

// Define API routes
pub fn api_routes(service: SharedService) -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{user_id}", get(get_user))
        .route("/groups", post(create_group))
        .route("/groups/{group_id}", get(get_group))
        .route("/groups/{group_id}/members", post(add_member_to_group))
        .route("/groups/{group_id}/expenses", post(add_expense).get(list_expenses))
        .route("/groups/{group_id}/expenses/{expense_id}", delete(delete_expense))
        .route("/groups/{group_id}/payments", post(record_payment).get(list_payments))
        .route("/groups/{group_id}/audits", get(get_group_audits))
        .route("/stats/group/{group_id}/balances", get(get_group_balances))
        .route(
            "/stats/group/{group_id}/payment-suggestions",
            get(get_payment_suggestions),
        )
        .route("/stats/group/{group_id}/summary", get(get_group_summary))
        .route("/logs", get(get_app_logs))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<User>),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn create_user(
    State(service): State<SharedService>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let user = service.add_user(req.into()).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "ID of the user to retrieve")
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<User>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_user(
    State(service): State<SharedService>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = require_user(&service, &user_id).await?;
    Ok(ApiResponse::ok(user))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = ApiResponse<Group>),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn create_group(
    State(service): State<SharedService>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Group>>), ApiError> {
    let created_by = require_user(&service, &req.created_by_id).await?;
    let members = req
        .member_ids
        .iter()
        .map(|id| require_user(&service, id))
        .collect::<Vec<_>>();
    let members = futures::future::try_join_all(members).await?;
    let group = service.create_group(req.name, members, &created_by).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group retrieved successfully", body = ApiResponse<Group>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<ApiResponse<Group>>, ApiError> {
    let group = service
        .get_group(&group_id)
        .await?
        .ok_or_else(|| DivvyError::GroupNotFound(group_id))?;
    Ok(ApiResponse::ok(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    request_body = AddMemberRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Member added successfully", body = ApiResponse<Group>),
        (status = 403, description = "Not group owner", body = ErrorResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse),
        (status = 409, description = "User already a member", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn add_member_to_group(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<ApiResponse<Group>>, ApiError> {
    let user = require_user(&service, &req.user_id).await?;
    let added_by = require_user(&service, &req.added_by_id).await?;
    let group = service.add_member_to_group(&group_id, user, &added_by).await?;
    Ok(ApiResponse::ok(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/expenses",
    request_body = AddExpenseRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 201, description = "Expense added successfully", body = ApiResponse<Expense>),
        (status = 400, description = "Invalid amount or split", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn add_expense(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Expense>>), ApiError> {
    let paid_by = require_user(&service, &req.paid_by_id).await?;
    let created_by = require_user(&service, &req.created_by_id).await?;
    let split = req.split();
    let expense = service
        .add_expense(&group_id, req.description, req.amount, &paid_by, split, &created_by)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(expense)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/expenses",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        QueriedByParams
    ),
    responses(
        (status = 200, description = "Live expenses of the group", body = ApiResponse<Vec<Expense>>),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn list_expenses(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Query(params): Query<QueriedByParams>,
) -> Result<Json<ApiResponse<Vec<Expense>>>, ApiError> {
    let queried_by = require_user(&service, &params.queried_by).await?;
    let expenses = service.list_expenses(&group_id, &queried_by).await?;
    Ok(ApiResponse::ok(expenses))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/expenses/{expense_id}",
    request_body = DeleteExpenseRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("expense_id" = String, Path, description = "ID of the expense to delete")
    ),
    responses(
        (status = 200, description = "Expense deleted", body = ApiResponse<Expense>),
        (status = 403, description = "Not allowed to delete", body = ErrorResponse),
        (status = 404, description = "Expense, user or group not found", body = ErrorResponse),
        (status = 409, description = "Expense already deleted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_expense(
    State(service): State<SharedService>,
    Path((group_id, expense_id)): Path<(String, String)>,
    Json(req): Json<DeleteExpenseRequest>,
) -> Result<Json<ApiResponse<Expense>>, ApiError> {
    let deleted_by = require_user(&service, &req.deleted_by_id).await?;
    let expense = service.delete_expense(&group_id, &expense_id, &deleted_by).await?;
    Ok(ApiResponse::ok(expense))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/payments",
    request_body = RecordPaymentRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<Payment>),
        (status = 400, description = "Invalid amount or self payment", body = ErrorResponse),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn record_payment(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Payment>>), ApiError> {
    let from_user = require_user(&service, &req.from_user_id).await?;
    let to_user = require_user(&service, &req.to_user_id).await?;
    let created_by = require_user(&service, &req.created_by_id).await?;
    let payment = service
        .record_payment(&group_id, &from_user, &to_user, req.amount, req.note, &created_by)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(payment)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/payments",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        QueriedByParams
    ),
    responses(
        (status = 200, description = "Payments of the group", body = ApiResponse<Vec<Payment>>),
        (status = 403, description = "Not a group member", body = ErrorResponse),
        (status = 404, description = "User or group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn list_payments(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Query(params): Query<QueriedByParams>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, ApiError> {
    let queried_by = require_user(&service, &params.queried_by).await?;
    let payments = service.list_payments(&group_id, &queried_by).await?;
    Ok(ApiResponse::ok(payments))
}

#[utoipa::path(
    get,
    path = "/api/stats/group/{group_id}/balances",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Per-member balances in membership order", body = ApiResponse<BalancesData>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_balances(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<ApiResponse<BalancesData>>, ApiError> {
    let balances = service.get_group_balances(&group_id).await?;
    Ok(ApiResponse::ok(BalancesData {
        balances: balances.into_iter().map(BalanceEntry::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/stats/group/{group_id}/payment-suggestions",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Suggested transfers that settle the group", body = ApiResponse<PaymentSuggestionsData>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_payment_suggestions(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<ApiResponse<PaymentSuggestionsData>>, ApiError> {
    let payment_suggestions = service.get_payment_suggestions(&group_id).await?;
    Ok(ApiResponse::ok(PaymentSuggestionsData { payment_suggestions }))
}

#[utoipa::path(
    get,
    path = "/api/stats/group/{group_id}/summary",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Spending and settlement totals", body = ApiResponse<GroupSummary>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_summary(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<ApiResponse<GroupSummary>>, ApiError> {
    let summary = service.get_group_summary(&group_id).await?;
    Ok(ApiResponse::ok(summary))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/audits",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group audits retrieved successfully", body = ApiResponse<Vec<GroupAudit>>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_audits(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<GroupAudit>>>, ApiError> {
    let audits = service.get_group_audits(&group_id).await?;
    Ok(ApiResponse::ok(audits))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application logs retrieved successfully", body = ApiResponse<Vec<AppLog>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_app_logs(State(service): State<SharedService>) -> Result<Json<ApiResponse<Vec<AppLog>>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(ApiResponse::ok(logs))
}
