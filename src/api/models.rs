use axum::{Json, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::core::{
    errors::DivvyError,
    ledger::MemberBalance,
    models::{expense::ExpenseShare, expense::SplitType, user::NewUser},
    services::PaymentSuggestion,
};

// Request structs for JSON payloads
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            avatar_url: req.avatar_url,
        }
    }
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
    pub created_by_id: String,
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: String,
    pub added_by_id: String,
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddExpenseRequest {
    pub description: String,
    pub amount: Decimal,
    pub paid_by_id: String,
    /// Custom split: user id -> share amount. Takes precedence over `splitAmong`.
    #[serde(default)]
    pub shares: HashMap<String, Decimal>,
    /// Equal split among these users; every member when empty.
    #[serde(default)]
    pub split_among: Vec<String>,
    pub created_by_id: String,
}

impl AddExpenseRequest {
    pub fn split(&self) -> SplitType {
        if self.shares.is_empty() {
            SplitType::Equal(self.split_among.clone())
        } else {
            SplitType::Custom(
                self.shares
                    .iter()
                    .map(|(user_id, amount)| ExpenseShare {
                        user_id: user_id.clone(),
                        amount: *amount,
                    })
                    .collect(),
            )
        }
    }
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteExpenseRequest {
    pub deleted_by_id: String,
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub created_by_id: String,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QueriedByParams {
    /// Member on whose behalf the listing is requested
    pub queried_by: String,
}

/// Success envelope shared by every endpoint.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(ApiResponse { success: true, data })
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub paid_amount: Decimal,
    pub owed_amount: Decimal,
    pub sent_amount: Decimal,
    pub received_amount: Decimal,
    pub balance: Decimal,
}

impl From<MemberBalance> for BalanceEntry {
    fn from(b: MemberBalance) -> Self {
        BalanceEntry {
            user_id: b.user.id,
            first_name: b.user.first_name,
            last_name: b.user.last_name,
            email: b.user.email,
            avatar_url: b.user.avatar_url,
            paid_amount: b.contribution.paid,
            owed_amount: b.contribution.owed,
            sent_amount: b.contribution.sent,
            received_amount: b.contribution.received,
            balance: b.balance,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct BalancesData {
    pub balances: Vec<BalanceEntry>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSuggestionsData {
    pub payment_suggestions: Vec<PaymentSuggestion>,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

// Newtype wrapper for DivvyError to implement IntoResponse
pub struct ApiError(pub DivvyError);

impl From<DivvyError> for ApiError {
    fn from(err: DivvyError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            DivvyError::MissingEmail
            | DivvyError::InvalidEmail(_)
            | DivvyError::InvalidSplit
            | DivvyError::InvalidSplitUser(_)
            | DivvyError::SelfPayment
            | DivvyError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            DivvyError::UserNotFound(_) | DivvyError::GroupNotFound(_) | DivvyError::ExpenseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DivvyError::NotGroupMember(_) | DivvyError::NotGroupOwner(_) | DivvyError::ExpenseDeleteForbidden(_) => {
                StatusCode::FORBIDDEN
            }
            DivvyError::EmailAlreadyRegistered(_)
            | DivvyError::AlreadyGroupMember(_)
            | DivvyError::ExpenseAlreadyDeleted(_) => StatusCode::CONFLICT,
            DivvyError::CorruptLedger(..)
            | DivvyError::StorageError(_)
            | DivvyError::LoggingError(_)
            | DivvyError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error_message = match &self.0 {
            DivvyError::InvalidInput(_, field_error) => field_error.description.clone(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: error_message,
            }),
        )
            .into_response()
    }
}
