use utoipa::OpenApi;

use crate::api::models::{
    AddExpenseRequest, AddMemberRequest, BalanceEntry, BalancesData, CreateGroupRequest, CreateUserRequest,
    DeleteExpenseRequest, ErrorResponse, PaymentSuggestionsData, RecordPaymentRequest,
};
use crate::core::{
    models::{
        audit::{AppLog, GroupAudit},
        expense::{Expense, ExpenseShare},
        group::{Group, GroupMember, Role},
        payment::Payment,
        user::User,
    },
    services::{ExpenseHighlight, GroupSummary, PaymentSuggestion, SuggestionParty},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_user,
        super::handlers::get_user,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::add_member_to_group,
        super::handlers::add_expense,
        super::handlers::list_expenses,
        super::handlers::delete_expense,
        super::handlers::record_payment,
        super::handlers::list_payments,
        super::handlers::get_group_balances,
        super::handlers::get_payment_suggestions,
        super::handlers::get_group_summary,
        super::handlers::get_group_audits,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateUserRequest,
        CreateGroupRequest,
        AddMemberRequest,
        AddExpenseRequest,
        DeleteExpenseRequest,
        RecordPaymentRequest,
        ErrorResponse,
        BalanceEntry,
        BalancesData,
        PaymentSuggestionsData,
        User,
        Group,
        GroupMember,
        Role,
        Expense,
        ExpenseShare,
        Payment,
        AppLog,
        GroupAudit,
        PaymentSuggestion,
        SuggestionParty,
        GroupSummary,
        ExpenseHighlight
    )),
    info(
        title = "Divvy API",
        description = "Group expense splitting: expenses, settlement payments, balances and payment suggestions",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
