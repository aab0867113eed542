use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum DivvyError {
    /// Email field is empty
    #[error("Email is required")]
    MissingEmail,

    /// Email is already registered
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Email format is invalid
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// User with given ID not found
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Group with given ID not found
    #[error("Group {0} not found")]
    GroupNotFound(String),

    /// User is already a member of the group
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),

    /// User is not a member of the group
    #[error("User {0} is not a group member")]
    NotGroupMember(String),

    /// User is not the group owner
    #[error("User {0} is not group owner")]
    NotGroupOwner(String),

    /// Expense with given ID not found in the group
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    /// Expense was already deleted
    #[error("Expense {0} already deleted")]
    ExpenseAlreadyDeleted(String),

    /// User may not delete the expense
    #[error("User {0} not allowed to delete expense")]
    ExpenseDeleteForbidden(String),

    /// Split amounts don't add up to the expense amount
    #[error("Invalid split amounts")]
    InvalidSplit,

    /// User specified in split is not a group member
    #[error("Invalid split user: {0}")]
    InvalidSplitUser(String),

    /// Payment from a user to themselves
    #[error("Cannot record payment to self")]
    SelfPayment,

    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Aggregated ledger sums failed validation
    #[error("Corrupt ledger for group {0}: {1}")]
    CorruptLedger(String, String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    /// Internal server error (e.g., unexpected failure)
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}
