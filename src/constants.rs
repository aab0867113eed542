use rust_decimal::Decimal;

// Audit actions
pub const USER_ADDED: &str = "USER_ADDED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const PAYMENT_RECORDED: &str = "PAYMENT_RECORDED";

/// Balances closer to zero than this count as settled.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
pub const MONEY_SCALE: u32 = 2;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_NOTE_LENGTH: usize = 500;
