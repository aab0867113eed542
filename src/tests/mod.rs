mod expense_tests;
mod group_tests;

use crate::core::models::{expense::SplitType, group::Group, user::NewUser, user::User};
use crate::core::services::DivvyService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use rust_decimal::Decimal;

pub type TestService = DivvyService<InMemoryLogging, InMemoryStorage>;

pub fn create_test_service() -> TestService {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    DivvyService::new(storage, logging)
}

pub fn new_user(first_name: &str, email: &str) -> NewUser {
    NewUser {
        first_name: first_name.to_string(),
        last_name: String::new(),
        email: email.to_string(),
        avatar_url: None,
    }
}

pub async fn register(service: &TestService, first_name: &str) -> User {
    let email = format!("{}@example.com", first_name.to_lowercase());
    service.add_user(new_user(first_name, &email)).await.unwrap()
}

/// Owner first, then the remaining users in order.
pub async fn group_of(service: &TestService, owner: &User, members: &[&User]) -> Group {
    service
        .create_group(
            "Trip".to_string(),
            members.iter().map(|u| (*u).clone()).collect(),
            owner,
        )
        .await
        .unwrap()
}

pub async fn equal_expense(service: &TestService, group: &Group, payer: &User, amount: Decimal) {
    service
        .add_expense(&group.id, "Dinner".to_string(), amount, payer, SplitType::Equal(vec![]), payer)
        .await
        .unwrap();
}
