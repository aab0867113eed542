use crate::core::errors::DivvyError;
use crate::core::models::{
    expense::{Expense, ExpenseShare, SplitType},
    group::Group,
    user::User,
};
use crate::tests::{TestService, create_test_service, group_of, register};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn share(user_id: &str, amount: rust_decimal::Decimal) -> ExpenseShare {
    ExpenseShare {
        user_id: user_id.to_string(),
        amount,
    }
}

#[tokio::test]
async fn test_equal_split_hands_leftover_cents_to_first_members() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let carol = register(&service, "Carol").await;
    let group = group_of(&service, &alice, &[&bob, &carol]).await;

    let expense = service
        .add_expense(&group.id, "Hotel".to_string(), dec!(100), &alice, SplitType::Equal(vec![]), &alice)
        .await
        .unwrap();

    assert_eq!(
        expense.shares,
        vec![
            share(&alice.id, dec!(33.34)),
            share(&bob.id, dec!(33.33)),
            share(&carol.id, dec!(33.33)),
        ]
    );
    let total: rust_decimal::Decimal = expense.shares.iter().map(|s| s.amount).sum();
    assert_eq!(total, dec!(100));
}

#[tokio::test]
async fn test_equal_split_among_subset_dedupes() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let carol = register(&service, "Carol").await;
    let group = group_of(&service, &alice, &[&bob, &carol]).await;

    let expense = service
        .add_expense(
            &group.id,
            "Taxi".to_string(),
            dec!(25),
            &bob,
            SplitType::Equal(vec![bob.id.clone(), carol.id.clone(), bob.id.clone()]),
            &bob,
        )
        .await
        .unwrap();

    assert_eq!(expense.shares, vec![share(&bob.id, dec!(12.50)), share(&carol.id, dec!(12.50))]);
}

#[tokio::test]
async fn test_custom_split_is_stored_in_membership_order() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let carol = register(&service, "Carol").await;
    let group = group_of(&service, &alice, &[&bob, &carol]).await;

    let expense = service
        .add_expense(
            &group.id,
            "Groceries".to_string(),
            dec!(50),
            &alice,
            SplitType::Custom(vec![
                share(&carol.id, dec!(20)),
                share(&bob.id, dec!(0)),
                share(&alice.id, dec!(30)),
            ]),
            &alice,
        )
        .await
        .unwrap();

    assert_eq!(expense.shares, vec![share(&alice.id, dec!(30)), share(&carol.id, dec!(20))]);
}

#[tokio::test]
async fn test_custom_split_validation() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let outsider = register(&service, "Oscar").await;
    let group = group_of(&service, &alice, &[&bob]).await;

    let mismatch = lunch(&service, &group, &alice, vec![share(&alice.id, dec!(20)), share(&bob.id, dec!(15))]).await;
    assert!(matches!(mismatch, Err(DivvyError::InvalidSplit)));

    let stranger = lunch(&service, &group, &alice, vec![share(&alice.id, dec!(20)), share(&outsider.id, dec!(20))]).await;
    assert!(matches!(stranger, Err(DivvyError::InvalidSplitUser(id)) if id == outsider.id));

    let negative = lunch(&service, &group, &alice, vec![share(&alice.id, dec!(50)), share(&bob.id, dec!(-10))]).await;
    assert!(matches!(negative, Err(DivvyError::InvalidInput(..))));

    let fractional = lunch(&service, &group, &alice, vec![share(&alice.id, dec!(20.005)), share(&bob.id, dec!(19.995))]).await;
    assert!(matches!(fractional, Err(DivvyError::InvalidInput(..))));
}

async fn lunch(
    service: &TestService,
    group: &Group,
    payer: &User,
    shares: Vec<ExpenseShare>,
) -> Result<Expense, DivvyError> {
    service
        .add_expense(&group.id, "Lunch".to_string(), dec!(40), payer, SplitType::Custom(shares), payer)
        .await
}

#[tokio::test]
async fn test_custom_split_must_match_amount_to_the_cent() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let group = group_of(&service, &alice, &[&bob]).await;

    let short = lunch(&service, &group, &alice, vec![share(&alice.id, dec!(20)), share(&bob.id, dec!(19.99))]).await;
    assert!(matches!(short, Err(DivvyError::InvalidSplit)));

    let over = lunch(&service, &group, &alice, vec![share(&alice.id, dec!(20)), share(&bob.id, dec!(20.01))]).await;
    assert!(matches!(over, Err(DivvyError::InvalidSplit)));

    let no_shares = service
        .add_expense(
            &group.id,
            "Gum".to_string(),
            dec!(0.01),
            &alice,
            SplitType::Custom(vec![share(&bob.id, dec!(0))]),
            &alice,
        )
        .await;
    assert!(matches!(no_shares, Err(DivvyError::InvalidSplit)));

    for _ in 0..10 {
        service
            .add_expense(
                &group.id,
                "Snack".to_string(),
                dec!(10),
                &alice,
                SplitType::Custom(vec![share(&bob.id, dec!(9.99)), share(&alice.id, dec!(0.01))]),
                &alice,
            )
            .await
            .unwrap();
    }
    let balances = service.get_group_balances(&group.id).await.unwrap();
    assert_eq!(balances.iter().map(|m| m.balance).collect::<Vec<_>>(), vec![dec!(99.90), dec!(-99.90)]);
}

#[tokio::test]
async fn test_add_expense_validates_amount_and_membership() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let outsider = register(&service, "Oscar").await;
    let group = group_of(&service, &alice, &[]).await;

    for amount in [dec!(0), dec!(-5), dec!(10.001), dec!(1000000.01)] {
        let result = service
            .add_expense(&group.id, "Bad".to_string(), amount, &alice, SplitType::Equal(vec![]), &alice)
            .await;
        assert!(matches!(result, Err(DivvyError::InvalidInput(..))), "amount {}", amount);
    }

    let result = service
        .add_expense(&group.id, "Sneaky".to_string(), dec!(10), &outsider, SplitType::Equal(vec![]), &outsider)
        .await;
    assert!(matches!(result, Err(DivvyError::NotGroupMember(_))));

    let result = service
        .add_expense(&group.id, "Sneaky".to_string(), dec!(10), &outsider, SplitType::Equal(vec![]), &alice)
        .await;
    assert!(matches!(result, Err(DivvyError::NotGroupMember(id)) if id == outsider.id));
}

#[tokio::test]
async fn test_delete_expense_permissions() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let carol = register(&service, "Carol").await;
    let group = group_of(&service, &alice, &[&bob, &carol]).await;

    let expense = service
        .add_expense(&group.id, "Museum".to_string(), dec!(30), &bob, SplitType::Equal(vec![]), &bob)
        .await
        .unwrap();

    let forbidden = service.delete_expense(&group.id, &expense.id, &carol).await;
    assert!(matches!(forbidden, Err(DivvyError::ExpenseDeleteForbidden(_))));

    // Owner may delete anyone's expense.
    let deleted = service.delete_expense(&group.id, &expense.id, &alice).await.unwrap();
    assert!(deleted.is_deleted());

    let again = service.delete_expense(&group.id, &expense.id, &bob).await;
    assert!(matches!(again, Err(DivvyError::ExpenseAlreadyDeleted(_))));

    assert!(service.list_expenses(&group.id, &carol).await.unwrap().is_empty());

    let actions: Vec<String> = service
        .get_group_audits(&group.id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.action)
        .collect();
    assert_eq!(actions, vec!["GROUP_CREATED", "EXPENSE_ADDED", "EXPENSE_DELETED"]);
}

#[tokio::test]
async fn test_delete_expense_from_other_group_is_not_found() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let first = group_of(&service, &alice, &[]).await;
    let second = group_of(&service, &alice, &[]).await;

    let expense = service
        .add_expense(&first.id, "Snacks".to_string(), dec!(12), &alice, SplitType::Equal(vec![]), &alice)
        .await
        .unwrap();

    let result = service.delete_expense(&second.id, &expense.id, &alice).await;
    assert!(matches!(result, Err(DivvyError::ExpenseNotFound(_))));
}

#[tokio::test]
async fn test_list_expenses_requires_membership() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let outsider = register(&service, "Oscar").await;
    let group = group_of(&service, &alice, &[]).await;

    let result = service.list_expenses(&group.id, &outsider).await;
    assert!(matches!(result, Err(DivvyError::NotGroupMember(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_remove_an_expense_once() {
    let service = Arc::new(create_test_service());
    let alice = register(&service, "Alice").await;
    let group = group_of(&service, &alice, &[]).await;
    let expense = service
        .add_expense(&group.id, "Concert".to_string(), dec!(60), &alice, SplitType::Equal(vec![]), &alice)
        .await
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = Arc::clone(&service);
            let (group_id, expense_id, alice) = (group.id.clone(), expense.id.clone(), alice.clone());
            tokio::spawn(async move { service.delete_expense(&group_id, &expense_id, &alice).await })
        })
        .collect();

    let mut deleted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => deleted += 1,
            Err(DivvyError::ExpenseAlreadyDeleted(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(deleted, 1);

    let deletions = service
        .get_group_audits(&group.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.action == "EXPENSE_DELETED")
        .count();
    assert_eq!(deletions, 1);
}
