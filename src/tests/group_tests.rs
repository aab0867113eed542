use crate::core::errors::DivvyError;
use crate::core::models::group::Role;
use crate::tests::{create_test_service, group_of, new_user, register};
use std::sync::Arc;

#[tokio::test]
async fn test_create_group_makes_creator_owner() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;

    let group = group_of(&service, &alice, &[&bob, &alice, &bob]).await;

    assert_eq!(group.name, "Trip");
    assert_eq!(group.members.len(), 2);
    assert_eq!(group.members[0].user.id, alice.id);
    assert_eq!(group.members[0].role, Role::Owner);
    assert_eq!(group.members[1].user.id, bob.id);
    assert_eq!(group.members[1].role, Role::Member);
    assert!(group.is_owner(&alice.id));
    assert!(!group.is_owner(&bob.id));

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, "GROUP_CREATED");
}

#[tokio::test]
async fn test_create_group_rejects_blank_name() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let result = service.create_group(" ".to_string(), vec![], &alice).await;
    assert!(matches!(result, Err(DivvyError::InvalidInput(..))));
}

#[tokio::test]
async fn test_add_member_to_group() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let group = group_of(&service, &alice, &[]).await;

    let updated = service.add_member_to_group(&group.id, bob.clone(), &alice).await.unwrap();
    assert!(updated.is_member(&bob.id));
    assert_eq!(service.get_group(&group.id).await.unwrap(), Some(updated));

    let again = service.add_member_to_group(&group.id, bob.clone(), &alice).await;
    assert!(matches!(again, Err(DivvyError::AlreadyGroupMember(_))));
}

#[tokio::test]
async fn test_only_owner_adds_members() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let carol = register(&service, "Carol").await;
    let group = group_of(&service, &alice, &[&bob]).await;

    let result = service.add_member_to_group(&group.id, carol, &bob).await;
    assert!(matches!(result, Err(DivvyError::NotGroupOwner(_))));
}

#[tokio::test]
async fn test_unknown_group() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;

    assert_eq!(service.get_group("nope").await.unwrap(), None);
    let result = service.add_member_to_group("nope", alice.clone(), &alice).await;
    assert!(matches!(result, Err(DivvyError::GroupNotFound(_))));
    assert!(matches!(service.get_group_balances("nope").await, Err(DivvyError::GroupNotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_member_adds_are_all_kept() {
    let service = Arc::new(create_test_service());
    let owner = register(&service, "Owner").await;
    let group = group_of(&service, &owner, &[]).await;

    let mut joiners = Vec::new();
    for i in 0..64 {
        let email = format!("joiner{}@example.com", i);
        joiners.push(service.add_user(new_user("Joiner", &email)).await.unwrap());
    }

    let handles: Vec<_> = joiners
        .iter()
        .cloned()
        .map(|user| {
            let service = Arc::clone(&service);
            let (group_id, owner) = (group.id.clone(), owner.clone());
            tokio::spawn(async move { service.add_member_to_group(&group_id, user, &owner).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let group = service.get_group(&group.id).await.unwrap().unwrap();
    assert_eq!(group.members.len(), 65);
    assert!(joiners.iter().all(|u| group.is_member(&u.id)));

    // Adding an existing member is still a conflict.
    let again = service.add_member_to_group(&group.id, joiners[0].clone(), &owner).await;
    assert!(matches!(again, Err(DivvyError::AlreadyGroupMember(_))));
}
