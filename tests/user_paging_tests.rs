use std::sync::Arc;
use userdesk::{
    models::{Role, SortDirection, SortKey},
    repositories::SqliteUserRepository,
    services::user_service::{CreateUserRequest, UserService},
    test_utils::test_helpers,
};

/// Seeds the canonical three accounts in id order: admin, manager, guest.
async fn seeded_service() -> UserService {
    let pool = test_helpers::create_test_db().await.unwrap();
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool)));

    for (name, email, password, role) in [
        ("Administrator", "admin@mail.com", "admin", Role::Admin),
        ("Manager", "manager@mail.com", "manager", Role::Manager),
        ("Guest", "guest@mail.com", "guest", Role::Guest),
    ] {
        service
            .create_user(CreateUserRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role,
            })
            .await
            .unwrap();
    }

    service
}

#[tokio::test]
async fn first_page_slices_and_counts_all_rows() {
    let service = seeded_service().await;

    let paged = service.get_users(1, 2, "id", "asc").await.unwrap();

    assert_eq!(paged.data.len(), 2);
    assert_eq!(paged.total_rows, 3);
    assert_eq!(paged.current_page, 1);
    assert_eq!(paged.page_size, 2);
    assert_eq!(paged.data[0].email, "admin@mail.com");
    assert_eq!(paged.data[1].email, "manager@mail.com");
}

#[tokio::test]
async fn second_page_returns_the_remainder() {
    let service = seeded_service().await;

    let paged = service.get_users(2, 2, "id", "asc").await.unwrap();

    assert_eq!(paged.data.len(), 1);
    assert_eq!(paged.total_rows, 3);
    assert_eq!(paged.data[0].email, "guest@mail.com");
}

#[tokio::test]
async fn sorts_by_name_descending() {
    let service = seeded_service().await;

    let paged = service.get_users(1, 10, "name", "desc").await.unwrap();

    let names: Vec<&str> = paged.data.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Manager", "Guest", "Administrator"]);
    assert_eq!(paged.order_by, SortKey::Name);
    assert_eq!(paged.direction, SortDirection::Desc);
}

#[tokio::test]
async fn sorts_by_email_ascending() {
    let service = seeded_service().await;

    let paged = service.get_users(1, 10, "email", "asc").await.unwrap();

    let emails: Vec<&str> = paged.data.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(
        emails,
        vec!["admin@mail.com", "guest@mail.com", "manager@mail.com"]
    );
}

#[tokio::test]
async fn unrecognized_sort_pair_falls_back_to_id_ascending() {
    let service = seeded_service().await;

    let paged = service.get_users(1, 10, "password", "sideways").await.unwrap();

    assert_eq!(paged.order_by, SortKey::Id);
    assert_eq!(paged.direction, SortDirection::Asc);
    let ids: Vec<i64> = paged.data.iter().map(|u| u.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn zero_or_negative_size_yields_an_empty_page_with_full_count() {
    let service = seeded_service().await;

    let paged = service.get_users(1, 0, "id", "asc").await.unwrap();
    assert!(paged.data.is_empty());
    assert_eq!(paged.total_rows, 3);

    let paged = service.get_users(1, -5, "id", "asc").await.unwrap();
    assert!(paged.data.is_empty());
    assert_eq!(paged.total_rows, 3);
}

#[tokio::test]
async fn page_zero_behaves_as_the_first_page() {
    let service = seeded_service().await;

    let first = service.get_users(1, 2, "id", "asc").await.unwrap();
    let clamped = service.get_users(0, 2, "id", "asc").await.unwrap();

    let first_ids: Vec<i64> = first.data.iter().map(|u| u.id).collect();
    let clamped_ids: Vec<i64> = clamped.data.iter().map(|u| u.id).collect();
    assert_eq!(first_ids, clamped_ids);
}

#[tokio::test]
async fn page_past_the_end_is_empty_but_counted() {
    let service = seeded_service().await;

    let paged = service.get_users(5, 2, "id", "asc").await.unwrap();
    assert!(paged.data.is_empty());
    assert_eq!(paged.total_rows, 3);
}
