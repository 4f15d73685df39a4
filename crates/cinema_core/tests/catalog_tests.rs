mod common;

use cinema_core::domain::{MovieFilter, MovieSort, Pagination, SortOrder};
use cinema_core::ServiceError;
use common::{day, draft, key, Harness};
use std::collections::HashSet;
use uuid::Uuid;

#[tokio::test]
async fn create_persists_movie_and_sessions() {
    let h = Harness::new();
    let created = h
        .catalog
        .create(draft("Inception", 13, vec![key(day(2030, 7, 1), 2, 1), key(day(2030, 7, 1), 3, 1)]))
        .await
        .unwrap();

    assert_eq!(created.movie.name, "Inception");
    assert_eq!(created.sessions.len(), 2);
    assert!(created.sessions.iter().all(|s| s.movie_id == created.movie.id));
}

#[tokio::test]
async fn duplicate_name_is_a_conflict() {
    let h = Harness::new();
    h.catalog.create(draft("Inception", 13, vec![])).await.unwrap();

    let err = h.catalog.create(draft("Inception", 7, vec![])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(msg) if msg == "Movie already exists"));
}

#[tokio::test]
async fn room_conflict_rolls_back_the_movie() {
    let h = Harness::new();
    let slot = key(day(2030, 7, 1), 2, 1);
    h.catalog.create(draft("Inception", 13, vec![slot])).await.unwrap();

    let err = h.catalog.create(draft("Tenet", 13, vec![slot])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let listed = h.catalog.list(MovieFilter::default()).await.unwrap();
    let names: Vec<_> = listed.items.iter().map(|m| m.movie.name.as_str()).collect();
    assert_eq!(names, vec!["Inception"]);
    assert_eq!(h.store.session_count(), 1);
}

#[tokio::test]
async fn duplicate_slot_inside_one_request_is_a_conflict() {
    let h = Harness::new();
    let slot = key(day(2030, 7, 1), 2, 1);

    let err = h.catalog.create(draft("Inception", 13, vec![slot, slot])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(h.store.session_count(), 0);
}

#[tokio::test]
async fn update_applies_the_session_diff_by_key() {
    let h = Harness::new();
    let a = key(day(2030, 7, 1), 0, 1);
    let b = key(day(2030, 7, 1), 1, 1);
    let c = key(day(2030, 7, 2), 4, 3);
    let created = h.catalog.create(draft("Inception", 13, vec![a, b])).await.unwrap();
    let b_id = created.sessions.iter().find(|s| s.key() == b).unwrap().id;

    h.catalog
        .update(created.movie.id, draft("Inception (IMAX)", 16, vec![b, c]))
        .await
        .unwrap();

    let listed = h.catalog.list(MovieFilter::default()).await.unwrap();
    let movie = &listed.items[0];
    assert_eq!(movie.movie.name, "Inception (IMAX)");
    assert_eq!(movie.movie.min_age, 16);

    let keys: HashSet<_> = movie.sessions.iter().map(|s| s.key()).collect();
    assert_eq!(keys, HashSet::from([b, c]));
    // B survives with its identity intact.
    assert!(movie.sessions.iter().any(|s| s.id == b_id));
}

#[tokio::test]
async fn update_of_unknown_movie_is_not_found() {
    let h = Harness::new();
    let err = h.catalog.update(Uuid::new_v4(), draft("Ghost", 0, vec![])).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn update_into_a_taken_name_or_slot_is_a_conflict() {
    let h = Harness::new();
    let taken = key(day(2030, 7, 1), 5, 9);
    h.catalog.create(draft("Inception", 13, vec![taken])).await.unwrap();
    let other = h.catalog.create(draft("Tenet", 13, vec![])).await.unwrap();

    let err = h
        .catalog
        .update(other.movie.id, draft("Inception", 13, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let err = h
        .catalog
        .update(other.movie.id, draft("Tenet 2", 13, vec![taken]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // The failed update left the name alone.
    let listed = h.catalog.list(MovieFilter::default()).await.unwrap();
    assert!(listed.items.iter().any(|m| m.movie.name == "Tenet"));
}

#[tokio::test]
async fn delete_cascades_and_reports_missing_movies() {
    let h = Harness::new();
    let created = h
        .catalog
        .create(draft("Inception", 13, vec![key(day(2030, 7, 1), 2, 1)]))
        .await
        .unwrap();
    let user = h.user("viewer", 30).await;
    h.booking
        .issue_ticket(user.id, user.age, created.sessions[0].id)
        .await
        .unwrap();

    h.catalog.delete(created.movie.id).await.unwrap();
    assert_eq!(h.store.session_count(), 0);
    assert_eq!(h.store.ticket_count(), 0);

    let err = h.catalog.delete(created.movie.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn list_filters_sorts_and_paginates() {
    let h = Harness::new();
    for (name, age) in [("The Matrix", 16), ("Matrix Reloaded", 16), ("Up", 0), ("Alien", 18)] {
        h.catalog.create(draft(name, age, vec![])).await.unwrap();
    }

    let by_name = h
        .catalog
        .list(MovieFilter {
            name: Some("MATRIX".to_string()),
            ..MovieFilter::default()
        })
        .await
        .unwrap();
    let names: Vec<_> = by_name.items.iter().map(|m| m.movie.name.clone()).collect();
    assert_eq!(names, vec!["Matrix Reloaded", "The Matrix"]);
    assert_eq!(by_name.total_count, None);

    let zero_age = h
        .catalog
        .list(MovieFilter {
            permitted_for_age: Some(0),
            ..MovieFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(zero_age.items.len(), 4);

    let for_teens = h
        .catalog
        .list(MovieFilter {
            permitted_for_age: Some(16),
            ..MovieFilter::default()
        })
        .await
        .unwrap();
    let names: Vec<_> = for_teens.items.iter().map(|m| m.movie.name.clone()).collect();
    assert_eq!(names, vec!["Matrix Reloaded", "The Matrix", "Up"]);

    let second_page = h
        .catalog
        .list(MovieFilter {
            sort_by: MovieSort::MinAge,
            order: SortOrder::Desc,
            pagination: Some(Pagination {
                page_number: 2,
                page_size: 2,
            }),
            ..MovieFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(second_page.total_count, Some(4));
    let ages: Vec<_> = second_page.items.iter().map(|m| m.movie.min_age).collect();
    assert_eq!(ages, vec![16, 0]);
}
