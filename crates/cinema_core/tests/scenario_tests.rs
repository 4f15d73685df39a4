mod common;

use cinema_core::domain::{Registration, Role};
use cinema_core::ServiceError;
use common::{at, day, draft, key, Harness};

#[tokio::test]
async fn inception_booking_walkthrough() {
    // The day before the screening.
    let h = Harness::starting_at(at(2030, 6, 30, 12, 0));
    let inception = || draft("Inception", 13, vec![key(day(2030, 7, 1), 2, 1)]);

    let created = h.catalog.create(inception()).await.unwrap();
    let session_id = created.sessions[0].id;
    assert!(matches!(
        h.catalog.create(inception()).await,
        Err(ServiceError::Conflict(_))
    ));

    for (username, age) in [("young", 10), ("adult", 20)] {
        h.identity
            .register(Registration {
                username: username.to_string(),
                password: "StrongP@ssw0rd".to_string(),
                age,
                role: Role::Customer,
            })
            .await
            .unwrap();
    }
    let young = h.identity.login("young", "StrongP@ssw0rd").await.unwrap().claims;
    let adult = h.identity.login("adult", "StrongP@ssw0rd").await.unwrap().claims;

    assert!(matches!(
        h.booking.issue_ticket(young.sub, young.age, session_id).await,
        Err(ServiceError::BadRequest(_))
    ));
    h.booking.issue_ticket(adult.sub, adult.age, session_id).await.unwrap();
    assert!(matches!(
        h.booking.issue_ticket(adult.sub, adult.age, session_id).await,
        Err(ServiceError::Conflict(_))
    ));

    assert!(matches!(
        h.watch.record_watch(adult.sub, session_id).await,
        Err(ServiceError::BadRequest(_))
    ));

    h.clock.set(at(2030, 7, 1, 14, 5));
    let entry = h.watch.record_watch(adult.sub, session_id).await.unwrap();
    assert_eq!(entry.movie_name, "Inception");
}
