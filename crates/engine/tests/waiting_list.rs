mod common;

use chrono::{Duration, Utc};

use common::{car, date, engine_with_db, registration};
use engine::{EngineError, RentRequest, WaitingListStatus};

#[tokio::test]
async fn queue_positions_increase_and_duplicates_are_refused() {
    let f = engine_with_db(None).await;
    let car = car(&f, "ABC-123").await;
    let otto = f.engine.register(&registration("otto")).await.unwrap();
    let now = Utc::now();

    let first = f
        .engine
        .join_waiting_list(f.renter.id, car.id, None, now)
        .await
        .unwrap();
    let second = f
        .engine
        .join_waiting_list(f.staff.id, car.id, Some(otto.id), now)
        .await
        .unwrap();
    assert_eq!(first.queue_position, 1);
    assert_eq!(second.queue_position, 2);
    assert_eq!(first.status, WaitingListStatus::Active);

    assert!(matches!(
        f.engine
            .join_waiting_list(f.renter.id, car.id, None, now)
            .await,
        Err(EngineError::ExistingKey(_))
    ));
    assert!(matches!(
        f.engine
            .join_waiting_list(f.renter.id, car.id, Some(otto.id), now)
            .await,
        Err(EngineError::Forbidden(_))
    ));

    // Renters only see themselves in the queue.
    let own = f.engine.waiting_list(otto.id, car.id, now).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, second.id);
    let all = f.engine.waiting_list(f.staff.id, car.id, now).await.unwrap();
    assert_eq!(
        all.iter().map(|entry| entry.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    // Canceled entries keep their slot; a rejoin goes to the back.
    f.engine
        .cancel_entry(f.renter.id, first.id, now)
        .await
        .unwrap();
    let rejoined = f
        .engine
        .join_waiting_list(f.renter.id, car.id, None, now)
        .await
        .unwrap();
    assert_eq!(rejoined.queue_position, 3);
}

#[tokio::test]
async fn head_is_notified_and_can_book() {
    let f = engine_with_db(None).await;
    let car = car(&f, "ABC-123").await;
    let otto = f.engine.register(&registration("otto")).await.unwrap();
    let now = Utc::now();

    let first = f
        .engine
        .join_waiting_list(f.renter.id, car.id, None, now)
        .await
        .unwrap();
    f.engine
        .join_waiting_list(otto.id, car.id, None, now)
        .await
        .unwrap();

    assert!(matches!(
        f.engine.notify_next(f.renter.id, car.id, now).await,
        Err(EngineError::Forbidden(_))
    ));
    let notified = f
        .engine
        .notify_next(f.staff.id, car.id, now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notified.id, first.id);
    assert_eq!(notified.status, WaitingListStatus::Notified);
    assert!(notified.notified_at.is_some());

    // One open offer per car.
    assert_eq!(
        f.engine.notify_next(f.staff.id, car.id, now).await.unwrap(),
        None
    );

    assert!(matches!(
        f.engine.confirm_entry(otto.id, first.id, now).await,
        Err(EngineError::Forbidden(_))
    ));
    let booked = f
        .engine
        .confirm_entry(f.renter.id, first.id, now)
        .await
        .unwrap();
    assert_eq!(booked.status, WaitingListStatus::Booked);

    let open = f
        .engine
        .entries_for_user(f.renter.id, f.renter.id)
        .await
        .unwrap();
    assert!(open.is_empty());
}

#[tokio::test]
async fn declined_offer_passes_to_the_next_in_line() {
    let f = engine_with_db(None).await;
    let car = car(&f, "ABC-123").await;
    let otto = f.engine.register(&registration("otto")).await.unwrap();
    let now = Utc::now();

    let first = f
        .engine
        .join_waiting_list(f.renter.id, car.id, None, now)
        .await
        .unwrap();
    let second = f
        .engine
        .join_waiting_list(otto.id, car.id, None, now)
        .await
        .unwrap();
    f.engine.notify_next(f.staff.id, car.id, now).await.unwrap();

    f.engine
        .cancel_entry(f.renter.id, first.id, now)
        .await
        .unwrap();

    let queue = f.engine.waiting_list(otto.id, car.id, now).await.unwrap();
    assert_eq!(queue[0].id, second.id);
    assert_eq!(queue[0].status, WaitingListStatus::Notified);
}

#[tokio::test]
async fn stale_offers_expire() {
    let timeout = Duration::hours(24);
    let f = engine_with_db(Some(timeout)).await;
    let car = car(&f, "ABC-123").await;
    let otto = f.engine.register(&registration("otto")).await.unwrap();
    let then = Utc::now() - Duration::hours(48);

    let first = f
        .engine
        .join_waiting_list(f.renter.id, car.id, None, then)
        .await
        .unwrap();
    let second = f
        .engine
        .join_waiting_list(otto.id, car.id, None, then)
        .await
        .unwrap();
    f.engine
        .notify_next(f.staff.id, car.id, then)
        .await
        .unwrap();

    let now = then + timeout;
    let expired = f.engine.expire_notified(f.staff.id, now).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, first.id);
    assert_eq!(expired[0].status, WaitingListStatus::Canceled);

    let queue = f.engine.waiting_list(f.staff.id, car.id, now).await.unwrap();
    let next = queue.iter().find(|entry| entry.id == second.id).unwrap();
    assert_eq!(next.status, WaitingListStatus::Notified);

    let booked = f
        .engine
        .confirm_entry(otto.id, second.id, now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(booked.status, WaitingListStatus::Booked);
}

#[tokio::test]
async fn confirming_an_expired_offer_passes_it_on() {
    let timeout = Duration::hours(24);
    let f = engine_with_db(Some(timeout)).await;
    let car = car(&f, "ABC-123").await;
    let otto = f.engine.register(&registration("otto")).await.unwrap();
    let then = Utc::now() - Duration::hours(48);

    let first = f
        .engine
        .join_waiting_list(f.renter.id, car.id, None, then)
        .await
        .unwrap();
    let second = f
        .engine
        .join_waiting_list(otto.id, car.id, None, then)
        .await
        .unwrap();
    f.engine
        .notify_next(f.staff.id, car.id, then)
        .await
        .unwrap();

    let now = then + timeout;
    assert_eq!(
        f.engine
            .confirm_entry(f.renter.id, first.id, now)
            .await
            .unwrap_err(),
        EngineError::InvalidTransition("waiting list offer expired".to_string())
    );

    // The refusal itself moved the queue along.
    assert!(
        f.engine
            .entries_for_user(f.renter.id, f.renter.id)
            .await
            .unwrap()
            .is_empty()
    );
    let open = f.engine.entries_for_user(otto.id, otto.id).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, second.id);
    assert_eq!(open[0].status, WaitingListStatus::Notified);

    assert!(f.engine.expire_notified(f.staff.id, now).await.unwrap().is_empty());
}

#[tokio::test]
async fn freed_car_is_offered_to_the_queue() {
    let f = engine_with_db(None).await;
    let car = car(&f, "ABC-123").await;
    let otto = f.engine.register(&registration("otto")).await.unwrap();

    let rent = f
        .engine
        .create_rent(
            f.renter.id,
            &RentRequest {
                renter_id: None,
                car_id: car.id,
                planned_start: date(2024, 6, 1),
                planned_end: date(2024, 6, 5),
                invoice_request: false,
            },
        )
        .await
        .unwrap();
    let waiting = f
        .engine
        .join_waiting_list(otto.id, car.id, None, Utc::now())
        .await
        .unwrap();

    f.engine
        .reject_rent(f.staff.id, rent.id, None)
        .await
        .unwrap();

    let open = f.engine.entries_for_user(otto.id, otto.id).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, waiting.id);
    assert_eq!(open[0].status, WaitingListStatus::Notified);
}

#[tokio::test]
async fn deleting_a_car_cancels_its_queue() {
    let f = engine_with_db(None).await;
    let car = car(&f, "ABC-123").await;
    let entry = f
        .engine
        .join_waiting_list(f.renter.id, car.id, None, Utc::now())
        .await
        .unwrap();

    f.engine.delete_car(f.staff.id, car.id).await.unwrap();

    let queue = f
        .engine
        .waiting_list(f.staff.id, car.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(queue[0].id, entry.id);
    assert_eq!(queue[0].status, WaitingListStatus::Canceled);
    assert!(matches!(
        f.engine
            .join_waiting_list(f.renter.id, car.id, None, Utc::now())
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
}
