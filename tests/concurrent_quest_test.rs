use chrono::Duration;
use ppet_tracker::config::QuestSettings;
use ppet_tracker::db::PrefsStore;
use ppet_tracker::models::{QuestCadence, QuestCategory, QuestStatus, WalkSession};
use ppet_tracker::services::{NoRewards, QuestService};
use ppet_tracker::time_utils::ManualClock;
use std::sync::Arc;

mod common;

const NUM_CONCURRENT_WALKS: i64 = 10;
const WALK_MINUTES: i64 = 6;

#[tokio::test]
async fn test_concurrent_walk_credits_are_not_lost() {
    // Walk completions and manual edits race on the same quest book. If a
    // writer read the book outside the lock, one of the increments would be
    // overwritten by a stale copy.
    let store = PrefsStore::in_memory();
    let clock = ManualClock::new(common::monday_morning());
    let service = Arc::new(
        QuestService::load(
            store.clone(),
            Arc::new(clock),
            QuestSettings::default(),
            Arc::new(NoRewards),
        )
        .await
        .unwrap(),
    );
    service.refresh_if_stale().await.unwrap();

    let grooming = service
        .active_quests(Some(QuestCategory::Care))
        .await
        .into_iter()
        .find(|q| q.cadence == QuestCadence::Weekly)
        .unwrap();

    let mut handles = vec![];

    for i in 0..NUM_CONCURRENT_WALKS {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let start = common::monday_morning() + Duration::minutes(i * 10);
            let mut session = WalkSession::start(start);
            session.close(start + Duration::minutes(WALK_MINUTES));
            service.record_walk(session).await
        }));
    }

    // Manual progress on an unrelated quest at the same time
    let manual = {
        let service = service.clone();
        let id = grooming.id.clone();
        tokio::spawn(async move { service.update_progress(&id, 2).await })
    };

    for handle in handles {
        handle.await.unwrap().expect("walk credit failed");
    }
    manual.await.unwrap().unwrap();

    let exercise = service.active_quests(Some(QuestCategory::Exercise)).await;
    let long_walk = exercise
        .iter()
        .find(|q| q.cadence == QuestCadence::Weekly)
        .unwrap();
    assert_eq!(
        long_walk.current_progress,
        (NUM_CONCURRENT_WALKS * WALK_MINUTES) as u32
    );

    // 60 minutes against a 30 minute target: completed exactly once
    let completed = service.completed_quests().await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].cadence, QuestCadence::Daily);
    assert_eq!(completed[0].status, QuestStatus::Completed);
    assert_eq!(completed[0].current_progress, 30);

    let grooming = service
        .active_quests(Some(QuestCategory::Care))
        .await
        .into_iter()
        .find(|q| q.id == grooming.id)
        .unwrap();
    assert_eq!(grooming.current_progress, 2);

    assert_eq!(service.walk_history().await.len(), NUM_CONCURRENT_WALKS as usize);

    // What was persisted matches memory
    let reloaded = QuestService::load(
        store,
        Arc::new(ManualClock::new(common::monday_morning())),
        QuestSettings::default(),
        Arc::new(NoRewards),
    )
    .await
    .unwrap();
    assert_eq!(
        reloaded.active_quests(None).await,
        service.active_quests(None).await
    );
    assert_eq!(reloaded.walk_history().await.len(), NUM_CONCURRENT_WALKS as usize);
}
