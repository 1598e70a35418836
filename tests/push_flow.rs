use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use strum::IntoEnumIterator;

use hr_portal::api::memory::MemoryStore;
use hr_portal::api::{AuthApi, Collection, RecordWriter};
use hr_portal::auth::store::EphemeralSessionStore;
use hr_portal::handlers::FeedbackForm;
use hr_portal::model::{Identity, LeaveRequest, LeaveType, UserId};
use hr_portal::notice::Notice;
use hr_portal::sync::{self, EventReceiver};
use hr_portal::{Backend, Portal, PortalOptions};

fn portal(store: &Arc<MemoryStore>, options: PortalOptions) -> (Portal, EventReceiver) {
    let (events, receiver) = sync::channel();
    let portal = Portal::new(
        Backend::memory(store.clone()),
        Box::new(EphemeralSessionStore),
        options,
        events,
    );
    (portal, receiver)
}

async fn settle(portal: &mut Portal, events: &mut EventReceiver, count: usize) {
    for _ in 0..count {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("no sync event")
            .expect("channel closed");
        portal.apply(event);
    }
}

async fn detached(store: &MemoryStore, user: &UserId) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while Collection::iter().any(|c| store.listener_count(user, c) > 0) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("listeners still attached");
}

fn leave_at(hour: u32) -> LeaveRequest {
    LeaveRequest {
        id: None,
        leave_type: LeaveType::Casual,
        start_date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap().date_naive(),
        end_date: Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap().date_naive(),
        reason: None,
        status: "Pending".into(),
        submitted_at: Some(Utc.with_ymd_and_hms(2025, 4, 30, hour, 0, 0).unwrap()),
    }
}

#[tokio::test]
async fn custom_token_session_subscribes_four_listeners() {
    let store = Arc::new(MemoryStore::new("hrms"));
    let user = UserId::new("u-token");
    let token = store.issue_custom_token(&user);

    let mut options = PortalOptions::default();
    options.bootstrap.initial_auth_token = Some(token);
    let (mut portal, mut events) = portal(&store, options);

    assert!(portal.start().await.unwrap());
    assert_eq!(portal.user_id(), Some(&user));
    assert_eq!(portal.live_listeners(), 4);
    for collection in Collection::iter() {
        assert_eq!(store.listener_count(&user, collection), 1);
    }
    settle(&mut portal, &mut events, 4).await;
}

#[tokio::test]
async fn snapshots_arrive_sorted_newest_first() {
    let store = Arc::new(MemoryStore::new("hrms"));
    let mut options = PortalOptions::default();
    options.bootstrap.anonymous_sign_in = true;
    let (mut portal, mut events) = portal(&store, options);
    portal.start().await.unwrap();
    settle(&mut portal, &mut events, 4).await;

    let identity: Identity = portal.identity().cloned().unwrap();
    for hour in [9, 15, 11] {
        store.add_leave(&identity, &leave_at(hour)).await.unwrap();
    }
    // watch channels coalesce, so wait until the last state shows up
    tokio::time::timeout(Duration::from_secs(2), async {
        while portal.data().leaves.len() < 3 {
            let event = events.recv().await.unwrap();
            portal.apply(event);
        }
    })
    .await
    .expect("leaves never arrived");

    let hours: Vec<_> = portal
        .data()
        .leaves
        .iter()
        .map(|l| l.submitted_at.unwrap().format("%H").to_string())
        .collect();
    assert_eq!(hours, ["15", "11", "09"]);
}

#[tokio::test]
async fn logout_releases_listeners_and_drops_late_events() {
    let store = Arc::new(MemoryStore::new("hrms"));
    store.signup("li@example.com", "longpass1").await.unwrap();
    let (mut portal, mut events) = portal(&store, PortalOptions::default());

    portal.login("li@example.com", "longpass1").await.unwrap();
    settle(&mut portal, &mut events, 4).await;
    let identity = portal.identity().cloned().unwrap();

    portal.logout().await.unwrap();
    detached(&store, &identity.user_id).await;
    assert_eq!(portal.live_listeners(), 0);

    // a write that lands after logout must not show up
    store
        .add_feedback(
            &identity,
            &hr_portal::model::FeedbackEntry {
                id: None,
                body: "late".into(),
                timestamp: Some(Utc::now()),
            },
        )
        .await
        .unwrap();
    while let Ok(event) = events.try_recv() {
        assert_eq!(portal.apply(event), None);
    }
    assert!(portal.data().is_empty());
    assert!(portal.identity().is_none());
}

#[tokio::test]
async fn switching_identity_moves_listeners_to_the_new_user() {
    let store = Arc::new(MemoryStore::new("hrms"));
    store.signup("a@example.com", "password-a").await.unwrap();
    store.signup("b@example.com", "password-b").await.unwrap();
    let (mut portal, mut events) = portal(&store, PortalOptions::default());

    portal.login("a@example.com", "password-a").await.unwrap();
    settle(&mut portal, &mut events, 4).await;
    let first = portal.identity().cloned().unwrap();
    portal
        .submit_feedback(&FeedbackForm::new("from a"))
        .await
        .unwrap();

    portal.login("b@example.com", "password-b").await.unwrap();
    detached(&store, &first.user_id).await;
    let second = portal.user_id().cloned().unwrap();
    assert_ne!(first.user_id, second);
    for collection in Collection::iter() {
        assert_eq!(store.listener_count(&second, collection), 1);
    }

    // whatever a's listeners queued is stale now; b starts empty
    tokio::time::timeout(Duration::from_secs(2), async {
        let mut fresh = 0;
        while fresh < 4 {
            let event = events.recv().await.unwrap();
            if portal.apply(event).is_some() {
                fresh += 1;
            }
        }
    })
    .await
    .expect("b's snapshots never arrived");
    assert!(portal.data().feedback.is_empty());
}

#[tokio::test]
async fn revoked_collection_reports_once_and_spares_the_rest() {
    let store = Arc::new(MemoryStore::new("hrms"));
    let mut options = PortalOptions::default();
    options.bootstrap.anonymous_sign_in = true;
    let (mut portal, mut events) = portal(&store, options);
    portal.start().await.unwrap();
    settle(&mut portal, &mut events, 4).await;
    portal.notices();

    let user = portal.user_id().cloned().unwrap();
    store.revoke_access(&user, Collection::Documents, "Missing or insufficient permissions.");
    settle(&mut portal, &mut events, 1).await;
    assert_eq!(
        portal.notices(),
        vec![Notice::error(
            "Error fetching documents: Missing or insufficient permissions."
        )]
    );
    assert_eq!(store.listener_count(&user, Collection::Documents), 0);

    // writes to the revoked collection fail, the others still flow
    let identity = portal.identity().cloned().unwrap();
    assert!(
        store
            .add_document(
                &identity,
                &hr_portal::model::DocumentMetadata {
                    id: None,
                    file_name: "x.pdf".into(),
                    file_size: 1,
                    file_type: hr_portal::model::DocumentType::Other,
                    upload_date: None,
                    storage_key: None,
                    download_url: None,
                },
            )
            .await
            .is_err()
    );
    portal
        .submit_feedback(&FeedbackForm::new("still flowing"))
        .await
        .unwrap();
    settle(&mut portal, &mut events, 1).await;
    assert_eq!(portal.data().feedback.len(), 1);
}

#[tokio::test]
async fn anonymous_sign_in_is_offered_by_the_store() {
    let store = Arc::new(MemoryStore::new("hrms"));
    let identity = store.sign_in_anonymously().await.unwrap();
    assert!(!identity.user_id.as_str().is_empty());
}
