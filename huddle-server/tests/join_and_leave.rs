mod common;

use common::{TestCoordinator, init_tracing};
use huddle_core::{ClientMessage, ConnectionId, ServerMessage};

#[tokio::test]
async fn joiner_gets_snapshot_and_others_get_roster_update() {
    init_tracing();
    let coord = TestCoordinator::spawn();

    let host = ConnectionId::new();
    let alice = ConnectionId::new();

    coord.join(host, "M1", "Host").await;
    coord.join(alice, "M1", "Alice").await;

    let snapshot = coord
        .sink
        .wait_for(&alice, 1000, |m| {
            matches!(m, ServerMessage::JoinedMeeting { .. })
        })
        .await
        .unwrap();
    match snapshot {
        ServerMessage::JoinedMeeting { participants, .. } => {
            let names: Vec<_> = participants.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Host", "Alice"]);
            assert!(participants[0].is_host);
            assert!(!participants[1].is_host);
        }
        other => panic!("unexpected message: {other:?}"),
    }

    let update = coord
        .sink
        .wait_for(&host, 1000, |m| {
            matches!(m, ServerMessage::ParticipantJoined { .. })
        })
        .await
        .unwrap();
    match update {
        ServerMessage::ParticipantJoined {
            participant,
            participants,
        } => {
            assert_eq!(participant.name, "Alice");
            assert_eq!(participants.len(), 2);
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn mesh_introduction_has_one_offer_direction_per_pair() {
    init_tracing();
    let coord = TestCoordinator::spawn();

    let host = ConnectionId::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();

    coord.join(host, "M1", "Host").await;
    coord.join(alice, "M1", "Alice").await;
    coord.join(bob, "M1", "Bob").await;

    // Bob answers both pre-existing participants; each of them offers to Bob.
    let bob_intros: Vec<_> = coord
        .sink
        .messages_for(&bob)
        .await
        .into_iter()
        .filter(|m| matches!(m, ServerMessage::InitiateConnection { .. }))
        .collect();
    assert_eq!(bob_intros.len(), 2);
    for intro in &bob_intros {
        let ServerMessage::InitiateConnection {
            should_create_offer,
            ..
        } = intro
        else {
            unreachable!()
        };
        assert!(!should_create_offer, "newcomer must answer, not offer");
    }

    for existing in [host, alice] {
        let offers: Vec<_> = coord
            .sink
            .messages_for(&existing)
            .await
            .into_iter()
            .filter(|m| {
                matches!(
                    m,
                    ServerMessage::InitiateConnection {
                        target_socket_id,
                        should_create_offer: true,
                    } if *target_socket_id == bob
                )
            })
            .collect();
        assert_eq!(offers.len(), 1, "exactly one offer toward the newcomer");
    }
}

#[tokio::test]
async fn host_disconnect_ends_meeting_for_everyone() {
    init_tracing();
    let coord = TestCoordinator::spawn();

    let host = ConnectionId::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();

    coord.join(host, "M1", "Host").await;
    coord.join(alice, "M1", "Alice").await;
    coord.join(bob, "M1", "Bob").await;

    coord.disconnect(host).await;

    for member in [alice, bob] {
        let ended = coord
            .sink
            .wait_for(&member, 1000, |m| matches!(m, ServerMessage::MeetingEnded))
            .await;
        assert!(ended.is_some(), "remaining member must see meeting-ended");
    }

    // The room is gone: rejoining the same meeting id starts a fresh one
    // with the rejoiner as host.
    coord.join(alice, "M1", "Alice").await;
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let snapshot = coord
        .sink
        .messages_for(&alice)
        .await
        .into_iter()
        .filter(|m| matches!(m, ServerMessage::JoinedMeeting { .. }))
        .last()
        .unwrap();
    let ServerMessage::JoinedMeeting { participants, .. } = snapshot else {
        unreachable!()
    };
    assert_eq!(participants.len(), 1);
    assert!(participants[0].is_host);
}

#[tokio::test]
async fn non_host_departure_updates_the_roster() {
    init_tracing();
    let coord = TestCoordinator::spawn();

    let host = ConnectionId::new();
    let alice = ConnectionId::new();

    coord.join(host, "M1", "Host").await;
    coord.join(alice, "M1", "Alice").await;

    coord.disconnect(alice).await;

    let left = coord
        .sink
        .wait_for(&host, 1000, |m| {
            matches!(m, ServerMessage::ParticipantLeft { .. })
        })
        .await
        .unwrap();
    let ServerMessage::ParticipantLeft {
        socket_id,
        participant_name,
        participants,
    } = left
    else {
        unreachable!()
    };
    assert_eq!(socket_id, alice);
    assert_eq!(participant_name, "Alice");
    assert_eq!(participants.len(), 1);
}

#[tokio::test]
async fn locked_meeting_rejects_new_joins() {
    init_tracing();
    let coord = TestCoordinator::spawn();

    let host = ConnectionId::new();
    let alice = ConnectionId::new();

    coord.join(host, "M1", "Host").await;
    coord
        .send(host, ClientMessage::LockMeeting { locked: true })
        .await;
    coord
        .sink
        .wait_for(&host, 1000, |m| {
            matches!(m, ServerMessage::MeetingLockChanged { locked: true, .. })
        })
        .await
        .unwrap();

    coord
        .send(
            alice,
            ClientMessage::JoinMeeting {
                meeting_id: "M1".into(),
                participant_name: "Alice".into(),
            },
        )
        .await;

    let locked = coord
        .sink
        .wait_for(&alice, 1000, |m| matches!(m, ServerMessage::MeetingLocked))
        .await;
    assert!(locked.is_some());
    assert!(
        !coord
            .sink
            .messages_for(&alice)
            .await
            .iter()
            .any(|m| matches!(m, ServerMessage::JoinedMeeting { .. }))
    );
    // The host never saw a roster change.
    assert!(
        !coord
            .sink
            .messages_for(&host)
            .await
            .iter()
            .any(|m| matches!(m, ServerMessage::ParticipantJoined { .. }))
    );
}

#[tokio::test]
async fn blank_participant_name_is_rejected() {
    init_tracing();
    let coord = TestCoordinator::spawn();

    let alice = ConnectionId::new();
    coord
        .send(
            alice,
            ClientMessage::JoinMeeting {
                meeting_id: "M1".into(),
                participant_name: "   ".into(),
            },
        )
        .await;

    let err = coord
        .sink
        .wait_for(&alice, 1000, |m| {
            matches!(m, ServerMessage::ActionError { .. })
        })
        .await;
    assert!(err.is_some());
}
