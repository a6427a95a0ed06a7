//! End-to-end synchronization: a server validator, racing submitters and
//! predicting clients wired together through a channel.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use santorini_sync::codec::encode;
use santorini_sync::core::{Action, GameState, MatchConfig, PlayerId};
use santorini_sync::matches::{replay_actions, MatchError, MatchId, Recovery};
use santorini_sync::rules;
use santorini_sync::sync::{
    ClientPredictor, ClientRequest, InMemoryMatchStore, ManualTimeSource, MatchUpdate,
    Reconciliation, RecordingBroadcaster, RejectionOutcome, ServerValidator, SyncError,
};

type ChannelServer =
    ServerValidator<InMemoryMatchStore, mpsc::Sender<MatchUpdate>, ManualTimeSource>;

fn channel_server(id: MatchId, config: MatchConfig) -> (ChannelServer, Receiver<MatchUpdate>) {
    let (tx, rx) = mpsc::channel();
    let server = ServerValidator::new(InMemoryMatchStore::new(), tx, ManualTimeSource::new(0));
    server.create_match(id, config).unwrap();
    server.join(id, PlayerId::ZERO).unwrap();
    server.join(id, PlayerId::ONE).unwrap();
    rx.try_iter().for_each(drop);
    (server, rx)
}

fn client(server: &ChannelServer, id: MatchId, player: PlayerId) -> ClientPredictor {
    ClientPredictor::from_view(player, &server.view(id).unwrap()).unwrap()
}

fn deliver(
    rx: &Receiver<MatchUpdate>,
    clients: &mut [&mut ClientPredictor],
) -> Vec<Vec<Reconciliation>> {
    let updates: Vec<MatchUpdate> = rx.try_iter().collect();
    clients
        .iter_mut()
        .map(|client| updates.iter().map(|u| client.on_update(u)).collect())
        .collect()
}

fn first_legal(state: &GameState) -> Action {
    rules::legal_actions(state)[0]
}

#[test]
fn test_racing_submissions_append_exactly_once() {
    let server = Arc::new(ServerValidator::new(
        InMemoryMatchStore::new(),
        RecordingBroadcaster::new(),
        ManualTimeSource::new(0),
    ));
    let id = MatchId(1);
    server.create_match(id, MatchConfig::default()).unwrap();
    server.join(id, PlayerId::ZERO).unwrap();
    server.join(id, PlayerId::ONE).unwrap();
    server.broadcaster().take();

    let view = server.view(id).unwrap();
    let start = replay_actions(&view.snapshot, view.log.actions()).unwrap();
    let legal = rules::legal_actions(&start);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let server = Arc::clone(&server);
            let raw = u32::from(encode(legal[i % legal.len()]));
            thread::spawn(move || server.submit_move(id, PlayerId::ZERO, 0, raw))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(
            err.match_error(),
            Some(&MatchError::StaleSubmission {
                expected_index: 1,
                claimed_index: 0
            })
        );
        assert_eq!(err.recovery(), Recovery::RefetchAndRetry);
    }

    assert_eq!(server.view(id).unwrap().log.len(), 1);
    // Only the accepted submission was broadcast.
    assert_eq!(server.broadcaster().take().len(), 1);
}

#[test]
fn test_two_clients_stay_in_step() {
    let id = MatchId(2);
    let (server, rx) = channel_server(id, MatchConfig::default());
    let mut zero = client(&server, id, PlayerId::ZERO);
    let mut one = client(&server, id, PlayerId::ONE);

    for ply in 0..8u32 {
        server.time().advance(250);
        let mover_is_zero = zero.state().to_move == PlayerId::ZERO;
        let request = {
            let mover = if mover_is_zero { &mut zero } else { &mut one };
            let action = first_legal(mover.state());
            let request = mover.predict(action).unwrap();
            assert!(mover.pending().is_some());
            request
        };
        assert!(matches!(
            request,
            ClientRequest::SubmitMove { claimed_index, .. } if claimed_index == ply
        ));

        server.handle(request).unwrap();
        let outcomes = deliver(&rx, &mut [&mut zero, &mut one]);
        let (mine, theirs) = if mover_is_zero {
            (&outcomes[0], &outcomes[1])
        } else {
            (&outcomes[1], &outcomes[0])
        };
        assert_eq!(mine, &vec![Reconciliation::Confirmed { index: ply }]);
        assert_eq!(theirs, &vec![Reconciliation::Applied { index: ply }]);

        let digest = server.view(id).unwrap().digest;
        assert_eq!(zero.state().digest(), digest);
        assert_eq!(one.state().digest(), digest);
        assert!(zero.pending().is_none() && one.pending().is_none());
    }
    assert_eq!(zero.confirmed_log().len(), 8);
}

#[test]
fn test_redelivered_update_is_ignored() {
    let id = MatchId(3);
    let (server, rx) = channel_server(id, MatchConfig::default());
    let mut zero = client(&server, id, PlayerId::ZERO);

    let request = zero.predict(first_legal(zero.state())).unwrap();
    server.handle(request).unwrap();
    let update = rx.try_recv().unwrap();

    assert_eq!(zero.on_update(&update), Reconciliation::Confirmed { index: 0 });
    assert_eq!(zero.on_update(&update), Reconciliation::Ignored);
    assert_eq!(zero.confirmed_log().len(), 1);
}

#[test]
fn test_stale_device_refetches_and_retries() {
    let id = MatchId(4);
    let (server, rx) = channel_server(id, MatchConfig::default());
    let mut phone = client(&server, id, PlayerId::ZERO);
    let mut laptop = client(&server, id, PlayerId::ZERO);
    let mut opponent = client(&server, id, PlayerId::ONE);

    // The phone plays and the opponent answers; the laptop hears nothing.
    let opening = first_legal(phone.state());
    server.handle(phone.predict(opening).unwrap()).unwrap();
    deliver(&rx, &mut [&mut phone, &mut opponent]);
    let reply = first_legal(opponent.state());
    server.handle(opponent.predict(reply).unwrap()).unwrap();
    deliver(&rx, &mut [&mut phone, &mut opponent]);

    // A move the laptop can make now and after the refetch.
    let after = replay_actions(&server.view(id).unwrap().snapshot, [opening, reply]).unwrap();
    let retry = rules::legal_actions(laptop.state())
        .into_iter()
        .find(|a| rules::legal_actions(&after).contains(a))
        .unwrap();

    let request = laptop.predict(retry).unwrap();
    let err = server.handle(request).unwrap_err();
    assert_eq!(
        err.match_error(),
        Some(&MatchError::StaleSubmission {
            expected_index: 2,
            claimed_index: 0
        })
    );
    assert_eq!(server.view(id).unwrap().log.len(), 2);

    let RejectionOutcome::Retry { action } = laptop.on_rejection(&err) else {
        panic!("a stale submission should be retried once");
    };
    assert_eq!(action, retry);
    assert!(laptop.pending().is_none());

    laptop.resync(&server.view(id).unwrap()).unwrap();
    let request = laptop.predict(action).unwrap();
    server.handle(request).unwrap();
    let outcomes = deliver(&rx, &mut [&mut laptop, &mut phone]);

    assert_eq!(outcomes[0], vec![Reconciliation::Confirmed { index: 2 }]);
    assert_eq!(outcomes[1], vec![Reconciliation::Applied { index: 2 }]);
    assert_eq!(laptop.state(), phone.state());
}

#[test]
fn test_second_stale_rejection_surfaces() {
    let id = MatchId(5);
    let (server, _rx) = channel_server(id, MatchConfig::default());
    let mut laptop = client(&server, id, PlayerId::ZERO);

    let stale = SyncError::Rejected {
        match_id: id,
        source: MatchError::StaleSubmission {
            expected_index: 1,
            claimed_index: 0,
        },
    };
    let action = first_legal(laptop.state());

    laptop.predict(action).unwrap();
    assert!(matches!(
        laptop.on_rejection(&stale),
        RejectionOutcome::Retry { .. }
    ));
    laptop.predict(action).unwrap();
    assert_eq!(laptop.on_rejection(&stale), RejectionOutcome::Surface);
}

#[test]
fn test_undo_rewinds_both_clients() {
    let id = MatchId(6);
    let (server, rx) = channel_server(id, MatchConfig::default().with_undo(true));
    let mut zero = client(&server, id, PlayerId::ZERO);
    let mut one = client(&server, id, PlayerId::ONE);

    for _ in 0..3 {
        let mover = if zero.state().to_move == PlayerId::ZERO {
            &mut zero
        } else {
            &mut one
        };
        let request = mover.predict(first_legal(mover.state())).unwrap();
        server.handle(request).unwrap();
        deliver(&rx, &mut [&mut zero, &mut one]);
    }

    server
        .handle(ClientRequest::RequestUndo {
            match_id: id,
            player: PlayerId::ZERO,
            target_index: 2,
        })
        .unwrap();
    server
        .handle(ClientRequest::RespondUndo {
            match_id: id,
            player: PlayerId::ONE,
            accept: true,
        })
        .unwrap();
    let outcomes = deliver(&rx, &mut [&mut zero, &mut one]);

    for seen in &outcomes {
        assert_eq!(
            seen,
            &vec![
                Reconciliation::Refreshed,
                Reconciliation::Rewound { log_len: 2 }
            ]
        );
    }
    assert_eq!(zero.confirmed_log().len(), 2);
    assert_eq!(zero.state(), one.state());
    assert_eq!(zero.state().to_move, PlayerId::ZERO);
}

#[test]
fn test_idle_clock_expiry_is_broadcast() {
    let id = MatchId(7);
    let config = MatchConfig::default()
        .with_clocks(santorini_sync::core::ClockConfig::new(1_000, 0));
    let (server, rx) = channel_server(id, config);
    let mut one = client(&server, id, PlayerId::ONE);

    server.time().advance(1_500);
    let ended = server.sweep_timeouts().unwrap();

    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].0, id);
    assert!(ended[0].1.is_winner(PlayerId::ONE));

    let outcomes = deliver(&rx, &mut [&mut one]);
    assert_eq!(outcomes[0], vec![Reconciliation::Refreshed]);
    assert!(one.status().is_closed());
    assert!(one.predict(first_legal(one.state())).is_err());
}

#[test]
fn test_late_move_drops_prediction() {
    let id = MatchId(8);
    let config = MatchConfig::default()
        .with_clocks(santorini_sync::core::ClockConfig::new(500, 0));
    let (server, rx) = channel_server(id, config);
    let mut zero = client(&server, id, PlayerId::ZERO);
    let mut one = client(&server, id, PlayerId::ONE);

    let request = zero.predict(first_legal(zero.state())).unwrap();
    server.time().advance(1_200);
    let update = server.handle(request).unwrap();
    assert!(update.status.is_closed());
    assert_eq!(update.log_len, 0);

    let outcomes = deliver(&rx, &mut [&mut zero, &mut one]);
    assert_eq!(outcomes[0], vec![Reconciliation::Dropped { index: 0 }]);
    assert_eq!(outcomes[1], vec![Reconciliation::Refreshed]);

    assert!(zero.pending().is_none());
    assert_eq!(zero.state(), zero.confirmed_state());
    assert!(zero.status().is_closed());
    assert!(matches!(
        zero.predict(first_legal(zero.state())),
        Err(SyncError::Rejected {
            source: MatchError::MatchAlreadyOver,
            ..
        })
    ));
}

#[test]
fn test_resignation_drops_opponents_prediction() {
    let id = MatchId(9);
    let (server, rx) = channel_server(id, MatchConfig::default());
    let mut zero = client(&server, id, PlayerId::ZERO);

    let request = zero.predict(first_legal(zero.state())).unwrap();
    server
        .handle(ClientRequest::Resign {
            match_id: id,
            player: PlayerId::ONE,
        })
        .unwrap();
    let outcomes = deliver(&rx, &mut [&mut zero]);
    assert_eq!(outcomes[0], vec![Reconciliation::Dropped { index: 0 }]);

    let err = server.handle(request).unwrap_err();
    assert_eq!(err.match_error(), Some(&MatchError::MatchAlreadyOver));
    assert!(zero.pending().is_none());
}
