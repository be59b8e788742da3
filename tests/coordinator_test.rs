//! Tests for the session coordinator.

use gridmatch::{
    ClientMessage, Coordinator, Mark, MoveError, ServerMessage, ValidationError,
};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Registers a fake connection and returns its inbound stream.
fn connect(coordinator: &Coordinator, conn: u64) -> UnboundedReceiver<ServerMessage> {
    let (tx, rx) = unbounded_channel();
    coordinator.connect(conn, tx);
    rx
}

fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

#[tokio::test]
async fn test_create_room_binds_requester_as_x() {
    let coordinator = Coordinator::new();
    let mut rx = connect(&coordinator, 1);
    let code = coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    assert_eq!(code, "ABCDEF");
    assert_eq!(
        drain(&mut rx),
        vec![ServerMessage::RoomCreated {
            room_code: "ABCDEF".into()
        }]
    );
}

#[tokio::test]
async fn test_generated_codes_are_unique_enough_to_allocate() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let _rx_b = connect(&coordinator, 2);
    let code_a = coordinator.create_room(1, None).unwrap();
    let code_b = coordinator.create_room(2, None).unwrap();
    assert_ne!(code_a, code_b);
    assert_eq!(code_a.len(), 6);
}

#[tokio::test]
async fn test_duplicate_room_code_rejected() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let _rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    assert_eq!(
        coordinator.create_room(2, Some("ABCDEF".into())).unwrap_err(),
        ValidationError::RoomCodeTaken {
            code: "ABCDEF".into()
        }
    );
}

#[tokio::test]
async fn test_join_unknown_room_fails() {
    let coordinator = Coordinator::new();
    let _rx = connect(&coordinator, 1);
    assert_eq!(
        coordinator.join_room(1, "NOSUCH").unwrap_err(),
        ValidationError::RoomNotFound {
            code: "NOSUCH".into()
        }
    );
}

#[tokio::test]
async fn test_join_starts_game_for_both() {
    let coordinator = Coordinator::new();
    let mut rx_a = connect(&coordinator, 1);
    let mut rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    let mark = coordinator.join_room(2, "ABCDEF").unwrap();
    assert_eq!(mark, Mark::O);

    let to_a = drain(&mut rx_a);
    assert!(to_a.contains(&ServerMessage::GameStart {
        room_code: "ABCDEF".into(),
        player_symbol: Mark::X,
        players: vec!["1".into(), "2".into()],
        current_turn: Mark::X,
    }));
    let to_b = drain(&mut rx_b);
    assert!(to_b.contains(&ServerMessage::GameStart {
        room_code: "ABCDEF".into(),
        player_symbol: Mark::O,
        players: vec!["1".into(), "2".into()],
        current_turn: Mark::X,
    }));
}

#[tokio::test]
async fn test_third_join_rejected_while_both_live() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let _rx_b = connect(&coordinator, 2);
    let _rx_c = connect(&coordinator, 3);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();
    assert_eq!(
        coordinator.join_room(3, "ABCDEF").unwrap_err(),
        ValidationError::RoomFull {
            code: "ABCDEF".into()
        }
    );
}

#[tokio::test]
async fn test_dead_slot_taken_over_on_join() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let rx_b = connect(&coordinator, 2);
    let _rx_c = connect(&coordinator, 3);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();
    drop(rx_b); // B's connection goes dead without a clean leave
    assert_eq!(coordinator.join_room(3, "ABCDEF").unwrap(), Mark::O);
}

#[tokio::test]
async fn test_move_broadcast_carries_authoritative_state() {
    let coordinator = Coordinator::new();
    let mut rx_a = connect(&coordinator, 1);
    let mut rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();
    drain(&mut rx_a);
    drain(&mut rx_b);

    coordinator.make_move(1, 4, Mark::X).unwrap();

    let mut expected_board = vec![None; 9];
    expected_board[4] = Some(Mark::X);
    let expected = ServerMessage::MoveMade {
        position: 4,
        symbol: Mark::X,
        board: expected_board,
        current_turn: Mark::O,
    };
    assert_eq!(drain(&mut rx_a), vec![expected.clone()]);
    assert_eq!(drain(&mut rx_b), vec![expected]);
}

#[tokio::test]
async fn test_out_of_turn_move_rejected_regardless_of_arrival_order() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let _rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();

    // O's move arrives first: rejected while the turn is X's.
    assert_eq!(
        coordinator.make_move(2, 0, Mark::O).unwrap_err(),
        ValidationError::NotYourTurn
    );
    coordinator.make_move(1, 0, Mark::X).unwrap();
}

#[tokio::test]
async fn test_concurrent_moves_apply_exactly_one_per_turn() {
    let coordinator = Coordinator::new();
    let mut rx_a = connect(&coordinator, 1);
    let _rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();
    drain(&mut rx_a);

    // Both participants race a move for the same cell.
    let c1 = coordinator.clone();
    let c2 = coordinator.clone();
    let a = tokio::task::spawn_blocking(move || c1.make_move(1, 0, Mark::X));
    let b = tokio::task::spawn_blocking(move || c2.make_move(2, 0, Mark::O));
    let result_a = a.await.unwrap();
    let result_b = b.await.unwrap();

    // The turn check and mutation are atomic per room: X's move is the
    // only one that can land on cell 0.
    assert!(result_a.is_ok());
    assert!(matches!(
        result_b,
        Err(ValidationError::NotYourTurn) | Err(ValidationError::Move(MoveError::CellOccupied { .. }))
    ));
    let updates = drain(&mut rx_a);
    let applied = updates
        .iter()
        .filter(|m| matches!(m, ServerMessage::MoveMade { .. }))
        .count();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn test_symbol_must_match_binding() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let _rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();
    assert_eq!(
        coordinator.make_move(1, 0, Mark::O).unwrap_err(),
        ValidationError::SymbolMismatch
    );
}

#[tokio::test]
async fn test_moves_rejected_before_opponent_joins() {
    let coordinator = Coordinator::new();
    let _rx = connect(&coordinator, 1);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    assert_eq!(
        coordinator.make_move(1, 0, Mark::X).unwrap_err(),
        ValidationError::MatchNotStarted
    );
}

#[tokio::test]
async fn test_terminal_move_broadcasts_game_over_and_ends_room() {
    let coordinator = Coordinator::new();
    let mut rx_a = connect(&coordinator, 1);
    let mut rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();

    // X: 0, 1, 2 wins the top row.
    coordinator.make_move(1, 0, Mark::X).unwrap();
    coordinator.make_move(2, 4, Mark::O).unwrap();
    coordinator.make_move(1, 1, Mark::X).unwrap();
    coordinator.make_move(2, 5, Mark::O).unwrap();
    coordinator.make_move(1, 2, Mark::X).unwrap();

    for rx in [&mut rx_a, &mut rx_b] {
        let messages = drain(rx);
        assert!(messages.contains(&ServerMessage::GameOver {
            winner: Some(Mark::X)
        }));
    }
    // The room has ended; nothing further is accepted.
    assert_eq!(
        coordinator.make_move(2, 8, Mark::O).unwrap_err(),
        ValidationError::Move(MoveError::MatchOver)
    );
}

#[tokio::test]
async fn test_first_matchmaking_request_waits() {
    let coordinator = Coordinator::new();
    let mut rx = connect(&coordinator, 1);
    coordinator.enqueue_random_match(1).unwrap();
    assert_eq!(drain(&mut rx), vec![ServerMessage::WaitingForMatch]);
}

#[tokio::test]
async fn test_second_matchmaking_request_pairs_with_earliest() {
    let coordinator = Coordinator::new();
    let mut rx_a = connect(&coordinator, 1);
    let mut rx_b = connect(&coordinator, 2);
    coordinator.enqueue_random_match(1).unwrap();
    drain(&mut rx_a);
    coordinator.enqueue_random_match(2).unwrap();

    // The queued identity gets the first mark.
    let to_a = drain(&mut rx_a);
    assert!(matches!(
        to_a.as_slice(),
        [ServerMessage::GameStart {
            player_symbol: Mark::X,
            current_turn: Mark::X,
            ..
        }]
    ));
    let to_b = drain(&mut rx_b);
    assert!(matches!(
        to_b.as_slice(),
        [ServerMessage::GameStart {
            player_symbol: Mark::O,
            ..
        }]
    ));
}

#[tokio::test]
async fn test_dead_identities_pruned_from_queue() {
    let coordinator = Coordinator::new();
    let rx_a = connect(&coordinator, 1);
    let mut rx_b = connect(&coordinator, 2);
    coordinator.enqueue_random_match(1).unwrap();
    drop(rx_a); // queued identity goes dead
    coordinator.enqueue_random_match(2).unwrap();
    // No pairing with the dead identity: B waits instead.
    assert_eq!(drain(&mut rx_b), vec![ServerMessage::WaitingForMatch]);
}

#[tokio::test]
async fn test_leave_notifies_remaining_participant() {
    let coordinator = Coordinator::new();
    let mut rx_a = connect(&coordinator, 1);
    let mut rx_b = connect(&coordinator, 2);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();
    drain(&mut rx_a);
    drain(&mut rx_b);

    coordinator.leave_room(2).unwrap();
    assert_eq!(drain(&mut rx_a), vec![ServerMessage::PlayerLeft]);
    // B no longer belongs to a room.
    assert_eq!(
        coordinator.make_move(2, 0, Mark::O).unwrap_err(),
        ValidationError::NotInRoom
    );
}

#[tokio::test]
async fn test_room_deleted_once_empty() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let _rx_b = connect(&coordinator, 2);
    let _rx_c = connect(&coordinator, 3);
    coordinator.create_room(1, Some("ABCDEF".into())).unwrap();
    coordinator.join_room(2, "ABCDEF").unwrap();
    coordinator.leave_room(1).unwrap();
    coordinator.leave_room(2).unwrap();
    assert_eq!(
        coordinator.join_room(3, "ABCDEF").unwrap_err(),
        ValidationError::RoomNotFound {
            code: "ABCDEF".into()
        }
    );
}

#[tokio::test]
async fn test_disconnect_removes_identity_from_queue() {
    let coordinator = Coordinator::new();
    let _rx_a = connect(&coordinator, 1);
    let mut rx_b = connect(&coordinator, 2);
    coordinator.enqueue_random_match(1).unwrap();
    coordinator.disconnect(1);
    coordinator.enqueue_random_match(2).unwrap();
    assert_eq!(drain(&mut rx_b), vec![ServerMessage::WaitingForMatch]);
}

#[tokio::test]
async fn test_dispatch_routes_client_messages() {
    let coordinator = Coordinator::new();
    let mut rx = connect(&coordinator, 1);
    coordinator
        .handle(
            1,
            ClientMessage::CreateRoom {
                room_code: Some("ABCDEF".into()),
            },
        )
        .unwrap();
    assert_eq!(
        drain(&mut rx),
        vec![ServerMessage::RoomCreated {
            room_code: "ABCDEF".into()
        }]
    );
}
