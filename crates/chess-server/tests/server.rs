//! End-to-end tests: a real server on an ephemeral port and raw TCP clients.

use chess_core::{Color, Move, Piece};
use chess_engine::{render_board, Position, BOARD_TEXT_LEN};
use chess_server::protocol;
use chess_server::{GameStatus, Lobby, Server, ServerConfig};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn config() -> ServerConfig {
    ServerConfig {
        port: 0,
        bind: "127.0.0.1".to_string(),
        ..ServerConfig::default()
    }
}

/// Starts a server with no operator console.
async fn start(config: ServerConfig) -> (SocketAddr, Arc<Lobby>) {
    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let lobby = server.lobby();
    tokio::spawn(server.run(tokio::io::empty()));
    (addr, lobby)
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connects and consumes the welcome line.
    async fn connect(addr: SocketAddr) -> Client {
        let mut client = Client::raw(addr).await;
        assert_eq!(client.line().await, protocol::ACCEPTED);
        client
    }

    async fn raw(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Client {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(format!("{}\n", line).as_bytes()).await;
    }

    /// Writes bytes as they are, without adding a newline.
    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    /// Next line including its newline; empty at end of stream.
    async fn line(&mut self) -> String {
        let mut line = String::new();
        timeout(WAIT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        line
    }

    async fn board(&mut self) -> String {
        let mut buf = vec![0; BOARD_TEXT_LEN];
        timeout(WAIT, self.reader.read_exact(&mut buf))
            .await
            .expect("timed out waiting for a board")
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    async fn byte(&mut self) -> u8 {
        timeout(WAIT, self.reader.read_u8())
            .await
            .expect("timed out waiting for a byte")
            .unwrap()
    }

    async fn assert_closed(&mut self) {
        assert_eq!(self.line().await, "");
    }

    /// Checks that the previous command produced no reply by sending an
    /// unknown lobby command and expecting its reply next.
    async fn assert_quiet(&mut self) {
        self.send("bogus").await;
        assert_eq!(self.line().await, protocol::UNRECOGNIZED);
    }
}

/// Seats two clients in a fresh game and returns them as (white, black).
async fn start_game(addr: SocketAddr, id: usize) -> (Client, Client) {
    let mut a = Client::connect(addr).await;
    let mut b = Client::connect(addr).await;
    a.send("newgame").await;
    assert_eq!(a.line().await, protocol::GAME_CREATED);
    b.send(&format!("joinplay {}", id)).await;

    let a_board = a.board().await;
    let a_start = a.line().await;
    let b_board = b.board().await;
    let b_start = b.line().await;

    let start = Position::startpos();
    if a_start == protocol::STARTED_WHITE {
        assert_eq!(b_start, protocol::STARTED_BLACK);
        assert_eq!(a_board, render_board(&start, Color::White));
        assert_eq!(b_board, render_board(&start, Color::Black));
        (a, b)
    } else {
        assert_eq!(a_start, protocol::STARTED_BLACK);
        assert_eq!(b_start, protocol::STARTED_WHITE);
        assert_eq!(a_board, render_board(&start, Color::Black));
        assert_eq!(b_board, render_board(&start, Color::White));
        (b, a)
    }
}

/// Plays a legal move and drains the board it produces for both players.
async fn play(mover: &mut Client, other: &mut Client, m: &str) {
    mover.send(&format!("move {}", m)).await;
    mover.board().await;
    other.board().await;
}

#[tokio::test]
async fn welcome_and_unknown_commands() {
    let (addr, _) = start(config()).await;
    let mut client = Client::connect(addr).await;

    client.send("dance").await;
    assert_eq!(client.line().await, protocol::UNRECOGNIZED);

    client.send("help").await;
    assert_eq!(client.line().await, "Lobby commands:\n");
}

#[tokio::test]
async fn full_server_turns_clients_away() {
    let (addr, _) = start(ServerConfig {
        max_connections: 1,
        ..config()
    })
    .await;

    let _first = Client::connect(addr).await;
    let mut second = Client::raw(addr).await;
    assert_eq!(second.line().await, protocol::SERVER_FULL);
    second.assert_closed().await;
}

#[tokio::test]
async fn lobby_disconnect() {
    let (addr, lobby) = start(config()).await;
    let mut client = Client::connect(addr).await;
    client.send("disconnect").await;
    assert_eq!(client.line().await, protocol::DISCONNECTED);
    client.assert_closed().await;
    assert!(lobby.snapshot().await.lobby.is_empty());
}

#[tokio::test]
async fn listgames_reports_counts() {
    let (addr, _) = start(config()).await;
    let mut client = Client::connect(addr).await;

    client.send("listgames").await;
    assert_eq!(client.line().await, protocol::GAME_LIST_HEADER);
    client.assert_quiet().await;

    let mut host = Client::connect(addr).await;
    host.send("newgame").await;
    assert_eq!(host.line().await, protocol::GAME_CREATED);

    client.send("listgames").await;
    assert_eq!(client.line().await, protocol::GAME_LIST_HEADER);
    assert_eq!(client.line().await, "0: 1/2, 0/8\n");
    client.assert_quiet().await;
}

#[tokio::test]
async fn too_many_games() {
    let (addr, _) = start(ServerConfig {
        max_games: 1,
        ..config()
    })
    .await;

    let mut a = Client::connect(addr).await;
    let mut b = Client::connect(addr).await;
    a.send("newgame").await;
    assert_eq!(a.line().await, protocol::GAME_CREATED);
    b.send("newgame").await;
    assert_eq!(b.line().await, protocol::TOO_MANY_GAMES);
}

#[tokio::test]
async fn joinplay_errors() {
    let (addr, _) = start(config()).await;
    let mut client = Client::connect(addr).await;

    client.send("joinplay").await;
    assert_eq!(client.line().await, protocol::NO_WAITING_GAME);
    client.send("joinplay 3").await;
    assert_eq!(client.line().await, protocol::NO_SUCH_GAME);
    client.send("joinplay three").await;
    assert_eq!(client.line().await, protocol::BAD_NUMBER);
    client.send("joinplay 8").await;
    assert_eq!(client.line().await, protocol::BAD_NUMBER);

    let (_white, _black) = start_game(addr, 0).await;
    client.send("joinplay 0").await;
    assert_eq!(client.line().await, protocol::NOT_WAITING);
}

#[tokio::test]
async fn joinplay_without_id_takes_first_waiting_game() {
    let (addr, lobby) = start(config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    host.send("newgame").await;
    assert_eq!(host.line().await, protocol::GAME_CREATED);
    guest.send("joinplay").await;
    guest.board().await;
    let started = guest.line().await;
    assert!(started == protocol::STARTED_WHITE || started == protocol::STARTED_BLACK);

    let snapshot = lobby.snapshot().await;
    let game = snapshot.game(0).unwrap();
    assert_eq!(game.status, GameStatus::Ongoing);
    assert_eq!(game.players.len(), 2);
}

#[tokio::test]
async fn joinplay_reads_id_from_waiting_next_line() {
    let (addr, _) = start(config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    host.send("newgame").await;
    assert_eq!(host.line().await, protocol::GAME_CREATED);
    guest.send("joinplay\n0").await;
    guest.board().await;
    let started = guest.line().await;
    assert!(started == protocol::STARTED_WHITE || started == protocol::STARTED_BLACK);
}

#[tokio::test]
async fn spectators_join_watch_and_leave() {
    let (addr, _) = start(ServerConfig {
        max_spectators: 1,
        ..config()
    })
    .await;

    let mut watcher = Client::connect(addr).await;
    watcher.send("joinspec").await;
    assert_eq!(watcher.line().await, protocol::SPECTATE_NEEDS_ID);
    watcher.send("joinspec 0").await;
    assert_eq!(watcher.line().await, protocol::NO_SUCH_GAME);

    let mut host = Client::connect(addr).await;
    host.send("newgame").await;
    assert_eq!(host.line().await, protocol::GAME_CREATED);

    watcher.send("joinspec 0").await;
    assert_eq!(watcher.line().await, "You are now spectating game 0.\n");
    assert_eq!(
        watcher.board().await,
        render_board(&Position::startpos(), Color::White)
    );

    let mut late = Client::connect(addr).await;
    late.send("joinspec 0").await;
    assert_eq!(late.line().await, protocol::TOO_MANY_SPECTATORS);

    let mut guest = Client::connect(addr).await;
    guest.send("joinplay 0").await;
    host.board().await;
    let host_start = host.line().await;
    guest.board().await;
    guest.line().await;
    watcher.board().await;
    assert_eq!(watcher.line().await, protocol::STARTED_SPECTATOR);

    let (mut white, mut black) = if host_start == protocol::STARTED_WHITE {
        (host, guest)
    } else {
        (guest, host)
    };

    white.send("move e2e4").await;
    white.board().await;
    black.board().await;
    let mut after = Position::startpos();
    after.apply_move(Move::from_coordinate("e2e4").unwrap());
    assert_eq!(watcher.board().await, render_board(&after, Color::White));

    watcher.send("move e7e5").await;
    assert_eq!(watcher.line().await, protocol::UNRECOGNIZED);

    watcher.send("disconnect").await;
    assert_eq!(watcher.line().await, protocol::DISCONNECTED);
    watcher.assert_closed().await;

    late.send("joinspec 0").await;
    assert_eq!(late.line().await, "You are now spectating game 0.\n");
    assert_eq!(late.board().await, render_board(&after, Color::White));
}

#[tokio::test]
async fn fools_mate_ends_the_game() {
    let (addr, lobby) = start(config()).await;
    let (mut white, mut black) = start_game(addr, 0).await;

    play(&mut white, &mut black, "f2f3").await;
    play(&mut black, &mut white, "e7e5").await;
    play(&mut white, &mut black, "g2g4").await;
    play(&mut black, &mut white, "d8h4").await;

    assert_eq!(white.line().await, "Black wins by checkmate!\n");
    assert_eq!(black.line().await, "Black wins by checkmate!\n");
    white.assert_closed().await;
    black.assert_closed().await;

    let snapshot = lobby.snapshot().await;
    assert_eq!(snapshot.game(0).unwrap().status, GameStatus::Completed);
}

#[tokio::test]
async fn move_errors() {
    let (addr, _) = start(config()).await;
    let (mut white, mut black) = start_game(addr, 0).await;

    white.send("move").await;
    assert_eq!(white.line().await, protocol::MOVE_MISSING);
    white.send("move e2").await;
    assert_eq!(white.line().await, protocol::MOVE_UNREADABLE);
    white.send("move z9e4").await;
    assert_eq!(white.line().await, protocol::MOVE_INVALID);
    white.send("move e2e5").await;
    assert_eq!(white.line().await, protocol::ILLEGAL_MOVE);
    black.send("move e7e5").await;
    assert_eq!(black.line().await, protocol::NOT_YOUR_TURN);

    // Unknown player commands get no reply.
    white.send("draw").await;
    white.send("move e2e4").await;
    white.board().await;
    black.board().await;
}

#[tokio::test]
async fn listmoves_ends_with_nul() {
    let (addr, _) = start(config()).await;
    let (mut white, _black) = start_game(addr, 0).await;

    white.send("listmoves").await;
    assert_eq!(white.line().await, protocol::LEGAL_MOVES_HEADER);
    let mut moves = HashSet::new();
    for _ in 0..20 {
        let line = white.line().await;
        assert_eq!(line.len(), 5, "{:?}", line);
        moves.insert(line.trim_end().to_string());
    }
    assert_eq!(white.byte().await, 0);
    assert_eq!(moves.len(), 20);
    assert!(moves.contains("e2e4"));
    assert!(moves.contains("g1f3"));
}

#[tokio::test]
async fn messages_reach_everyone_else() {
    let (addr, _) = start(config()).await;
    let (mut white, mut black) = start_game(addr, 0).await;

    let mut watcher = Client::connect(addr).await;
    watcher.send("joinspec 0").await;
    watcher.line().await;
    watcher.board().await;

    white.send("message good luck").await;
    assert_eq!(black.line().await, "W says: good luck\n");
    assert_eq!(watcher.line().await, "W says: good luck\n");

    black.send("message you too").await;
    assert_eq!(white.line().await, "B says: you too\n");
    assert_eq!(watcher.line().await, "B says: you too\n");
}

#[tokio::test]
async fn resignation() {
    let (addr, _) = start(config()).await;
    let (mut white, mut black) = start_game(addr, 0).await;

    white.send("resign").await;
    assert_eq!(white.line().await, "Black wins by resignation.\n");
    assert_eq!(black.line().await, "Black wins by resignation.\n");
    white.assert_closed().await;
    black.assert_closed().await;

    let mut late = Client::connect(addr).await;
    late.send("joinspec 0").await;
    assert_eq!(late.line().await, protocol::GAME_FINISHED);
}

#[tokio::test]
async fn player_disconnect_ends_the_game() {
    let (addr, _) = start(config()).await;
    let (white, mut black) = start_game(addr, 0).await;

    drop(white);
    assert_eq!(
        black.line().await,
        "Uh oh. Someone disconnected! The game is now over.\n"
    );
    black.assert_closed().await;
}

#[tokio::test]
async fn completed_slot_is_reused() {
    let (addr, _) = start(ServerConfig {
        max_games: 1,
        ..config()
    })
    .await;

    let (mut white, mut black) = start_game(addr, 0).await;
    black.send("resign").await;
    assert_eq!(white.line().await, "White wins by resignation.\n");

    let mut observer = Client::connect(addr).await;
    observer.send("listgames").await;
    assert_eq!(observer.line().await, protocol::GAME_LIST_HEADER);
    assert_eq!(observer.line().await, "0: 0/2, 0/8\n");

    let (_white, _black) = start_game(addr, 0).await;
    observer.send("listgames").await;
    assert_eq!(observer.line().await, protocol::GAME_LIST_HEADER);
    assert_eq!(observer.line().await, "0: 2/2, 0/8\n");
}

#[tokio::test]
async fn every_connection_has_one_place() {
    let (addr, lobby) = start(config()).await;
    let (_white, _black) = start_game(addr, 0).await;
    let mut watcher = Client::connect(addr).await;
    watcher.send("joinspec 0").await;
    watcher.line().await;
    watcher.board().await;
    let _idle = Client::connect(addr).await;
    let mut host = Client::connect(addr).await;
    host.send("newgame").await;
    assert_eq!(host.line().await, protocol::GAME_CREATED);

    let snapshot = lobby.snapshot().await;
    let ids = snapshot.all_ids();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(unique.len(), ids.len());
    assert_eq!(snapshot.lobby.len(), 1);
    assert_eq!(snapshot.game(0).unwrap().spectators.len(), 1);
    assert_eq!(snapshot.game(1).unwrap().status, GameStatus::Waiting);
}

#[tokio::test]
async fn stalemate_ends_the_game() {
    let (addr, lobby) = start(config()).await;
    let (mut white, mut black) = start_game(addr, 0).await;

    let moves = [
        "e2e3", "a7a5", "d1h5", "a8a6", "h5a5", "h7h5", "h2h4", "a6h6", "a5c7", "f7f6", "c7d7",
        "e8f7", "d7b7", "d8d3", "b7b8", "d3h7", "b8c8", "f7g6", "c8e6",
    ];
    for (ply, m) in moves.iter().enumerate() {
        if ply % 2 == 0 {
            play(&mut white, &mut black, m).await;
        } else {
            play(&mut black, &mut white, m).await;
        }
    }

    assert_eq!(white.line().await, "The game is drawn by stalemate.\n");
    assert_eq!(black.line().await, "The game is drawn by stalemate.\n");
    white.assert_closed().await;
    black.assert_closed().await;

    let snapshot = lobby.snapshot().await;
    assert_eq!(snapshot.game(0).unwrap().status, GameStatus::Completed);
}

#[tokio::test]
async fn concurrent_commands_keep_one_king_each() {
    let (addr, lobby) = start(config()).await;
    let (white, black) = start_game(addr, 0).await;

    // Both sides fire moves, out-of-turn moves and move listings without
    // waiting for replies.
    let white_script = [
        "move g1f3", "listmoves", "move b1c3", "move f3g1", "listmoves", "move c3b1",
    ];
    let black_script = [
        "listmoves", "move g8f6", "move b8c6", "listmoves", "move f6g8", "move c6b8",
    ];

    let mut writers = Vec::new();
    let mut drains = Vec::new();
    for (client, script) in [(white, white_script), (black, black_script)] {
        let Client { mut reader, mut writer } = client;
        writers.push(tokio::spawn(async move {
            for _ in 0..10 {
                for line in script {
                    writer.write_all(format!("{}\n", line).as_bytes()).await.unwrap();
                    tokio::task::yield_now().await;
                }
            }
            writer
        }));
        drains.push(tokio::spawn(async move {
            let mut received = Vec::new();
            timeout(WAIT, reader.read_to_end(&mut received))
                .await
                .expect("game never closed the connection")
                .unwrap();
            String::from_utf8_lossy(&received).into_owned()
        }));
    }

    for _ in 0..50 {
        let snapshot = lobby.snapshot().await;
        let game = snapshot.game(0).unwrap();
        assert_eq!(game.status, GameStatus::Ongoing);
        for color in Color::ALL {
            assert_eq!(game.position.piece_count(Piece::King, color), 1);
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let mut white_writer = writers.remove(0).await.unwrap();
    let _black_writer = writers.remove(0).await.unwrap();
    white_writer.write_all(b"resign\n").await.unwrap();

    for drain in drains {
        let received = drain.await.unwrap();
        assert!(received.contains(protocol::LEGAL_MOVES_HEADER));
        assert!(received.ends_with("Black wins by resignation.\n"), "{:?}", received);
    }

    let snapshot = lobby.snapshot().await;
    let game = snapshot.game(0).unwrap();
    assert_eq!(game.status, GameStatus::Completed);
    for color in Color::ALL {
        assert_eq!(game.position.piece_count(Piece::King, color), 1);
    }
}

#[tokio::test]
async fn partial_line_does_not_stall_the_lobby() {
    let server = Server::bind(config()).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (console, mut operator) = tokio::io::duplex(64);
    let running = tokio::spawn(server.run(BufReader::new(console)));

    let mut slow = Client::connect(addr).await;
    slow.send_raw(b"listg").await;

    let mut other = Client::connect(addr).await;
    other.send("listgames").await;
    assert_eq!(other.line().await, protocol::GAME_LIST_HEADER);

    slow.send_raw(b"ames\n").await;
    assert_eq!(slow.line().await, protocol::GAME_LIST_HEADER);

    slow.send_raw(b"newg").await;
    operator.write_all(b"!exit\n").await.unwrap();
    timeout(WAIT, running).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn partial_line_does_not_stall_the_game() {
    let (addr, _) = start(config()).await;
    let (mut white, mut black) = start_game(addr, 0).await;

    white.send_raw(b"move e2").await;
    black.send("listmoves").await;
    assert_eq!(black.line().await, protocol::LEGAL_MOVES_HEADER);
    for _ in 0..20 {
        black.line().await;
    }
    assert_eq!(black.byte().await, 0);

    white.send_raw(b"e4\n").await;
    let mut after = Position::startpos();
    after.apply_move(Move::from_coordinate("e2e4").unwrap());
    assert_eq!(white.board().await, render_board(&after, Color::White));
    assert_eq!(black.board().await, render_board(&after, Color::Black));
}

#[tokio::test]
async fn idle_game_is_not_locked_between_commands() {
    let (addr, lobby) = start(ServerConfig {
        poll_timeout_ms: 60_000,
        ..config()
    })
    .await;
    let (mut white, mut black) = start_game(addr, 0).await;

    for _ in 0..5 {
        let snapshot = timeout(Duration::from_secs(1), lobby.snapshot())
            .await
            .expect("game lock held while waiting for input");
        assert_eq!(snapshot.game(0).unwrap().status, GameStatus::Ongoing);
    }

    play(&mut white, &mut black, "e2e4").await;
    let snapshot = timeout(Duration::from_secs(1), lobby.snapshot())
        .await
        .expect("game lock held while waiting for input");
    let position = &snapshot.game(0).unwrap().position;
    assert_eq!(position.side_to_move, Color::Black);
}

#[tokio::test]
async fn long_lines_are_cut() {
    let (addr, _) = start(config()).await;
    let (mut white, mut black) = start_game(addr, 0).await;

    let flood = format!("message {}\n", "x".repeat(200_000));
    white.send_raw(flood.as_bytes()).await;
    let relayed = black.line().await;
    assert_eq!(relayed, format!("W says: {}\n", "x".repeat(protocol::MAX_CHAT_LEN)));

    white.send("message still here").await;
    assert_eq!(black.line().await, "W says: still here\n");

    let mut idle = Client::connect(addr).await;
    idle.send_raw("y".repeat(100_000).as_bytes()).await;
    idle.send("").await;
    assert_eq!(idle.line().await, protocol::UNRECOGNIZED);
    idle.send("listgames").await;
    assert_eq!(idle.line().await, protocol::GAME_LIST_HEADER);
}

#[tokio::test]
async fn exit_command_stops_accepting() {
    let server = Server::bind(config()).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (console, mut operator) = tokio::io::duplex(64);
    let running = tokio::spawn(server.run(BufReader::new(console)));

    let _client = Client::connect(addr).await;
    operator.write_all(b"!exit\n").await.unwrap();
    timeout(WAIT, running).await.unwrap().unwrap().unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}
