//! Line protocol: command words, argument splitting and the fixed replies.
//!
//! Every client line starts with a command word. Whatever follows on the
//! same line is the argument; commands that need one and find nothing there
//! may take the next line, but only if it has already arrived.

use thiserror::Error;

pub const ACCEPTED: &str =
    "Connection accepted. Enter commands as you wish. Type \"help\" for help.\n";
pub const SERVER_FULL: &str = "We're full right now. Please try again later.\n";

pub const GAME_CREATED: &str = "Created a new game. Please wait for another player to join.\n";
pub const TOO_MANY_GAMES: &str = "There are too many ongoing games to start a new game.\n";
pub const BAD_NUMBER: &str = "An error occurred processing the given number.\n";
pub const NO_SUCH_GAME: &str = "There is no game with that number.\n";
pub const NOT_WAITING: &str =
    "This game doesn't need a player. Did you mean to join as a spectator?\n";
pub const NO_WAITING_GAME: &str = "There is no game waiting for a player.\n";
pub const SPECTATE_NEEDS_ID: &str = "Please provide the ID of the game you wish to spectate.\n";
pub const GAME_FINISHED: &str = "Sorry, but this game has already finished.\n";
pub const TOO_MANY_SPECTATORS: &str = "There are already too many users spectating this game.\n";
pub const GAME_LIST_HEADER: &str =
    "List of current games (ID: players/total, spectators/total):\n";
pub const DISCONNECTED: &str = "You have been successfully disconnected.\n";
pub const UNRECOGNIZED: &str = "Your command was not recognized.\n";

pub const LOBBY_HELP: &str = "\
Lobby commands:
  newgame           start a game and wait for an opponent
  joinplay [id]     join a waiting game (the first one if no id is given)
  joinspec <id>     watch a game
  listgames         show the current games
  disconnect        leave the server
In a game:
  move <e2e4>       play a move
  listmoves         show the legal moves
  message <text>    talk to the other player and the spectators
  resign            give up the game
";

pub const STARTED_WHITE: &str = "The game has started. You have the white pieces.\n";
pub const STARTED_BLACK: &str = "The game has started. You have the black pieces.\n";
pub const STARTED_SPECTATOR: &str = "The game has started.\n";
pub const MOVE_MISSING: &str = "Please include the move (e.g. e2e4 or g8f6).\n";
pub const MOVE_UNREADABLE: &str = "Could not process the given move.\n";
pub const MOVE_INVALID: &str = "Invalid move.\n";
pub const NOT_YOUR_TURN: &str = "It is not your turn.\n";
pub const ILLEGAL_MOVE: &str = "Illegal move.\n";
pub const LEGAL_MOVES_HEADER: &str = "List of legal moves:\n";

/// Ends a move listing.
pub const LIST_TERMINATOR: char = '\0';

/// A command sent from the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyCommand {
    NewGame,
    JoinPlay,
    JoinSpec,
    ListGames,
    Disconnect,
    Help,
    Unknown,
}

impl LobbyCommand {
    pub fn parse(word: &str) -> Self {
        match word {
            "newgame" => LobbyCommand::NewGame,
            "joinplay" => LobbyCommand::JoinPlay,
            "joinspec" => LobbyCommand::JoinSpec,
            "listgames" => LobbyCommand::ListGames,
            "disconnect" => LobbyCommand::Disconnect,
            "help" => LobbyCommand::Help,
            _ => LobbyCommand::Unknown,
        }
    }
}

/// A command sent by a seated player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Move,
    ListMoves,
    Message,
    Resign,
    /// Anything else; players get no reply for it.
    Other,
}

impl PlayerCommand {
    pub fn parse(word: &str) -> Self {
        match word {
            "move" => PlayerCommand::Move,
            "listmoves" => PlayerCommand::ListMoves,
            "message" => PlayerCommand::Message,
            "resign" => PlayerCommand::Resign,
            _ => PlayerCommand::Other,
        }
    }
}

/// A command sent by a spectator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectatorCommand {
    Disconnect,
    Unknown,
}

impl SpectatorCommand {
    pub fn parse(word: &str) -> Self {
        match word {
            "disconnect" => SpectatorCommand::Disconnect,
            _ => SpectatorCommand::Unknown,
        }
    }
}

/// Splits a line into its command word and the rest of the line.
///
/// Leading whitespace is skipped and the argument is trimmed; either part
/// may be empty.
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    }
}

/// A game id that is not a registry slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a game id below {capacity}: {text:?}")]
pub struct ParseGameIdError {
    pub text: String,
    pub capacity: usize,
}

/// Parses a game id and checks it against the registry capacity.
pub fn parse_game_id(text: &str, capacity: usize) -> Result<usize, ParseGameIdError> {
    match text.trim().parse::<usize>() {
        Ok(id) if id < capacity => Ok(id),
        _ => Err(ParseGameIdError {
            text: text.to_string(),
            capacity,
        }),
    }
}

/// One line of the game listing.
pub fn game_list_line(id: usize, players: usize, spectators: usize, max_spectators: usize) -> String {
    format!("{}: {}/2, {}/{}\n", id, players, spectators, max_spectators)
}

/// Longest chat text relayed, in bytes.
pub const MAX_CHAT_LEN: usize = 511;

/// A chat line as relayed to the other participants, with the text cut to
/// [`MAX_CHAT_LEN`] bytes.
pub fn chat_line(tag: char, text: &str) -> String {
    let mut end = text.len().min(MAX_CHAT_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{} says: {}\n", tag, &text[..end])
}

/// Confirmation sent to a new spectator, ahead of the board.
pub fn spectating(id: usize) -> String {
    format!("You are now spectating game {}.\n", id)
}
