//! Line-oriented command protocol for driving a [`GameSession`].
//!
//! The framing follows the Go Text Protocol: an optional numeric id, a
//! command and its arguments on one line; replies are `=id message` on
//! success or `?id message` on failure, each followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`,
//!   `known_command <cmd>`, `quit`
//! - `showboard` - Render the board with coordinate labels
//! - `play <vertex>` - Plain stone (only without cards)
//! - `hand` - List the acting hand as `id name stones`
//! - `select <id>` / `deselect` - Choose or abandon a card
//! - `place <vertex>` - Place a stone (toward the selected card in card mode)
//! - `discard <id>` - Discard a card and pass
//! - `playable` - Whether any card in hand fits the board
//! - `rules`, `add_rule <name>`, `remove_rule <name>`
//! - `export`, `import <json>` - State exchange as JSON
//!
//! ## Example
//!
//! ```ignore
//! use cardgo::game::{GameConfig, GameSession};
//! use cardgo::protocol::CommandEngine;
//! let mut engine = CommandEngine::new(GameSession::new(GameConfig::default())?);
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use crate::board::{parse_coord, str_coord};
use crate::cards::CardId;
use crate::game::{GameSession, GameState, PlaceOutcome};
use crate::rules::builtin;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "add_rule",
    "deselect",
    "discard",
    "export",
    "hand",
    "import",
    "known_command",
    "list_commands",
    "name",
    "place",
    "play",
    "playable",
    "protocol_version",
    "quit",
    "remove_rule",
    "rules",
    "select",
    "showboard",
    "version",
];

pub struct CommandEngine {
    game: GameSession,
}

impl CommandEngine {
    pub fn new(game: GameSession) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &GameSession {
        &self.game
    }

    /// Run the command loop on stdin and stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        self.serve(stdin.lock(), io::stdout())
    }

    /// Run the command loop until `quit` or end of input.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            write!(output, "{prefix}{id_str} {message}\n\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&name.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "showboard" => (true, self.render_board()),

            "play" => {
                if self.game.piles().is_some() {
                    return (false, "card mode: use select and place".to_string());
                }
                let (x, y) = match self.vertex(args) {
                    Ok(pt) => pt,
                    Err(msg) => return (false, msg),
                };
                match self.game.place_stone(x, y) {
                    Ok(outcome) => (true, self.captured(outcome.captures())),
                    Err(err) => (false, err.to_string()),
                }
            }

            "hand" => {
                let lines: Vec<String> = self
                    .game
                    .hand()
                    .iter()
                    .map(|c| format!("{} {} {}", c.id, c.name, c.required_stones()))
                    .collect();
                (true, lines.join("\n"))
            }

            "select" => {
                let id = match card_id(args) {
                    Ok(id) => id,
                    Err(msg) => return (false, msg),
                };
                match self.game.select_card(id) {
                    Ok(card) => (true, format!("{} {}", card.name, card.required_stones())),
                    Err(err) => (false, err.to_string()),
                }
            }

            "deselect" => {
                self.game.deselect_card();
                (true, String::new())
            }

            "place" => {
                let (x, y) = match self.vertex(args) {
                    Ok(pt) => pt,
                    Err(msg) => return (false, msg),
                };
                match self.game.place_stone(x, y) {
                    Ok(outcome) => (true, self.describe(&outcome)),
                    Err(err) => (false, err.to_string()),
                }
            }

            "discard" => {
                let id = match card_id(args) {
                    Ok(id) => id,
                    Err(msg) => return (false, msg),
                };
                match self.game.discard_card(id) {
                    Ok(Some(drawn)) => (true, format!("drew {} {}", drawn.id, drawn.name)),
                    Ok(None) => (true, String::new()),
                    Err(err) => (false, err.to_string()),
                }
            }

            "playable" => (true, self.game.can_play_any_card().to_string()),

            "rules" => (true, self.game.rules().names().join(" ")),

            "add_rule" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let Some(rule) = builtin(name) else {
                    return (false, format!("unknown rule: {name}"));
                };
                match self.game.add_rule(rule) {
                    Ok(()) => (true, String::new()),
                    Err(err) => (false, err.to_string()),
                }
            }

            "remove_rule" => {
                let Some(name) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                if self.game.remove_rule(name) {
                    (true, String::new())
                } else {
                    (false, format!("rule not registered: {name}"))
                }
            }

            "export" => match self.game.export_state().to_json() {
                Ok(json) => (true, json),
                Err(err) => (false, err.to_string()),
            },

            "import" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                let state = match GameState::from_json(&args.join(" ")) {
                    Ok(state) => state,
                    Err(err) => return (false, format!("bad state: {err}")),
                };
                match self.game.import_state(state) {
                    Ok(()) => (true, String::new()),
                    Err(err) => (false, err.to_string()),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn vertex(&self, args: &[&str]) -> Result<(usize, usize), String> {
        let vertex = args.first().ok_or("missing argument")?;
        parse_coord(vertex, self.game.board().size()).map_err(|e| e.to_string())
    }

    fn captured(&self, captures: &[(usize, usize)]) -> String {
        let size = self.game.board().size();
        captures
            .iter()
            .map(|&pt| str_coord(pt, size))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn describe(&self, outcome: &PlaceOutcome) -> String {
        match outcome {
            PlaceOutcome::Played { captures } => self.captured(captures),
            PlaceOutcome::InProgress {
                placed, required, ..
            } => format!("{placed}/{required}"),
            PlaceOutcome::Complete {
                card,
                valid_pattern,
                ..
            } => {
                let verdict = if *valid_pattern { "complete" } else { "invalid" };
                format!("{verdict} {}", card.name)
            }
        }
    }

    /// Board with column letters on top and row numbers on the left.
    fn render_board(&self) -> String {
        let board = self.game.board();
        let size = board.size();
        let mut out = String::from("\n   ");
        for x in 0..size {
            out.push((b'A' + x as u8) as char);
            out.push(' ');
        }
        out.push('\n');
        for (y, row) in board.to_string().lines().enumerate() {
            out.push_str(&format!("{:>2} {row}\n", size - y));
        }
        out.push_str(&format!("{} to move", self.game.current_player()));
        out
    }
}

fn card_id(args: &[&str]) -> Result<CardId, String> {
    let raw = args.first().ok_or("missing argument")?;
    raw.parse().map_err(|_| format!("invalid card id: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;

    fn engine(card_mode: bool) -> CommandEngine {
        let game = GameSession::new(GameConfig {
            card_mode,
            ..GameConfig::default()
        })
        .unwrap();
        CommandEngine::new(game)
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = CommandEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = CommandEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut engine = engine(true);
        let (success, response) = engine.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "cardgo");
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine(true);

        let (success, response) = engine.execute("known_command", &["place"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = engine.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_play_without_cards() {
        let mut engine = engine(false);
        let (success, _) = engine.execute("play", &["E5"]);
        assert!(success);
        let (success, response) = engine.execute("play", &["E5"]);
        assert!(!success);
        assert_eq!(response, "illegal move: point not empty");
        let (success, _) = engine.execute("play", &["Z5"]);
        assert!(!success);
    }

    #[test]
    fn test_showboard_labels() {
        let mut engine = engine(false);
        engine.execute("play", &["E5"]);
        let (success, response) = engine.execute("showboard", &[]);
        assert!(success);
        let lines: Vec<&str> = response.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[1].trim_end(), "   A B C D E F G H I");
        assert_eq!(lines[6].trim_end(), " 5 . . . . X . . . .");
        assert!(lines[11].ends_with("to move"));
    }

    #[test]
    fn test_card_flow() {
        let mut engine = engine(true);
        let (success, _) = engine.execute("place", &["E5"]);
        assert!(!success);
        let id = engine.game().hand()[0].id.to_string();
        let (success, _) = engine.execute("select", &[&id]);
        assert!(success);
        let (success, response) = engine.execute("place", &["E5"]);
        assert!(success, "{response}");
        assert_eq!(engine.game().board().stone_count(), 1);
    }

    #[test]
    fn test_rules_management() {
        let mut engine = engine(true);
        assert_eq!(
            engine.execute("rules", &[]),
            (true, "no-suicide ko turn-order".to_string())
        );
        assert!(engine.execute("remove_rule", &["ko"]).0);
        assert!(!engine.execute("remove_rule", &["ko"]).0);
        assert!(engine.execute("add_rule", &["ko"]).0);
        assert!(!engine.execute("add_rule", &["ko"]).0);
        assert!(!engine.execute("add_rule", &["superko"]).0);
    }

    #[test]
    fn test_serve_replies() {
        let mut engine = engine(false);
        let input = "1 name\n# comment\nplay D4\n2 quit\nname\n";
        let mut output = Vec::new();
        engine.serve(input.as_bytes(), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "=1 cardgo\n\n= \n\n=2 \n\n");
    }

    #[test]
    fn test_export_import() {
        let mut source = engine(false);
        source.execute("play", &["C3"]);
        let (success, json) = source.execute("export", &[]);
        assert!(success);
        let mut target = engine(false);
        let (success, response) = target.execute("import", &[&json]);
        assert!(success, "{response}");
        assert_eq!(target.game().board(), source.game().board());
    }
}
