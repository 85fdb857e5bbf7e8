//! Developer console on stdin.
//!
//! A background thread reads lines, parses them into [`ConsoleCommand`]s and
//! posts them over a channel. The engine drains the channel at the start of
//! each frame, so commands always run on the frame thread.
//!
//! ```text
//! >>> player.hp             read an attribute
//! >>> player.hp = 55        write one (JSON, or a bare string)
//! >>> set player.name "Ann"
//! >>> scene menu
//! >>> debug on
//! >>> save | load | restart() | kill()
//! ```

use crossbeam_channel::{unbounded, Receiver, TryIter};
use serde_json::Value;
use std::io::{self, BufRead};
use std::thread;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Quit,
    Restart,
    Get(String),
    Set(String, Value),
    Save,
    Load,
    Debug(bool),
    Scene(String),
    Help,
}

pub const HELP: &str = "commands: <path> | get <path> | set <path> <json> | <path> = <json> | \
save | load | debug on|off | scene <name> | restart() | kill() | help";

fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn is_path(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .split('.')
            .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

fn require_path(raw: &str) -> Result<String, String> {
    let raw = raw.trim();
    if is_path(raw) {
        Ok(raw.to_string())
    } else {
        Err(format!("Invalid attribute path '{raw}'"))
    }
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err("Empty command".to_string());
    }

    match line {
        "kill()" | "quit" | "exit" => return Ok(ConsoleCommand::Quit),
        "restart()" | "restart" => return Ok(ConsoleCommand::Restart),
        "save" => return Ok(ConsoleCommand::Save),
        "load" => return Ok(ConsoleCommand::Load),
        "help" | "?" => return Ok(ConsoleCommand::Help),
        _ => {}
    }

    if !line.starts_with("set ") {
        if let Some((lhs, rhs)) = line.split_once('=') {
            return Ok(ConsoleCommand::Set(require_path(lhs)?, parse_value(rhs)));
        }
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "get" => Ok(ConsoleCommand::Get(require_path(rest)?)),
        "set" => {
            let (path, value) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "Usage: set <path> <value>".to_string())?;
            Ok(ConsoleCommand::Set(require_path(path)?, parse_value(value)))
        }
        "debug" => match rest {
            "on" | "true" | "1" => Ok(ConsoleCommand::Debug(true)),
            "off" | "false" | "0" => Ok(ConsoleCommand::Debug(false)),
            _ => Err("Usage: debug on|off".to_string()),
        },
        "scene" if !rest.is_empty() => Ok(ConsoleCommand::Scene(rest.to_string())),
        "scene" => Err("Usage: scene <name>".to_string()),
        _ if rest.is_empty() && is_path(word) => Ok(ConsoleCommand::Get(word.to_string())),
        _ => Err(format!("Unknown command '{line}'")),
    }
}

pub struct Console {
    rx: Receiver<ConsoleCommand>,
}

impl Console {
    /// Start reading commands from stdin.
    pub fn spawn() -> io::Result<Self> {
        Self::spawn_reader(io::BufReader::new(io::stdin()))
    }

    /// Start reading commands from any line source. The thread ends on EOF,
    /// a read error, after posting `Quit`/`Restart`, or once the console is
    /// dropped.
    pub fn spawn_reader<R>(reader: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("nova-console".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::error!(target: "Console", "Failed to read input: {}", e);
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Ok(cmd) => {
                            let last = matches!(cmd, ConsoleCommand::Quit | ConsoleCommand::Restart);
                            if tx.send(cmd).is_err() || last {
                                break;
                            }
                        }
                        Err(e) => log::error!(target: "Console", "{}", e),
                    }
                }
                log::debug!(target: "Console", "Input closed");
            })?;
        Ok(Self { rx })
    }

    pub fn try_iter(&self) -> TryIter<'_, ConsoleCommand> {
        self.rx.try_iter()
    }

    /// Every command posted since the last call.
    pub fn drain(&self) -> Vec<ConsoleCommand> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn parses_lifecycle_commands() {
        assert_eq!(parse_command("kill()"), Ok(ConsoleCommand::Quit));
        assert_eq!(parse_command(" quit "), Ok(ConsoleCommand::Quit));
        assert_eq!(parse_command("restart()"), Ok(ConsoleCommand::Restart));
        assert_eq!(parse_command("save"), Ok(ConsoleCommand::Save));
        assert_eq!(parse_command("load"), Ok(ConsoleCommand::Load));
        assert_eq!(parse_command("help"), Ok(ConsoleCommand::Help));
    }

    #[test]
    fn parses_attribute_access() {
        assert_eq!(
            parse_command("player.hp"),
            Ok(ConsoleCommand::Get("player.hp".into()))
        );
        assert_eq!(
            parse_command("get player.hp"),
            Ok(ConsoleCommand::Get("player.hp".into()))
        );
        assert_eq!(
            parse_command("player.hp = 55"),
            Ok(ConsoleCommand::Set("player.hp".into(), json!(55)))
        );
        assert_eq!(
            parse_command("set player.pos [1, 2]"),
            Ok(ConsoleCommand::Set("player.pos".into(), json!([1, 2])))
        );
    }

    #[test]
    fn non_json_values_become_strings() {
        assert_eq!(
            parse_command("player.name = Ann"),
            Ok(ConsoleCommand::Set("player.name".into(), json!("Ann")))
        );
    }

    #[test]
    fn parses_toggles_and_scenes() {
        assert_eq!(parse_command("debug on"), Ok(ConsoleCommand::Debug(true)));
        assert_eq!(parse_command("debug off"), Ok(ConsoleCommand::Debug(false)));
        assert!(parse_command("debug maybe").is_err());
        assert_eq!(
            parse_command("scene main menu"),
            Ok(ConsoleCommand::Scene("main menu".into()))
        );
        assert!(parse_command("scene").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_command("").is_err());
        assert!(parse_command("import os").is_err());
        assert!(parse_command("a..b = 1").is_err());
        assert!(parse_command("set player.hp").is_err());
    }

    #[test]
    fn reader_thread_skips_bad_lines_and_stops_at_quit() {
        let input = Cursor::new("player.hp\n\nimport os\ndebug on\nkill()\nsave\n");
        let console = Console::spawn_reader(input).expect("spawn");

        let mut got = Vec::new();
        for _ in 0..200 {
            got.extend(console.drain());
            if got.last() == Some(&ConsoleCommand::Quit) {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(
            got,
            vec![
                ConsoleCommand::Get("player.hp".into()),
                ConsoleCommand::Debug(true),
                ConsoleCommand::Quit,
            ]
        );
    }
}
