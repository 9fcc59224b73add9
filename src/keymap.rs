//! Configurable key bindings for workspace commands.
//!
//! Navigation keys are fixed; the commands below can be rebound from the
//! `[bindings]` table of the settings file, e.g. `commit = ["c", "ctrl+k"]`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::error::ConfigError;

/// Commands that can be bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    AmendCommit,
    Commit,
    Stash,
    Ignore,
    NewBranch,
    DeleteBranch,
    Refresh,
    Quit,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::AmendCommit,
        Command::Commit,
        Command::Stash,
        Command::Ignore,
        Command::NewBranch,
        Command::DeleteBranch,
        Command::Refresh,
        Command::Quit,
    ];

    /// Name used in the settings file
    pub fn name(self) -> &'static str {
        match self {
            Command::AmendCommit => "amend_commit",
            Command::Commit => "commit",
            Command::Stash => "stash",
            Command::Ignore => "ignore",
            Command::NewBranch => "new_branch",
            Command::DeleteBranch => "delete_branch",
            Command::Refresh => "refresh",
            Command::Quit => "quit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::AmendCommit => "amend",
            Command::Commit => "commit",
            Command::Stash => "stash",
            Command::Ignore => "ignore",
            Command::NewBranch => "new branch",
            Command::DeleteBranch => "delete branch",
            Command::Refresh => "refresh",
            Command::Quit => "quit",
        }
    }

    fn default_keys(self) -> &'static [&'static str] {
        match self {
            Command::AmendCommit => &["a"],
            Command::Commit => &["c"],
            Command::Stash => &["s"],
            Command::Ignore => &["i"],
            Command::NewBranch => &["b"],
            Command::DeleteBranch => &["D"],
            Command::Refresh => &["r"],
            Command::Quit => &["q", "ctrl+c"],
        }
    }
}

/// A key with modifiers, as written in the settings file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn matches(&self, key: &KeyEvent) -> bool {
        // Terminals disagree about reporting shift with upper-case letters
        let strip = |m: KeyModifiers| match key.code {
            KeyCode::Char(_) => m.difference(KeyModifiers::SHIFT),
            _ => m,
        };
        self.code == key.code && strip(self.modifiers) == strip(key.modifiers)
    }
}

impl FromStr for KeyBinding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidKey(s.to_string());
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        // "ctrl++" binds the plus key
        if s.ends_with("++") {
            parts.pop();
            parts.pop();
            parts.push("+");
        }
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(invalid)?;

        let mut modifiers = KeyModifiers::NONE;
        for part in parts {
            modifiers |= match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return Err(invalid()),
            };
        }

        let mut chars = key.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => match key.to_ascii_lowercase().as_str() {
                "space" => KeyCode::Char(' '),
                "enter" | "return" => KeyCode::Enter,
                "tab" => KeyCode::Tab,
                "esc" | "escape" => KeyCode::Esc,
                "backspace" => KeyCode::Backspace,
                "delete" => KeyCode::Delete,
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                f if f.starts_with('f') => {
                    let n: u8 = f[1..].parse().map_err(|_| invalid())?;
                    KeyCode::F(n)
                }
                _ => return Err(invalid()),
            },
        };

        Ok(Self { code, modifiers })
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "alt+")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Tab => write!(f, "tab"),
            KeyCode::Esc => write!(f, "esc"),
            KeyCode::F(n) => write!(f, "f{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Lookup table from keys to commands
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<(KeyBinding, Command)>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::from_config(&BTreeMap::new())
    }
}

impl Keymap {
    /// Defaults, with each configured command's keys replacing its defaults.
    /// Unknown command names and unparseable keys are dropped with a warning.
    pub fn from_config(config: &BTreeMap<String, Vec<String>>) -> Self {
        for name in config.keys() {
            if Command::from_name(name).is_none() {
                warn!(action = %name, "Ignoring binding for unknown action");
            }
        }

        let mut bindings = Vec::new();
        for command in Command::ALL {
            let keys: Vec<&str> = match config.get(command.name()) {
                Some(keys) => keys.iter().map(String::as_str).collect(),
                None => command.default_keys().to_vec(),
            };
            for key in keys {
                match key.parse::<KeyBinding>() {
                    Ok(binding) => bindings.push((binding, command)),
                    Err(e) => warn!(action = command.name(), error = %e, "Ignoring binding"),
                }
            }
        }

        Self { bindings }
    }

    pub fn lookup(&self, key: &KeyEvent) -> Option<Command> {
        self.bindings
            .iter()
            .find(|(binding, _)| binding.matches(key))
            .map(|(_, command)| *command)
    }

    /// First key bound to `command`, for the help bar
    pub fn key_for(&self, command: Command) -> Option<KeyBinding> {
        self.bindings
            .iter()
            .find(|(_, c)| *c == command)
            .map(|(binding, _)| *binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_keys() {
        let k: KeyBinding = "ctrl+c".parse().unwrap();
        assert_eq!(k.code, KeyCode::Char('c'));
        assert_eq!(k.modifiers, KeyModifiers::CONTROL);

        assert_eq!(
            "space".parse::<KeyBinding>().unwrap().code,
            KeyCode::Char(' ')
        );
        assert_eq!("F5".parse::<KeyBinding>().unwrap().code, KeyCode::F(5));
        assert!("hyper+x".parse::<KeyBinding>().is_err());
        assert!("".parse::<KeyBinding>().is_err());
        assert!("bogus".parse::<KeyBinding>().is_err());
    }

    #[test]
    fn test_default_bindings() {
        let keymap = Keymap::default();
        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('c'), KeyModifiers::NONE)),
            Some(Command::Commit)
        );
        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
        // Upper-case letters match with or without a reported shift
        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('D'), KeyModifiers::SHIFT)),
            Some(Command::DeleteBranch)
        );
        assert_eq!(keymap.lookup(&key(KeyCode::Char('z'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_config_replaces_defaults() {
        let mut config = BTreeMap::new();
        config.insert("commit".to_string(), vec!["C".to_string()]);
        config.insert("push".to_string(), vec!["p".to_string()]);
        let keymap = Keymap::from_config(&config);

        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('C'), KeyModifiers::NONE)),
            Some(Command::Commit)
        );
        assert_eq!(keymap.lookup(&key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(keymap.lookup(&key(KeyCode::Char('p'), KeyModifiers::NONE)), None);
        assert_eq!(keymap.key_for(Command::Commit).unwrap().to_string(), "C");
    }
}
