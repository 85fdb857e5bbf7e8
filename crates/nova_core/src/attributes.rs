//! Dotted attribute paths resolved through an explicit accessor table.
//!
//! A path such as `"player.money"` names a root (`player`) and a chain of
//! field accesses. Game state is an ordinary Rust struct, so every persisted
//! path is registered once with a reader and a mutator closure:
//!
//! ```ignore
//! registry
//!     .field("player.hp", |g: &Game| Some(&g.player.hp), |g| Some(&mut g.player.hp))?
//!     .field("boss.hp", |g: &Game| g.boss.as_ref().map(|b| &b.hp), |g| g.boss.as_mut().map(|b| &mut b.hp))?;
//! ```
//!
//! A closure returning `None` means the root or an intermediate field does
//! not currently exist; such paths are skipped, never treated as failures of
//! the whole save or load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AttributeError {
    #[error("attribute path is empty")]
    EmptyPath,
    #[error("attribute path '{0}' has an empty segment")]
    EmptySegment(String),
    #[error("attribute path '{0}' is not registered")]
    Unregistered(String),
    #[error("attribute path '{0}' does not resolve to a live field")]
    Unresolved(String),
    #[error("value for '{path}' does not fit the field: {source}")]
    TypeMismatch {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath {
    raw: String,
    segments: Vec<String>,
}

impl AttributePath {
    pub fn parse(raw: &str) -> Result<Self, AttributeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AttributeError::EmptyPath);
        }
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(AttributeError::EmptySegment(raw.to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every segment except the last, joined back with dots. `None` for a
    /// bare root.
    pub fn parent(&self) -> Option<String> {
        (self.segments.len() > 1).then(|| self.segments[..self.segments.len() - 1].join("."))
    }

    pub fn field(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

type Reader<S> = Box<dyn Fn(&S) -> Option<Value>>;
type Writer<S> = Box<dyn Fn(&mut S, &Value) -> Result<(), AttributeError>>;

struct Accessor<S> {
    path: AttributePath,
    read: Reader<S>,
    write: Writer<S>,
}

/// Table from dotted path to a reader/mutator pair over the state type `S`.
pub struct AttributeRegistry<S> {
    fields: Vec<Accessor<S>>,
    index: HashMap<String, usize>,
}

impl<S> AttributeRegistry<S> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register `path`. Re-registering a path replaces its accessors.
    pub fn field<T, G, M>(&mut self, path: &str, get: G, get_mut: M) -> Result<&mut Self, AttributeError>
    where
        S: 'static,
        T: Serialize + DeserializeOwned + 'static,
        G: Fn(&S) -> Option<&T> + 'static,
        M: Fn(&mut S) -> Option<&mut T> + 'static,
    {
        let path = AttributePath::parse(path)?;
        let key = path.as_str().to_string();

        let read_key = key.clone();
        let read: Reader<S> = Box::new(move |state: &S| {
            let value = get(state)?;
            match serde_json::to_value(value) {
                Ok(Value::Null) => None,
                Ok(v) => Some(v),
                Err(e) => {
                    log::warn!(target: "Attributes", "Cannot serialize '{}': {}", read_key, e);
                    None
                }
            }
        });

        let write_key = key.clone();
        let write: Writer<S> = Box::new(move |state: &mut S, value: &Value| {
            let target = get_mut(state).ok_or_else(|| AttributeError::Unresolved(write_key.clone()))?;
            *target = T::deserialize(value).map_err(|source| AttributeError::TypeMismatch {
                path: write_key.clone(),
                source,
            })?;
            Ok(())
        });

        let accessor = Accessor { path, read, write };
        match self.index.get(&key) {
            Some(&i) => self.fields[i] = accessor,
            None => {
                self.index.insert(key, self.fields.len());
                self.fields.push(accessor);
            }
        }
        Ok(self)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path.trim())
    }

    pub fn paths(&self) -> impl Iterator<Item = &AttributePath> {
        self.fields.iter().map(|a| &a.path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Current value at `path`, or `None` when unregistered or unresolved.
    pub fn read(&self, path: &str, state: &S) -> Option<Value> {
        let i = *self.index.get(path.trim())?;
        (self.fields[i].read)(state)
    }

    pub fn write(&self, path: &str, state: &mut S, value: &Value) -> Result<(), AttributeError> {
        let path = path.trim();
        let i = *self
            .index
            .get(path)
            .ok_or_else(|| AttributeError::Unregistered(path.to_string()))?;
        (self.fields[i].write)(state, value)
    }
}

impl<S> Default for AttributeRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Path → value map in insertion order, as written to the save file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedRecord(Map<String, Value>);

impl PersistedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, value: Value) {
        self.0.insert(path.into(), value);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for PersistedRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The two halves of the save/load resolver, independent of any file.
pub struct AttributeStore;

impl AttributeStore {
    /// Read every path in `paths` that currently resolves. Order follows
    /// `paths`; unresolvable paths are left out.
    pub fn save<S>(paths: &[String], registry: &AttributeRegistry<S>, state: &S) -> PersistedRecord {
        let mut record = PersistedRecord::new();
        for path in paths {
            match registry.read(path, state) {
                Some(value) => record.insert(path.trim(), value),
                None => log::debug!(target: "Attributes", "Skipping unresolved path '{}'", path),
            }
        }
        record
    }

    /// Assign every path present in both `paths` and `record`. Returns how
    /// many fields were written.
    pub fn apply<S>(
        paths: &[String],
        record: &PersistedRecord,
        registry: &AttributeRegistry<S>,
        state: &mut S,
    ) -> usize {
        let mut applied = 0;
        for path in paths {
            let Some(value) = record.get(path.trim()) else {
                continue;
            };
            match registry.write(path, state, value) {
                Ok(()) => applied += 1,
                Err(AttributeError::Unregistered(_)) | Err(AttributeError::Unresolved(_)) => {
                    log::debug!(target: "Attributes", "Skipping unresolved path '{}'", path);
                }
                Err(e) => log::warn!(target: "Attributes", "{}", e),
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Player {
        hp: i32,
        money: u64,
        name: String,
    }

    struct Boss {
        hp: f32,
    }

    #[derive(Default)]
    struct Game {
        player: Player,
        boss: Option<Boss>,
        muted: bool,
    }

    fn registry() -> AttributeRegistry<Game> {
        let mut reg: AttributeRegistry<Game> = AttributeRegistry::new();
        reg.field("player.hp", |g: &Game| Some(&g.player.hp), |g| Some(&mut g.player.hp))
            .and_then(|r| r.field("player.money", |g: &Game| Some(&g.player.money), |g| Some(&mut g.player.money)))
            .and_then(|r| r.field("player.name", |g: &Game| Some(&g.player.name), |g| Some(&mut g.player.name)))
            .and_then(|r| {
                r.field(
                    "boss.hp",
                    |g: &Game| g.boss.as_ref().map(|b| &b.hp),
                    |g| g.boss.as_mut().map(|b| &mut b.hp),
                )
            })
            .and_then(|r| r.field("muted", |g: &Game| Some(&g.muted), |g| Some(&mut g.muted)))
            .expect("valid paths");
        reg
    }

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_splits_segments() {
        let path = AttributePath::parse("player.stats.hp").expect("valid");
        assert_eq!(path.root(), "player");
        assert_eq!(path.field(), "hp");
        assert_eq!(path.parent().as_deref(), Some("player.stats"));
        assert_eq!(path.segments().len(), 3);
        assert!(AttributePath::parse("score").expect("valid").parent().is_none());
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(matches!(AttributePath::parse(""), Err(AttributeError::EmptyPath)));
        assert!(matches!(
            AttributePath::parse("player..hp"),
            Err(AttributeError::EmptySegment(_))
        ));
        assert!(matches!(
            AttributePath::parse("player."),
            Err(AttributeError::EmptySegment(_))
        ));
    }

    #[test]
    fn save_skips_missing_intermediate_and_unknown_root() {
        let reg = registry();
        let game = Game {
            player: Player {
                hp: 100,
                money: 250,
                name: "Ann".into(),
            },
            ..Default::default()
        };
        let record = AttributeStore::save(
            &paths(&["player.hp", "boss.hp", "enemy.hp", "player.money"]),
            &reg,
            &game,
        );
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("player.hp"), Some(&json!(100)));
        assert!(!record.contains("boss.hp"));
        assert!(!record.contains("enemy.hp"));
        let keys: Vec<_> = record.keys().cloned().collect();
        assert_eq!(keys, vec!["player.hp", "player.money"]);
    }

    #[test]
    fn save_then_apply_restores_values() {
        let reg = registry();
        let set = paths(&["player.hp", "player.name", "muted", "boss.hp"]);
        let original = Game {
            player: Player {
                hp: 42,
                money: 0,
                name: "Bo".into(),
            },
            boss: Some(Boss { hp: 12.5 }),
            muted: true,
        };
        let record = AttributeStore::save(&set, &reg, &original);

        let mut restored = Game {
            boss: Some(Boss { hp: 0.0 }),
            ..Default::default()
        };
        let applied = AttributeStore::apply(&set, &record, &reg, &mut restored);
        assert_eq!(applied, 4);
        assert_eq!(restored.player.hp, 42);
        assert_eq!(restored.player.name, "Bo");
        assert!(restored.muted);
        assert_eq!(restored.boss.map(|b| b.hp), Some(12.5));
    }

    #[test]
    fn apply_ignores_keys_outside_save_set() {
        let reg = registry();
        let mut record = PersistedRecord::new();
        record.insert("player.hp", json!(7));
        record.insert("player.money", json!(999));
        let mut game = Game::default();
        let applied = AttributeStore::apply(&paths(&["player.hp"]), &record, &reg, &mut game);
        assert_eq!(applied, 1);
        assert_eq!(game.player.hp, 7);
        assert_eq!(game.player.money, 0);
    }

    #[test]
    fn apply_skips_unresolved_and_mismatched_values() {
        let reg = registry();
        let mut record = PersistedRecord::new();
        record.insert("boss.hp", json!(5.0));
        record.insert("player.hp", json!("lots"));
        record.insert("ghost.hp", json!(1));
        let mut game = Game::default();
        let applied = AttributeStore::apply(
            &paths(&["boss.hp", "player.hp", "ghost.hp"]),
            &record,
            &reg,
            &mut game,
        );
        assert_eq!(applied, 0);
        assert_eq!(game.player.hp, 0);
        assert!(game.boss.is_none());
    }

    #[test]
    fn write_reports_error_kinds() {
        let reg = registry();
        let mut game = Game::default();
        assert!(matches!(
            reg.write("nope", &mut game, &json!(1)),
            Err(AttributeError::Unregistered(_))
        ));
        assert!(matches!(
            reg.write("boss.hp", &mut game, &json!(1.0)),
            Err(AttributeError::Unresolved(_))
        ));
        assert!(matches!(
            reg.write("player.hp", &mut game, &json!(true)),
            Err(AttributeError::TypeMismatch { .. })
        ));
        reg.write("player.hp", &mut game, &json!(55)).expect("fits");
        assert_eq!(game.player.hp, 55);
    }

    #[test]
    fn reregistering_replaces_accessor() {
        let mut reg = registry();
        let before = reg.len();
        reg.field("player.hp", |g: &Game| Some(&g.player.money), |g| Some(&mut g.player.money))
            .expect("valid");
        assert_eq!(reg.len(), before);
        let game = Game {
            player: Player {
                hp: 1,
                money: 2,
                name: String::new(),
            },
            ..Default::default()
        };
        assert_eq!(reg.read("player.hp", &game), Some(json!(2)));
    }

    #[test]
    fn invalid_registration_is_rejected() {
        let mut reg: AttributeRegistry<Game> = AttributeRegistry::new();
        let err = reg
            .field("player..hp", |g: &Game| Some(&g.player.hp), |g| Some(&mut g.player.hp))
            .err();
        assert!(matches!(err, Some(AttributeError::EmptySegment(_))));
        assert!(reg.is_empty());
    }
}
