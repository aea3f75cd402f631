use crate::input::{is_canonical_button, is_canonical_symbol, ALT, CTRL, SHIFT, X1, X2};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

pub const TOGGLE: &str = "toggle";
pub const EXIT: &str = "exit";

pub const KEYBINDS_DIR_NAME: &str = "keybinds";
pub const KEYBINDS_FILE_NAME: &str = "keybinds.json";

/// Keys and mouse buttons that must be held for an action to fire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub keys: BTreeSet<String>,
    #[serde(default)]
    pub mouse: BTreeSet<String>,
}

impl Trigger {
    pub fn new<K, M>(keys: K, mouse: M) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            mouse: mouse.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.mouse.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if let Some(bad) = self.keys.iter().find(|k| !is_canonical_symbol(k)) {
            bail!("unknown key symbol '{bad}'");
        }
        if let Some(bad) = self.mouse.iter().find(|b| !is_canonical_button(b)) {
            bail!("unknown mouse symbol '{bad}'");
        }
        Ok(())
    }
}

fn modifier_rank(symbol: &str) -> usize {
    match symbol {
        CTRL => 0,
        ALT => 1,
        SHIFT => 2,
        _ => 3,
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        let mut keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        keys.sort_by_key(|k| modifier_rank(k));
        let parts: Vec<&str> = keys
            .into_iter()
            .chain(self.mouse.iter().map(String::as_str))
            .collect();
        write!(f, "{}", parts.join(" + "))
    }
}

/// Action name to trigger mapping, persisted as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeybindMap(BTreeMap<String, Trigger>);

impl Default for KeybindMap {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(TOGGLE.to_string(), Trigger::new([CTRL, ALT], [X1]));
        map.insert(EXIT.to_string(), Trigger::new([CTRL, ALT], [X2]));
        Self(map)
    }
}

impl KeybindMap {
    pub fn get(&self, action: &str) -> Option<&Trigger> {
        self.0.get(action)
    }

    pub fn set(&mut self, action: &str, trigger: Trigger) {
        self.0.insert(action.to_string(), trigger);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Trigger)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let map: Self = serde_json::from_str(json).context("deserialize keybinds")?;
        for required in [TOGGLE, EXIT] {
            if map.get(required).is_none() {
                bail!("keybinds are missing the '{required}' action");
            }
        }
        for (action, trigger) in map.iter() {
            trigger
                .validate()
                .with_context(|| format!("invalid trigger for '{action}'"))?;
        }
        Ok(map)
    }
}

pub fn keybinds_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(KEYBINDS_DIR_NAME).join(KEYBINDS_FILE_NAME))
}

pub fn resolve_keybinds_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    keybinds_path_from_exe_path(&exe_path)
}

#[derive(Debug, Clone)]
pub struct KeybindStore {
    path: PathBuf,
}

impl KeybindStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted keybinds, falling back to (and persisting) the defaults.
    pub fn load(&self) -> KeybindMap {
        match self.read() {
            Ok(map) => {
                tracing::info!(path = %self.path.display(), "loaded keybinds");
                map
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "using default keybinds: {err:#}");
                let defaults = KeybindMap::default();
                if let Err(err) = self.save(&defaults) {
                    tracing::error!("failed to persist default keybinds: {err:#}");
                }
                defaults
            }
        }
    }

    fn read(&self) -> Result<KeybindMap> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read keybinds file {}", self.path.display()))?;
        KeybindMap::from_json(&content)
    }

    pub fn save(&self, map: &KeybindMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create keybinds folder {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(map).context("serialize keybinds")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("write keybinds file {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "saved keybinds");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keybinds_path_is_resolved_next_to_executable() {
        let exe = Path::new("/tmp/ontop/bin/ontop.exe");
        let path = keybinds_path_from_exe_path(exe).expect("path");
        assert_eq!(
            path,
            Path::new("/tmp/ontop/bin")
                .join(KEYBINDS_DIR_NAME)
                .join(KEYBINDS_FILE_NAME)
        );
    }

    #[test]
    fn defaults_match_documented_bindings() {
        let map = KeybindMap::default();
        assert_eq!(map.get(TOGGLE), Some(&Trigger::new(["ctrl", "alt"], ["x1"])));
        assert_eq!(map.get(EXIT), Some(&Trigger::new(["ctrl", "alt"], ["x2"])));
    }

    #[test]
    fn persisted_format_is_plain_json_object() {
        let json = serde_json::to_value(KeybindMap::default()).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "toggle": { "keys": ["alt", "ctrl"], "mouse": ["x1"] },
                "exit": { "keys": ["alt", "ctrl"], "mouse": ["x2"] },
            })
        );
    }

    #[test]
    fn missing_action_is_rejected() {
        let err = KeybindMap::from_json(r#"{"toggle": {"keys": [], "mouse": ["x1"]}}"#)
            .expect_err("exit is missing");
        assert!(format!("{err:#}").contains("exit"));
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let json = r#"{
            "toggle": {"keys": ["CTRL"], "mouse": []},
            "exit": {"keys": [], "mouse": ["x2"]}
        }"#;
        assert!(KeybindMap::from_json(json).is_err());
    }

    #[test]
    fn extra_actions_are_kept() {
        let json = r#"{
            "toggle": {"keys": ["ctrl"], "mouse": []},
            "exit": {"keys": [], "mouse": ["x2"]},
            "peek": {"keys": ["f5"]}
        }"#;
        let map = KeybindMap::from_json(json).expect("parse");
        assert_eq!(map.get("peek"), Some(&Trigger::new(["f5"], Vec::<String>::new())));
    }

    #[test]
    fn display_puts_modifiers_first() {
        assert_eq!(Trigger::new(["p", "alt", "ctrl"], ["x1"]).to_string(), "ctrl + alt + p + x1");
        assert_eq!(Trigger::default().to_string(), "(none)");
    }
}
