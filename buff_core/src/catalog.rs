//! Buff catalog - the known stack ids and their round-end behaviour

use crate::types::{StackKey, CUSTOM_ID};
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Global built-in catalog instance
static BUILTIN_CATALOG: OnceLock<BuffCatalog> = OnceLock::new();

/// Whether a stack helps or hinders its holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    #[default]
    Buff,
    Debuff,
    Neutral,
}

/// What happens to a stack at round end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// Kept, and merged with its next-round counterpart
    #[default]
    Persistent,
    /// Removed when the round it was active in ends
    OneRound,
    /// Loses one layer at each round end
    Decay,
}

/// Definition of a catalog stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: BuffKind,
    #[serde(default)]
    pub lifetime: Lifetime,
    /// Deal damage equal to potency before decaying
    #[serde(default)]
    pub round_end_damage: bool,
}

impl BuffDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: BuffKind, lifetime: Lifetime) -> Self {
        BuffDef {
            id: id.into(),
            name: name.into(),
            kind,
            lifetime,
            round_end_damage: false,
        }
    }

    pub fn with_round_end_damage(mut self) -> Self {
        self.round_end_damage = true;
        self
    }
}

/// Container for catalog files
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    buffs: Vec<BuffDef>,
}

/// Registry of known stack ids
#[derive(Debug, Clone, Default)]
pub struct BuffCatalog {
    defs: HashMap<String, BuffDef>,
}

impl BuffCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        BuffCatalog {
            defs: HashMap::new(),
        }
    }

    /// The stacks every table starts with
    pub fn builtin() -> Self {
        use BuffKind::*;
        use Lifetime::*;

        let mut catalog = BuffCatalog::new();
        for def in [
            BuffDef::new("strong", "Strong", Buff, Persistent),
            BuffDef::new("guard", "Guard", Buff, Persistent),
            BuffDef::new("charge", "Charge", Buff, Persistent),
            BuffDef::new("focus", "Focus", Buff, Persistent),
            BuffDef::new("haste", "Haste", Buff, OneRound),
            BuffDef::new("evasion", "Evasion", Buff, OneRound),
            BuffDef::new("counter", "Counter Stance", Buff, OneRound),
            BuffDef::new("weak", "Weak", Debuff, Persistent),
            BuffDef::new("fragile", "Fragile", Debuff, OneRound),
            BuffDef::new("stagger", "Stagger", Debuff, OneRound),
            BuffDef::new("burn", "Burn", Debuff, Decay).with_round_end_damage(),
            BuffDef::new("bleed", "Bleed", Debuff, Decay),
            BuffDef::new("chill", "Chill", Debuff, Decay),
        ] {
            catalog.defs.insert(def.id.clone(), def);
        }
        catalog
    }

    /// Register a stack definition, replacing any with the same id
    pub fn register(&mut self, def: BuffDef) -> Result<(), ConfigError> {
        if def.id.trim().is_empty() {
            return Err(ConfigError::Validation("buff id must not be empty".to_string()));
        }
        if def.id == CUSTOM_ID {
            return Err(ConfigError::Validation(format!(
                "buff id '{}' is reserved for custom stacks",
                CUSTOM_ID
            )));
        }
        self.defs.insert(def.id.clone(), def);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&BuffDef> {
        self.defs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    /// Whether a key may be added: custom stacks always, catalog ids when known
    pub fn accepts(&self, key: &StackKey) -> bool {
        match key {
            StackKey::Known(id) => self.contains(id),
            StackKey::Custom(name) => !name.is_empty(),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    fn lifetime(&self, key: &StackKey) -> Lifetime {
        match key {
            StackKey::Known(id) => self.get(id).map(|d| d.lifetime).unwrap_or_default(),
            StackKey::Custom(_) => Lifetime::Persistent,
        }
    }

    /// Member of the one-round-only subset
    pub fn is_one_round(&self, key: &StackKey) -> bool {
        self.lifetime(key) == Lifetime::OneRound
    }

    /// Member of the decay-each-round-end subset
    pub fn decays(&self, key: &StackKey) -> bool {
        self.lifetime(key) == Lifetime::Decay
    }

    /// Whether the stack deals its potency as damage before decaying
    pub fn deals_round_end_damage(&self, key: &StackKey) -> bool {
        match key {
            StackKey::Known(id) => self.get(id).is_some_and(|d| d.round_end_damage),
            StackKey::Custom(_) => false,
        }
    }

    /// Display name for a key
    pub fn display_name<'a>(&'a self, key: &'a StackKey) -> &'a str {
        match key {
            StackKey::Known(id) => self.get(id).map(|d| d.name.as_str()).unwrap_or(id),
            StackKey::Custom(name) => name,
        }
    }
}

/// Get a reference to the built-in catalog (initialized on first use)
pub fn builtin_catalog() -> &'static BuffCatalog {
    BUILTIN_CATALOG.get_or_init(BuffCatalog::builtin)
}

/// Load a catalog from a TOML file
pub fn load_catalog(path: &Path) -> Result<BuffCatalog, ConfigError> {
    let file: CatalogFile = crate::load_toml(path)?;
    build_catalog(file)
}

/// Parse a catalog from a TOML string
pub fn parse_catalog(toml: &str) -> Result<BuffCatalog, ConfigError> {
    let file: CatalogFile = crate::parse_toml(toml)?;
    build_catalog(file)
}

fn build_catalog(file: CatalogFile) -> Result<BuffCatalog, ConfigError> {
    let mut catalog = BuffCatalog::new();
    for def in file.buffs {
        if catalog.contains(&def.id) {
            return Err(ConfigError::Validation(format!("duplicate buff id '{}'", def.id)));
        }
        if def.round_end_damage && def.lifetime != Lifetime::Decay {
            return Err(ConfigError::Validation(format!(
                "buff '{}' deals round-end damage but does not decay",
                def.id
            )));
        }
        catalog.register(def)?;
    }
    Ok(catalog)
}
