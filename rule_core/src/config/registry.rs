use super::ConfigError;
use crate::activity::Activity;
use crate::condition::Condition;
use crate::consume::{ConsumeMode, ResourceCost};
use crate::effect::EffectKind;
use crate::expr;
use buff_core::{BuffCatalog, StackKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The item or actor a file's activities belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One activity file: an owner and its activities
#[derive(Debug, Clone, Deserialize)]
struct ActivityFile {
    owner: OwnerConfig,
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Clone)]
struct OwnerEntry {
    config: OwnerConfig,
    activity_ids: Vec<String>,
}

/// Registry of all activity definitions, loaded from TOML files
#[derive(Debug, Default)]
pub struct ActivityRegistry {
    activities: HashMap<String, Activity>,
    owners: HashMap<String, OwnerEntry>,
}

impl ActivityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all activity files from a directory (recursively)
    pub fn load(dir: &Path, catalog: &BuffCatalog) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.load_dir(dir, catalog)?;
        Ok(registry)
    }

    /// Parse a single activity file's contents
    pub fn from_toml_str(content: &str, catalog: &BuffCatalog) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        let file: ActivityFile = super::parse_toml(content)?;
        registry.add_file(file, catalog, None)?;
        Ok(registry)
    }

    fn load_dir(&mut self, dir: &Path, catalog: &BuffCatalog) -> Result<(), ConfigError> {
        if !dir.exists() {
            return Ok(());
        }

        let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(dir.to_path_buf()),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::Io {
                error: e,
                path: Some(dir.to_path_buf()),
            })?;
            paths.push(entry.path());
        }
        // Stable load order so duplicate errors name the same file every time
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.load_dir(&path, catalog)?;
            } else if path.extension().is_some_and(|ext| ext == "toml") {
                let file: ActivityFile = super::load_toml(&path)?;
                self.add_file(file, catalog, Some(path))?;
            }
        }

        Ok(())
    }

    fn add_file(&mut self, file: ActivityFile, catalog: &BuffCatalog, path: Option<PathBuf>) -> Result<(), ConfigError> {
        let owner_id = file.owner.id.trim().to_string();
        if owner_id.is_empty() {
            return Err(ConfigError::Validation {
                message: "owner id is empty".to_string(),
                path,
            });
        }

        let mut ids = Vec::with_capacity(file.activities.len());
        for activity in &file.activities {
            validate_activity(activity, catalog).map_err(|message| ConfigError::Validation {
                message,
                path: path.clone(),
            })?;
            if self.activities.contains_key(&activity.id) || ids.contains(&activity.id) {
                return Err(ConfigError::DuplicateActivity {
                    id: activity.id.clone(),
                    path,
                });
            }
            ids.push(activity.id.clone());
        }

        let entry = self.owners.entry(owner_id).or_insert_with(|| OwnerEntry {
            config: file.owner,
            activity_ids: Vec::new(),
        });
        entry.activity_ids.extend(ids);
        for activity in file.activities {
            self.activities.insert(activity.id.clone(), activity);
        }
        Ok(())
    }

    /// Get an activity by ID
    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.activities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.activities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn owner(&self, owner_id: &str) -> Option<&OwnerConfig> {
        self.owners.get(owner_id).map(|entry| &entry.config)
    }

    /// List all activity IDs
    pub fn activity_ids(&self) -> impl Iterator<Item = &str> {
        self.activities.keys().map(|s| s.as_str())
    }

    /// An owner's activities in declared order
    pub fn activities_for<'a>(&'a self, owner_id: &str) -> impl Iterator<Item = &'a Activity> + 'a {
        self.owners
            .get(owner_id)
            .into_iter()
            .flat_map(|entry| entry.activity_ids.iter())
            .filter_map(|id| self.activities.get(id))
    }
}

/// Reject malformed formulas; warn about stack ids the catalog lacks
fn validate_activity(activity: &Activity, catalog: &BuffCatalog) -> Result<(), String> {
    if activity.id.trim().is_empty() {
        return Err(format!("activity '{}' has an empty id", activity.name));
    }

    for condition in &activity.conditions {
        match condition {
            Condition::CustomExpression { expression } => check_formula(&activity.id, expression)?,
            Condition::HasBuff { id, .. } | Condition::BuffLayer { id, .. } => warn_unknown(&activity.id, id, catalog),
            Condition::Unrecognized => {
                tracing::warn!(activity = %activity.id, "unrecognized condition type");
            }
            _ => {}
        }
    }

    if activity.consume.mode == ConsumeMode::Optional && activity.consume.options.is_empty() {
        return Err(format!("activity '{}' has optional consumption with no options", activity.id));
    }

    let costs = activity
        .consume
        .resources
        .iter()
        .chain(activity.consume.options.iter().flatten());
    for cost in costs {
        if let ResourceCost::Stack { id, .. } = cost {
            warn_unknown(&activity.id, id, catalog);
        }
    }

    for effect in &activity.effects {
        for amount in effect.kind.amounts() {
            if let Some(formula) = amount.as_formula() {
                check_formula(&activity.id, formula)?;
            }
        }
        match &effect.kind {
            EffectKind::AddBuff { id, .. } | EffectKind::ConsumeBuff { id, .. } => {
                warn_unknown(&activity.id, id, catalog)
            }
            EffectKind::CustomBuff { name, .. } if name.trim().is_empty() => {
                return Err(format!("activity '{}' has a custom buff with no name", activity.id));
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_formula(activity_id: &str, formula: &str) -> Result<(), String> {
    let validation = expr::validate(formula);
    if validation.valid {
        return Ok(());
    }
    Err(format!(
        "activity '{}': bad formula '{}': {}",
        activity_id,
        formula,
        validation.error.unwrap_or_default()
    ))
}

fn warn_unknown(activity_id: &str, id: &str, catalog: &BuffCatalog) {
    if !catalog.accepts(&StackKey::parse(id)) {
        tracing::warn!(activity = %activity_id, stack = %id, "stack id not in catalog");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::TriggerType;
    use buff_core::builtin_catalog;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_activity_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(format!("{}.toml", name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    const SWORD: &str = r#"
[owner]
id = "iron_sword"
name = "Iron Sword"

[[activities]]
id = "iron_sword.rally"
name = "Rally"
trigger = { type = "on_use" }
effects = [
    { type = "add_buff", id = "strong", layers = 2 },
    { type = "add_buff", id = "charge", layers = "{x}+3" },
]

[[activities]]
id = "iron_sword.riposte"
name = "Riposte"
trigger = { type = "onCounter", passive = true, categoryFilter = "slash" }
usage_limit = { per_round = 1 }

[[activities.conditions]]
type = "buff_layer"
id = "charge"
operator = ">="
value = 2

[activities.consume]
mode = "optional"
options = [
    [{ type = "stack", id = "charge", layers = 2 }],
    [{ type = "pool", pool = "bonus", count = 1 }],
]

[[activities.effects]]
type = "deal_damage"
amount = "1d6+{charge.potency}"
critical = true
"#;

    #[test]
    fn test_load_activity_file() {
        let dir = TempDir::new().unwrap();
        create_activity_file(dir.path(), "sword", SWORD);

        let registry = ActivityRegistry::load(dir.path(), builtin_catalog()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.owner("iron_sword").unwrap().name, "Iron Sword");

        let ids: Vec<&str> = registry.activities_for("iron_sword").map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["iron_sword.rally", "iron_sword.riposte"]);

        let riposte = registry.get("iron_sword.riposte").unwrap();
        assert_eq!(riposte.trigger.kind, TriggerType::OnCounter);
        assert!(riposte.trigger.passive);
        assert_eq!(riposte.usage_limit.per_round, Some(1));
        assert_eq!(riposte.consume.mode, ConsumeMode::Optional);
        assert_eq!(riposte.consume.options.len(), 2);
        assert!(riposte.effects[0].critical);
    }

    #[test]
    fn test_load_nested_dirs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("weapons");
        std::fs::create_dir(&nested).unwrap();
        create_activity_file(&nested, "sword", SWORD);
        std::fs::write(dir.path().join("notes.txt"), "not toml at all [").unwrap();

        let registry = ActivityRegistry::load(dir.path(), builtin_catalog()).unwrap();
        assert!(registry.contains("iron_sword.rally"));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = ActivityRegistry::load(&dir.path().join("absent"), builtin_catalog()).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let dir = TempDir::new().unwrap();
        create_activity_file(dir.path(), "a", SWORD);
        create_activity_file(dir.path(), "b", &SWORD.replace("iron_sword\"", "steel_sword\""));

        let result = ActivityRegistry::load(dir.path(), builtin_catalog());
        assert!(matches!(result, Err(ConfigError::DuplicateActivity { .. })));
    }

    #[test]
    fn test_unknown_effect_type_rejected() {
        let content = r#"
[owner]
id = "wand"

[[activities]]
id = "wand.zap"
name = "Zap"
trigger = { type = "on_use" }
effects = [{ type = "summon", what = "dragon" }]
"#;
        let result = ActivityRegistry::from_toml_str(content, builtin_catalog());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_bad_formula_rejected() {
        let content = r#"
[owner]
id = "wand"

[[activities]]
id = "wand.zap"
name = "Zap"
trigger = { type = "on_use" }
effects = [{ type = "heal", amount = "eval(1)" }]
"#;
        let result = ActivityRegistry::from_toml_str(content, builtin_catalog());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_optional_consume_without_options_rejected() {
        let content = r#"
[owner]
id = "wand"

[[activities]]
id = "wand.zap"
name = "Zap"
trigger = { type = "on_use" }
consume = { mode = "optional" }
effects = [{ type = "heal", amount = 1.0 }]
"#;
        let result = ActivityRegistry::from_toml_str(content, builtin_catalog());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_unknown_stack_id_only_warns() {
        let content = r#"
[owner]
id = "charm"

[[activities]]
id = "charm.glow"
name = "Glow"
trigger = { type = "on_round_start", passive = true }
effects = [{ type = "add_buff", id = "radiance" }]
"#;
        let registry = ActivityRegistry::from_toml_str(content, builtin_catalog()).unwrap();
        assert!(registry.contains("charm.glow"));
    }
}
