use serde::{Deserialize, Serialize};

use crate::dsl::{check, Resolvable};
use crate::{CONDITION_KINDS, STAT_FIELDS, STATUS_IDS};

fn bounded(name: &str, r: &Resolvable, lo: f64, hi: f64) -> anyhow::Result<()> {
    let domain = r.domain();
    check(&[(name, &domain)], |vars| {
        vars[name]
            .as_f64()
            .map(|v| v >= lo && v <= hi)
            .unwrap_or(false)
    })
    .map_err(|e| anyhow::anyhow!("{name} must be in [{lo},{hi}]: {e}"))
}

fn at_least(name: &str, r: &Resolvable, lo: f64) -> anyhow::Result<()> {
    let domain = r.domain();
    check(&[(name, &domain)], |vars| {
        vars[name].as_f64().map(|v| v >= lo).unwrap_or(false)
    })
    .map_err(|e| anyhow::anyhow!("{name} must be >= {lo}: {e}"))
}

/// Fields an action may override on the `MoveContext` it inherits from its
/// parent (the move, or an enclosing composite action). Mirrors the
/// original's dynamic "extra fields allowed" override mechanism, made
/// explicit.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContextOverride {
    pub amount: Option<Resolvable>,
    pub chance: Option<Resolvable>,
    pub calc_target: Option<Resolvable>,
    pub calc_field: Option<Resolvable>,
    pub mult: Option<Resolvable>,
    pub flat: Option<Resolvable>,
    pub duration: Option<Resolvable>,
    pub is_percent: Option<bool>,
}

/// A single AND-ed predicate in a `condition` action.
#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawCondition")]
pub struct Condition {
    pub id: String,
    pub value: Resolvable,
}

#[derive(Deserialize)]
struct RawCondition {
    id: String,
    value: Resolvable,
}

impl TryFrom<RawCondition> for Condition {
    type Error = anyhow::Error;
    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        if !CONDITION_KINDS.contains(&raw.id.as_str()) {
            anyhow::bail!("invalid condition id: {}", raw.id);
        }
        Ok(Condition {
            id: raw.id,
            value: raw.value,
        })
    }
}

/// A status reference inside a `status` action (as opposed to
/// [`crate::schema::stats::Status`], the stateful instance on a fighter).
#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawStatusRef")]
pub struct StatusRef {
    pub id: String,
}

#[derive(Deserialize)]
struct RawStatusRef {
    id: String,
}

impl TryFrom<RawStatusRef> for StatusRef {
    type Error = anyhow::Error;
    fn try_from(raw: RawStatusRef) -> Result<Self, Self::Error> {
        if !STATUS_IDS.contains(&raw.id.as_str()) {
            anyhow::bail!("invalid status id: {}", raw.id);
        }
        Ok(StatusRef { id: raw.id })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDamageAction")]
pub struct DamageAction {
    pub crit_chance: Resolvable,
    pub crit_damage: Resolvable,
    pub piercing: Resolvable,
    #[serde(flatten)]
    pub overrides: ContextOverride,
}

#[derive(Deserialize)]
struct RawDamageAction {
    #[serde(default = "default_zero")]
    crit_chance: Resolvable,
    #[serde(default = "default_one")]
    crit_damage: Resolvable,
    #[serde(default = "default_zero")]
    piercing: Resolvable,
    #[serde(flatten, default)]
    overrides: ContextOverride,
}

impl TryFrom<RawDamageAction> for DamageAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawDamageAction) -> Result<Self, Self::Error> {
        bounded("crit_chance", &raw.crit_chance, 0.0, 1.0)?;
        at_least("crit_damage", &raw.crit_damage, 0.0)?;
        bounded("piercing", &raw.piercing, 0.0, 1.0)?;
        Ok(DamageAction {
            crit_chance: raw.crit_chance,
            crit_damage: raw.crit_damage,
            piercing: raw.piercing,
            overrides: raw.overrides,
        })
    }
}

fn default_zero() -> Resolvable {
    Resolvable::literal(0i64)
}
fn default_one() -> Resolvable {
    Resolvable::literal(1i64)
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawBuffAction")]
pub struct BuffAction {
    pub stats: Vec<String>,
    pub reverse: bool,
    pub overrides: ContextOverride,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatsField {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct RawBuffAction {
    #[serde(default = "default_buff_stat")]
    stats: StatsField,
    #[serde(default)]
    reverse: bool,
    #[serde(flatten, default)]
    overrides: ContextOverride,
}

fn default_buff_stat() -> StatsField {
    StatsField::One("attack".to_string())
}

impl TryFrom<RawBuffAction> for BuffAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawBuffAction) -> Result<Self, Self::Error> {
        let stats = match raw.stats {
            StatsField::One(s) => vec![s],
            StatsField::Many(v) => v,
        };
        for stat in &stats {
            if !STAT_FIELDS.contains(&stat.as_str()) {
                anyhow::bail!("buff 'stat' must be a valid stat, got '{stat}'");
            }
        }
        Ok(BuffAction {
            stats,
            reverse: raw.reverse,
            overrides: raw.overrides,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShieldAction {
    #[serde(flatten)]
    pub overrides: ContextOverride,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HealAction {
    #[serde(flatten)]
    pub overrides: ContextOverride,
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawModifyAction")]
pub struct ModifyAction {
    pub field: String,
    pub value: Resolvable,
    pub overrides: ContextOverride,
}

#[derive(Deserialize)]
struct RawModifyAction {
    field: String,
    value: Resolvable,
    #[serde(flatten, default)]
    overrides: ContextOverride,
}

fn is_dot_path(s: &str) -> bool {
    s.split('.').all(|part| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }) && !s.is_empty()
}

impl TryFrom<RawModifyAction> for ModifyAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawModifyAction) -> Result<Self, Self::Error> {
        if !is_dot_path(&raw.field) {
            anyhow::bail!(
                "field must be a dot-path of identifiers (e.g. 'foo.bar_baz'), got '{}'",
                raw.field
            );
        }
        Ok(ModifyAction {
            field: raw.field,
            value: raw.value,
            overrides: raw.overrides,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawTextAction")]
pub struct TextAction {
    pub text: String,
    pub color: Option<String>,
    pub style_flags: Vec<(String, bool)>,
}

#[derive(Deserialize)]
struct RawTextAction {
    #[serde(default = "default_text")]
    text: Resolvable,
    #[serde(default = "default_style")]
    style: Resolvable,
}

fn default_text() -> Resolvable {
    Resolvable::literal("No text.".to_string())
}
fn default_style() -> Resolvable {
    Resolvable::literal("{}".to_string())
}

impl TryFrom<RawTextAction> for TextAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawTextAction) -> Result<Self, Self::Error> {
        let text = raw.text.resolve_string();
        if text.len() >= 511 {
            anyhow::bail!("text action text too long ({} chars)", text.len());
        }
        let style_src = raw.style.resolve_string();
        let style_json: serde_json::Value = serde_json::from_str(&style_src.replace('\'', "\""))
            .map_err(|_| {
                anyhow::anyhow!(
                    "style must be a dict-like string (e.g. '{{\"color\":\"red\",\"bold\":true}}')"
                )
            })?;
        let style_obj = style_json
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("style must be a JSON object string"))?;

        let mut color = None;
        let mut style_flags = Vec::new();
        for (key, value) in style_obj {
            if key == "color" {
                let c = value
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("style 'color' must be a string"))?;
                if !crate::LOG_COLORS.contains(&c) {
                    anyhow::bail!("unknown text color: {c}");
                }
                color = Some(c.to_string());
            } else {
                if !crate::LOG_STYLES.contains(&key.as_str()) {
                    anyhow::bail!("unknown text style flag: {key}");
                }
                let flag = value
                    .as_bool()
                    .ok_or_else(|| anyhow::anyhow!("style flag '{key}' must be a bool"))?;
                style_flags.push((key.clone(), flag));
            }
        }

        Ok(TextAction {
            text,
            color,
            style_flags,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawStatusAction")]
pub struct StatusAction {
    pub operation: String,
    pub status: Vec<StatusRef>,
    pub overrides: ContextOverride,
}

#[derive(Deserialize)]
struct RawStatusAction {
    #[serde(default = "default_add")]
    operation: String,
    status: Vec<StatusRef>,
    #[serde(flatten, default)]
    overrides: ContextOverride,
}

fn default_add() -> String {
    "add".to_string()
}

impl TryFrom<RawStatusAction> for StatusAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawStatusAction) -> Result<Self, Self::Error> {
        if raw.operation != "add" && raw.operation != "remove" {
            anyhow::bail!("status operation must be 'add' or 'remove', got '{}'", raw.operation);
        }
        if raw.status.is_empty() {
            anyhow::bail!("status action must have at least one status");
        }
        Ok(StatusAction {
            operation: raw.operation,
            status: raw.status,
            overrides: raw.overrides,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawConditionAction")]
pub struct ConditionAction {
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    pub overrides: ContextOverride,
}

#[derive(Deserialize)]
struct RawConditionAction {
    conditions: Vec<Condition>,
    actions: Vec<Action>,
    #[serde(flatten, default)]
    overrides: ContextOverride,
}

impl TryFrom<RawConditionAction> for ConditionAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawConditionAction) -> Result<Self, Self::Error> {
        if raw.conditions.is_empty() {
            anyhow::bail!("condition action must have at least one condition");
        }
        if raw.actions.is_empty() {
            anyhow::bail!("condition action must have at least one action");
        }
        Ok(ConditionAction {
            conditions: raw.conditions,
            actions: raw.actions,
            overrides: raw.overrides,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawRandomChoice")]
pub struct RandomChoice {
    pub action: Box<Action>,
    pub weight: Resolvable,
}

#[derive(Deserialize)]
struct RawRandomChoice {
    action: Box<Action>,
    #[serde(default = "default_one")]
    weight: Resolvable,
}

impl TryFrom<RawRandomChoice> for RandomChoice {
    type Error = anyhow::Error;
    fn try_from(raw: RawRandomChoice) -> Result<Self, Self::Error> {
        at_least("weight", &raw.weight, 0.0)?;
        Ok(RandomChoice {
            action: raw.action,
            weight: raw.weight,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawRandomAction")]
pub struct RandomAction {
    pub choices: Vec<RandomChoice>,
    pub overrides: ContextOverride,
}

#[derive(Deserialize)]
struct RawRandomAction {
    choices: Vec<RandomChoice>,
    #[serde(flatten, default)]
    overrides: ContextOverride,
}

impl TryFrom<RawRandomAction> for RandomAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawRandomAction) -> Result<Self, Self::Error> {
        if raw.choices.is_empty() {
            anyhow::bail!("random action must have at least one choice");
        }
        Ok(RandomAction {
            choices: raw.choices,
            overrides: raw.overrides,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawRepeatAction")]
pub struct RepeatAction {
    pub actions: Vec<Action>,
    pub count: Resolvable,
    pub overrides: ContextOverride,
}

#[derive(Deserialize)]
struct RawRepeatAction {
    actions: Vec<Action>,
    #[serde(default = "default_one")]
    count: Resolvable,
    #[serde(flatten, default)]
    overrides: ContextOverride,
}

impl TryFrom<RawRepeatAction> for RepeatAction {
    type Error = anyhow::Error;
    fn try_from(raw: RawRepeatAction) -> Result<Self, Self::Error> {
        at_least("count", &raw.count, 0.0)?;
        if raw.actions.is_empty() {
            anyhow::bail!("repeat action must have at least one action");
        }
        Ok(RepeatAction {
            actions: raw.actions,
            count: raw.count,
            overrides: raw.overrides,
        })
    }
}

/// The recursive action union. `id` on the wire (`"damage"`, `"buff"`, ...)
/// selects the variant; composites (`condition`, `random`, `repeat`) hold
/// nested actions and are self-describing recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "snake_case")]
pub enum Action {
    Damage(DamageAction),
    Buff(BuffAction),
    Shield(ShieldAction),
    Heal(HealAction),
    Modify(ModifyAction),
    Text(TextAction),
    Status(StatusAction),
    Condition(ConditionAction),
    Random(RandomAction),
    Repeat(RepeatAction),
}

impl Action {
    pub fn overrides(&self) -> ContextOverride {
        match self {
            Action::Damage(a) => a.overrides.clone(),
            Action::Buff(a) => a.overrides.clone(),
            Action::Shield(a) => a.overrides.clone(),
            Action::Heal(a) => a.overrides.clone(),
            Action::Modify(a) => a.overrides.clone(),
            Action::Text(_) => ContextOverride::default(),
            Action::Status(a) => a.overrides.clone(),
            Action::Condition(a) => a.overrides.clone(),
            Action::Random(a) => a.overrides.clone(),
            Action::Repeat(a) => a.overrides.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Damage(_) => "damage",
            Action::Buff(_) => "buff",
            Action::Shield(_) => "shield",
            Action::Heal(_) => "heal",
            Action::Modify(_) => "modify",
            Action::Text(_) => "text",
            Action::Status(_) => "status",
            Action::Condition(_) => "condition",
            Action::Random(_) => "random",
            Action::Repeat(_) => "repeat",
        }
    }
}
