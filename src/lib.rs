pub mod dsl;
pub mod registry;
pub mod schema;
pub mod engine;

/// dimensional types
pub type Hp = i32;
pub type Stat = i32;
pub type Turn = i32;

// fighter stat ceilings
pub const MAX_INT_STAT: Stat = 999;
pub const MAX_CHARGE_BONUS: f64 = 10.0;
pub const MAX_BUFFS: usize = 4;
pub const DEFAULT_MAX_TURNS: Turn = 30;
pub const MAX_SIDES: usize = 2;
pub const DEFAULT_STARTING_SHIELD: Stat = 0;
pub const DEFAULT_STARTING_CHARGE: Stat = 0;

// damage formula tuning
pub const CHARGE_BONUS_SCALE: f64 = 0.5;
pub const STAB_MULTIPLIER: f64 = 1.25;
pub const AD_BASELINE: f64 = 1.0;
pub const AD_SCALE: f64 = 3.0;
pub const AD_SHARPNESS: f64 = 0.004;
pub const STAT_SOFT_EXPONENT: f64 = 0.9;
pub const CHARGE_INFLUENCE: f64 = 0.5;

pub const FIGHTER_TYPES: &[&str] = &["dev", "opti", "syst", "data", "proj", "team", "none"];
pub const MOVE_CATEGORIES: &[&str] = &["damage", "support", "special", "none"];
pub const STATUS_IDS: &[&str] = &["javaBien", "poison"];
pub const LOG_COLORS: &[&str] = &[
    "black",
    "dark_blue",
    "dark_green",
    "dark_aqua",
    "dark_red",
    "dark_purple",
    "gold",
    "gray",
    "dark_gray",
    "blue",
    "green",
    "aqua",
    "red",
    "light_purple",
    "yellow",
    "white",
];
pub const LOG_STYLES: &[&str] = &["bold", "italic", "underlined", "strikethrough", "obfuscated"];
pub const CONDITION_KINDS: &[&str] = &["hp_below", "hp_above", "has_status", "lacks_status"];
pub const STAT_FIELDS: &[&str] = &["hp", "attack", "defense", "shield", "charge", "charge_bonus"];
