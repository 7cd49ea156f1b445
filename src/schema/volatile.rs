use crate::schema::stats::{Buff, FighterStats, Status};
use crate::{MAX_BUFFS, MAX_INT_STAT, STAT_FIELDS};

/// Mutable in-battle state for one fighter: current stats, active buffs and
/// statuses, and the base/buffed ceilings used to rebalance proportionally
/// when a buff changes a stat's max.
#[derive(Debug, Clone)]
pub struct FighterVolatile {
    pub base_id: String,
    pub fighter_type: String,
    pub current_stats: FighterStats,
    pub current_buffs: Vec<Buff>,
    pub current_status: Vec<Status>,
    pub base_max_stats: FighterStats,
    pub buffed_max_stats: FighterStats,
}

impl FighterVolatile {
    pub fn new(
        base_id: impl Into<String>,
        fighter_type: impl Into<String>,
        starting_stats: FighterStats,
        base_max_stats: FighterStats,
        starting_buffs: Vec<Buff>,
        starting_status: Vec<Status>,
    ) -> Self {
        let mut volatile = FighterVolatile {
            base_id: base_id.into(),
            fighter_type: fighter_type.into(),
            current_stats: starting_stats,
            current_buffs: Vec::new(),
            current_status: starting_status,
            base_max_stats,
            buffed_max_stats: base_max_stats,
        };
        for buff in starting_buffs.into_iter().take(MAX_BUFFS) {
            volatile.apply_buff(buff);
        }
        volatile
    }

    pub fn alive(&self) -> bool {
        self.current_stats.hp > 0
    }

    pub fn has_shield(&self) -> bool {
        self.current_stats.shield > 0
    }

    fn recompute_buffed_max(&mut self) {
        let mut buffed = self.base_max_stats;
        for buff in &self.current_buffs {
            let delta = buff.amount.round() as i32;
            match buff.stat.as_str() {
                "hp" => buffed.hp = (buffed.hp + delta).clamp(1, MAX_INT_STAT),
                "attack" => buffed.attack = (buffed.attack + delta).clamp(0, MAX_INT_STAT),
                "defense" => buffed.defense = (buffed.defense + delta).clamp(0, MAX_INT_STAT),
                "shield" => buffed.shield = (buffed.shield + delta).clamp(0, MAX_INT_STAT),
                "charge" => buffed.charge = (buffed.charge + delta).clamp(0, MAX_INT_STAT),
                _ => {}
            }
        }
        self.buffed_max_stats = buffed;
    }

    /// Rescale `current_stats` proportionally so that a ceiling change from
    /// a buff (e.g. max hp rising) doesn't silently clip or inflate the
    /// fraction of the bar the fighter already had filled.
    fn rebalance(&mut self, field: &str, old_max: i32, new_max: i32) {
        if old_max == new_max || old_max <= 0 {
            return;
        }
        let current = self.current_stats.get(field).unwrap_or(0) as f64;
        let ratio = current / old_max as f64;
        let rescaled = (ratio * new_max as f64).round() as i32;
        self.set_stat(field, rescaled.clamp(0, new_max));
    }

    fn get_stat(&self, field: &str) -> i32 {
        self.current_stats.get(field).unwrap_or(0)
    }

    fn set_stat(&mut self, field: &str, value: i32) {
        match field {
            "hp" => self.current_stats.hp = value,
            "attack" => self.current_stats.attack = value,
            "defense" => self.current_stats.defense = value,
            "shield" => self.current_stats.shield = value,
            "charge" => self.current_stats.charge = value,
            _ => {}
        }
    }

    pub fn apply_buff(&mut self, buff: Buff) {
        if !STAT_FIELDS.contains(&buff.stat.as_str()) || buff.stat == "charge_bonus" {
            log::warn!("ignoring buff on unbuffable field '{}'", buff.stat);
            return;
        }
        if self.current_buffs.len() >= MAX_BUFFS {
            log::debug!("buff list full, dropping oldest to admit new buff on '{}'", buff.stat);
            self.current_buffs.remove(0);
        }
        let old_max = self.buffed_max_stats.get(&buff.stat).unwrap_or(0);
        self.current_buffs.push(buff.clone());
        self.recompute_buffed_max();
        let new_max = self.buffed_max_stats.get(&buff.stat).unwrap_or(0);
        self.rebalance(&buff.stat, old_max, new_max);
    }

    /// Drop every buff on `stat` (e.g. a dispel effect), rebalancing the
    /// affected stat back down immediately.
    pub fn remove_buffs_on(&mut self, stat: &str) {
        let old_max = self.buffed_max_stats.get(stat).unwrap_or(0);
        self.current_buffs.retain(|b| b.stat != stat);
        self.recompute_buffed_max();
        let new_max = self.buffed_max_stats.get(stat).unwrap_or(0);
        self.rebalance(stat, old_max, new_max);
    }

    /// Decrement all finite-duration buffs by one turn, dropping any that
    /// expire. Buffs with `duration == -1` never tick.
    pub fn tick_buffs(&mut self) {
        let before: Vec<(String, i32)> = self
            .current_buffs
            .iter()
            .map(|b| (b.stat.clone(), self.buffed_max_stats.get(&b.stat).unwrap_or(0)))
            .collect();
        for buff in &mut self.current_buffs {
            if buff.duration > 0 {
                buff.duration -= 1;
            }
        }
        self.current_buffs.retain(|b| b.duration != 0);
        self.recompute_buffed_max();
        for (stat, old_max) in before {
            let new_max = self.buffed_max_stats.get(&stat).unwrap_or(0);
            self.rebalance(&stat, old_max, new_max);
        }
    }

    /// Apply incoming damage, shield absorbing first. Returns the amount
    /// that actually reached hp.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let mut remaining = amount;
        if self.current_stats.shield > 0 {
            let absorbed = remaining.min(self.current_stats.shield);
            self.current_stats.shield -= absorbed;
            remaining -= absorbed;
        }
        let applied = remaining.min(self.current_stats.hp);
        self.current_stats.hp -= applied;
        applied
    }

    /// Add (or subtract) `delta` from `field`, clamped to that field's
    /// buffed ceiling. Returns the delta actually applied.
    pub fn add_stat(&mut self, field: &str, delta: i32) -> anyhow::Result<i32> {
        if !STAT_FIELDS.contains(&field) {
            anyhow::bail!("unknown stat field: {field}");
        }
        if field == "charge_bonus" {
            anyhow::bail!("charge_bonus is not an addressable int stat");
        }
        let max = self.buffed_max_stats.get(field).unwrap_or(MAX_INT_STAT);
        let before = self.get_stat(field);
        let after = (before + delta).clamp(0, max);
        self.set_stat(field, after);
        Ok(after - before)
    }

    /// Convenience constructor for a fighter with no type, buffs, or
    /// status: current stats equal their own ceiling except for the given
    /// charge cap. Handy for tests and quick demos; content-driven battles
    /// go through [`Fighter::starting_stats`](crate::schema::fighter::Fighter).
    pub fn test_stub(hp: i32, attack: i32, defense: i32, charge: i32, charge_cap: i32) -> Self {
        let stats = FighterStats {
            hp,
            attack,
            defense,
            shield: 0,
            charge,
            charge_bonus: 0.0,
        };
        let max_stats = FighterStats {
            hp,
            attack,
            defense,
            shield: hp,
            charge: charge_cap,
            charge_bonus: 0.0,
        };
        FighterVolatile::new("stub", "none", stats, max_stats, Vec::new(), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shield_absorbs_before_hp() {
        let mut f = FighterVolatile::test_stub(100, 10, 10, 0, 0);
        f.current_stats.shield = 20;
        let applied = f.take_damage(30);
        assert_eq!(applied, 10);
        assert_eq!(f.current_stats.hp, 90);
        assert_eq!(f.current_stats.shield, 0);
    }

    #[test]
    fn buff_rebalances_current_proportionally() {
        // Fighter at hp 150/300 receives a +100 hp buff (cap -> 400); new
        // hp = round(150 * 400/300) = 200.
        let mut f = FighterVolatile::test_stub(300, 10, 10, 0, 0);
        f.current_stats.hp = 150;
        f.apply_buff(Buff::new("hp", 100.0, -1));
        assert_eq!(f.buffed_max_stats.hp, 400);
        assert_eq!(f.current_stats.hp, 200);
    }

    #[test]
    fn tick_buffs_expires_and_rebalances_back() {
        let mut f = FighterVolatile::test_stub(300, 10, 10, 0, 0);
        f.current_stats.hp = 150;
        f.apply_buff(Buff::new("hp", 100.0, 1));
        assert_eq!(f.current_stats.hp, 200);
        f.tick_buffs();
        assert!(f.current_buffs.is_empty());
        assert_eq!(f.buffed_max_stats.hp, 300);
        assert_eq!(f.current_stats.hp, 150);
    }

    #[test]
    fn infinite_buff_never_ticks() {
        let mut f = FighterVolatile::test_stub(100, 10, 10, 0, 0);
        f.apply_buff(Buff::new("attack", 5.0, -1));
        for _ in 0..10 {
            f.tick_buffs();
        }
        assert_eq!(f.current_buffs.len(), 1);
    }

    #[test]
    fn add_stat_clamps_to_buffed_max() {
        let mut f = FighterVolatile::test_stub(100, 10, 10, 0, 50);
        let delta = f.add_stat("charge", 1000).unwrap();
        assert_eq!(delta, 50);
        assert_eq!(f.current_stats.charge, 50);
    }
}
