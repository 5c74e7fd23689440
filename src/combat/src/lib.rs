// src/combat/src/lib.rs
//! Stateless attack resolution.
//!
//! Nothing here touches the world: callers roll with their own RNG, get an
//! [`AttackOutcome`] back, and apply damage and status effects themselves.

use rand::Rng;

pub mod combatant;

pub use crate::combatant::Combatant;

/// Handles combat interactions between entities
pub struct Combat;

/// Combat configuration constants
pub mod constants {
    pub const BASE_HIT_CHANCE: f32 = 0.8; // Base hit chance
    pub const MIN_HIT_CHANCE: f32 = 0.05; // Minimum possible hit chance
    pub const MAX_HIT_CHANCE: f32 = 0.95; // Maximum possible hit chance
    pub const CRIT_MULTIPLIER: f32 = 1.5; // Critical damage multiplier
    pub const BASE_CRIT_CHANCE: f32 = 0.1; // Base critical chance
    pub const DEFENSE_CAP: f32 = 0.8; // Maximum damage reduction from toughness
    pub const MIN_DAMAGE: u32 = 1; // Minimum damage dealt on a hit
    pub const THROWN_STRENGTH_SHARE: u32 = 4; // strength / 4 added to thrown items
}

/// How the blow is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackKind {
    /// Swung in melee; strength counts fully.
    Melee,
    /// Thrown by hand; a quarter of strength counts.
    Thrown,
    /// Fired from a launcher; strength does not count.
    Fired,
}

/// Result of one attack roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackOutcome {
    Miss,
    Hit { damage: u32, critical: bool },
}

impl AttackOutcome {
    pub fn damage(&self) -> u32 {
        match self {
            AttackOutcome::Miss => 0,
            AttackOutcome::Hit { damage, .. } => *damage,
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, AttackOutcome::Hit { critical: true, .. })
    }

    /// "hits" / "misses" / "critically hits", for action log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            AttackOutcome::Miss => "misses",
            AttackOutcome::Hit { critical: true, .. } => "critically hits",
            AttackOutcome::Hit { .. } => "hits",
        }
    }
}

impl Combat {
    /// Calculate hit chance: base + (agility difference) / 20, clamped.
    pub fn hit_chance<T: Combatant + ?Sized, U: Combatant + ?Sized>(attacker: &T, defender: &U) -> f32 {
        let diff = attacker.agility() as f32 - defender.agility() as f32;
        let chance = constants::BASE_HIT_CHANCE + diff / 20.0;
        chance.clamp(constants::MIN_HIT_CHANCE, constants::MAX_HIT_CHANCE)
    }

    pub fn crit_chance<T: Combatant + ?Sized>(attacker: &T) -> f32 {
        (constants::BASE_CRIT_CHANCE + attacker.crit_bonus()).clamp(0.0, 1.0)
    }

    /// Damage before toughness.
    pub fn raw_damage<T: Combatant + ?Sized>(attacker: &T, kind: AttackKind) -> u32 {
        let strength = match kind {
            AttackKind::Melee => attacker.strength(),
            AttackKind::Thrown => attacker.strength() / constants::THROWN_STRENGTH_SHARE,
            AttackKind::Fired => 0,
        };
        strength + attacker.weapon_damage()
    }

    /// Toughness reduces damage by a percentage (capped), never below the minimum.
    pub fn mitigate<U: Combatant + ?Sized>(raw: f32, defender: &U) -> u32 {
        let toughness = defender.toughness() as f32;
        let factor = (toughness / (toughness + 5.0)).min(constants::DEFENSE_CAP);
        ((raw * (1.0 - factor)).round() as u32).max(constants::MIN_DAMAGE)
    }

    /// Resolve a single attack.
    pub fn resolve<T, U, R>(attacker: &T, defender: &U, kind: AttackKind, rng: &mut R) -> AttackOutcome
    where
        T: Combatant + ?Sized,
        U: Combatant + ?Sized,
        R: Rng,
    {
        if !rng.random_bool(Self::hit_chance(attacker, defender) as f64) {
            return AttackOutcome::Miss;
        }

        // 80-120% variation
        let variation = rng.random_range(0.8..=1.2f32);
        let mut raw = Self::raw_damage(attacker, kind) as f32 * variation;

        let critical = rng.random_bool(Self::crit_chance(attacker) as f64);
        if critical {
            raw *= constants::CRIT_MULTIPLIER;
        }

        AttackOutcome::Hit {
            damage: Self::mitigate(raw, defender),
            critical,
        }
    }
}
