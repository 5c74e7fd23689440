//src/items/src/lib.rs
//! Item metadata attached to item entities, and the equipment slots items
//! can occupy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// 物品类型
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Ammunition,
    Consumable,
    Armor,
    Misc,
}

/// Numeric effects an item carries.
#[derive(
    Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[strum(serialize_all = "camelCase")]
pub enum ItemEffect {
    RaiseHealth,
    RaiseStrength,
    /// Damage when swung, or when fired from this weapon.
    HitDamage,
    /// Damage when thrown.
    ThrowDamage,
}

/// 装备位
#[derive(
    Clone, Copy, Debug, Display, EnumIter, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EquipmentSlot {
    #[strum(serialize = "head")]
    Head,
    #[strum(serialize = "body")]
    Body,
    #[strum(serialize = "right hand")]
    RightHand,
    #[strum(serialize = "left hand")]
    LeftHand,
    #[strum(serialize = "feet")]
    Feet,
}

/// Item component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub effects: BTreeMap<ItemEffect, i32>,
    /// For weapons: the ammunition type they fire. For ammunition: what it is.
    pub ammunition: Option<String>,
    /// Set on the item currently nocked or about to be thrown.
    pub throwing: bool,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            effects: BTreeMap::new(),
            ammunition: None,
            throwing: false,
        }
    }

    pub fn weapon(name: impl Into<String>, hit_damage: i32) -> Self {
        Self::new(name, ItemKind::Weapon).with_effect(ItemEffect::HitDamage, hit_damage)
    }

    /// A launcher such as a bow; fires ammunition of `ammunition` type.
    pub fn launcher(name: impl Into<String>, hit_damage: i32, ammunition: impl Into<String>) -> Self {
        Self::weapon(name, hit_damage).with_ammunition(ammunition)
    }

    pub fn ammunition(name: impl Into<String>, ammunition: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Ammunition).with_ammunition(ammunition)
    }

    pub fn consumable(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Consumable)
    }

    pub fn with_effect(mut self, effect: ItemEffect, value: i32) -> Self {
        self.effects.insert(effect, value);
        self
    }

    pub fn with_ammunition(mut self, ammunition: impl Into<String>) -> Self {
        self.ammunition = Some(ammunition.into());
        self
    }

    pub fn effect(&self, effect: ItemEffect) -> Option<i32> {
        self.effects.get(&effect).copied()
    }

    pub fn is_weapon(&self) -> bool {
        self.kind == ItemKind::Weapon
    }

    /// True for ammunition items of exactly this type.
    pub fn is_ammunition_of(&self, ammunition: &str) -> bool {
        self.kind == ItemKind::Ammunition && self.ammunition.as_deref() == Some(ammunition)
    }

    /// True for weapons that need ammunition to fire.
    pub fn fires_ammunition(&self) -> bool {
        self.is_weapon() && self.ammunition.is_some()
    }
}
