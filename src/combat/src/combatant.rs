// src/combat/src/combatant.rs

/// 表示可以参加战斗的活体
///
/// The simulation builds a short-lived view of an entity (attributes plus
/// the held weapon) and hands it to the combat rules through this trait.
pub trait Combatant {
    /// 获取名称
    fn name(&self) -> &str;

    /// 获取力量
    fn strength(&self) -> u32;

    /// 获取韧性（减伤）
    fn toughness(&self) -> u32;

    /// 获取敏捷（命中与闪避）
    fn agility(&self) -> u32;

    /// Flat damage added by whatever the combatant attacks with.
    fn weapon_damage(&self) -> u32 {
        0
    }

    /// Extra critical chance on top of the base chance.
    fn crit_bonus(&self) -> f32 {
        0.0
    }
}
