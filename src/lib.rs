//! Turn-based dungeon-crawl simulation core.
//!
//! A hecs world plus shared [`ecs::Resources`], advanced one turn at a time
//! by [`turn_system::TurnScheduler`] running the behavior systems in
//! [`systems`] in a fixed order.

pub mod ecs;
pub mod entity_factory;
pub mod inventory;
pub mod spatial;
pub mod systems;
pub mod turn_system;

pub use combat;
pub use dungeon;
pub use error;
pub use items;
