//! 模拟核心的错误处理模块
//!
//! Illegal moves, unreachable paths and full inventories are *not* errors:
//! the simulation resolves them as no-ops. What ends up here are broken
//! invariants (a system found an entity without a component it requires),
//! configuration problems, and level bookkeeping mistakes.

use hecs::Entity;
use thiserror::Error;

/// 模拟运行过程中可能出现的错误类型
#[derive(Debug, Error)]
pub enum GameError {
    /// An entity reached a system without a component the system relies on.
    #[error("entity {entity:?} is missing required component `{component}`")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    /// 没有找到玩家实体
    #[error("no player entity in the world")]
    NoPlayer,

    /// 请求的楼层不存在
    #[error("no such level: {0}")]
    NoSuchLevel(usize),

    /// 坐标越界
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} map")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    /// A mode change was requested from a mode that cannot make it.
    #[error("cannot {action} while in {mode} mode")]
    InvalidModeTransition { action: &'static str, mode: String },

    /// 配置解析错误
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// IO操作错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GameError {
    /// Shorthand used by systems when a required component lookup fails.
    pub fn missing<T>(entity: Entity) -> Self {
        let full = std::any::type_name::<T>();
        let component = full.rsplit("::").next().unwrap_or(full);
        GameError::MissingComponent { entity, component }
    }
}

/// Result alias used across the workspace.
pub type GameResult<T> = Result<T, GameError>;

/// 将错误转换为用户友好的消息
pub fn handle_error(error: &GameError) -> String {
    match error {
        GameError::NoPlayer => "The player is gone.".to_string(),
        GameError::Io(e) => match e.kind() {
            std::io::ErrorKind::NotFound => "Config file not found".to_string(),
            std::io::ErrorKind::PermissionDenied => "Permission denied reading config".to_string(),
            _ => format!("IO error: {}", e),
        },
        _ => error.to_string(),
    }
}
