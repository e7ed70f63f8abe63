use thiserror::Error;

use crate::scene_graph::NodeId;

/// Errors reported synchronously by mutating scene, camera and loop operations.
///
/// A rejected operation always leaves the previous state untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("frame loop is already running")]
    AlreadyRunning,

    #[error("unknown or disposed node {0:?}")]
    UnknownNode(NodeId),

    #[error("the scene root cannot be {0}")]
    RootNode(&'static str),

    #[error("unknown or disposed {0}")]
    UnknownResource(&'static str),

    #[error("{kind} is still referenced by {count} live renderable(s)")]
    ResourceInUse { kind: &'static str, count: usize },
}

impl SceneError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SceneError::InvalidParameter(message.into())
    }
}

pub type SceneResult<T> = Result<T, SceneError>;
