use std::fmt;

use crate::lifecycle::EngineState;

/// Pipeline stage a shader diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Linking the two stages into one pipeline.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
            ShaderStage::Link => f.write_str("link"),
        }
    }
}

/// The shading program could not be built.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} shader failed to compile: {diagnostic}")]
pub struct ShaderCompileError {
    pub stage: ShaderStage,
    pub diagnostic: String,
}

impl ShaderCompileError {
    pub(crate) fn new(stage: ShaderStage, diagnostic: impl Into<String>) -> Self {
        Self {
            stage,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Fatal engine failures surfaced to the caller of [`crate::run`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    ShaderCompile(#[from] ShaderCompileError),
    #[error("image '{locator}' is unavailable: {reason}")]
    ResourceUnavailable { locator: String, reason: String },
    #[error("illegal lifecycle transition from {from:?} to {to:?}")]
    Lifecycle { from: EngineState, to: EngineState },
    #[error("gpu failure: {0}")]
    Gpu(String),
}
