//! Error types for tree and DOM operations
//!
//! Simple, flat error hierarchy. Every JSON shape violation gets its own
//! variant so callers can tell exactly which field was wrong.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Document has no body element")]
    NoBody,

    #[error("Document has no root node")]
    NoRoot,

    #[error("Cannot insert node {child} under {parent}: would create a cycle")]
    HierarchyRequest { parent: u32, child: u32 },

    #[error("CDP protocol error: {0}")]
    CdpError(String),

    #[error("Maximum nesting depth exceeded: {current} > {max}")]
    MaxDepthExceeded { current: usize, max: usize },

    // JSON shape validation
    #[error("JSON node is not an object")]
    ExpectedObject,

    #[error("JSON forest is not an array")]
    ExpectedArray,

    #[error("Missing or non-integer nodeType")]
    MissingNodeType,

    #[error("Unsupported nodeType: {0}")]
    UnsupportedNodeType(i64),

    #[error("Missing or non-string tagName")]
    MissingTagName,

    #[error("Missing or non-array attributes")]
    MissingAttributes,

    #[error("Missing or non-array children")]
    MissingChildren,

    #[error("Attribute entry missing string name")]
    MissingAttributeName,

    #[error("Attribute entry missing string value")]
    MissingAttributeValue,

    #[error("Missing or non-string data")]
    MissingData,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Write error: {0}")]
    Fmt(#[from] std::fmt::Error),
}
