//! Protocol types for engine bridge communication.
//!
//! One JSON object per line in each direction. Requests carry a unique ID
//! that the bridge echoes back, so several requests may be in flight.

use serde::{Deserialize, Serialize};

use super::error::WorkerError;
use crate::engine::{Cube, LevelRef, Member};

// ============================================================================
// Request/Response Envelope
// ============================================================================

/// Request envelope sent to the bridge.
#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: String,
    /// Method name (e.g., "olap.execute").
    pub method: String,
    /// Method-specific parameters.
    pub params: serde_json::Value,
}

/// Response envelope received from the bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response corresponds to.
    pub id: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Result data (present if success = true).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Error information (present if success = false).
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    /// Codes the bridge shares with us get their own variant; anything
    /// else (engine query failures included) stays `Remote`.
    pub fn into_error(self) -> WorkerError {
        match self.code.as_str() {
            "CONNECTION_FAILED" => WorkerError::ConnectionFailed(self.message),
            "INVALID_REQUEST" => WorkerError::InvalidRequest(self.message),
            "METHOD_NOT_FOUND" => WorkerError::MethodNotFound(self.message),
            _ => WorkerError::remote(self.code, self.message),
        }
    }
}

// ============================================================================
// Request Parameters
// ============================================================================

/// Parameters for `olap.cube_names` and `olap.flush`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct NoParams {}

/// Parameters for `olap.cube`.
#[derive(Debug, Clone, Serialize)]
pub struct CubeParams {
    pub cube: String,
}

/// Parameters for `olap.member`.
#[derive(Debug, Clone, Serialize)]
pub struct MemberParams {
    pub cube: String,
    /// Member expression as written by the caller.
    pub expression: String,
}

/// Parameters for `olap.ancestors`.
#[derive(Debug, Clone, Serialize)]
pub struct AncestorsParams {
    pub cube: String,
    /// Unique name of the member whose ancestors are wanted.
    pub member: String,
}

/// Parameters for `olap.children`.
#[derive(Debug, Clone, Serialize)]
pub struct ChildrenParams {
    pub cube: String,
    pub member: String,
}

/// Parameters for `olap.level_members`.
#[derive(Debug, Clone, Serialize)]
pub struct LevelMembersParams {
    pub cube: String,
    #[serde(flatten)]
    pub level: LevelRef,
}

/// Parameters for `olap.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteParams {
    pub cube: String,
    pub mdx: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Response for `olap.cube_names`.
#[derive(Debug, Clone, Deserialize)]
pub struct CubeNamesResponse {
    pub cubes: Vec<String>,
}

/// Response for `olap.cube`.
#[derive(Debug, Clone, Deserialize)]
pub struct CubeResponse {
    #[serde(default)]
    pub cube: Option<Cube>,
}

/// Response for `olap.member`.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberResponse {
    #[serde(default)]
    pub member: Option<Member>,
}

/// Response for `olap.ancestors`.
#[derive(Debug, Clone, Deserialize)]
pub struct AncestorsResponse {
    pub ancestors: Vec<Member>,
}

/// Response for `olap.children`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChildrenResponse {
    pub children: Vec<Member>,
}

/// Response for `olap.level_members`.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelMembersResponse {
    pub members: Vec<Member>,
}

/// Response for `olap.flush`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FlushResponse {
    #[serde(default)]
    pub flushed: bool,
}

// ============================================================================
// Method Names
// ============================================================================

/// Method name constants.
pub mod methods {
    pub const CUBE_NAMES: &str = "olap.cube_names";
    pub const CUBE: &str = "olap.cube";
    pub const MEMBER: &str = "olap.member";
    pub const ANCESTORS: &str = "olap.ancestors";
    pub const CHILDREN: &str = "olap.children";
    pub const LEVEL_MEMBERS: &str = "olap.level_members";
    pub const EXECUTE: &str = "olap.execute";
    pub const FLUSH: &str = "olap.flush";
}
