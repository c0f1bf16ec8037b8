//! Engine implementation backed by an engine bridge process.

use std::sync::Arc;

use async_trait::async_trait;

use super::error::EngineResult;
use super::provider::Engine;
use super::types::{Cube, LevelRef, Member};
use crate::result::CellResult;
use crate::worker::protocol::{self, methods, NoParams};
use crate::worker::BridgeClient;

/// `Engine` that forwards every operation to a bridge over NDJSON.
///
/// # Example
///
/// ```ignore
/// use prism::worker::BridgeClient;
/// use prism::engine::WorkerEngine;
///
/// let client = BridgeClient::spawn("./olap-bridge", &[], Duration::from_secs(30)).await?;
/// let engine = WorkerEngine::new(Arc::new(client));
///
/// let cubes = engine.cube_names().await?;
/// ```
pub struct WorkerEngine {
    client: Arc<BridgeClient>,
}

impl WorkerEngine {
    pub fn new(client: Arc<BridgeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Engine for WorkerEngine {
    async fn cube_names(&self) -> EngineResult<Vec<String>> {
        let response: protocol::CubeNamesResponse = self
            .client
            .request(methods::CUBE_NAMES, NoParams::default())
            .await?;
        Ok(response.cubes)
    }

    async fn cube(&self, name: &str) -> EngineResult<Option<Cube>> {
        let response: protocol::CubeResponse = self
            .client
            .request(
                methods::CUBE,
                protocol::CubeParams {
                    cube: name.to_string(),
                },
            )
            .await?;
        Ok(response.cube)
    }

    async fn member(&self, cube: &str, expression: &str) -> EngineResult<Option<Member>> {
        let response: protocol::MemberResponse = self
            .client
            .request(
                methods::MEMBER,
                protocol::MemberParams {
                    cube: cube.to_string(),
                    expression: expression.to_string(),
                },
            )
            .await?;
        Ok(response.member)
    }

    async fn ancestors(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>> {
        let response: protocol::AncestorsResponse = self
            .client
            .request(
                methods::ANCESTORS,
                protocol::AncestorsParams {
                    cube: cube.to_string(),
                    member: member.full_name.clone(),
                },
            )
            .await?;
        Ok(response.ancestors)
    }

    async fn children(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>> {
        let response: protocol::ChildrenResponse = self
            .client
            .request(
                methods::CHILDREN,
                protocol::ChildrenParams {
                    cube: cube.to_string(),
                    member: member.full_name.clone(),
                },
            )
            .await?;
        Ok(response.children)
    }

    async fn level_members(&self, cube: &str, level: &LevelRef) -> EngineResult<Vec<Member>> {
        let response: protocol::LevelMembersResponse = self
            .client
            .request(
                methods::LEVEL_MEMBERS,
                protocol::LevelMembersParams {
                    cube: cube.to_string(),
                    level: level.clone(),
                },
            )
            .await?;
        Ok(response.members)
    }

    async fn execute(&self, cube: &str, mdx: &str) -> EngineResult<CellResult> {
        let result: CellResult = self
            .client
            .request(
                methods::EXECUTE,
                protocol::ExecuteParams {
                    cube: cube.to_string(),
                    mdx: mdx.to_string(),
                },
            )
            .await?;
        Ok(result)
    }

    async fn flush(&self) -> EngineResult<()> {
        let _: protocol::FlushResponse = self
            .client
            .request(methods::FLUSH, NoParams::default())
            .await?;
        Ok(())
    }
}
