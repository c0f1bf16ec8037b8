//! Engine session: the shared engine handle plus a cube metadata cache.

use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, trace};

use super::catalog::CatalogEngine;
use super::error::EngineError;
use super::provider::Engine;
use super::types::Cube;
use super::worker_engine::WorkerEngine;
use crate::config::Settings;
use crate::error::{QueryError, QueryResult};
use crate::worker::BridgeClient;

/// A connection to one engine, shared by all requests.
///
/// Cubes are read once and kept until [`Session::flush`]; nothing else is
/// mutable, so concurrent requests only ever contend on the cache map.
#[derive(Clone)]
pub struct Session {
    engine: Arc<dyn Engine>,
    cubes: Arc<DashMap<String, Arc<Cube>>>,
    cache_enabled: bool,
}

impl Session {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            cubes: Arc::new(DashMap::new()),
            cache_enabled: true,
        }
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Open the engine the settings point at.
    pub async fn connect(settings: &Settings) -> QueryResult<Self> {
        let engine: Arc<dyn Engine> = if let Some(catalog) = settings
            .catalog_path()
            .map_err(|e| EngineError::Catalog(e.to_string()))?
        {
            Arc::new(CatalogEngine::from_file(&catalog)?)
        } else if let Some(path) = settings
            .engine_path()
            .map_err(|e| EngineError::Catalog(e.to_string()))?
        {
            let client = BridgeClient::spawn(
                &path,
                &settings.engine.args,
                settings.engine.timeout(),
            )
            .await
            .map_err(EngineError::from)?;
            Arc::new(WorkerEngine::new(Arc::new(client)))
        } else {
            return Err(EngineError::Unsupported(
                "no engine configured: set engine.path or engine.catalog".into(),
            )
            .into());
        };

        Ok(Self::new(engine).with_cache(settings.cache.enabled))
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Cube metadata, normalized. Fails with `UnknownCube` when absent.
    pub async fn cube(&self, name: &str) -> QueryResult<Arc<Cube>> {
        if self.cache_enabled {
            if let Some(cube) = self.cubes.get(name) {
                trace!("cube cache hit: {}", name);
                return Ok(Arc::clone(cube.value()));
            }
        }

        let mut cube = self
            .engine
            .cube(name)
            .await?
            .ok_or_else(|| QueryError::UnknownCube(name.to_string()))?;
        cube.normalize();
        let cube = Arc::new(cube);

        if self.cache_enabled {
            self.cubes.insert(name.to_string(), Arc::clone(&cube));
        }
        Ok(cube)
    }

    pub async fn cube_names(&self) -> QueryResult<Vec<String>> {
        Ok(self.engine.cube_names().await?)
    }

    /// Flush the engine's schema cache and forget cached cubes.
    pub async fn flush(&self) -> QueryResult<()> {
        self.engine.flush().await?;
        self.cubes.clear();
        debug!("session flushed");
        Ok(())
    }
}
