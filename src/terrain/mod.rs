//! Chunk grid and build pipeline
//!
//! A build walks a fixed sequence of phases. Every phase fans its units out
//! over the worker pool and waits for all of them before the next one may
//! start:
//!
//! 1. one height plane per column
//! 2. one air-filled density stack per column
//! 3. carve each stack from its plane
//! 4. slice stacks into chunks and mesh each chunk
//! 5. build and mesh connectors between neighbouring chunks
//! 6. bake world-space meshes
//! 7. drop planes and stacks

pub mod chunk;
pub mod connector;
pub mod jobs;

pub use chunk::{Chunk, ChunkCoord};
pub use connector::{build_volume, Connector, ConnectorKey, ConnectorKind};
pub use jobs::PhaseRunner;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::TerrainConfig;
use crate::curve::SampledCurve;
use crate::error::{Result, TerrainError};
use crate::field::ScalarField2D;
use crate::mesh::{self, MeshData};
use crate::noise_field::generate_plane;
use crate::volume::{self, DensityVolume, Dims3, AIR_DENSITY};

/// Where a [`TerrainBuild`] is in its pipeline. Ordered by progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildPhase {
    Seeded,
    PlanesGenerated,
    VolumesInitialized,
    VolumesCarved,
    ChunksMeshed,
    ConnectorsBuilt,
    MeshesFinalized,
    Cleanup,
}

impl BuildPhase {
    pub const ALL: [BuildPhase; 8] = [
        BuildPhase::Seeded,
        BuildPhase::PlanesGenerated,
        BuildPhase::VolumesInitialized,
        BuildPhase::VolumesCarved,
        BuildPhase::ChunksMeshed,
        BuildPhase::ConnectorsBuilt,
        BuildPhase::MeshesFinalized,
        BuildPhase::Cleanup,
    ];

    /// The phase that follows this one, `None` after cleanup.
    pub fn next(self) -> Option<BuildPhase> {
        let idx = Self::ALL.iter().position(|&p| p == self)?;
        Self::ALL.get(idx + 1).copied()
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Seeded => "seeded",
            BuildPhase::PlanesGenerated => "planes_generated",
            BuildPhase::VolumesInitialized => "volumes_initialized",
            BuildPhase::VolumesCarved => "volumes_carved",
            BuildPhase::ChunksMeshed => "chunks_meshed",
            BuildPhase::ConnectorsBuilt => "connectors_built",
            BuildPhase::MeshesFinalized => "meshes_finalized",
            BuildPhase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Counters and timings gathered during a build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildStats {
    pub columns: usize,
    pub chunks: usize,
    pub connectors: usize,
    /// Connector candidates skipped because a neighbour does not exist
    pub skipped_connectors: usize,
    /// Nodes set solid while carving
    pub solid_nodes: usize,
    pub chunk_vertices: usize,
    pub connector_vertices: usize,
    /// Wall time of each phase transition, in pipeline order
    pub timings: Vec<(BuildPhase, Duration)>,
}

impl BuildStats {
    pub fn total_time(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }
}

/// A terrain build in progress.
///
/// Each step method advances exactly one phase and fails with
/// [`TerrainError::PhaseOrder`] when called out of turn.
pub struct TerrainBuild {
    config: TerrainConfig,
    curve: SampledCurve,
    runner: PhaseRunner,
    phase: BuildPhase,
    planes: HashMap<(i32, i32), ScalarField2D>,
    stacks: HashMap<(i32, i32), DensityVolume>,
    chunks: HashMap<ChunkCoord, Chunk>,
    connectors: HashMap<ConnectorKey, Connector>,
    stats: BuildStats,
}

impl TerrainBuild {
    /// Validate `config` and prepare the shared curve table and worker pool.
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;
        let curve = SampledCurve::build(&config.curve, config.curve_samples)?;
        let runner = PhaseRunner::new(config.threads)?;

        info!(
            seed = config.seed,
            columns = config.column_count(),
            chunks = config.chunk_count(),
            nodes = config.nodes_per_axis,
            "terrain build seeded"
        );

        Ok(Self {
            config,
            curve,
            runner,
            phase: BuildPhase::Seeded,
            planes: HashMap::new(),
            stacks: HashMap::new(),
            chunks: HashMap::new(),
            connectors: HashMap::new(),
            stats: BuildStats::default(),
        })
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn connector(&self, key: &ConnectorKey) -> Option<&Connector> {
        self.connectors.get(key)
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// Planes and stacks still held (zero after cleanup).
    pub fn intermediate_count(&self) -> usize {
        self.planes.len() + self.stacks.len()
    }

    fn expect_phase(&self, expected: BuildPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TerrainError::PhaseOrder { expected, found: self.phase })
        }
    }

    fn advance(&mut self, to: BuildPhase, started: Instant) {
        self.stats.timings.push((to, started.elapsed()));
        self.phase = to;
    }

    fn columns(&self) -> Vec<(i32, i32)> {
        let mut columns = Vec::with_capacity(self.config.column_count());
        for x in self.config.column_range_x() {
            for z in self.config.column_range_z() {
                columns.push((x, z));
            }
        }
        columns
    }

    /// Phase 1: one height plane per column.
    pub fn generate_planes(&mut self) -> Result<()> {
        self.expect_phase(BuildPhase::Seeded)?;
        let started = Instant::now();

        let config = &self.config;
        let results = self.runner.run(BuildPhase::PlanesGenerated, self.columns(), |column| {
            (column, generate_plane(config, column))
        });

        for (column, plane) in results {
            self.planes.insert(column, plane?);
        }
        self.stats.columns = self.planes.len();

        self.advance(BuildPhase::PlanesGenerated, started);
        Ok(())
    }

    /// Phase 2: an air-filled stack spanning every vertical chunk of each column.
    pub fn initialize_volumes(&mut self) -> Result<()> {
        self.expect_phase(BuildPhase::PlanesGenerated)?;
        let started = Instant::now();

        let n = self.config.nodes_per_axis;
        let dims = Dims3::new(n, self.config.stack_height(), n);
        let columns: Vec<_> = self.planes.keys().copied().collect();
        let stacks = self.runner.run(BuildPhase::VolumesInitialized, columns, |column| {
            (column, volume::init_stack(dims, AIR_DENSITY))
        });
        self.stacks.extend(stacks);

        self.advance(BuildPhase::VolumesInitialized, started);
        Ok(())
    }

    /// Phase 3: carve every stack from its column's plane.
    pub fn carve_volumes(&mut self) -> Result<()> {
        self.expect_phase(BuildPhase::VolumesInitialized)?;
        let started = Instant::now();

        let starting_height = self.config.base_height();
        let stack_height = self.config.stack_height();
        let height_multiplier = self.config.height_multiplier;
        let planes = &self.planes;
        let curve = &self.curve;

        let units: Vec<_> = self.stacks.drain().collect();
        let carved = self.runner.run(BuildPhase::VolumesCarved, units, |(column, mut stack)| {
            let written = match planes.get(&column) {
                Some(plane) => volume::carve(
                    plane,
                    curve,
                    starting_height,
                    stack_height,
                    height_multiplier,
                    &mut stack,
                ),
                None => 0,
            };
            (column, stack, written)
        });

        for (column, stack, written) in carved {
            self.stats.solid_nodes += written;
            self.stacks.insert(column, stack);
        }
        debug!(solid_nodes = self.stats.solid_nodes, "stacks carved");

        self.advance(BuildPhase::VolumesCarved, started);
        Ok(())
    }

    /// Phase 4: slice stacks into chunks and mesh each one.
    pub fn mesh_chunks(&mut self) -> Result<()> {
        self.expect_phase(BuildPhase::VolumesCarved)?;
        let started = Instant::now();

        let n = self.config.nodes_per_axis;
        let surface_level = self.config.surface_level;
        let fidelity = self.config.fidelity;
        let stacks = &self.stacks;

        let mut coords = Vec::with_capacity(self.config.chunk_count());
        for &(x, z) in stacks.keys() {
            for y in 0..self.config.vertical_chunks {
                coords.push(ChunkCoord::new(x, y as i32, z));
            }
        }

        let chunks = self.runner.run(BuildPhase::ChunksMeshed, coords, |coord| {
            let stack = stacks.get(&coord.column())?;
            let volume = volume::slice_chunk(stack, n, coord.y as usize);
            let vertices = mesh::extract(&volume, surface_level, fidelity);
            Some(Chunk::new(coord, volume, vertices))
        });

        for chunk in chunks.into_iter().flatten() {
            self.stats.chunk_vertices += chunk.vertex_count();
            self.chunks.insert(chunk.coord(), chunk);
        }
        self.stats.chunks = self.chunks.len();

        self.advance(BuildPhase::ChunksMeshed, started);
        Ok(())
    }

    /// Phase 5: build every connector whose chunks all exist.
    ///
    /// Connectors already present are kept as they are, so calling this
    /// again after it succeeded builds nothing new. Returns how many
    /// connectors this call added.
    pub fn build_connectors(&mut self) -> Result<usize> {
        if self.phase != BuildPhase::ConnectorsBuilt {
            self.expect_phase(BuildPhase::ChunksMeshed)?;
        }
        let started = Instant::now();

        let n = self.config.nodes_per_axis;
        let surface_level = self.config.surface_level;
        let fidelity = self.config.fidelity;

        let candidates: BTreeSet<ConnectorKey> = self
            .chunks
            .keys()
            .flat_map(|&coord| ConnectorKey::touching(coord))
            .filter(|key| !self.connectors.contains_key(key))
            .collect();

        let chunks = &self.chunks;
        let (ready, skipped): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|key| {
            key.required_chunks().iter().all(|c| chunks.contains_key(c))
        });

        let built = self.runner.run(BuildPhase::ConnectorsBuilt, ready, |key| {
            let volume = build_volume(&key, n, |c| chunks.get(&c).map(Chunk::volume))?;
            let vertices = mesh::extract(&volume, surface_level, fidelity);
            Some(Connector::new(key, volume, vertices))
        });

        let mut added = 0;
        for connector in built.into_iter().flatten() {
            self.stats.connector_vertices += connector.vertex_count();
            self.connectors.insert(connector.key(), connector);
            added += 1;
        }
        self.stats.connectors = self.connectors.len();
        self.stats.skipped_connectors = skipped.len();
        debug!(added, skipped = skipped.len(), "connectors stitched");

        if self.phase == BuildPhase::ChunksMeshed {
            self.advance(BuildPhase::ConnectorsBuilt, started);
        }
        Ok(added)
    }

    /// Phase 6: bake world-space meshes for chunks and connectors.
    pub fn finalize_meshes(&mut self) -> Result<()> {
        self.expect_phase(BuildPhase::ConnectorsBuilt)?;
        let started = Instant::now();
        let n = self.config.nodes_per_axis;

        let chunks: Vec<&mut Chunk> = self.chunks.values_mut().collect();
        self.runner.run(BuildPhase::MeshesFinalized, chunks, |chunk| chunk.finalize(n));

        let connectors: Vec<&mut Connector> = self.connectors.values_mut().collect();
        self.runner.run(BuildPhase::MeshesFinalized, connectors, |connector| connector.finalize(n));

        self.advance(BuildPhase::MeshesFinalized, started);
        Ok(())
    }

    /// Phase 7: release planes and stacks. Chunks and connectors stay.
    pub fn cleanup(&mut self) -> Result<()> {
        self.expect_phase(BuildPhase::MeshesFinalized)?;
        let started = Instant::now();

        self.planes = HashMap::new();
        self.stacks = HashMap::new();

        self.advance(BuildPhase::Cleanup, started);
        Ok(())
    }

    /// Hand over the finished terrain. Only valid after cleanup.
    pub fn finish(self) -> Result<Terrain> {
        self.expect_phase(BuildPhase::Cleanup)?;
        info!(
            chunks = self.stats.chunks,
            connectors = self.stats.connectors,
            vertices = self.stats.chunk_vertices + self.stats.connector_vertices,
            elapsed_ms = self.stats.total_time().as_secs_f64() * 1000.0,
            "terrain build finished"
        );
        Ok(Terrain {
            config: self.config,
            chunks: self.chunks,
            connectors: self.connectors,
            stats: self.stats,
        })
    }

    /// Run every remaining phase in order.
    pub fn run(mut self) -> Result<Terrain> {
        while self.phase != BuildPhase::Cleanup {
            match self.phase {
                BuildPhase::Seeded => self.generate_planes()?,
                BuildPhase::PlanesGenerated => self.initialize_volumes()?,
                BuildPhase::VolumesInitialized => self.carve_volumes()?,
                BuildPhase::VolumesCarved => self.mesh_chunks()?,
                BuildPhase::ChunksMeshed => {
                    self.build_connectors()?;
                }
                BuildPhase::ConnectorsBuilt => self.finalize_meshes()?,
                BuildPhase::MeshesFinalized => self.cleanup()?,
                BuildPhase::Cleanup => {}
            }
        }
        self.finish()
    }
}

/// Build a whole terrain from `config`.
pub fn generate(config: TerrainConfig) -> Result<Terrain> {
    TerrainBuild::new(config)?.run()
}

/// A finished terrain: every chunk and connector with its world-space mesh.
#[derive(Clone, Debug)]
pub struct Terrain {
    config: TerrainConfig,
    chunks: HashMap<ChunkCoord, Chunk>,
    connectors: HashMap<ConnectorKey, Connector>,
    stats: BuildStats,
}

impl Terrain {
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn connector(&self, key: &ConnectorKey) -> Option<&Connector> {
        self.connectors.get(key)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    /// Connectors of one kind.
    pub fn connector_count_of(&self, kind: ConnectorKind) -> usize {
        self.connectors.keys().filter(|key| key.kind == kind).count()
    }

    /// Every finalized mesh, chunks first.
    pub fn meshes(&self) -> impl Iterator<Item = &MeshData> {
        self.chunks
            .values()
            .filter_map(Chunk::mesh)
            .chain(self.connectors.values().filter_map(Connector::mesh))
    }

    pub fn total_vertices(&self) -> usize {
        self.chunks.values().map(Chunk::vertex_count).sum::<usize>()
            + self.connectors.values().map(Connector::vertex_count).sum::<usize>()
    }

    pub fn total_triangles(&self) -> usize {
        self.total_vertices() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            chunks_x: 2,
            chunks_z: 2,
            vertical_chunks: 2,
            threads: Some(2),
            ..TerrainConfig::default()
        }
    }

    #[test]
    fn test_phase_sequence() {
        assert_eq!(BuildPhase::Seeded.next(), Some(BuildPhase::PlanesGenerated));
        assert_eq!(BuildPhase::MeshesFinalized.next(), Some(BuildPhase::Cleanup));
        assert_eq!(BuildPhase::Cleanup.next(), None);
        assert!(BuildPhase::Seeded < BuildPhase::Cleanup);
    }

    #[test]
    fn test_steps_advance_one_phase_each() {
        let mut build = TerrainBuild::new(small_config()).unwrap();
        assert_eq!(build.phase(), BuildPhase::Seeded);
        build.generate_planes().unwrap();
        assert_eq!(build.phase(), BuildPhase::PlanesGenerated);
        build.initialize_volumes().unwrap();
        build.carve_volumes().unwrap();
        build.mesh_chunks().unwrap();
        assert_eq!(build.phase(), BuildPhase::ChunksMeshed);
        assert_eq!(build.stats().chunks, 8);
        build.build_connectors().unwrap();
        build.finalize_meshes().unwrap();
        assert!(build.intermediate_count() > 0);
        build.cleanup().unwrap();
        assert_eq!(build.intermediate_count(), 0);

        let terrain = build.finish().unwrap();
        assert_eq!(terrain.stats().timings.len(), 7);
        assert!(terrain.chunks().all(|c| c.mesh().is_some()));
    }

    #[test]
    fn test_out_of_order_step_is_rejected() {
        let mut build = TerrainBuild::new(small_config()).unwrap();
        let err = build.mesh_chunks().unwrap_err();
        assert!(matches!(
            err,
            TerrainError::PhaseOrder { expected: BuildPhase::VolumesCarved, found: BuildPhase::Seeded }
        ));
        assert_eq!(build.phase(), BuildPhase::Seeded);
    }

    #[test]
    fn test_cleanup_keeps_chunk_volumes() {
        let terrain = generate(small_config()).unwrap();
        let chunk = terrain.chunk(ChunkCoord::new(0, 1, 0)).unwrap();
        assert_eq!(chunk.volume().dims(), Dims3::cube(5));
    }
}
