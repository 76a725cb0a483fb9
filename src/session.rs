//! Click-by-click collection of correspondences.
//!
//! A [`CalibrationSession`] owns everything one calibration run needs: the
//! depth camera intrinsics, the ground-truth world points and the partially
//! collected correspondence set. Every accepted sample pairs with the next
//! world point in table order; once every world point has a sample the pose is
//! solved and the set starts over.

use std::mem;

use itertools::Itertools;
use log::{debug, info};

use crate::camera::{AxisConvention, BackProjector, DepthImage, DepthSample, Intrinsics, Pixel};
use crate::config::SessionConfig;
use crate::error::{ConfigError, InputError, Result};
use crate::num::{Number, Point3};
use crate::solver::{LinearSystem, PoseResult, PoseSolver, Solver};
use crate::world::WorldPointTable;

/// One accepted sample: where the operator clicked, what the depth sensor read
/// there (raw units) and the world point it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub pixel: Pixel,
    pub depth: Number,
    pub world_point: Point3,
}

/// Append-only buffer of correspondences, emptied in one piece.
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceStore {
    required: usize,
    entries: Vec<Correspondence>,
}

impl CorrespondenceStore {
    pub fn new(required: usize) -> Self {
        Self {
            required,
            entries: Vec::with_capacity(required),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn required(&self) -> usize {
        self.required
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.required
    }

    #[inline]
    pub fn entries(&self) -> &[Correspondence] {
        &self.entries
    }

    pub fn state(&self) -> SessionState {
        if self.is_full() {
            SessionState::ReadyToSolve
        } else {
            SessionState::Collecting {
                collected: self.entries.len(),
                required: self.required,
            }
        }
    }

    /// Append one entry and report the state it leaves the store in. A store
    /// that reports `ReadyToSolve` must be emptied with [`Self::take`] before
    /// the next push.
    pub fn push(&mut self, correspondence: Correspondence) -> SessionState {
        self.entries.push(correspondence);
        self.state()
    }

    /// Hand out every entry and leave the store empty.
    pub fn take(&mut self) -> Vec<Correspondence> {
        mem::replace(&mut self.entries, Vec::with_capacity(self.required))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Collecting { collected: usize, required: usize },
    ReadyToSolve,
}

/// Outcome of an accepted sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Pending { collected: usize, required: usize },
    Solved(PoseResult),
}

#[derive(Debug, Clone)]
pub struct CalibrationSession {
    intrinsics: Intrinsics,
    world: WorldPointTable,
    projector: BackProjector,
    convention: AxisConvention,
    config: SessionConfig,

    store: CorrespondenceStore,
}

impl CalibrationSession {
    pub fn new(
        intrinsics: Intrinsics,
        world: WorldPointTable,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;

        if world.len() < LinearSystem::MIN_POINTS {
            return Err(ConfigError::TooFewWorldPoints {
                got: world.len(),
                min: LinearSystem::MIN_POINTS,
            }
            .into());
        }

        let projector = BackProjector::new(&intrinsics, config.depth_scale)?;
        let convention = config.axis_convention()?;
        let store = CorrespondenceStore::new(world.len());

        info!(
            "calibration session ready: {} world points, {}x{} depth image",
            world.len(),
            intrinsics.width(),
            intrinsics.height()
        );

        Ok(Self {
            intrinsics,
            world,
            projector,
            convention,
            config,
            store,
        })
    }

    #[inline]
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    #[inline]
    pub fn world(&self) -> &WorldPointTable {
        &self.world
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn collected(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn required(&self) -> usize {
        self.store.required()
    }

    #[inline]
    pub fn correspondences(&self) -> &[Correspondence] {
        self.store.entries()
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    /// World point the next accepted sample will be paired with.
    #[inline]
    pub fn next_world_point(&self) -> Option<&Point3> {
        self.world.get(self.store.len())
    }

    /// Drop a partially collected pass.
    pub fn reset(&mut self) {
        if !self.store.is_empty() {
            debug!("discarding {} collected correspondences", self.store.len());
        }
        self.store.clear();
    }

    /// Sample `image` under `pixel` and add the result.
    pub fn add_observation<T>(&mut self, pixel: Pixel, image: &DepthImage<T>) -> Result<Collection>
    where
        T: DepthSample,
    {
        let depth = image.sample(pixel)?;
        self.add_correspondence(pixel, depth)
    }

    /// Accept one sample. Completing the set triggers a solve and empties the
    /// set, whether or not the solve succeeds. A rejected sample leaves the set
    /// as it was.
    pub fn add_correspondence<T>(&mut self, pixel: Pixel, depth: T) -> Result<Collection>
    where
        T: DepthSample,
    {
        let depth = self.validate(pixel, depth)?;

        let world_point = self.world[self.store.len()];
        let state = self.store.push(Correspondence {
            pixel,
            depth,
            world_point,
        });
        debug!(
            "correspondence {}/{}: pixel {} depth {} -> world {:?}",
            self.store.len(),
            self.store.required(),
            pixel,
            depth,
            world_point
        );

        match state {
            SessionState::Collecting {
                collected,
                required,
            } => Ok(Collection::Pending {
                collected,
                required,
            }),
            SessionState::ReadyToSolve => {
                let correspondences = self.store.take();
                self.solve(&correspondences).map(Collection::Solved)
            }
        }
    }

    fn validate<T>(&self, pixel: Pixel, depth: T) -> Result<Number>
    where
        T: DepthSample,
    {
        if !self.intrinsics.contains(pixel) {
            return Err(InputError::PixelOutOfBounds {
                pixel,
                width: self.intrinsics.width(),
                height: self.intrinsics.height(),
            }
            .into());
        }

        if depth.is_zero() {
            return Err(InputError::ZeroDepth(pixel).into());
        }
        let depth = depth.to_f64().unwrap_or(Number::NAN);
        if !depth.is_finite() || depth < 0.0 {
            return Err(InputError::InvalidDepth { pixel, depth }.into());
        }
        if let Some(max) = self.config.max_depth {
            if depth > max {
                return Err(InputError::DepthOutOfRange { pixel, depth, max }.into());
            }
        }
        Ok(depth)
    }

    fn solve(&self, correspondences: &[Correspondence]) -> Result<PoseResult> {
        let camera = correspondences
            .iter()
            .map(|c| {
                let optical = self.projector.back_project(&c.pixel.to_point(), c.depth);
                self.convention.apply(&optical)
            })
            .collect_vec();
        let world = correspondences.iter().map(|c| c.world_point).collect_vec();

        let solver = PoseSolver {
            rank_tolerance: self.config.rank_tolerance,
            min_spread_ratio: self.config.min_spread_ratio,
            enforce_proper_rotation: self.config.enforce_proper_rotation,
            ..PoseSolver::new(&camera, &world)
        };
        solver.solve()
    }
}
