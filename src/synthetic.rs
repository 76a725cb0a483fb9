//! Deterministic synthetic calibration scenes.
//!
//! A scene places a depth camera at a random pose in the world, picks random
//! distinct pixels with random raw depths, and derives the world points those
//! samples observe. Pixels and depths are integers, exactly like operator
//! clicks on a 16-bit depth image, and the world points are computed from them
//! so a noise-free scene solves exactly. Noise can be added to the clicks
//! afterwards, leaving the world points on the true surface.

use std::collections::HashSet;

use itertools::Itertools;
use nalgebra::Rotation3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::camera::{AxisConvention, BackProjector, DepthImage, Intrinsics, Pixel};
use crate::error::{InputError, Result};
use crate::num::{Matrix3, Number, Point3, Vector3};
use crate::solver::{center, spread_ratio, LinearSystem};
use crate::world::WorldPointTable;

mod consts {
    pub const WIDTH: u32 = 640;
    pub const HEIGHT: u32 = 480;
    pub const FOCAL: f64 = 575.8;
    pub const MARGIN: i32 = 16;
    pub const DEPTH_MM: std::ops::Range<u16> = 800..4000;
    pub const DEPTH_SCALE: f64 = 1000.0;
    /// random scenes are redrawn until their points are at least this thick
    pub const MIN_SPREAD: f64 = 0.05;
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub intrinsics: Intrinsics,
    pub convention: AxisConvention,
    pub depth_scale: Number,

    /// camera-to-world rotation and translation the solver should recover
    pub rotation: Matrix3,
    pub translation: Vector3,

    pub pixels: Vec<Pixel>,
    pub depths: Vec<u16>,
    /// exact observed surface points in the body convention
    pub camera_points: Vec<Point3>,
    pub world_points: Vec<Point3>,
}

/// Camera model and pose shared by every scene kind.
struct Rig {
    intrinsics: Intrinsics,
    projector: BackProjector,
    convention: AxisConvention,
    rotation: Matrix3,
    translation: Vector3,
}

impl Rig {
    fn random<R>(rng: &mut R, convention: AxisConvention) -> Result<Self>
    where
        R: Rng,
    {
        let intrinsics = Intrinsics::from_focal(
            consts::FOCAL,
            consts::FOCAL,
            (consts::WIDTH as f64 - 1.0) / 2.0,
            (consts::HEIGHT as f64 - 1.0) / 2.0,
            consts::WIDTH,
            consts::HEIGHT,
        )?;
        let projector = BackProjector::new(&intrinsics, consts::DEPTH_SCALE)?;

        let rotation = random_rotation(rng);
        let translation = Vector3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-3.0..3.0),
            rng.gen_range(0.2..2.0),
        );

        Ok(Self {
            intrinsics,
            projector,
            convention,
            rotation,
            translation,
        })
    }

    /// `optical` holds the exact surface points behind the samples.
    fn into_scene(self, pixels: Vec<Pixel>, depths: Vec<u16>, optical: &[Point3]) -> Scene {
        let camera_points = optical
            .iter()
            .map(|p| self.convention.apply(p))
            .collect_vec();
        let world_points = camera_points
            .iter()
            .map(|p| Point3::from(self.rotation * p.coords + self.translation))
            .collect_vec();

        Scene {
            intrinsics: self.intrinsics,
            convention: self.convention,
            depth_scale: consts::DEPTH_SCALE,
            rotation: self.rotation,
            translation: self.translation,
            pixels,
            depths,
            camera_points,
            world_points,
        }
    }
}

impl Scene {
    pub fn random(seed: u64, num_points: usize) -> Result<Self> {
        Self::generate(&mut StdRng::seed_from_u64(seed), num_points)
    }

    pub fn random_with_convention(
        seed: u64,
        num_points: usize,
        convention: AxisConvention,
    ) -> Result<Self> {
        Self::generate_with_convention(&mut StdRng::seed_from_u64(seed), num_points, convention)
    }

    pub fn generate<R>(rng: &mut R, num_points: usize) -> Result<Self>
    where
        R: Rng,
    {
        Self::generate_with_convention(rng, num_points, AxisConvention::default())
    }

    /// Random samples spread through the viewing frustum. Sets of four or
    /// more points are redrawn until they are clearly not flat.
    pub fn generate_with_convention<R>(
        rng: &mut R,
        num_points: usize,
        convention: AxisConvention,
    ) -> Result<Self>
    where
        R: Rng,
    {
        let rig = Rig::random(rng, convention)?;

        let (pixels, depths, optical) = loop {
            let pixels = random_pixels(rng, num_points);
            let depths = (0..num_points)
                .map(|_| rng.gen_range(consts::DEPTH_MM))
                .collect_vec();
            let optical = pixels
                .iter()
                .zip(depths.iter())
                .map(|(pixel, &depth)| rig.projector.back_project(&pixel.to_point(), depth as Number))
                .collect_vec();

            let (centered, _) = center(&optical);
            if num_points < LinearSystem::MIN_POINTS || spread_ratio(&centered) >= consts::MIN_SPREAD {
                break (pixels, depths, optical);
            }
        };

        Ok(rig.into_scene(pixels, depths, &optical))
    }

    /// Clicks on the flat wall `normal . X = distance` of the optical frame.
    ///
    /// Depths are rounded to whole raw units as the sensor reports them, while
    /// the world points are surveyed from the exact wall points.
    pub fn tilted_wall(
        seed: u64,
        num_points: usize,
        normal: Vector3,
        distance: Number,
    ) -> Result<Self> {
        let rng = &mut StdRng::seed_from_u64(seed);
        let rig = Rig::random(rng, AxisConvention::default())?;
        let pixels = random_pixels(rng, num_points);

        let mut depths = Vec::with_capacity(num_points);
        let mut optical = Vec::with_capacity(num_points);
        for pixel in pixels.iter() {
            // ray through the pixel at unit optical depth
            let ray = rig
                .projector
                .back_project(&pixel.to_point(), consts::DEPTH_SCALE);
            let z = distance / normal.dot(&ray.coords);
            let raw = (z * consts::DEPTH_SCALE).round();
            if !(raw >= 1.0 && raw <= u16::MAX as Number) {
                return Err(InputError::InvalidDepth {
                    pixel: *pixel,
                    depth: raw,
                }
                .into());
            }
            depths.push(raw as u16);
            optical.push(ray * z);
        }

        Ok(rig.into_scene(pixels, depths, &optical))
    }

    /// Perturb the world points uniformly by up to `amplitude` per axis,
    /// as a surveyed ground truth would be.
    pub fn with_world_noise<R>(mut self, rng: &mut R, amplitude: Number) -> Self
    where
        R: Rng,
    {
        for point in self.world_points.iter_mut() {
            for axis in 0..3 {
                point[axis] += rng.gen_range(-amplitude..=amplitude);
            }
        }
        self
    }

    /// Perturb the raw depths by up to `amplitude` units, as sensor noise would.
    pub fn with_depth_noise<R>(mut self, rng: &mut R, amplitude: u16) -> Self
    where
        R: Rng,
    {
        let amplitude = amplitude as i32;
        for depth in self.depths.iter_mut() {
            let noisy = *depth as i32 + rng.gen_range(-amplitude..=amplitude);
            *depth = noisy.clamp(1, u16::MAX as i32) as u16;
        }
        self
    }

    /// Move every click by up to `amplitude` pixels per axis, inside the image.
    pub fn with_pixel_noise<R>(mut self, rng: &mut R, amplitude: i32) -> Self
    where
        R: Rng,
    {
        let width = self.intrinsics.width() as i32;
        let height = self.intrinsics.height() as i32;
        for pixel in self.pixels.iter_mut() {
            pixel.x = (pixel.x + rng.gen_range(-amplitude..=amplitude)).clamp(0, width - 1);
            pixel.y = (pixel.y + rng.gen_range(-amplitude..=amplitude)).clamp(0, height - 1);
        }
        self
    }

    pub fn world_table(&self) -> WorldPointTable {
        WorldPointTable::new(self.world_points.clone())
    }

    /// Depth image holding the scene's samples under their pixels, zero elsewhere.
    pub fn depth_image(&self) -> Result<DepthImage<u16>> {
        let width = self.intrinsics.width();
        let height = self.intrinsics.height();
        let mut data = vec![0u16; width as usize * height as usize];
        for (pixel, &depth) in self.pixels.iter().zip(self.depths.iter()) {
            if let Some(idx) = pixel.index_in(width, height) {
                data[idx] = depth;
            }
        }
        DepthImage::new(width, height, data)
    }
}

/// Uniformly distributed axis with an angle in `[-pi, pi)`.
pub fn random_rotation<R>(rng: &mut R) -> Matrix3
where
    R: Rng,
{
    let axis = loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let norm = v.norm();
        if norm > 1e-3 && norm <= 1.0 {
            break v / norm;
        }
    };
    let angle = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
    *Rotation3::from_scaled_axis(axis * angle).matrix()
}

fn random_pixels<R>(rng: &mut R, num_points: usize) -> Vec<Pixel>
where
    R: Rng,
{
    let mut seen = HashSet::with_capacity(num_points);
    let mut pixels = Vec::with_capacity(num_points);
    while pixels.len() < num_points {
        let pixel = Pixel::new(
            rng.gen_range(consts::MARGIN..consts::WIDTH as i32 - consts::MARGIN),
            rng.gen_range(consts::MARGIN..consts::HEIGHT as i32 - consts::MARGIN),
        );
        if seen.insert(pixel) {
            pixels.push(pixel);
        }
    }
    pixels
}
