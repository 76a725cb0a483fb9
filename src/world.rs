//! Ground-truth world points.
//!
//! The table is plain text, one `id, x, y, z` row per point. The id is
//! ignored: the row order alone decides which click pairs with which point.

use std::fs;
use std::ops::Index;
use std::path::Path;

use itertools::Itertools;

use crate::error::{ConfigError, Result};
use crate::num::{Number, Point3};

#[derive(Debug, Clone, PartialEq)]
pub struct WorldPointTable {
    points: Vec<Point3>,
}

impl WorldPointTable {
    const NUM_COLUMNS: usize = 4;

    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Blank lines and `#` comments are skipped; errors name the 1-based line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut points = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let clean = line.split_whitespace().join("");
            if clean.is_empty() || clean.starts_with('#') {
                continue;
            }

            let fields = clean.split(',').collect_vec();
            if fields.len() != Self::NUM_COLUMNS {
                return Err(ConfigError::GroundTruth {
                    line: line_no,
                    reason: format!(
                        "expected {} comma separated columns, got {}",
                        Self::NUM_COLUMNS,
                        fields.len()
                    ),
                }
                .into());
            }

            let mut coords = [0.0; 3];
            for (coord, field) in coords.iter_mut().zip(&fields[1..]) {
                *coord = field
                    .parse::<Number>()
                    .ok()
                    .filter(|x| x.is_finite())
                    .ok_or_else(|| ConfigError::GroundTruth {
                        line: line_no,
                        reason: format!("invalid coordinate {:?}", field),
                    })?;
            }
            points.push(Point3::new(coords[0], coords[1], coords[2]));
        }

        Ok(Self { points })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Point3> {
        self.points.get(index)
    }

    #[inline]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }
}

impl Index<usize> for WorldPointTable {
    type Output = Point3;

    #[inline]
    fn index(&self, index: usize) -> &Point3 {
        &self.points[index]
    }
}

impl From<Vec<Point3>> for WorldPointTable {
    fn from(points: Vec<Point3>) -> Self {
        Self::new(points)
    }
}
