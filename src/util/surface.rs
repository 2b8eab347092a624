//! Splitting a block into bulk, faces, edges and corners.
//!
//! Every perimeter region is identified by its outward normal, a vector
//! with entries in {-1, 0, 1}. The number of non-zero entries tells the
//! kind of region: none for the bulk, one for a face (an edge of a 2D
//! block, a plane of a 3D block), all of them for a corner, and in 3D
//! two of them for an edge.

use crate::util::*;

/// Which side of an axis a boundary region sits on.
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Orientation {
    Negative,
    Positive,
}

impl Orientation {
    pub fn sign(self) -> i32 {
        match self {
            Orientation::Negative => -1,
            Orientation::Positive => 1,
        }
    }

    /// Panics on zero, which names no side.
    pub fn from_sign(sign: i32) -> Self {
        assert!(sign != 0, "orientation needs a non-zero sign");
        if sign < 0 {
            Orientation::Negative
        } else {
            Orientation::Positive
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Orientation::Negative => Orientation::Positive,
            Orientation::Positive => Orientation::Negative,
        }
    }
}

/// Geometric class of a sub-domain of a block.
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Region<const GRID_DIMENSION: usize> {
    Bulk,
    Face {
        direction: usize,
        orientation: Orientation,
    },
    /// Only exists for 3D blocks; `plane` is the axis the edge runs along.
    Edge {
        plane: usize,
        normal: Coord<GRID_DIMENSION>,
    },
    Corner {
        normal: Coord<GRID_DIMENSION>,
    },
}

impl<const GRID_DIMENSION: usize> Region<GRID_DIMENSION> {
    pub fn from_normal(normal: &Coord<GRID_DIMENSION>) -> Self {
        let non_zero: Vec<usize> =
            (0..GRID_DIMENSION).filter(|d| normal[*d] != 0).collect();
        match non_zero.len() {
            0 => Region::Bulk,
            1 => Region::Face {
                direction: non_zero[0],
                orientation: Orientation::from_sign(normal[non_zero[0]]),
            },
            n if n == GRID_DIMENSION => Region::Corner { normal: *normal },
            _ => Region::Edge {
                plane: (0..GRID_DIMENSION)
                    .find(|d| normal[*d] == 0)
                    .unwrap_or_default(),
                normal: *normal,
            },
        }
    }

    pub fn normal(&self) -> Coord<GRID_DIMENSION> {
        match self {
            Region::Bulk => Coord::zero(),
            Region::Face {
                direction,
                orientation,
            } => {
                let mut n = Coord::zero();
                n[*direction] = orientation.sign();
                n
            }
            Region::Edge { normal, .. } | Region::Corner { normal } => *normal,
        }
    }

    /// Number of axes on which the region touches the block boundary.
    pub fn codimension(&self) -> usize {
        self.normal().iter().filter(|n| **n != 0).count()
    }
}

/// Decomposition of a block into its bulk and perimeter regions for a
/// given boundary width. The regions tile the block exactly.
#[derive(Debug, Clone)]
pub struct Surface<const GRID_DIMENSION: usize> {
    outer: AABB<GRID_DIMENSION>,
    width: i32,
}

impl<const GRID_DIMENSION: usize> Surface<GRID_DIMENSION> {
    pub fn new(outer: AABB<GRID_DIMENSION>, width: i32) -> Self {
        assert!(width >= 0, "boundary width must not be negative");
        Surface { outer, width }
    }

    pub fn outer(&self) -> &AABB<GRID_DIMENSION> {
        &self.outer
    }

    /// Range `[lo, hi]` along axis `d` for normal component `n`.
    fn axis_range(&self, d: usize, n: i32) -> (i32, i32) {
        let lo = self.outer.bounds[(d, 0)];
        let hi = self.outer.bounds[(d, 1)];
        let w = self.width;
        match n {
            -1 => (lo, (lo + w - 1).min(hi)),
            0 => (lo + w, hi - w),
            _ => ((hi - w + 1).max((lo + w).min(hi + 1)), hi),
        }
    }

    fn raw_box(&self, normal: &Coord<GRID_DIMENSION>) -> AABB<GRID_DIMENSION> {
        let mut result = self.outer;
        for d in 0..GRID_DIMENSION {
            let (lo, hi) = self.axis_range(d, normal[d]);
            result.bounds[(d, 0)] = lo;
            result.bounds[(d, 1)] = hi;
        }
        result
    }

    /// Box covered by the region with the given normal, if non-empty.
    pub fn region_box(
        &self,
        normal: &Coord<GRID_DIMENSION>,
    ) -> Option<AABB<GRID_DIMENSION>> {
        let result = self.raw_box(normal);
        if result.check_validity() {
            Some(result)
        } else {
            None
        }
    }

    /// Region box stretched outwards along its normal up to the sides of
    /// `cover`.
    pub fn stretched_region_box(
        &self,
        normal: &Coord<GRID_DIMENSION>,
        cover: &AABB<GRID_DIMENSION>,
    ) -> Option<AABB<GRID_DIMENSION>> {
        let mut result = self.raw_box(normal);
        for d in 0..GRID_DIMENSION {
            match normal[d] {
                -1 => {
                    let lo = result.bounds[(d, 0)].min(cover.bounds[(d, 0)]);
                    result.bounds[(d, 0)] = lo;
                }
                1 => {
                    let hi = result.bounds[(d, 1)].max(cover.bounds[(d, 1)]);
                    result.bounds[(d, 1)] = hi;
                }
                _ => {}
            }
        }
        if result.check_validity() {
            Some(result)
        } else {
            None
        }
    }

    pub fn bulk(&self) -> Option<AABB<GRID_DIMENSION>> {
        self.region_box(&Coord::zero())
    }

    /// All non-empty regions, bulk first, then by increasing codimension.
    pub fn regions(&self) -> Vec<(Region<GRID_DIMENSION>, AABB<GRID_DIMENSION>)> {
        self.collect_regions(|normal| self.region_box(normal))
    }

    /// Like `regions`, but the perimeter regions reach out to `cover`:
    /// cells outside the block belong to the face, edge or corner they lie
    /// beyond. Together the regions tile the union of both boxes' extents.
    pub fn regions_covering(
        &self,
        cover: &AABB<GRID_DIMENSION>,
    ) -> Vec<(Region<GRID_DIMENSION>, AABB<GRID_DIMENSION>)> {
        self.collect_regions(|normal| self.stretched_region_box(normal, cover))
    }

    fn collect_regions<F>(
        &self,
        region_box: F,
    ) -> Vec<(Region<GRID_DIMENSION>, AABB<GRID_DIMENSION>)>
    where
        F: Fn(&Coord<GRID_DIMENSION>) -> Option<AABB<GRID_DIMENSION>>,
    {
        let normals = AABB::<GRID_DIMENSION>::from_mm(
            Coord::repeat(-1),
            Coord::repeat(1),
        );
        let mut result: Vec<(Region<GRID_DIMENSION>, AABB<GRID_DIMENSION>)> =
            normals
                .coord_iter()
                .filter_map(|normal| {
                    region_box(&normal).map(|b| (Region::from_normal(&normal), b))
                })
                .collect();
        result.sort_by_key(|(region, _)| region.codimension());
        result
    }
}
