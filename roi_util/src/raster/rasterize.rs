/*
This file is part of the Building Aggregration Tool
Copyright (C) 2022 Novel-T

The Building Aggregration Tool is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/
use std::collections::BTreeMap;

use bitvec::prelude::*;
use geo::{Coord, Line, MultiPolygon, Polygon};
use log::{debug, warn};
use ndarray::{s, Array2};
use rayon::prelude::*;

use crate::errors::{RasterizeError, Result};
use crate::raster::{value_counts, BurnValue, GridDefinition};

/// A polygon (or multipolygon) with the class id to burn for it
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub geometry: MultiPolygon<f64>,
    pub value: i64,
}

impl PolygonFeature {
    pub fn new(geometry: impl Into<MultiPolygon<f64>>, value: i64) -> Self {
        PolygonFeature {
            geometry: geometry.into(),
            value,
        }
    }
}

/// Options that specify how to rasterize polygons.
#[derive(Copy, Clone, Debug, Default)]
pub struct RasterizeOptions {
    /// Set to `true` to burn every cell the polygon touches, not just those whose center
    /// is within the polygon.  A polygon touches a cell when its boundary or interior
    /// intersects the inside of the cell; running along a cell edge is not enough.
    pub all_touched: bool,

    /// Fail with [`RasterizeError::EmptyFeatureSet`] instead of returning a raster
    /// that is all background.
    pub reject_empty: bool,
}

/// Result of a rasterization pass.
///
/// `values` has shape (num_rows, num_cols).  `coverage` is row major and tells burned
/// cells apart from background even when a class id equals the background value.
#[derive(Debug, Clone, PartialEq)]
pub struct BurnedRaster<T: BurnValue> {
    pub grid: GridDefinition,
    pub values: Array2<T>,
    pub coverage: BitVec,
    pub background: T,
}

impl<T: BurnValue> BurnedRaster<T> {
    pub fn is_covered(&self, row: usize, col: usize) -> bool {
        self.coverage[row * self.grid.num_cols as usize + col]
    }

    pub fn covered_count(&self) -> usize {
        self.coverage.count_ones()
    }

    pub fn background_count(&self) -> usize {
        self.coverage.count_zeros()
    }

    /// Number of burned cells per class id
    pub fn class_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for (v, covered) in self.values.iter().zip(self.coverage.iter()) {
            if !*covered {
                continue;
            }
            if let Some(class_id) = v.to_i64() {
                *counts.entry(class_id).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Counts of every value in the raster, background included
    pub fn value_counts(&self) -> BTreeMap<i64, usize> {
        value_counts(&self.values)
    }
}

/// Run of burned cells in one row, `col_end` is exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSpan {
    row: usize,
    col_start: usize,
    col_end: usize,
}

/// Burns `features` into a new raster on `grid`.
///
/// Every cell starts as `background`.  Features are burned in input order so where
/// polygons overlap the last one wins.  Coverage of each feature is computed in
/// parallel, the burn itself is a single ordered pass so the result does not depend on
/// the thread count.
pub fn rasterize<T: BurnValue>(
    features: &[PolygonFeature],
    grid: &GridDefinition,
    background: T,
    options: RasterizeOptions,
) -> Result<BurnedRaster<T>> {
    grid.validate()?;

    if features.is_empty() && options.reject_empty {
        return Err(RasterizeError::EmptyFeatureSet);
    }

    let burn_values = features
        .iter()
        .enumerate()
        .map(|(feature_index, f)| {
            T::from_attribute(f.value).ok_or(RasterizeError::UnsupportedAttributeType {
                feature_index,
                value: f.value,
                target_type: T::TYPE_NAME,
            })
        })
        .collect::<Result<Vec<T>>>()?;

    let num_rows = grid.num_rows as usize;
    let num_cols = grid.num_cols as usize;

    let coverages: Vec<Vec<CellSpan>> = features
        .par_iter()
        .map(|f| feature_coverage(&f.geometry, grid, options.all_touched))
        .collect();

    let mut values = Array2::from_elem((num_rows, num_cols), background);
    let mut coverage = bitvec![0; num_rows * num_cols];

    for (feature_index, (spans, value)) in coverages.iter().zip(burn_values).enumerate() {
        if spans.is_empty() {
            debug!("Feature {} does not cover any cell", feature_index);
            continue;
        }
        if value == background {
            warn!("Feature {} has class {:?} which is also the background value", feature_index, value);
        }
        for span in spans {
            values.slice_mut(s![span.row, span.col_start..span.col_end]).fill(value);
            let offset = span.row * num_cols;
            coverage[offset + span.col_start..offset + span.col_end].fill(true);
        }
    }

    Ok(BurnedRaster {
        grid: grid.clone(),
        values,
        coverage,
        background,
    })
}

fn feature_coverage(geometry: &MultiPolygon<f64>, grid: &GridDefinition, all_touched: bool) -> Vec<CellSpan> {
    let num_rows = grid.num_rows as usize;
    let num_cols = grid.num_cols as usize;

    let mut spans = Vec::new();

    for polygon in geometry.iter() {
        let edges = pixel_space_edges(polygon, grid);
        if edges.is_empty() {
            continue;
        }
        center_spans(&edges, num_rows, num_cols, &mut spans);
        if all_touched {
            touched_cells(&edges, num_rows, num_cols, &mut spans);
        }
    }

    spans
}

/// Edges of the exterior and all holes, in fractional (col, row) coordinates
fn pixel_space_edges(polygon: &Polygon<f64>, grid: &GridDefinition) -> Vec<Line<f64>> {
    let to_pixel = |c: Coord<f64>| {
        let (x, y) = grid.to_pixel_space(c.x, c.y);
        Coord { x: snap_to_grid_line(x), y: snap_to_grid_line(y) }
    };

    std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .flat_map(|ring| ring.lines())
        .map(|line| Line::new(to_pixel(line.start), to_pixel(line.end)))
        .filter(|line| line.start != line.end)
        .collect()
}

// Vertices meant to sit on a grid line come out of the division as 2.9999999999999996
// with cell sizes like 0.1 or 1/3600.
const GRID_LINE_EPSILON: f64 = 1e-9;

fn snap_to_grid_line(v: f64) -> f64 {
    let nearest = v.round();
    if (v - nearest).abs() <= GRID_LINE_EPSILON * v.abs().max(1.0) {
        nearest
    } else {
        v
    }
}

//Clamps a fractional index to [0, upper], NaN goes to 0
fn clamp_index(v: f64, upper: usize) -> usize {
    if v >= upper as f64 {
        upper
    } else if v > 0.0 {
        v as usize
    } else {
        0
    }
}

/// Cells whose center is inside the polygon, even-odd over all rings.
///
/// An edge crosses the scanline through the row centers when exactly one of its
/// ends is at or below it; a cell belongs to a crossing pair [xa, xb) when
/// `xa <= col + 0.5 < xb`.
fn center_spans(edges: &[Line<f64>], num_rows: usize, num_cols: usize, spans: &mut Vec<CellSpan>) {
    let (min_y, max_y) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        (lo.min(e.start.y).min(e.end.y), hi.max(e.start.y).max(e.end.y))
    });

    let row_start = clamp_index((min_y - 0.5).ceil(), num_rows);
    let row_end = clamp_index((max_y - 0.5).floor() + 1.0, num_rows);

    let mut crossings: Vec<f64> = Vec::new();

    for row in row_start..row_end {
        let yc = row as f64 + 0.5;

        crossings.clear();
        for e in edges {
            if (e.start.y <= yc) != (e.end.y <= yc) {
                crossings.push(e.start.x + (yc - e.start.y) * (e.end.x - e.start.x) / (e.end.y - e.start.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for pair in crossings.chunks_exact(2) {
            let col_start = clamp_index((pair[0] - 0.5).ceil(), num_cols);
            let col_end = clamp_index((pair[1] - 0.5).ceil(), num_cols);
            if col_end > col_start {
                spans.push(CellSpan { row, col_start, col_end });
            }
        }
    }
}

/// Cells whose inside is crossed by an edge.  Each edge is clipped to the grid and cut at
/// every grid line; a piece belongs to the cell holding its midpoint.  Pieces running
/// exactly along a grid line only touch cell borders and are ignored.
fn touched_cells(edges: &[Line<f64>], num_rows: usize, num_cols: usize, spans: &mut Vec<CellSpan>) {
    let mut cuts: Vec<f64> = Vec::new();

    for edge in edges {
        let Some(clipped) = clip_to_grid(edge, num_cols as f64, num_rows as f64) else {
            continue;
        };

        let delta = clipped.delta();
        cuts.clear();
        cuts.push(0.0);
        cuts.push(1.0);
        push_grid_line_cuts(clipped.start.x, delta.x, &mut cuts);
        push_grid_line_cuts(clipped.start.y, delta.y, &mut cuts);
        cuts.sort_by(f64::total_cmp);
        cuts.dedup();

        for w in cuts.windows(2) {
            let t = (w[0] + w[1]) / 2.0;
            let mid_x = clipped.start.x + delta.x * t;
            let mid_y = clipped.start.y + delta.y * t;

            if mid_x == mid_x.floor() || mid_y == mid_y.floor() {
                continue;
            }

            let col = mid_x.floor();
            let row = mid_y.floor();
            if col < 0.0 || row < 0.0 || col >= num_cols as f64 || row >= num_rows as f64 {
                continue;
            }

            let col = col as usize;
            spans.push(CellSpan { row: row as usize, col_start: col, col_end: col + 1 });
        }
    }
}

//Parameters along the edge where it crosses an integer coordinate
fn push_grid_line_cuts(start: f64, delta: f64, cuts: &mut Vec<f64>) {
    if delta == 0.0 {
        return;
    }
    let end = start + delta;
    let (lo, hi) = if start < end { (start, end) } else { (end, start) };

    let mut line = lo.floor() + 1.0;
    while line < hi {
        cuts.push((line - start) / delta);
        line += 1.0;
    }
}

/// Liang-Barsky clip against [0, width] x [0, height]
fn clip_to_grid(edge: &Line<f64>, width: f64, height: f64) -> Option<Line<f64>> {
    let delta = edge.delta();
    let p = edge.start;

    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    for (pk, qk) in [(-delta.x, p.x), (delta.x, width - p.x), (-delta.y, p.y), (delta.y, height - p.y)] {
        if pk == 0.0 {
            if qk < 0.0 {
                return None;
            }
            continue;
        }
        let r = qk / pk;
        if pk < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    if t1 <= t0 {
        return None;
    }

    Some(Line::new(
        Coord { x: p.x + delta.x * t0, y: p.y + delta.y * t0 },
        Coord { x: p.x + delta.x * t1, y: p.y + delta.y * t1 },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, LineString};

    fn unit_grid(num_cols: u32, num_rows: u32) -> GridDefinition {
        GridDefinition::new(0.0, 0.0, 1.0, 1.0, num_cols, num_rows)
    }

    fn square(min_x: f64, min_y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: min_x, y: min_y),
            (x: min_x + size, y: min_y),
            (x: min_x + size, y: min_y + size),
            (x: min_x, y: min_y + size),
        ]
    }

    fn center_only() -> RasterizeOptions {
        RasterizeOptions::default()
    }

    fn touched() -> RasterizeOptions {
        RasterizeOptions {
            all_touched: true,
            ..Default::default()
        }
    }

    fn covered_cells<T: BurnValue>(r: &BurnedRaster<T>) -> Vec<(usize, usize)> {
        let cols = r.grid.num_cols as usize;
        r.coverage.iter_ones().map(|i| (i / cols, i % cols)).collect()
    }

    #[test]
    fn test_single_cell() {
        let features = vec![PolygonFeature::new(square(1.0, 1.0, 1.0), 7)];

        let r = rasterize(&features, &unit_grid(3, 3), 0u8, center_only()).unwrap();

        assert_eq!(r.values, ndarray::arr2(&[[0, 0, 0], [0, 7, 0], [0, 0, 0]]));
        assert_eq!(covered_cells(&r), vec![(1, 1)]);

        //Polygon edges on grid lines do not touch the neighbours
        let r = rasterize(&features, &unit_grid(3, 3), 0u8, touched()).unwrap();
        assert_eq!(r.values, ndarray::arr2(&[[0, 0, 0], [0, 7, 0], [0, 0, 0]]));
    }

    #[test]
    fn test_north_up_grid() {
        //Row 0 is the top, y decreases going down
        let grid = GridDefinition::new(0.0, 3.0, 1.0, -1.0, 3, 3);
        let features = vec![PolygonFeature::new(square(0.0, 2.0, 1.0), 4)];

        let r = rasterize(&features, &grid, 0u8, center_only()).unwrap();

        assert_eq!(r.values, ndarray::arr2(&[[4, 0, 0], [0, 0, 0], [0, 0, 0]]));
    }

    #[test]
    fn test_last_feature_wins() {
        let features = vec![
            PolygonFeature::new(square(0.0, 0.0, 1.0), 3),
            PolygonFeature::new(square(0.0, 0.0, 1.0), 5),
        ];

        let r = rasterize(&features, &unit_grid(2, 2), 0u8, center_only()).unwrap();
        assert_eq!(r.values, ndarray::arr2(&[[5, 0], [0, 0]]));

        let reversed: Vec<_> = features.iter().rev().cloned().collect();
        let r = rasterize(&reversed, &unit_grid(2, 2), 0u8, center_only()).unwrap();
        assert_eq!(r.values, ndarray::arr2(&[[3, 0], [0, 0]]));
    }

    #[test]
    fn test_partial_overlap() {
        let features = vec![
            PolygonFeature::new(square(0.0, 0.0, 3.0), 1),
            PolygonFeature::new(square(1.0, 1.0, 2.0), 2),
        ];

        let r = rasterize(&features, &unit_grid(4, 4), 0u16, center_only()).unwrap();

        assert_eq!(r.values, ndarray::arr2(&[
            [1, 1, 1, 0],
            [1, 2, 2, 0],
            [1, 2, 2, 0],
            [0, 0, 0, 0],
        ]));
        assert_eq!(r.class_counts(), BTreeMap::from([(1, 5), (2, 4)]));
        assert_eq!(r.background_count(), 7);
    }

    #[test]
    fn test_no_features() {
        for background in [0u8, 9, 255] {
            let r = rasterize(&[], &unit_grid(4, 3), background, touched()).unwrap();
            assert!(r.values.iter().all(|v| *v == background));
            assert_eq!(r.covered_count(), 0);
            assert_eq!(r.values.dim(), (3, 4));
        }

        let err = rasterize::<u8>(&[], &unit_grid(4, 3), 0, RasterizeOptions { reject_empty: true, ..Default::default() });
        assert_eq!(err, Err(RasterizeError::EmptyFeatureSet));
    }

    #[test]
    fn test_invalid_grid() {
        let features = vec![PolygonFeature::new(square(0.0, 0.0, 1.0), 1)];

        let err = rasterize(&features, &unit_grid(3, 0), 0u8, center_only()).unwrap_err();
        assert!(matches!(err, RasterizeError::InvalidGrid { .. }));

        let err = rasterize(&features, &unit_grid(0, 3), 0u8, center_only()).unwrap_err();
        assert!(matches!(err, RasterizeError::InvalidGrid { .. }));

        let grid = GridDefinition::new(0.0, 0.0, 0.0, 1.0, 3, 3);
        let err = rasterize(&features, &grid, 0u8, center_only()).unwrap_err();
        assert!(matches!(err, RasterizeError::InvalidGrid { .. }));
    }

    #[test]
    fn test_attribute_out_of_range() {
        let features = vec![
            PolygonFeature::new(square(0.0, 0.0, 1.0), 255),
            PolygonFeature::new(square(1.0, 0.0, 1.0), 256),
        ];

        let err = rasterize(&features, &unit_grid(2, 2), 0u8, center_only()).unwrap_err();
        assert_eq!(err, RasterizeError::UnsupportedAttributeType {
            feature_index: 1,
            value: 256,
            target_type: "Byte",
        });

        let r = rasterize(&features, &unit_grid(2, 2), 0u16, center_only()).unwrap();
        assert_eq!(r.values, ndarray::arr2(&[[255, 256], [0, 0]]));
    }

    #[test]
    fn test_outside_grid() {
        let features = vec![
            PolygonFeature::new(square(10.0, 10.0, 2.0), 1),
            PolygonFeature::new(square(-5.0, 0.0, 2.0), 2),
        ];

        for options in [center_only(), touched()] {
            let r = rasterize(&features, &unit_grid(3, 3), 0u8, options).unwrap();
            assert_eq!(r.covered_count(), 0);
        }
    }

    #[test]
    fn test_clipped_to_grid() {
        let features = vec![PolygonFeature::new(square(-1.0, -1.0, 2.0), 6)];

        let r = rasterize(&features, &unit_grid(3, 3), 0u8, center_only()).unwrap();

        assert_eq!(r.values, ndarray::arr2(&[[6, 0, 0], [0, 0, 0], [0, 0, 0]]));
    }

    #[test]
    fn test_hole() {
        let outer = LineString::from(vec![(0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0), (0.0, 0.0)]);
        let hole = LineString::from(vec![(1.0, 1.0), (4.0, 1.0), (4.0, 4.0), (1.0, 4.0), (1.0, 1.0)]);
        let features = vec![PolygonFeature::new(Polygon::new(outer, vec![hole]), 1)];

        let r = rasterize(&features, &unit_grid(5, 5), 0u8, center_only()).unwrap();

        assert_eq!(r.values, ndarray::arr2(&[
            [1, 1, 1, 1, 1],
            [1, 0, 0, 0, 1],
            [1, 0, 0, 0, 1],
            [1, 0, 0, 0, 1],
            [1, 1, 1, 1, 1],
        ]));
    }

    #[test]
    fn test_multipolygon() {
        let mp = MultiPolygon::new(vec![square(0.0, 0.0, 1.0), square(2.0, 2.0, 1.0)]);
        let features = vec![PolygonFeature::new(mp, 8)];

        let r = rasterize(&features, &unit_grid(3, 3), 0i32, center_only()).unwrap();

        assert_eq!(r.values, ndarray::arr2(&[[8, 0, 0], [0, 0, 0], [0, 0, 8]]));
    }

    #[test]
    fn test_triangle_center_vs_touched() {
        // Right triangle whose hypotenuse cuts through the diagonal cells
        let triangle = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 0.0, y: 4.0)];
        let features = vec![PolygonFeature::new(triangle, 1)];

        let center = rasterize(&features, &unit_grid(4, 4), 0u8, center_only()).unwrap();
        assert_eq!(center.values, ndarray::arr2(&[
            [1, 1, 1, 0],
            [1, 1, 0, 0],
            [1, 0, 0, 0],
            [0, 0, 0, 0],
        ]));

        let all = rasterize(&features, &unit_grid(4, 4), 0u8, touched()).unwrap();
        assert_eq!(all.values, ndarray::arr2(&[
            [1, 1, 1, 1],
            [1, 1, 1, 0],
            [1, 1, 0, 0],
            [1, 0, 0, 0],
        ]));
    }

    #[test]
    fn test_sliver_only_touched() {
        // Thin polygon that misses every cell center
        let sliver = polygon![(x: 0.1, y: 0.1), (x: 2.9, y: 0.1), (x: 2.9, y: 0.2), (x: 0.1, y: 0.2)];
        let features = vec![PolygonFeature::new(sliver, 2)];

        let center = rasterize(&features, &unit_grid(3, 2), 0u8, center_only()).unwrap();
        assert_eq!(center.covered_count(), 0);

        let all = rasterize(&features, &unit_grid(3, 2), 0u8, touched()).unwrap();
        assert_eq!(covered_cells(&all), vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn test_polygon_inside_one_cell() {
        let tiny = square(1.2, 0.2, 0.1);
        let features = vec![PolygonFeature::new(tiny, 3)];

        let center = rasterize(&features, &unit_grid(3, 2), 0u8, center_only()).unwrap();
        assert_eq!(center.covered_count(), 0);

        let all = rasterize(&features, &unit_grid(3, 2), 0u8, touched()).unwrap();
        assert_eq!(covered_cells(&all), vec![(0, 1)]);
    }

    #[test]
    fn test_touched_superset_of_center() {
        let shapes = vec![
            polygon![(x: 0.3, y: 0.7), (x: 6.2, y: 1.1), (x: 4.4, y: 5.9), (x: 1.1, y: 4.3)],
            polygon![(x: -2.0, y: 3.3), (x: 3.7, y: -1.0), (x: 8.5, y: 6.6)],
            square(2.5, 2.5, 1.0),
            square(0.0, 0.0, 7.0),
        ];
        let grid = GridDefinition::new(0.0, 7.0, 1.0, -1.0, 7, 7);

        for shape in shapes {
            let features = vec![PolygonFeature::new(shape, 1)];
            let center = rasterize(&features, &grid, 0u8, center_only()).unwrap();
            let all = rasterize(&features, &grid, 0u8, touched()).unwrap();

            for i in center.coverage.iter_ones() {
                assert!(all.coverage[i]);
            }
            assert!(all.covered_count() >= center.covered_count());
        }
    }

    #[test]
    fn test_values_come_from_features_and_are_deterministic() {
        let features = vec![
            PolygonFeature::new(polygon![(x: 0.3, y: 0.7), (x: 6.2, y: 1.1), (x: 4.4, y: 5.9)], 11),
            PolygonFeature::new(square(2.0, 2.0, 3.0), 12),
            PolygonFeature::new(polygon![(x: 5.5, y: 0.0), (x: 9.0, y: 4.0), (x: 5.5, y: 8.0)], 13),
        ];
        let grid = unit_grid(8, 8);

        for options in [center_only(), touched()] {
            let first = rasterize(&features, &grid, 0u8, options).unwrap();
            for _ in 0..5 {
                assert_eq!(rasterize(&features, &grid, 0u8, options).unwrap(), first);
            }

            assert!(first.values.iter().all(|v| [0u8, 11, 12, 13].contains(v)));

            for (i, v) in first.values.iter().enumerate() {
                assert_eq!(first.coverage[i], *v != 0);
            }
        }
    }

    #[test]
    fn test_background_collision_kept_in_coverage() {
        let features = vec![PolygonFeature::new(square(0.0, 0.0, 1.0), 0)];

        let r = rasterize(&features, &unit_grid(2, 1), 0u8, center_only()).unwrap();

        assert!(r.values.iter().all(|v| *v == 0));
        assert!(r.is_covered(0, 0));
        assert!(!r.is_covered(0, 1));
        assert_eq!(r.class_counts(), BTreeMap::from([(0, 1)]));
        assert_eq!(r.value_counts(), BTreeMap::from([(0, 2)]));
    }

    #[test]
    fn test_aligned_parcel_with_decimal_cell_size() {
        //0.3 / 0.1 is not exactly 3
        let grid = GridDefinition::new(0.0, 0.8, 0.1, -0.1, 8, 8);
        let parcel = polygon![
            (x: 0.3, y: 0.3), (x: 0.6, y: 0.3), (x: 0.6, y: 0.6), (x: 0.3, y: 0.6),
        ];
        let features = vec![PolygonFeature::new(parcel, 1)];

        let center = rasterize(&features, &grid, 0u8, center_only()).unwrap();
        let all = rasterize(&features, &grid, 0u8, touched()).unwrap();

        assert_eq!(center.covered_count(), 9);
        assert_eq!(all.covered_count(), 9);
        assert_eq!(covered_cells(&all), covered_cells(&center));
        for row in 2..5 {
            for col in 3..6 {
                assert!(all.is_covered(row, col));
            }
        }

        //one arc second cells
        let arc_second = 1.0 / 3600.0;
        let grid = GridDefinition::new(10.0, 46.0, arc_second, -arc_second, 10, 10);
        let parcel = polygon![
            (x: 10.0 + 3.0 * arc_second, y: 46.0 - 7.0 * arc_second),
            (x: 10.0 + 6.0 * arc_second, y: 46.0 - 7.0 * arc_second),
            (x: 10.0 + 6.0 * arc_second, y: 46.0 - 2.0 * arc_second),
            (x: 10.0 + 3.0 * arc_second, y: 46.0 - 2.0 * arc_second),
        ];
        let features = vec![PolygonFeature::new(parcel, 1)];

        let center = rasterize(&features, &grid, 0u8, center_only()).unwrap();
        let all = rasterize(&features, &grid, 0u8, touched()).unwrap();

        assert_eq!(center.covered_count(), 15);
        assert_eq!(covered_cells(&all), covered_cells(&center));
    }

    #[test]
    fn test_snap_to_grid_line() {
        assert_eq!(snap_to_grid_line(0.3 / 0.1), 3.0);
        assert_eq!(snap_to_grid_line(-2.0000000000000004), -2.0);
        assert_eq!(snap_to_grid_line(2.5), 2.5);
        assert_eq!(snap_to_grid_line(2.001), 2.001);
    }

    #[test]
    fn test_real_world_coordinates() {
        let grid = GridDefinition::new(500_000.0, 4_100_000.0, 30.0, -30.0, 10, 10);
        let field = polygon![
            (x: 500_030.0, y: 4_099_970.0),
            (x: 500_120.0, y: 4_099_970.0),
            (x: 500_120.0, y: 4_099_910.0),
            (x: 500_030.0, y: 4_099_910.0),
        ];
        let features = vec![PolygonFeature::new(field, 42)];

        let r = rasterize(&features, &grid, 0u32, center_only()).unwrap();

        //Rows 1..3, cols 1..4
        assert_eq!(r.covered_count(), 6);
        for row in 1..3 {
            for col in 1..4 {
                assert_eq!(r.values[[row, col]], 42);
            }
        }
    }

    #[test]
    fn test_clip_to_grid() {
        let e = Line::new(Coord { x: -2.0, y: 1.0 }, Coord { x: 6.0, y: 1.0 });
        let c = clip_to_grid(&e, 3.0, 3.0).unwrap();
        assert_eq!(c.start, Coord { x: 0.0, y: 1.0 });
        assert_eq!(c.end, Coord { x: 3.0, y: 1.0 });

        let outside = Line::new(Coord { x: -1.0, y: -1.0 }, Coord { x: -1.0, y: 5.0 });
        assert!(clip_to_grid(&outside, 3.0, 3.0).is_none());
    }
}
