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
use core::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use float_cmp::{ApproxEq, F64Margin};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{RasterizeError, Result};

pub const MEDIUM_EPSILON: f64 = 1e-10;

// In lat/lon this is less than a meter
pub const LARGE_EPSILON: f64 = 1e-6;

/// Axis aligned bounding box in projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Extent {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Fails for NaN or infinite coordinates and for extents without area
    pub fn validate(&self) -> anyhow::Result<()> {
        if ![self.min_x, self.min_y, self.max_x, self.max_y].iter().all(|c| c.is_finite()) {
            bail!("Extent {} is not finite", self);
        }
        if !(self.max_x > self.min_x && self.max_y > self.min_y) {
            bail!("Extent {} has no area", self);
        }
        Ok(())
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Parses `minx,miny,maxx,maxy`
impl FromStr for Extent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>().with_context(|| format!("Bad coordinate {:?} in extent {:?}", p, s)))
            .collect::<anyhow::Result<Vec<f64>>>()?;

        if parts.len() != 4 {
            bail!("Extent must be minx,miny,maxx,maxy, got {:?}", s);
        }

        let extent = Extent::new(parts[0], parts[1], parts[2], parts[3]);
        extent.validate()?;

        Ok(extent)
    }
}

/// Where a raster lives in projected space: the top left corner, the size of a cell
/// and the number of cells.
///
/// Cell (row, col) spans x in `[origin_x + col * pixel_width, origin_x + (col + 1) * pixel_width]`
/// and y in `[origin_y + row * pixel_height, origin_y + (row + 1) * pixel_height]`.
/// For north up rasters pixel_height is negative.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct GridDefinition {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub num_cols: u32,
    pub num_rows: u32,
}

impl fmt::Display for GridDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Origin X,Y: {}, {}\nRight/Bottom: {},{}\nPixel Width/Height: {},{}\nRows: {} Cols: {}",
               self.origin_x,
               self.origin_y,
               self.right_x_coord(),
               self.bottom_y_coord(),
               self.pixel_width,
               self.pixel_height,
               self.num_rows,
               self.num_cols,
        )
    }
}

impl GridDefinition {
    pub fn new(origin_x: f64, origin_y: f64,
               pixel_width: f64, pixel_height: f64,
               num_cols: u32, num_rows: u32) -> Self {
        GridDefinition {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            num_cols,
            num_rows,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_cols == 0 || self.num_rows == 0 {
            return Err(RasterizeError::invalid_grid(format!(
                "grid must have at least 1 row and 1 column, got {} rows and {} columns",
                self.num_rows, self.num_cols)));
        }
        if self.pixel_width == 0.0 || !self.pixel_width.is_finite() {
            return Err(RasterizeError::invalid_grid(format!("pixel width is {}", self.pixel_width)));
        }
        if self.pixel_height == 0.0 || !self.pixel_height.is_finite() {
            return Err(RasterizeError::invalid_grid(format!("pixel height is {}", self.pixel_height)));
        }
        if !self.origin_x.is_finite() || !self.origin_y.is_finite() {
            return Err(RasterizeError::invalid_grid(format!(
                "origin {}, {} is not finite", self.origin_x, self.origin_y)));
        }
        Ok(())
    }

    /// Builds the grid from a GDAL style geo transform.  Rotated rasters are not supported.
    pub fn from_geo_transform(geo_transform: &[f64; 6], num_cols: u32, num_rows: u32) -> Result<Self> {
        if geo_transform[2] != 0.0 || geo_transform[4] != 0.0 {
            return Err(RasterizeError::invalid_grid(format!(
                "rotated geo transform {:?} is not supported", geo_transform)));
        }

        let grid = GridDefinition {
            origin_x: geo_transform[0],
            pixel_width: geo_transform[1],
            origin_y: geo_transform[3],
            pixel_height: geo_transform[5],
            num_cols,
            num_rows,
        };
        grid.validate()?;

        Ok(grid)
    }

    pub fn geo_transform(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, 0.0, self.origin_y, 0.0, self.pixel_height]
    }

    /// North up grid covering `extent`, the last row/column may stick out past the extent
    pub fn from_extent(extent: &Extent, pixel_width: f64, pixel_height: f64) -> Result<Self> {
        if pixel_width == 0.0 || !pixel_width.is_finite() || pixel_height == 0.0 || !pixel_height.is_finite() {
            return Err(RasterizeError::invalid_grid(format!(
                "pixel size {} x {} is not usable", pixel_width, pixel_height)));
        }
        if !(extent.width() >= 0.0 && extent.height() >= 0.0) {
            return Err(RasterizeError::invalid_grid(format!("extent {} is inverted", extent)));
        }

        let pixel_width = pixel_width.abs();
        let pixel_height = -pixel_height.abs();

        let num_cols = cell_count(extent.width() / pixel_width)?;
        let num_rows = cell_count(extent.height() / -pixel_height)?;

        let grid = GridDefinition {
            origin_x: extent.min_x,
            origin_y: extent.max_y,
            pixel_width,
            pixel_height,
            num_cols,
            num_rows,
        };
        grid.validate()?;

        Ok(grid)
    }

    /// Grid with the cell size of `self` that covers `extent` with cell edges on `self`'s grid lines.
    ///
    /// Used to burn only the area of a layer while staying aligned with a snap raster.
    pub fn snapped_to(&self, extent: &Extent) -> Result<Self> {
        self.validate()?;

        let (px_a, py_a) = self.to_pixel_space(extent.min_x, extent.max_y);
        let (px_b, py_b) = self.to_pixel_space(extent.max_x, extent.min_y);

        let first_col = (px_a.min(px_b) + LARGE_EPSILON).floor();
        let last_col = (px_a.max(px_b) - LARGE_EPSILON).ceil();
        let first_row = (py_a.min(py_b) + LARGE_EPSILON).floor();
        let last_row = (py_a.max(py_b) - LARGE_EPSILON).ceil();

        let grid = GridDefinition {
            origin_x: self.calc_x_coord(first_col),
            origin_y: self.calc_y_coord(first_row),
            pixel_width: self.pixel_width,
            pixel_height: self.pixel_height,
            num_cols: cell_count(last_col - first_col)?,
            num_rows: cell_count(last_row - first_row)?,
        };
        debug!("Snapped extent {} to grid\n{}", extent, grid);

        Ok(grid)
    }

    pub fn num_cells(&self) -> usize {
        self.num_cols as usize * self.num_rows as usize
    }

    pub fn calc_center<I: Into<f64>>(&self, raster_xy: (I, I)) -> [f64; 2] {
        [self.origin_x + self.pixel_width * (raster_xy.0.into() + 0.5),
         self.origin_y + self.pixel_height * (raster_xy.1.into() + 0.5)]
    }

    /// Calculates projected x coordinate of the left side of column raster_x
    pub fn calc_x_coord<I: Into<f64>>(&self, raster_x: I) -> f64 {
        self.origin_x + self.pixel_width * raster_x.into()
    }
    pub fn right_x_coord(&self) -> f64 {
        self.calc_x_coord(self.num_cols)
    }
    /// Calculates the top side, pixel height is usually negative
    pub fn calc_y_coord<I: Into<f64>>(&self, raster_y: I) -> f64 {
        self.origin_y + self.pixel_height * raster_y.into()
    }
    pub fn bottom_y_coord(&self) -> f64 {
        self.calc_y_coord(self.num_rows)
    }

    //Converts projected coordinate to raster_x
    pub fn calc_x(&self, x_coord: f64) -> i64 {
        ((x_coord - self.origin_x) / self.pixel_width).floor() as _
    }
    pub fn calc_y(&self, y_coord: f64) -> i64 {
        ((y_coord - self.origin_y) / self.pixel_height).floor() as _
    }

    /// Fractional (column, row) position of a projected coordinate
    pub fn to_pixel_space(&self, x_coord: f64, y_coord: f64) -> (f64, f64) {
        ((x_coord - self.origin_x) / self.pixel_width,
         (y_coord - self.origin_y) / self.pixel_height)
    }

    pub fn extent(&self) -> Extent {
        let (left, right) = (self.origin_x, self.right_x_coord());
        let (top, bottom) = (self.origin_y, self.bottom_y_coord());
        Extent::new(left.min(right), top.min(bottom), left.max(right), top.max(bottom))
    }

    pub fn is_aligned(&self, rhs: &Self) -> bool {
        let margin = F64Margin { epsilon: MEDIUM_EPSILON, ulps: 5 };
        if !self.pixel_width.approx_eq(rhs.pixel_width, margin) ||
            !self.pixel_height.approx_eq(rhs.pixel_height, margin) {
            debug!("Not aligned, pixel sizes {}x{} and {}x{}",
                   self.pixel_width, self.pixel_height, rhs.pixel_width, rhs.pixel_height);
            return false;
        }

        //check the origin difference is an integer multiple of the pixel size
        let ox_diff = (self.origin_x - rhs.origin_x) / self.pixel_width;
        let oy_diff = (self.origin_y - rhs.origin_y) / self.pixel_height;

        let margin = F64Margin { epsilon: LARGE_EPSILON, ulps: 0 };

        if !(ox_diff.round() - ox_diff).approx_eq(0.0, margin) {
            debug!("Not aligned - X: Origin diff: {} div: {}", ox_diff.round() - ox_diff, ox_diff);
            return false;
        }

        if !(oy_diff.round() - oy_diff).approx_eq(0.0, margin) {
            debug!("Not aligned - Y: Origin diff: {} div: {}", oy_diff.round() - oy_diff, oy_diff);
            return false;
        }

        true
    }
}

fn cell_count(cells: f64) -> Result<u32> {
    if !cells.is_finite() || cells > u32::MAX as f64 {
        return Err(RasterizeError::invalid_grid(format!("{} cells do not fit in a raster", cells)));
    }
    //Floating noise in the division should not add a whole row/column
    Ok(((cells - LARGE_EPSILON).ceil() as u32).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn north_up() -> GridDefinition {
        GridDefinition {
            origin_x: 4.0,
            origin_y: 5.0,
            pixel_height: -2.0,
            pixel_width: 1.0,
            num_rows: 4,
            num_cols: 5,
        }
    }

    #[test]
    fn test_coords() {
        let r1 = north_up();

        assert_eq!(r1.calc_x(4.0), 0);
        assert_eq!(r1.calc_x(4.999), 0);
        assert_eq!(r1.calc_x(5.0), 1);

        assert_eq!(r1.calc_y(5.0), 0);
        assert_eq!(r1.calc_y(3.001), 0);
        assert_eq!(r1.calc_y(3.0), 1);

        assert_eq!(r1.right_x_coord(), 9.0);
        assert_eq!(r1.bottom_y_coord(), -3.0);
        assert_eq!(r1.calc_center((0u32, 0u32)), [4.5, 4.0]);

        assert_eq!(r1.extent(), Extent::new(4.0, -3.0, 9.0, 5.0));
        assert_eq!(r1.to_pixel_space(6.5, 0.0), (2.5, 2.5));
    }

    #[test]
    fn test_validate() {
        assert!(north_up().validate().is_ok());

        let mut g = north_up();
        g.num_rows = 0;
        assert!(matches!(g.validate(), Err(RasterizeError::InvalidGrid { .. })));

        let mut g = north_up();
        g.num_cols = 0;
        assert!(matches!(g.validate(), Err(RasterizeError::InvalidGrid { .. })));

        let mut g = north_up();
        g.pixel_width = 0.0;
        assert!(matches!(g.validate(), Err(RasterizeError::InvalidGrid { .. })));

        let mut g = north_up();
        g.pixel_height = f64::NAN;
        assert!(matches!(g.validate(), Err(RasterizeError::InvalidGrid { .. })));
    }

    #[test]
    fn test_geo_transform() {
        let g = north_up();
        let gt = g.geo_transform();
        assert_eq!(gt, [4.0, 1.0, 0.0, 5.0, 0.0, -2.0]);

        assert_eq!(GridDefinition::from_geo_transform(&gt, 5, 4).unwrap(), g);

        assert!(GridDefinition::from_geo_transform(&[4.0, 1.0, 0.1, 5.0, 0.0, -2.0], 5, 4).is_err());
        assert!(GridDefinition::from_geo_transform(&gt, 5, 0).is_err());
    }

    #[test]
    fn test_from_extent() {
        let extent = Extent::new(100.0, 200.0, 130.0, 221.0);
        let g = GridDefinition::from_extent(&extent, 10.0, 10.0).unwrap();

        assert_eq!(g.origin_x, 100.0);
        assert_eq!(g.origin_y, 221.0);
        assert_eq!(g.pixel_width, 10.0);
        assert_eq!(g.pixel_height, -10.0);
        assert_eq!(g.num_cols, 3);
        //21 does not divide by 10, the last row sticks out
        assert_eq!(g.num_rows, 3);

        //Degenerate extent still gets a single cell
        let g = GridDefinition::from_extent(&Extent::new(1.0, 1.0, 1.0, 1.0), 0.5, 0.5).unwrap();
        assert_eq!((g.num_cols, g.num_rows), (1, 1));

        assert!(GridDefinition::from_extent(&extent, 0.0, 10.0).is_err());
        assert!(GridDefinition::from_extent(&Extent::new(5.0, 0.0, 1.0, 1.0), 1.0, 1.0).is_err());
    }

    #[test]
    fn test_from_extent_float_noise() {
        let extent = Extent::new(0.0, 0.0, 0.3, 0.3);
        let g = GridDefinition::from_extent(&extent, 0.1, 0.1).unwrap();
        //0.3 / 0.1 is 2.9999999999999996
        assert_eq!((g.num_cols, g.num_rows), (3, 3));
    }

    #[test]
    fn test_snapped_to() {
        let snap = GridDefinition::new(0.0, 100.0, 10.0, -10.0, 10, 10);

        let g = snap.snapped_to(&Extent::new(12.0, 41.0, 38.0, 69.0)).unwrap();

        assert_eq!(g.origin_x, 10.0);
        assert_eq!(g.origin_y, 70.0);
        assert_eq!(g.num_cols, 3);
        assert_eq!(g.num_rows, 3);
        assert_eq!(g.pixel_width, snap.pixel_width);
        assert_eq!(g.pixel_height, snap.pixel_height);
        assert!(g.is_aligned(&snap));

        //Already on grid lines, no extra row or column
        let g = snap.snapped_to(&Extent::new(10.0, 40.0, 40.0, 70.0)).unwrap();
        assert_eq!((g.origin_x, g.origin_y, g.num_cols, g.num_rows), (10.0, 70.0, 3, 3));

        //Extents outside the snap raster are fine, the grid just extends past it
        let g = snap.snapped_to(&Extent::new(-15.0, 95.0, -5.0, 105.0)).unwrap();
        assert_eq!((g.origin_x, g.origin_y, g.num_cols, g.num_rows), (-20.0, 110.0, 2, 2));
    }

    #[test]
    fn test_is_aligned() {
        let r1 = GridDefinition {
            origin_x: -13.261527777777777,
            origin_y: 35.324305555555554,
            pixel_height: -0.000277777777778,
            pixel_width: 0.000277777777778,
            num_rows: 4,
            num_cols: 5,
        };

        let r2 = GridDefinition {
            origin_x: 34.908472222222223,
            origin_y: 5.457361111111111,
            num_rows: 3,
            num_cols: 10,
            ..r1.clone()
        };

        assert!(r1.is_aligned(&r2));

        let r3 = GridDefinition {
            origin_y: r2.origin_y + 0.05 * r2.pixel_height,
            ..r2.clone()
        };

        assert!(!r1.is_aligned(&r3));

        let r4 = GridDefinition {
            pixel_width: r1.pixel_width * 2.0,
            ..r1.clone()
        };
        assert!(!r1.is_aligned(&r4));
    }

    #[test]
    fn test_parse_extent() {
        let e: Extent = "1, 2,3.5,4".parse().unwrap();
        assert_eq!(e, Extent::new(1.0, 2.0, 3.5, 4.0));
        assert!(approx_eq!(f64, e.width(), 2.5, epsilon = MEDIUM_EPSILON));

        assert!("1,2,3".parse::<Extent>().is_err());
        assert!("1,2,a,4".parse::<Extent>().is_err());
        assert!("3,2,1,4".parse::<Extent>().is_err());
        assert!("1,2,1,4".parse::<Extent>().is_err());
        assert!("1,2,NaN,4".parse::<Extent>().is_err());

        assert!(Extent::new(0.0, 0.0, f64::INFINITY, 1.0).validate().is_err());
        assert!(Extent::new(0.0, 0.0, 1.0, 1.0).validate().is_ok());
    }
}
