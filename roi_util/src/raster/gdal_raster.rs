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
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use gdal::raster::{Buffer, GdalType, RasterBand};
use gdal::{Dataset, DriverManager};
use log::debug;
use ndarray::Array2;

use crate::raster::{BurnValue, BurnedRaster, GridDefinition};

const GTIFF_DRIVER: &str = "GTiff";

/// An opened single band raster.  The dataset is closed when this is dropped.
pub struct Raster
{
    pub path: PathBuf,
    pub grid: GridDefinition,
    pub no_data_value: Option<f64>,
    /// WKT, empty when the raster has none
    pub projection: String,
    pub dataset: Dataset,
}

impl Raster {
    pub fn read(path: &Path) -> Result<Raster> {
        if !path.is_file() {
            bail!("Raster {:?} does not exist", path);
        }

        let dataset = Dataset::open(path).with_context(|| format!("Unable to open raster {:?}", path))?;

        let (num_cols, num_rows) = dataset.raster_size();
        let geo_transform = dataset.geo_transform()
            .with_context(|| format!("Raster {:?} has no geo transform", path))?;
        let grid = GridDefinition::from_geo_transform(
            &geo_transform,
            u32::try_from(num_cols)?,
            u32::try_from(num_rows)?,
        )?;

        let no_data_value = dataset.rasterband(1)?.no_data_value();
        let projection = dataset.projection();

        debug!("Read raster {:?} no data {:?}\n{}", path, no_data_value, grid);

        Ok(Raster {
            path: path.to_path_buf(),
            grid,
            no_data_value,
            projection,
            dataset,
        })
    }

    pub fn band(&self) -> Result<RasterBand> {
        Ok(self.dataset.rasterband(1)?)
    }

    /// Reads the whole first band, shape is (rows, cols)
    pub fn read_band_as_array<T: Copy + GdalType + Default>(&self) -> Result<Array2<T>> {
        let band = self.band()?;
        let num_cols = self.grid.num_cols as usize;
        let num_rows = self.grid.num_rows as usize;

        let mut data = vec![T::default(); num_cols * num_rows];
        band.read_into_slice((0, 0), (num_cols, num_rows), (num_cols, num_rows), &mut data, None)?;

        Ok(Array2::from_shape_vec((num_rows, num_cols), data)?)
    }
}

/// Writes `raster` to a new single band GeoTIFF at `path`, replacing any file already there.
pub fn write_burned_raster<T: BurnValue + GdalType>(
    path: &Path,
    raster: &BurnedRaster<T>,
    projection: &str,
    no_data_value: Option<f64>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            create_dir_all(parent)?;
        }
    }

    let grid = &raster.grid;
    let num_cols = grid.num_cols as usize;
    let num_rows = grid.num_rows as usize;

    let driver = DriverManager::get_driver_by_name(GTIFF_DRIVER)?;

    debug!("Creating output tif {:?} of {}", path, T::TYPE_NAME);
    let mut dataset = driver.create_with_band_type::<T, _>(
        path, num_cols as isize, num_rows as isize, 1)
        .with_context(|| format!("Unable to create {:?}", path))?;

    dataset.set_geo_transform(&grid.geo_transform())?;
    if !projection.is_empty() {
        dataset.set_projection(projection)?;
    }

    let mut band = dataset.rasterband(1)?;

    //iter() walks the array in row major order whatever its memory layout
    let buffer = Buffer::new((num_cols, num_rows), raster.values.iter().copied().collect());
    band.write((0, 0), (num_cols, num_rows), &buffer)?;

    if let Some(no_data_value) = no_data_value {
        band.set_no_data_value(Some(no_data_value))?;
    }

    debug!("Wrote {} cells to {:?}", grid.num_cells(), path);

    Ok(())
}
