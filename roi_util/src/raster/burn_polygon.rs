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
use std::fmt;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use gdal::raster::GdalType;
use gdal::spatial_ref::SpatialRef;
use log::{debug, info, warn};

use crate::io::{BurnJob, GridSource};
use crate::raster::{rasterize, write_burned_raster, BurnValue, GridDefinition, Raster, RasterDataType, RasterizeOptions};
use crate::util::format_duration;
use crate::vector::{read_polygon_features, VectorSource};

/// What a burn produced
pub struct BurnReport {
    pub layer_name: String,
    pub grid: GridDefinition,
    pub data_type: RasterDataType,
    pub num_features: usize,
    pub skipped: usize,
    pub covered_cells: usize,
    pub class_counts: BTreeMap<i64, usize>,
}

impl fmt::Display for BurnReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Burned {} polygons of {} as {} ({} features skipped)",
                 self.num_features, self.layer_name, self.data_type, self.skipped)?;
        writeln!(f, "{}", self.grid)?;
        writeln!(f, "Covered cells: {} of {}", self.covered_cells, self.grid.num_cells())?;
        for (class, count) in self.class_counts.iter() {
            writeln!(f, "  class {}: {}", class, count)?;
        }
        Ok(())
    }
}

/// Reads the job's polygon layer and burns it into a new GeoTIFF.
///
/// The grid and projection come from the snap raster when there is one, otherwise the
/// grid is built from the extent and the layer's projection is used.
pub fn burn_polygon_to_raster(job: &BurnJob) -> Result<BurnReport> {
    let now = Instant::now();

    let source = read_polygon_features(&job.input, job.burn_field.as_deref())?;

    let (grid, snap_projection) = match job.grid_source()? {
        GridSource::SnapRaster(path) => {
            let snap_raster = Raster::read(&path)?;
            debug!("Use snap raster: {:?}", snap_raster.path);
            (snap_raster.grid.clone(), Some(snap_raster.projection.clone()))
        }
        GridSource::SnappedExtent { snap_raster, extent } => {
            let snap_raster = Raster::read(&snap_raster)?;
            (snap_raster.grid.snapped_to(&extent)?, Some(snap_raster.projection.clone()))
        }
        GridSource::Extent { extent, pixel_size } => {
            (GridDefinition::from_extent(&extent, pixel_size, pixel_size)?, None)
        }
    };

    let projection = choose_projection(snap_projection, source.projection.as_deref());

    check_class_range(&source, job.data_type)?;

    let options = RasterizeOptions {
        all_touched: job.all_touched,
        ..Default::default()
    };

    info!("Burning {} polygons into {} x {} cells of {}, all touched: {}",
          source.features.len(), grid.num_cols, grid.num_rows, job.data_type, job.all_touched);

    let report = match job.data_type {
        RasterDataType::Byte => burn_typed::<u8>(job, &source, &grid, &projection, options),
        RasterDataType::UInt16 => burn_typed::<u16>(job, &source, &grid, &projection, options),
        RasterDataType::Int16 => burn_typed::<i16>(job, &source, &grid, &projection, options),
        RasterDataType::UInt32 => burn_typed::<u32>(job, &source, &grid, &projection, options),
        RasterDataType::Int32 => burn_typed::<i32>(job, &source, &grid, &projection, options),
        RasterDataType::Float32 => burn_typed::<f32>(job, &source, &grid, &projection, options),
        RasterDataType::Float64 => burn_typed::<f64>(job, &source, &grid, &projection, options),
    }?;

    info!("Wrote {:?} in {}", job.output_raster, format_duration(now.elapsed()));

    Ok(report)
}

fn burn_typed<T: BurnValue + GdalType>(
    job: &BurnJob,
    source: &VectorSource,
    grid: &GridDefinition,
    projection: &str,
    options: RasterizeOptions,
) -> Result<BurnReport> {
    let background = T::from_attribute(job.background)
        .with_context(|| format!("Background {} does not fit in {}", job.background, T::TYPE_NAME))?;

    let burned = rasterize(&source.features, grid, background, options)?;

    write_burned_raster(&job.output_raster, &burned, projection, job.no_data_value)?;

    Ok(BurnReport {
        layer_name: source.layer_name.clone(),
        grid: grid.clone(),
        data_type: job.data_type,
        num_features: source.features.len(),
        skipped: source.skipped,
        covered_cells: burned.covered_count(),
        class_counts: burned.class_counts(),
    })
}

fn check_class_range(source: &VectorSource, data_type: RasterDataType) -> Result<()> {
    let min = source.features.iter().map(|f| f.value).min();
    let max = source.features.iter().map(|f| f.value).max();

    if let (Some(min), Some(max)) = (min, max) {
        debug!("Classes range from {} to {}", min, max);
        if !data_type.holds_range(min, max) {
            bail!("Classes from {} to {} do not fit in {}, choose a larger data type", min, max, data_type);
        }
    }
    Ok(())
}

/// The snap raster's projection wins, the polygons are not reprojected
fn choose_projection(snap_projection: Option<String>, vector_projection: Option<&str>) -> String {
    let snap_projection = snap_projection.filter(|p| !p.is_empty());

    if let (Some(snap), Some(vector)) = (snap_projection.as_deref(), vector_projection) {
        if !same_spatial_ref(snap, vector) {
            warn!("Polygons and snap raster have different projections, polygons are burned as is");
        }
    }

    snap_projection
        .or_else(|| vector_projection.map(|p| p.to_string()))
        .unwrap_or_default()
}

fn same_spatial_ref(lhs_wkt: &str, rhs_wkt: &str) -> bool {
    match (SpatialRef::from_wkt(lhs_wkt), SpatialRef::from_wkt(rhs_wkt)) {
        (Ok(lhs), Ok(rhs)) => lhs == rhs,
        _ => lhs_wkt == rhs_wkt,
    }
}
