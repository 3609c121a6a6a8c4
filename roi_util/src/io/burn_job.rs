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
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::io::InputOgrLayer;
use crate::raster::{Extent, RasterDataType};

/// Everything needed to burn one polygon layer into a raster.  Read from a TOML file or
/// assembled from command line arguments.
///
/// ```toml
/// output_raster = "/data/roi.tif"
/// snap_raster = "/data/landsat_b1.tif"
/// burn_field = "class_id"
/// all_touched = false
///
/// [input]
/// ogr_conn_str = "/data/training.shp"
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BurnJob {
    pub input: InputOgrLayer,

    pub output_raster: PathBuf,

    /// Output takes the grid and projection of this raster
    pub snap_raster: Option<PathBuf>,

    /// With a snap raster, the output is cut to this extent (grown to snap grid lines).
    /// Without one, pixel_size is required.
    pub extent: Option<Extent>,
    pub pixel_size: Option<f64>,

    /// Integer field holding the class id, the FID is burned when missing
    pub burn_field: Option<String>,

    #[serde(default)]
    pub all_touched: bool,

    #[serde(default)]
    pub data_type: RasterDataType,

    #[serde(default)]
    pub background: i64,

    pub no_data_value: Option<f64>,

    /// Remove an existing output instead of keeping it
    #[serde(default)]
    pub clean: bool,
}

/// Where the output grid comes from
#[derive(Debug, Clone, PartialEq)]
pub enum GridSource {
    SnapRaster(PathBuf),
    SnappedExtent { snap_raster: PathBuf, extent: Extent },
    Extent { extent: Extent, pixel_size: f64 },
}

impl BurnJob {
    pub fn new(input: InputOgrLayer, output_raster: &Path) -> Self {
        BurnJob {
            input,
            output_raster: output_raster.to_path_buf(),
            snap_raster: None,
            extent: None,
            pixel_size: None,
            burn_field: None,
            all_touched: false,
            data_type: RasterDataType::default(),
            background: 0,
            no_data_value: None,
            clean: false,
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let job: BurnJob = toml::from_str(s).context("Invalid burn job")?;
        job.grid_source()?;
        Ok(job)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("Unable to read job file {:?}", path))?;
        Self::from_toml_str(&s).with_context(|| format!("In job file {:?}", path))
    }

    pub fn grid_source(&self) -> Result<GridSource> {
        if let Some(extent) = self.extent.as_ref() {
            extent.validate()?;
        }
        match (&self.snap_raster, self.extent, self.pixel_size) {
            (Some(snap), None, None) => Ok(GridSource::SnapRaster(snap.clone())),
            (Some(snap), Some(extent), None) => Ok(GridSource::SnappedExtent {
                snap_raster: snap.clone(),
                extent,
            }),
            (None, Some(extent), Some(pixel_size)) => {
                if !(pixel_size > 0.0 && pixel_size.is_finite()) {
                    bail!("Pixel size must be positive, got {}", pixel_size);
                }
                Ok(GridSource::Extent { extent, pixel_size })
            }
            (Some(_), _, Some(_)) => bail!("The pixel size comes from the snap raster, do not give both"),
            (None, Some(_), None) => bail!("An extent needs a pixel size"),
            (None, None, Some(_)) => bail!("A pixel size needs an extent"),
            (None, None, None) => bail!("Either a snap raster or an extent with a pixel size is required"),
        }
    }
}
