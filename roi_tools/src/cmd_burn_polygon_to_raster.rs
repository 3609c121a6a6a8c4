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
use std::fs::remove_file;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use gdal::version::version_info;
use log::{debug, info};
use roi_util::io::{BurnJob, InputOgrLayer};
use roi_util::raster::{burn_polygon_to_raster, Extent, RasterDataType};
use roi_util::util::format_duration;
use structopt::StructOpt;

#[derive(StructOpt)]
pub struct PolygonArgs {

    #[structopt(parse(from_os_str), long, help="TOML file with the burn settings, replaces the other arguments")]
    job: Option<PathBuf>,

    #[structopt(long)]
    layer_name: Option<String>,

    #[structopt(long, required_unless="job")]
    ogr_conn_str: Option<String>,

    #[structopt(parse(from_os_str), long, required_unless="job")]
    output_raster: Option<PathBuf>,

    #[structopt(parse(from_os_str), long, help="Output takes the grid and projection of this raster")]
    snap_raster: Option<PathBuf>,

    #[structopt(long, help="minx,miny,maxx,maxy.  With a snap raster the output is cut to it")]
    extent: Option<Extent>,

    #[structopt(long, help="Cell size when there is no snap raster")]
    pixel_size: Option<f64>,

    #[structopt(long)]
    all_touched: bool,

    #[structopt(long)]
    clean: bool,

    #[structopt(long, default_value="Byte", help="data type, can be one of Byte/UInt16/Int16/UInt32/Int32/Float32/Float64")]
    data_type: RasterDataType,

    #[structopt(long, help="Integer field to burn, default is the fid")]
    burn_field: Option<String>,

    #[structopt(long, help="Optional SQL filter to filter the input")]
    attribute_filter: Option<String>,

    #[structopt(long, default_value="0", allow_hyphen_values=true, help="Value of cells outside every polygon")]
    background: i64,

    #[structopt(long, allow_hyphen_values=true)]
    no_data_value: Option<f64>,
}

impl PolygonArgs {
    fn flags_set_besides_job(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        let mut check = |set: bool, flag: &'static str| {
            if set {
                flags.push(flag);
            }
        };
        check(self.layer_name.is_some(), "--layer-name");
        check(self.ogr_conn_str.is_some(), "--ogr-conn-str");
        check(self.output_raster.is_some(), "--output-raster");
        check(self.snap_raster.is_some(), "--snap-raster");
        check(self.extent.is_some(), "--extent");
        check(self.pixel_size.is_some(), "--pixel-size");
        check(self.all_touched, "--all-touched");
        check(self.clean, "--clean");
        check(self.data_type != RasterDataType::default(), "--data-type");
        check(self.burn_field.is_some(), "--burn-field");
        check(self.attribute_filter.is_some(), "--attribute-filter");
        check(self.background != 0, "--background");
        check(self.no_data_value.is_some(), "--no-data-value");
        flags
    }

    fn to_job(&self) -> Result<BurnJob> {
        if let Some(job_path) = self.job.as_ref() {
            let ignored = self.flags_set_besides_job();
            if !ignored.is_empty() {
                bail!("--job holds all the settings, remove {}", ignored.join(" "));
            }
            debug!("Reading job {:?}", job_path);
            return BurnJob::read(job_path);
        }

        let (ogr_conn_str, output_raster) = match (self.ogr_conn_str.as_ref(), self.output_raster.as_ref()) {
            (Some(c), Some(o)) => (c, o),
            _ => bail!("--ogr-conn-str and --output-raster are required without --job"),
        };

        let input = InputOgrLayer {
            layer_name: self.layer_name.clone().unwrap_or_default(),
            ogr_conn_str: ogr_conn_str.to_string(),
            attribute_filter: self.attribute_filter.clone(),
        };

        let job = BurnJob {
            snap_raster: self.snap_raster.clone(),
            extent: self.extent,
            pixel_size: self.pixel_size,
            burn_field: self.burn_field.clone(),
            all_touched: self.all_touched,
            data_type: self.data_type,
            background: self.background,
            no_data_value: self.no_data_value,
            clean: self.clean,
            ..BurnJob::new(input, output_raster)
        };
        job.grid_source()?;

        Ok(job)
    }
}

pub fn burn_polygon_cmd(args: &PolygonArgs) -> Result<()> {
    let now = Instant::now();

    let version_text = version_info("--version");

    debug!("GDAL version: {}", version_text);

    let job = args.to_job()?;

    if job.clean && job.output_raster.exists() {
        debug!("Removing/cleaning Output {:?}", &job.output_raster);
        remove_file(&job.output_raster)?;
    }

    if job.output_raster.exists() {
        info!("Output {:?} already exists, use --clean to replace it", &job.output_raster);
        return Ok(());
    }

    let report = burn_polygon_to_raster(&job)?;

    println!("{}", report);

    debug!("Finished in {}", format_duration(now.elapsed()));

    Ok(())
}
