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
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use format_num::NumberFormat;
use gdal::raster::GdalDataType;
use log::debug;
use roi_util::raster::{value_counts_except_no_data, Raster};
use roi_util::util::format_duration;
use structopt::StructOpt;

#[derive(StructOpt)]
pub struct RasterSummaryArgs {
    #[structopt(parse(from_os_str))]
    raster: PathBuf,

    #[structopt(long, help="Also count no data cells")]
    include_no_data: bool,
}

pub fn print_raster_summary(args: &RasterSummaryArgs) -> Result<()> {
    let now = Instant::now();

    let raster = Raster::read(&args.raster)?;

    println!("Raster: {:?}", &raster.path);
    println!("{}", raster.grid);
    println!("No data: {:?}", raster.no_data_value);
    println!("Projection: {}\n", if raster.projection.is_empty() { "none" } else { &raster.projection });

    let no_data_value = if args.include_no_data { None } else { raster.no_data_value };

    //integer classes, floats are truncated when counted
    let counts = match raster.band()?.band_type() {
        GdalDataType::UInt8 => value_counts_except_no_data(&raster.read_band_as_array::<u8>()?, no_data_value),
        GdalDataType::UInt16 => value_counts_except_no_data(&raster.read_band_as_array::<u16>()?, no_data_value),
        GdalDataType::Int16 => value_counts_except_no_data(&raster.read_band_as_array::<i16>()?, no_data_value),
        GdalDataType::UInt32 => value_counts_except_no_data(&raster.read_band_as_array::<u32>()?, no_data_value),
        GdalDataType::Int32 => value_counts_except_no_data(&raster.read_band_as_array::<i32>()?, no_data_value),
        _ => value_counts_except_no_data(&raster.read_band_as_array::<f64>()?, no_data_value),
    };

    let num = NumberFormat::new();
    let total: usize = counts.values().sum();

    println!("{:>12} {:>16} {:>8}", "Value", "Pixels", "%");
    for (value, count) in counts.iter() {
        println!("{:>12} {:>16} {:>8}",
                 value,
                 num.format(",.0f", *count as f64),
                 num.format(".2f", 100.0 * *count as f64 / total.max(1) as f64));
    }
    println!("{:>12} {:>16}", "Total", num.format(",.0f", total as f64));

    debug!("Finished in {}", format_duration(now.elapsed()));

    Ok(())
}
