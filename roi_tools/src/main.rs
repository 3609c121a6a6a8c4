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
use anyhow::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use structopt::StructOpt;

use crate::cmd_burn_polygon_to_raster::{burn_polygon_cmd, PolygonArgs};
use crate::cmd_inspect::{inspect, InspectArgs};
use crate::cmd_raster_summary::{print_raster_summary, RasterSummaryArgs};

mod cmd_burn_polygon_to_raster;
mod cmd_inspect;
mod cmd_raster_summary;

#[derive(StructOpt)]
struct Cli {

    #[structopt(long, default_value = "Warn")]
    log_level: LevelFilter,

    #[structopt(subcommand)]
    cmd: Command
}

#[derive(StructOpt)]
enum Command {
    #[structopt(help="Lists layers, fields, feature counts and extents of a vector source")]
    Inspect(InspectArgs),

    #[structopt(help="Burns polygon classes into a raster aligned with a snap raster or an extent")]
    BurnPolygonToRaster(PolygonArgs),

    #[structopt(help="Prints the grid, projection and pixel count per value of a raster")]
    RasterSummary(RasterSummaryArgs),
}

fn run() -> Result<()> {
    let args = Cli::from_args();

    SimpleLogger::new().with_level(args.log_level).init()?;

    match &args.cmd {
        Command::Inspect(r) => {
            inspect(r)?;
        },
        Command::BurnPolygonToRaster(r) => {
            burn_polygon_cmd(r)?;
        },
        Command::RasterSummary(r) => {
            print_raster_summary(r)?;
        },
    }

    Ok(())
}

fn main() -> Result<()> {
    run()
}
