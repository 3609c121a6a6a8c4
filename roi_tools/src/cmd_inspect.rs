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

use anyhow::Result;
use roi_util::vector::describe_dataset;
use structopt::StructOpt;

#[derive(StructOpt)]
pub struct InspectArgs {
    #[structopt(parse(from_os_str), help = "Vector dataset, anything OGR can open")]
    input: PathBuf,
}

pub fn inspect(args: &InspectArgs) -> Result<()> {
    let summaries = describe_dataset(&args.input)?;

    if summaries.is_empty() {
        println!("{:?} has no layers", &args.input);
    }

    for summary in summaries.iter() {
        println!("{}", summary);
    }

    Ok(())
}
