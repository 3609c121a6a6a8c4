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
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InputOgrLayer {
    //ogr layer name, if empty the dataset must have exactly 1 layer (like shapefiles)
    #[serde(default)]
    pub layer_name: String,

    pub ogr_conn_str: String,

    #[serde(rename="ogr_filter")]
    pub attribute_filter: Option<String>,
}

impl InputOgrLayer {
    pub fn new(ogr_conn_str: &str) -> Self {
        InputOgrLayer {
            ogr_conn_str: ogr_conn_str.to_string(),
            ..Default::default()
        }
    }
}

impl fmt::Display for InputOgrLayer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Layer: {:?} ogr conn: {}",
               self.layer_name,
               self.ogr_conn_str
        )?;
        if let Some(af) = self.attribute_filter.as_ref() {
            write!(f, " filter: {}", af)?;
        }
        Ok(())
    }
}
