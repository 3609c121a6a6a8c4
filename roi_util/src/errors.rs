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
use thiserror::Error;

/// Failures of the rasterization core.  Raised before any output is allocated,
/// there is never a partially burned raster.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum RasterizeError {
    #[error("Invalid grid definition: {reason}")]
    InvalidGrid {
        reason: String,
    },
    #[error(
        "Feature {feature_index} has attribute value {value} which cannot be stored as {target_type}"
    )]
    UnsupportedAttributeType {
        feature_index: usize,
        value: i64,
        target_type: &'static str,
    },
    #[error("No features to rasterize")]
    EmptyFeatureSet,
}

impl RasterizeError {
    pub(crate) fn invalid_grid(reason: impl Into<String>) -> Self {
        RasterizeError::InvalidGrid {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterizeError>;
