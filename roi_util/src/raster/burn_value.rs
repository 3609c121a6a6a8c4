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
use std::fmt::{self, Debug};
use std::str::FromStr;

use anyhow::bail;
use num::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Cell type of a burned raster.  Class ids are integers, every cell type must be able
/// to tell whether a given class id fits.
pub trait BurnValue: Copy + PartialEq + Debug + Send + Sync + NumCast + ToPrimitive + 'static {
    /// GDAL name of the type
    const TYPE_NAME: &'static str;

    fn from_attribute(value: i64) -> Option<Self> {
        <Self as NumCast>::from(value)
    }
}

impl BurnValue for u8 {
    const TYPE_NAME: &'static str = "Byte";
}
impl BurnValue for u16 {
    const TYPE_NAME: &'static str = "UInt16";
}
impl BurnValue for i16 {
    const TYPE_NAME: &'static str = "Int16";
}
impl BurnValue for u32 {
    const TYPE_NAME: &'static str = "UInt32";
}
impl BurnValue for i32 {
    const TYPE_NAME: &'static str = "Int32";
}
impl BurnValue for f32 {
    const TYPE_NAME: &'static str = "Float32";

    //f32 has 24 bits of mantissa, larger ids would silently merge
    fn from_attribute(value: i64) -> Option<Self> {
        let v = value as f32;
        //2^63 saturates back to i64::MAX
        if v.abs() < i64::MAX as f32 && v as i64 == value {
            Some(v)
        } else {
            None
        }
    }
}
impl BurnValue for f64 {
    const TYPE_NAME: &'static str = "Float64";

    fn from_attribute(value: i64) -> Option<Self> {
        let v = value as f64;
        if v.abs() < i64::MAX as f64 && v as i64 == value {
            Some(v)
        } else {
            None
        }
    }
}

/// Output data types the burn command can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterDataType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl Default for RasterDataType {
    fn default() -> Self {
        RasterDataType::Byte
    }
}

impl RasterDataType {
    pub fn name(&self) -> &'static str {
        match self {
            RasterDataType::Byte => u8::TYPE_NAME,
            RasterDataType::UInt16 => u16::TYPE_NAME,
            RasterDataType::Int16 => i16::TYPE_NAME,
            RasterDataType::UInt32 => u32::TYPE_NAME,
            RasterDataType::Int32 => i32::TYPE_NAME,
            RasterDataType::Float32 => f32::TYPE_NAME,
            RasterDataType::Float64 => f64::TYPE_NAME,
        }
    }

    /// Whether every class id in `[min, max]` can be burned with this type
    pub fn holds_range(&self, min: i64, max: i64) -> bool {
        fn fits<T: BurnValue>(min: i64, max: i64) -> bool {
            T::from_attribute(min).is_some() && T::from_attribute(max).is_some()
        }
        match self {
            RasterDataType::Byte => fits::<u8>(min, max),
            RasterDataType::UInt16 => fits::<u16>(min, max),
            RasterDataType::Int16 => fits::<i16>(min, max),
            RasterDataType::UInt32 => fits::<u32>(min, max),
            RasterDataType::Int32 => fits::<i32>(min, max),
            RasterDataType::Float32 => fits::<f32>(min, max),
            RasterDataType::Float64 => fits::<f64>(min, max),
        }
    }
}

impl fmt::Display for RasterDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RasterDataType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let t = match s {
            "Byte" => RasterDataType::Byte,
            "UInt16" => RasterDataType::UInt16,
            "Int16" => RasterDataType::Int16,
            "UInt32" => RasterDataType::UInt32,
            "Int32" => RasterDataType::Int32,
            "Float32" => RasterDataType::Float32,
            "Float64" => RasterDataType::Float64,
            _ => bail!("Unknown data type {:?}, expected one of Byte/UInt16/Int16/UInt32/Int32/Float32/Float64", s),
        };
        Ok(t)
    }
}
