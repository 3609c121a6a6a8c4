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
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use gdal::vector::{geometry_type_to_name, Layer, LayerAccess, OGRFieldType};
use gdal::Dataset;

use crate::raster::Extent;
use crate::vector::spatial_ref_to_string;

pub struct FieldSummary {
    pub name: String,
    pub field_type: String,
}

/// What a layer holds, printed by the inspect command before choosing a burn field
pub struct LayerSummary {
    pub name: String,
    pub feature_count: u64,
    pub geometry_type: String,
    pub fields: Vec<FieldSummary>,
    pub extent: Option<Extent>,
    pub projection: Option<String>,
}

impl fmt::Display for LayerSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Layer: {}", self.name)?;
        writeln!(f, "Geometry: {}", self.geometry_type)?;
        writeln!(f, "Feature count: {}", self.feature_count)?;
        match self.extent.as_ref() {
            Some(e) => writeln!(f, "Extent: {}", e)?,
            None => writeln!(f, "Extent: unknown")?,
        }
        writeln!(f, "Projection: {}", self.projection.as_deref().unwrap_or("none"))?;
        writeln!(f, "Fields:")?;
        for field in self.fields.iter() {
            writeln!(f, "  {}: {}", field.name, field.field_type)?;
        }
        Ok(())
    }
}

fn field_type_name(field_type: OGRFieldType::Type) -> &'static str {
    match field_type {
        OGRFieldType::OFTInteger => "Integer",
        OGRFieldType::OFTInteger64 => "Integer64",
        OGRFieldType::OFTReal => "Real",
        OGRFieldType::OFTString => "String",
        OGRFieldType::OFTDate => "Date",
        OGRFieldType::OFTTime => "Time",
        OGRFieldType::OFTDateTime => "DateTime",
        OGRFieldType::OFTBinary => "Binary",
        OGRFieldType::OFTIntegerList => "IntegerList",
        OGRFieldType::OFTInteger64List => "Integer64List",
        OGRFieldType::OFTRealList => "RealList",
        OGRFieldType::OFTStringList => "StringList",
        _ => "Unknown",
    }
}

fn summarize_layer(layer: &Layer) -> Result<LayerSummary> {
    let defn = layer.defn();

    let fields = defn.fields()
        .map(|field| FieldSummary {
            name: field.name(),
            field_type: field_type_name(field.field_type()).to_string(),
        })
        .collect();

    let geometry_type = defn.geom_fields()
        .map(|gf| geometry_type_to_name(gf.field_type()))
        .next()
        .unwrap_or_else(|| "None".to_string());

    //some drivers can't compute an extent without a geometry column
    let extent = layer.get_extent().ok()
        .map(|e| Extent::new(e.MinX, e.MinY, e.MaxX, e.MaxY));

    let projection = match layer.spatial_ref() {
        Some(srs) => Some(spatial_ref_to_string(&srs)?),
        None => None,
    };

    Ok(LayerSummary {
        name: layer.name(),
        feature_count: layer.feature_count(),
        geometry_type,
        fields,
        extent,
        projection,
    })
}

pub fn describe_dataset(path: &Path) -> Result<Vec<LayerSummary>> {
    if !path.exists() {
        bail!("{:?} does not exist", path);
    }
    let dataset = Dataset::open(path).with_context(|| format!("Unable to open {:?}", path))?;

    let mut summaries = Vec::new();
    for layer in dataset.layers() {
        summaries.push(summarize_layer(&layer)?);
    }

    Ok(summaries)
}
