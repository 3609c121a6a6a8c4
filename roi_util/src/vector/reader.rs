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
use std::path::Path;

use anyhow::{bail, Context, Result};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, LayerAccess};
use gdal::Dataset;
use geo::{Geometry, MultiPolygon};
use log::{debug, info, warn};

use crate::io::InputOgrLayer;
use crate::raster::PolygonFeature;

/// Polygons read from one OGR layer, in layer order
pub struct VectorSource {
    pub layer_name: String,
    /// WKT of the layer's spatial reference
    pub projection: Option<String>,
    pub features: Vec<PolygonFeature>,
    /// Features without a polygon geometry
    pub skipped: usize,
}

/// Reads every polygon of the layer along with its class.
///
/// The class is `burn_field` when given, else the feature id.
pub fn read_polygon_features(input: &InputOgrLayer, burn_field: Option<&str>) -> Result<VectorSource> {
    debug!("Reading polygons from {}", input);

    let mut dataset = Dataset::open(Path::new(&input.ogr_conn_str))
        .with_context(|| format!("Unable to open {}", &input.ogr_conn_str))?;

    let mut layer = if input.layer_name.is_empty() {
        let layer_count = dataset.layer_count();
        if layer_count != 1 {
            bail!("{} has {} layers, a layer name is required", &input.ogr_conn_str, layer_count);
        }
        dataset.layer(0)?
    } else {
        dataset.layer_by_name(&input.layer_name)
            .with_context(|| format!("No layer {} in {}", &input.layer_name, &input.ogr_conn_str))?
    };

    if let Some(af) = input.attribute_filter.as_ref() {
        layer.set_attribute_filter(af)
            .with_context(|| format!("Invalid attribute filter {}", af))?;
    }

    let layer_name = layer.name();
    let projection = match layer.spatial_ref() {
        Some(srs) => Some(srs.to_wkt()?),
        None => None,
    };

    let mut features = Vec::new();
    let mut skipped = 0;

    for (feature_index, feature) in layer.features().enumerate() {
        let geometry = match feature.geometry() {
            Some(g) => g,
            None => {
                warn!("Feature {} of {} has no geometry, skipping", feature_index, layer_name);
                skipped += 1;
                continue;
            }
        };

        let geometry: MultiPolygon<f64> = match geometry.to_geo()? {
            Geometry::Polygon(p) => p.into(),
            Geometry::MultiPolygon(mp) => mp,
            _ => {
                warn!("Feature {} of {} is a {}, only polygons are burned",
                      feature_index, layer_name, geometry.geometry_name());
                skipped += 1;
                continue;
            }
        };

        let value = match burn_field {
            Some(field_name) => {
                match feature.field(field_name)
                    .with_context(|| format!("No field {} in {}", field_name, layer_name))? {
                    Some(fv) => field_value_to_class(&fv)
                        .with_context(|| format!("Feature {} field {}", feature_index, field_name))?,
                    None => bail!("Feature {} of {} has a null {}", feature_index, layer_name, field_name)
                }
            }
            None => {
                let fid = feature.fid()
                    .with_context(|| format!("Feature {} of {} has no FID", feature_index, layer_name))?;
                i64::try_from(fid)?
            }
        };

        features.push(PolygonFeature::new(geometry, value));
    }

    info!("Read {} polygons from {}, skipped {}", features.len(), layer_name, skipped);

    Ok(VectorSource {
        layer_name,
        projection,
        features,
        skipped,
    })
}

/// Class id held by an attribute.  Reals and strings must hold a whole number.
pub fn field_value_to_class(value: &FieldValue) -> Result<i64> {
    match value {
        FieldValue::IntegerValue(v) => Ok(*v as i64),
        FieldValue::Integer64Value(v) => Ok(*v),
        FieldValue::RealValue(v) => {
            if v.fract() != 0.0 || !v.is_finite() || v.abs() > i64::MAX as f64 {
                bail!("{} is not an integer class", v);
            }
            Ok(*v as i64)
        }
        FieldValue::StringValue(s) => s.trim().parse::<i64>()
            .with_context(|| format!("{:?} is not an integer class", s)),
        _ => bail!("Field value {:?} is not an integer class", value),
    }
}

/// Proj4 text when GDAL can express it, otherwise WKT
pub fn spatial_ref_to_string(srs: &SpatialRef) -> Result<String> {
    match srs.to_proj4() {
        Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Ok(srs.to_wkt()?),
    }
}
