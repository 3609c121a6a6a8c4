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
use std::collections::BTreeMap;

use ndarray::Array2;
use num::ToPrimitive;

/// Pixel count per value, like numpy.unique with return_counts.
///
/// Values are truncated to integers; NaN and values out of the i64 range are skipped.
pub fn value_counts<T: Copy + ToPrimitive>(values: &Array2<T>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for v in values.iter() {
        if let Some(k) = v.to_i64() {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

/// Same as [`value_counts`] but leaves out cells equal to `no_data_value`
pub fn value_counts_except_no_data<T: Copy + ToPrimitive>(values: &Array2<T>, no_data_value: Option<f64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for v in values.iter() {
        if let (Some(nd), Some(f)) = (no_data_value, v.to_f64()) {
            if f == nd {
                continue;
            }
        }
        if let Some(k) = v.to_i64() {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}
