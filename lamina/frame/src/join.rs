// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! A naive single-pass hash join: build a key map over the right side,
//! probe with the left.

use crate::frame::DataFrame;
use ahash::RandomState;
use hashbrown::HashMap;
use lamina_common::error::Result;
use lamina_common::operator::JoinType;
use lamina_common::plan_err;
use lamina_common::schema::JOIN_RIGHT_SUFFIX;

impl DataFrame {
    /// Join with `right` on equality of the paired key columns.
    ///
    /// Output columns are the left columns followed by the right ones;
    /// a right-hand name already present on the left is suffixed with
    /// `_right`. `Semi` and `Anti` keep left columns only.
    pub fn join(
        &self,
        right: &DataFrame,
        left_on: &[impl AsRef<str>],
        right_on: &[impl AsRef<str>],
        how: JoinType,
    ) -> Result<DataFrame> {
        if left_on.len() != right_on.len() || left_on.is_empty() {
            return plan_err!(
                "join requires the same non-zero number of keys on both sides, got {} and {}",
                left_on.len(),
                right_on.len()
            );
        }

        let build = key_map(right, right_on)?;
        let probe_keys = render_keys(self, left_on)?;

        // row index pairs of the joined output; None stands for a null row
        let mut left_rows: Vec<Option<usize>> = vec![];
        let mut right_rows: Vec<Option<usize>> = vec![];
        let mut right_matched = vec![false; right.height()];

        for (l, key) in probe_keys.iter().enumerate() {
            match build.get(key) {
                Some(matches) => match how {
                    JoinType::Anti => {}
                    JoinType::Semi => {
                        left_rows.push(Some(l));
                        right_rows.push(None);
                    }
                    _ => {
                        for &r in matches {
                            right_matched[r] = true;
                            left_rows.push(Some(l));
                            right_rows.push(Some(r));
                        }
                    }
                },
                None => match how {
                    JoinType::Left | JoinType::Full => {
                        left_rows.push(Some(l));
                        right_rows.push(None);
                    }
                    JoinType::Anti => {
                        left_rows.push(Some(l));
                        right_rows.push(None);
                    }
                    _ => {}
                },
            }
        }

        if matches!(how, JoinType::Right | JoinType::Full) {
            for (r, matched) in right_matched.iter().enumerate() {
                if !matched {
                    left_rows.push(None);
                    right_rows.push(Some(r));
                }
            }
        }

        let mut columns = Vec::with_capacity(self.width() + right.width());
        for series in self.columns() {
            columns.push(series.take_opt(&left_rows));
        }
        if !matches!(how, JoinType::Semi | JoinType::Anti) {
            let left_schema = self.schema();
            for series in right.columns() {
                let mut out = series.take_opt(&right_rows);
                if left_schema.contains(series.name()) {
                    let renamed = format!("{}{}", series.name(), JOIN_RIGHT_SUFFIX);
                    out.rename(renamed);
                }
                columns.push(out);
            }
        }
        DataFrame::new(columns)
    }
}

fn key_map(
    df: &DataFrame,
    keys: &[impl AsRef<str>],
) -> Result<HashMap<String, Vec<usize>, RandomState>> {
    let rendered = render_keys(df, keys)?;
    let mut map: HashMap<String, Vec<usize>, RandomState> = HashMap::default();
    for (row, key) in rendered.into_iter().enumerate() {
        map.entry(key).or_default().push(row);
    }
    Ok(map)
}

fn render_keys(df: &DataFrame, keys: &[impl AsRef<str>]) -> Result<Vec<String>> {
    let columns = keys
        .iter()
        .map(|k| df.column(k.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok((0..df.height())
        .map(|row| {
            let mut key = String::new();
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    key.push('\0');
                }
                key.push_str(&column.str_key(row));
            }
            key
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Series;
    use lamina_common::scalar::ScalarValue;

    fn left() -> DataFrame {
        DataFrame::new(vec![
            Series::new_i64("id", vec![1, 2, 3]),
            Series::new_utf8("name", vec!["ann", "bob", "cid"]),
        ])
        .unwrap()
    }

    fn right() -> DataFrame {
        DataFrame::new(vec![
            Series::new_i64("id", vec![2, 3, 4]),
            Series::new_i64("score", vec![20, 30, 40]),
        ])
        .unwrap()
    }

    #[test]
    fn inner_join_suffixes_collisions() {
        let out = left().join(&right(), &["id"], &["id"], JoinType::Inner).unwrap();
        assert_eq!(out.column_names(), vec!["id", "name", "id_right", "score"]);
        assert_eq!(out.height(), 2);
        assert_eq!(out.column("score").unwrap().get(0), ScalarValue::Int64(20));
    }

    #[test]
    fn left_join_pads_with_nulls() {
        let out = left().join(&right(), &["id"], &["id"], JoinType::Left).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(out.column("score").unwrap().get(0), ScalarValue::Null);
    }

    #[test]
    fn full_join_appends_unmatched_right_rows() {
        let out = left().join(&right(), &["id"], &["id"], JoinType::Full).unwrap();
        assert_eq!(out.height(), 4);
        assert_eq!(out.column("name").unwrap().get(3), ScalarValue::Null);
        assert_eq!(out.column("score").unwrap().get(3), ScalarValue::Int64(40));
    }

    #[test]
    fn semi_and_anti_keep_left_columns_only() {
        let semi = left().join(&right(), &["id"], &["id"], JoinType::Semi).unwrap();
        assert_eq!(semi.column_names(), vec!["id", "name"]);
        assert_eq!(semi.height(), 2);

        let anti = left().join(&right(), &["id"], &["id"], JoinType::Anti).unwrap();
        assert_eq!(anti.height(), 1);
        assert_eq!(anti.column("id").unwrap().get(0), ScalarValue::Int64(1));
    }
}
