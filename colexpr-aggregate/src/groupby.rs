use arrow::array::{Array, ArrayRef, UInt32Array, new_empty_array, new_null_array};
use arrow::compute::{concat, take};
use arrow::datatypes::DataType;
use colexpr_column::{Column, DataFrame, NamedColumn};
use colexpr_compute::distinct::group_representatives;
use colexpr_compute::{broadcast, cast_to, group_rows, reduce};
use colexpr_expr::{AggRequest, ExecutionContext, ExprMapping, ExprRef, NamedExpr};
use colexpr_result::{Error, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupByOptions {
    /// Emit groups in order of first appearance instead of key order.
    pub maintain_order: bool,
}

/// A grouped aggregation over a frame.
#[derive(Debug, Clone)]
pub struct GroupBy {
    keys: Vec<NamedExpr>,
    aggs: Vec<NamedExpr>,
    options: GroupByOptions,
    requests: Vec<AggRequest>,
}

impl GroupBy {
    /// Plan the aggregation. Fails with `Unsupported` when any output
    /// expression has no per-group decomposition.
    pub fn try_new(
        keys: Vec<NamedExpr>,
        aggs: Vec<NamedExpr>,
        options: GroupByOptions,
    ) -> Result<Self> {
        let mut requests = Vec::new();
        for agg in &aggs {
            requests.extend(agg.collect_agg(0)?.requests);
        }
        tracing::debug!(
            keys = keys.len(),
            aggs = aggs.len(),
            requests = requests.len(),
            "planned groupby"
        );
        Ok(Self {
            keys,
            aggs,
            options,
            requests,
        })
    }

    pub fn keys(&self) -> &[NamedExpr] {
        &self.keys
    }

    pub fn aggs(&self) -> &[NamedExpr] {
        &self.aggs
    }

    pub fn requests(&self) -> &[AggRequest] {
        &self.requests
    }

    /// Run the aggregation; the output holds one row per group, keys first.
    pub fn evaluate(&self, df: &DataFrame) -> Result<DataFrame> {
        let key_columns = self
            .keys
            .iter()
            .map(|key| key.evaluate(df, ExecutionContext::Frame, None))
            .collect::<Result<Vec<_>>>()?;
        let key_arrays: Vec<ArrayRef> = key_columns
            .iter()
            .map(|c| broadcast(c.array(), df.num_rows()))
            .collect::<Result<_>>()?;
        let groups = if key_arrays.is_empty() {
            vec![(0..df.num_rows() as u32).collect()]
        } else {
            group_rows(&key_arrays, !self.options.maintain_order)?
        };
        let num_groups = groups.len();
        tracing::debug!(rows = df.num_rows(), groups = num_groups, "grouped rows");

        let mut evaluated: FxHashMap<ExprRef, ArrayRef> = FxHashMap::default();
        for request in &self.requests {
            if let Some(expr) = &request.pre_eval
                && !evaluated.contains_key(expr)
            {
                let column = expr.evaluate(df, ExecutionContext::Frame, None)?;
                evaluated.insert(expr.clone(), broadcast(column.array(), df.num_rows())?);
            }
        }

        tracing::debug!(
            requests = self.requests.len(),
            distinct_inputs = evaluated.len(),
            "evaluated groupby inputs"
        );

        let mut mapping = ExprMapping::default();
        let mut raw = Vec::with_capacity(self.requests.len());
        for (i, request) in self.requests.iter().enumerate() {
            let values = match &request.pre_eval {
                Some(expr) => Some(evaluated.get(expr).ok_or_else(|| {
                    Error::internal(format!("pre-evaluated input {expr} missing"))
                })?),
                None => None,
            };
            let result = reduce_groups(values, &groups, request)?;
            let column = Column::new(result);
            raw.push(NamedColumn::new(format!("__request_{i}"), column.clone()));
            mapping.insert(request.owner.clone(), column);
        }
        let raw = if raw.is_empty() {
            DataFrame::new(vec![NamedColumn::new(
                "__groups",
                Column::new(new_null_array(&DataType::Null, num_groups)),
            )])?
        } else {
            DataFrame::new(raw)?
        };

        let representatives = group_representatives(&groups);
        let representatives = representatives
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| Error::internal("group representatives must be UInt32"))?;
        let mut output = Vec::with_capacity(self.keys.len() + self.aggs.len());
        for (key, array) in self.keys.iter().zip(&key_arrays) {
            let gathered = take(array.as_ref(), representatives, None)?;
            output.push(NamedColumn::new(key.name.clone(), Column::new(gathered)));
        }
        for agg in &self.aggs {
            let column = agg
                .value
                .evaluate(&raw, ExecutionContext::GroupBy, Some(&mapping))?;
            let column = if column.len() == num_groups {
                column
            } else {
                Column::new(broadcast(column.array(), num_groups)?)
            };
            output.push(NamedColumn::new(agg.name.clone(), column));
        }
        DataFrame::new(output)
    }
}

/// Apply one request to every group and stack the per-group results.
fn reduce_groups(
    values: Option<&ArrayRef>,
    groups: &[Vec<u32>],
    request: &AggRequest,
) -> Result<ArrayRef> {
    let mut parts = Vec::with_capacity(groups.len());
    for rows in groups {
        let part = match values {
            Some(values) => {
                let indices = UInt32Array::from(rows.clone());
                take(values.as_ref(), &indices, None)?
            }
            None => new_null_array(&DataType::Null, rows.len()),
        };
        parts.push(reduce(&part, &request.request)?);
    }
    let result = if parts.is_empty() {
        let dtype = values.map_or(DataType::Null, |v| v.data_type().clone());
        new_empty_array(&dtype)
    } else {
        let refs: Vec<&dyn Array> = parts.iter().map(|p| p.as_ref()).collect();
        concat(&refs)?
    };
    if request.request.is_collect_list() {
        Ok(result)
    } else {
        cast_to(&result, request.owner.dtype())
    }
}
