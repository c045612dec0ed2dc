use std::fmt;

use colexpr_column::{DataFrame, NamedColumn};
use colexpr_result::Result;

use crate::collect::AggInfo;
use crate::context::ExecutionContext;
use crate::eval::ExprMapping;
use crate::expr::ExprRef;

/// An expression paired with the name of the column it produces.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NamedExpr {
    pub name: String,
    pub value: ExprRef,
}

impl NamedExpr {
    pub fn new(name: impl Into<String>, value: ExprRef) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn evaluate(
        &self,
        df: &DataFrame,
        context: ExecutionContext,
        mapping: Option<&ExprMapping>,
    ) -> Result<NamedColumn> {
        let column = self.value.evaluate(df, context, mapping)?;
        Ok(NamedColumn::new(self.name.clone(), column))
    }

    pub fn collect_agg(&self, depth: usize) -> Result<AggInfo> {
        self.value.collect_agg(depth)
    }
}

impl fmt::Debug for NamedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedExpr({}, {})", self.name, self.value.repr())
    }
}

impl fmt::Display for NamedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
