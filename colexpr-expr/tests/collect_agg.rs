use arrow::datatypes::DataType;
use colexpr_compute::{BinaryOperator, GroupAggregation, MathOp};
use colexpr_expr::{AggFunction, Expr, ExprKind, ExprRef, UnaryFunction};

fn col(name: &str) -> ExprRef {
    colexpr_test_utils::init_tracing_for_tests();
    Expr::col(DataType::Int64, name)
}

fn agg(function: AggFunction, child: ExprRef) -> ExprRef {
    Expr::agg(child.dtype().clone(), function, vec![child]).unwrap()
}

fn add(left: ExprRef, right: ExprRef) -> ExprRef {
    Expr::binop(left.dtype().clone(), BinaryOperator::Add, left, right).unwrap()
}

#[test]
fn bare_column_collects_its_values() {
    let a = col("a");
    let info = a.collect_agg(0).unwrap();
    assert_eq!(info.requests.len(), 1);
    let request = &info.requests[0];
    assert_eq!(request.request, GroupAggregation::CollectList);
    assert_eq!(request.pre_eval.as_ref(), Some(&a));
    assert_eq!(request.owner, a);
}

#[test]
fn aggregation_over_column_is_one_request() {
    let sum = agg(AggFunction::Sum, col("a"));
    let info = sum.collect_agg(0).unwrap();
    assert_eq!(info.requests.len(), 1);
    assert_eq!(info.requests[0].request, GroupAggregation::Sum);
    assert_eq!(info.requests[0].pre_eval.as_ref(), Some(&col("a")));
    assert_eq!(info.requests[0].owner, sum);
}

#[test]
fn binop_of_aggregations_keeps_both_requests() {
    let sum = agg(AggFunction::Sum, col("a"));
    let max = agg(
        AggFunction::Max {
            propagate_nans: false,
        },
        col("b"),
    );
    let info = add(sum.clone(), max.clone()).collect_agg(0).unwrap();
    let owners: Vec<_> = info.requests.iter().map(|r| r.owner.clone()).collect();
    assert_eq!(owners, vec![sum, max]);
}

#[test]
fn binop_of_columns_collapses_to_one_list() {
    let expr = add(col("a"), col("b"));
    let info = expr.collect_agg(0).unwrap();
    assert_eq!(info.requests.len(), 1);
    assert!(info.requests[0].request.is_collect_list());
    assert_eq!(info.requests[0].owner, expr);
}

#[test]
fn aggregation_of_expression_pre_evaluates_it() {
    let inner = add(col("a"), col("b"));
    let sum = agg(AggFunction::Sum, inner.clone());
    let info = sum.collect_agg(0).unwrap();
    assert_eq!(info.requests.len(), 1);
    assert_eq!(info.requests[0].pre_eval.as_ref(), Some(&inner));
}

#[test]
fn len_counts_group_rows() {
    let len = Expr::len(DataType::UInt32);
    let info = len.collect_agg(0).unwrap();
    assert!(info.requests[0].pre_eval.is_none());
    assert_eq!(
        info.requests[0].request,
        GroupAggregation::Count {
            include_nulls: true
        }
    );
}

#[test]
fn literals_need_no_requests() {
    let one = Expr::literal(DataType::Int64, 1i64).unwrap();
    assert!(one.collect_agg(0).unwrap().requests.is_empty());
}

#[test]
fn nested_aggregations_are_rejected() {
    let nested = agg(AggFunction::Sum, agg(AggFunction::Sum, col("a")));
    let err = nested.collect_agg(0).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn nan_propagating_extrema_are_rejected() {
    let x = Expr::col(DataType::Float64, "x");
    let max = agg(
        AggFunction::Max {
            propagate_nans: true,
        },
        x,
    );
    assert!(max.collect_agg(0).unwrap_err().is_unsupported());
}

#[test]
fn float_extrema_mask_nans_first() {
    let x = Expr::col(DataType::Float64, "x");
    let min = agg(
        AggFunction::Min {
            propagate_nans: false,
        },
        x.clone(),
    );
    let info = min.collect_agg(0).unwrap();
    let pre_eval = info.requests[0].pre_eval.clone().unwrap();
    assert!(matches!(
        pre_eval.kind(),
        ExprKind::UnaryFunction(UnaryFunction::MaskNans)
    ));
    assert_eq!(pre_eval.children()[0], x);
}

#[test]
fn extrema_mask_nans_by_input_type() {
    let x = Expr::col(DataType::Float64, "x");
    let min = Expr::agg(
        DataType::Int64,
        AggFunction::Min {
            propagate_nans: false,
        },
        vec![x.clone()],
    )
    .unwrap();
    let pre_eval = min.collect_agg(0).unwrap().requests[0]
        .pre_eval
        .clone()
        .unwrap();
    assert!(matches!(
        pre_eval.kind(),
        ExprKind::UnaryFunction(UnaryFunction::MaskNans)
    ));
    assert_eq!(pre_eval.children()[0], x);

    let max = Expr::agg(
        DataType::Float64,
        AggFunction::Max {
            propagate_nans: false,
        },
        vec![col("a")],
    )
    .unwrap();
    let info = max.collect_agg(0).unwrap();
    assert_eq!(info.requests[0].pre_eval.as_ref(), Some(&col("a")));
}

#[test]
fn row_count_changing_functions_are_rejected() {
    let unique = Expr::unary_function(
        DataType::Int64,
        UnaryFunction::Unique {
            maintain_order: true,
        },
        vec![col("a")],
    )
    .unwrap();
    assert!(unique.collect_agg(0).unwrap_err().is_unsupported());
}

#[test]
fn unary_function_inside_aggregation_is_pre_evaluated() {
    let abs = Expr::unary_function(
        DataType::Int64,
        UnaryFunction::Math(MathOp::Abs),
        vec![col("a")],
    )
    .unwrap();
    let sum = agg(AggFunction::Sum, abs.clone());
    let info = sum.collect_agg(0).unwrap();
    assert_eq!(info.requests[0].pre_eval.as_ref(), Some(&abs));
}

#[test]
fn sort_is_not_supported_under_groupby() {
    let sorted = Expr::sort(DataType::Int64, Default::default(), col("a")).unwrap();
    assert!(sorted.collect_agg(0).unwrap_err().is_unsupported());
}
