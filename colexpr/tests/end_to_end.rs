use std::sync::Arc;

use arrow::array::{
    ArrayRef, AsArray, Date32Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Int32Type, Int64Type, Schema, TimeUnit};
use colexpr::{
    AggFunction, BinaryOperator, BooleanFunction, ClosedInterval, DataFrame, ExecutionContext,
    Expr, ExprRef, GroupBy, GroupByOptions, NamedExpr, SortByOptions, StringFunction,
    TemporalFunction,
};

fn frame() -> DataFrame {
    colexpr_test_utils::init_tracing_for_tests();
    let schema = Arc::new(Schema::new(vec![
        Field::new("city", DataType::Utf8, true),
        Field::new("amount", DataType::Int64, true),
        Field::new("day", DataType::Date32, true),
    ]));
    // 2024-01-01 is day 19723 since the epoch.
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![
                Some("oslo"),
                Some("lima"),
                Some("oslo"),
                None,
                Some("lima"),
            ])) as ArrayRef,
            Arc::new(Int64Array::from(vec![Some(5), Some(20), None, Some(7), Some(1)])),
            Arc::new(Date32Array::from(vec![19723, 19754, 19783, 19723, 19724])),
        ],
    )
    .unwrap();
    DataFrame::from_record_batch(&batch).unwrap()
}

fn amount() -> ExprRef {
    Expr::col(DataType::Int64, "amount")
}

fn lit(value: i64) -> ExprRef {
    Expr::literal(DataType::Int64, value).unwrap()
}

#[test]
fn filter_by_range_then_sort_by_another_column() {
    let df = frame();
    let in_range = Expr::boolean_function(
        DataType::Boolean,
        BooleanFunction::IsBetween {
            closed: ClosedInterval::Both,
        },
        vec![amount(), lit(1), lit(7)],
    )
    .unwrap();
    let cities = Expr::filter(
        DataType::Utf8,
        Expr::col(DataType::Utf8, "city"),
        in_range.clone(),
    )
    .unwrap();
    let amounts = Expr::filter(DataType::Int64, amount(), in_range).unwrap();
    let ordered = Expr::sort_by(
        DataType::Utf8,
        SortByOptions {
            stable: true,
            nulls_last: vec![false],
            descending: vec![false],
        },
        cities,
        vec![amounts],
    )
    .unwrap();
    let out = ordered.evaluate(&df, ExecutionContext::Frame, None).unwrap();
    let values: Vec<_> = out.array().as_string::<i32>().iter().collect();
    assert_eq!(values, vec![Some("lima"), Some("oslo"), None]);
}

#[test]
fn month_of_date_column() {
    let df = frame();
    let month = Expr::temporal_function(
        DataType::Int32,
        TemporalFunction::Month,
        Expr::col(DataType::Date32, "day"),
    )
    .unwrap();
    let out = month.evaluate(&df, ExecutionContext::Frame, None).unwrap();
    let values: Vec<_> = out.array().as_primitive::<Int32Type>().values().to_vec();
    assert_eq!(values, vec![1, 2, 3, 1, 1]);
}

#[test]
fn sub_second_components_of_timestamps() {
    let ts: ArrayRef = Arc::new(TimestampMicrosecondArray::from(vec![1_000_123_456i64]));
    let df = DataFrame::new(vec![colexpr::NamedColumn::new(
        "t",
        colexpr::Column::new(ts),
    )])
    .unwrap();
    let t = Expr::col(DataType::Timestamp(TimeUnit::Microsecond, None), "t");
    let eval = |function| {
        Expr::temporal_function(DataType::Int64, function, t.clone())
            .unwrap()
            .evaluate(&df, ExecutionContext::Frame, None)
            .unwrap()
            .array()
            .as_primitive::<Int64Type>()
            .value(0)
    };
    assert_eq!(eval(TemporalFunction::Millisecond), 123);
    assert_eq!(eval(TemporalFunction::Microsecond), 123_456);
    assert_eq!(eval(TemporalFunction::Nanosecond), 123_456_000);
}

#[test]
fn replace_then_group_and_aggregate() {
    let df = frame();
    let renamed = Expr::string_function(
        DataType::Utf8,
        StringFunction::Replace { n: -1, literal: true },
        vec![
            Expr::col(DataType::Utf8, "city"),
            Expr::literal(DataType::Utf8, "o").unwrap(),
            Expr::literal(DataType::Utf8, "0").unwrap(),
        ],
    )
    .unwrap();
    let total = Expr::agg(DataType::Int64, AggFunction::Sum, vec![amount()]).unwrap();
    let scaled = Expr::binop(DataType::Int64, BinaryOperator::Mul, total, lit(10)).unwrap();
    let out = GroupBy::try_new(
        vec![NamedExpr::new("city", renamed)],
        vec![NamedExpr::new("total", scaled)],
        GroupByOptions {
            maintain_order: true,
        },
    )
    .unwrap()
    .evaluate(&df)
    .unwrap();

    let cities: Vec<_> = out
        .column("city")
        .unwrap()
        .array()
        .as_string::<i32>()
        .iter()
        .collect();
    assert_eq!(cities, vec![Some("0sl0"), Some("lima"), None]);
    let totals: Vec<_> = out
        .column("total")
        .unwrap()
        .array()
        .as_primitive::<Int64Type>()
        .iter()
        .collect();
    assert_eq!(totals, vec![Some(50), Some(210), Some(70)]);
}

#[test]
fn unsupported_trees_fail_before_touching_data() {
    let err = Expr::unary_function(
        DataType::Int64,
        colexpr::UnaryFunction::CumProd { reverse: true },
        vec![amount()],
    )
    .unwrap_err();
    assert!(err.is_unsupported());

    let err = Expr::cast(DataType::Date32, Expr::col(DataType::Boolean, "flag")).unwrap_err();
    assert!(err.is_unsupported());
}
