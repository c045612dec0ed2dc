//! Shared helpers for colexpr test binaries.

use std::sync::Once;

use arrow::array::ArrayRef;
use colexpr_column::{Column, DataFrame, NamedColumn};

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let env = std::env::var("RUST_LOG").ok();
        let filter = match env {
            Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            None => EnvFilter::new("info"),
        };
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// Build a [`DataFrame`] from `(name, array)` pairs, panicking on length mismatch.
pub fn frame(columns: Vec<(&str, ArrayRef)>) -> DataFrame {
    let named = columns
        .into_iter()
        .map(|(name, array)| NamedColumn::new(name, Column::new(array)))
        .collect();
    DataFrame::new(named).expect("test frame columns must share a length")
}

#[cfg(feature = "auto-init")]
mod auto {
    // Use ctor to run at binary init time to avoid having to call init in every test.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}
