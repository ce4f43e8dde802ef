//! Timestamps operator

use crate::dtype::DType;
use crate::error::Result;
use crate::graph::{EventSetNode, Operator, OutputSampling};
use crate::operators::OperatorKind;
use crate::schema::{Field, Schema};

/// Name of the single output feature of [`timestamps`]
pub const TIMESTAMPS_FEATURE: &str = "timestamps";

/// Expose the timestamps of `input` as a float64 feature named `timestamps`.
///
/// Features of the input are dropped. The output keeps the input sampling.
pub fn timestamps(input: &EventSetNode) -> Result<EventSetNode> {
    let schema = Schema::new(
        input.schema().indexes().to_vec(),
        vec![Field::new(TIMESTAMPS_FEATURE, DType::Float64)],
    )?;
    let operator = Operator::builder(OperatorKind::Timestamps)
        .input("input", input)
        .output("output", schema, OutputSampling::SameAs("input"))?
        .build()?;
    operator.output("output")
}
