//! Lag operator

use crate::error::{Error, Result};
use crate::graph::{Attribute, EventSetNode, Operator, OutputSampling};
use crate::operators::OperatorKind;
use crate::schema::Schema;

/// Shift every timestamp forward by `duration` seconds.
///
/// The output keeps the input schema but gets a new sampling.
pub fn lag(input: &EventSetNode, duration: f64) -> Result<EventSetNode> {
    if !duration.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "Lag duration should be a finite number of seconds, got {duration}"
        )));
    }

    let schema =
        Schema::new(input.schema().indexes().to_vec(), input.schema().features().to_vec())?;
    let operator = Operator::builder(OperatorKind::Lag)
        .input("input", input)
        .attribute("duration", Attribute::Float64(duration))
        .output("output", schema, OutputSampling::New)?
        .build()?;
    operator.output("output")
}
