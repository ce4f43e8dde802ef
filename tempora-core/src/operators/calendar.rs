//! Calendar operators

use crate::dtype::DType;
use crate::error::Result;
use crate::graph::{EventSetNode, Operator, OutputSampling};
use crate::operators::{CalendarUnit, OperatorKind};
use crate::schema::{Field, Schema};

/// Extract a calendar component from the timestamps of `sampling`.
///
/// Features of the input are ignored. The output keeps the input sampling and
/// has a single int32 feature named after the unit, e.g. `calendar_month`.
pub fn calendar(unit: CalendarUnit, sampling: &EventSetNode) -> Result<EventSetNode> {
    let schema = Schema::new(
        sampling.schema().indexes().to_vec(),
        vec![Field::new(unit.output_feature_name(), DType::Int32)],
    )?;
    let operator = Operator::builder(OperatorKind::Calendar(unit))
        .input("sampling", sampling)
        .output("output", schema, OutputSampling::SameAs("sampling"))?
        .build()?;
    operator.output("output")
}

/// Year of each timestamp
pub fn calendar_year(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::Year, sampling)
}

/// Month of each timestamp, 1 to 12
pub fn calendar_month(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::Month, sampling)
}

/// Day of the month of each timestamp, 1 to 31
pub fn calendar_day_of_month(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::DayOfMonth, sampling)
}

/// Day of the week of each timestamp, 0 (Monday) to 6 (Sunday)
pub fn calendar_day_of_week(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::DayOfWeek, sampling)
}

/// Day of the year of each timestamp, 1 to 366
pub fn calendar_day_of_year(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::DayOfYear, sampling)
}

/// Hour of each timestamp, 0 to 23
pub fn calendar_hour(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::Hour, sampling)
}

/// Minute of each timestamp, 0 to 59
pub fn calendar_minute(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::Minute, sampling)
}

/// Second of each timestamp, 0 to 59
pub fn calendar_second(sampling: &EventSetNode) -> Result<EventSetNode> {
    calendar(CalendarUnit::Second, sampling)
}
