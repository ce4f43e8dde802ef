//! In-memory calendar extraction

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::{Error, Result};
use crate::event_set::{EventSet, FeatureArray, IndexData};
use crate::graph::Operator;
use crate::implementation::{input, EventSets, OperatorImplementation};
use crate::operators::{CalendarUnit, OperatorKind};

/// Convert unix seconds to a UTC date time
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_datetime(timestamp: f64) -> Result<DateTime<Utc>> {
    if !timestamp.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "Timestamp {timestamp} cannot be converted to a date"
        )));
    }
    let seconds = timestamp.floor();
    let nanos = ((timestamp - seconds) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(seconds as i64, nanos).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "Timestamp {timestamp} is out of the supported date range"
        ))
    })
}

/// Extract `unit` from a unix-seconds timestamp, in UTC
#[allow(clippy::cast_possible_wrap)]
pub fn calendar_value(unit: CalendarUnit, timestamp: f64) -> Result<i32> {
    let datetime = to_datetime(timestamp)?;
    let value = match unit {
        CalendarUnit::Year => datetime.year(),
        CalendarUnit::Month => datetime.month() as i32,
        CalendarUnit::DayOfMonth => datetime.day() as i32,
        CalendarUnit::DayOfWeek => datetime.weekday().num_days_from_monday() as i32,
        CalendarUnit::DayOfYear => datetime.ordinal() as i32,
        CalendarUnit::Hour => datetime.hour() as i32,
        CalendarUnit::Minute => datetime.minute() as i32,
        CalendarUnit::Second => datetime.second() as i32,
    };
    Ok(value)
}

/// In-memory calendar operators
#[derive(Debug, Default)]
pub struct CalendarImplementation;

impl OperatorImplementation for CalendarImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let OperatorKind::Calendar(unit) = *operator.kind() else {
            return Err(Error::contract(operator.key(), "not a calendar operator"));
        };
        let sampling = input(operator, inputs, "sampling")?;
        let mut output = EventSet::new(operator.output_schema("output")?.clone());

        for (key, data) in sampling.iter() {
            let values = data
                .timestamps
                .iter()
                .map(|t| calendar_value(unit, *t))
                .collect::<Result<Arc<[i32]>>>()?;
            output.set_index_value(
                key.clone(),
                IndexData::new(data.timestamps.clone(), vec![FeatureArray::Int32(values)]),
            );
        }
        Ok(BTreeMap::from([("output".to_string(), output)]))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::config::EvaluationConfig;
    use crate::event_set::event_set;
    use crate::graph::EventSetNode;
    use crate::implementation::call;
    use crate::operators;

    // 2021-03-14 15:09:26.5 UTC, a Sunday
    const PI_DAY: f64 = 1_615_734_566.5;

    #[test_case(CalendarUnit::Year, 2021)]
    #[test_case(CalendarUnit::Month, 3)]
    #[test_case(CalendarUnit::DayOfMonth, 14)]
    #[test_case(CalendarUnit::DayOfWeek, 6)]
    #[test_case(CalendarUnit::DayOfYear, 73)]
    #[test_case(CalendarUnit::Hour, 15)]
    #[test_case(CalendarUnit::Minute, 9)]
    #[test_case(CalendarUnit::Second, 26)]
    fn test_calendar_value(unit: CalendarUnit, expected: i32) {
        assert_eq!(calendar_value(unit, PI_DAY).unwrap(), expected);
    }

    #[test]
    fn test_epoch_and_negative() {
        assert_eq!(calendar_value(CalendarUnit::Year, 0.0).unwrap(), 1970);
        assert_eq!(calendar_value(CalendarUnit::Year, -1.0).unwrap(), 1969);
        assert!(calendar_value(CalendarUnit::Year, f64::INFINITY).is_err());
    }

    #[test]
    fn test_calendar_month_shares_sampling() {
        let evset = event_set(
            vec![0.0, PI_DAY],
            vec![("x", FeatureArray::from(vec!["a", "b"]))],
            &[],
        )
        .unwrap();
        let source = EventSetNode::source((**evset.schema()).clone());
        let node = operators::calendar_month(&source).unwrap();
        let inputs = BTreeMap::from([("sampling".to_string(), evset)]);

        let out = call(
            &CalendarImplementation,
            &node.creator().unwrap().operator,
            &inputs,
            &EvaluationConfig::debug(),
        )
        .unwrap();
        let output = &out["output"];
        let data = output.get(output.arbitrary_index_key().unwrap()).unwrap();
        assert_eq!(data.features[0], FeatureArray::from(vec![1_i32, 3]));
    }
}
