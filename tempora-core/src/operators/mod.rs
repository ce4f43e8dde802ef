//! The operator catalog
//!
//! [`OperatorKind`] is the closed set of operators the engine knows about.
//! Each kind has a registry key and a declarative [`OperatorDef`]; the
//! functions re-exported here build operators and return their output node,
//! deriving output schemas and failing fast on invalid inputs.

mod binary;
mod calendar;
mod join;
mod lag;
mod prefix;
mod set_index;
mod timestamps;
mod unary;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::graph::definition::{AttributeType, OperatorDef};

pub use binary::{
    add, arithmetic, compare, divide, equal, floordiv, greater, greater_equal, less, less_equal,
    modulo, multiply, not_equal, power, subtract,
};
pub use calendar::{
    calendar, calendar_day_of_month, calendar_day_of_week, calendar_day_of_year, calendar_hour,
    calendar_minute, calendar_month, calendar_second, calendar_year,
};
pub use join::{join, LEFT_JOIN};
pub use lag::lag;
pub use prefix::prefix;
pub use set_index::{add_index, set_index};
pub use timestamps::{timestamps, TIMESTAMPS_FEATURE};
pub use unary::{abs, invert, is_nan, log, not_nan, unary};

/// Arithmetic between two event sets, feature by feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    /// `a + b`
    Add,
    /// `a - b`
    Subtract,
    /// `a * b`
    Multiply,
    /// `a / b` on floats
    Divide,
    /// `floor(a / b)`
    FloorDiv,
    /// `a mod b`, with the sign of `b`
    Modulo,
    /// `a ^ b`
    Power,
}

impl ArithmeticOp {
    /// All arithmetic operators
    pub const ALL: [ArithmeticOp; 7] = [
        ArithmeticOp::Add,
        ArithmeticOp::Subtract,
        ArithmeticOp::Multiply,
        ArithmeticOp::Divide,
        ArithmeticOp::FloorDiv,
        ArithmeticOp::Modulo,
        ArithmeticOp::Power,
    ];

    /// Registry key
    pub fn key(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "ADDITION",
            ArithmeticOp::Subtract => "SUBTRACTION",
            ArithmeticOp::Multiply => "MULTIPLICATION",
            ArithmeticOp::Divide => "DIVISION",
            ArithmeticOp::FloorDiv => "FLOORDIV",
            ArithmeticOp::Modulo => "MODULO",
            ArithmeticOp::Power => "POWER",
        }
    }

    /// Prefix of the output feature names
    pub fn prefix(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "sub",
            ArithmeticOp::Multiply => "mult",
            ArithmeticOp::Divide => "div",
            ArithmeticOp::FloorDiv => "floordiv",
            ArithmeticOp::Modulo => "mod",
            ArithmeticOp::Power => "pow",
        }
    }
}

/// Element-wise comparison of two event sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// `a == b`
    Equal,
    /// `a != b`
    NotEqual,
    /// `a > b`
    Greater,
    /// `a >= b`
    GreaterEqual,
    /// `a < b`
    Less,
    /// `a <= b`
    LessEqual,
}

impl ComparisonOp {
    /// All comparison operators
    pub const ALL: [ComparisonOp; 6] = [
        ComparisonOp::Equal,
        ComparisonOp::NotEqual,
        ComparisonOp::Greater,
        ComparisonOp::GreaterEqual,
        ComparisonOp::Less,
        ComparisonOp::LessEqual,
    ];

    /// Registry key
    pub fn key(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "EQUAL",
            ComparisonOp::NotEqual => "NOT_EQUAL",
            ComparisonOp::Greater => "GREATER",
            ComparisonOp::GreaterEqual => "GREATER_EQUAL",
            ComparisonOp::Less => "LESS",
            ComparisonOp::LessEqual => "LESS_EQUAL",
        }
    }

    /// Prefix of the output feature names
    pub fn prefix(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "equal",
            ComparisonOp::NotEqual => "not_equal",
            ComparisonOp::Greater => "greater",
            ComparisonOp::GreaterEqual => "greater_equal",
            ComparisonOp::Less => "less",
            ComparisonOp::LessEqual => "less_equal",
        }
    }
}

/// Calendar component extracted from timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarUnit {
    /// Year, e.g. 2021
    Year,
    /// Month, 1 to 12
    Month,
    /// Day of the month, 1 to 31
    DayOfMonth,
    /// Day of the week, 0 (Monday) to 6 (Sunday)
    DayOfWeek,
    /// Day of the year, 1 to 366
    DayOfYear,
    /// Hour, 0 to 23
    Hour,
    /// Minute, 0 to 59
    Minute,
    /// Second, 0 to 59
    Second,
}

impl CalendarUnit {
    /// All calendar units
    pub const ALL: [CalendarUnit; 8] = [
        CalendarUnit::Year,
        CalendarUnit::Month,
        CalendarUnit::DayOfMonth,
        CalendarUnit::DayOfWeek,
        CalendarUnit::DayOfYear,
        CalendarUnit::Hour,
        CalendarUnit::Minute,
        CalendarUnit::Second,
    ];

    /// Registry key
    pub fn key(self) -> &'static str {
        match self {
            CalendarUnit::Year => "CALENDAR_YEAR",
            CalendarUnit::Month => "CALENDAR_MONTH",
            CalendarUnit::DayOfMonth => "CALENDAR_DAY_OF_MONTH",
            CalendarUnit::DayOfWeek => "CALENDAR_DAY_OF_WEEK",
            CalendarUnit::DayOfYear => "CALENDAR_DAY_OF_YEAR",
            CalendarUnit::Hour => "CALENDAR_HOUR",
            CalendarUnit::Minute => "CALENDAR_MINUTE",
            CalendarUnit::Second => "CALENDAR_SECOND",
        }
    }

    /// Name of the single output feature
    pub fn output_feature_name(self) -> &'static str {
        match self {
            CalendarUnit::Year => "calendar_year",
            CalendarUnit::Month => "calendar_month",
            CalendarUnit::DayOfMonth => "calendar_day_of_month",
            CalendarUnit::DayOfWeek => "calendar_day_of_week",
            CalendarUnit::DayOfYear => "calendar_day_of_year",
            CalendarUnit::Hour => "calendar_hour",
            CalendarUnit::Minute => "calendar_minute",
            CalendarUnit::Second => "calendar_second",
        }
    }
}

/// Feature-wise function of a single event set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Absolute value of numeric features
    Abs,
    /// Natural logarithm of float features
    Log,
    /// Whether each float value is NaN
    IsNan,
    /// Whether each float value is not NaN
    NotNan,
    /// Logical negation of boolean features
    Invert,
}

impl UnaryOp {
    /// All unary operators
    pub const ALL: [UnaryOp; 5] =
        [UnaryOp::Abs, UnaryOp::Log, UnaryOp::IsNan, UnaryOp::NotNan, UnaryOp::Invert];

    /// Registry key
    pub fn key(self) -> &'static str {
        match self {
            UnaryOp::Abs => "ABS",
            UnaryOp::Log => "LOG",
            UnaryOp::IsNan => "IS_NAN",
            UnaryOp::NotNan => "NOT_NAN",
            UnaryOp::Invert => "INVERT",
        }
    }
}

/// How features of the two inputs of a binary operator are paired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    /// The i-th feature of one input with the i-th feature of the other
    #[default]
    PerFeatureIdx,
    /// Features with the same name
    PerFeatureName,
}

impl Resolution {
    /// Attribute value of this resolution
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::PerFeatureIdx => "PER_FEATURE_IDX",
            Resolution::PerFeatureName => "PER_FEATURE_NAME",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PER_FEATURE_IDX" => Ok(Resolution::PerFeatureIdx),
            "PER_FEATURE_NAME" => Ok(Resolution::PerFeatureName),
            other => Err(Error::InvalidArgument(format!("Unknown resolution \"{other}\""))),
        }
    }
}

/// The closed catalog of operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Binary arithmetic
    Arithmetic(ArithmeticOp),
    /// Binary comparison
    Comparison(ComparisonOp),
    /// Calendar extraction from the sampling
    Calendar(CalendarUnit),
    /// Feature renaming
    Prefix,
    /// Unary feature function
    Unary(UnaryOp),
    /// Timestamp shift
    Lag,
    /// Features moved to the end of the index
    AddIndex,
    /// Features moved into the index, appended or replacing it
    SetIndex,
    /// Left join of two event sets on timestamps
    Join,
    /// Timestamps as a feature
    Timestamps,
}

impl OperatorKind {
    /// Every kind of the catalog
    pub fn all() -> Vec<OperatorKind> {
        let mut kinds = Vec::new();
        kinds.extend(ArithmeticOp::ALL.into_iter().map(OperatorKind::Arithmetic));
        kinds.extend(ComparisonOp::ALL.into_iter().map(OperatorKind::Comparison));
        kinds.extend(CalendarUnit::ALL.into_iter().map(OperatorKind::Calendar));
        kinds.push(OperatorKind::Prefix);
        kinds.extend(UnaryOp::ALL.into_iter().map(OperatorKind::Unary));
        kinds.push(OperatorKind::Lag);
        kinds.push(OperatorKind::AddIndex);
        kinds.push(OperatorKind::SetIndex);
        kinds.push(OperatorKind::Join);
        kinds.push(OperatorKind::Timestamps);
        kinds
    }

    /// Globally unique registry key
    pub fn key(&self) -> &'static str {
        match self {
            OperatorKind::Arithmetic(op) => op.key(),
            OperatorKind::Comparison(op) => op.key(),
            OperatorKind::Calendar(unit) => unit.key(),
            OperatorKind::Prefix => "PREFIX",
            OperatorKind::Unary(op) => op.key(),
            OperatorKind::Lag => "LAG",
            OperatorKind::AddIndex => "ADD_INDEX",
            OperatorKind::SetIndex => "SET_INDEX",
            OperatorKind::Join => "JOIN",
            OperatorKind::Timestamps => "TIMESTAMPS",
        }
    }

    /// Declarative definition of attributes, inputs and outputs
    pub fn definition(&self) -> OperatorDef {
        let key = self.key();
        match self {
            OperatorKind::Arithmetic(_) | OperatorKind::Comparison(_) => {
                OperatorDef::new(key, &["input_1", "input_2"], &["output"])
                    .with_attribute("resolution", AttributeType::String)
            }
            OperatorKind::Calendar(_) => OperatorDef::new(key, &["sampling"], &["output"]),
            OperatorKind::Prefix => OperatorDef::new(key, &["input"], &["output"])
                .with_attribute("prefix", AttributeType::String),
            OperatorKind::Unary(_) | OperatorKind::Timestamps => {
                OperatorDef::new(key, &["input"], &["output"])
            }
            OperatorKind::Lag => OperatorDef::new(key, &["input"], &["output"])
                .with_attribute("duration", AttributeType::Float64),
            OperatorKind::AddIndex => OperatorDef::new(key, &["input"], &["output"])
                .with_attribute("indexes", AttributeType::RepeatedString),
            OperatorKind::SetIndex => OperatorDef::new(key, &["input"], &["output"])
                .with_attribute("feature_names", AttributeType::RepeatedString)
                .with_attribute("append", AttributeType::Bool),
            OperatorKind::Join => OperatorDef::new(key, &["left", "right"], &["output"])
                .with_attribute("how", AttributeType::String)
                .with_optional_attribute("on", AttributeType::String),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Definitions of the whole catalog
pub fn definitions() -> Vec<OperatorDef> {
    OperatorKind::all().iter().map(OperatorKind::definition).collect()
}
