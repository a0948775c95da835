//! Row types that can be written to and read from a table
//!
//! A row type enumerates its mapped fields through [`TableRow`]. The
//! [`table_row!`](crate::table_row) macro generates the implementation for a
//! plain struct:
//!
//! ```
//! use xbase_engine::table_row;
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     name: String,
//!     age: i64,
//!     rate: f64,
//!     note: Vec<u8>,
//! }
//!
//! // `note` is not listed, so it is not mapped
//! table_row!(Person { name => "NAME", age => "AGE,omitempty", rate });
//! ```

use chrono::NaiveDate;

use crate::storage::codec::Value;

/// Kind of Rust value a mapped field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Logical,
    Character,
    Integer,
    Float,
    Date,
}

/// One mapped field of a row type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Rust field name
    pub field: &'static str,
    /// Kind of value the field holds
    pub kind: ValueKind,
    /// Binding directive, `"COLUMN[,omitempty]"` or `"-"`
    pub tag: Option<&'static str>,
}

/// Field enumeration contract for structured rows
pub trait TableRow: 'static {
    /// Mapped fields, in declaration order
    fn columns() -> Vec<ColumnDef>;

    /// Current field values, in the same order as [`TableRow::columns`]
    fn values(&self) -> Vec<Value>;

    /// Store a decoded value into the field named `field`
    fn assign(&mut self, field: &str, value: Value) -> Result<(), String>;
}

/// Conversion between a Rust field type and a [`Value`]
pub trait ColumnValue: Sized {
    const KIND: ValueKind;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, String>;
}

/// Value kind of the field selected by `accessor`
pub fn kind_of<R, V, F>(_accessor: F) -> ValueKind
where
    V: ColumnValue,
    F: Fn(&R) -> &V,
{
    V::KIND
}

impl ColumnValue for bool {
    const KIND: ValueKind = ValueKind::Logical;

    fn to_value(&self) -> Value {
        Value::Logical(*self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Logical(b) => Ok(b),
            other => Err(format!("cannot read {:?} into a bool", other)),
        }
    }
}

impl ColumnValue for String {
    const KIND: ValueKind = ValueKind::Character;

    fn to_value(&self) -> Value {
        Value::Character(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        Ok(match value {
            Value::Character(s) => s,
            other => other.to_string(),
        })
    }
}

macro_rules! integer_column {
    ($($t:ty),*) => {
        $(
            impl ColumnValue for $t {
                const KIND: ValueKind = ValueKind::Integer;

                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, String> {
                    let wide = match value {
                        Value::Integer(i) => i,
                        Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                        other => {
                            return Err(format!("cannot read {:?} into {}", other, stringify!($t)))
                        }
                    };
                    <$t>::try_from(wide)
                        .map_err(|_| format!("{} is out of range for {}", wide, stringify!($t)))
                }
            }
        )*
    };
}

integer_column!(i8, i16, i32, i64, u8, u16, u32);

impl ColumnValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(format!("cannot read {:?} into f64", other)),
        }
    }
}

impl ColumnValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        // Through the shortest decimal text, so 0.1f32 is stored as 0.1
        Value::Float(self.to_string().parse().unwrap_or(*self as f64))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ColumnValue for Option<NaiveDate> {
    const KIND: ValueKind = ValueKind::Date;

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(format!("cannot read {:?} into a date", other)),
        }
    }
}

/// Implement [`TableRow`] for a struct by listing its mapped fields.
///
/// Each entry is a field name, optionally followed by `=> "DIRECTIVE"`.
/// List fields in declaration order; unlisted fields are not mapped.
#[macro_export]
macro_rules! table_row {
    (@tag) => {
        None
    };
    (@tag $tag:literal) => {
        Some($tag)
    };
    ($row:ident { $($field:ident $(=> $tag:literal)?),* $(,)? }) => {
        impl $crate::mapping::TableRow for $row {
            fn columns() -> Vec<$crate::mapping::ColumnDef> {
                vec![$(
                    $crate::mapping::ColumnDef {
                        field: stringify!($field),
                        kind: $crate::mapping::kind_of(|row: &$row| &row.$field),
                        tag: $crate::table_row!(@tag $($tag)?),
                    }
                ),*]
            }

            fn values(&self) -> Vec<$crate::Value> {
                vec![$($crate::mapping::ColumnValue::to_value(&self.$field)),*]
            }

            fn assign(&mut self, field: &str, value: $crate::Value) -> Result<(), String> {
                $(
                    if field == stringify!($field) {
                        self.$field = $crate::mapping::ColumnValue::from_value(value)?;
                        return Ok(());
                    }
                )*
                let _ = value;
                Err(format!("no mapped field named {}", field))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        flag: bool,
        label: String,
        count: i32,
        ratio: f64,
        seen: Option<NaiveDate>,
        cache: Vec<u8>,
    }

    crate::table_row!(Sample {
        flag,
        label => "LABEL,omitempty",
        count,
        ratio,
        seen => "SEEN_ON",
    });

    #[test]
    fn test_columns_follow_listing() {
        let columns = Sample::columns();
        let names: Vec<&str> = columns.iter().map(|c| c.field).collect();
        assert_eq!(names, vec!["flag", "label", "count", "ratio", "seen"]);
        assert_eq!(columns[0].kind, ValueKind::Logical);
        assert_eq!(columns[1].tag, Some("LABEL,omitempty"));
        assert_eq!(columns[2].kind, ValueKind::Integer);
        assert_eq!(columns[3].kind, ValueKind::Float);
        assert_eq!(columns[4].kind, ValueKind::Date);
        assert_eq!(columns[0].tag, None);
    }

    #[test]
    fn test_values_and_assign() {
        let mut row = Sample {
            flag: true,
            label: "x".into(),
            count: 3,
            ..Default::default()
        };
        let values = row.values();
        assert_eq!(values[0], Value::Logical(true));
        assert_eq!(values[2], Value::Integer(3));
        assert_eq!(values[4], Value::Date(None));

        row.assign("count", Value::Integer(9)).unwrap();
        assert_eq!(row.count, 9);
        row.assign("label", Value::Character("y".into())).unwrap();
        assert_eq!(row.label, "y");
        assert!(row.assign("cache", Value::Integer(1)).is_err());
        assert!(row.assign("flag", Value::Integer(1)).is_err());
        assert!(row.cache.is_empty());
    }

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(u8::from_value(Value::Integer(255)), Ok(255));
        assert!(u8::from_value(Value::Integer(256)).is_err());
        assert!(i32::from_value(Value::Float(1.5)).is_err());
        assert_eq!(i64::from_value(Value::Float(4.0)), Ok(4));
    }

    #[test]
    fn test_f32_keeps_short_decimal() {
        assert_eq!(0.1f32.to_value(), Value::Float(0.1));
    }

    #[test]
    fn test_string_reads_any_value() {
        assert_eq!(String::from_value(Value::Integer(12)).unwrap(), "12");
        assert_eq!(String::from_value(Value::Logical(true)).unwrap(), "T");
    }
}
