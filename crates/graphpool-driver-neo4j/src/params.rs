//! Conversion of query parameters to Bolt values

use graphpool_core::{Params, Value};
use neo4rs::{BoltList, BoltNull, BoltType, Query, query};

pub(crate) fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Integer(i) => BoltType::from(*i),
        Value::Float(f) => BoltType::from(*f),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::List(items) => {
            let mut list = BoltList::new();
            for item in items {
                list.push(to_bolt(item));
            }
            BoltType::List(list)
        }
    }
}

pub(crate) fn to_query(text: &str, params: &Params) -> Query {
    params
        .iter()
        .fold(query(text), |q, (name, value)| q.param(name, to_bolt(value)))
}
