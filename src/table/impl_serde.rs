use std::convert::TryFrom;

use serde_crate::{Deserialize, Serialize};

use super::{Float, Table};
use crate::error::Error;

/// Serialized form of a [`Table`]: missing cells become `null` instead of a `NaN`, which most
/// formats cannot represent. Infinite cells have no such stand-in and are refused, a `null`
/// would turn them into missing cells on the way back.
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
struct TableRepr<F> {
    feature_names: Vec<String>,
    rows: Vec<Vec<Option<F>>>,
}

impl<F: Float> From<Table<F>> for TableRepr<F> {
    fn from(table: Table<F>) -> Self {
        let rows = table
            .records
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(|&x| if x.is_nan() { None } else { Some(x) })
                    .collect()
            })
            .collect();

        TableRepr {
            feature_names: table.feature_names,
            rows,
        }
    }
}

impl<F: Float> TryFrom<TableRepr<F>> for Table<F> {
    type Error = Error;

    fn try_from(repr: TableRepr<F>) -> Result<Self, Self::Error> {
        Table::from_rows(repr.rows, repr.feature_names)
    }
}

impl<F: Float + Serialize> Serialize for Table<F> {
    fn serialize<S: serde_crate::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(row) = self.infinite_rows().iter().position(|&inf| inf) {
            return Err(serde_crate::ser::Error::custom(format!(
                "row {} has an infinite value",
                row
            )));
        }
        TableRepr::from(self.clone()).serialize(serializer)
    }
}

impl<'de, F: Float + Deserialize<'de>> Deserialize<'de> for Table<F> {
    fn deserialize<D: serde_crate::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TableRepr::deserialize(deserializer)?;
        Table::try_from(repr).map_err(serde_crate::de::Error::custom)
    }
}
