//! A single table to load (§3's TableSpec).

use std::path::PathBuf;

use serde::Deserialize;

use crate::err::ShardLoadError;

/// One entry of the primary config's `tables` list.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    pub tablename: String,
    /// Comma-separated column list, in load order.
    pub columns: String,
    pub datapath: PathBuf,
    /// 1-based index of the partition column within `columns`.
    #[serde(rename = "partitionField")]
    pub partition_field: usize,
    /// Declared type of the partition column; only `"int"` is supported
    /// by the field parser (§4.2 requires an integer key).
    #[serde(rename = "partitionFieldType", default = "default_partition_field_type")]
    pub partition_field_type: String,
}

fn default_partition_field_type() -> String {
    "int".to_string()
}

impl TableSpec {
    /// Splits `columns` into its individual, trimmed column names.
    pub fn column_list(&self) -> Vec<String> {
        self.columns.split(',').map(|c| c.trim().to_string()).collect()
    }

    /// Validates cross-field constraints that can't be expressed in the
    /// type alone: a non-zero partition field within the column count,
    /// and an existing, readable data path.
    pub fn validate(&self) -> Result<(), ShardLoadError> {
        let columns = self.column_list();
        if columns.is_empty() || columns.iter().any(|c| c.is_empty()) {
            return Err(ShardLoadError::Config(format!(
                "table {}: columns must be a non-empty comma-separated list",
                self.tablename
            )));
        }
        if self.partition_field == 0 || self.partition_field > columns.len() {
            return Err(ShardLoadError::Config(format!(
                "table {}: partitionField {} out of range for {} columns",
                self.tablename,
                self.partition_field,
                columns.len()
            )));
        }
        if self.partition_field_type != "int" {
            return Err(ShardLoadError::Config(format!(
                "table {}: partitionFieldType {} is not supported, only \"int\"",
                self.tablename, self.partition_field_type
            )));
        }
        if !self.datapath.exists() {
            return Err(ShardLoadError::Config(format!(
                "table {}: datapath {} does not exist",
                self.tablename,
                self.datapath.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_columns() {
        let t = TableSpec {
            tablename: "orders".into(),
            columns: "id, amount , note".into(),
            datapath: PathBuf::from("/dev/null"),
            partition_field: 1,
            partition_field_type: "int".into(),
        };
        assert_eq!(t.column_list(), vec!["id", "amount", "note"]);
    }

    #[test]
    fn rejects_out_of_range_partition_field() {
        let t = TableSpec {
            tablename: "orders".into(),
            columns: "id, amount".into(),
            datapath: PathBuf::from("/dev/null"),
            partition_field: 5,
            partition_field_type: "int".into(),
        };
        assert!(t.validate().is_err());
    }
}
