use std::collections::HashMap;

use crate::databases::table::{Column, ColumnType, TableInfo};

/// Source columns that also exist in the destination, compared by exact
/// name, in source order. Empty means there is nothing to copy.
pub fn reconcile(source: &TableInfo, destination: &TableInfo) -> Vec<Column> {
    let destination_names = destination.column_names();
    return source
        .columns
        .iter()
        .filter(|column| destination_names.contains(&column.name.as_str()))
        .cloned()
        .collect();
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeMismatch {
    pub column: String,
    pub source: ColumnType,
    pub destination: ColumnType,
}

/// Reconciled columns whose type differs between the two sides. Those are
/// still copied, the destination decides if the value fits.
pub fn type_mismatches(columns: &[Column], destination: &TableInfo) -> Vec<TypeMismatch> {
    let destination_types = types_by_name(destination);
    return columns
        .iter()
        .filter_map(|column| {
            let destination_type = *destination_types.get(column.name.as_str())?;
            if destination_type == column.column_type {
                return None;
            }
            return Some(TypeMismatch {
                column: column.name.clone(),
                source: column.column_type,
                destination: destination_type,
            });
        })
        .collect();
}

/// Reconciled columns whose type is unsupported on either side. Columns
/// outside the intersection never matter.
pub fn unsupported_columns<'a>(columns: &'a [Column], destination: &TableInfo) -> Vec<&'a str> {
    let destination_types = types_by_name(destination);
    return columns
        .iter()
        .filter(|column| {
            column.column_type == ColumnType::Unsupported
                || destination_types.get(column.name.as_str()) == Some(&ColumnType::Unsupported)
        })
        .map(|column| column.name.as_str())
        .collect();
}

fn types_by_name(table: &TableInfo) -> HashMap<&str, ColumnType> {
    return table
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.column_type))
        .collect();
}
