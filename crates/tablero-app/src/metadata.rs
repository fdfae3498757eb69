// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::FieldId;
use crate::model::{Field, TableMetadata};

/// Comparison operators offered by the structured query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    Contains,
    StartsWith,
    IsNull,
    NotNull,
}

impl Operator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::IsNull => "is_null",
            Self::NotNull => "not_null",
        }
    }
}

/// Coarse classification of a field's wire `base_type`, which drives which
/// operators and aggregations apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Temporal,
    Unknown,
}

impl FieldKind {
    pub fn from_base_type(base_type: &str) -> Self {
        match base_type {
            "CharField" | "TextField" => Self::Text,
            "IntegerField" | "BigIntegerField" | "FloatField" | "DecimalField" => Self::Number,
            "BooleanField" => Self::Boolean,
            "DateField" | "DateTimeField" | "TimeField" => Self::Temporal,
            _ => Self::Unknown,
        }
    }

    pub const fn valid_operators(self) -> &'static [Operator] {
        match self {
            Self::Text => &[
                Operator::Equal,
                Operator::NotEqual,
                Operator::Contains,
                Operator::StartsWith,
                Operator::IsNull,
                Operator::NotNull,
            ],
            Self::Number => &[
                Operator::Equal,
                Operator::NotEqual,
                Operator::LessThan,
                Operator::GreaterThan,
                Operator::IsNull,
                Operator::NotNull,
            ],
            Self::Boolean => &[
                Operator::Equal,
                Operator::NotEqual,
                Operator::IsNull,
                Operator::NotNull,
            ],
            Self::Temporal => &[
                Operator::Equal,
                Operator::LessThan,
                Operator::GreaterThan,
                Operator::IsNull,
                Operator::NotNull,
            ],
            Self::Unknown => &[Operator::Equal, Operator::NotEqual],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedUpField {
    pub field: Field,
    pub kind: FieldKind,
    pub operators: Vec<Operator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationOption {
    pub name: &'static str,
    /// Fields this aggregation can target; empty means it takes no field
    /// argument (e.g. a bare row count).
    pub applicable_fields: Vec<FieldId>,
}

/// A table's metadata enriched for the query builder: per-field operator
/// sets plus the aggregation and breakout options the editor offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedUpTable {
    pub table: TableMetadata,
    pub fields: Vec<MarkedUpField>,
    pub aggregations: Vec<AggregationOption>,
}

impl MarkedUpTable {
    /// Breakout candidates are every field on the table.
    pub fn breakout_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().map(|marked| &marked.field)
    }
}

/// Annotate raw table metadata with valid operators and query options.
/// Runs on every metadata fetch before the editor sees the table.
pub fn mark_up_table(table: TableMetadata) -> MarkedUpTable {
    let fields: Vec<MarkedUpField> = table
        .fields
        .iter()
        .map(|field| {
            let kind = FieldKind::from_base_type(&field.base_type);
            MarkedUpField {
                field: field.clone(),
                kind,
                operators: kind.valid_operators().to_vec(),
            }
        })
        .collect();

    let numeric_fields: Vec<FieldId> = fields
        .iter()
        .filter(|marked| marked.kind == FieldKind::Number)
        .map(|marked| marked.field.id)
        .collect();
    let all_fields: Vec<FieldId> = fields.iter().map(|marked| marked.field.id).collect();

    let aggregations = vec![
        AggregationOption {
            name: "count",
            applicable_fields: Vec::new(),
        },
        AggregationOption {
            name: "sum",
            applicable_fields: numeric_fields.clone(),
        },
        AggregationOption {
            name: "avg",
            applicable_fields: numeric_fields,
        },
        AggregationOption {
            name: "distinct",
            applicable_fields: all_fields,
        },
    ];

    MarkedUpTable {
        table,
        fields,
        aggregations,
    }
}
