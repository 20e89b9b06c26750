//! Data type compatibility.

/// Broad family of a catalog data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Decimal,
    Text,
    Uuid,
    Temporal,
    Boolean,
    Other,
}

/// Lowercase, drop length/precision parameters and collapse whitespace.
fn normalize(data_type: &str) -> String {
    let lower = data_type.to_lowercase();
    let base = lower.split('(').next().unwrap_or(&lower);
    base.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a data type name.
pub fn type_family(data_type: &str) -> TypeFamily {
    let normalized = normalize(data_type);
    let base = normalized.strip_suffix(" unsigned").unwrap_or(&normalized);

    match base {
        "integer" | "int" | "int2" | "int4" | "int8" | "bigint" | "smallint" | "tinyint"
        | "mediumint" | "serial" | "bigserial" | "smallserial" => TypeFamily::Integer,
        "decimal" | "numeric" | "real" | "float" | "float4" | "float8" | "double"
        | "double precision" | "money" => TypeFamily::Decimal,
        "varchar" | "char" | "text" | "character varying" | "character" | "nvarchar"
        | "nchar" | "ntext" | "string" | "citext" | "bpchar" | "clob" => TypeFamily::Text,
        "uuid" | "uniqueidentifier" => TypeFamily::Uuid,
        "date" | "time" | "timestamp" | "timestamptz" | "datetime" | "datetime2"
        | "timestamp with time zone" | "timestamp without time zone" => TypeFamily::Temporal,
        "bool" | "boolean" | "bit" => TypeFamily::Boolean,
        _ => TypeFamily::Other,
    }
}

/// Whether two columns could plausibly hold the same values.
///
/// Types in the same known family are compatible; unknown types must match
/// exactly after normalization.
pub fn types_compatible(a: &str, b: &str) -> bool {
    match (type_family(a), type_family(b)) {
        (TypeFamily::Other, _) | (_, TypeFamily::Other) => normalize(a) == normalize(b),
        (fa, fb) => fa == fb,
    }
}
