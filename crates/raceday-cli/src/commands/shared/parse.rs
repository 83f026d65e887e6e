use raceday_core::tables::Table;
use raceday_db::csv::ImportTarget;

/// Parse a delete target from its document key or entity name.
///
/// The audit log is never a valid target.
pub fn parse_table(raw: &str) -> Result<Table, String> {
    match raw.parse::<Table>().map_err(|error| error.to_string())? {
        Table::AuditLogs => Err(format!("'{raw}' is append-only and cannot be deleted")),
        table => Ok(table),
    }
}

/// Parse a `COLUMN=VALUE` equality condition.
pub fn parse_condition(raw: &str) -> Result<(String, String), String> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid condition '{raw}': expected COLUMN=VALUE"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("invalid condition '{raw}': empty column name"));
    }
    Ok((column.to_string(), value.to_string()))
}

pub fn parse_import_target(raw: &str) -> Result<ImportTarget, String> {
    raw.parse::<ImportTarget>().map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use raceday_core::tables::Table;

    use super::{parse_condition, parse_table};

    #[test]
    fn parses_keys_and_entity_names() {
        assert_eq!(parse_table("priceTiers").expect("key"), Table::PriceTiers);
        assert_eq!(parse_table("PriceTier").expect("entity"), Table::PriceTiers);
    }

    #[test]
    fn errors_on_unknown_table() {
        assert!(parse_table("racers").is_err());
    }

    #[test]
    fn audit_log_is_not_a_target() {
        for raw in ["auditLogs", "AuditLog"] {
            let err = parse_table(raw).expect_err("audit log should be refused");
            assert!(err.contains("append-only"), "{err}");
        }
    }

    #[test]
    fn condition_keeps_equals_signs_in_the_value() {
        assert_eq!(
            parse_condition("note=a=b").expect("condition should parse"),
            ("note".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn condition_requires_column_and_separator() {
        assert!(parse_condition("distanceId").is_err());
        let err = parse_condition(" =dst-1").expect_err("empty column");
        assert!(err.contains("empty column name"));
    }
}
