use super::model::Value;

// ---------------------------------------------------------------------------
// Derived prefix columns
// ---------------------------------------------------------------------------

/// First `n` characters of a location code, case preserved. Codes shorter
/// than `n` are taken whole; the empty string stays empty.
pub fn prefix_of(code: &str, n: usize) -> String {
    code.chars().take(n).collect()
}

/// Derive a prefix cell from a stored location-code cell. Null derives Null
/// rather than raising; every other value is prefixed via its string form.
pub fn derive_prefix(value: &Value, n: usize) -> Value {
    match value {
        Value::Null => Value::Null,
        other => Value::Str(prefix_of(&other.to_string(), n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_leading_characters() {
        assert_eq!(prefix_of("NW16AA", 3), "NW1");
        assert_eq!(prefix_of("E148QS", 3), "E14");
    }

    #[test]
    fn short_and_empty_codes() {
        assert_eq!(prefix_of("E1", 3), "E1");
        assert_eq!(prefix_of("", 3), "");
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(prefix_of("nw16aa", 3), "nw1");
    }

    #[test]
    fn null_derives_null() {
        assert_eq!(derive_prefix(&Value::Null, 3), Value::Null);
        assert_eq!(
            derive_prefix(&Value::from("NW16AA"), 3),
            Value::from("NW1")
        );
    }
}
