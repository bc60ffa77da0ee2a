//! Well-known PV names and per-target field suffixes.
//!
//! Every PV this process publishes is either one of the two process-wide
//! names below or `<target>` / `<target>:<SUFFIX>` for a configured target.

/// Process-wide master enable switch (read/write, 0/1).
pub const MASTER_ENABLE: &str = "MONITOR:MASTER_ENABLE";

/// Process-wide summary status (read-only, 1 = OK, 0 = ALARM).
pub const SUMMARY_STATUS: &str = "MONITOR:SUMMARY_STATUS";

/// Per-target enable flag suffix.
pub const SUFFIX_ENABLE: &str = "ENABLE";

/// Per-target low bound suffix.
pub const SUFFIX_LOW: &str = "LOW";

/// Per-target high bound suffix.
pub const SUFFIX_HIGH: &str = "HIGH";

/// Per-target status suffix.
pub const SUFFIX_STATUS: &str = "STATUS";

/// All per-target field suffixes, in publication order.
pub const FIELD_SUFFIXES: [&str; 4] = [SUFFIX_ENABLE, SUFFIX_LOW, SUFFIX_HIGH, SUFFIX_STATUS];

/// Longest PV name accepted for a target.
pub const MAX_PV_NAME_LEN: usize = 128;

/// Build `<target>:<suffix>`.
pub fn field_pv(target: &str, suffix: &str) -> String {
    format!("{target}:{suffix}")
}

/// Every PV name a target publishes: the bare name followed by its fields.
pub fn target_pvs(target: &str) -> Vec<String> {
    std::iter::once(target.to_string())
        .chain(FIELD_SUFFIXES.iter().map(|s| field_pv(target, s)))
        .collect()
}

/// Allowed PV name characters: alphanumeric plus `_ - : . [ ] < > ;`.
pub fn is_valid_pv_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_PV_NAME_LEN
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | ':' | '.' | '[' | ']' | '<' | '>' | ';')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_pv_joins_with_colon() {
        assert_eq!(field_pv("SIM:TEMP", SUFFIX_LOW), "SIM:TEMP:LOW");
    }

    #[test]
    fn target_pvs_lists_bare_name_first() {
        assert_eq!(
            target_pvs("A"),
            vec!["A", "A:ENABLE", "A:LOW", "A:HIGH", "A:STATUS"]
        );
    }

    #[test]
    fn valid_names() {
        assert!(is_valid_pv_name("SIM:TEMP"));
        assert!(is_valid_pv_name("BL01-DI-CAM-01:ARR.VAL"));
        assert!(is_valid_pv_name("ring:current[0]"));
    }

    #[test]
    fn invalid_names() {
        assert!(!is_valid_pv_name(""));
        assert!(!is_valid_pv_name("has space"));
        assert!(!is_valid_pv_name("quote\"d"));
        assert!(!is_valid_pv_name(&"A".repeat(200)));
    }
}
