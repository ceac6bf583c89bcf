pub mod auth_plugin_names;
pub mod capability_flags;
pub mod collation;
pub mod column_type;
pub mod field_flags;
pub mod status_flags;

/// Renders every set bit of `mask`, lowest bit first, as `NAME|NAME|(bit)`.
/// Bits missing from `table` are written as their decimal value in parentheses.
pub fn flags_to_string(mask: u64, table: &[(u64, &str)]) -> String {
    let mut names: Vec<String> = Vec::new();
    let mut remaining = mask;
    while remaining != 0 {
        let bit = remaining & remaining.wrapping_neg();
        remaining ^= bit;

        match table.iter().find(|(value, _)| *value == bit) {
            Some((_, name)) => names.push(name.to_string()),
            None => names.push(format!("({})", bit)),
        }
    }
    names.join("|")
}

/// Parses the output of [`flags_to_string`] back into a mask.
/// Returns `None` when a part is neither a known name nor a `(bit)` literal.
pub fn flags_from_string(s: &str, table: &[(u64, &str)]) -> Option<u64> {
    let mut mask = 0u64;
    for part in s.split('|').filter(|p| !p.is_empty()) {
        let bit = match table.iter().find(|(_, name)| *name == part) {
            Some((value, _)) => *value,
            None => part
                .strip_prefix('(')
                .and_then(|p| p.strip_suffix(')'))
                .and_then(|p| p.parse::<u64>().ok())?,
        };
        mask |= bit;
    }
    Some(mask)
}
