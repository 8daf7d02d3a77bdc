use crate::error::{Error, Result};
use crate::names::AssemblyName;

/// Simple name from a full assembly display name
///
/// `Contoso.Core, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null`
/// yields `Contoso.Core`. Backslash escapes are honoured and surrounding
/// quotes are dropped.
pub fn simple_name_from_display_name(display_name: &str) -> Result<AssemblyName> {
    let mut name = String::new();
    let mut chars = display_name.trim_start().chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => name.push(escaped),
                None => return Err(Error::InvalidFusionName(display_name.to_string())),
            },
            ',' => break,
            _ => name.push(c),
        }
    }

    let trimmed = name.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(trimmed);

    if unquoted.is_empty() {
        return Err(Error::InvalidFusionName(display_name.to_string()));
    }

    Ok(AssemblyName::new(unquoted))
}
