/// Normalized target framework, comparable across short (`net8.0`) and
/// long (`.NETCoreApp,Version=v8.0`) spellings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFramework {
    /// Lowercased framework identifier, e.g. `.netcoreapp`
    pub identifier: String,
    /// Version parts with trailing zeros removed
    pub version: Vec<u32>,
    /// Lowercased platform suffix of short monikers (`windows`, `android34.0`)
    pub platform: Option<String>,
}

const NET_CORE_APP: &str = ".netcoreapp";
const NET_STANDARD: &str = ".netstandard";
const NET_FRAMEWORK: &str = ".netframework";

impl TargetFramework {
    pub fn parse(moniker: &str) -> Option<Self> {
        let moniker = moniker.trim();
        if moniker.starts_with('.') || moniker.contains(',') {
            Self::parse_long(moniker)
        } else {
            Self::parse_short(moniker)
        }
    }

    fn parse_long(moniker: &str) -> Option<Self> {
        let mut parts = moniker.split(',').map(str::trim);
        let identifier = parts.next()?.to_ascii_lowercase();
        let version = parts.find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("Version")
                .then(|| value.trim().trim_start_matches(&['v', 'V'][..]))
        })?;

        Some(Self {
            identifier,
            version: dotted_version(version)?,
            platform: None,
        })
    }

    fn parse_short(moniker: &str) -> Option<Self> {
        let lower = moniker.to_ascii_lowercase();
        let (framework, platform) = match lower.split_once('-') {
            Some((framework, platform)) => (framework.to_string(), Some(platform.to_string())),
            None => (lower.clone(), None),
        };

        let (identifier, version) = if let Some(v) = framework.strip_prefix("netstandard") {
            (NET_STANDARD, dotted_version(v)?)
        } else if let Some(v) = framework.strip_prefix("netcoreapp") {
            (NET_CORE_APP, dotted_version(v)?)
        } else if let Some(v) = framework.strip_prefix("net") {
            if v.contains('.') {
                (NET_CORE_APP, dotted_version(v)?)
            } else {
                // net472 -> 4.7.2
                (NET_FRAMEWORK, compact_version(v)?)
            }
        } else {
            return None;
        };

        Some(Self {
            identifier: identifier.to_string(),
            version,
            platform,
        })
    }
}

fn trimmed(mut parts: Vec<u32>) -> Vec<u32> {
    while parts.len() > 1 && parts.last() == Some(&0) {
        parts.pop();
    }
    parts
}

fn dotted_version(v: &str) -> Option<Vec<u32>> {
    if v.is_empty() {
        return None;
    }
    let parts = v.split('.').map(|p| p.parse().ok()).collect::<Option<Vec<u32>>>()?;
    Some(trimmed(parts))
}

fn compact_version(v: &str) -> Option<Vec<u32>> {
    if v.is_empty() || !v.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let parts = v.chars().filter_map(|c| c.to_digit(10)).collect();
    Some(trimmed(parts))
}

/// Whether two monikers name the same framework
pub fn frameworks_match(a: &str, b: &str) -> bool {
    match (TargetFramework::parse(a), TargetFramework::parse(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}
