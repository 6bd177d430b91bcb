use std::cmp::Ordering;

/// Interpreter version as numeric components. Comparison is componentwise
/// with missing components treated as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    pub fn new(parts: &[u64]) -> Self {
        Self {
            parts: parts.to_vec(),
        }
    }

    pub(crate) fn from_parts(parts: Vec<u64>) -> Self {
        Self { parts }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('v').unwrap_or(s);
        let parts = s
            .split('.')
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    fn component(&self, idx: usize) -> u64 {
        self.parts.get(idx).copied().unwrap_or(0)
    }

    /// Equality on exactly the components this constraint names, so `v1.2`
    /// accepts any host 1.2.x.
    pub(crate) fn matches_prefix(&self, host: &Version) -> bool {
        self.parts
            .iter()
            .enumerate()
            .all(|(i, p)| host.component(i) == *p)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::Version;

    #[test]
    fn ordering_zero_fills_missing_components() {
        assert!(Version::new(&[1, 2]) < Version::new(&[1, 2, 1]));
        assert_eq!(Version::new(&[1, 2]).cmp(&Version::new(&[1, 2, 0])), std::cmp::Ordering::Equal);
        assert!(Version::new(&[2]) > Version::new(&[1, 9, 9]));
    }

    #[test]
    fn prefix_match_ignores_unnamed_components() {
        let host = Version::new(&[1, 2, 3]);
        assert!(Version::new(&[1]).matches_prefix(&host));
        assert!(Version::new(&[1, 2]).matches_prefix(&host));
        assert!(!Version::new(&[1, 3]).matches_prefix(&host));
    }

    #[test]
    fn parses_dotted_forms() {
        assert_eq!(Version::parse("v1.2.3"), Some(Version::new(&[1, 2, 3])));
        assert_eq!(Version::parse("0.1.0"), Some(Version::new(&[0, 1, 0])));
        assert_eq!(Version::parse("v1.x"), None);
    }
}
