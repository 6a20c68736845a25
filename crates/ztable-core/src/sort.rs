use serde::{Deserialize, Serialize};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Anything other than `desc` reads as ascending
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Single-key sort. `key == None` means unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.key.is_some()
    }

    /// Next configuration after the header for `key` is activated.
    ///
    /// A new key starts ascending; the same key cycles asc, desc, then unsorted.
    pub fn cycle(&self, key: &str) -> Self {
        match (&self.key, self.direction) {
            (Some(current), SortDirection::Asc) if current == key => {
                SortConfig::new(key, SortDirection::Desc)
            }
            (Some(current), SortDirection::Desc) if current == key => SortConfig::default(),
            _ => SortConfig::new(key, SortDirection::Asc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_cycle() {
        let off = SortConfig::default();
        let asc = off.cycle("age");
        assert_eq!(asc, SortConfig::new("age", SortDirection::Asc));
        let desc = asc.cycle("age");
        assert_eq!(desc.direction, SortDirection::Desc);
        let cleared = desc.cycle("age");
        assert_eq!(cleared, SortConfig::default());
        assert_eq!(desc.cycle("name"), SortConfig::new("name", SortDirection::Asc));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(SortDirection::parse("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Asc);
        assert_eq!(SortDirection::Asc.toggle(), SortDirection::Desc);
    }
}
