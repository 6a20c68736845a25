//! Query-string encoding

use url::form_urlencoded;

/// Decoded `key=value` pairs in order. A leading `?` is ignored.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Last value for `key`, if any
pub fn query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn build_query<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

/// Split a comma list, dropping empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_with_escaping() {
        let query = build_query([
            ("search", "senior,lyon".to_string()),
            ("filters", r#"[{"field":"a b"}]"#.to_string()),
        ]);
        let pairs = parse_query(&format!("?{}", query));
        assert_eq!(query_value(&pairs, "search"), Some("senior,lyon"));
        assert_eq!(query_value(&pairs, "filters"), Some(r#"[{"field":"a b"}]"#));
        assert_eq!(query_value(&pairs, "page"), None);
    }

    #[test]
    fn test_split_list_drops_empty() {
        assert_eq!(split_list("a,,b,"), vec!["a", "b"]);
        assert!(split_list("").is_empty());
    }
}
