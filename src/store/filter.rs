//! Equality filters carried in store query strings as `column=eq.value`.

use std::fmt;

const EQ_PREFIX: &str = "eq.";

/// Query parameters that are not filters.
pub const RESERVED_PARAMS: [&str; 2] = ["order", "limit"];

/// A conjunction of `column = value` clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    UnsupportedOperator { column: String, value: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::UnsupportedOperator { column, value } => write!(
                f,
                "Unsupported filter '{}={}'. Use {}=eq.<value>",
                column, value, column
            ),
        }
    }
}

impl std::error::Error for FilterError {}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push((column.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[(String, String)] {
        &self.clauses
    }

    /// Query-string pairs for this filter.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.clauses
            .iter()
            .map(|(column, value)| (column.clone(), format!("{}{}", EQ_PREFIX, value)))
            .collect()
    }

    /// Builds a filter from query-string pairs, skipping `order` and `limit`.
    pub fn from_query<'a, I>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut filter = Self::new();
        for (column, value) in pairs {
            if RESERVED_PARAMS.contains(&column.as_str()) {
                continue;
            }
            match value.strip_prefix(EQ_PREFIX) {
                Some(v) => filter = filter.eq(column.as_str(), v),
                None => {
                    return Err(FilterError::UnsupportedOperator {
                        column: column.clone(),
                        value: value.clone(),
                    })
                }
            }
        }
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_query() {
        let filter = Filter::new().eq("username", "alice").eq("secret", "eq.p1");
        assert_eq!(
            filter.to_query(),
            vec![
                ("username".to_string(), "eq.alice".to_string()),
                ("secret".to_string(), "eq.eq.p1".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_query_strips_operator_once() {
        let pairs = vec![
            ("secret".to_string(), "eq.eq.p1".to_string()),
            ("order".to_string(), "username".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        let filter = Filter::from_query(pairs.iter().map(|(k, v)| (k, v))).unwrap();
        assert_eq!(filter, Filter::new().eq("secret", "eq.p1"));
    }

    #[test]
    fn test_from_query_rejects_other_operators() {
        let pairs = vec![("key".to_string(), "like.%-12".to_string())];
        let result = Filter::from_query(pairs.iter().map(|(k, v)| (k, v)));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("key=eq.<value>"));
    }
}
