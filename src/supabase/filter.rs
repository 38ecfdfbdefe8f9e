/// Row predicate understood by the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: String, value: String },
    /// Matches when any of the inner equality filters matches.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Query-string pair in PostgREST syntax, e.g. `("email", "eq.a@b.io")` or
    /// `("or", "(email.eq.a@b.io,mobile.eq.555)")`.
    pub fn to_query_pair(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{value}")),
            Filter::Or(inner) => ("or".to_string(), format!("({})", or_terms(inner))),
        }
    }
}

fn or_terms(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|f| match f {
            Filter::Eq { column, value } => format!("{column}.eq.{}", quote_reserved(value)),
            Filter::Or(inner) => format!("or({})", or_terms(inner)),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Inside `or=(...)` the characters `,.:()` delimit terms, so values carrying
/// them (emails always do) are wrapped in double quotes.
fn quote_reserved(value: &str) -> String {
    if value.contains(&[',', '.', ':', '(', ')', '"', '\\', ' '][..]) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}
