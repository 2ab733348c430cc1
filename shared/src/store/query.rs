use serde::Serialize;

/// A statement run against a bucket.
///
/// The statement selects a single JSONB column named `row`; each row comes
/// back as one JSON value. Placeholders `$1..$n` bind `params` in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryStatement {
    pub statement: String,
    pub params: Vec<String>,
}

impl QueryStatement {
    pub fn parameterized<I, S>(statement: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statement: statement.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}
