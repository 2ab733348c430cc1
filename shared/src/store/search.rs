//! Full-text match queries over the documents of a search index.
//!
//! Text is analyzed by lowercasing and splitting on anything that is not
//! alphanumeric. A query term matches an indexed term when their Levenshtein
//! distance is within the query's fuzziness.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{StoreError, StoreResult};
use super::Document;

/// Largest edit distance a match query may ask for.
pub const MAX_FUZZINESS: u8 = 2;

/// Hits returned when the query does not set a limit.
pub const DEFAULT_LIMIT: usize = 10;

/// Which documents an index covers and which of their fields are searchable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexDefinition {
    pub name: String,
    /// Only documents whose `type` equals this value are indexed.
    pub doc_type: Option<String>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    Html,
    Ansi,
}

impl HighlightStyle {
    fn wrap(self, term: &str) -> String {
        match self {
            HighlightStyle::Html => format!("<mark>{}</mark>", self.text(term)),
            HighlightStyle::Ansi => format!("\u{1b}[43m{}\u{1b}[0m", term),
        }
    }

    /// Unhighlighted text; HTML output escapes everything outside the marks.
    fn text(self, text: &str) -> String {
        match self {
            HighlightStyle::Html => ammonia::clean_text(text),
            HighlightStyle::Ansi => text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchQuery {
    #[serde(rename = "match")]
    pub text: String,
    pub fuzziness: u8,
}

impl MatchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fuzziness: 0,
        }
    }

    pub fn fuzziness(mut self, fuzziness: u8) -> Self {
        self.fuzziness = fuzziness;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub style: HighlightStyle,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub index: String,
    pub query: MatchQuery,
    /// Stored fields returned with every hit.
    pub fields: Vec<String>,
    pub highlight: Option<Highlight>,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(index: impl Into<String>, query: MatchQuery) -> Self {
        Self {
            index: index.into(),
            query,
            fields: Vec::new(),
            highlight: None,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn highlight<I, S>(mut self, style: HighlightStyle, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight = Some(Highlight {
            style,
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStatus {
    pub total: u32,
    pub failed: u32,
    pub successful: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub index: String,
    pub id: String,
    pub score: f64,
    pub fragments: BTreeMap<String, Vec<String>>,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub status: SearchStatus,
    pub hits: Vec<SearchHit>,
    pub total_hits: usize,
    pub max_score: f64,
    /// Evaluation time in nanoseconds.
    pub took: u64,
}

/// Evaluate `query` against the candidate `documents` of `index`.
pub fn execute(
    index: &SearchIndexDefinition,
    query: &SearchQuery,
    documents: &[Document],
) -> StoreResult<SearchResults> {
    let started = Instant::now();

    if query.index != index.name {
        return Err(StoreError::SearchIndexNotFound(query.index.clone()));
    }
    if query.query.fuzziness > MAX_FUZZINESS {
        return Err(StoreError::Search(format!(
            "fuzziness must be between 0 and {}",
            MAX_FUZZINESS
        )));
    }

    let terms = analyze(&query.query.text);
    if terms.is_empty() {
        return Err(StoreError::Search(format!(
            "no searchable terms in `{}`",
            query.query.text
        )));
    }
    let fuzziness = usize::from(query.query.fuzziness);

    let mut hits: Vec<SearchHit> = documents
        .iter()
        .filter(|document| covers(index, document))
        .filter_map(|document| {
            let score = score_document(index, document, &terms, fuzziness);
            (score > 0.0).then(|| SearchHit {
                index: index.name.clone(),
                id: document.id.clone(),
                score,
                fragments: fragments(query, document, &terms, fuzziness),
                fields: stored_fields(&query.fields, document),
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let total_hits = hits.len();
    let max_score = hits.first().map(|hit| hit.score).unwrap_or(0.0);
    hits.truncate(query.limit);

    Ok(SearchResults {
        status: SearchStatus {
            total: 1,
            failed: 0,
            successful: 1,
        },
        hits,
        total_hits,
        max_score,
        took: started.elapsed().as_nanos() as u64,
    })
}

fn covers(index: &SearchIndexDefinition, document: &Document) -> bool {
    match &index.doc_type {
        Some(doc_type) => document.content.get("type").and_then(Value::as_str) == Some(doc_type),
        None => true,
    }
}

fn score_document(
    index: &SearchIndexDefinition,
    document: &Document,
    terms: &[String],
    fuzziness: usize,
) -> f64 {
    let mut score = 0.0;
    for field in &index.fields {
        for text in texts_at(&document.content, field) {
            for token in analyze(text) {
                if let Some(distance) = best_distance(terms, &token, fuzziness) {
                    score += 1.0 / (1.0 + distance as f64);
                }
            }
        }
    }
    score
}

fn fragments(
    query: &SearchQuery,
    document: &Document,
    terms: &[String],
    fuzziness: usize,
) -> BTreeMap<String, Vec<String>> {
    let mut fragments = BTreeMap::new();
    let Some(highlight) = &query.highlight else {
        return fragments;
    };

    for field in &highlight.fields {
        let highlighted: Vec<String> = texts_at(&document.content, field)
            .into_iter()
            .filter_map(|text| highlight_text(text, terms, fuzziness, highlight.style))
            .collect();
        if !highlighted.is_empty() {
            fragments.insert(field.clone(), highlighted);
        }
    }
    fragments
}

fn stored_fields(fields: &[String], document: &Document) -> Map<String, Value> {
    let mut stored = Map::new();
    for field in fields {
        let mut values = values_at(&document.content, field);
        match values.len() {
            0 => {}
            1 => {
                stored.insert(field.clone(), values.remove(0).clone());
            }
            _ => {
                stored.insert(
                    field.clone(),
                    Value::Array(values.into_iter().cloned().collect()),
                );
            }
        }
    }
    stored
}

/// Wrap every matching word of `text`; `None` when nothing matches.
fn highlight_text(
    text: &str,
    terms: &[String],
    fuzziness: usize,
    style: HighlightStyle,
) -> Option<String> {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    let mut matched = false;

    for (start, end) in token_spans(text) {
        let word = &text[start..end];
        if best_distance(terms, &word.to_lowercase(), fuzziness).is_some() {
            output.push_str(&style.text(&text[last..start]));
            output.push_str(&style.wrap(word));
            last = end;
            matched = true;
        }
    }

    if !matched {
        return None;
    }
    output.push_str(&style.text(&text[last..]));
    Some(output)
}

fn best_distance(terms: &[String], token: &str, fuzziness: usize) -> Option<usize> {
    terms
        .iter()
        .map(|term| strsim::levenshtein(term, token))
        .filter(|distance| *distance <= fuzziness)
        .min()
}

/// Lowercased terms of `text`.
pub fn analyze(text: &str) -> Vec<String> {
    token_spans(text)
        .into_iter()
        .map(|(start, end)| text[start..end].to_lowercase())
        .collect()
}

fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (offset, ch) in text.char_indices() {
        match (ch.is_alphanumeric(), start) {
            (true, None) => start = Some(offset),
            (false, Some(begin)) => {
                spans.push((begin, offset));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        spans.push((begin, text.len()));
    }
    spans
}

/// Values reachable through a dotted path; arrays along the way are flattened.
fn values_at<'a>(value: &'a Value, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();
    collect_values(value, &segments, &mut out);
    out
}

fn collect_values<'a>(value: &'a Value, segments: &[&str], out: &mut Vec<&'a Value>) {
    if let Value::Array(items) = value {
        for item in items {
            collect_values(item, segments, out);
        }
        return;
    }
    match segments.split_first() {
        None => out.push(value),
        Some((head, rest)) => {
            if let Some(child) = value.get(*head) {
                collect_values(child, rest, out);
            }
        }
    }
}

fn texts_at<'a>(value: &'a Value, path: &str) -> Vec<&'a str> {
    values_at(value, path)
        .into_iter()
        .filter_map(Value::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn index() -> SearchIndexDefinition {
        SearchIndexDefinition {
            name: "medical-condition".to_string(),
            doc_type: Some("patient".to_string()),
            fields: vec!["notes.message".to_string()],
        }
    }

    fn patient(id: &str, firstname: &str, notes: &[&str]) -> Document {
        let notes: Vec<Value> = notes
            .iter()
            .map(|message| json!({ "doctor": "d1", "message": message }))
            .collect();
        Document {
            id: id.to_string(),
            cas: 1,
            content: json!({
                "type": "patient",
                "information": { "firstname": firstname, "lastname": "Smith" },
                "notes": notes,
            }),
        }
    }

    fn condition_query(text: &str) -> SearchQuery {
        SearchQuery::new("medical-condition", MatchQuery::new(text))
            .fields(["information.firstname", "information.lastname", "notes.message"])
            .highlight(HighlightStyle::Html, ["notes.message"])
    }

    #[test]
    fn test_analyze_splits_and_lowercases() {
        assert_eq!(
            analyze("Severe COUGH, mild-fever!"),
            vec!["severe", "cough", "mild", "fever"]
        );
        assert!(analyze(" ,.; ").is_empty());
    }

    #[test]
    fn test_match_returns_highlighted_fragments() {
        let documents = vec![
            patient("p1", "Alice", &["Patient has a persistent cough", "Follow up in a week"]),
            patient("p2", "Bob", &["Broken wrist"]),
        ];

        let results = execute(&index(), &condition_query("cough"), &documents).unwrap();

        assert_eq!(results.total_hits, 1);
        let hit = &results.hits[0];
        assert_eq!(hit.id, "p1");
        assert_eq!(
            hit.fragments["notes.message"],
            vec!["Patient&#32;has&#32;a&#32;persistent&#32;<mark>cough</mark>".to_string()]
        );
        assert_eq!(hit.fields["information.firstname"], json!("Alice"));
        assert_eq!(
            hit.fields["notes.message"],
            json!(["Patient has a persistent cough", "Follow up in a week"])
        );
    }

    #[test]
    fn test_fuzziness_allows_edit_distance() {
        let documents = vec![patient("p1", "Alice", &["Chronic migraine"])];

        let exact = execute(&index(), &condition_query("migrane"), &documents).unwrap();
        assert_eq!(exact.total_hits, 0);

        let mut fuzzy_query = condition_query("migrane");
        fuzzy_query.query = MatchQuery::new("migrane").fuzziness(1);
        let fuzzy = execute(&index(), &fuzzy_query, &documents).unwrap();
        assert_eq!(fuzzy.total_hits, 1);
        assert_eq!(
            fuzzy.hits[0].fragments["notes.message"],
            vec!["Chronic&#32;<mark>migraine</mark>".to_string()]
        );
    }

    #[test]
    fn test_hits_ordered_by_score_then_id() {
        let documents = vec![
            patient("p3", "Carol", &["fever"]),
            patient("p1", "Alice", &["fever", "fever returned"]),
            patient("p2", "Bob", &["fever"]),
        ];

        let results = execute(&index(), &condition_query("fever"), &documents).unwrap();
        let ids: Vec<&str> = results.hits.iter().map(|hit| hit.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
        assert_eq!(results.max_score, results.hits[0].score);
    }

    #[test]
    fn test_other_document_types_are_not_indexed() {
        let doctor = Document {
            id: "d1".to_string(),
            cas: 1,
            content: json!({ "type": "doctor", "notes": [{ "message": "cough clinic" }] }),
        };

        let results = execute(&index(), &condition_query("cough"), &[doctor]).unwrap();
        assert_eq!(results.total_hits, 0);
    }

    #[test]
    fn test_limit_keeps_total_hits() {
        let documents = vec![
            patient("p1", "Alice", &["rash"]),
            patient("p2", "Bob", &["rash"]),
            patient("p3", "Carol", &["rash"]),
        ];

        let results = execute(&index(), &condition_query("rash").limit(2), &documents).unwrap();
        assert_eq!(results.total_hits, 3);
        assert_eq!(results.hits.len(), 2);
    }

    #[test]
    fn test_rejects_bad_queries() {
        let err = execute(&index(), &condition_query("!!!"), &[]).unwrap_err();
        assert!(matches!(err, StoreError::Search(_)));

        let mut query = condition_query("cough");
        query.query = query.query.fuzziness(3);
        let err = execute(&index(), &query, &[]).unwrap_err();
        assert!(matches!(err, StoreError::Search(_)));

        let query = SearchQuery::new("unknown", MatchQuery::new("cough"));
        let err = execute(&index(), &query, &[]).unwrap_err();
        assert!(matches!(err, StoreError::SearchIndexNotFound(_)));
    }

    #[test]
    fn test_html_highlight_escapes_surrounding_text() {
        let terms = ["cough".to_string()];
        let fragment = highlight_text(
            "<script>alert(1)</script> cough & \"wheeze\"",
            &terms,
            0,
            HighlightStyle::Html,
        )
        .unwrap();

        assert_eq!(
            fragment,
            "&lt;script&gt;alert(1)&lt;&#47;script&gt;&#32;\
             <mark>cough</mark>&#32;&amp;&#32;&quot;wheeze&quot;"
        );
    }

    #[test]
    fn test_ansi_highlight() {
        let terms = ["cough".to_string()];
        let fragment = highlight_text("Dry <Cough>", &terms, 0, HighlightStyle::Ansi);
        assert_eq!(fragment.as_deref(), Some("Dry <\u{1b}[43mCough\u{1b}[0m>"));
        assert_eq!(
            highlight_text("nothing here", &["cough".to_string()], 0, HighlightStyle::Html),
            None
        );
    }
}
