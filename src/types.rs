use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters kept in a citation excerpt
pub const EXCERPT_MAX_CHARS: usize = 200;

/// Appended to excerpts that were cut at [`EXCERPT_MAX_CHARS`]
pub const TRUNCATION_MARKER: &str = "...";

/// One of the two chunk populations the index is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Forecast,
    Midyear,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Forecast => "forecast",
            Partition::Midyear => "midyear",
        }
    }

    /// Classify a document by its file stem.
    ///
    /// Anything mentioning "mid-year" or "midyear" is the retrospective report;
    /// every other document is treated as the forecast.
    pub fn classify(document_name: &str) -> Self {
        let lower = document_name.to_lowercase();
        if lower.contains("mid-year") || lower.contains("midyear") {
            Partition::Midyear
        } else {
            Partition::Forecast
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which partition(s) a question should be answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PartitionSelection {
    Forecast,
    Midyear,
    Both,
}

impl PartitionSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionSelection::Forecast => "forecast",
            PartitionSelection::Midyear => "midyear",
            PartitionSelection::Both => "both",
        }
    }

    /// Partitions searched for this selection, in merge order.
    pub fn partitions(&self) -> &'static [Partition] {
        match self {
            PartitionSelection::Forecast => &[Partition::Forecast],
            PartitionSelection::Midyear => &[Partition::Midyear],
            PartitionSelection::Both => &[Partition::Forecast, Partition::Midyear],
        }
    }
}

impl fmt::Display for PartitionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieved fragment of source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub document: String,
    /// 1-based page number
    pub page: usize,
    pub partition: Partition,
    /// Distance from the query; lower is closer
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub document: String,
    pub page: usize,
    pub text_excerpt: String,
}

impl Citation {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            document: chunk.document.clone(),
            page: chunk.page,
            text_excerpt: excerpt(&chunk.content),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer_text: String,
    pub citations: Vec<Citation>,
}

/// Verbatim prefix of `content`, at most [`EXCERPT_MAX_CHARS`] characters,
/// with [`TRUNCATION_MARKER`] appended when anything was cut.
pub fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_MAX_CHARS) {
        Some((byte_idx, _)) => format!("{}{}", &content[..byte_idx], TRUNCATION_MARKER),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            document: "outlook-2025".to_string(),
            page: 4,
            partition: Partition::Forecast,
            score: 0.1,
        }
    }

    #[test]
    fn test_excerpt_short_content_is_verbatim() {
        assert_eq!(excerpt("short text"), "short text");
        assert_eq!(excerpt(""), "");
    }

    #[test]
    fn test_excerpt_exactly_at_limit_is_verbatim() {
        let content = "a".repeat(EXCERPT_MAX_CHARS);
        assert_eq!(excerpt(&content), content);
    }

    #[test]
    fn test_excerpt_over_limit_is_truncated_with_marker() {
        let content = "b".repeat(EXCERPT_MAX_CHARS + 1);
        let result = excerpt(&content);
        assert_eq!(result, format!("{}...", "b".repeat(EXCERPT_MAX_CHARS)));
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let content = "é".repeat(250);
        let result = excerpt(&content);
        assert_eq!(result.chars().count(), EXCERPT_MAX_CHARS + TRUNCATION_MARKER.len());
        assert!(result.starts_with(&"é".repeat(EXCERPT_MAX_CHARS)));
    }

    #[test]
    fn test_citation_from_chunk() {
        let citation = Citation::from_chunk(&chunk("Equities should lead."));
        assert_eq!(citation.document, "outlook-2025");
        assert_eq!(citation.page, 4);
        assert_eq!(citation.text_excerpt, "Equities should lead.");
    }

    #[test]
    fn test_classify_partition() {
        assert_eq!(Partition::classify("mid-year-outlook-2025"), Partition::Midyear);
        assert_eq!(Partition::classify("MidYear_Review"), Partition::Midyear);
        assert_eq!(Partition::classify("outlook-2025"), Partition::Forecast);
    }

    #[test]
    fn test_selection_serializes_lowercase() {
        let json = serde_json::to_string(&PartitionSelection::Both).unwrap();
        assert_eq!(json, "\"both\"");
        let parsed: PartitionSelection = serde_json::from_str("\"midyear\"").unwrap();
        assert_eq!(parsed, PartitionSelection::Midyear);
        assert!(serde_json::from_str::<PartitionSelection>("\"neither\"").is_err());
    }

    #[test]
    fn test_selection_schema_is_plain_string_enum() {
        let schema = schemars::schema_for!(PartitionSelection).to_value();
        assert_eq!(schema["type"], "string");
        assert_eq!(schema["enum"], serde_json::json!(["forecast", "midyear", "both"]));
        assert!(schema.get("oneOf").is_none());
    }

    #[test]
    fn test_selection_partitions_merge_order() {
        assert_eq!(
            PartitionSelection::Both.partitions(),
            &[Partition::Forecast, Partition::Midyear]
        );
        assert_eq!(PartitionSelection::Midyear.partitions(), &[Partition::Midyear]);
    }
}
