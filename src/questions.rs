//! The predefined question set run by `reportlens analyze`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub title: &'static str,
    pub question: &'static str,
}

pub const QUESTIONS: &[Question] = &[
    Question {
        id: "Q1",
        title: "Forecasted Equity Themes",
        question: "According to the Outlook 2025 (the forecast document):
1. Which equity market themes were expected to perform well in 2025?
2. Which specific stocks or groups of stocks (e.g., Apple, Microsoft, Magnificent 7, AI-related equities) were highlighted as investment opportunities or focal points?

Please provide specific names and details with page citations.",
    },
    Question {
        id: "Q2",
        title: "Mid-Year Reality Check",
        question: "According to the Mid-Year Outlook 2025:
1. Which forecasted themes from the 2025 Outlook played out as expected?
2. Which themes or expectations underperformed or disappointed?

Please be specific about what was expected vs what actually happened, with page citations.",
    },
    Question {
        id: "Q3",
        title: "Stock-Level Comparison",
        question: "Identify at least two named stocks (such as Apple, Microsoft, NVIDIA, or other major companies) and for each:
1. What was implied or stated about them in the 2025 forecast (Outlook 2025)?
2. How is their performance or outlook described at mid-year 2025?

Focus on specific company names mentioned in both documents. Provide citations for each claim.",
    },
    Question {
        id: "Q4",
        title: "Valuation and Risk",
        question: "Answer the following:
1. What valuation concerns or risk factors were highlighted at the start of 2025 in the Outlook 2025 document?
2. Which of those specific risks materialized by mid-year 2025, according to the Mid-Year Outlook?
3. Were there any new risks that emerged that weren't anticipated in the original forecast?

Provide specific details and citations from both documents.",
    },
    Question {
        id: "Q5",
        title: "Structured Comparison Table",
        question: "Create a comprehensive comparison of stocks and investment themes between the 2025 Forecast and Mid-Year Reality.

For each stock or theme you can identify in both documents, provide:
- Stock/Theme name
- What the 2025 Forecast said (predictions, expectations)
- What the Mid-Year 2025 shows (actual results, current outlook)
- Whether the forecast was supported (Yes/No/Partially)
- Citations from both documents

Focus on: individual stocks (Apple, Microsoft, NVIDIA, etc.), the Magnificent 7, AI investments, sector allocations, and any other major themes discussed in both documents.",
    },
];

/// Questions whose id appears in `only` (case-insensitive), in set order.
/// An empty filter selects everything; unknown ids are returned as the error.
pub fn select(only: &[String]) -> Result<Vec<&'static Question>, Vec<String>> {
    if only.is_empty() {
        return Ok(QUESTIONS.iter().collect());
    }

    let unknown: Vec<String> = only
        .iter()
        .filter(|id| !QUESTIONS.iter().any(|q| q.id.eq_ignore_ascii_case(id)))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(unknown);
    }

    Ok(QUESTIONS
        .iter()
        .filter(|q| only.iter().any(|id| q.id.eq_ignore_ascii_case(id)))
        .collect())
}
