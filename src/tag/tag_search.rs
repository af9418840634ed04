use crate::repository::ToolRepository;
use crate::tools::{Tool, ToolSearchStrategy};
use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// Scores tools by tag hits and description keyword overlap.
pub struct TagSearchStrategy {
    tool_repository: Arc<dyn ToolRepository>,
    description_weight: f64,
    word_regex: Regex,
}

impl TagSearchStrategy {
    pub fn new(repo: Arc<dyn ToolRepository>, description_weight: f64) -> Result<Self> {
        Ok(Self {
            tool_repository: repo,
            description_weight,
            word_regex: Regex::new(r"\w+")?,
        })
    }

    fn words(&self, text: &str) -> HashSet<String> {
        self.word_regex
            .find_iter(text)
            .map(|m| m.as_str().to_ascii_lowercase())
            .collect()
    }

    fn score_tool(&self, tool: &Tool, query_lower: &str, query_words: &HashSet<String>) -> f64 {
        let mut score = 0.0;

        for tag in &tool.tags {
            let tag_lower = tag.to_ascii_lowercase();
            if query_lower.contains(&tag_lower) {
                score += 1.0;
            }
            score += self
                .words(&tag_lower)
                .iter()
                .filter(|w| query_words.contains(*w))
                .count() as f64
                * self.description_weight;
        }

        for word in self.words(&tool.description) {
            if word.len() > 2 && query_words.contains(&word) {
                score += self.description_weight;
            }
        }

        score
    }
}

struct ScoredTool {
    tool: Tool,
    score: f64,
}

#[async_trait]
impl ToolSearchStrategy for TagSearchStrategy {
    async fn search_tools(&self, query: &str, limit: usize) -> Result<Vec<Tool>> {
        let query_lower = query.trim().to_lowercase();
        let query_words = self.words(&query_lower);

        let (mut positives, mut rest): (Vec<_>, Vec<_>) = self
            .tool_repository
            .get_tools()
            .await?
            .into_iter()
            .map(|tool| {
                let score = self.score_tool(&tool, &query_lower, &query_words);
                ScoredTool { tool, score }
            })
            .partition(|st| st.score > 0.0);

        // Zero-score tools only surface when nothing matched at all.
        let ranked = if positives.is_empty() {
            take_top_n(&mut rest, limit);
            rest
        } else {
            take_top_n(&mut positives, limit);
            positives
        };
        Ok(ranked.into_iter().map(|st| st.tool).collect())
    }
}

fn compare_scored(a: &ScoredTool, b: &ScoredTool) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.tool.name.cmp(&b.tool.name))
}

/// Sort best-first and keep `limit` entries; zero means unbounded.
fn take_top_n(scored: &mut Vec<ScoredTool>, limit: usize) {
    if limit > 0 && scored.len() > limit {
        scored.select_nth_unstable_by(limit - 1, compare_scored);
        scored.truncate(limit);
    }
    scored.sort_unstable_by(compare_scored);
}
