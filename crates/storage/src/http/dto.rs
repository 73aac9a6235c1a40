//! Wire shapes exchanged with the backend.
//!
//! Kept separate from the domain types: these accept whatever the backend
//! sends, and `mapping` decides whether it is valid.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuestionDto {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitResponseDto {
    pub result_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AttemptDto {
    pub result_id: String,
    pub score: i64,
    pub total_questions: i64,
    pub percentage: f64,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<AnswerDetailDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerDetailDto {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub selected_answer: i64,
    #[serde(default)]
    pub selected_text: String,
    pub correct_answer: i64,
    #[serde(default)]
    pub correct_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestProgressDto {
    pub test_title: String,
    #[serde(default)]
    pub attempts: Vec<AttemptDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModuleProgressDto {
    pub progress: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OverallDto {
    pub average_percentage: f64,
    pub tests_taken: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyticsDto {
    #[serde(default)]
    pub weak_topics: Vec<WeakTopicDto>,
    #[serde(default)]
    pub low_score_tests: Vec<LowScoreTestDto>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub motivation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WeakTopicDto {
    pub topic: String,
    pub mistakes: i64,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LowScoreTestDto {
    #[serde(default)]
    pub test_id: Option<String>,
    pub title: String,
    pub percentage: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModuleDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tests: Vec<TestRefDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TestRefDto {
    pub id: String,
    pub title: String,
}
