use quiz_core::model::{
    AnalyticsReport, AnswerDetail, AttemptRecord, AttemptRecordError, LowScoreTest, ModuleId,
    ModuleOutline, OverallStats, Percentage, Question, QuestionId, ResultId, TestDefinition,
    TestId, TestProgressSummary, TestRef, WeakTopic,
};

use super::dto::{
    AnalyticsDto, AnswerDetailDto, AttemptDto, ModuleDto, OverallDto, TestDto, TestProgressDto,
};
use crate::repository::StorageError;

fn count(field: &'static str, v: i64) -> Result<u32, AttemptRecordError> {
    u32::try_from(v).map_err(|_| AttemptRecordError::FieldOutOfRange { field, value: v })
}

fn index(field: &'static str, v: i64) -> Result<usize, AttemptRecordError> {
    usize::try_from(v).map_err(|_| AttemptRecordError::FieldOutOfRange { field, value: v })
}

fn non_blank(field: &'static str, v: String) -> Result<String, StorageError> {
    if v.trim().is_empty() {
        return Err(StorageError::Serialization(format!("{field} is blank")));
    }
    Ok(v)
}

pub(crate) fn map_test(dto: TestDto) -> Result<TestDefinition, StorageError> {
    let questions = dto
        .questions
        .into_iter()
        .map(|q| {
            let id = QuestionId::new(non_blank("question id", q.id)?);
            Ok(Question::new(id, q.question, q.options)?)
        })
        .collect::<Result<Vec<_>, StorageError>>()?;
    let id = TestId::new(non_blank("test id", dto.id)?);
    Ok(TestDefinition::new(id, dto.title, questions)?)
}

pub(crate) fn map_result_id(raw: String) -> Result<ResultId, StorageError> {
    if raw.trim().is_empty() {
        return Err(AttemptRecordError::Missing("result id").into());
    }
    Ok(ResultId::new(raw))
}

fn map_answer(dto: AnswerDetailDto) -> Result<AnswerDetail, AttemptRecordError> {
    Ok(AnswerDetail {
        question: dto.question,
        options: dto.options,
        selected_index: index("selectedAnswer", dto.selected_answer)?,
        selected_text: dto.selected_text,
        correct_index: index("correctAnswer", dto.correct_answer)?,
        correct_text: dto.correct_text,
        is_correct: dto.is_correct,
    })
}

pub(crate) fn map_attempt(dto: AttemptDto) -> Result<AttemptRecord, StorageError> {
    let result_id = map_result_id(dto.result_id)?;
    let score = count("score", dto.score)?;
    let total = count("totalQuestions", dto.total_questions)?;
    let answers = dto
        .answers
        .into_iter()
        .map(map_answer)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AttemptRecord::new(
        result_id,
        score,
        total,
        dto.percentage,
        dto.completed_at,
        answers,
    )?)
}

pub(crate) fn map_progress(dto: TestProgressDto) -> Result<TestProgressSummary, StorageError> {
    let attempts = dto
        .attempts
        .into_iter()
        .map(map_attempt)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TestProgressSummary::new(dto.test_title, attempts))
}

pub(crate) fn map_overall(dto: OverallDto) -> Result<OverallStats, StorageError> {
    let tests_taken = u32::try_from(dto.tests_taken).map_err(|_| {
        StorageError::Serialization(format!("invalid testsTaken: {}", dto.tests_taken))
    })?;
    Ok(OverallStats {
        average: Percentage::new(dto.average_percentage)?,
        tests_taken,
    })
}

pub(crate) fn map_analytics(dto: AnalyticsDto) -> Result<AnalyticsReport, StorageError> {
    let weak_topics = dto
        .weak_topics
        .into_iter()
        .map(|t| {
            let mistakes = u32::try_from(t.mistakes).map_err(|_| {
                StorageError::Serialization(format!("invalid mistakes count: {}", t.mistakes))
            })?;
            Ok(WeakTopic {
                topic: t.topic,
                mistakes,
                recommendation: t.recommendation,
            })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;
    let low_score_tests = dto
        .low_score_tests
        .into_iter()
        .map(|t| {
            Ok(LowScoreTest {
                test_id: t.test_id.filter(|id| !id.trim().is_empty()).map(TestId::new),
                title: t.title,
                percentage: Percentage::new(t.percentage)?,
            })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;
    Ok(AnalyticsReport {
        weak_topics,
        low_score_tests,
        recommendations: dto.recommendations,
        motivation: dto.motivation.filter(|m| !m.trim().is_empty()),
    })
}

pub(crate) fn map_module(dto: ModuleDto) -> Result<ModuleOutline, StorageError> {
    let tests = dto
        .tests
        .into_iter()
        .map(|t| {
            Ok(TestRef {
                id: TestId::new(non_blank("test id", t.id)?),
                title: t.title,
            })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;
    Ok(ModuleOutline {
        id: ModuleId::new(non_blank("module id", dto.id)?),
        title: dto.title,
        tests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{PercentageError, TestDefinitionError};
    use serde_json::json;

    fn attempt_json(percentage: f64) -> serde_json::Value {
        json!({
            "resultId": "r1",
            "score": 2,
            "totalQuestions": 3,
            "percentage": percentage,
            "completedAt": "2024-03-01T10:00:00Z",
            "answers": [{
                "question": "Capital of France?",
                "options": ["Paris", "Rome"],
                "selectedAnswer": 0,
                "selectedText": "Paris",
                "correctAnswer": 0,
                "correctText": "Paris",
                "isCorrect": true
            }]
        })
    }

    #[test]
    fn maps_valid_attempt() {
        let dto: AttemptDto = serde_json::from_value(attempt_json(67.0)).unwrap();
        let record = map_attempt(dto).unwrap();
        assert_eq!(record.result_id().as_str(), "r1");
        assert_eq!(record.score(), 2);
        assert_eq!(record.answers()[0].selected_text, "Paris");
    }

    #[test]
    fn out_of_range_percentage_is_invalid_record() {
        let dto: AttemptDto = serde_json::from_value(attempt_json(140.0)).unwrap();
        let err = map_attempt(dto).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidRecord(AttemptRecordError::Percentage(
                PercentageError::OutOfRange { .. }
            ))
        ));
    }

    #[test]
    fn negative_totals_are_invalid_record() {
        let mut value = attempt_json(50.0);
        value["totalQuestions"] = json!(-3);
        let dto: AttemptDto = serde_json::from_value(value).unwrap();
        let err = map_attempt(dto).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidRecord(AttemptRecordError::FieldOutOfRange {
                field: "totalQuestions",
                value: -3
            })
        ));
    }

    #[test]
    fn empty_test_is_rejected_at_boundary() {
        let dto: TestDto =
            serde_json::from_value(json!({ "id": "t1", "title": "Empty", "questions": [] }))
                .unwrap();
        let err = map_test(dto).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidTest(TestDefinitionError::NoQuestions)
        ));
    }

    #[test]
    fn maps_test_definition_in_order() {
        let dto: TestDto = serde_json::from_value(json!({
            "id": "t1",
            "title": "Geography",
            "questions": [
                { "id": "q1", "question": "A?", "options": ["x", "y"] },
                { "id": "q2", "question": "B?", "options": ["x", "y", "z"] }
            ]
        }))
        .unwrap();
        let test = map_test(dto).unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(test.question_at(1).map(|q| q.options().len()), Some(3));
    }

    #[test]
    fn analytics_validates_low_score_percentages() {
        let dto: AnalyticsDto = serde_json::from_value(json!({
            "weakTopics": [{ "topic": "Fractions", "mistakes": 4, "recommendation": "Practice" }],
            "lowScoreTests": [{ "testId": "t2", "title": "Algebra", "percentage": 35 }],
            "recommendations": ["Review chapter 2"],
            "motivation": ""
        }))
        .unwrap();
        let report = map_analytics(dto).unwrap();
        assert_eq!(report.weak_topics[0].mistakes, 4);
        assert_eq!(report.low_score_tests[0].test_id, Some(TestId::new("t2")));
        assert!(report.motivation.is_none());

        let bad: AnalyticsDto = serde_json::from_value(json!({
            "lowScoreTests": [{ "title": "Algebra", "percentage": -5 }]
        }))
        .unwrap();
        assert!(matches!(
            map_analytics(bad),
            Err(StorageError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn overall_rejects_negative_count() {
        let dto: OverallDto =
            serde_json::from_value(json!({ "averagePercentage": 72.5, "testsTaken": -1 }))
                .unwrap();
        assert!(matches!(map_overall(dto), Err(StorageError::Serialization(_))));
    }
}
