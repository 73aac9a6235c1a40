//! Plain-text rendering for the terminal.

use chrono::{DateTime, Duration, Utc};
use services::analytics::{
    DashboardView, DataStatus, ModuleRollupView, ResultView, ScoreView, TestProgressView, Widget,
};
use services::{SessionState, TestSession};

pub fn duration(elapsed: Duration) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn score(view: &ScoreView) -> String {
    format!("{} [{}]", view.percentage, view.band)
}

pub fn session_state(session: &TestSession) -> String {
    match session.state() {
        SessionState::Loading => "Loading test...".into(),
        SessionState::Answering => "Answering".into(),
        SessionState::Submitting => "Submitting...".into(),
        SessionState::Completed { result_id } => format!("Completed (result {result_id})"),
        SessionState::SubmissionFailed { reason } => format!("Submission failed: {reason}"),
        SessionState::Failed(failure) => {
            format!("Could not open the test: {failure}. Run the command again to retry.")
        }
    }
}

pub fn question(session: &TestSession, now: DateTime<Utc>) {
    let progress = session.progress();
    println!();
    println!(
        "Question {}/{}  answered {}/{}  time {}  ({})",
        progress.cursor + 1,
        progress.total,
        progress.answered,
        progress.total,
        duration(session.elapsed(now)),
        session_state(session),
    );
    let Some(question) = session.current_question() else {
        return;
    };
    let selected = session.current_selection();
    println!("{}", question.prompt());
    for (index, option) in question.options().iter().enumerate() {
        let marker = if selected == Some(index) { '*' } else { ' ' };
        println!(" {marker} {}. {option}", index + 1);
    }
    if progress.all_answered() {
        println!("All questions answered; enter s to submit.");
    }
}

pub fn result(view: &ResultView) {
    println!(
        "Result {}: {}/{} correct, {}  ({})",
        view.result_id,
        view.score,
        view.total_questions,
        score(&view.grade),
        view.completed_at.format("%Y-%m-%d %H:%M"),
    );
    for (index, answer) in view.questions.iter().enumerate() {
        let mark = if answer.is_correct { "ok " } else { "x  " };
        println!("{mark}{}. {}", index + 1, answer.question);
        if !answer.is_correct {
            println!("     yours: {}  correct: {}", answer.selected_text, answer.correct_text);
        }
    }
    if view.mistakes > 0 {
        println!("{} mistake(s) to review.", view.mistakes);
    }
}

pub fn test_progress(view: &TestProgressView) {
    let best = view.best.as_ref().map_or_else(|| "no attempts".into(), score);
    println!("{} ({}): best {best}", view.title, view.test_id);
    for attempt in &view.attempts {
        let flag = if attempt.is_best { " *" } else { "" };
        println!(
            "  {}  {}/{}  {}{flag}",
            attempt.completed_at.format("%Y-%m-%d %H:%M"),
            attempt.score,
            attempt.total_questions,
            score(&attempt.grade),
        );
    }
}

fn module(view: &ModuleRollupView) {
    let reported = match &view.reported {
        Widget::Ready(reported) => format!("backend {}", reported.percentage),
        Widget::NoData { .. } => "backend n/a".into(),
    };
    println!(
        "{} ({}): {}  {reported}",
        view.title,
        view.module_id,
        score(&view.completion)
    );
    for row in &view.tests {
        let badge = row
            .badge
            .map_or_else(String::new, |band| format!(" [{band}]"));
        let note = match &row.status {
            DataStatus::Loaded if row.is_attempted() => String::new(),
            DataStatus::Loaded => "  no attempts".into(),
            DataStatus::Unavailable { .. } => "  no data".into(),
            DataStatus::Invalid { .. } => "  invalid data".into(),
        };
        println!("  {:<32} {}{badge}{note}", row.title, row.percentage);
    }
}

pub fn dashboard(view: &DashboardView) {
    match &view.overall {
        Widget::Ready(overall) => println!(
            "Overall: {} over {} test(s)",
            score(&overall.average),
            overall.tests_taken
        ),
        Widget::NoData { .. } => println!("Overall: no data"),
    }

    match &view.analytics {
        Widget::Ready(analytics) => {
            for topic in &analytics.weak_topics {
                println!(
                    "Weak topic: {} ({} mistakes) - {}",
                    topic.topic, topic.mistakes, topic.recommendation
                );
            }
            for test in &analytics.low_score_tests {
                println!("Low score: {} {}", test.title, score(&test.score));
            }
            for tip in &analytics.recommendations {
                println!("Tip: {tip}");
            }
            if let Some(motivation) = &analytics.motivation {
                println!("{motivation}");
            }
        }
        Widget::NoData { .. } => println!("Analytics: no data"),
    }

    for panel in &view.modules {
        println!();
        match &panel.rollup {
            Widget::Ready(rollup) => module(rollup),
            Widget::NoData { .. } => println!("Module {}: no data", panel.module_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_as_minutes_and_seconds() {
        assert_eq!(duration(Duration::seconds(75)), "01:15");
        assert_eq!(duration(Duration::seconds(-3)), "00:00");
    }
}
