use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use assessor_core::answer::{Answer, AnswerRecord};
use assessor_core::evaluator::evaluate;
use assessor_core::model::{Difficulty, Question, QuestionKind};
use assessor_core::scoring::aggregate;

fn make_question(i: usize) -> Question {
    let kind = match i % 3 {
        0 => QuestionKind::MultipleSelect {
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct: vec!["a".into(), "c".into()],
        },
        1 => QuestionKind::ShortAnswer {
            accepted: vec!["ownership".into(), "the owner".into()],
        },
        _ => QuestionKind::Slider {
            min: 0.0,
            max: 100.0,
            target: Some(50.0),
        },
    };
    let difficulty = match i % 3 {
        0 => Difficulty::Easy,
        1 => Difficulty::Medium,
        _ => Difficulty::Hard,
    };
    Question {
        id: format!("q{i}"),
        prompt: String::new(),
        kind,
        points: (i % 4 + 1) as u32,
        difficulty,
        topic: format!("topic{}", i % 8),
        time_limit_seconds: None,
        hints: vec![],
    }
}

fn make_answer(i: usize) -> Answer {
    match i % 3 {
        0 => Answer::Selection(["c".to_string(), "a".to_string()].into_iter().collect()),
        1 => Answer::Text("  The   Owner ".into()),
        _ => Answer::Number(52.5),
    }
}

fn make_session(n: usize) -> (Vec<Question>, HashMap<String, AnswerRecord>) {
    let questions: Vec<Question> = (0..n).map(make_question).collect();
    let answers = questions
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 5 != 0)
        .map(|(i, q)| {
            let answer = make_answer(i);
            let grade = evaluate(q, Some(&answer));
            let record = AnswerRecord {
                question_id: q.id.clone(),
                answer,
                grade,
                points_awarded: if grade.is_correct() { q.points } else { 0 },
                confidence: Some(3),
                hints_used: 0,
                time_spent_seconds: (i % 60) as u64,
                sealed: true,
            };
            (q.id.clone(), record)
        })
        .collect();
    (questions, answers)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for i in 0..3 {
        let question = make_question(i);
        let answer = make_answer(i);
        group.bench_function(question.type_name().to_string(), |b| {
            b.iter(|| evaluate(black_box(&question), black_box(Some(&answer))))
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for n in [10, 100, 1000] {
        let (questions, answers) = make_session(n);
        group.bench_function(format!("{n}_questions"), |b| {
            b.iter(|| aggregate(black_box(&questions), black_box(&answers), black_box(600)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_aggregate);
criterion_main!(benches);
