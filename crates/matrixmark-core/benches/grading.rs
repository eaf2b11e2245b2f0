use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;

use matrixmark_core::grading::{correct_response, grade_response};
use matrixmark_core::model::{Cell, Col, GradingMethod, MatrixQuestion, Response, Row};

fn make_question(method: GradingMethod, rows: u32, cols: u32) -> MatrixQuestion {
    let mut cells = HashMap::new();
    for row in 0..rows {
        for col in 0..cols {
            let cell = match method {
                GradingMethod::Weighted => {
                    Cell::Weight(if col == 0 { 100.0 } else { -25.0 })
                }
                _ => Cell::Correct(col == 0),
            };
            cells.insert((row, col), cell);
        }
    }
    MatrixQuestion {
        id: "bench".into(),
        name: "Bench question".into(),
        description: String::new(),
        method,
        multiple: true,
        default_grade: 1.0,
        rows: (0..rows)
            .map(|id| Row {
                id,
                short_text: format!("Row {id}"),
                description: None,
                feedback: None,
                order: id,
            })
            .collect(),
        cols: (0..cols)
            .map(|id| Col {
                id,
                short_text: format!("Col {id}"),
                description: None,
                order: id,
            })
            .collect(),
        cells,
    }
}

fn make_response(rows: u32, cols: u32) -> Response {
    let mut r = Response::new();
    for row in 0..rows {
        r.select(row, 0);
        r.select(row, (row % cols).max(1));
    }
    r
}

fn bench_grade_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade_response");

    for method in [
        GradingMethod::Any,
        GradingMethod::All,
        GradingMethod::Kprime,
        GradingMethod::Weighted,
    ] {
        let question = make_question(method, 10, 4);
        let response = make_response(10, 4);
        group.bench_function(format!("{method}/10x4"), |b| {
            b.iter(|| grade_response(black_box(&question), black_box(&response)))
        });
    }

    let large = make_question(GradingMethod::Kprime, 100, 8);
    let response = make_response(100, 8);
    group.bench_function("kprime/100x8", |b| {
        b.iter(|| grade_response(black_box(&large), black_box(&response)))
    });

    group.finish();
}

fn bench_correct_response(c: &mut Criterion) {
    let question = make_question(GradingMethod::All, 50, 4);
    c.bench_function("correct_response/50x4", |b| {
        b.iter(|| correct_response(black_box(&question)).unwrap())
    });
}

criterion_group!(benches, bench_grade_response, bench_correct_response);
criterion_main!(benches);
