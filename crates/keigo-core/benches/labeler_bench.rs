use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keigo_core::label::HeuristicLabeler;
use keigo_core::text::TextCleaner;

fn bench_heuristic_label(c: &mut Criterion) {
    let labeler = HeuristicLabeler::new().unwrap();

    let inputs = vec![
        "ありがとうございます",
        "お前じゃん",
        "えーっとですね、それはちょっと",
        "そうなのかもしれない",
        "全然関係ない文",
    ];

    c.bench_function("heuristic_label_single", |b| {
        b.iter(|| labeler.label(black_box(inputs[0])));
    });

    c.bench_function("heuristic_label_batch_5", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = labeler.label(black_box(input));
            }
        });
    });
}

fn bench_clean(c: &mut Criterion) {
    let cleaner = TextCleaner::new().unwrap();
    let line = "《ナレーション》♪そう\u{3000}ですね… (laugh) ABC 123";

    c.bench_function("clean_single_line", |b| {
        b.iter(|| cleaner.clean(black_box(line)));
    });
}

criterion_group!(benches, bench_heuristic_label, bench_clean);
criterion_main!(benches);
