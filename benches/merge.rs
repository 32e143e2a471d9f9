// benches/merge.rs
use criterion::{criterion_group, criterion_main, Criterion, black_box};

use parakh_scrape::{
    config::Taxonomy,
    ingest, merge,
    normalize::Normalizer,
};

// Synthetic batch: every state of group 1, three stages, a few charts each,
// one district series per chart.
fn synthetic_batch() -> String {
    let taxonomy = Taxonomy::default();
    let codes = [("Foundational Stage", "C-8.1"), ("Preparatory Stage", "C-3.1"), ("Middle Stage", "C-3.2")];
    let mut entries = Vec::new();

    for st in taxonomy.group(1).map(|s| s.to_vec()).unwrap_or_default() {
        for (stage, code) in codes {
            let points: Vec<String> = (0..40)
                .map(|d| format!(r#"{{"name":"District {d}","y":{}}}"#, 30.0 + (d as f64) * 1.25))
                .collect();
            entries.push(format!(
                r#"{{"state":"{}","stage":"{stage}","charts":[
                    {{"title":"All competencies at a glance","series":[]}},
                    {{"title":"{code} Understands things","series":[
                        {{"name":"MSSC","data":[{{"name":"India","y":50}},{{"name":"{}","y":51}}]}},
                        {{"name":"MSSC","data":[{}]}}
                    ]}}
                ]}}"#,
                st.name, st.name, points.join(",")
            ));
        }
    }
    format!("[{}]", entries.join(","))
}

fn bench_pipeline(c: &mut Criterion) {
    let taxonomy = Taxonomy::default();
    let text = synthetic_batch();
    let batch = ingest::parse_batch(&text).expect("synthetic batch parses");
    let normalizer = Normalizer::new(&taxonomy);

    c.bench_function("parse_batch", |b| {
        b.iter(|| {
            let batch = ingest::parse_batch(black_box(&text)).expect("parse");
            black_box(batch.entries.len())
        })
    });

    c.bench_function("normalize_batch", |b| {
        b.iter(|| {
            let out = normalizer.normalize_batch(black_box(&batch.entries));
            black_box(out.rows.len())
        })
    });

    let rows = normalizer.normalize_batch(&batch.entries).rows;
    c.bench_function("merge_two_batches", |b| {
        b.iter(|| {
            let out = merge::merge(vec![black_box(rows.clone()), black_box(rows.clone())]);
            black_box(out.rows.len())
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
