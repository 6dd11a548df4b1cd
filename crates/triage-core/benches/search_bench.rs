//! Triage Core Benchmarks
//!
//! Benchmarks for the pure, allocation-free parts of the classification
//! pipeline: symptom/age extraction (C4), graph scoring (C3), cosine
//! similarity, and HNSW index add/search with synthetic vectors (no
//! embedding-model download needed).
//!
//! Run with: cargo bench -p triage-core

use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use triage_core::embeddings::local::cosine_similarity;
use triage_core::extract::{extract_age, extract_symptoms};
use triage_core::graph::ReasoningGraph;
use triage_core::search::vector::VectorIndex;

fn bench_extract_symptoms(c: &mut Criterion) {
    let texts = [
        "My grandfather collapsed and isn't breathing",
        "Someone is choking on food, hands on throat, turning blue",
        "chest pain and sweating radiating to my arm",
        "she felt lightheaded and passed out after standing up",
    ];

    c.bench_function("extract_symptoms", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(extract_symptoms(text));
            }
        })
    });
}

fn bench_extract_age(c: &mut Criterion) {
    let texts = [
        "my 80-year-old grandmother fainted",
        "the toddler swallowed some pills",
        "an adult male collapsed at the gym",
        "they feel kinda off",
    ];

    c.bench_function("extract_age", |b| {
        b.iter(|| {
            for text in &texts {
                black_box(extract_age(text));
            }
        })
    });
}

fn bench_graph_match_by_symptoms(c: &mut Criterion) {
    let graph = ReasoningGraph::build().unwrap();
    let symptoms: HashSet<String> = ["chest_pain", "sweating", "shortness_of_breath"]
        .into_iter()
        .map(String::from)
        .collect();

    c.bench_function("graph_match_by_symptoms", |b| {
        b.iter(|| {
            black_box(graph.match_by_symptoms(&symptoms));
        })
    });
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let a: Vec<f32> = (0..384).map(|i| (i as f32).sin()).collect();
    let b: Vec<f32> = (0..384).map(|i| (i as f32).cos()).collect();

    c.bench_function("cosine_similarity_384d", |bench| {
        bench.iter(|| {
            black_box(cosine_similarity(&a, &b));
        })
    });
}

fn bench_vector_index_search(c: &mut Criterion) {
    let mut index = VectorIndex::new().unwrap();
    index.reserve(1000).unwrap();
    for i in 0..500 {
        let vector: Vec<f32> = (0..384).map(|j| ((i * 384 + j) as f32).sin()).collect();
        index.add(&i.to_string(), &vector).unwrap();
    }
    let query: Vec<f32> = (0..384).map(|j| (j as f32).cos()).collect();

    c.bench_function("vector_index_search_k10_of_500", |bench| {
        bench.iter(|| {
            black_box(index.search(&query, 10).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_extract_symptoms,
    bench_extract_age,
    bench_graph_match_by_symptoms,
    bench_cosine_similarity,
    bench_vector_index_search,
);
criterion_main!(benches);
