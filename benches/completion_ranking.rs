//! Benchmark suite for native completion ranking
//!
//! This benchmark measures:
//! - Prefix-mode filtering and scoring over catalogs of growing size
//! - Sub-word mode, which scans every sub-word of every candidate
//! - Building completion items for the ranked matches

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use cfx_natives_language_server::lsp::features::completion::{
    CompletionRequest, MatchMode, SearchQuery, completion_items, rank,
};
use cfx_natives_language_server::natives::{NativeDescriptor, Parameter, ScriptLanguage};

const VERBS: &[&str] = &["GET", "SET", "IS", "DOES", "CREATE", "DELETE", "TASK", "NETWORK"];
const NOUNS: &[&str] = &["ENTITY", "PED", "VEHICLE", "PLAYER", "OBJECT", "BLIP", "CAM", "PICKUP"];
const TAILS: &[&str] = &["COORDS", "HEADING", "HEALTH", "MODEL", "VISIBLE", "ALPHA", "SPEED"];

/// Generate `count` natives with realistic `VERB_NOUN_TAIL` names
fn generate_natives(count: usize) -> Vec<Arc<NativeDescriptor>> {
    (0..count)
        .map(|i| {
            let name = format!(
                "{}_{}_{}_{}",
                VERBS[i % VERBS.len()],
                NOUNS[(i / VERBS.len()) % NOUNS.len()],
                TAILS[(i / (VERBS.len() * NOUNS.len())) % TAILS.len()],
                i
            );
            let params = vec![
                Parameter::new("entity", "Entity"),
                Parameter::new("x", "float"),
                Parameter::new("toggle", "BOOL"),
            ];
            Arc::new(NativeDescriptor::new(name, params, "void"))
        })
        .collect()
}

fn bench_prefix_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("prefix_ranking");

    for size in [500, 2_000, 6_000] {
        let natives = generate_natives(size);
        let query = SearchQuery::new("SET_PED", MatchMode::Prefix);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &natives, |b, natives| {
            b.iter(|| rank(black_box(natives), black_box(&query), None));
        });
    }

    group.finish();
}

fn bench_sub_word_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("sub_word_ranking");

    for size in [500, 2_000, 6_000] {
        let natives = generate_natives(size);
        let query = SearchQuery::from_line_prefix("local heading = HEAD");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &natives, |b, natives| {
            b.iter(|| rank(black_box(natives), black_box(&query), None));
        });
    }

    group.finish();
}

fn bench_completion_items(c: &mut Criterion) {
    let natives = generate_natives(6_000);
    let request = CompletionRequest {
        line_prefix: "local ped = GET_P",
        text_before: "local ped = GET_P",
        language: Some(ScriptLanguage::Lua),
        fence: "lua",
        insert_parentheses: true,
        max_results: Some(100),
    };

    c.bench_function("completion_items_6000", |b| {
        b.iter(|| completion_items(black_box(&natives), black_box(&request)));
    });
}

criterion_group!(
    benches,
    bench_prefix_ranking,
    bench_sub_word_ranking,
    bench_completion_items
);
criterion_main!(benches);
