use criterion::{Criterion, criterion_group, criterion_main};

use docrag::chunking::{MarkdownHeaderSplitter, SplitConfig};

fn synthetic_markdown(sections: usize) -> String {
    let mut text = String::from("Cover page\n\n");
    for i in 0..sections {
        text.push_str(&format!("# Chapter {i}\nIntro paragraph for chapter {i}.\n\n"));
        text.push_str(&format!("## Section {i}.1\nBody text with some words.\n\n"));
        text.push_str("```\n# not a header\n```\n");
        text.push_str(&format!("### Detail {i}.1.1\n- item\n- item\n\n"));
    }
    text
}

fn bench_chunk_sections(c: &mut Criterion, name: &str, sections: usize) {
    let text = synthetic_markdown(sections);
    let splitter = MarkdownHeaderSplitter::new(SplitConfig::default());

    c.bench_function(name, |b| {
        b.iter(|| {
            let _ = splitter.split_text(std::hint::black_box(&text));
        })
    });
}

fn bench_chunk_small(c: &mut Criterion) {
    bench_chunk_sections(c, "chunk_10_sections", 10);
}

fn bench_chunk_medium(c: &mut Criterion) {
    bench_chunk_sections(c, "chunk_500_sections", 500);
}

fn bench_chunk_large(c: &mut Criterion) {
    bench_chunk_sections(c, "chunk_5000_sections", 5000);
}

criterion_group! {
    name = doc_benches;
    config = Criterion::default().sample_size(10);
    targets =
        bench_chunk_small,
        bench_chunk_medium,
        bench_chunk_large
}

criterion_main!(doc_benches);
