use blob_node::blob::create_array;
use blob_node::fixtures::{empty_arena, random_bytes, random_word};
use blob_node::BlobNode;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;

const WORDS_COUNT: usize = 10_000;

pub fn blob_bench(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let words = (0..WORDS_COUNT)
        .map(|_| random_word(&mut rng))
        .collect::<Vec<_>>();

    c.bench_function("add zero terminated words", |b| {
        b.iter(|| {
            let mut arena = empty_arena();
            let mut node = BlobNode::new(&mut arena);
            node.create().unwrap();
            for word in &words {
                node.add(word.as_bytes(), true).unwrap();
            }
            black_box(node.size())
        })
    });

    c.bench_function("insert in the middle", |b| {
        let content = random_bytes(&mut rng, 64 * 1024);
        b.iter(|| {
            let mut arena = empty_arena();
            let mut node = BlobNode::new(&mut arena);
            node.create().unwrap();
            node.add(&content, false).unwrap();
            for word in words.iter().take(1_000) {
                let pos = node.size() / 2;
                node.insert(pos, word.as_bytes(), false).unwrap();
            }
            black_box(node.size())
        })
    });

    c.bench_function("erase from the front", |b| {
        let content = random_bytes(&mut rng, 64 * 1024);
        b.iter(|| {
            let mut arena = empty_arena();
            let ref_ = create_array(0, &mut arena).unwrap();
            let mut node = BlobNode::new(&mut arena);
            node.init_from_ref(ref_).unwrap();
            node.add(&content, false).unwrap();
            while !node.is_empty() {
                let end = rng.gen_range(1..=node.size().min(64));
                node.erase(0, end).unwrap();
            }
            black_box(node.capacity())
        })
    });
}

criterion_group!(benches, blob_bench);
criterion_main!(benches);
