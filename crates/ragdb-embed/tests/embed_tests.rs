use ragdb_core::traits::Embedder;
use ragdb_embed::{get_default_embedder, HashEmbedder, BGE_M3_DIM};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading large model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder().expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), BGE_M3_DIM);
    assert_eq!(embedder.dim(), BGE_M3_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_tokens_raise_similarity() {
    let e = HashEmbedder::new(1 << 16);
    let q = e.embed_text("contract objectives");
    let near = e.embed_text("The contract objectives are listed below");
    let far = e.embed_text("banana smoothie recipe");
    assert!(cosine(&q, &near) > 0.3);
    assert!(cosine(&q, &far).abs() < 1e-6, "disjoint token sets are orthogonal");
}
