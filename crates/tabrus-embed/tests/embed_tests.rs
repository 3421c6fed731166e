use tabrus_core::config::RetrievalSettings;
use tabrus_core::traits::Embedder;
use tabrus_embed::{embedder_or_fallback, get_default_embedder, HashingEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hashing_embedder_shapes_and_determinism() {
    let settings = RetrievalSettings { use_fake_embeddings: true, fake_dim: 256, ..Default::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 256);
    assert_eq!(embedder.id(), "hash:d256");

    let texts = vec!["Узу чвас ава".to_string(), "Узу чвас ава".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs[0].len(), 256);
    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in embs[0].iter().zip(&embs[1]) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_rank_above_unrelated_text() {
    let e = HashingEmbedder::new(512);
    let query = e.embed_text("гъвелчи чвас");
    let close = e.embed_text("Гъвелчи чвас ава");
    let far = e.embed_text("баба дада");
    assert!(cosine(&query, &close) > cosine(&query, &far));
    assert!(cosine(&query, &close) > 0.5);
}

#[test]
fn blank_text_embeds_to_zero_vector() {
    let e = HashingEmbedder::new(64);
    assert!(e.embed_text("  ,. ").iter().all(|x| *x == 0.0));
}

#[test]
fn missing_model_falls_back_to_hashing() {
    let settings = RetrievalSettings { model_dir: Some("/nonexistent/model".to_string()), fake_dim: 128, ..Default::default() };
    if std::env::var("APP_MODEL_DIR").is_err() && std::env::var("APP_USE_FAKE_EMBEDDINGS").is_err() && !std::path::Path::new("models/bge-m3").exists() {
        assert!(get_default_embedder(&settings).is_err());
        assert_eq!(embedder_or_fallback(&settings).id(), "hash:d128");
    }
}
