/// Sentence embedder used to rank grounding examples.
///
/// Implementations must return L2-normalized vectors of `dim()` elements and
/// be deterministic for a given `id()`.
pub trait Embedder: Send + Sync {
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
