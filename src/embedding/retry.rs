use std::future::Future;

use log::warn;

use crate::embedding::provider::EmbeddingResult;

/// Run `operation` up to `retries + 1` times, returning the first success.
///
/// Attempts follow each other immediately. After the last failure its error
/// is returned. The closure receives the zero-based attempt number.
pub async fn with_retries<T, F, Fut>(retries: u32, mut operation: F) -> EmbeddingResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = EmbeddingResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                warn!(
                    "Embedding attempt {} of {} failed: {e}",
                    attempt + 1,
                    retries + 1
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
