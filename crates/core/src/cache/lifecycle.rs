//! Stale bucket cleanup run on activation.

use super::ResponseCache;
use crate::Error;

/// Delete every bucket whose name starts with `key_prefix` except `current_bucket`.
///
/// Buckets owned by other prefixes are left alone. All deletions complete
/// before this returns. Returns the names that were deleted.
pub async fn cleanup_caches<C>(cache: &C, key_prefix: &str, current_bucket: &str) -> Result<Vec<String>, Error>
where
    C: ResponseCache + ?Sized,
{
    let mut deleted = Vec::new();

    for name in cache.bucket_names().await? {
        if !name.starts_with(key_prefix) || name == current_bucket {
            continue;
        }
        if cache.delete_bucket(&name).await? {
            tracing::info!(bucket = %name, "deleted stale cache bucket");
            deleted.push(name);
        }
    }

    Ok(deleted)
}
