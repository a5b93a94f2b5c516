//! Best-effort pagination over list endpoints.

use std::future::Future;

use crate::api::{self, Page};

/// Fetch pages until one comes back empty, collecting every item.
///
/// A page is empty when the remote returned no entries at all. A page whose
/// entries were all dropped as malformed still advances to the next one.
///
/// `fetch_page` receives a page index counting from 0; callers translate it
/// into whatever scheme the service uses (offset, page number, ...).
///
/// A failed page stops pagination and returns what was collected so far.
/// The caller gets a possibly incomplete list, never an error.
pub async fn collect_pages<T, F, Fut>(collection: &str, mut fetch_page: F) -> Vec<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = api::Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page = 0u32;

    loop {
        match fetch_page(page).await {
            Ok(batch) if batch.fetched == 0 => break,
            Ok(batch) => {
                tracing::debug!(
                    %collection,
                    page,
                    fetched = batch.fetched,
                    kept = batch.items.len(),
                    "fetched page"
                );
                items.extend(batch.items);
            }
            Err(e) => {
                tracing::warn!(
                    %collection,
                    page,
                    collected = items.len(),
                    error = %e,
                    "page fetch failed; continuing with a partial list"
                );
                break;
            }
        }
        page += 1;
    }

    tracing::info!(%collection, count = items.len(), "loaded");
    items
}
