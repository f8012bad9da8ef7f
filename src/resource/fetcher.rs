//! Paginated fetching
//!
//! List endpoints return one page of records and an `opc-next-page` token.
//! Readers concatenate every page into one record list *before* projection,
//! so projection and filtering always see the complete listing.

use crate::oci::client::Page;
use anyhow::Result;
use std::future::Future;

/// Fetch all pages sequentially and concatenate the records in fetch order.
///
/// `fetch_page` is called with `None` first, then with each returned token
/// until a page comes back without one. Pages are never fetched
/// concurrently or speculatively.
pub async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = fetch_page(token.take()).await?;
        items.extend(page.items);

        match page.next_page {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    Ok(items)
}
