//! Sequential page walk for exports.

use std::time::Instant;

use chrono::NaiveDate;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::client::{PageRequest, PageSource};
use crate::error::{ClientError, ExportError};
use crate::export::rows::{ExportRow, Table, export_file_name};
use crate::export::sink::TabularSink;
use crate::models::PageRef;

/// Every item reachable from the starting page, up to the page ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBatch<T> {
    pub items: Vec<T>,
    pub pages_fetched: usize,
    /// The ceiling stopped the walk while more pages were available
    pub truncated: bool,
}

/// Fetch `initial_ref` and follow `next` links until the chain ends or
/// `max_pages` pages have been fetched.
///
/// Pages are fetched one at a time. The first failure aborts the walk and
/// the items gathered so far are dropped.
pub async fn export_all<T: Send>(
    source: &dyn PageSource<T>,
    initial_ref: PageRef,
    max_pages: usize,
) -> Result<ExportBatch<T>, ClientError> {
    let started = Instant::now();
    let mut items = Vec::new();
    let mut page_count = 1;
    let mut request = PageRequest::Ref(initial_ref);

    loop {
        let page = source.fetch_page(&request).await.inspect_err(|err| {
            warn!(page = page_count, error = %err, "Export page fetch failed; aborting");
            counter!("nomina_export_failure_total").increment(1);
        })?;
        counter!("nomina_export_pages_total").increment(1);
        debug!(page = page_count, items = page.items.len(), "Export page fetched");

        let next = page.next_ref().cloned();
        items.extend(page.items);

        match next {
            Some(next) if page_count < max_pages => {
                request = PageRequest::Ref(next);
                page_count += 1;
            }
            Some(_) => {
                warn!(max_pages, items = items.len(), "Export stopped at page ceiling");
                histogram!("nomina_export_duration_seconds").record(started.elapsed().as_secs_f64());
                return Ok(ExportBatch {
                    items,
                    pages_fetched: page_count,
                    truncated: true,
                });
            }
            None => break,
        }
    }

    histogram!("nomina_export_duration_seconds").record(started.elapsed().as_secs_f64());
    Ok(ExportBatch {
        items,
        pages_fetched: page_count,
        truncated: false,
    })
}

/// Outcome of a written export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub path: std::path::PathBuf,
    pub rows: usize,
    pub pages_fetched: usize,
    pub truncated: bool,
}

/// Walk the collection, map it to rows and write it through `sink`.
///
/// An empty collection yields [`ExportError::Empty`] and writes nothing.
pub async fn export_collection<R: ExportRow + Send>(
    source: &dyn PageSource<R>,
    initial_ref: PageRef,
    max_pages: usize,
    empresa_nombre: &str,
    sink: &dyn TabularSink,
    today: NaiveDate,
) -> Result<ExportReport, ExportError> {
    let batch = export_all(source, initial_ref, max_pages).await?;
    if batch.items.is_empty() {
        return Err(ExportError::Empty);
    }

    let table = Table::from_records(&batch.items, empresa_nombre);
    let file_name = export_file_name(R::FILE_PREFIX, empresa_nombre, today);
    let path = sink.write(&table, &file_name)?;

    info!(
        sheet = R::SHEET_NAME,
        rows = table.len(),
        pages = batch.pages_fetched,
        truncated = batch.truncated,
        "Export complete"
    );
    Ok(ExportReport {
        path,
        rows: table.len(),
        pages_fetched: batch.pages_fetched,
        truncated: batch.truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticPages;

    fn first() -> PageRef {
        StaticPages::<char>::page_ref(1)
    }

    #[tokio::test]
    async fn concatenates_pages_in_order() {
        let source = StaticPages::chain(vec![vec!['a', 'b'], vec!['c']]);
        let batch = export_all(&source, first(), 7).await.unwrap();

        assert_eq!(batch.items, vec!['a', 'b', 'c']);
        assert_eq!(batch.pages_fetched, 2);
        assert!(!batch.truncated);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn stops_at_ceiling_without_fetching_beyond() {
        let groups: Vec<Vec<char>> = (0..10).map(|i| vec![char::from(b'a' + i)]).collect();
        let source = StaticPages::chain(groups);

        let batch = export_all(&source, first(), 7).await.unwrap();
        assert_eq!(batch.items.len(), 7);
        assert_eq!(batch.pages_fetched, 7);
        assert!(batch.truncated);
        assert_eq!(source.fetch_count(), 7);
    }

    #[tokio::test]
    async fn exact_ceiling_is_not_truncated() {
        let source = StaticPages::chain(vec![vec!['a'], vec!['b'], vec!['c']]);
        let batch = export_all(&source, first(), 3).await.unwrap();
        assert_eq!(batch.items, vec!['a', 'b', 'c']);
        assert!(!batch.truncated);
    }

    #[tokio::test]
    async fn failure_mid_chain_aborts() {
        let source = StaticPages::chain(vec![vec!['a'], vec!['b'], vec!['c']]).failing_page(2);
        let err = export_all(&source, first(), 7).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failing_initial_page_aborts_before_any_item() {
        let source = StaticPages::chain(vec![vec!['a'], vec!['b']]).failing_page(1);
        let err = export_all(&source, first(), 7).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(
            source.requests(),
            vec![PageRequest::Ref(StaticPages::<char>::page_ref(1))]
        );
    }

    #[tokio::test]
    async fn failure_on_third_of_five_pages_never_reaches_the_fourth() {
        let groups: Vec<Vec<char>> = (0..5).map(|i| vec![char::from(b'a' + i)]).collect();
        let source = StaticPages::chain(groups).failing_page(3);

        let err = export_all(&source, first(), 7).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(source.fetch_count(), 3);
        assert!(
            !source
                .requests()
                .contains(&PageRequest::Ref(StaticPages::<char>::page_ref(4)))
        );
    }

    #[tokio::test]
    async fn empty_collection_is_reported() {
        let source = StaticPages::<crate::models::Lote>::chain(vec![vec![]]);
        let sink = crate::export::JsonLinesSink::new(std::env::temp_dir());
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let err = export_collection(
            &source,
            StaticPages::<crate::models::Lote>::page_ref(1),
            7,
            "ACME",
            &sink,
            today,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ExportError::Empty));
    }
}
