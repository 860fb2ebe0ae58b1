use tracing::debug;

use super::models::Dataset;
use super::{CatalogClient, CatalogError, Transport};

enum ScrollState {
    Start,
    Continue(String),
    Done,
}

/// Dataset pages pulled from the catalog one request at a time.
///
/// The sequence ends on an empty page or when the server stops handing out a
/// cursor, whichever comes first. After an error nothing more is yielded.
pub struct DatasetPages<'a, T> {
    client: &'a CatalogClient<T>,
    page_size: usize,
    state: ScrollState,
}

impl<'a, T: Transport> DatasetPages<'a, T> {
    pub(crate) fn new(client: &'a CatalogClient<T>, page_size: usize) -> Self {
        Self {
            client,
            page_size,
            state: ScrollState::Start,
        }
    }
}

impl<T: Transport> Iterator for DatasetPages<'_, T> {
    type Item = Result<Vec<Dataset>, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = match std::mem::replace(&mut self.state, ScrollState::Done) {
            ScrollState::Done => return None,
            ScrollState::Start => None,
            ScrollState::Continue(cursor) => Some(cursor),
        };

        let page = match self.client.fetch_dataset_page(self.page_size, cursor.as_deref()) {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };

        if page.entities.is_empty() {
            debug!("Empty dataset page, scroll finished");
            return None;
        }

        match page.scroll_id {
            Some(next) if !next.is_empty() => self.state = ScrollState::Continue(next),
            _ => debug!("No scroll cursor returned, this is the last page"),
        }

        Some(Ok(page.entities))
    }
}

impl<T: Transport> std::iter::FusedIterator for DatasetPages<'_, T> {}
