//! HTTP handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod seller;

use serde::Deserialize;
use views::Page;

/// `?limit=&offset=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Page::from_params(params.limit, params.offset)
    }
}
