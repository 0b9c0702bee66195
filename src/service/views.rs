use serde::Serialize;
use tera::{Context, Tera};

use crate::domain::models::{EnrichedTransaction, SearchResults};

const INDEX_TEMPLATE: &str = "index.html";

/// Data handed to the index page.
#[derive(Clone, Serialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexView {
    pub error: Option<String>,
    pub transactions: Vec<EnrichedTransaction>,
    pub address: Option<String>,
    pub current_balance: f64,
    pub current_price_balance: f64,
}

impl IndexView {
    /// Empty state shown with a message when a search failed.
    pub fn failed(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }
}

impl From<SearchResults> for IndexView {
    fn from(results: SearchResults) -> Self {
        Self {
            error: None,
            transactions: results.transactions,
            address: results.address,
            current_balance: results.current_balance,
            current_price_balance: results.current_price_balance,
        }
    }
}

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            INDEX_TEMPLATE,
            include_str!("../../templates/index.html.tera"),
        )?;
        Ok(Self { tera })
    }

    pub fn render_index(&self, view: &IndexView) -> Result<String, tera::Error> {
        let context = Context::from_serialize(view)?;
        self.tera.render(INDEX_TEMPLATE, &context)
    }
}
