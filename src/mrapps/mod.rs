pub mod ii;
pub mod wc;

use std::sync::Arc;

use crate::mr::MRApp;

pub fn get_app(app: &str) -> Result<Arc<dyn MRApp>, anyhow::Error> {
    match app {
        "wc" => Ok(Arc::new(wc::WC)),
        "ii" => Ok(Arc::new(ii::InvertedIndex::new())),
        _ => Err(anyhow::anyhow!("Unknown app: {}", app)),
    }
}
