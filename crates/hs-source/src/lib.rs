// Data collaborators for hydrosong: gauge series ingestion and site metadata.

pub mod dataset;
pub mod site;

pub use dataset::{JsonDataset, load_dataset, select_series};
pub use site::{RdbFileLookup, UsgsSiteService, parse_rdb};
