pub mod balance;
pub mod export;
pub mod importer;

pub use balance::{available_balance, batch_balance};
pub use export::export_to_csv;
pub use importer::{extract_batch, ExtractionBatch, Importer, ParentResolution, SkippedDocument};
