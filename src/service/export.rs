use super::importer::ExtractionBatch;
use crate::error::ImportError;
use crate::models::ExtractedDocument;
use csv::Writer;
use std::fs::File;
use std::path::Path;

const HEADER: [&str; 6] = ["kind", "subtype", "cnpj", "numero", "field", "value"];

fn kind(document: &ExtractedDocument) -> &'static str {
    match document {
        ExtractedDocument::Restitution(_) => "PER",
        ExtractedDocument::Compensation(_) => "DCOMP",
        ExtractedDocument::Cancellation(_) => "CANCELAMENTO",
    }
}

/// 以长格式写出批次，每个字段一行
///
/// 缺失值写为空单元格
pub fn export_to_csv(batch: &ExtractionBatch, output_path: &Path) -> Result<usize, ImportError> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(HEADER)?;

    let mut rows = 0;
    for document in &batch.documents {
        let header = document.header();
        let subtype = document.subtype().to_string();
        for field in document.fields().iter() {
            let value = field.value.as_ref().map(ToString::to_string).unwrap_or_default();
            writer.write_record([
                kind(document),
                subtype.as_str(),
                header.cnpj.as_str(),
                header.numero.as_str(),
                field.name,
                value.as_str(),
            ])?;
            rows += 1;
        }
    }

    writer.flush()?;
    tracing::info!("{} rows exported to {}", rows, output_path.display());
    Ok(rows)
}
