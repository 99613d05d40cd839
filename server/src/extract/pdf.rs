use crate::error::{AppError, Result};

pub fn extract_pdf_text(data: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| AppError::Extraction(e.to_string()))
}
