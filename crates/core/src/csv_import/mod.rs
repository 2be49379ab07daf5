//! CSV import module - format detection, row normalization and bulk import.

mod csv_formats;
mod csv_import_service;
mod csv_reader;



pub use csv_formats::{CsvFormat, CsvTrade};
pub use csv_import_service::{
    parse_trades, CsvImportService, CsvImportServiceTrait, CsvImportSummary,
};
pub use csv_reader::{decode_content, detect_delimiter, read_table, CsvRow, CsvTable};
