use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::config::EngineConfig;
use super::error::DatasetError;
use super::model::TankDataset;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

impl TankDataset {
    /// Load a tank export from a CSV file.
    pub fn load(path: &Path, config: &EngineConfig) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_reader(file, config)?;
        log::info!(
            "loaded {} rows, {} tank columns from {}",
            dataset.len(),
            dataset.columns.average_columns.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Load from any reader. The first non-blank row is the header.
    ///
    /// CSV layout: comma-delimited UTF-8, optionally behind a byte-order
    /// mark. Rows may be shorter or longer than the header. Blank lines are
    /// skipped, so the header is the first non-blank line.
    pub fn from_reader<R: Read>(mut reader: R, config: &EngineConfig) -> Result<Self, DatasetError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(body);

        let mut records = csv_reader.records();
        let header: Vec<String> = match records.next() {
            Some(first) => first?.iter().map(|h| h.trim().to_string()).collect(),
            None => return Err(DatasetError::Empty),
        };
        let rows = records.collect::<Result<Vec<StringRecord>, _>>()?;

        Self::new(header, rows, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_fatal() {
        let err = TankDataset::from_reader("".as_bytes(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn bom_only_is_empty() {
        let err = TankDataset::from_reader(UTF8_BOM, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let err = TankDataset::from_reader("\n\r\n".as_bytes(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));

        let input = "\nTime,FST1 Average Gravity\n\n2024-03-01 06:00:00,10\n";
        let ds = TankDataset::from_reader(input.as_bytes(), &EngineConfig::default())
            .expect("loads past the blank line");
        assert_eq!(ds.header[0], "Time");
        assert_eq!(ds.columns.average_columns.len(), 1);
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn header_only_loads_without_rows() {
        let ds = TankDataset::from_reader(
            "Time,FST1 Average Gravity\n".as_bytes(),
            &EngineConfig::default(),
        )
        .expect("header-only file loads");
        assert!(ds.is_empty());
        assert_eq!(ds.columns.average_columns.len(), 1);
        assert_eq!(ds.time_range(), None);
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let mut input = UTF8_BOM.to_vec();
        input.extend_from_slice(b"Time , FST1 Average Gravity\n2024-03-01 06:00:00,10\n");
        let ds = TankDataset::from_reader(input.as_slice(), &EngineConfig::default())
            .expect("loads");
        assert_eq!(ds.header, vec!["Time".to_string(), "FST1 Average Gravity".to_string()]);
        assert_eq!(ds.columns.time_index, Some(0));
    }

    #[test]
    fn ragged_rows_are_kept() {
        let input = "Time,FST1 Average Gravity,FST1 Level\n2024-03-01 06:00:00,10\n2024-03-01 07:00:00,10,5,extra\n";
        let ds = TankDataset::from_reader(input.as_bytes(), &EngineConfig::default())
            .expect("flexible rows load");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].len(), 2);
        assert_eq!(ds.rows[1].len(), 4);
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("/definitely/not/here.csv");
        let err = TankDataset::load(path, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
        assert!(err.to_string().contains("here.csv"));
    }
}
