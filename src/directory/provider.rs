//! Dataset Providers
//!
//! Supplies the ordered agency and contact lists. Records are handed out as
//! shared immutable snapshots; a request never sees a list change under it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::records::{sort_agencies, sort_contacts, Agency, Contact};
use crate::metrics;

/// Named collections served by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Agencies,
    Contacts,
}

impl Dataset {
    /// Label used in logs, metrics and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Agencies => "agencies",
            Dataset::Contacts => "contacts",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for dataset loading
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Source file could not be read
    #[error("Failed to read {dataset} from {path:?}: {source}")]
    Io {
        dataset: Dataset,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not valid CSV
    #[error("Failed to read CSV {dataset} from {path:?}: {source}")]
    Csv {
        dataset: Dataset,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Source rows do not form valid records
    #[error("Failed to parse {dataset} from {path:?}: {source}")]
    Parse {
        dataset: Dataset,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Provider has no data for this collection
    #[error("Dataset {0} is unavailable")]
    Unavailable(Dataset),
}

impl DatasetError {
    /// Collection the failure belongs to
    pub fn dataset(&self) -> Dataset {
        match self {
            DatasetError::Io { dataset, .. }
            | DatasetError::Csv { dataset, .. }
            | DatasetError::Parse { dataset, .. } => *dataset,
            DatasetError::Unavailable(dataset) => *dataset,
        }
    }
}

/// Source of ordered, stable record lists
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// All agencies in listing order
    async fn agencies(&self) -> Result<Arc<[Agency]>, DatasetError>;

    /// All contacts in listing order
    async fn contacts(&self) -> Result<Arc<[Contact]>, DatasetError>;
}

/// Provider over records already held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticDatasetProvider {
    agencies: Option<Arc<[Agency]>>,
    contacts: Option<Arc<[Contact]>>,
}

impl StaticDatasetProvider {
    /// Create a provider; both lists are sorted into listing order
    pub fn new(mut agencies: Vec<Agency>, mut contacts: Vec<Contact>) -> Self {
        sort_agencies(&mut agencies);
        sort_contacts(&mut contacts);
        Self {
            agencies: Some(agencies.into()),
            contacts: Some(contacts.into()),
        }
    }

    /// A provider whose collections always fail to load
    pub fn unavailable() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatasetProvider for StaticDatasetProvider {
    async fn agencies(&self) -> Result<Arc<[Agency]>, DatasetError> {
        self.agencies
            .clone()
            .ok_or(DatasetError::Unavailable(Dataset::Agencies))
    }

    async fn contacts(&self) -> Result<Arc<[Contact]>, DatasetError> {
        self.contacts
            .clone()
            .ok_or(DatasetError::Unavailable(Dataset::Contacts))
    }
}

/// Provider reading record files from a data directory
///
/// Files ending in `.csv` are read as headered CSV exports; anything else is
/// read as a JSON array of records. Each collection is loaded on first use and kept for the life of the
/// process. Failed loads are not cached.
#[derive(Debug)]
pub struct FileDatasetProvider {
    agencies_path: PathBuf,
    contacts_path: PathBuf,
    agencies: OnceCell<Arc<[Agency]>>,
    contacts: OnceCell<Arc<[Contact]>>,
}

impl FileDatasetProvider {
    /// Create a provider over `data_dir/agencies_file` and `data_dir/contacts_file`
    pub fn new<P: AsRef<Path>>(data_dir: P, agencies_file: &str, contacts_file: &str) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            agencies_path: data_dir.join(agencies_file),
            contacts_path: data_dir.join(contacts_file),
            agencies: OnceCell::new(),
            contacts: OnceCell::new(),
        }
    }

    /// Load both collections now instead of on first request
    pub async fn preload(&self) -> Result<(), DatasetError> {
        self.agencies().await?;
        self.contacts().await?;
        Ok(())
    }
}

async fn read_records<T: DeserializeOwned>(
    dataset: Dataset,
    path: &Path,
) -> Result<Vec<T>, DatasetError> {
    let result = async {
        let content = tokio::fs::read(path).await.map_err(|source| DatasetError::Io {
            dataset,
            path: path.to_path_buf(),
            source,
        })?;

        if is_csv(path) {
            csv_records(dataset, path, &content)
        } else {
            serde_json::from_slice::<Vec<T>>(&content).map_err(|source| DatasetError::Parse {
                dataset,
                path: path.to_path_buf(),
                source,
            })
        }
    }
    .await;

    match &result {
        Ok(records) => info!(%dataset, count = records.len(), path = ?path, "Loaded dataset"),
        Err(e) => {
            warn!(%dataset, error = %e, "Dataset load failed");
            metrics::DATASET_LOAD_ERRORS_TOTAL
                .with_label_values(&[dataset.as_str()])
                .inc();
        }
    }

    result
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Parse headered CSV rows into records
///
/// Every cell is handed to the record type as text, so numeric columns go
/// through the same lenient parsing as string-typed JSON values. Blank lines
/// are skipped and cells are trimmed.
fn csv_records<T: DeserializeOwned>(
    dataset: Dataset,
    path: &Path,
    content: &[u8],
) -> Result<Vec<T>, DatasetError> {
    let csv_error = |source: csv::Error| DatasetError::Csv {
        dataset,
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content);
    let headers = reader.headers().map_err(csv_error)?.clone();

    reader
        .records()
        .map(|row| {
            let row = row.map_err(csv_error)?;
            let fields: serde_json::Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(column, cell)| (column.to_string(), Value::String(cell.to_string())))
                .collect();

            serde_json::from_value(Value::Object(fields)).map_err(|source| DatasetError::Parse {
                dataset,
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

#[async_trait]
impl DatasetProvider for FileDatasetProvider {
    async fn agencies(&self) -> Result<Arc<[Agency]>, DatasetError> {
        self.agencies
            .get_or_try_init(|| async {
                let mut agencies = read_records(Dataset::Agencies, &self.agencies_path).await?;
                sort_agencies(&mut agencies);
                Ok::<_, DatasetError>(agencies.into())
            })
            .await
            .cloned()
    }

    async fn contacts(&self) -> Result<Arc<[Contact]>, DatasetError> {
        self.contacts
            .get_or_try_init(|| async {
                let mut contacts = read_records(Dataset::Contacts, &self.contacts_path).await?;
                sort_contacts(&mut contacts);
                Ok::<_, DatasetError>(contacts.into())
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) {
        std::fs::write(dir.path().join(name), body).unwrap();
    }

    #[tokio::test]
    async fn test_file_provider_loads_and_sorts() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "contacts.json",
            r#"[
                {"id": "2", "first_name": "Zoe", "last_name": "Adams", "email": "z@example.org"},
                {"id": "1", "first_name": "Abe", "last_name": "Young", "email": "a@example.org"}
            ]"#,
        );
        write(
            &dir,
            "agencies.json",
            r#"[
                {"id": "b", "name": "Beta County", "state": "Ohio", "state_code": "OH", "type": "county"},
                {"id": "a", "name": "Alpha City", "state": "Ohio", "state_code": "OH", "type": "city"}
            ]"#,
        );

        let provider = FileDatasetProvider::new(dir.path(), "agencies.json", "contacts.json");
        provider.preload().await.unwrap();

        let contacts = provider.contacts().await.unwrap();
        assert_eq!(contacts[0].first_name, "Abe");
        assert_eq!(contacts[1].first_name, "Zoe");

        let agencies = provider.agencies().await.unwrap();
        assert_eq!(agencies[0].name, "Alpha City");
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_for_process_lifetime() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "contacts.json",
            r#"[{"id": "1", "first_name": "A", "last_name": "B", "email": "e"}]"#,
        );

        let provider = FileDatasetProvider::new(dir.path(), "agencies.json", "contacts.json");
        let first = provider.contacts().await.unwrap();

        write(&dir, "contacts.json", "[]");
        let second = provider.contacts().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error_and_retried() {
        let dir = TempDir::new().unwrap();
        let provider = FileDatasetProvider::new(dir.path(), "agencies.json", "contacts.json");

        let err = provider.contacts().await.unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
        assert_eq!(err.dataset(), Dataset::Contacts);

        write(&dir, "contacts.json", "[]");
        assert!(provider.contacts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "agencies.json", "{not json");

        let provider = FileDatasetProvider::new(dir.path(), "agencies.json", "contacts.json");
        let err = provider.agencies().await.unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_csv_export_with_blank_and_numeric_cells() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "agencies_agency_rows.csv",
            "id,name,state,state_code,type,population,website,total_schools,student_teacher_ratio\n\
             a-2, Zeta Township ,Ohio,OH,township,,,3,\n\
             \n\
             a-1,Alpha City,Ohio,OH,city, 12000 ,https://alpha.example.org,14,15.5\n",
        );
        write(
            &dir,
            "contacts_contact_rows.csv",
            "id,first_name,last_name,email,phone,title,agency_id\n\
             007,Ada,Lovelace,ada@example.org,,Superintendent,a-1\n",
        );

        let provider = FileDatasetProvider::new(
            dir.path(),
            "agencies_agency_rows.csv",
            "contacts_contact_rows.csv",
        );
        provider.preload().await.unwrap();

        let agencies = provider.agencies().await.unwrap();
        assert_eq!(agencies.len(), 2);
        assert_eq!(agencies[0].id, "a-1");
        assert_eq!(agencies[0].population, Some(12000.0));
        assert_eq!(agencies[0].student_teacher_ratio, Some(15.5));
        assert_eq!(agencies[0].website.as_deref(), Some("https://alpha.example.org"));
        assert_eq!(agencies[1].name, "Zeta Township");
        assert_eq!(agencies[1].population, None);
        assert_eq!(agencies[1].website, None);
        assert_eq!(agencies[1].total_schools, Some(3.0));
        assert_eq!(agencies[1].student_teacher_ratio, None);

        let contacts = provider.contacts().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].id, "007");
        assert_eq!(contacts[0].phone, None);
        assert_eq!(contacts[0].title.as_deref(), Some("Superintendent"));
        assert_eq!(contacts[0].department, None);
    }

    #[tokio::test]
    async fn test_ragged_csv_is_csv_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "contacts.csv", "id,first_name\n1,Ada,extra\n");

        let provider = FileDatasetProvider::new(dir.path(), "agencies.csv", "contacts.csv");
        let err = provider.contacts().await.unwrap_err();
        assert!(matches!(err, DatasetError::Csv { .. }));
        assert_eq!(err.dataset(), Dataset::Contacts);
    }

    #[tokio::test]
    async fn test_csv_missing_id_column_is_parse_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "contacts.csv", "first_name,last_name\nAda,Lovelace\n");

        let provider = FileDatasetProvider::new(dir.path(), "agencies.csv", "contacts.csv");
        let err = provider.contacts().await.unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticDatasetProvider::new(Vec::new(), Vec::new());
        assert!(provider.contacts().await.unwrap().is_empty());

        let provider = StaticDatasetProvider::unavailable();
        let err = provider.agencies().await.unwrap_err();
        assert_eq!(err.dataset(), Dataset::Agencies);
    }
}
