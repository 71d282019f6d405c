use common::types::dataset::{DataSource, TripDataset};
use log::info;
use std::fmt;
use std::fmt::Display;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Makes the dataset available as a local file. Remote sources are downloaded into
/// `./data/datasets/{id}/imports/{timestamp}`, local paths are used as they are.
pub async fn fetch_dataset(dataset: TripDataset) -> Result<FetchStepOutput, FetchError> {
    fetch_dataset_into(dataset, Path::new("./data/datasets")).await
}

pub async fn fetch_dataset_into(dataset: TripDataset, root: &Path) -> Result<FetchStepOutput, FetchError> {
    match dataset.clone().src {
        DataSource::URL { url, headers } => {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            let path = root.join(&dataset.id).join("imports").join(timestamp.to_string());
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }

            let request = headers.iter()
                .fold(reqwest::Client::new().get(url.clone()), |request, (name, value)| {
                    request.header(name, value)
                });
            let content = request.send().await?
                .error_for_status()?
                .bytes().await?;
            write(&path, &content)?;

            info!(target: "harvest", "Downloaded {} bytes for dataset '{}'", content.len(), dataset.id);

            Ok(FetchStepOutput { dataset, path })
        }
        DataSource::File { path } => {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(FetchError::MissingFile(path));
            }

            Ok(FetchStepOutput { dataset, path })
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    Reqwest(#[from] reqwest::Error),
    File(#[from] std::io::Error),
    MissingFile(PathBuf),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Reqwest(err) => write!(f, "{}", err),
            FetchError::File(err) => write!(f, "{}", err),
            FetchError::MissingFile(path) => write!(f, "Dataset file {} does not exist", path.display()),
        }
    }
}

pub struct FetchStepOutput {
    pub dataset: TripDataset,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::dataset::{DatasetFormat, PrepareConfig};

    fn dataset(src: DataSource) -> TripDataset {
        TripDataset {
            id: "trips".into(),
            src,
            format: DatasetFormat::Csv,
            prepare: PrepareConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_local_file_is_used_in_place() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();

        let out = fetch_dataset(dataset(DataSource::File { path: path.clone() })).await.unwrap();
        assert_eq!(out.path, PathBuf::from(path));
        assert_eq!(out.dataset.id, "trips");
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let err = fetch_dataset(dataset(DataSource::File { path: "./does/not/exist.csv".into() }))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FetchError::MissingFile(_)));
    }
}
