use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend kinds
///
/// The textual form is what the catalog stores in a record's `store`
/// descriptor (`"{kind}:{category}"`) and in served `/ufs/` paths, so it must
/// not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    AmazonS3,
    GoogleCloudStorage,
    FileSystem,
    GridFs,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::AmazonS3 => "AmazonS3",
            StoreKind::GoogleCloudStorage => "GoogleCloudStorage",
            StoreKind::FileSystem => "FileSystem",
            StoreKind::GridFs => "GridFS",
        }
    }
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amazons3" | "s3" => Ok(StoreKind::AmazonS3),
            "googlecloudstorage" | "gcs" => Ok(StoreKind::GoogleCloudStorage),
            "filesystem" | "fs" => Ok(StoreKind::FileSystem),
            "gridfs" => Ok(StoreKind::GridFs),
            _ => Err(anyhow::anyhow!("Invalid store kind: {}", s)),
        }
    }
}

impl Display for StoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
