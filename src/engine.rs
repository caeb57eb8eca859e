use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, trace};

use crate::user::Users;

pub const DEFAULT_APPLICATION_ID: &str = "374";

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read record: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Laptop,
}

impl DeviceClass {
    /// Anything that is not "desktop" (in any case) counts as a laptop
    pub fn classify(computer_type: &[u8]) -> Self {
        match std::str::from_utf8(computer_type) {
            Ok(ty) if ty.to_lowercase() == "desktop" => DeviceClass::Desktop,
            _ => DeviceClass::Laptop,
        }
    }
}

// Columns are positional, header names are never consulted. Fields are raw
// bytes so that a stray Latin-1 comment doesn't abort the run.
#[derive(Debug, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "field_bytes")]
    pub computer_id: Vec<u8>,
    #[serde(deserialize_with = "field_bytes")]
    pub user_id: Vec<u8>,
    #[serde(deserialize_with = "field_bytes")]
    pub application_id: Vec<u8>,
    #[serde(deserialize_with = "field_bytes")]
    pub computer_type: Vec<u8>,
    #[serde(deserialize_with = "field_bytes")]
    pub comment: Vec<u8>,
}

fn field_bytes<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FieldBytes;

    impl<'de> Visitor<'de> for FieldBytes {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a CSV field")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Vec<u8>, E> {
            Ok(v.to_vec())
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Vec<u8>, E> {
            Ok(v.as_bytes().to_vec())
        }
    }

    deserializer.deserialize_bytes(FieldBytes)
}

pub struct LicenseEngine {
    application_id: String,
    skip_header: bool,
    users: Users,
    rows_read: usize,
    rows_accepted: usize,
}

impl LicenseEngine {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            skip_header: false,
            users: Users::new(),
            rows_read: 0,
            rows_accepted: 0,
        }
    }

    /// Treat the first row of the input as a header and skip it
    pub fn skip_header(mut self, skip: bool) -> Self {
        self.skip_header = skip;
        self
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    /// Process the inventory in the file at `path`
    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), application_id = %self.application_id, "reading inventory");
        self.run(file)
    }

    /// Process every row of `input`. The first malformed row aborts the run.
    pub fn run<R: Read>(&mut self, input: R) -> Result<()> {
        let mut reader = ReaderBuilder::new()
            .has_headers(self.skip_header)
            .from_reader(input);
        for res in reader.byte_records() {
            let record: Record = res?.deserialize(None)?;
            self.rows_read += 1;
            self.process_record(record);
        }
        info!(
            rows = self.rows_read,
            accepted = self.rows_accepted,
            users = self.users.len(),
            total = self.total_applications(),
            "inventory processed"
        );
        Ok(())
    }

    /// Licenses required across every user seen so far
    pub fn total_applications(&self) -> usize {
        self.users.total_applications()
    }

    fn accepts(&self, record: &Record) -> bool {
        record.application_id == self.application_id.as_bytes()
    }

    fn process_record(&mut self, record: Record) {
        if !self.accepts(&record) {
            trace!(
                computer_id = %String::from_utf8_lossy(&record.computer_id),
                application_id = %String::from_utf8_lossy(&record.application_id),
                "skipping row for other application"
            );
            return;
        }
        self.rows_accepted += 1;

        let user = self.users.get_or_create(&record.user_id);
        match DeviceClass::classify(&record.computer_type) {
            DeviceClass::Desktop => user.add_if_unique_desktop(&record.computer_id),
            DeviceClass::Laptop => user.add_if_unique_laptop(&record.computer_id),
        }
    }
}
