#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Test fixture paths
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");

        Self { fixtures_dir }
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.fixtures_dir.join("schemas")
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.fixtures_dir.join("configs")
    }

    pub fn order_schema(&self) -> PathBuf {
        self.schemas_dir().join("order.xsd")
    }

    pub fn catalog_schema(&self) -> PathBuf {
        self.schemas_dir().join("catalog.xsd")
    }

    pub fn broken_schema(&self) -> PathBuf {
        self.schemas_dir().join("broken.xsd")
    }

    pub fn valid_order(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("valid").join("order.xml")
    }

    pub fn valid_catalog(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("valid").join("catalog.xml")
    }

    pub fn order_with_two_violations(&self) -> PathBuf {
        self.fixtures_dir
            .join("xml")
            .join("invalid")
            .join("order_two_violations.xml")
    }

    pub fn malformed_order(&self) -> PathBuf {
        self.fixtures_dir
            .join("xml")
            .join("malformed")
            .join("order_unclosed.xml")
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
