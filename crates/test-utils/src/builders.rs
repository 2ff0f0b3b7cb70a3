//! Builders for DAG definitions used across integration tests.

use specdag::dag::model::{DagDefinition, DagMeta, FeatureSpec, Layer};

/// Fluent builder for [`DagDefinition`] values.
pub struct DagBuilder {
    schema_version: String,
    name: String,
    layers: Vec<Layer>,
}

impl DagBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            schema_version: "1".to_string(),
            name: name.to_string(),
            layers: Vec::new(),
        }
    }

    pub fn schema_version(mut self, version: &str) -> Self {
        self.schema_version = version.to_string();
        self
    }

    pub fn layer(mut self, id: &str, features: Vec<FeatureSpec>) -> Self {
        self.layers.push(Layer {
            id: id.to_string(),
            name: String::new(),
            features,
        });
        self
    }

    pub fn build(self) -> DagDefinition {
        DagDefinition {
            schema_version: self.schema_version,
            dag: DagMeta {
                name: self.name,
                description: String::new(),
            },
            layers: self.layers,
        }
    }
}

/// A feature with no dependencies.
pub fn feature(id: &str) -> FeatureSpec {
    FeatureSpec {
        id: id.to_string(),
        description: String::new(),
        depends_on: Vec::new(),
    }
}

/// A feature depending on earlier-layer features.
pub fn feature_with_deps(id: &str, deps: &[&str]) -> FeatureSpec {
    FeatureSpec {
        id: id.to_string(),
        description: String::new(),
        depends_on: deps.iter().map(|d| d.to_string()).collect(),
    }
}
