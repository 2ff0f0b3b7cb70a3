// src/dag/model.rs

//! In-memory representation of a DAG definition file.
//!
//! The on-disk format is YAML:
//!
//! ```yaml
//! schema_version: "1"
//! dag:
//!   name: checkout-rework
//!   description: Multi-feature checkout rollout
//! layers:
//!   - id: layer-1
//!     name: Foundations
//!     features:
//!       - id: cart-model
//!         description: New cart data model
//!         depends_on: []
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Schema versions this binary understands.
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["1"];

/// A full DAG definition, immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagDefinition {
    pub schema_version: String,
    pub dag: DagMeta,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

/// Name and description of the DAG as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A declared group of features that execute together as one wave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
}

/// One unit of work: a feature driven through its own pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl DagDefinition {
    /// Iterate all features across all layers, in declaration order.
    pub fn features(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.layers.iter().flat_map(|l| l.features.iter())
    }

    /// Map from feature id to the index of the layer that declares it.
    ///
    /// Duplicate ids keep the first layer they were seen in; the validator
    /// reports duplicates separately.
    pub fn layer_index_by_feature(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::new();
        for (i, layer) in self.layers.iter().enumerate() {
            for feature in &layer.features {
                index.entry(feature.id.as_str()).or_insert(i);
            }
        }
        index
    }

    /// Total number of features in the DAG.
    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.features.len()).sum()
    }
}
