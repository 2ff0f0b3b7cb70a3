// src/visualize.rs

//! Text rendering of a DAG definition for `specdag visualize`.

use crate::dag::model::DagDefinition;

/// Render the DAG as an indented layer/feature listing with dependency
/// annotations.
pub fn render(def: &DagDefinition) -> String {
    let mut out = String::new();

    out.push_str(&format!("{} (schema {})\n", def.dag.name, def.schema_version));
    if !def.dag.description.is_empty() {
        out.push_str(&format!("  {}\n", def.dag.description));
    }

    for (i, layer) in def.layers.iter().enumerate() {
        let title = if layer.name.is_empty() {
            layer.id.clone()
        } else {
            format!("{} ({})", layer.name, layer.id)
        };
        out.push_str(&format!("\nLayer {}: {}\n", i + 1, title));

        for feature in &layer.features {
            out.push_str(&format!("  [{}]", feature.id));
            if !feature.depends_on.is_empty() {
                out.push_str(&format!("  <- {}", feature.depends_on.join(", ")));
            }
            out.push('\n');
            if !feature.description.is_empty() {
                out.push_str(&format!("      {}\n", feature.description));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::model::{DagMeta, FeatureSpec, Layer};

    #[test]
    fn render_shows_layers_and_dependency_arrows() {
        let def = DagDefinition {
            schema_version: "1".to_string(),
            dag: DagMeta {
                name: "demo".to_string(),
                description: "demo dag".to_string(),
            },
            layers: vec![
                Layer {
                    id: "l1".to_string(),
                    name: "Base".to_string(),
                    features: vec![FeatureSpec {
                        id: "a".to_string(),
                        description: String::new(),
                        depends_on: vec![],
                    }],
                },
                Layer {
                    id: "l2".to_string(),
                    name: String::new(),
                    features: vec![FeatureSpec {
                        id: "b".to_string(),
                        description: String::new(),
                        depends_on: vec!["a".to_string()],
                    }],
                },
            ],
        };

        let rendered = render(&def);
        assert!(rendered.contains("Layer 1: Base (l1)"));
        assert!(rendered.contains("[b]  <- a"));
    }
}
