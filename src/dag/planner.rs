// src/dag/planner.rs

//! Conversion of a validated DAG into an ordered sequence of waves.
//!
//! Dependency satisfaction is already guaranteed layer-wise by the
//! validator; the plan exists for scheduling order, display and dry-run.

use crate::dag::model::DagDefinition;

/// Ordered execution waves, one per declared layer.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub waves: Vec<Vec<String>>,
}

impl ExecutionPlan {
    /// Build the plan: one wave per layer, features in declaration order.
    pub fn from_definition(def: &DagDefinition) -> Self {
        let waves = def
            .layers
            .iter()
            .map(|layer| layer.features.iter().map(|f| f.id.clone()).collect())
            .collect();
        Self { waves }
    }
}

/// Textual projection of the plan for `run --dry-run`.
pub fn render_dry_run(def: &DagDefinition, plan: &ExecutionPlan) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "dry-run: '{}' ({} layer(s), {} feature(s))\n",
        def.dag.name,
        plan.waves.len(),
        def.feature_count(),
    ));

    for (i, (layer, wave)) in def.layers.iter().zip(plan.waves.iter()).enumerate() {
        out.push_str(&format!("wave {} [{}]:\n", i + 1, layer.id));
        for (feature, id) in layer.features.iter().zip(wave.iter()) {
            if feature.depends_on.is_empty() {
                out.push_str(&format!("  - {id}\n"));
            } else {
                out.push_str(&format!("  - {id} (after: {})\n", feature.depends_on.join(", ")));
            }
        }
    }

    out.push_str("no features executed\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::model::{DagMeta, FeatureSpec, Layer};

    fn two_layer_def() -> DagDefinition {
        DagDefinition {
            schema_version: "1".to_string(),
            dag: DagMeta {
                name: "demo".to_string(),
                description: String::new(),
            },
            layers: vec![
                Layer {
                    id: "l1".to_string(),
                    name: String::new(),
                    features: vec![
                        FeatureSpec {
                            id: "a".to_string(),
                            description: String::new(),
                            depends_on: vec![],
                        },
                        FeatureSpec {
                            id: "b".to_string(),
                            description: String::new(),
                            depends_on: vec![],
                        },
                    ],
                },
                Layer {
                    id: "l2".to_string(),
                    name: String::new(),
                    features: vec![FeatureSpec {
                        id: "c".to_string(),
                        description: String::new(),
                        depends_on: vec!["a".to_string(), "b".to_string()],
                    }],
                },
            ],
        }
    }

    #[test]
    fn plan_has_one_wave_per_layer_in_declaration_order() {
        let plan = ExecutionPlan::from_definition(&two_layer_def());
        assert_eq!(plan.waves, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn dry_run_lists_all_features_and_deps() {
        let def = two_layer_def();
        let plan = ExecutionPlan::from_definition(&def);
        let rendered = render_dry_run(&def, &plan);
        assert!(rendered.contains("wave 1 [l1]"));
        assert!(rendered.contains("- c (after: a, b)"));
        assert!(rendered.contains("no features executed"));
    }
}
