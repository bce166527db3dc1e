// crates/clinical-gate-core/tests/proptest_gate.rs
// ============================================================================
// Module: Rule Gate Property-Based Tests
// Description: Algebraic laws of worst-wins aggregation and override policy.
// Purpose: Detect panics and invariant breaks across random rule sets.
// ============================================================================

//! Property-based tests for rule gate invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use clinical_gate_core::ActionType;
use clinical_gate_core::Condition;
use clinical_gate_core::ConditionOperator;
use clinical_gate_core::EvaluationContext;
use clinical_gate_core::OverrideRequirement;
use clinical_gate_core::PatientHash;
use clinical_gate_core::RuleCategory;
use clinical_gate_core::RuleGate;
use clinical_gate_core::RuleId;
use clinical_gate_core::RuleRecord;
use clinical_gate_core::SignalColor;
use clinical_gate_core::combined_probability;
use clinical_gate_core::evaluate_condition;
use proptest::prelude::*;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Strategies
// ============================================================================

#[derive(Debug, Clone)]
struct RuleShape {
    color: SignalColor,
    lethal: bool,
    glosa: Option<(f64, f64)>,
}

fn color_strategy() -> impl Strategy<Value = SignalColor> {
    prop_oneof![Just(SignalColor::Green), Just(SignalColor::Yellow), Just(SignalColor::Red)]
}

fn rule_shape_strategy() -> impl Strategy<Value = RuleShape> {
    (color_strategy(), any::<bool>(), prop::option::of((0.0f64 ..= 1.0, 0.0f64 .. 100_000.0)))
        .prop_map(|(color, lethal, glosa)| RuleShape {
            color,
            lethal,
            glosa,
        })
}

fn build_rule(index: usize, shape: &RuleShape) -> RuleRecord {
    let (pt, en) = if shape.lethal {
        ("Interação potencialmente letal", "Potentially lethal interaction")
    } else {
        ("Revisar prescrição", "Review prescription")
    };
    let mut logic = json!({
        "conditions": [{"field": "flag", "operator": "exists"}],
        "color": shape.color.as_str(),
        "message": {"pt": pt, "en": en}
    });
    if let Some((probability, amount)) = shape.glosa {
        logic["glosaRisk"] = json!({"probability": probability, "amount": amount, "code": "1801"});
    }
    RuleRecord {
        rule_id: RuleId::new(format!("rule-{index}")),
        name: format!("rule {index}"),
        version: 1,
        category: RuleCategory::Clinical,
        is_active: true,
        rule_logic: logic.to_string(),
    }
}

fn build_context(shapes: &[RuleShape]) -> EvaluationContext {
    EvaluationContext {
        patient_hash: PatientHash::from_identifier("patient"),
        action_type: ActionType::new("prescription"),
        payload: json!({"flag": true}),
        rules: shapes.iter().enumerate().map(|(index, shape)| build_rule(index, shape)).collect(),
    }
}

fn json_value_strategy(max_depth: u32) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|v| Value::Number(v.into())),
        any::<f64>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(|v| { serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number) }),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(max_depth, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0 .. 4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0 .. 4).prop_map(|map| {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn overall_color_is_worst_signal(shapes in prop::collection::vec(rule_shape_strategy(), 0 .. 8)) {
        let decision = RuleGate::default().evaluate(&build_context(&shapes));
        let worst = shapes.iter().map(|shape| shape.color).max().unwrap_or(SignalColor::Green);
        prop_assert_eq!(decision.color, worst);
        prop_assert_eq!(decision.signals.len(), shapes.len());
        let any_non_green = decision.signals.iter().any(|signal| signal.color != SignalColor::Green);
        prop_assert_eq!(decision.color == SignalColor::Green, !any_non_green);
        prop_assert_eq!(decision.needs_chat_assistance, decision.color != SignalColor::Green);
    }

    #[test]
    fn lethal_red_signal_always_blocks(shapes in prop::collection::vec(rule_shape_strategy(), 0 .. 8)) {
        let decision = RuleGate::default().evaluate(&build_context(&shapes));
        let lethal_red = shapes.iter().any(|shape| shape.lethal && shape.color == SignalColor::Red);
        let any_red = shapes.iter().any(|shape| shape.color == SignalColor::Red);
        let any_yellow = shapes.iter().any(|shape| shape.color == SignalColor::Yellow);
        if lethal_red {
            prop_assert!(!decision.can_override);
            prop_assert_eq!(decision.override_requires, Some(OverrideRequirement::Blocked));
        } else if any_red {
            prop_assert!(decision.can_override);
            prop_assert_eq!(decision.override_requires, Some(OverrideRequirement::Supervisor));
        } else if any_yellow {
            prop_assert_eq!(decision.override_requires, Some(OverrideRequirement::Justification));
        } else {
            prop_assert!(decision.can_override);
            prop_assert_eq!(decision.override_requires, None);
        }
    }

    #[test]
    fn combined_probability_is_bounded(shapes in prop::collection::vec(rule_shape_strategy(), 1 .. 8)) {
        let decision = RuleGate::default().evaluate(&build_context(&shapes));
        let probabilities: Vec<f64> = shapes.iter().filter_map(|shape| shape.glosa.map(|(p, _)| p)).collect();
        match decision.total_glosa_risk {
            None => prop_assert!(probabilities.is_empty()),
            Some(summary) => {
                let max = probabilities.iter().copied().fold(0.0f64, f64::max);
                prop_assert_eq!(summary.contributing_signals, probabilities.len());
                prop_assert!(summary.probability <= 1.0);
                prop_assert!(summary.probability + 0.005 + 1e-9 >= max);
                let exact = combined_probability(probabilities.iter().copied());
                prop_assert!(exact + 1e-12 >= max);
                prop_assert!(exact <= 1.0);
            }
        }
    }

    #[test]
    fn evaluation_is_deterministic(shapes in prop::collection::vec(rule_shape_strategy(), 0 .. 8)) {
        let gate = RuleGate::default();
        let ctx = build_context(&shapes);
        prop_assert_eq!(gate.evaluate(&ctx).without_timing(), gate.evaluate(&ctx).without_timing());
    }

    #[test]
    fn conditions_never_panic_on_random_json(
        payload in json_value_strategy(2),
        value in json_value_strategy(2),
        field in "[a-z]{1,4}(\\.[a-z0-9]{1,4}){0,2}",
    ) {
        let operators = [
            "equals", "contains", "in", "not_in", "greater_than",
            "less_than", "exists", "not_exists", "matches", "unknown",
        ];
        for operator in operators {
            let condition = Condition {
                field: field.clone(),
                operator: ConditionOperator::from(operator.to_string()),
                value: value.clone(),
            };
            let _ = evaluate_condition(&condition, &payload);
        }
    }
}
