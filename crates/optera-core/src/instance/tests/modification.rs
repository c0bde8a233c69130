use super::support::RecordingBackend;
use super::*;
use optera_expr::{ConstraintType, FunctionChange, FunctionType, Set, SetType};
use std::collections::BTreeSet;

fn editable() -> RecordingBackend {
    RecordingBackend {
        deletion: true,
        modification: true,
        ..RecordingBackend::default()
    }
}

fn row(instance: &mut SolverInstance<RecordingBackend>) -> (Vec<VariableRef>, ConstraintRef) {
    let x = instance.add_variables(2).unwrap();
    let c = instance
        .add_constraint(
            ScalarAffineFunction::new(vec![(x[0], 1.0), (x[1], 1.0)], 0.0),
            Set::LessThan { upper: 4.0 },
        )
        .unwrap();
    (x, c)
}

#[test]
fn test_backend_without_modification_leaves_function_untouched() {
    let mut instance = SolverInstance::new(RecordingBackend::default());
    let (x, c) = row(&mut instance);
    let before = instance.constraint_function(c).unwrap().clone();

    let change = FunctionChange::ScalarCoefficient {
        variable: x[0],
        coefficient: 3.0,
    };
    assert!(matches!(
        instance.modify_constraint(c, &change),
        Err(SolverError::UnsupportedModification(_))
    ));
    assert_eq!(instance.constraint_function(c), Ok(&before));
    assert!(!instance.backend().calls.iter().any(|call| call.starts_with("modify")));
}

#[test]
fn test_coefficient_change_updates_stored_function() {
    let mut instance = SolverInstance::new(editable());
    let (x, c) = row(&mut instance);
    instance
        .modify_constraint(
            c,
            &FunctionChange::ScalarCoefficient {
                variable: x[1],
                coefficient: -2.0,
            },
        )
        .unwrap();
    instance
        .modify_constraint(c, &FunctionChange::ScalarConstant(1.5))
        .unwrap();

    let function = instance
        .constraint_function(c)
        .unwrap()
        .as_scalar_affine()
        .unwrap();
    assert_eq!(function.coefficient_of(x[0]), 1.0);
    assert_eq!(function.coefficient_of(x[1]), -2.0);
    assert_eq!(function.constant_term(), 1.5);
    assert_eq!(
        instance.backend().calls.last(),
        Some(&format!("modify_constraint {} ScalarConstant", c))
    );
}

#[test]
fn test_change_of_wrong_shape_is_unsupported() {
    let mut instance = SolverInstance::new(editable());
    let (_, c) = row(&mut instance);
    assert!(matches!(
        instance.modify_constraint(c, &FunctionChange::VectorConstants(vec![1.0])),
        Err(SolverError::UnsupportedModification(_))
    ));
}

#[test]
fn test_non_finite_change_is_invalid_function() {
    let mut instance = SolverInstance::new(editable());
    let (_, c) = row(&mut instance);
    assert!(matches!(
        instance.modify_constraint(c, &FunctionChange::ScalarConstant(f64::NAN)),
        Err(SolverError::InvalidFunction(_))
    ));
}

#[test]
fn test_change_on_foreign_variable_is_stale() {
    let mut instance = SolverInstance::new(editable());
    let (_, c) = row(&mut instance);
    let mut other = SolverInstance::new(editable());
    let foreign = other.add_variable().unwrap();
    let change = FunctionChange::ScalarCoefficient {
        variable: foreign,
        coefficient: 1.0,
    };
    let err = instance.modify_constraint(c, &change).unwrap_err();
    assert_eq!(err.code(), "REFERENCE_STALE");
}

#[test]
fn test_added_variable_becomes_a_dependency() {
    let mut instance = SolverInstance::new(editable());
    let (_, c) = row(&mut instance);
    let z = instance.add_variable().unwrap();
    instance
        .modify_constraint(
            c,
            &FunctionChange::ScalarCoefficient {
                variable: z,
                coefficient: 2.0,
            },
        )
        .unwrap();

    instance.delete_variable(z).unwrap();
    assert!(!instance.is_valid_constraint(c));
    assert!(matches!(
        instance.constraint_function(c),
        Err(SolverError::StaleReference(_))
    ));
}

#[test]
fn test_removed_variable_is_no_longer_a_dependency() {
    let mut instance = SolverInstance::new(editable());
    let (x, c) = row(&mut instance);
    instance
        .modify_constraint(
            c,
            &FunctionChange::ScalarCoefficient {
                variable: x[1],
                coefficient: 0.0,
            },
        )
        .unwrap();

    instance.delete_variable(x[1]).unwrap();
    assert!(instance.is_valid_constraint(c));
    assert_eq!(
        instance.constraint_function(c).map(Function::variables),
        Ok(BTreeSet::from([x[0]]))
    );
}

#[test]
fn test_set_replacement_must_keep_set_type() {
    let mut instance = SolverInstance::new(RecordingBackend::default());
    let (_, c) = row(&mut instance);
    assert_eq!(
        instance.set_constraint_set(c, Set::GreaterThan { lower: 0.0 }),
        Err(SolverError::InvalidConstraintSet {
            expected: SetType::LessThan,
            got: SetType::GreaterThan,
        })
    );
    assert!(matches!(
        instance.set_constraint_set(c, Set::LessThan { upper: f64::NAN }),
        Err(SolverError::InvalidSet(_))
    ));

    instance
        .set_constraint_set(c, Set::LessThan { upper: 9.0 })
        .unwrap();
    assert_eq!(instance.constraint_set(c), Ok(&Set::LessThan { upper: 9.0 }));
    assert_eq!(
        c.constraint_type(),
        ConstraintType::new(FunctionType::ScalarAffine, SetType::LessThan)
    );
}

#[test]
fn test_objective_modification() {
    let mut instance = SolverInstance::new(editable());
    let x = instance.add_variable().unwrap();
    let change = FunctionChange::ScalarConstant(2.0);
    assert!(matches!(
        instance.modify_objective(&change),
        Err(SolverError::UnsupportedModification(_))
    ));

    instance
        .set_objective(
            OptimizationSense::Min,
            ScalarAffineFunction::new(vec![(x, 1.0)], 0.0),
        )
        .unwrap();
    instance.modify_objective(&change).unwrap();
    let objective = instance.objective_function().unwrap().as_scalar_affine().unwrap();
    assert_eq!(objective.constant_term(), 2.0);
    assert_eq!(objective.coefficient_of(x), 1.0);
}

#[test]
fn test_edits_drop_results() {
    let mut instance = SolverInstance::new(editable());
    let (x, c) = row(&mut instance);
    instance
        .set_objective(
            OptimizationSense::Max,
            ScalarAffineFunction::new(vec![(x[0], 1.0)], 0.0),
        )
        .unwrap();

    type Instance = SolverInstance<RecordingBackend>;
    let edits: Vec<Box<dyn Fn(&mut Instance) -> Result<(), SolverError>>> = vec![
        Box::new(move |instance: &mut Instance| instance.modify_constraint(c, &FunctionChange::ScalarConstant(1.0))),
        Box::new(move |instance: &mut Instance| instance.set_constraint_set(c, Set::LessThan { upper: 3.0 })),
        Box::new(|instance: &mut Instance| instance.modify_objective(&FunctionChange::ScalarConstant(1.0))),
    ];
    for edit in edits {
        instance.optimize().unwrap();
        assert_eq!(instance.lifecycle_state(), LifecycleState::Optimized);
        edit(&mut instance).unwrap();
        assert_eq!(instance.lifecycle_state(), LifecycleState::Unoptimized);
        assert_eq!(
            instance.termination_status(),
            optera_solver::TerminationStatusCode::OptimizeNotCalled
        );
    }
}
