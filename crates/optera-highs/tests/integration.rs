#![allow(clippy::float_cmp)]

use optera_core::SolverInstance;
use optera_expr::{
    FunctionChange, ScalarAffineFunction, Set, VariableRef, VectorAffineFunction,
};
use optera_highs::HighsBackend;
use optera_solver::{
    AttributeKind, AttributeTarget, AttributeValue, Conclusion, OptimizationSense, ResultIndex,
    ResultStatusCode, SolverConfig, TerminationStatusCode,
};

const FIRST: ResultIndex = ResultIndex::FIRST;
const TOL: f64 = 1e-6;

fn instance() -> SolverInstance<HighsBackend> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
    SolverInstance::with_config(HighsBackend::new(), SolverConfig::new().with_silent(true))
}

fn affine(terms: &[(VariableRef, f64)], constant: f64) -> ScalarAffineFunction {
    ScalarAffineFunction::new(terms.to_vec(), constant)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOL,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// minimize 2x + 3y subject to x + y >= 5, x, y >= 0
#[test]
fn test_lp_primal_and_duals() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    let y = model.add_variable().unwrap();
    let x_lower = model.add_constraint(x, Set::GreaterThan { lower: 0.0 }).unwrap();
    let y_lower = model.add_constraint(y, Set::GreaterThan { lower: 0.0 }).unwrap();
    let row = model
        .add_constraint(affine(&[(x, 1.0), (y, 1.0)], 0.0), Set::GreaterThan { lower: 5.0 })
        .unwrap();
    model
        .set_objective(OptimizationSense::Min, affine(&[(x, 2.0), (y, 3.0)], 0.0))
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_eq!(model.conclusion(FIRST), Conclusion::Optimal);
    assert_close(model.objective_value(FIRST).unwrap(), 10.0);
    assert_close(model.variable_primal(x, FIRST).unwrap(), 5.0);
    assert_close(model.variable_primal(y, FIRST).unwrap(), 0.0);
    assert_close(model.constraint_primal(row, FIRST).unwrap()[0], 5.0);

    assert_close(model.constraint_dual(row, FIRST).unwrap()[0], 2.0);
    assert_close(model.constraint_dual(x_lower, FIRST).unwrap()[0], 0.0);
    assert_close(model.constraint_dual(y_lower, FIRST).unwrap()[0], 1.0);

    let residual = model.dual_residual(FIRST).unwrap();
    assert!(residual.values().all(|value| value.abs() < TOL));
    assert!(model.check_dual_feasibility(FIRST, TOL).unwrap().is_feasible());
    assert!(model.check_primal_feasibility(FIRST, TOL).unwrap().is_feasible());
}

#[test]
fn test_maximization_duals_follow_plus_convention() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    let upper = model.add_constraint(x, Set::LessThan { upper: 4.0 }).unwrap();
    model.set_objective(OptimizationSense::Max, x).unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 4.0);
    assert_close(model.constraint_dual(upper, FIRST).unwrap()[0], -1.0);
    assert!(model.check_dual_feasibility(FIRST, TOL).unwrap().is_feasible());
}

fn knapsack(
    model: &mut SolverInstance<HighsBackend>,
    capacity: f64,
) -> (Vec<VariableRef>, optera_expr::ConstraintRef) {
    let x = model.add_variables(3).unwrap();
    for variable in &x {
        model.add_constraint(*variable, Set::ZeroOne).unwrap();
    }
    let weight = model
        .add_constraint(
            affine(&[(x[0], 4.0), (x[1], 2.0), (x[2], 1.0)], 0.0),
            Set::LessThan { upper: capacity },
        )
        .unwrap();
    model
        .set_objective(
            OptimizationSense::Max,
            affine(&[(x[0], 5.0), (x[1], 3.0), (x[2], 2.0)], 0.0),
        )
        .unwrap();
    (x, weight)
}

fn rounded(model: &SolverInstance<HighsBackend>, x: &[VariableRef]) -> Vec<f64> {
    x.iter()
        .map(|variable| model.variable_primal(*variable, FIRST).unwrap().round())
        .collect()
}

#[test]
fn test_knapsack_and_capacity_change() {
    let mut model = instance();
    let (x, weight) = knapsack(&mut model, 5.0);

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_eq!(model.primal_status(FIRST), ResultStatusCode::FeasiblePoint);
    assert_eq!(model.dual_status(FIRST), ResultStatusCode::NoSolution);
    assert_close(model.objective_value(FIRST).unwrap(), 7.0);
    assert_eq!(rounded(&model, &x), vec![1.0, 0.0, 1.0]);
    assert!(matches!(
        model.get_attribute(&AttributeKind::ObjectiveBound, AttributeTarget::Model),
        Ok(AttributeValue::Float(bound)) if (bound - 7.0).abs() < TOL
    ));

    model
        .set_constraint_set(weight, Set::LessThan { upper: 6.0 })
        .unwrap();
    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 8.0);
    assert_eq!(rounded(&model, &x), vec![1.0, 1.0, 0.0]);
}

#[test]
fn test_warm_start_keeps_optimum() {
    let mut model = instance();
    let (x, _) = knapsack(&mut model, 5.0);
    model
        .set_attribute(&AttributeKind::VariablePrimalStart, x[0], 1.0)
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 7.0);
}

#[test]
fn test_infeasible_rows_report_no_result() {
    let mut model = instance();
    let x = model.add_variables(2).unwrap();
    let sum = affine(&[(x[0], 1.0), (x[1], 1.0)], 0.0);
    model
        .add_constraint(sum.clone(), Set::GreaterThan { lower: 5.0 })
        .unwrap();
    model.add_constraint(sum, Set::LessThan { upper: 2.0 }).unwrap();

    let status = model.optimize().unwrap();
    assert!(matches!(
        status,
        TerminationStatusCode::InfeasibleNoResult | TerminationStatusCode::InfeasibleOrUnbounded
    ));
    assert_eq!(model.result_count(), 0);
    assert_eq!(model.primal_status(FIRST), ResultStatusCode::NoSolution);
    assert_eq!(model.conclusion(FIRST), Conclusion::NoConclusion);
}

/// x >= 5 and x <= 2 as two variable bounds on one column.
#[test]
fn test_crossing_variable_bounds_report_no_result() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    model.add_constraint(x, Set::GreaterThan { lower: 5.0 }).unwrap();
    model.add_constraint(x, Set::LessThan { upper: 2.0 }).unwrap();
    model
        .set_objective(OptimizationSense::Min, affine(&[(x, 1.0)], 0.0))
        .unwrap();

    let status = model.optimize().unwrap();
    assert_eq!(status, TerminationStatusCode::InfeasibleNoResult);
    assert_eq!(model.result_count(), 0);
    assert_eq!(model.primal_status(FIRST), ResultStatusCode::NoSolution);
    assert!(model.variable_primal(x, FIRST).is_err());
    assert_eq!(model.conclusion(FIRST), Conclusion::NoConclusion);
}

#[test]
fn test_bound_past_highs_infinity_is_invalid_model() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    let huge = model
        .add_constraint(x, Set::GreaterThan { lower: 1e21 })
        .unwrap();
    model
        .set_objective(OptimizationSense::Min, affine(&[(x, 1.0)], 0.0))
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::InvalidModel));
    assert_eq!(model.result_count(), 0);

    model.delete_constraint(huge).unwrap();
    model.add_constraint(x, Set::GreaterThan { lower: 1.0 }).unwrap();
    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 1.0);
}

#[test]
fn test_row_bound_overflowing_after_constant_shift_is_invalid_model() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    model.add_constraint(x, Set::GreaterThan { lower: 0.0 }).unwrap();
    model
        .add_constraint(affine(&[(x, 1.0)], -1e308), Set::GreaterThan { lower: 1e308 })
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::InvalidModel));
    assert_eq!(model.result_count(), 0);
}

#[test]
fn test_unbounded_reports_no_result() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    model.add_constraint(x, Set::GreaterThan { lower: 0.0 }).unwrap();
    model
        .set_objective(OptimizationSense::Min, affine(&[(x, -1.0)], 0.0))
        .unwrap();

    let status = model.optimize().unwrap();
    assert!(matches!(
        status,
        TerminationStatusCode::UnboundedNoResult | TerminationStatusCode::InfeasibleOrUnbounded
    ));
    assert_eq!(model.result_count(), 0);
}

#[test]
fn test_feasibility_problem() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    model
        .add_constraint(x, Set::Interval { lower: 1.0, upper: 2.0 })
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    let value = model.variable_primal(x, FIRST).unwrap();
    assert!((1.0 - TOL..=2.0 + TOL).contains(&value));
    assert_close(model.objective_value(FIRST).unwrap(), 0.0);
}

#[test]
fn test_model_without_variables() {
    let mut model = instance();
    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_eq!(model.result_count(), 1);
    assert_eq!(model.objective_value(FIRST), Ok(0.0));
}

#[test]
fn test_constraint_deletion_and_resolve() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    model.add_constraint(x, Set::GreaterThan { lower: 0.0 }).unwrap();
    let row = model
        .add_constraint(affine(&[(x, 1.0)], 0.0), Set::GreaterThan { lower: 3.0 })
        .unwrap();
    model.set_objective(OptimizationSense::Min, x).unwrap();
    model.optimize().unwrap();
    assert_close(model.objective_value(FIRST).unwrap(), 3.0);

    model.delete_constraint(row).unwrap();
    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 0.0);
}

#[test]
fn test_variable_deletion_removes_its_bounds() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    let y = model.add_variable().unwrap();
    let x_lower = model.add_constraint(x, Set::GreaterThan { lower: 1.0 }).unwrap();
    model.add_constraint(y, Set::GreaterThan { lower: 2.0 }).unwrap();
    model
        .set_objective(OptimizationSense::Min, affine(&[(x, 1.0), (y, 1.0)], 0.0))
        .unwrap();
    model.optimize().unwrap();
    assert_close(model.objective_value(FIRST).unwrap(), 3.0);

    model.delete_variable(x).unwrap();
    assert!(!model.is_valid_constraint(x_lower));
    assert!(model.optimize().is_err());

    model.set_objective(OptimizationSense::Min, y).unwrap();
    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 2.0);
}

#[test]
fn test_row_modification_and_resolve() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    let y = model.add_variable().unwrap();
    model.add_constraint(x, Set::GreaterThan { lower: 0.0 }).unwrap();
    model.add_constraint(y, Set::GreaterThan { lower: 0.0 }).unwrap();
    let row = model
        .add_constraint(affine(&[(x, 1.0), (y, 1.0)], 0.0), Set::GreaterThan { lower: 1.0 })
        .unwrap();
    model
        .set_objective(OptimizationSense::Min, affine(&[(x, 1.0), (y, 1.0)], 0.0))
        .unwrap();

    model
        .modify_constraint(row, &FunctionChange::ScalarConstant(-2.0))
        .unwrap();
    model.optimize().unwrap();
    assert_close(model.objective_value(FIRST).unwrap(), 3.0);

    model
        .modify_constraint(
            row,
            &FunctionChange::ScalarCoefficient {
                variable: y,
                coefficient: 2.0,
            },
        )
        .unwrap();
    model.optimize().unwrap();
    assert_close(model.objective_value(FIRST).unwrap(), 1.5);
    assert_close(model.variable_primal(y, FIRST).unwrap(), 1.5);
    assert_close(model.constraint_primal(row, FIRST).unwrap()[0], 1.0);

    model
        .modify_objective(&FunctionChange::ScalarConstant(10.0))
        .unwrap();
    model.optimize().unwrap();
    assert_close(model.objective_value(FIRST).unwrap(), 11.5);
}

#[test]
fn test_vector_rows_with_constants() {
    let mut model = instance();
    let x = model.add_variables(2).unwrap();
    let shifted = VectorAffineFunction::from_variables(&x, &[-1.0, -2.0]).unwrap();
    let rows = model
        .add_constraint(shifted, Set::Nonnegatives { dimension: 2 })
        .unwrap();
    model
        .set_objective(OptimizationSense::Min, affine(&[(x[0], 1.0), (x[1], 1.0)], 0.0))
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 3.0);
    let values = model.constraint_primal(rows, FIRST).unwrap();
    assert_close(values[0], 0.0);
    assert_close(values[1], 0.0);
    let duals = model.constraint_dual(rows, FIRST).unwrap();
    assert_close(duals[0], 1.0);
    assert_close(duals[1], 1.0);
    assert!(model.check_dual_feasibility(FIRST, TOL).unwrap().is_feasible());
}

#[test]
fn test_rejected_raw_option_is_invalid_option() {
    let mut model = instance();
    let x = model.add_variable().unwrap();
    model.add_constraint(x, Set::GreaterThan { lower: 0.0 }).unwrap();
    model
        .set_attribute(
            &AttributeKind::RawParameter("no_such_highs_option".into()),
            AttributeTarget::Model,
            1.0,
        )
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::InvalidOption));
    assert_eq!(model.result_count(), 0);
}

#[test]
fn test_parameters_reach_highs() {
    let mut model = instance();
    knapsack(&mut model, 5.0);
    model
        .set_attribute(&AttributeKind::TimeLimitSec, AttributeTarget::Model, 30.0)
        .unwrap();
    model
        .set_attribute(
            &AttributeKind::RawParameter("presolve".into()),
            AttributeTarget::Model,
            "off",
        )
        .unwrap();

    assert_eq!(model.optimize(), Ok(TerminationStatusCode::Success));
    assert_close(model.objective_value(FIRST).unwrap(), 7.0);
    assert_eq!(
        model.get_attribute(&AttributeKind::SolverName, AttributeTarget::Model),
        Ok(AttributeValue::Text("HiGHS".to_string()))
    );
    assert!(matches!(
        model.get_attribute(&AttributeKind::RawResult("solver_version".into()), AttributeTarget::Model),
        Ok(AttributeValue::Text(_))
    ));
}
