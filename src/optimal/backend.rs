use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver, variable,
};

use crate::error::{DdrError, Result};
use crate::optimal::{LinearProgram, LinearSolver, LpStatus, Relation, VariableId};

/// `good_lp` with its default engine (pure Rust microlp in this build).
#[derive(Clone,Copy,Debug,Default)]
pub struct GoodLpSolver;

fn expression(handles:&[Variable],terms:&[(VariableId,f64)]) -> Expression {
    let mut expr = Expression::from(0.0);
    for (id,coefficient) in terms {
        expr += *coefficient * handles[*id];
    }
    expr
}

impl LinearSolver for GoodLpSolver {
    fn solve(&self,program:&LinearProgram) -> Result<LpStatus> {
        let mut vars = ProblemVariables::new();
        let handles:Vec<Variable> = program.bounds().iter().map(|b| {
            let mut definition = variable().min(b.lower);
            if let Some(upper) = b.upper {
                definition = definition.max(upper);
            }
            vars.add(definition)
        }).collect();

        let objective = expression(&handles, program.objective());
        let mut model = vars.minimise(objective).using(default_solver);
        for row in program.rows() {
            let lhs = expression(&handles, &row.terms);
            let rhs = row.rhs;
            let c = match row.relation {
                Relation::Equal => constraint!(lhs == rhs),
                Relation::LessOrEqual => constraint!(lhs <= rhs),
            };
            model.add_constraint(c);
        }

        match model.solve() {
            Ok(solution) => {
                let objective = program.objective().iter()
                    .map(|(id,coefficient)| coefficient*solution.value(handles[*id]))
                    .sum();
                Ok(LpStatus::Optimal { objective })
            }
            Err(ResolutionError::Infeasible) => Ok(LpStatus::Infeasible),
            Err(ResolutionError::Unbounded) => Ok(LpStatus::Unbounded),
            Err(other) => Err(DdrError::Solver(other.to_string())),
        }
    }
}
