//! Supports reading chain descriptions from YAML file (optional)

use std::path::Path;

use yaml_rust2::{Yaml, YamlLoader};

use crate::expression::VarId;
use crate::jacobian::JacobianSolver;
use crate::parameter_error::ChainFileError;
use crate::parameters::jacobian_ik::SolverParameters;
use crate::transform::TransformStep;

/// Joint limit as written in the description file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintEntry {
    pub var: VarId,
    pub min: f64,
    pub max: f64,
}

/// Everything needed to configure a [JacobianSolver], as read from a description file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDescription {
    pub degrees_of_freedom: usize,
    pub init_vec: [f64; 3],
    pub steps: Vec<TransformStep>,
    pub constraints: Vec<ConstraintEntry>,
    pub parameters: SolverParameters,
}

impl ChainDescription {
    /// Read the chain description from YAML file. YAML file like this is supported:
    /// ```yaml
    /// # Planar arm, two links of length 1
    /// degrees_of_freedom: 2
    /// init_vec: [2.0, 0.0, 0.0]
    /// steps:
    ///   - rot_v: { var: 0, axis: [0, 0, 1] }
    ///   - trans_c: [1.0, 0.0, 0.0]
    ///   - rot_v: { var: 1, axis: [0, 0, 1] }
    ///   - trans_c: [-1.0, 0.0, 0.0]
    ///   - rot_c: { angle: rad(1.5707963), axis: [1, 0, 0] }
    /// constraints:
    ///   - { var: 1, min: -150, max: 150 }
    /// solver:
    ///   damping: 0.1
    ///   max_step: 10
    /// ```
    /// `init_vec`, `constraints` and `solver` (and each of its fields) are optional.
    /// `degrees_of_freedom` may not exceed the number of steps.
    /// Angles are in degrees; `rad(angle)` can be used to give an angle in radians.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ChainFileError> {
        let contents = std::fs::read_to_string(path)?;
        ChainDescription::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ChainFileError> {
        let docs = YamlLoader::load_from_str(contents)
            .map_err(|e| ChainFileError::ParseError(format!("{}", e)))?;
        let doc = docs.first()
            .ok_or_else(|| ChainFileError::ParseError("empty document".to_string()))?;

        let degrees_of_freedom = index(&doc["degrees_of_freedom"], "degrees_of_freedom")?;

        let init_vec = match &doc["init_vec"] {
            Yaml::BadValue | Yaml::Null => [0.0; 3],
            value => triple(value, "init_vec")?,
        };

        let steps = match doc["steps"].as_vec() {
            Some(steps) => steps.iter().enumerate()
                .map(|(i, step)| parse_step(step, i))
                .collect::<Result<Vec<_>, _>>()?,
            None => return Err(ChainFileError::MissingField("steps".to_string())),
        };
        // Bounds the per-variable allocations for untrusted files
        if degrees_of_freedom > steps.len() {
            return Err(ChainFileError::ParseError(format!(
                "degrees_of_freedom {} exceeds the number of steps ({})", degrees_of_freedom, steps.len()
            )));
        }

        let constraints = match &doc["constraints"] {
            Yaml::BadValue | Yaml::Null => Vec::new(),
            Yaml::Array(entries) => entries.iter().enumerate()
                .map(|(i, entry)| parse_constraint(entry, i))
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(ChainFileError::ParseError(format!(
                "constraints must be a list (got {:?})", other
            ))),
        };

        let parameters = parse_parameters(&doc["solver"])?;
        parameters.validate()?;

        Ok(ChainDescription { degrees_of_freedom, init_vec, steps, constraints, parameters })
    }

    /// Configures a new solver from this description. The solver still needs to be preprocessed.
    pub fn build(&self) -> Result<JacobianSolver, ChainFileError> {
        let mut solver = JacobianSolver::with_parameters(self.degrees_of_freedom, self.parameters)?;
        let [x, y, z] = self.init_vec;
        solver.set_init_vec(x, y, z)?;
        for step in &self.steps {
            solver.push(step.clone())?;
        }
        for c in &self.constraints {
            solver.set_constraint(c.var, c.min, c.max)?;
        }
        Ok(solver)
    }

    /// Convert to string yaml representation, readable by [ChainDescription::from_yaml_str].
    pub fn to_yaml(&self) -> String {
        let mut out = format!(
            "degrees_of_freedom: {}\ninit_vec: [{}]\nsteps:\n",
            self.degrees_of_freedom, list(&self.init_vec)
        );
        for step in &self.steps {
            let line = match *step {
                TransformStep::RotationByVariable { var, axis } =>
                    format!("  - rot_v: {{ var: {}, axis: [{}] }}\n", var, list(&axis.components())),
                TransformStep::RotationConstant { angle, axis } =>
                    format!("  - rot_c: {{ angle: {}, axis: [{}] }}\n", angle, list(&axis.components())),
                TransformStep::TranslationConstant { offset } =>
                    format!("  - trans_c: [{}]\n", list(&offset)),
            };
            out.push_str(&line);
        }
        if !self.constraints.is_empty() {
            out.push_str("constraints:\n");
            for c in &self.constraints {
                out.push_str(&format!("  - {{ var: {}, min: {}, max: {} }}\n", c.var, c.min, c.max));
            }
        }
        out.push_str(&self.parameters.to_yaml());
        out
    }
}

impl JacobianSolver {
    /// Reads the chain description from YAML file and configures the solver from it.
    /// See [ChainDescription::from_yaml_file] for the format. The returned solver is not yet preprocessed.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ChainFileError> {
        ChainDescription::from_yaml_file(path)?.build()
    }
}

fn list(values: &[f64]) -> String {
    values.iter().map(|v| format!("{}", v)).collect::<Vec<_>>().join(", ")
}

/// Number in degrees. Accepts integers, reals, and `rad(x)` / `deg(x)` strings.
fn number(value: &Yaml, field: &str) -> Result<f64, ChainFileError> {
    let parsed = match value {
        Yaml::Integer(i) => Some(*i as f64),
        Yaml::Real(text) => text.parse::<f64>().ok(),
        Yaml::String(text) => parse_angle_function(text),
        Yaml::BadValue => return Err(ChainFileError::MissingField(field.to_string())),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ChainFileError::ParseError(format!("{} must be a finite number (got {:?})", field, value))),
    }
}

fn parse_angle_function(text: &str) -> Option<f64> {
    let text = text.trim();
    let (converter, inner): (fn(f64) -> f64, &str) = if let Some(rest) = text.strip_prefix("rad(") {
        (f64::to_degrees, rest)
    } else if let Some(rest) = text.strip_prefix("deg(") {
        (|v| v, rest)
    } else {
        return None;
    };
    let inner = inner.strip_suffix(')')?;
    inner.trim().parse::<f64>().ok().map(converter)
}

fn index(value: &Yaml, field: &str) -> Result<usize, ChainFileError> {
    match value {
        Yaml::Integer(i) if *i >= 0 => Ok(*i as usize),
        Yaml::BadValue => Err(ChainFileError::MissingField(field.to_string())),
        other => Err(ChainFileError::ParseError(format!(
            "{} must be a non-negative integer (got {:?})", field, other
        ))),
    }
}

fn triple(value: &Yaml, field: &str) -> Result<[f64; 3], ChainFileError> {
    let items = match value {
        Yaml::Array(items) => items,
        Yaml::BadValue => return Err(ChainFileError::MissingField(field.to_string())),
        other => return Err(ChainFileError::ParseError(format!("{} must be a list (got {:?})", field, other))),
    };
    if items.len() != 3 {
        return Err(ChainFileError::InvalidLength { field: field.to_string(), expected: 3, found: items.len() });
    }
    Ok([number(&items[0], field)?, number(&items[1], field)?, number(&items[2], field)?])
}

fn parse_step(step: &Yaml, i: usize) -> Result<TransformStep, ChainFileError> {
    let hash = step.as_hash().ok_or_else(|| ChainFileError::ParseError(format!(
        "steps[{}] must be a mapping with one of rot_v, rot_c, trans_c", i
    )))?;
    if hash.len() != 1 {
        return Err(ChainFileError::ParseError(format!(
            "steps[{}] must have exactly one key (has {})", i, hash.len()
        )));
    }

    let field = |name: &str| format!("steps[{}].{}", i, name);
    let transform = if !step["rot_v"].is_badvalue() {
        let body = &step["rot_v"];
        let [x, y, z] = triple(&body["axis"], &field("rot_v.axis"))?;
        TransformStep::rotation_by_variable(index(&body["var"], &field("rot_v.var"))?, x, y, z)?
    } else if !step["rot_c"].is_badvalue() {
        let body = &step["rot_c"];
        let [x, y, z] = triple(&body["axis"], &field("rot_c.axis"))?;
        TransformStep::rotation_constant(number(&body["angle"], &field("rot_c.angle"))?, x, y, z)?
    } else if !step["trans_c"].is_badvalue() {
        let [x, y, z] = triple(&step["trans_c"], &field("trans_c"))?;
        TransformStep::translation_constant(x, y, z)?
    } else {
        return Err(ChainFileError::ParseError(format!(
            "steps[{}]: unknown step kind, expected rot_v, rot_c or trans_c", i
        )));
    };
    Ok(transform)
}

fn parse_constraint(entry: &Yaml, i: usize) -> Result<ConstraintEntry, ChainFileError> {
    Ok(ConstraintEntry {
        var: index(&entry["var"], &format!("constraints[{}].var", i))?,
        min: number(&entry["min"], &format!("constraints[{}].min", i))?,
        max: number(&entry["max"], &format!("constraints[{}].max", i))?,
    })
}

fn parse_parameters(solver: &Yaml) -> Result<SolverParameters, ChainFileError> {
    let mut parameters = SolverParameters::default();
    if solver.is_badvalue() || solver.is_null() {
        return Ok(parameters);
    }
    if !solver["damping"].is_badvalue() {
        parameters.damping = number(&solver["damping"], "solver.damping")?;
    }
    match &solver["max_step"] {
        Yaml::BadValue => {}
        Yaml::Null => parameters.max_step = None,
        value => parameters.max_step = Some(number(value, "solver.max_step")?),
    }
    Ok(parameters)
}
