//! The observe/act surface the optimizer drives.

use crate::error::EnvError;

/// One tuning environment: a named set of variables the optimizer may
/// move and observables it may measure.
///
/// Implementations own their hardware context; every call below may
/// block on channel access, settling sleeps or the shot sequence.
pub trait Environment {
    fn name(&self) -> &str;

    /// Variables this environment exposes, in a fixed order.
    fn variable_names(&self) -> Vec<String>;

    /// Observables this environment can measure.
    fn observable_names(&self) -> Vec<String>;

    /// Current value of each requested variable.
    fn get_variables(&mut self, names: &[String]) -> Result<Vec<(String, f64)>, EnvError>;

    /// Move the requested variables. Variables not named keep their
    /// current value.
    fn set_variables(&mut self, values: &[(String, f64)]) -> Result<(), EnvError>;

    /// Measure each requested observable, after the settling wait.
    fn get_observables(&mut self, names: &[String]) -> Result<Vec<(String, f64)>, EnvError>;
}
