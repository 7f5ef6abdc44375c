//! Configuration access port trait.

use crate::domain::error::BiasTraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Comma-separated numbers. Missing or blank keys yield `default`;
    /// an entry that is not a number is `ConfigInvalid`.
    fn get_double_list(
        &self,
        section: &str,
        key: &str,
        default: &[f64],
    ) -> Result<Vec<f64>, BiasTraderError>;
}
