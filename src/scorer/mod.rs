pub mod criteria;
pub mod evaluator;

pub use evaluator::CriteriaEvaluator;
