/// Recommended error type for scenario `main` functions and backend implementations. Anything
/// that converts into [anyhow::Error] can be propagated with `?`.
pub type SettleBenchResult<T> = anyhow::Result<T>;
