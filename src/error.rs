#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecuteError<E> {
    #[error("Link produced no result stream")]
    NoResult,
    #[error("Result stream completed without a result")]
    Empty,
    #[error("Link error: {0}")]
    Link(#[source] E),
}
