use derive_more::{Display, Error};

/// The three families every backend-specific failure normalizes into
/// (§4.1). Domain code above the gateway only ever matches on these.
#[derive(Debug, Clone, Display, Error)]
pub enum GatewayError {
    #[display("no vertex or edge with id {id} exists")]
    NotFound { id: i64 },
    #[display("traversal violated a graph-database constraint: {reason}")]
    ConstraintViolation { reason: String },
    #[display("the graph traversal backend could not be reached")]
    Transport,
    #[display("the traversal was aborted")]
    Aborted,
}
