// Domain layer: entities, the ledger that enforces their invariants, and the
// ports the engine talks to.

pub mod events;
pub mod ledger;
pub mod model;
pub mod ports;
