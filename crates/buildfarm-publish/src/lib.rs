//! Artifact publishing for the buildfarm coordinator.
//!
//! Takes a node's finished build products and mirrors them onto the
//! central repository destination. Mirroring is destructive on the
//! remote side, so interactive runs pass through a confirmation gate.

pub mod confirm;
pub mod publisher;
pub mod transport;

pub use confirm::{AssumeYes, Confirmer, StdinConfirmer};
pub use publisher::{CancelFlag, PublishError, PublishReport, Publisher};
pub use transport::{FsTransport, Transport};
