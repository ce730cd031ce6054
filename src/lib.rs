//! Roteamento e transferência de pendências entre setores e usuários.
//!
//! O núcleo é [`routing::evaluate_routing`], que decide para onde uma pendência
//! vinculada a um roteiro pode seguir, e [`transfer::TransferService`], que aplica
//! a transferência contra o backend depois de validá-la localmente.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod listing;
pub mod routing;
pub mod transfer;

pub use error::NexusError;
pub use routing::{RoutingDecision, RoutingState, RoutingView, evaluate_routing};
pub use transfer::{Destino, TransferError, TransferService};
