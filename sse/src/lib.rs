//! Server-Sent Events (SSE) infrastructure for the broadcast gateway.
//!
//! This crate tracks who is connected and pushes queued events to them.
//!
//! # Architecture
//!
//! - **Session registry**: one `Identity` per connected user id, replaced on
//!   reconnect. It is the only state shared between request handling and
//!   queue consumption.
//! - **Connection registry**: open SSE streams keyed by namespace
//!   (`<topic>/<user_id>/<nonce>`), behind the `Manager`.
//! - **Broadcaster**: looks a user up in the session registry and hands the
//!   payload to the stream sink under that session's namespace.
//! - **Ephemeral messages**: if a user is offline the event is dropped.
//!
//! # Message Flow
//!
//! 1. A subscriber opens `/subscribe/{topic}/{user_id}/{nonce}`
//! 2. The web layer verifies the credentials and inserts the `Identity`
//! 3. The SSE handler registers a stream under the identity's namespace
//! 4. A consumer pulls a queued message and dispatches it by `type`
//! 5. The handler calls `Broadcaster::broadcast(user_id, body)`
//! 6. The stream for the current session's namespace receives the body
//!
//! # Modules
//!
//! - `session`: `SessionRegistry`, `Identity`, `CancelHandle`
//! - `connection`: namespace-indexed `ConnectionRegistry`
//! - `manager`: stream sink delegating to the connection registry
//! - `broadcaster`: user id -> namespace routing
//! - `found_contract_handler`: handler for `foundcontract` messages

pub mod broadcaster;
pub mod connection;
pub mod found_contract_handler;
pub mod manager;
pub mod message;
pub mod session;

pub use broadcaster::Broadcaster;
pub use found_contract_handler::FoundContractHandler;
pub use manager::Manager;
pub use message::{Message, StreamSink};
pub use session::{CancelHandle, Identity, SessionRegistry, SessionTicket};
