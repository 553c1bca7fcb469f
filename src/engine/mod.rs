pub mod gate;
pub mod state;
pub mod stream;
pub mod transport;

pub use gate::{GateDecision, SignalGate};
pub use state::ControlHandle;
pub use stream::StreamEngine;
pub use transport::{KlineStream, LiveKline, StreamTransport, WsTransport};
