//! Infrastructure layer for the server.
//!
//! - **`udp_wake`** – `WakePacketSender` over a broadcast UDP socket.
//! - **`http_ingress`** – axum router for `/status` and `/verify`.

pub mod http_ingress;
pub mod udp_wake;
