//! Wire formats shared by the client and the server.
//!
//! - **`messages`** – HTTP paths, the `/status` JSON identity payload and the
//!   `/verify` form field names.
//! - **`magic_packet`** – The Wake-on-LAN frame sent by the server.

pub mod magic_packet;
pub mod messages;
