//! Domain entities for powermon.
//!
//! Pure value types shared by the client and the server.  Every type here is
//! validated on construction and immutable afterwards, so the loops that
//! consume them never have to re-check their invariants.

/// Validated probe target (host, port, scheme).
pub mod endpoint;

/// Nickname and hardware addresses a client reports about itself.
pub mod identity;

/// 48-bit hardware (MAC) addresses in canonical form.
pub mod mac;

/// Wake list file parsing and target set construction.
pub mod wake_list;
