//! piknik-client: async clipboard client
//!
//! Every operation opens its own TCP connection, authenticates it against the
//! pre-shared key and closes it when done:
//! ```text
//! connect ──► ClientHello ──► ServerHello ──► verified (h1)
//!                                               │
//!                     store: header + payload ◄─┤─► get/move: request
//!                     confirmation (h3)         │   response header + payload
//! ```

pub mod client;
pub mod connection;
pub mod handshake;
pub mod reader;
pub mod settings;

pub use client::ClipboardClient;
pub use connection::Connection;
pub use handshake::handshake;
pub use reader::StreamReader;
pub use settings::ClientConfig;
