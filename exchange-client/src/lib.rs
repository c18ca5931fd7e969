// exchange-client: Authenticated REST pipeline for exchange APIs
// Used by the user-stream CLI and by services that manage user data streams

pub mod error;
pub mod logging;
pub mod venue;
