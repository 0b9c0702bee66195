pub mod bc_client;
pub mod clock;
pub mod mempool_client;
pub mod memory;
pub mod shutdown;
