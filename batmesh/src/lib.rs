pub mod clock;
pub mod concepts;
pub mod feedback;
pub mod framework;
pub mod network;
pub mod node;
pub mod router;
pub mod util;
