pub mod edge;
pub mod neighbour;
pub mod packet;
pub mod route;
