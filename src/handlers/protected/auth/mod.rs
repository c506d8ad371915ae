pub mod whoami;

pub use whoami::whoami;
