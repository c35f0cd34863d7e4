mod lock;
mod status;
#[cfg(test)]
mod tests;

pub use lock::*;
pub use status::*;
