pub mod embed;
pub mod extract;
pub mod info;
pub mod keygen;

pub use embed::*;
pub use extract::*;
pub use info::*;
pub use keygen::*;
