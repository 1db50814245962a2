pub mod show;
pub mod slack;
pub mod user;

pub use show::*;
pub use slack::*;
pub use user::*;
