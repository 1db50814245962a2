pub mod channel;
pub mod show;
pub mod user;

pub use channel::ChannelService;
pub use show::ShowService;
pub use user::UserService;
