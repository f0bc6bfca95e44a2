pub mod page;
pub mod profile;
pub mod user;

pub use page::PageController;
pub use profile::ProfileController;
pub use user::UserController;
