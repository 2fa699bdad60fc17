pub mod artist;
pub mod song;
pub mod songplay;
pub mod time;
pub mod user;

pub use artist::Artist;
pub use song::Song;
pub use songplay::{SongMatch, SongPlay};
pub use time::{format_start_time, TimeRow};
pub use user::User;
