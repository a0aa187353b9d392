pub mod book;
pub mod dates;
pub mod goal;
pub mod release;

pub use book::{
    Book, Edition, FinishedEntry, HydratedBook, MeUser, ProgressRecord, ReadingStats, UserBook,
    UserBookRead,
};
pub use goal::ReadingGoal;
pub use release::UpcomingRelease;
