mod area;
mod course;
mod lesson;
mod material;
mod price;
mod purchase;
mod section;
mod student;
mod teacher;

pub use area::*;
pub use course::*;
pub use lesson::*;
pub use material::*;
pub use price::*;
pub use purchase::*;
pub use section::*;
pub use student::*;
pub use teacher::*;
