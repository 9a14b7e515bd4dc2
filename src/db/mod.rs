mod areas;
mod courses;
mod lessons;
mod purchases;
mod registration;
mod sections;
mod teachers;
mod tokens;
mod users;

pub use areas::*;
pub use courses::*;
pub use lessons::*;
pub use purchases::*;
pub use registration::*;
pub use sections::*;
pub use teachers::*;
pub use tokens::*;
pub use users::*;
