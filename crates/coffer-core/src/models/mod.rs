mod entry_data;
mod enums;
mod from_row;
mod structs;

pub use entry_data::*;
pub use enums::*;
pub use structs::*;
