/// Something that contributes items to the top-level listing.
pub trait Source {
    fn items(&self) -> Vec<String>;
}

pub mod bin;
pub mod desktop;
pub mod folders;
pub mod history;
pub mod session;
